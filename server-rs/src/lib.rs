use axum::{
    http::HeaderValue,
    middleware as axum_mw,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use config::Config;
use services::{
    ClaimsIssuer, OrganizationRegistry, PasswordHasher, SettingsEditor, UserDirectory,
};
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub issuer: ClaimsIssuer,
    pub users: UserDirectory,
    pub orgs: OrganizationRegistry,
    pub settings: SettingsEditor,
}

impl AppState {
    pub fn new<S: Store + 'static>(
        config: Config,
        store: Arc<S>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let issuer = ClaimsIssuer::new(&config.jwt.secret);
        Self {
            users: UserDirectory::new(store.clone(), hasher, issuer.clone()),
            orgs: OrganizationRegistry::new(store.clone(), store.clone()),
            settings: SettingsEditor::new(store.clone()),
            issuer,
            store,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    cors.allow_origin(origins)
}

pub fn build_router(state: AppState) -> Router {
    // --- Auth routes (no auth required) ---
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route(
            "/refresh",
            post(routes::auth::refresh).layer(axum_mw::from_fn_with_state(
                state.clone(),
                middleware::auth::authenticate,
            )),
        );

    // --- Authenticated routes ---
    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let org_routes = Router::new()
        .route("/", post(routes::organizations::create_org))
        .route("/join", post(routes::organizations::join_org))
        .route("/settings", put(routes::organizations::edit_settings))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/organizations", org_routes);

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
