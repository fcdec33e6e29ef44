use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub app_env: String,
    pub cors_origins: Vec<String>,
    pub storage: StorageBackend,
    pub run_migrations: bool,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"<redacted>").finish()
    }
}

pub const DEV_JWT_SECRET: &str = "change-me-to-a-secure-random-string";

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or_parse("PORT", 3000),
            app_env: env_or("APP_ENV", "development"),
            cors_origins: env_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            storage: parse_backend(&env_or("STORAGE_BACKEND", "postgres")),
            run_migrations: env_or_parse("RUN_MIGRATIONS", true),
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "foosball"),
                user: env_or("DB_USER", "foosball"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 1),
                pool_max: env_or_parse("DB_POOL_MAX", 10),
            },
            jwt: JwtConfig {
                secret: env_or("JWT_SECRET", DEV_JWT_SECRET),
            },
            bcrypt_cost: env_or_parse("BCRYPT_COST", bcrypt::DEFAULT_COST),
        }
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }
}

fn parse_backend(s: &str) -> StorageBackend {
    match s.trim().to_ascii_lowercase().as_str() {
        "memory" | "in-memory" => StorageBackend::Memory,
        _ => StorageBackend::Postgres,
    }
}
