pub mod credentials;
pub mod organizations;
pub mod settings;
pub mod tokens;
pub mod users;

pub use credentials::{BcryptHasher, PasswordHasher, MIN_BCRYPT_COST};
pub use organizations::OrganizationRegistry;
pub use settings::SettingsEditor;
pub use tokens::{Claims, ClaimsIssuer, Identity};
pub use users::UserDirectory;
