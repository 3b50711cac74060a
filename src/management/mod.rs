mod environment;
mod registry;
mod tokens;

pub use environment::Credentials;
pub use environment::Environment;
pub use environment::EnvironmentSettings;
pub use registry::EnvironmentRegistry;
pub use tokens::TokenStore;
