pub mod assets;
pub mod config;
pub mod middleware;
pub mod observability;
pub mod render;
pub mod routes;
pub mod server;
pub mod session;
pub mod template;

pub use config::Config;
pub use routes::AppState;

rust_i18n::i18n!("locales", fallback = "en");
