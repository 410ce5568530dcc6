//! A registry of typed configs, one value per type
//!
//! Components take their settings as plain structs; the registry holds one
//! value of each config type and hands out shared references. Register the
//! registry itself in a container to make configs reachable from
//! constructors.
//!
//! ```
//! use trellis_config::{Config, ConfigRegistry};
//!
//! #[derive(Clone)]
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! let mut registry = ConfigRegistry::initialize();
//! registry
//!     .add_config(AppConfig {
//!         host: "localhost".to_string(),
//!         port: 8080,
//!     })
//!     .unwrap();
//!
//! let config: Config<AppConfig> = registry.config().unwrap();
//! assert_eq!(config.port, 8080);
//! ```

pub mod config;
pub mod errors;
pub mod registry;

pub use config::Config;
pub use errors::ConfigError;
pub use registry::ConfigRegistry;
