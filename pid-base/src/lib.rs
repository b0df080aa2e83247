//! # pid-base
//!
//! Application plumbing around the pid dependency injection container: configuration
//! loading, resolver settings, tracing setup and registry bundles.
//!
//! ## Core Components
//!
//! - **Configuration**: JSON sections loaded from strings or files and deep merged
//! - **Resolver Settings**: The `resolver` section mapped onto registry options
//! - **Tracing**: A global `fmt` subscriber with a reloadable level filter
//! - **Bundles**: Related registrations grouped behind one call
//!
//! ## Configuration Example
//!
//! ```rust
//! use pid::{Bootstrap, Component, Registry};
//! use pid_base::{Config, ConfigureRegistryExt as _};
//! use serde::Deserialize;
//! use std::sync::Arc;
//!
//! #[derive(Deserialize)]
//! struct DatabaseConfig {
//!     host: String,
//! }
//!
//! struct Database {
//!     host: String,
//! }
//!
//! struct AppModule {
//!     database: Arc<Database>,
//! }
//!
//! # fn main() -> Result<(), pid::StdError> {
//! let config = Config::parse(
//!     r#"{"resolver": {"max_depth": 16}, "database": {"host": "localhost"}}"#,
//! )?;
//!
//! let mut registry = Registry::new();
//! registry
//!     .add_config(config)?
//!     .register(
//!         Component::<Database>::injectable()
//!             .dependency::<Config>("config")
//!             .factory(|args| {
//!                 let config: DatabaseConfig = args.get::<Config>("config")?.get("database")?;
//!                 Ok(Database { host: config.host })
//!             }),
//!     )
//!     .register(
//!         Component::<AppModule>::module()
//!             .provider::<Config>()
//!             .provider::<Database>()
//!             .dependency::<Database>("database")
//!             .factory(|args| Ok(AppModule { database: args.get("database")? })),
//!     );
//!
//! assert_eq!(registry.options().max_depth, 16);
//! let app = Bootstrap::resolve::<AppModule>(&registry)?;
//! assert_eq!(app.database.host, "localhost");
//! # Ok(())
//! # }
//! ```

mod bundle;
mod config;
mod resolver;
mod tracing;

pub use bundle::*;
pub use config::*;
pub use resolver::*;
pub use tracing::*;
