//! # pid
//!
//! A dependency injection container built around modules, scoped providers and tagged
//! resolution.
//!
//! ## Core Concepts
//!
//! - **Provider**: A component built by a factory from its declared dependencies
//! - **Module**: A component that owns providers, imports other modules and exports a subset
//!   of its scope to its importers
//! - **Scope**: Providers visible from a component: its own declared providers first, then
//!   the providers inherited from where it was declared
//! - **Alias**: Another type, usually a trait object, a provider can be requested as
//! - **Tag**: Key of an independent instance graph, for example one per request
//! - **Deferred**: A handle resolving a dependency on demand, used to break cycles
//!
//! ## Basic Usage
//!
//! ```rust
//! use pid::{Bootstrap, Component, Registry};
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {
//!     fn find(&self, id: u32) -> Option<String>;
//! }
//!
//! struct MemoryRepository;
//!
//! impl Repository for MemoryRepository {
//!     fn find(&self, id: u32) -> Option<String> {
//!         (id == 1).then(|| "alice".to_string())
//!     }
//! }
//!
//! struct StorageModule;
//!
//! struct AppModule {
//!     repository: Arc<dyn Repository>,
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         Component::<MemoryRepository>::injectable()
//!             .implements::<dyn Repository>(|this| this)
//!             .factory(|_| Ok(MemoryRepository)),
//!     )
//!     .register(
//!         Component::<StorageModule>::module()
//!             .provider::<MemoryRepository>()
//!             .export::<MemoryRepository>()
//!             .factory(|_| Ok(StorageModule)),
//!     )
//!     .register(
//!         Component::<AppModule>::module()
//!             .import::<StorageModule>()
//!             .dependency::<dyn Repository>("repository")
//!             .factory(|args| Ok(AppModule { repository: args.get("repository")? })),
//!     );
//!
//! let app = Bootstrap::resolve::<AppModule>(&registry).unwrap();
//! assert_eq!(app.repository.find(1).as_deref(), Some("alice"));
//! ```
//!
//! ## Using Macros
//!
//! With the `macros` feature enabled, declarations are derived from struct fields:
//!
//! ```rust
//! use pid::{Bootstrap, Injectable, Module, Registry, Tag};
//! use std::sync::Arc;
//!
//! #[derive(Injectable)]
//! struct RequestContext {
//!     tag: Tag,
//! }
//!
//! #[derive(Module)]
//! #[module(providers(RequestContext))]
//! struct AppModule {
//!     context: Arc<RequestContext>,
//! }
//!
//! let mut registry = Registry::new();
//! registry.add::<RequestContext>().add::<AppModule>();
//!
//! let app = Bootstrap::resolve_tagged::<AppModule>(&registry, "request-1").unwrap();
//! assert_eq!(app.context.tag.as_str(), Some("request-1"));
//! ```
//!
//! ## Features
//!
//! - `macros` (default): Enables the `Injectable` and `Module` derives and the
//!   `#[component]` attribute

mod component;
mod container;
mod error;
mod graph;
mod inject;
mod marker;
mod pool;
mod resolve;

pub use component::{Component, Dependency, Descriptor, Injectable, Kind};
pub use container::*;
pub use error::*;
pub use inject::{Arguments, Deferred};
pub use marker::*;

#[cfg(feature = "macros")]
pub use pid_macros::*;
