//! Resolved arguments handed to factories and deferred handles.
//!
//! A factory receives [`Arguments`] holding one value per declared dependency, keyed by the
//! dependency name:
//!
//! - [`Arguments::get`] returns an `Arc<R>` for dependencies declared with
//!   [`Component::dependency`](crate::Component::dependency) (and for `Tag` parameters).
//! - [`Arguments::deferred`] returns a [`Deferred<R>`] for dependencies declared with
//!   [`Component::deferred`](crate::Component::deferred).
//!
//! # Examples
//!
//! Breaking a cycle with a deferred dependency:
//!
//! ```rust
//! use pid::{Bootstrap, Component, Deferred, Registry};
//! use std::sync::Arc;
//!
//! struct Parent {
//!     child: Arc<Child>,
//! }
//!
//! struct Child {
//!     parent: Deferred<Parent>,
//! }
//!
//! struct AppModule {
//!     parent: Arc<Parent>,
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         Component::<Parent>::injectable()
//!             .dependency::<Child>("child")
//!             .factory(|args| Ok(Parent { child: args.get("child")? })),
//!     )
//!     .register(
//!         Component::<Child>::injectable()
//!             .deferred::<Parent>("parent")
//!             .factory(|args| Ok(Child { parent: args.deferred("parent")? })),
//!     )
//!     .register(
//!         Component::<AppModule>::module()
//!             .provider::<Parent>()
//!             .provider::<Child>()
//!             .dependency::<Parent>("parent")
//!             .factory(|args| Ok(AppModule { parent: args.get("parent")? })),
//!     );
//!
//! let app = Bootstrap::resolve::<AppModule>(&registry).unwrap();
//! let parent = app.parent.child.parent.resolve().unwrap();
//! assert!(Arc::ptr_eq(&parent, &app.parent));
//! ```

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::component::Cast;
use crate::graph::{Graph, NodeId};
use crate::{ResolveError, Tag};

pub(crate) enum Argument {
    /// A boxed `Arc<R>` for the requested alias `R`.
    Instance(Box<dyn Any>),
    Deferred(RawDeferred),
}

/// Values bound to the declared dependencies of a component.
pub struct Arguments {
    component: &'static str,
    tag: Tag,
    values: HashMap<&'static str, Argument>,
}

impl Arguments {
    pub(crate) fn new(component: &'static str, tag: Tag) -> Self {
        Self {
            component,
            tag,
            values: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &'static str, argument: Argument) {
        self.values.insert(name, argument);
    }

    /// Name of the component being built.
    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Tag the component is being resolved under.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the instance bound to the dependency `name`.
    ///
    /// `R` must be the type the dependency was declared with.
    pub fn get<R>(&self, name: &str) -> Result<Arc<R>, ResolveError>
    where
        R: ?Sized + 'static,
    {
        match self.values.get(name) {
            Some(Argument::Instance(value)) => value
                .downcast_ref::<Arc<R>>()
                .cloned()
                .ok_or_else(|| self.mismatch::<R>(name)),
            _ => Err(self.mismatch::<R>(name)),
        }
    }

    /// Returns the deferred handle bound to the dependency `name`.
    pub fn deferred<R>(&self, name: &str) -> Result<Deferred<R>, ResolveError>
    where
        R: ?Sized + 'static,
    {
        match self.values.get(name) {
            Some(Argument::Deferred(raw)) => Ok(Deferred {
                raw: raw.clone(),
                _marker: PhantomData,
            }),
            _ => Err(self.mismatch::<Deferred<R>>(name)),
        }
    }

    fn mismatch<R: ?Sized>(&self, name: &str) -> ResolveError {
        ResolveError::ArgumentMismatch {
            component: self.component,
            parameter: name.to_string(),
            expected: type_name::<R>(),
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("component", &self.component)
            .field("tag", &self.tag)
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct RawDeferred {
    graph: Arc<Graph>,
    node: NodeId,
    tag: Tag,
    cast: Cast,
}

impl RawDeferred {
    pub(crate) fn new(graph: Arc<Graph>, node: NodeId, tag: Tag, cast: Cast) -> Self {
        Self {
            graph,
            node,
            tag,
            cast,
        }
    }

    fn resolve<R>(&self, tag: &Tag) -> Result<Arc<R>, ResolveError>
    where
        R: ?Sized + 'static,
    {
        let instance = self.graph.resolve_deferred(self.node, tag)?;
        (self.cast)(&instance)
            .and_then(|v| v.downcast::<Arc<R>>().ok())
            .map(|v| *v)
            .ok_or_else(|| ResolveError::ArgumentMismatch {
                component: self.graph.node(self.node).name(),
                parameter: "<deferred>".to_string(),
                expected: type_name::<R>(),
            })
    }
}

/// Handle to a dependency that is resolved on demand.
///
/// Binding a deferred dependency does not build its provider, which lets two components
/// refer to each other. The handle resolves in the scope it was bound in; resolving it from
/// a factory while the target is still being built fails with
/// [`ResolveError::SelfResolution`], so call it from methods instead.
///
/// A handle keeps its graph alive.
pub struct Deferred<T: ?Sized> {
    raw: RawDeferred,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T> Deferred<T>
where
    T: ?Sized + 'static,
{
    /// Resolves the dependency under the tag the handle was bound with.
    pub fn resolve(&self) -> Result<Arc<T>, ResolveError> {
        self.raw.resolve(&self.raw.tag)
    }

    /// Resolves the dependency under another tag, producing an independent instance.
    pub fn resolve_tagged(&self, tag: impl Into<Tag>) -> Result<Arc<T>, ResolveError> {
        self.raw.resolve(&tag.into())
    }

    /// Tag the handle was bound with.
    pub fn tag(&self) -> &Tag {
        &self.raw.tag
    }
}

impl<T: ?Sized> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("target", &type_name::<T>())
            .field("tag", &self.raw.tag)
            .finish()
    }
}
