use std::collections::{HashMap, hash_map};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::component::Descriptor;
use crate::graph::{Graph, NodeId};
use crate::{Component, Injectable, ResolveError, Tag, TypeMarker};

/// Limits and switches applied to every graph bootstrapped from a registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Maximal length of a resolution chain before [`ResolveError::DepthLimitExceeded`].
    pub max_depth: usize,
    /// Resolve every declared provider of a component before the component itself, even
    /// when nothing depends on it.
    pub eager_providers: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            eager_providers: false,
        }
    }
}

/// Set of component declarations graphs are materialized from.
///
/// # Examples
///
/// ```rust
/// use pid::{Component, Registry, Tag};
/// use std::sync::Arc;
///
/// struct Settings {
///     name: String,
/// }
///
/// struct AppModule {
///     settings: Arc<Settings>,
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .add_value(Settings { name: "demo".into() })
///     .register(
///         Component::<AppModule>::module()
///             .provider::<Settings>()
///             .dependency::<Settings>("settings")
///             .factory(|args| Ok(AppModule { settings: args.get("settings")? })),
///     );
///
/// let container = registry.bootstrap::<AppModule>().unwrap();
/// let first = container.resolve(Tag::none()).unwrap();
/// let second = container.resolve("request").unwrap();
/// assert!(!Arc::ptr_eq(&first, &second));
/// assert!(Arc::ptr_eq(&first.settings, &second.settings));
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    descriptors: HashMap<TypeMarker, Arc<Descriptor>>,
    options: ResolveOptions,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type implementing [`Injectable`].
    ///
    /// # Panics
    ///
    /// Panics if the type has already been registered.
    pub fn add<T>(&mut self) -> &mut Self
    where
        T: Injectable,
    {
        let component = T::component();
        if component.descriptor().has_factory() {
            self.register(component)
        } else {
            self.register(component.factory(T::construct))
        }
    }

    /// Registers an explicitly declared component.
    ///
    /// # Panics
    ///
    /// Panics if a component of the same type has already been registered.
    pub fn register<T>(&mut self, component: Component<T>) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.insert(component.into_descriptor())
    }

    /// Registers an already built value as a provider.
    ///
    /// # Panics
    ///
    /// Panics if a component of the same type has already been registered.
    pub fn add_value<T>(&mut self, value: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.register(Component::value(value))
    }

    /// Registers a type-erased descriptor.
    ///
    /// # Panics
    ///
    /// Panics if a component with the same marker has already been registered.
    pub fn insert(&mut self, descriptor: Descriptor) -> &mut Self {
        match self.descriptors.entry(descriptor.marker()) {
            hash_map::Entry::Occupied(_) => {
                panic!("Component {} already registered", descriptor.name())
            }
            hash_map::Entry::Vacant(v) => {
                v.insert(Arc::new(descriptor));
            }
        };
        self
    }

    /// Whether `T` has been registered.
    pub fn is_injectable<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.contains(&TypeMarker::of::<T>())
    }

    pub fn contains(&self, marker: &TypeMarker) -> bool {
        self.descriptors.contains_key(marker)
    }

    pub fn descriptor(&self, marker: &TypeMarker) -> Option<&Descriptor> {
        self.descriptors.get(marker).map(Arc::as_ref)
    }

    pub(crate) fn descriptor_arc(&self, marker: &TypeMarker) -> Option<Arc<Descriptor>> {
        self.descriptors.get(marker).cloned()
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ResolveOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Materializes the graph rooted at `T`.
    ///
    /// Fails with [`ResolveError::ClassIsNotInjectable`] when `T` or any component it
    /// declares is not registered, and with [`ResolveError::CircularDependency`] when a
    /// provider declares itself inside its own providers chain. Nothing is built yet.
    pub fn bootstrap<T>(&self) -> Result<Container<T>, ResolveError>
    where
        T: Send + Sync + 'static,
    {
        let (graph, root) = Graph::materialize(self, TypeMarker::of::<T>())?;
        Ok(Container {
            graph: Arc::new(graph),
            root,
            _marker: PhantomData,
        })
    }
}

/// Materialized graph of a root component.
///
/// Instances are built on demand and cached per tag for the lifetime of the container.
pub struct Container<T> {
    graph: Arc<Graph>,
    root: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Container<T>
where
    T: Send + Sync + 'static,
{
    /// Resolves the root component under `tag`.
    ///
    /// Repeated calls with the same tag return the same instance.
    pub fn resolve(&self, tag: impl Into<Tag>) -> Result<Arc<T>, ResolveError> {
        let instance = self.graph.resolve_root(self.root, &tag.into())?;
        instance
            .downcast::<T>()
            .map_err(|_| ResolveError::ArgumentMismatch {
                component: self.graph.node(self.root).name(),
                parameter: "<root>".to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Number of nodes in the graph.
    pub fn nodes(&self) -> usize {
        self.graph.len()
    }

    /// Number of instances built so far, over all tags.
    pub fn instances(&self) -> usize {
        self.graph.instances.len()
    }
}

impl<T> Clone for Container<T> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            root: self.root,
            _marker: PhantomData,
        }
    }
}

/// One-shot entry point: materializes a graph and resolves its root.
pub struct Bootstrap;

impl Bootstrap {
    pub fn resolve<T>(registry: &Registry) -> Result<Arc<T>, ResolveError>
    where
        T: Send + Sync + 'static,
    {
        Self::resolve_tagged(registry, Tag::none())
    }

    pub fn resolve_tagged<T>(
        registry: &Registry,
        tag: impl Into<Tag>,
    ) -> Result<Arc<T>, ResolveError>
    where
        T: Send + Sync + 'static,
    {
        registry.bootstrap::<T>()?.resolve(tag)
    }
}
