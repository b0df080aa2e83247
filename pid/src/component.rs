use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{Arguments, StdError, TypeMarker};

/// Type-erased built component. The concrete type behind it is always the component type.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Turns an erased instance into a boxed `Arc<R>` for one alias `R`.
pub(crate) type Cast = Arc<dyn Fn(&Instance) -> Option<Box<dyn Any>> + Send + Sync>;

pub(crate) type Factory = Arc<dyn Fn(&Arguments) -> Result<Instance, StdError> + Send + Sync>;

/// Kind of a registered component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// A leaf provider producing one dependency instance.
    Injectable,
    /// A composition unit owning imports, exports and providers.
    Module,
}

/// A declared constructor parameter of a component.
#[derive(Clone, Copy, Debug)]
pub struct Dependency {
    name: &'static str,
    marker: TypeMarker,
    deferred: bool,
}

impl Dependency {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn marker(&self) -> TypeMarker {
        self.marker
    }

    /// Whether the parameter receives a [`Deferred`](crate::Deferred) handle instead of an
    /// instance.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }
}

#[derive(Clone)]
pub(crate) struct Alias {
    pub(crate) marker: TypeMarker,
    pub(crate) cast: Cast,
}

/// Immutable declaration of a component: what it is, what it declares and how it is built.
///
/// Descriptors are produced by [`Component`] and stored in a
/// [`Registry`](crate::Registry). Imports, exports and providers reference other components
/// by marker; they are looked up in the registry when a graph is materialized.
#[derive(Clone)]
pub struct Descriptor {
    pub(crate) marker: TypeMarker,
    pub(crate) kind: Kind,
    pub(crate) imports: Vec<TypeMarker>,
    pub(crate) exports: Vec<TypeMarker>,
    pub(crate) providers: Vec<TypeMarker>,
    pub(crate) aliases: Vec<Alias>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) factory: Option<Factory>,
}

impl Descriptor {
    pub fn marker(&self) -> TypeMarker {
        self.marker
    }

    pub fn name(&self) -> &'static str {
        self.marker.name()
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_module(&self) -> bool {
        self.kind == Kind::Module
    }

    pub fn imports(&self) -> &[TypeMarker] {
        &self.imports
    }

    pub fn exports(&self) -> &[TypeMarker] {
        &self.exports
    }

    pub fn providers(&self) -> &[TypeMarker] {
        &self.providers
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Markers this component satisfies: its own type first, then declared aliases.
    pub fn aliases(&self) -> impl Iterator<Item = TypeMarker> + '_ {
        self.aliases.iter().map(|alias| alias.marker)
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }
}

/// Typed builder of a [`Descriptor`].
///
/// # Examples
///
/// A provider implementing an interface and a module that uses it:
///
/// ```rust
/// use pid::{Bootstrap, Component, Registry};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "Hello".into()
///     }
/// }
///
/// struct AppModule {
///     greeter: Arc<dyn Greeter>,
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .register(
///         Component::<English>::injectable()
///             .implements::<dyn Greeter>(|this| this)
///             .factory(|_| Ok(English)),
///     )
///     .register(
///         Component::<AppModule>::module()
///             .provider::<English>()
///             .dependency::<dyn Greeter>("greeter")
///             .factory(|args| Ok(AppModule { greeter: args.get("greeter")? })),
///     );
///
/// let app = Bootstrap::resolve::<AppModule>(&registry).unwrap();
/// assert_eq!(app.greeter.greet(), "Hello");
/// ```
pub struct Component<T> {
    descriptor: Descriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Component<T>
where
    T: Send + Sync + 'static,
{
    /// Starts the declaration of a leaf provider.
    pub fn injectable() -> Self {
        Self::new(Kind::Injectable)
    }

    /// Starts the declaration of a module.
    pub fn module() -> Self {
        Self::new(Kind::Module)
    }

    /// Declares an already built value.
    ///
    /// The same instance is handed out under every tag.
    pub fn value(value: T) -> Self {
        let value = Arc::new(value);
        let mut component = Self::injectable();
        component.descriptor.factory =
            Some(Arc::new(move |_: &Arguments| Ok(value.clone() as Instance)));
        component
    }

    fn new(kind: Kind) -> Self {
        let own = Alias {
            marker: TypeMarker::of::<T>(),
            cast: Arc::new(|instance: &Instance| {
                instance
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|v| Box::new(v) as Box<dyn Any>)
            }),
        };
        Self {
            descriptor: Descriptor {
                marker: own.marker,
                kind,
                imports: Vec::new(),
                exports: Vec::new(),
                providers: Vec::new(),
                aliases: vec![own],
                dependencies: Vec::new(),
                factory: None,
            },
            _marker: PhantomData,
        }
    }

    /// Declares a provider owned by this component.
    ///
    /// Every declaration creates its own provider node, so a provider declared here shadows
    /// a provider of the same type inherited from an enclosing scope.
    pub fn provider<P>(mut self) -> Self
    where
        P: 'static,
    {
        self.descriptor.providers.push(TypeMarker::of::<P>());
        self
    }

    /// Declares an imported module. Only meaningful for modules.
    pub fn import<M>(mut self) -> Self
    where
        M: 'static,
    {
        self.descriptor.imports.push(TypeMarker::of::<M>());
        self
    }

    /// Declares an export: a provider available in this module's scope, or an imported
    /// module whose exports are re-exported. Only meaningful for modules.
    pub fn export<E>(mut self) -> Self
    where
        E: 'static,
    {
        self.descriptor.exports.push(TypeMarker::of::<E>());
        self
    }

    /// Declares that this component also satisfies requests for `R`.
    pub fn implements<R>(mut self, cast: fn(Arc<T>) -> Arc<R>) -> Self
    where
        R: ?Sized + 'static,
    {
        let marker = TypeMarker::of::<R>();
        let cast: Cast = Arc::new(move |instance: &Instance| {
            instance
                .clone()
                .downcast::<T>()
                .ok()
                .map(|v| Box::new(cast(v)) as Box<dyn Any>)
        });
        match self.descriptor.aliases.iter_mut().find(|v| v.marker == marker) {
            Some(alias) => alias.cast = cast,
            None => self.descriptor.aliases.push(Alias { marker, cast }),
        }
        self
    }

    /// Declares a constructor parameter receiving an instance of `R`.
    pub fn dependency<R>(mut self, name: &'static str) -> Self
    where
        R: ?Sized + 'static,
    {
        self.descriptor.dependencies.push(Dependency {
            name,
            marker: TypeMarker::of::<R>(),
            deferred: false,
        });
        self
    }

    /// Declares a constructor parameter receiving a [`Deferred`](crate::Deferred) handle
    /// to the provider of `R`.
    pub fn deferred<R>(mut self, name: &'static str) -> Self
    where
        R: ?Sized + 'static,
    {
        self.descriptor.dependencies.push(Dependency {
            name,
            marker: TypeMarker::of::<R>(),
            deferred: true,
        });
        self
    }

    /// Sets the function building the component from its resolved arguments.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Arguments) -> Result<T, StdError> + Send + Sync + 'static,
    {
        self.descriptor.factory = Some(Arc::new(move |args: &Arguments| {
            Ok(Arc::new(factory(args)?) as Instance)
        }));
        self
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn into_descriptor(self) -> Descriptor {
        self.descriptor
    }
}

/// Trait for types that declare themselves as components.
///
/// This is what the `Injectable` and `Module` derives and the `#[component]` attribute
/// generate. Implement it by hand when the macros do not fit.
///
/// # Examples
///
/// ```rust
/// use pid::{Arguments, Bootstrap, Component, Injectable, Registry, StdError};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// impl Clock {
///     fn now(&self) -> u64 {
///         42
///     }
/// }
///
/// impl Injectable for Clock {
///     fn component() -> Component<Self> {
///         Component::injectable()
///     }
///
///     fn construct(_args: &Arguments) -> Result<Self, StdError> {
///         Ok(Self)
///     }
/// }
///
/// struct AppModule {
///     clock: Arc<Clock>,
/// }
///
/// impl Injectable for AppModule {
///     fn component() -> Component<Self> {
///         Component::module()
///             .provider::<Clock>()
///             .dependency::<Clock>("clock")
///     }
///
///     fn construct(args: &Arguments) -> Result<Self, StdError> {
///         Ok(Self { clock: args.get("clock")? })
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.add::<Clock>().add::<AppModule>();
/// let app = Bootstrap::resolve::<AppModule>(&registry).unwrap();
/// assert_eq!(app.clock.now(), 42);
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Declares the component. A factory set here takes precedence over
    /// [`Injectable::construct`].
    fn component() -> Component<Self>;

    /// Builds the component from its resolved arguments.
    fn construct(args: &Arguments) -> Result<Self, StdError>;
}
