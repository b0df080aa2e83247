use std::fmt;

use crate::TypeMarker;

/// Type alias for boxed errors that can be sent across threads.
///
/// Factories return this error type, so any error implementing `std::error::Error` can be
/// propagated out of a factory with `?`.
pub type StdError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while materializing or resolving a component graph.
///
/// Every error aborts the whole resolution. Chains are listed from the outermost
/// component to the one that failed.
#[derive(Debug)]
pub enum ResolveError {
    /// A type used as root, provider, import or export was never registered.
    ClassIsNotInjectable { component: &'static str },
    /// A dependency is absent from both the own and the inherited providers pools.
    CannotResolveDependency {
        component: &'static str,
        parameter: &'static str,
        marker: TypeMarker,
        chain: Vec<&'static str>,
    },
    /// More than one provider in the same pool satisfies the requested marker.
    AmbiguousAlias {
        marker: TypeMarker,
        candidates: Vec<&'static str>,
    },
    /// A module exports something that is not available in its scope.
    UndefinedExport {
        module: &'static str,
        exports: Vec<&'static str>,
    },
    /// A component was requested again while it was still being built.
    CircularDependency { chain: Vec<&'static str> },
    /// A factory resolved one of its own not yet built dependencies through a deferred handle.
    SelfResolution {
        component: &'static str,
        chain: Vec<&'static str>,
    },
    /// The resolution chain grew deeper than the configured limit.
    DepthLimitExceeded {
        limit: usize,
        chain: Vec<&'static str>,
    },
    /// A registered component has no factory.
    MissingFactory { component: &'static str },
    /// A factory requested an argument that was not declared or has another type.
    ArgumentMismatch {
        component: &'static str,
        parameter: String,
        expected: &'static str,
    },
    /// A factory returned an error.
    Factory {
        component: &'static str,
        source: StdError,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::ClassIsNotInjectable { component } => {
                write!(f, "Class is not injectable: {component}")
            }
            ResolveError::CannotResolveDependency {
                component,
                parameter,
                marker,
                chain,
            } => {
                write!(
                    f,
                    "Cannot resolve dependency:\n{component}(..., {parameter}: {marker}, ...)"
                )?;
                for (depth, name) in chain.iter().rev().enumerate() {
                    write!(f, "\n{}^- {name}", "\t".repeat(depth))?;
                }
                Ok(())
            }
            ResolveError::AmbiguousAlias { marker, candidates } => write!(
                f,
                "Multiple providers for alias {marker}: {}",
                candidates.join(", ")
            ),
            ResolveError::UndefinedExport { module, exports } => write!(
                f,
                "Module {module} exports undefined components: {}",
                exports.join(", ")
            ),
            ResolveError::CircularDependency { chain } => {
                write!(f, "Circular dependency detected: {}", chain.join(" -> "))
            }
            ResolveError::SelfResolution { component, chain } => write!(
                f,
                "Component {component} is resolved manually while it is still being built \
                 ({}); resolve deferred dependencies in methods, not in factories",
                chain.join(" -> ")
            ),
            ResolveError::DepthLimitExceeded { limit, chain } => write!(
                f,
                "Resolution depth limit {limit} exceeded: {}",
                chain.join(" -> ")
            ),
            ResolveError::MissingFactory { component } => {
                write!(f, "Component {component} has no factory")
            }
            ResolveError::ArgumentMismatch {
                component,
                parameter,
                expected,
            } => write!(
                f,
                "Component {component} has no argument {parameter} of type {expected}"
            ),
            ResolveError::Factory { component, source } => {
                write!(f, "Factory of {component} failed: {source}")
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Factory { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl ResolveError {
    /// Converts a factory error back into a resolution error.
    ///
    /// Resolution errors raised inside a factory (for example by a deferred handle) are
    /// returned unchanged; everything else is wrapped into [`ResolveError::Factory`].
    pub(crate) fn from_factory(component: &'static str, err: StdError) -> Self {
        match err.downcast::<ResolveError>() {
            Ok(err) => *err,
            Err(source) => ResolveError::Factory { component, source },
        }
    }
}
