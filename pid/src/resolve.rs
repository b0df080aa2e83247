use std::any::Any;
use std::sync::Arc;

use dashmap::DashSet;

use crate::component::Instance;
use crate::graph::{Graph, NodeId, NodeKind, Scope};
use crate::inject::{Argument, Arguments, RawDeferred};
use crate::{ResolveError, Tag};

/// Where a resolution session started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Origin {
    Container,
    Deferred,
}

/// Components being resolved in the current session, innermost last.
struct Trace<'a> {
    name: &'static str,
    parent: Option<&'a Trace<'a>>,
    depth: usize,
    origin: Origin,
}

impl<'a> Trace<'a> {
    fn new(name: &'static str, parent: Option<&'a Trace<'a>>, origin: Origin) -> Self {
        Self {
            name,
            parent,
            depth: parent.map_or(1, |v| v.depth + 1),
            origin: parent.map_or(origin, |v| v.origin),
        }
    }

    fn chain(&self) -> Vec<&'static str> {
        let mut chain = Vec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(trace) = current {
            chain.push(trace.name);
            current = trace.parent;
        }
        chain.reverse();
        chain
    }
}

/// Marks `(node, tag)` as being built until dropped.
struct BuildGuard<'a> {
    building: &'a DashSet<(NodeId, Tag)>,
    key: (NodeId, Tag),
}

impl<'a> BuildGuard<'a> {
    fn enter(building: &'a DashSet<(NodeId, Tag)>, node: NodeId, tag: &Tag) -> Option<Self> {
        let key = (node, tag.clone());
        building
            .insert(key.clone())
            .then_some(Self { building, key })
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.building.remove(&self.key);
    }
}

impl Graph {
    pub(crate) fn resolve_root(
        self: &Arc<Self>,
        node: NodeId,
        tag: &Tag,
    ) -> Result<Instance, ResolveError> {
        self.resolve(node, tag, None, Origin::Container)
    }

    pub(crate) fn resolve_deferred(
        self: &Arc<Self>,
        node: NodeId,
        tag: &Tag,
    ) -> Result<Instance, ResolveError> {
        self.resolve(node, tag, None, Origin::Deferred)
    }

    fn resolve(
        self: &Arc<Self>,
        id: NodeId,
        tag: &Tag,
        parent: Option<&Trace<'_>>,
        origin: Origin,
    ) -> Result<Instance, ResolveError> {
        let node = self.node(id);
        if let Some(instance) = self.instances.get(id, tag) {
            tracing::trace!(component = node.name(), tag = %tag, "Reusing cached instance");
            return Ok(instance);
        }
        let trace = Trace::new(node.name(), parent, origin);
        if trace.depth > self.options.max_depth {
            return Err(ResolveError::DepthLimitExceeded {
                limit: self.options.max_depth,
                chain: trace.chain(),
            });
        }
        let Some(_guard) = BuildGuard::enter(&self.building, id, tag) else {
            let chain = trace.chain();
            return Err(match trace.origin {
                Origin::Container => ResolveError::CircularDependency { chain },
                Origin::Deferred => ResolveError::SelfResolution {
                    component: node.name(),
                    chain,
                },
            });
        };
        let factory = node
            .descriptor
            .factory
            .clone()
            .ok_or(ResolveError::MissingFactory {
                component: node.name(),
            })?;

        if let NodeKind::Module { imports, .. } = &node.kind {
            for import in imports {
                self.resolve(*import, tag, Some(&trace), origin)?;
                tracing::trace!(
                    module = node.name(),
                    import = self.node(*import).name(),
                    "Resolved import"
                );
            }
        }
        let scope = self.scope(id)?;
        if node.descriptor.is_module() {
            self.exports(id)?;
        }
        if self.options.eager_providers {
            for provider in &node.providers {
                self.resolve(*provider, tag, Some(&trace), origin)?;
            }
        }

        let args = self.bind(id, &scope, tag, &trace)?;
        let instance = factory(&args).map_err(|err| ResolveError::from_factory(node.name(), err))?;
        let instance = self.instances.insert(id, tag.clone(), instance);
        tracing::debug!(component = node.name(), tag = %tag, "Built instance");
        Ok(instance)
    }

    fn bind(
        self: &Arc<Self>,
        id: NodeId,
        scope: &Scope,
        tag: &Tag,
        trace: &Trace<'_>,
    ) -> Result<Arguments, ResolveError> {
        let descriptor = &self.node(id).descriptor;
        let mut args = Arguments::new(descriptor.name(), tag.clone());
        for dependency in descriptor.dependencies() {
            let marker = dependency.marker();
            if marker.is_tag() && !dependency.is_deferred() {
                let value: Box<dyn Any> = Box::new(Arc::new(tag.clone()));
                args.insert(dependency.name(), Argument::Instance(value));
                continue;
            }
            let pool = if scope.own.has(&marker)? {
                &scope.own
            } else {
                &scope.inherited
            };
            let entry = pool.get(&marker)?.ok_or_else(|| ResolveError::CannotResolveDependency {
                component: descriptor.name(),
                parameter: dependency.name(),
                marker,
                chain: trace.chain(),
            })?;
            let argument = if dependency.is_deferred() {
                Argument::Deferred(RawDeferred::new(
                    self.clone(),
                    entry.node,
                    tag.clone(),
                    entry.cast.clone(),
                ))
            } else {
                let instance = self.resolve(entry.node, tag, Some(trace), trace.origin)?;
                let value = (entry.cast)(&instance).ok_or(ResolveError::ArgumentMismatch {
                    component: descriptor.name(),
                    parameter: dependency.name().to_string(),
                    expected: marker.name(),
                })?;
                Argument::Instance(value)
            };
            args.insert(dependency.name(), argument);
        }
        Ok(args)
    }
}
