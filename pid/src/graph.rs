use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

use dashmap::DashSet;

use crate::component::Descriptor;
use crate::pool::{InstancePool, ProvidersPool};
use crate::{Registry, ResolveError, ResolveOptions, Tag, TypeMarker};

/// Index of a node in the graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }
}

pub(crate) enum Export {
    /// A provider looked up in the module's child scope.
    Provider(TypeMarker),
    /// A re-exported module. Must be one of the imports.
    Module(NodeId),
}

pub(crate) enum NodeKind {
    Leaf,
    Module {
        imports: Vec<NodeId>,
        exports: Vec<Export>,
    },
}

/// Providers visible from a node.
pub(crate) struct Scope {
    /// Built from the node's declared providers.
    pub(crate) own: ProvidersPool,
    /// Parent's child pool for leaves, merged import exports for modules.
    pub(crate) inherited: ProvidersPool,
    /// `inherited` overridden by `own`; handed down to declared providers.
    pub(crate) child: ProvidersPool,
}

pub(crate) struct Node {
    pub(crate) descriptor: Arc<Descriptor>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) providers: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    scope: OnceLock<Arc<Scope>>,
    exports: OnceLock<Arc<ProvidersPool>>,
}

impl Node {
    fn new(descriptor: Arc<Descriptor>, parent: Option<NodeId>) -> Self {
        Self {
            descriptor,
            parent,
            providers: Vec::new(),
            kind: NodeKind::Leaf,
            scope: OnceLock::new(),
            exports: OnceLock::new(),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.descriptor.name()
    }
}

/// Runtime graph materialized from a registry for one root component.
///
/// Module nodes are unique per module type. Provider nodes are created per declaration
/// site, so the same provider type declared in two places gets two nodes and two
/// independent instances. Scopes and export pools do not depend on the tag and are
/// computed once on first use.
pub(crate) struct Graph {
    nodes: Vec<Node>,
    pub(crate) options: ResolveOptions,
    pub(crate) instances: InstancePool,
    pub(crate) building: DashSet<(NodeId, Tag)>,
}

impl Graph {
    pub(crate) fn materialize(
        registry: &Registry,
        root: TypeMarker,
    ) -> Result<(Self, NodeId), ResolveError> {
        let mut builder = GraphBuilder {
            registry,
            nodes: Vec::new(),
            modules: HashMap::new(),
            declaring: Vec::new(),
        };
        let root = builder.build(root, None)?;
        tracing::debug!(
            root = builder.nodes[root.0].name(),
            nodes = builder.nodes.len(),
            "Materialized graph"
        );
        let graph = Self {
            nodes: builder.nodes,
            options: registry.options().clone(),
            instances: InstancePool::default(),
            building: DashSet::new(),
        };
        Ok((graph, root))
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn scope(&self, id: NodeId) -> Result<Arc<Scope>, ResolveError> {
        let node = self.node(id);
        if let Some(scope) = node.scope.get() {
            return Ok(scope.clone());
        }
        let inherited = match &node.kind {
            NodeKind::Module { imports, .. } => {
                let mut pool = ProvidersPool::default();
                for import in imports {
                    let exports = self.exports(*import)?;
                    pool.merge(&exports);
                }
                pool
            }
            NodeKind::Leaf => match node.parent {
                Some(parent) => self.scope(parent)?.child.clone(),
                None => ProvidersPool::default(),
            },
        };
        let mut own = ProvidersPool::default();
        for provider in &node.providers {
            own.add(*provider, &self.node(*provider).descriptor);
        }
        let mut child = inherited.clone();
        child.merge(&own);
        tracing::trace!(
            component = node.name(),
            own = own.len(),
            inherited = inherited.len(),
            "Computed scope"
        );
        let scope = Arc::new(Scope {
            own,
            inherited,
            child,
        });
        Ok(node.scope.get_or_init(|| scope).clone())
    }

    /// Returns the pool a module exposes to its importers.
    ///
    /// Every export is looked up in the module's child scope, including the providers of a
    /// re-exported module, so the module's own providers and later imports win the same
    /// way they do inside the module. Fails with [`ResolveError::UndefinedExport`] listing
    /// every export that is not available.
    pub(crate) fn exports(&self, id: NodeId) -> Result<Arc<ProvidersPool>, ResolveError> {
        let node = self.node(id);
        if let Some(exports) = node.exports.get() {
            return Ok(exports.clone());
        }
        let mut pool = ProvidersPool::default();
        if let NodeKind::Module { imports, exports } = &node.kind {
            let scope = self.scope(id)?;
            let mut exported = BTreeSet::new();
            let mut undefined = Vec::new();
            for export in exports {
                let markers = match export {
                    Export::Module(module) if imports.contains(module) => self
                        .exports(*module)?
                        .nodes()
                        .into_iter()
                        .map(|v| self.node(v).descriptor.marker())
                        .collect(),
                    Export::Module(module) => {
                        undefined.push(self.node(*module).name());
                        continue;
                    }
                    Export::Provider(marker) => vec![*marker],
                };
                for marker in markers {
                    match scope.child.get(&marker)? {
                        Some(entry) => {
                            exported.insert(entry.node);
                        }
                        None => undefined.push(marker.name()),
                    }
                }
            }
            if !undefined.is_empty() {
                return Err(ResolveError::UndefinedExport {
                    module: node.name(),
                    exports: undefined,
                });
            }
            pool = scope.child.restrict(&exported);
            tracing::trace!(
                module = node.name(),
                exports = exported.len(),
                "Computed exports"
            );
        }
        Ok(node.exports.get_or_init(|| Arc::new(pool)).clone())
    }
}

struct GraphBuilder<'a> {
    registry: &'a Registry,
    nodes: Vec<Node>,
    modules: HashMap<TypeMarker, NodeId>,
    /// Leaf providers currently being declared, outermost first.
    declaring: Vec<TypeMarker>,
}

impl GraphBuilder<'_> {
    fn build(&mut self, marker: TypeMarker, parent: Option<NodeId>) -> Result<NodeId, ResolveError> {
        let descriptor = self.descriptor(&marker)?;
        if descriptor.is_module() {
            self.build_module(descriptor)
        } else {
            self.build_leaf(descriptor, parent)
        }
    }

    fn build_module(&mut self, descriptor: Arc<Descriptor>) -> Result<NodeId, ResolveError> {
        if let Some(id) = self.modules.get(&descriptor.marker()) {
            return Ok(*id);
        }
        let id = self.push(descriptor.clone(), None);
        self.modules.insert(descriptor.marker(), id);
        let providers = self.build_all(descriptor.providers(), id)?;
        let mut imports = Vec::with_capacity(descriptor.imports().len());
        for import in descriptor.imports() {
            imports.push(self.build(*import, None)?);
        }
        let mut exports = Vec::with_capacity(descriptor.exports().len());
        for export in descriptor.exports() {
            let exported = self.descriptor(export)?;
            if exported.is_module() {
                exports.push(Export::Module(self.build_module(exported)?));
            } else {
                exports.push(Export::Provider(*export));
            }
        }
        let node = &mut self.nodes[id.0];
        node.providers = providers;
        node.kind = NodeKind::Module { imports, exports };
        Ok(id)
    }

    fn build_leaf(
        &mut self,
        descriptor: Arc<Descriptor>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ResolveError> {
        let marker = descriptor.marker();
        if self.declaring.contains(&marker) {
            let mut chain: Vec<_> = self.declaring.iter().map(|v| v.name()).collect();
            chain.push(marker.name());
            return Err(ResolveError::CircularDependency { chain });
        }
        if !descriptor.imports().is_empty() || !descriptor.exports().is_empty() {
            tracing::warn!(
                component = marker.name(),
                "Imports and exports of an injectable are ignored"
            );
        }
        let id = self.push(descriptor.clone(), parent);
        self.declaring.push(marker);
        let providers = self.build_all(descriptor.providers(), id);
        self.declaring.pop();
        self.nodes[id.0].providers = providers?;
        Ok(id)
    }

    fn build_all(
        &mut self,
        markers: &[TypeMarker],
        parent: NodeId,
    ) -> Result<Vec<NodeId>, ResolveError> {
        markers
            .iter()
            .map(|marker| self.build(*marker, Some(parent)))
            .collect()
    }

    fn descriptor(&self, marker: &TypeMarker) -> Result<Arc<Descriptor>, ResolveError> {
        self.registry
            .descriptor_arc(marker)
            .ok_or(ResolveError::ClassIsNotInjectable {
                component: marker.name(),
            })
    }

    fn push(&mut self, descriptor: Arc<Descriptor>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(descriptor, parent));
        id
    }
}
