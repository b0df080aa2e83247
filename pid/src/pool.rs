use std::collections::{BTreeSet, HashMap};

use dashmap::DashMap;

use crate::component::{Cast, Descriptor, Instance};
use crate::graph::NodeId;
use crate::{ResolveError, Tag, TypeMarker};

/// A provider node registered under one marker.
#[derive(Clone)]
pub(crate) struct PoolEntry {
    pub(crate) node: NodeId,
    pub(crate) name: &'static str,
    pub(crate) cast: Cast,
}

/// Mapping from requested markers to the provider nodes satisfying them.
///
/// A node is inserted under every marker of its alias set. Several entries under the same
/// marker are kept as they are and reported as ambiguous only when that marker is looked
/// up, so unrelated lookups in the same pool keep working.
#[derive(Clone, Default)]
pub(crate) struct ProvidersPool {
    entries: HashMap<TypeMarker, Vec<PoolEntry>>,
}

impl ProvidersPool {
    pub(crate) fn add(&mut self, node: NodeId, descriptor: &Descriptor) -> &mut Self {
        for alias in &descriptor.aliases {
            self.push(
                alias.marker,
                PoolEntry {
                    node,
                    name: descriptor.name(),
                    cast: alias.cast.clone(),
                },
            );
        }
        self
    }

    /// Overrides this pool with `other` marker by marker.
    ///
    /// For every marker known to `other`, its entries replace the entries of this pool.
    /// Markers that `other` does not know are kept. This is how a child scope shadows its
    /// parent and how a later import shadows an earlier one.
    pub(crate) fn merge(&mut self, other: &ProvidersPool) -> &mut Self {
        for (marker, entries) in &other.entries {
            self.entries.insert(*marker, entries.clone());
        }
        self
    }

    pub(crate) fn get(&self, marker: &TypeMarker) -> Result<Option<&PoolEntry>, ResolveError> {
        match self.entries.get(marker).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([entry]) => Ok(Some(entry)),
            Some(entries) => Err(ResolveError::AmbiguousAlias {
                marker: *marker,
                candidates: entries.iter().map(|v| v.name).collect(),
            }),
        }
    }

    /// Existence check. Ambiguous markers fail the same way [`ProvidersPool::get`] does.
    pub(crate) fn has(&self, marker: &TypeMarker) -> Result<bool, ResolveError> {
        Ok(self.get(marker)?.is_some())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct provider nodes of this pool.
    pub(crate) fn nodes(&self) -> BTreeSet<NodeId> {
        self.entries.values().flatten().map(|v| v.node).collect()
    }

    /// Copy of this pool keeping only the entries of `nodes`.
    pub(crate) fn restrict(&self, nodes: &BTreeSet<NodeId>) -> ProvidersPool {
        let mut pool = ProvidersPool::default();
        for (marker, entries) in &self.entries {
            for entry in entries.iter().filter(|v| nodes.contains(&v.node)) {
                pool.push(*marker, entry.clone());
            }
        }
        pool
    }

    fn push(&mut self, marker: TypeMarker, entry: PoolEntry) {
        let entries = self.entries.entry(marker).or_default();
        if !entries.iter().any(|v| v.node == entry.node) {
            entries.push(entry);
        }
    }
}

/// Built instances keyed by provider node and tag.
///
/// Append-only: an instance is never replaced once inserted.
#[derive(Default)]
pub(crate) struct InstancePool {
    instances: DashMap<(NodeId, Tag), Instance>,
}

impl InstancePool {
    pub(crate) fn get(&self, node: NodeId, tag: &Tag) -> Option<Instance> {
        self.instances
            .get(&(node, tag.clone()))
            .map(|v| v.value().clone())
    }

    /// Stores `instance` unless another one was stored first, returning the stored one.
    pub(crate) fn insert(&self, node: NodeId, tag: Tag, instance: Instance) -> Instance {
        self.instances.entry((node, tag)).or_insert(instance).clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.instances.len()
    }
}
