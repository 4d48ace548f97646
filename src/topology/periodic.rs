//! Periodic patch declarations and node identification utilities.
//!
//! This module provides:
//! - [`PeriodicLink`] / [`PeriodicLinkSet`], the declared correspondences
//!   between two patches related by a translation.
//! - [`NodeEquivalence`], a union-find structure over mesh node indices.
//! - [`PeriodicMap`], a slave → master map that rejects conflicting masters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mesh_error::{MeshGenError, Result};

/// Source patch nodes translated by `translation` land on destination nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodicLink {
    pub source: String,
    pub destination: String,
    pub translation: Vec<f64>,
}

/// Ordered list of periodic links for one topology.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodicLinkSet {
    dimension: usize,
    links: Vec<PeriodicLink>,
}

impl PeriodicLinkSet {
    pub fn new(dimension: usize) -> Result<Self> {
        crate::topology::point_set::check_dimension(dimension)?;
        Ok(Self {
            dimension,
            links: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Declare `source` periodic with `destination`; returns the link index.
    pub fn add(&mut self, source: &str, destination: &str, translation: &[f64]) -> Result<usize> {
        if translation.len() != self.dimension {
            return Err(MeshGenError::arity(
                format!("translation of periodic link `{source}` -> `{destination}`"),
                self.dimension,
                translation.len(),
            ));
        }
        if let Some(&value) = translation.iter().find(|t| !t.is_finite()) {
            return Err(MeshGenError::InvalidCoordinate {
                what: format!("translation of periodic link `{source}` -> `{destination}`"),
                value,
            });
        }
        self.links.push(PeriodicLink {
            source: source.to_string(),
            destination: destination.to_string(),
            translation: translation.to_vec(),
        });
        Ok(self.links.len() - 1)
    }

    pub fn links(&self) -> &[PeriodicLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Same links with translations padded by zeros to `dimension`.
    pub(crate) fn lifted(&self, dimension: usize) -> Self {
        let links = self
            .links
            .iter()
            .map(|link| {
                let mut translation = link.translation.clone();
                translation.resize(dimension, 0.0);
                PeriodicLink {
                    translation,
                    ..link.clone()
                }
            })
            .collect();
        Self { dimension, links }
    }
}

/// Union-find structure tracking equivalence classes of mesh nodes.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEquivalence {
    parent: BTreeMap<usize, usize>,
    rank: BTreeMap<usize, u32>,
}

impl NodeEquivalence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node as its own class.
    pub fn add_node(&mut self, node: usize) {
        self.parent.entry(node).or_insert(node);
        self.rank.entry(node).or_insert(0);
    }

    /// Iterate over all nodes currently tracked.
    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.parent.keys().copied()
    }

    fn find_root(&mut self, node: usize) -> usize {
        let Some(&parent) = self.parent.get(&node) else {
            self.add_node(node);
            return node;
        };
        if parent == node {
            return node;
        }
        let root = self.find_root(parent);
        self.parent.insert(node, root);
        root
    }

    /// Canonical representative, with path compression.
    pub fn representative(&mut self, node: usize) -> usize {
        self.find_root(node)
    }

    /// Representative without mutating; untracked nodes are their own.
    pub fn peek_representative(&self, node: usize) -> usize {
        let mut current = node;
        while let Some(&parent) = self.parent.get(&current) {
            if parent == current {
                break;
            }
            current = parent;
        }
        current
    }

    /// Union two nodes and return the representative.
    ///
    /// Ties go to the smaller node index so results do not depend on call order.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let ra = self.find_root(a);
        let rb = self.find_root(b);
        if ra == rb {
            return ra;
        }
        let rank_a = self.rank.get(&ra).copied().unwrap_or(0);
        let rank_b = self.rank.get(&rb).copied().unwrap_or(0);
        let (root, child) = match rank_a.cmp(&rank_b) {
            std::cmp::Ordering::Less => (rb, ra),
            std::cmp::Ordering::Greater => (ra, rb),
            std::cmp::Ordering::Equal => {
                let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
                self.rank.insert(root, rank_a + 1);
                (root, child)
            }
        };
        self.parent.insert(child, root);
        root
    }

    /// Partition tracked nodes into classes keyed by representative.
    pub fn classes(&mut self) -> BTreeMap<usize, Vec<usize>> {
        let nodes: Vec<_> = self.nodes().collect();
        let mut classes: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for n in nodes {
            let rep = self.find_root(n);
            classes.entry(rep).or_default().push(n);
        }
        classes
    }
}

/// Slave → master node map.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicMap {
    master_for: BTreeMap<usize, usize>,
}

impl PeriodicMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a master/slave pair.
    ///
    /// Returns an error if the slave already maps to a different master.
    pub fn insert_pair(&mut self, master: usize, slave: usize) -> Result<()> {
        if let Some(&existing) = self.master_for.get(&slave) {
            if existing != master {
                return Err(MeshGenError::PeriodicMappingConflict {
                    slave,
                    existing,
                    new: master,
                });
            }
        }
        self.master_for.insert(slave, master);
        Ok(())
    }

    /// Iterate over `(master, slave)` pairs ordered by slave.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.master_for
            .iter()
            .map(|(&slave, &master)| (master, slave))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_groups_nodes() {
        let mut eq = NodeEquivalence::new();
        eq.union(1, 2);
        assert_eq!(eq.representative(2), eq.representative(1));
        assert_ne!(eq.representative(3), eq.representative(1));
        eq.union(2, 3);
        assert_eq!(eq.representative(3), eq.representative(1));
        assert_eq!(eq.peek_representative(3), 1);
        assert_eq!(eq.classes().get(&1), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn union_is_order_independent() {
        let mut a = NodeEquivalence::new();
        a.union(7, 4);
        let mut b = NodeEquivalence::new();
        b.union(4, 7);
        assert_eq!(a.representative(7), b.representative(7));
        assert_eq!(a.representative(7), 4);
    }

    #[test]
    fn periodic_map_rejects_conflicts() {
        let mut map = PeriodicMap::new();
        map.insert_pair(1, 3).unwrap();
        map.insert_pair(1, 3).unwrap();
        let err = map.insert_pair(2, 3).unwrap_err();
        assert_eq!(
            err,
            MeshGenError::PeriodicMappingConflict {
                slave: 3,
                existing: 1,
                new: 2
            }
        );
    }

    #[test]
    fn link_translation_matches_dimension() {
        let mut links = PeriodicLinkSet::new(2).unwrap();
        assert!(matches!(
            links.add("left", "right", &[1.0, 0.0, 0.0]),
            Err(MeshGenError::ArityMismatch { .. })
        ));
        assert_eq!(links.add("left", "right", &[1.0, 0.0]).unwrap(), 0);
        let lifted = links.lifted(3);
        assert_eq!(lifted.links()[0].translation, vec![1.0, 0.0, 0.0]);
    }
}
