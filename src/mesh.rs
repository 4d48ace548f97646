//! The realized [`Mesh`] handed to solver, writer and load-balancing code.
//!
//! A mesh owns flat node coordinates, element connectivity grouped by the
//! block each element came from, and boundary regions keyed by patch name.
//! The periodic connector may later annotate node correspondences; it never
//! moves nodes or changes connectivity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::{MeshGenError, Result};
use crate::topology::cell_type::CellType;
use crate::topology::periodic::NodeEquivalence;

/// Elements realized from one block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementGroup {
    /// Originating block id (the region tag).
    pub block: usize,
    /// Partition id recorded on the block.
    pub partition: usize,
    pub cell_type: CellType,
    /// Global index of the first element of this group.
    pub first_element: usize,
    /// Node indices, `cell_type.node_count()` per element.
    pub connectivity: Vec<usize>,
}

impl ElementGroup {
    pub fn len(&self) -> usize {
        self.connectivity.len() / self.cell_type.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.connectivity.is_empty()
    }

    /// Global element indices covered by this group.
    pub fn elements(&self) -> std::ops::Range<usize> {
        self.first_element..self.first_element + self.len()
    }

    /// Iterate over element node tuples.
    pub fn cells(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.connectivity.chunks_exact(self.cell_type.node_count())
    }
}

/// One boundary face and the element it bounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFace {
    /// Outward-oriented node indices.
    pub nodes: Vec<usize>,
    /// Global index of the adjacent element.
    pub element: usize,
}

/// Boundary faces and nodes tagged by one patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRegion {
    pub name: String,
    pub cell_type: CellType,
    pub faces: Vec<BoundaryFace>,
    /// Sorted, de-duplicated nodes of all faces.
    pub nodes: Vec<usize>,
}

impl BoundaryRegion {
    pub(crate) fn new(name: &str, cell_type: CellType, faces: Vec<BoundaryFace>) -> Self {
        let mut nodes: Vec<usize> = faces.iter().flat_map(|f| f.nodes.iter().copied()).collect();
        nodes.sort_unstable();
        nodes.dedup();
        Self {
            name: name.to_string(),
            cell_type,
            faces,
            nodes,
        }
    }
}

/// Node correspondence produced for one periodic link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodicCorrespondence {
    pub source: String,
    pub destination: String,
    pub translation: Vec<f64>,
    /// Tolerance used for matching.
    pub tolerance: f64,
    /// `(source node, destination node)` pairs ordered by source node.
    pub pairs: Vec<(usize, usize)>,
}

/// Realized nodes, elements and boundary regions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    dimension: usize,
    coordinates: Vec<f64>,
    groups: Vec<ElementGroup>,
    boundary: BTreeMap<String, BoundaryRegion>,
    nb_partitions: usize,
    periodic: Vec<PeriodicCorrespondence>,
    equivalence: NodeEquivalence,
}

impl Mesh {
    pub(crate) fn from_parts(
        dimension: usize,
        coordinates: Vec<f64>,
        groups: Vec<ElementGroup>,
        boundary: BTreeMap<String, BoundaryRegion>,
        nb_partitions: usize,
    ) -> Self {
        Self {
            dimension,
            coordinates,
            groups,
            boundary,
            nb_partitions,
            periodic: Vec::new(),
            equivalence: NodeEquivalence::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn nb_nodes(&self) -> usize {
        self.coordinates.len() / self.dimension
    }

    /// Flat node coordinates, `dimension` values per node.
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    /// Coordinates of node `node`.
    pub fn node(&self, node: usize) -> Result<&[f64]> {
        if node >= self.nb_nodes() {
            return Err(MeshGenError::IndexOutOfRange {
                what: "node",
                index: node,
                len: self.nb_nodes(),
            });
        }
        Ok(self.coords_of(node))
    }

    #[inline]
    pub(crate) fn coords_of(&self, node: usize) -> &[f64] {
        &self.coordinates[node * self.dimension..(node + 1) * self.dimension]
    }

    /// Element groups, one per block, in block order.
    pub fn element_groups(&self) -> &[ElementGroup] {
        &self.groups
    }

    pub fn nb_elements(&self) -> usize {
        self.groups.iter().map(ElementGroup::len).sum()
    }

    /// Iterate `(element, block, nodes)` over all elements in index order.
    pub fn elements(&self) -> impl Iterator<Item = (usize, usize, &[usize])> + '_ {
        self.groups.iter().flat_map(|g| {
            g.cells()
                .enumerate()
                .map(move |(i, nodes)| (g.first_element + i, g.block, nodes))
        })
    }

    fn group_of(&self, element: usize) -> Result<&ElementGroup> {
        let pos = self
            .groups
            .partition_point(|g| g.first_element + g.len() <= element);
        self.groups
            .get(pos)
            .filter(|g| element >= g.first_element)
            .ok_or(MeshGenError::IndexOutOfRange {
                what: "element",
                index: element,
                len: self.nb_elements(),
            })
    }

    /// Node tuple of element `element`.
    pub fn element_nodes(&self, element: usize) -> Result<&[usize]> {
        let group = self.group_of(element)?;
        let n = group.cell_type.node_count();
        let local = element - group.first_element;
        Ok(&group.connectivity[local * n..(local + 1) * n])
    }

    /// Originating block of element `element`.
    pub fn element_block(&self, element: usize) -> Result<usize> {
        Ok(self.group_of(element)?.block)
    }

    pub fn nb_partitions(&self) -> usize {
        self.nb_partitions
    }

    /// Elements whose block was assigned to `partition`, in index order.
    pub fn elements_in_partition(&self, partition: usize) -> Vec<usize> {
        self.groups
            .iter()
            .filter(|g| g.partition == partition)
            .flat_map(ElementGroup::elements)
            .collect()
    }

    pub fn boundary(&self, name: &str) -> Option<&BoundaryRegion> {
        self.boundary.get(name)
    }

    /// Boundary regions ordered by name.
    pub fn boundary_regions(&self) -> impl Iterator<Item = &BoundaryRegion> + '_ {
        self.boundary.values()
    }

    /// Periodic correspondences recorded by the connector, in link order.
    pub fn periodic_links(&self) -> &[PeriodicCorrespondence] {
        &self.periodic
    }

    pub fn is_periodic(&self) -> bool {
        !self.periodic.is_empty()
    }

    /// Canonical node of the periodic class containing `node`.
    pub fn periodic_representative(&self, node: usize) -> usize {
        self.equivalence.peek_representative(node)
    }

    pub fn periodic_equivalence(&self) -> &NodeEquivalence {
        &self.equivalence
    }

    pub(crate) fn set_periodic(
        &mut self,
        periodic: Vec<PeriodicCorrespondence>,
        equivalence: NodeEquivalence,
    ) {
        self.periodic = periodic;
        self.equivalence = equivalence;
    }

    /// Shortest edge among the given faces, or `None` without non-degenerate edges.
    pub fn min_edge_length<'a, I>(&self, faces: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a BoundaryFace>,
    {
        let mut best: Option<f64> = None;
        for face in faces {
            let n = face.nodes.len();
            let edges = if n == 2 { 1 } else { n };
            for i in 0..edges {
                let (a, b) = (face.nodes[i], face.nodes[(i + 1) % n]);
                let len = distance(self.coords_of(a), self.coords_of(b));
                if len > 0.0 {
                    best = Some(best.map_or(len, |cur| cur.min(len)));
                }
            }
        }
        best
    }
}

pub(crate) fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

impl DebugInvariants for Mesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Mesh");
    }

    fn validate_invariants(&self) -> Result<()> {
        if !(2..=3).contains(&self.dimension) {
            return Err(MeshGenError::InvalidDimension(self.dimension));
        }
        let nb_nodes = self.nb_nodes();
        if self.coordinates.len() % self.dimension != 0 {
            return Err(MeshGenError::InvariantViolation(format!(
                "coordinate array length {} is not a multiple of {}",
                self.coordinates.len(),
                self.dimension
            )));
        }
        let mut expected_first = 0;
        for g in &self.groups {
            if g.first_element != expected_first {
                return Err(MeshGenError::InvariantViolation(format!(
                    "block {} elements start at {}, expected {expected_first}",
                    g.block, g.first_element
                )));
            }
            if g.connectivity.len() % g.cell_type.node_count() != 0 {
                return Err(MeshGenError::InvariantViolation(format!(
                    "block {} connectivity is not a multiple of {}",
                    g.block,
                    g.cell_type.node_count()
                )));
            }
            if let Some(&bad) = g.connectivity.iter().find(|&&n| n >= nb_nodes) {
                return Err(MeshGenError::InvariantViolation(format!(
                    "block {} references node {bad} of {nb_nodes}",
                    g.block
                )));
            }
            expected_first += g.len();
        }
        let nb_elements = expected_first;
        for region in self.boundary.values() {
            for face in &region.faces {
                if face.element >= nb_elements || face.nodes.iter().any(|&n| n >= nb_nodes) {
                    return Err(MeshGenError::InvariantViolation(format!(
                        "boundary `{}` face {:?} is out of range",
                        region.name, face.nodes
                    )));
                }
            }
        }
        for link in &self.periodic {
            if let Some(&(a, b)) = link.pairs.iter().find(|(a, b)| *a >= nb_nodes || *b >= nb_nodes) {
                return Err(MeshGenError::InvariantViolation(format!(
                    "periodic pair ({a}, {b}) of `{}` is out of range",
                    link.source
                )));
            }
        }
        Ok(())
    }
}
