//! Node-to-node matching for periodic patch pairs.
//!
//! For each [`PeriodicLink`], every node of the source boundary region is
//! translated and looked up among the destination region's nodes. Matching
//! uses the Euclidean distance against a tolerance of
//! `relative_tolerance * h`, where `h` is the shortest non-degenerate
//! boundary edge of the two regions. Because the test is a distance, a match
//! from `a` to `b` under `t` is also a match from `b` to `a` under `-t`.
//!
//! Destination nodes are bucketed in a uniform grid whose cell size equals the
//! tolerance, so each lookup only inspects the `3^d` cells around the target.
//!
//! The connector never moves nodes. Results are stored on the [`Mesh`] only
//! when every link matches; on error the mesh is left untouched.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use itertools::iproduct;

use crate::config::PeriodicOptions;
use crate::debug_invariants::DebugInvariants;
use crate::mesh::{Mesh, PeriodicCorrespondence, distance};
use crate::mesh_error::{MeshGenError, Result};
use crate::topology::periodic::{NodeEquivalence, PeriodicLink, PeriodicMap};

type CellKey = [i64; 3];

/// Uniform hash grid over a set of mesh nodes.
struct NodeGrid {
    cell: f64,
    buckets: HashMap<CellKey, Vec<usize>>,
}

impl NodeGrid {
    fn new(mesh: &Mesh, nodes: &[usize], cell: f64) -> Self {
        let mut buckets: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for &n in nodes {
            buckets.entry(Self::key(mesh.coords_of(n), cell)).or_default().push(n);
        }
        Self { cell, buckets }
    }

    /// Cell of `xyz`; coordinates far beyond `i64` cells saturate into the outermost cell.
    fn key(xyz: &[f64], cell: f64) -> CellKey {
        let mut key = [0; 3];
        for (k, x) in key.iter_mut().zip(xyz) {
            *k = (x / cell).floor() as i64;
        }
        key
    }

    /// Nodes within `tolerance` of `target`, ascending.
    fn within(&self, mesh: &Mesh, target: &[f64], tolerance: f64) -> Vec<usize> {
        let center = Self::key(target, self.cell);
        let dz = if target.len() == 3 { -1..=1 } else { 0..=0 };
        let mut found: Vec<usize> = iproduct!(-1..=1i64, -1..=1i64, dz)
            .filter_map(|(dx, dy, dz)| {
                let key = [
                    center[0].saturating_add(dx),
                    center[1].saturating_add(dy),
                    center[2].saturating_add(dz),
                ];
                self.buckets.get(&key)
            })
            .flatten()
            .copied()
            .filter(|&n| distance(mesh.coords_of(n), target) <= tolerance)
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}

/// Matches periodic boundary regions of a built mesh.
#[derive(Clone, Debug, Default)]
pub struct PeriodicConnector {
    options: PeriodicOptions,
}

impl PeriodicConnector {
    pub fn new(options: PeriodicOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PeriodicOptions {
        &self.options
    }

    /// Match the nodes of one link without modifying the mesh.
    ///
    /// `index` is the position of `link` in its link set and is only used to
    /// label errors.
    pub fn match_link(&self, mesh: &Mesh, index: usize, link: &PeriodicLink) -> Result<PeriodicCorrespondence> {
        if link.translation.len() != mesh.dimension() {
            return Err(MeshGenError::arity(
                format!("translation of periodic link {index}"),
                mesh.dimension(),
                link.translation.len(),
            ));
        }
        let source = mesh
            .boundary(&link.source)
            .ok_or_else(|| MeshGenError::UnknownPatch(link.source.clone()))?;
        let destination = mesh
            .boundary(&link.destination)
            .ok_or_else(|| MeshGenError::UnknownPatch(link.destination.clone()))?;

        let tolerance = match mesh.min_edge_length(source.faces.iter().chain(&destination.faces)) {
            Some(h) => self.options.relative_tolerance * h,
            None => {
                log::warn!(
                    "periodic link {index}: `{}` and `{}` have no non-degenerate edge, using absolute tolerance {:e}",
                    link.source,
                    link.destination,
                    self.options.absolute_tolerance
                );
                self.options.absolute_tolerance
            }
        };

        let grid = NodeGrid::new(mesh, &destination.nodes, tolerance);
        let mut map = PeriodicMap::new();
        let mut target = vec![0.0; mesh.dimension()];
        for &node in &source.nodes {
            for ((t, x), shift) in target.iter_mut().zip(mesh.coords_of(node)).zip(&link.translation) {
                *t = x + shift;
            }
            let candidates = grid.within(mesh, &target, tolerance);
            match candidates.len() {
                0 => {
                    return Err(MeshGenError::UnmatchedPeriodicNode {
                        link: index,
                        source_patch: link.source.clone(),
                        node,
                        tolerance,
                    });
                }
                1 => map.insert_pair(node, candidates[0])?,
                _ => {
                    return Err(MeshGenError::AmbiguousPeriodicMatch {
                        link: index,
                        node,
                        candidates,
                    });
                }
            }
        }

        let mut pairs: Vec<(usize, usize)> = map.pairs().collect();
        pairs.sort_unstable();
        log::debug!(
            "periodic link {index} `{}` -> `{}`: {} node pairs, tolerance {tolerance:e}",
            link.source,
            link.destination,
            pairs.len()
        );
        Ok(PeriodicCorrespondence {
            source: link.source.clone(),
            destination: link.destination.clone(),
            translation: link.translation.clone(),
            tolerance,
            pairs,
        })
    }

    /// Match every link and record the correspondences on `mesh`.
    ///
    /// Replaces any previous periodic annotation of the mesh.
    pub fn link(&self, mesh: &mut Mesh, links: &[PeriodicLink]) -> Result<()> {
        let correspondences = links
            .iter()
            .enumerate()
            .map(|(i, link)| self.match_link(mesh, i, link))
            .collect::<Result<Vec<_>>>()?;

        let mut equivalence = NodeEquivalence::new();
        for corr in &correspondences {
            for &(a, b) in &corr.pairs {
                equivalence.union(a, b);
            }
        }
        let classes: BTreeMap<usize, Vec<usize>> = equivalence.classes();
        log::info!(
            "periodic connection: {} links, {} identified node classes",
            correspondences.len(),
            classes.len()
        );
        mesh.set_periodic(correspondences, equivalence);
        mesh.debug_assert_invariants();
        Ok(())
    }
}

/// Convenience wrapper around [`PeriodicConnector::link`] with default options.
pub fn link(mesh: &mut Mesh, links: &[PeriodicLink]) -> Result<()> {
    PeriodicConnector::default().link(mesh, links)
}
