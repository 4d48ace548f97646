//! Sweep a 2D block topology along `z` into a layered 3D block topology.
//!
//! Every stage adds one layer of hex blocks on top of the previous one. For
//! `k` stages over a 2D topology with `n2d` points and `nb2d` blocks:
//!
//! - point `p` of stage boundary `l` (`0..=k`) becomes point `l * n2d + p`,
//!   at height `z = lengths[0] + .. + lengths[l - 1]`;
//! - block `b` of stage `s` becomes block `s * nb2d + b`, with its base quad
//!   on boundary `s` and its top quad on boundary `s + 1`;
//! - the 2D block's edge gradings are copied onto the bottom and top edges,
//!   and the four edges along `z` take the stage grading.
//!
//! 2D patches turn into side walls with the same name. The bases of the first
//! stage and the tops of the last stage are collected into two new patches,
//! `front` and `back` unless renamed through [`Extruder::with_end_patches`].
//!
//! # Example
//! ```rust
//! # fn try_main() -> Result<(), block_mesh::mesh_error::MeshGenError> {
//! use block_mesh::algs::extrude::extrude;
//! use block_mesh::topology::{BlockArrays, PointSet};
//!
//! let points = PointSet::from_rows(2, &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])?;
//! let mut arrays = BlockArrays::new(points)?;
//! arrays.topology.add_blocks(1);
//! arrays.topology.set_corners(0, &[0, 1, 2, 3])?;
//! arrays.topology.set_subdivisions(0, &[2, 2])?;
//!
//! let solid = extrude(&arrays, &[1.0, 3.0], &[2, 6], &[1.0, 2.0])?;
//! assert_eq!(solid.topology.nb_blocks(), 2);
//! assert_eq!(solid.topology.points().len(), 12);
//! assert!(solid.patches.contains("front") && solid.patches.contains("back"));
//! # Ok(())
//! # }
//! # try_main().unwrap();
//! ```

use crate::algs::grading::is_valid_grading;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::{MeshGenError, Result};
use crate::topology::block::{Block, BlockTopology};
use crate::topology::block_arrays::BlockArrays;
use crate::topology::patch::{Face, PatchRegistry};
use crate::topology::point_set::PointSet;
use crate::topology::reference_cell as rc;

const EXTRUSION_AXIS: usize = 2;

/// Turns 2D block arrays into 3D block arrays, one block layer per stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extruder {
    front: String,
    back: String,
}

impl Default for Extruder {
    fn default() -> Self {
        Self {
            front: "front".to_string(),
            back: "back".to_string(),
        }
    }
}

impl Extruder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom names for the patches closing the two ends.
    pub fn with_end_patches(front: &str, back: &str) -> Self {
        Self {
            front: front.to_string(),
            back: back.to_string(),
        }
    }

    pub fn front_patch(&self) -> &str {
        &self.front
    }

    pub fn back_patch(&self) -> &str {
        &self.back
    }

    /// Extrude `arrays` through the given stages.
    pub fn extrude(
        &self,
        arrays: &BlockArrays,
        stage_lengths: &[f64],
        stage_segments: &[usize],
        stage_gradings: &[f64],
    ) -> Result<BlockArrays> {
        let dim = arrays.dimension();
        if dim != 2 {
            return Err(MeshGenError::InvalidDimension(dim));
        }
        let nb2d = arrays.topology.nb_blocks();
        self.validate_stages(nb2d, stage_lengths, stage_segments, stage_gradings)?;
        arrays.topology.check_complete()?;
        for name in [&self.front, &self.back] {
            if arrays.patches.contains(name) {
                return Err(MeshGenError::DuplicatePatchName(name.clone()));
            }
        }
        if self.front == self.back {
            return Err(MeshGenError::DuplicatePatchName(self.back.clone()));
        }

        let points = extrude_points(arrays.topology.points(), stage_lengths)?;
        let n2d = arrays.topology.points().len();
        let mut topology = BlockTopology::new(points);
        for (stage, (&segments, &grading)) in stage_segments.iter().zip(stage_gradings).enumerate() {
            for block in arrays.topology.blocks() {
                topology.push_block(extrude_block(block, stage, n2d, segments, grading));
            }
        }
        topology.set_nb_partitions(arrays.topology.nb_partitions());
        topology.debug_assert_invariants();
        log::debug!(
            "extruded {} points x {} layers, {} blocks x {} stages",
            n2d,
            stage_lengths.len() + 1,
            nb2d,
            stage_lengths.len()
        );

        let patches = self.extrude_patches(arrays, &topology, stage_lengths.len())?;
        log::info!(
            "extrusion: {} blocks, {} points, {} patches",
            topology.nb_blocks(),
            topology.points().len(),
            patches.len()
        );
        Ok(BlockArrays {
            topology,
            patches,
            periodic: arrays.periodic.lifted(3),
        })
    }

    fn validate_stages(
        &self,
        nb2d: usize,
        stage_lengths: &[f64],
        stage_segments: &[usize],
        stage_gradings: &[f64],
    ) -> Result<()> {
        let nb_stages = stage_lengths.len();
        if nb_stages == 0 {
            return Err(MeshGenError::EmptyStageList);
        }
        if stage_segments.len() != nb_stages {
            return Err(MeshGenError::arity("stage segments", nb_stages, stage_segments.len()));
        }
        if stage_gradings.len() != nb_stages {
            return Err(MeshGenError::arity("stage gradings", nb_stages, stage_gradings.len()));
        }
        for (stage, &length) in stage_lengths.iter().enumerate() {
            if !length.is_finite() || length <= 0.0 {
                return Err(MeshGenError::InvalidStageLength { stage, length });
            }
        }
        // Stage errors point at the first block of the offending layer.
        if let Some((stage, &count)) = stage_segments.iter().enumerate().find(|(_, c)| **c == 0) {
            return Err(MeshGenError::InvalidSubdivision {
                block: stage * nb2d,
                axis: EXTRUSION_AXIS,
                count,
            });
        }
        if let Some((stage, &value)) = stage_gradings
            .iter()
            .enumerate()
            .find(|(_, g)| !is_valid_grading(**g))
        {
            return Err(MeshGenError::InvalidGrading {
                block: stage * nb2d,
                position: EXTRUSION_AXIS * rc::edges_per_axis(3),
                value,
            });
        }
        Ok(())
    }

    fn extrude_patches(
        &self,
        arrays: &BlockArrays,
        topology: &BlockTopology,
        nb_stages: usize,
    ) -> Result<PatchRegistry> {
        let n2d = arrays.topology.points().len();
        let nb2d = arrays.topology.nb_blocks();
        let mut patches = PatchRegistry::new(3)?;

        for patch in arrays.patches.iter() {
            let walls: Vec<Face> = patch
                .faces()
                .iter()
                .flat_map(|face| {
                    (0..nb_stages).map(move |s| {
                        let (lo, hi) = (s * n2d, (s + 1) * n2d);
                        let mut wall = Vec::with_capacity(4);
                        wall.extend(face.iter().map(|p| p + lo));
                        wall.extend(face.iter().rev().map(|p| p + hi));
                        wall
                    })
                })
                .collect();
            patches.create_patch(patch.name(), &walls)?;
        }

        let ends = |stage: usize, side: usize| -> Result<Vec<Face>> {
            (0..nb2d)
                .map(|b| {
                    let faces = topology.block_faces(stage * nb2d + b)?;
                    Ok(faces[2 * EXTRUSION_AXIS + side].points.clone())
                })
                .collect()
        };
        patches.create_patch(&self.front, &ends(0, 0)?)?;
        patches.create_patch(&self.back, &ends(nb_stages - 1, 1)?)?;
        Ok(patches)
    }
}

/// Convenience wrapper using the default `front`/`back` end patch names.
pub fn extrude(
    arrays: &BlockArrays,
    stage_lengths: &[f64],
    stage_segments: &[usize],
    stage_gradings: &[f64],
) -> Result<BlockArrays> {
    Extruder::default().extrude(arrays, stage_lengths, stage_segments, stage_gradings)
}

fn extrude_points(base: &PointSet, stage_lengths: &[f64]) -> Result<PointSet> {
    let n2d = base.len();
    let mut points = PointSet::create(3, n2d * (stage_lengths.len() + 1))?;
    let mut z = 0.0;
    for layer in 0..=stage_lengths.len() {
        if layer > 0 {
            z += stage_lengths[layer - 1];
        }
        for (p, xy) in base.iter() {
            points.set(layer * n2d + p, &[xy[0], xy[1], z])?;
        }
    }
    Ok(points)
}

fn extrude_block(block: &Block, stage: usize, n2d: usize, segments: usize, grading: f64) -> Block {
    let (lo, hi) = (stage * n2d, (stage + 1) * n2d);
    let corners = block
        .corners()
        .iter()
        .map(|p| p + lo)
        .chain(block.corners().iter().map(|p| p + hi))
        .collect();
    let subdivisions = vec![block.subdivisions()[0], block.subdivisions()[1], segments];
    let gradings = (0..rc::edge_count(3))
        .map(|edge| {
            let axis = rc::edge_axis(3, edge);
            if axis == EXTRUSION_AXIS {
                return grading;
            }
            let (start, _) = rc::edge_corners(3, edge);
            let mut bits = rc::corner_bits(3, start);
            bits[EXTRUSION_AXIS] = 0;
            block.edge_grading(rc::edge_index(2, axis, bits))
        })
        .collect();
    Block::from_parts(corners, subdivisions, gradings, block.partition())
}
