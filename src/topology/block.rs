//! Block records and the [`BlockTopology`] that owns them.
//!
//! A block is a logical quad (2D) or hex (3D) spanned by corner points of the
//! owned [`PointSet`]. Each block carries one subdivision count per logical
//! axis and one grading factor per edge; see
//! [`reference_cell`](crate::topology::reference_cell) for the numbering.

use std::ops::Range;

use serde::Serialize;

use crate::algs::grading;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::{MeshGenError, Result};
use crate::topology::point_set::PointSet;
use crate::topology::reference_cell as rc;

/// One logical block of the topology.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Block {
    corners: Vec<usize>,
    subdivisions: Vec<usize>,
    gradings: Vec<f64>,
    partition: usize,
}

impl Block {
    /// Corner point indices, empty until set.
    pub fn corners(&self) -> &[usize] {
        &self.corners
    }

    /// Cells per logical axis, empty until set.
    pub fn subdivisions(&self) -> &[usize] {
        &self.subdivisions
    }

    /// One grading factor per edge, empty until set (meaning uniform).
    pub fn gradings(&self) -> &[f64] {
        &self.gradings
    }

    /// Grading of local edge `edge`, defaulting to uniform.
    pub fn edge_grading(&self, edge: usize) -> f64 {
        self.gradings.get(edge).copied().unwrap_or(1.0)
    }

    /// Partition id recorded by the partitioner (0 when never partitioned).
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Number of cells in this block.
    pub fn cell_count(&self) -> usize {
        self.subdivisions.iter().product()
    }

    pub(crate) fn from_parts(
        corners: Vec<usize>,
        subdivisions: Vec<usize>,
        gradings: Vec<f64>,
        partition: usize,
    ) -> Self {
        Self {
            corners,
            subdivisions,
            gradings,
            partition,
        }
    }
}

/// An outward-oriented face of a block, given by its corner point indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockFace {
    pub block: usize,
    pub axis: usize,
    pub side: usize,
    pub points: Vec<usize>,
}

impl BlockFace {
    /// Sorted corner point indices, used as a lookup key.
    pub fn key(&self) -> Vec<usize> {
        face_key(&self.points)
    }
}

/// Sorted copy of a face's point indices.
pub fn face_key(points: &[usize]) -> Vec<usize> {
    let mut key = points.to_vec();
    key.sort_unstable();
    key
}

/// Block connectivity over an owned [`PointSet`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockTopology {
    points: PointSet,
    blocks: Vec<Block>,
    nb_partitions: usize,
}

impl BlockTopology {
    /// Create an empty topology over `points`.
    pub fn new(points: PointSet) -> Self {
        Self {
            points,
            blocks: Vec::new(),
            nb_partitions: 1,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.points.dimension()
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Mutable access for coordinate edits before mesh realization.
    pub fn points_mut(&mut self) -> &mut PointSet {
        &mut self.points
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn nb_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, block: usize) -> Result<&Block> {
        self.blocks.get(block).ok_or(MeshGenError::IndexOutOfRange {
            what: "block",
            index: block,
            len: self.blocks.len(),
        })
    }

    /// Number of partitions the blocks are distributed over.
    pub fn nb_partitions(&self) -> usize {
        self.nb_partitions
    }

    pub fn partition_of(&self, block: usize) -> Result<usize> {
        Ok(self.block(block)?.partition)
    }

    /// Total number of cells over all blocks.
    pub fn total_cells(&self) -> usize {
        self.blocks.iter().map(Block::cell_count).sum()
    }

    /// Append `count` empty blocks and return their ids.
    pub fn add_blocks(&mut self, count: usize) -> Range<usize> {
        let start = self.blocks.len();
        self.blocks.resize_with(start + count, Block::default);
        start..self.blocks.len()
    }

    /// Set the corner point indices of `block`.
    pub fn set_corners(&mut self, block: usize, point_indices: &[usize]) -> Result<()> {
        let dim = self.dimension();
        let nb_points = self.points.len();
        let expected = rc::corner_count(dim);
        if point_indices.len() != expected {
            return Err(MeshGenError::arity(
                format!("corners of block {block}"),
                expected,
                point_indices.len(),
            ));
        }
        if let Some(&bad) = point_indices.iter().find(|&&p| p >= nb_points) {
            return Err(MeshGenError::IndexOutOfRange {
                what: "point",
                index: bad,
                len: nb_points,
            });
        }
        self.block_mut(block)?.corners = point_indices.to_vec();
        Ok(())
    }

    /// Set one subdivision count per logical axis.
    pub fn set_subdivisions(&mut self, block: usize, counts: &[usize]) -> Result<()> {
        let dim = self.dimension();
        if counts.len() != dim {
            return Err(MeshGenError::arity(
                format!("subdivisions of block {block}"),
                dim,
                counts.len(),
            ));
        }
        if let Some((axis, &count)) = counts.iter().enumerate().find(|(_, c)| **c == 0) {
            return Err(MeshGenError::InvalidSubdivision { block, axis, count });
        }
        self.block_mut(block)?.subdivisions = counts.to_vec();
        Ok(())
    }

    /// Set grading factors, either one per edge or one per axis.
    ///
    /// A quad takes 4 edge factors or 2 axis factors; a hex takes 12 edge
    /// factors or 3 axis factors. Per-axis factors are applied to every edge
    /// running along that axis. Factors must lie within
    /// `[1 / MAX_GRADING, MAX_GRADING]` (see [`grading::MAX_GRADING`]).
    pub fn set_gradings(&mut self, block: usize, factors: &[f64]) -> Result<()> {
        let dim = self.dimension();
        let per_edge = rc::edge_count(dim);
        if factors.len() != per_edge && factors.len() != dim {
            return Err(MeshGenError::arity(
                format!("gradings of block {block}"),
                format!("{per_edge} (one per {dim}D block edge) or {dim} (one per axis)"),
                factors.len(),
            ));
        }
        if let Some((position, &value)) = factors
            .iter()
            .enumerate()
            .find(|(_, g)| !grading::is_valid_grading(**g))
        {
            return Err(MeshGenError::InvalidGrading {
                block,
                position,
                value,
            });
        }
        let gradings = if factors.len() == per_edge {
            factors.to_vec()
        } else {
            (0..per_edge)
                .map(|edge| factors[rc::edge_axis(dim, edge)])
                .collect()
        };
        self.block_mut(block)?.gradings = gradings;
        Ok(())
    }

    /// Check that every block has corners and subdivisions.
    pub fn check_complete(&self) -> Result<()> {
        for (id, block) in self.blocks.iter().enumerate() {
            if block.corners.is_empty() {
                return Err(MeshGenError::IncompleteBlock {
                    block: id,
                    missing: "corners",
                });
            }
            if block.subdivisions.is_empty() {
                return Err(MeshGenError::IncompleteBlock {
                    block: id,
                    missing: "subdivisions",
                });
            }
        }
        Ok(())
    }

    /// Outward-oriented faces of `block`, numbered `2 * axis + side`.
    pub fn block_faces(&self, block: usize) -> Result<Vec<BlockFace>> {
        let dim = self.dimension();
        let record = self.block(block)?;
        if record.corners.is_empty() {
            return Err(MeshGenError::IncompleteBlock {
                block,
                missing: "corners",
            });
        }
        let mut faces = Vec::with_capacity(rc::face_count(dim));
        for axis in 0..dim {
            for side in 0..2 {
                let points = rc::face_corners(dim, axis, side)
                    .into_iter()
                    .map(|c| record.corners[c])
                    .collect();
                faces.push(BlockFace {
                    block,
                    axis,
                    side,
                    points,
                });
            }
        }
        Ok(faces)
    }

    pub(crate) fn set_nb_partitions(&mut self, nb_partitions: usize) {
        self.nb_partitions = nb_partitions.max(1);
    }

    pub(crate) fn push_block(&mut self, block: Block) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    fn block_mut(&mut self, block: usize) -> Result<&mut Block> {
        let len = self.blocks.len();
        self.blocks.get_mut(block).ok_or(MeshGenError::IndexOutOfRange {
            what: "block",
            index: block,
            len,
        })
    }
}

impl DebugInvariants for BlockTopology {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "BlockTopology");
    }

    fn validate_invariants(&self) -> Result<()> {
        let dim = self.dimension();
        crate::topology::point_set::check_dimension(dim)?;
        let nb_points = self.points.len();
        for (id, block) in self.blocks.iter().enumerate() {
            if !block.corners.is_empty() && block.corners.len() != rc::corner_count(dim) {
                return Err(MeshGenError::InvariantViolation(format!(
                    "block {id} has {} corners",
                    block.corners.len()
                )));
            }
            if let Some(&p) = block.corners.iter().find(|&&p| p >= nb_points) {
                return Err(MeshGenError::InvariantViolation(format!(
                    "block {id} references point {p} of {nb_points}"
                )));
            }
            if block.subdivisions.contains(&0) {
                return Err(MeshGenError::InvariantViolation(format!(
                    "block {id} has an empty axis"
                )));
            }
            if block.partition >= self.nb_partitions {
                return Err(MeshGenError::InvariantViolation(format!(
                    "block {id} in partition {} of {}",
                    block.partition, self.nb_partitions
                )));
            }
        }
        Ok(())
    }
}
