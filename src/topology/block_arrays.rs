//! [`BlockArrays`]: blocks, patches and periodic links of one block mesh.
//!
//! Extrusion and partitioning rewrite blocks and patch faces together, so they
//! take and return this aggregate rather than the individual parts.

use serde::Serialize;

use crate::mesh_error::Result;
use crate::topology::block::BlockTopology;
use crate::topology::patch::PatchRegistry;
use crate::topology::periodic::PeriodicLinkSet;
use crate::topology::point_set::PointSet;

#[derive(Clone, Debug, Serialize)]
pub struct BlockArrays {
    pub topology: BlockTopology,
    pub patches: PatchRegistry,
    pub periodic: PeriodicLinkSet,
}

impl BlockArrays {
    /// Empty block arrays over `points`.
    pub fn new(points: PointSet) -> Result<Self> {
        let dimension = points.dimension();
        Ok(Self {
            topology: BlockTopology::new(points),
            patches: PatchRegistry::new(dimension)?,
            periodic: PeriodicLinkSet::new(dimension)?,
        })
    }

    /// Allocate `count` points of `dimension` coordinates and wrap them.
    pub fn with_points(dimension: usize, count: usize) -> Result<Self> {
        Self::new(PointSet::create(dimension, count)?)
    }

    pub fn dimension(&self) -> usize {
        self.topology.dimension()
    }
}
