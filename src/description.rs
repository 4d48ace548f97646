//! Declarative block mesh descriptions.
//!
//! A [`BlockMeshDescription`] is the serde model of a complete generation
//! run: corner points, blocks, patches, periodic links, an optional extrusion
//! and any number of partition passes. It is applied through the regular
//! setter API, so every validation error of the programmatic path fires here
//! too. Unknown keys are rejected.
//!
//! ```rust
//! # fn try_main() -> Result<(), block_mesh::mesh_error::MeshGenError> {
//! use block_mesh::config::MeshGenConfig;
//! use block_mesh::description::{BlockDescription, BlockMeshDescription, PatchDescription, PartitionStep};
//!
//! let description = BlockMeshDescription {
//!     dimension: 2,
//!     points: vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0]],
//!     blocks: vec![BlockDescription {
//!         corners: vec![0, 1, 2, 3],
//!         subdivisions: vec![10, 2],
//!         gradings: vec![],
//!     }],
//!     patches: vec![PatchDescription { name: "bottom".into(), faces: vec![vec![0, 1]] }],
//!     periodic: vec![],
//!     extrusion: None,
//!     partitions: vec![PartitionStep { nb_partitions: 3, axis: 0 }],
//! };
//! let mesh = description.generate(&MeshGenConfig::default())?;
//! assert_eq!(mesh.nb_partitions(), 3);
//! assert_eq!(mesh.elements_in_partition(0).len(), 8);
//! # Ok(())
//! # }
//! # try_main().unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::algs::extrude::Extruder;
use crate::algs::meshgen::MeshBuilder;
use crate::algs::partition::BlockPartitioner;
use crate::algs::periodic_link::PeriodicConnector;
use crate::config::MeshGenConfig;
use crate::mesh::Mesh;
use crate::mesh_error::{MeshGenError, Result};
use crate::topology::block_arrays::BlockArrays;
use crate::topology::periodic::PeriodicLink;
use crate::topology::point_set::PointSet;

/// One block: corner points, subdivisions and optional gradings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDescription {
    pub corners: Vec<usize>,
    pub subdivisions: Vec<usize>,
    /// Per edge or per axis; empty means uniform.
    #[serde(default)]
    pub gradings: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchDescription {
    pub name: String,
    pub faces: Vec<Vec<usize>>,
}

/// Sweep of a 2D description into 3D.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtrusionStep {
    pub lengths: Vec<f64>,
    pub segments: Vec<usize>,
    /// One per stage; empty means uniform for every stage.
    #[serde(default)]
    pub gradings: Vec<f64>,
    #[serde(default)]
    pub front_patch: Option<String>,
    #[serde(default)]
    pub back_patch: Option<String>,
}

impl ExtrusionStep {
    fn extruder(&self) -> Extruder {
        Extruder::with_end_patches(
            self.front_patch.as_deref().unwrap_or("front"),
            self.back_patch.as_deref().unwrap_or("back"),
        )
    }
}

/// One balanced partition pass along a logical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionStep {
    pub nb_partitions: usize,
    pub axis: usize,
}

/// Full description of one block mesh generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockMeshDescription {
    pub dimension: usize,
    pub points: Vec<Vec<f64>>,
    pub blocks: Vec<BlockDescription>,
    #[serde(default)]
    pub patches: Vec<PatchDescription>,
    #[serde(default)]
    pub periodic: Vec<PeriodicLink>,
    #[serde(default)]
    pub extrusion: Option<ExtrusionStep>,
    /// Applied in order; several passes form a Cartesian partition.
    #[serde(default)]
    pub partitions: Vec<PartitionStep>,
}

impl BlockMeshDescription {
    /// Parse a description from serde input, e.g. a `serde_json::Deserializer`.
    pub fn from_value<'de, D>(deserializer: D) -> Result<Self>
    where
        D: serde::Deserializer<'de>,
    {
        Self::deserialize(deserializer).map_err(|e| MeshGenError::InvalidConfig(e.to_string()))
    }

    /// Populate block arrays through the setter API.
    pub fn to_block_arrays(&self) -> Result<BlockArrays> {
        let mut arrays = BlockArrays::new(PointSet::from_rows(self.dimension, &self.points)?)?;
        let ids = arrays.topology.add_blocks(self.blocks.len());
        for (id, block) in ids.zip(&self.blocks) {
            arrays.topology.set_corners(id, &block.corners)?;
            arrays.topology.set_subdivisions(id, &block.subdivisions)?;
            if !block.gradings.is_empty() {
                arrays.topology.set_gradings(id, &block.gradings)?;
            }
        }
        for patch in &self.patches {
            arrays.patches.create_patch(&patch.name, &patch.faces)?;
        }
        for link in &self.periodic {
            arrays
                .periodic
                .add(&link.source, &link.destination, &link.translation)?;
        }
        Ok(arrays)
    }

    /// Block arrays after extrusion and all partition passes, ready to build.
    pub fn prepare(&self) -> Result<BlockArrays> {
        let mut arrays = self.to_block_arrays()?;
        if let Some(step) = &self.extrusion {
            let gradings = if step.gradings.is_empty() {
                vec![1.0; step.lengths.len()]
            } else {
                step.gradings.clone()
            };
            arrays = step
                .extruder()
                .extrude(&arrays, &step.lengths, &step.segments, &gradings)?;
        }
        for step in &self.partitions {
            arrays = BlockPartitioner.partition(&arrays, step.nb_partitions, step.axis)?;
        }
        Ok(arrays)
    }

    /// Run extrude, partition, build and periodic linking in that order.
    pub fn generate(&self, config: &MeshGenConfig) -> Result<Mesh> {
        config.validate()?;
        let arrays = self.prepare()?;
        let mut mesh = MeshBuilder::new(config.build.clone()).build(&arrays.topology, &arrays.patches)?;
        if !arrays.periodic.is_empty() {
            PeriodicConnector::new(config.periodic.clone()).link(&mut mesh, arrays.periodic.links())?;
        }
        Ok(mesh)
    }
}
