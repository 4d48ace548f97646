#![cfg_attr(docsrs, feature(doc_cfg))]
//! # block-mesh
//!
//! block-mesh generates block-structured quad and hex meshes for CFD drivers.
//! A domain is described as a handful of logical blocks over shared corner
//! points; the library grades and subdivides each block, merges the nodes
//! shared between blocks, tags boundary patches and identifies periodic
//! nodes.
//!
//! ## Features
//! - Topology entry through explicit setters ([`topology`]): points, blocks,
//!   patches and periodic links, validated at the call site
//! - Geometric edge grading with exact uniform spacing at grading 1
//! - Extrusion of 2D topologies into layered 3D topologies
//! - Balanced partitioning along any logical axis, splitting blocks where
//!   needed, repeatable for Cartesian process grids
//! - Periodic node matching with a tolerance scaled by the boundary edge size
//! - A serde description model running the whole pipeline ([`description`])
//!
//! ## Determinism
//!
//! Every operation is single threaded and depends only on its input: no
//! randomness, no clocks, and ordered containers wherever output order is
//! observable. Building the same topology twice yields bit-identical meshes.
//!
//! ## Usage
//! ```rust
//! # fn try_main() -> Result<(), block_mesh::mesh_error::MeshGenError> {
//! use block_mesh::prelude::*;
//!
//! let points = PointSet::from_rows(2, &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])?;
//! let mut arrays = BlockArrays::new(points)?;
//! arrays.topology.add_blocks(1);
//! arrays.topology.set_corners(0, &[0, 1, 2, 3])?;
//! arrays.topology.set_subdivisions(0, &[2, 2])?;
//! arrays.patches.create_patch("bottom", &[[0, 1]])?;
//!
//! let mesh = MeshBuilder::default().build(&arrays.topology, &arrays.patches)?;
//! assert_eq!((mesh.nb_nodes(), mesh.nb_elements()), (9, 4));
//! # Ok(())
//! # }
//! # try_main().unwrap();
//! ```
//!
//! ## Invariant checking
//! Builders run [`DebugInvariants`] checks on their results in debug builds.
//! Enable the `strict-invariants` feature to keep them in release builds.

pub mod algs;
pub mod config;
pub mod debug_invariants;
pub mod description;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::extrude::{Extruder, extrude};
    pub use crate::algs::meshgen::MeshBuilder;
    pub use crate::algs::partition::{BlockPartitioner, balanced_ranges, partition};
    pub use crate::algs::periodic_link::PeriodicConnector;
    pub use crate::config::{BuildOptions, MeshGenConfig, PeriodicOptions};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::description::BlockMeshDescription;
    pub use crate::mesh::{BoundaryRegion, ElementGroup, Mesh, PeriodicCorrespondence};
    pub use crate::mesh_error::{ErrorKind, MeshGenError};
    pub use crate::topology::{
        BlockArrays, BlockTopology, CellType, PatchRegistry, PeriodicLink, PeriodicLinkSet,
        PointSet,
    };
}
