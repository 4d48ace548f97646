//! Block-structured topology data model.
//!
//! This module provides the input side of mesh generation:
//! - [`PointSet`] corner coordinates
//! - [`BlockTopology`] blocks with subdivisions and gradings
//! - [`PatchRegistry`] named boundary patches
//! - [`PeriodicLinkSet`] periodic patch pairs, plus node equivalence helpers
//! - [`BlockArrays`] bundling the above
//!
//! All of it is pure data entry; nothing is meshed until
//! [`MeshBuilder::build`](crate::algs::meshgen::MeshBuilder::build).

pub mod block;
pub mod block_arrays;
pub mod cell_type;
pub mod patch;
pub mod periodic;
pub mod point_set;
pub mod reference_cell;

pub use block::{Block, BlockFace, BlockTopology};
pub use block_arrays::BlockArrays;
pub use cell_type::CellType;
pub use patch::{Face, Patch, PatchRegistry};
pub use periodic::{NodeEquivalence, PeriodicLink, PeriodicLinkSet, PeriodicMap};
pub use point_set::PointSet;
