//! Mesh generation algorithms over block topologies.

pub mod extrude;
pub mod grading;
pub mod meshgen;
pub mod partition;
pub mod periodic_link;

pub use extrude::{Extruder, extrude};
pub use meshgen::MeshBuilder;
pub use partition::{BlockPartitioner, PartitionPlan, balanced_ranges, partition};
pub use periodic_link::PeriodicConnector;
