//! Cell type metadata for realized mesh elements and faces.

use serde::{Deserialize, Serialize};

/// Cell types produced by the block mesher.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// 0D vertex.
    #[default]
    Vertex,
    /// 1D segment/edge; boundary faces of 2D meshes.
    Segment,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D tensor-product cell (hex).
    Hexahedron,
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Vertex => 0,
            CellType::Segment => 1,
            CellType::Quadrilateral => 2,
            CellType::Hexahedron => 3,
        }
    }

    /// Number of nodes of a cell of this type.
    pub fn node_count(self) -> usize {
        match self {
            CellType::Vertex => 1,
            CellType::Segment => 2,
            CellType::Quadrilateral => 4,
            CellType::Hexahedron => 8,
        }
    }

    /// Volume cell type of a block mesh of dimension `dim`.
    pub fn volume(dim: usize) -> Self {
        if dim == 3 {
            CellType::Hexahedron
        } else {
            CellType::Quadrilateral
        }
    }

    /// Boundary face type of a block mesh of dimension `dim`.
    pub fn facet(dim: usize) -> Self {
        if dim == 3 {
            CellType::Quadrilateral
        } else {
            CellType::Segment
        }
    }
}
