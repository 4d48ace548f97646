//! `PointSet`: indexed corner coordinates referenced by blocks and patches.
//!
//! Points are identified by their dense creation index. Coordinates are stored
//! flat with a fixed stride equal to the dimension, so a 3D set of `n` points
//! occupies `3 * n` contiguous `f64` values.

use serde::Serialize;

use crate::mesh_error::{MeshGenError, Result};

/// Dense, indexed collection of 2D or 3D coordinates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointSet {
    dimension: usize,
    coords: Vec<f64>,
}

impl PointSet {
    /// Allocate `count` points of `dimension` coordinates, all at the origin.
    pub fn create(dimension: usize, count: usize) -> Result<Self> {
        check_dimension(dimension)?;
        Ok(Self {
            dimension,
            coords: vec![0.0; dimension * count],
        })
    }

    /// Build a point set from explicit coordinate rows.
    pub fn from_rows<R>(dimension: usize, rows: &[R]) -> Result<Self>
    where
        R: AsRef<[f64]>,
    {
        let mut set = Self::create(dimension, rows.len())?;
        for (idx, row) in rows.iter().enumerate() {
            set.set(idx, row.as_ref())?;
        }
        Ok(set)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Overwrite the coordinates of point `index`.
    pub fn set(&mut self, index: usize, coords: &[f64]) -> Result<()> {
        self.check_index(index)?;
        self.check_coords(index, coords)?;
        let start = index * self.dimension;
        self.coords[start..start + self.dimension].copy_from_slice(coords);
        Ok(())
    }

    /// Coordinates of point `index`.
    pub fn get(&self, index: usize) -> Result<&[f64]> {
        self.check_index(index)?;
        let start = index * self.dimension;
        Ok(&self.coords[start..start + self.dimension])
    }

    /// Append a point and return its index.
    pub fn push(&mut self, coords: &[f64]) -> Result<usize> {
        let index = self.len();
        self.check_coords(index, coords)?;
        self.coords.extend_from_slice(coords);
        Ok(index)
    }

    /// Iterate over `(index, coords)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f64])> + '_ {
        self.coords.chunks_exact(self.dimension).enumerate()
    }

    /// Flat coordinate storage, `dimension` values per point.
    pub fn as_flat(&self) -> &[f64] {
        &self.coords
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(MeshGenError::IndexOutOfRange {
                what: "point",
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    fn check_coords(&self, index: usize, coords: &[f64]) -> Result<()> {
        if coords.len() != self.dimension {
            return Err(MeshGenError::arity(
                format!("coordinates of point {index}"),
                self.dimension,
                coords.len(),
            ));
        }
        if let Some(&value) = coords.iter().find(|c| !c.is_finite()) {
            return Err(MeshGenError::InvalidCoordinate {
                what: format!("point {index}"),
                value,
            });
        }
        Ok(())
    }
}

pub(crate) fn check_dimension(dimension: usize) -> Result<()> {
    match dimension {
        2 | 3 => Ok(()),
        other => Err(MeshGenError::InvalidDimension(other)),
    }
}
