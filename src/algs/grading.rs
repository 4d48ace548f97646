//! Geometric grading of node spacing along block edges.
//!
//! A grading factor `g` on an edge with `n` cells is the ratio of the last
//! cell size to the first, traversing the edge from its `axis = 0` corner to
//! its `axis = 1` corner. Cell sizes form a geometric progression with
//! per-cell ratio `r = g^(1/(n-1))`, so node `i` sits at the parametric
//! position `(r^i - 1) / (r^n - 1)`. `g == 1` gives exactly `i / n`.
//!
//! Inside a block, the parametric coordinate along one axis is blended from
//! the distributions of the parallel edges, weighted linearly (2D) or
//! bilinearly (3D) by the position on the remaining axes.

use crate::topology::block::Block;
use crate::topology::reference_cell as rc;

/// Ratios closer to one than this are treated as uniform.
const UNIFORM_RATIO_EPS: f64 = 1e-12;

/// Largest accepted grading factor; its reciprocal is the smallest.
///
/// Beyond this range the cells crowding towards `1.0` fall below `f64`
/// resolution and nodes would coincide.
pub const MAX_GRADING: f64 = 1e6;

/// Finite and within `[1 / MAX_GRADING, MAX_GRADING]`.
pub fn is_valid_grading(grading: f64) -> bool {
    grading.is_finite() && (1.0 / MAX_GRADING..=MAX_GRADING).contains(&grading)
}

/// Per-cell expansion ratio of an edge with `cells` cells and grading `grading`.
pub fn cell_ratio(cells: usize, grading: f64) -> f64 {
    if cells <= 1 {
        1.0
    } else {
        grading.powf(1.0 / (cells - 1) as f64)
    }
}

/// Parametric node positions in `[0, 1]` along an edge, `cells + 1` entries.
pub fn edge_distribution(cells: usize, grading: f64) -> Vec<f64> {
    let n = cells as f64;
    let r = cell_ratio(cells, grading);
    if grading == 1.0 || (r - 1.0).abs() < UNIFORM_RATIO_EPS {
        return (0..=cells).map(|i| i as f64 / n).collect();
    }
    // (r^i - 1) / (r^n - 1) in log space; growing ratios are scaled by r^-n
    let ln_r = r.ln();
    let mut out: Vec<f64> = (0..=cells)
        .map(|i| {
            let i = i as f64;
            if ln_r > 0.0 {
                ((i - n) * ln_r).exp() * (-i * ln_r).exp_m1() / (-n * ln_r).exp_m1()
            } else {
                (i * ln_r).exp_m1() / (n * ln_r).exp_m1()
            }
        })
        .collect();
    out[0] = 0.0;
    out[cells] = 1.0;
    out
}

/// Grading of the cells `first..last` of an edge graded `grading` over `cells`.
///
/// The sub-range keeps the parent progression, so its nodes coincide with the
/// parent's nodes.
pub fn sub_grading(cells: usize, grading: f64, first: usize, last: usize) -> f64 {
    let span = last.saturating_sub(first);
    if span <= 1 {
        return 1.0;
    }
    cell_ratio(cells, grading).powi((span - 1) as i32)
}

/// Parametric coordinates of every lattice node of a block.
#[derive(Clone, Debug)]
pub struct BlockLattice {
    dim: usize,
    counts: [usize; rc::MAX_DIM],
    /// Edge distributions indexed by local edge.
    edges: Vec<Vec<f64>>,
    /// Mean distribution per axis, used as blending weights.
    means: Vec<Vec<f64>>,
    /// Axes whose parallel edges all share one distribution.
    uniform_axis: [bool; rc::MAX_DIM],
}

impl BlockLattice {
    /// Precompute edge distributions of a complete block.
    pub fn new(dim: usize, block: &Block) -> Self {
        let mut counts = [1; rc::MAX_DIM];
        counts[..dim].copy_from_slice(&block.subdivisions()[..dim]);
        let per_axis = rc::edges_per_axis(dim);
        let edges: Vec<Vec<f64>> = (0..rc::edge_count(dim))
            .map(|e| edge_distribution(counts[rc::edge_axis(dim, e)], block.edge_grading(e)))
            .collect();
        let mut uniform_axis = [true; rc::MAX_DIM];
        let means = (0..dim)
            .map(|axis| {
                let group = &edges[axis * per_axis..(axis + 1) * per_axis];
                uniform_axis[axis] = group.iter().all(|d| d == &group[0]);
                if uniform_axis[axis] {
                    return group[0].clone();
                }
                (0..=counts[axis])
                    .map(|i| group.iter().map(|d| d[i]).sum::<f64>() / per_axis as f64)
                    .collect()
            })
            .collect();
        Self {
            dim,
            counts,
            edges,
            means,
            uniform_axis,
        }
    }

    /// Cells per axis (unused axes report 1).
    pub fn counts(&self) -> [usize; rc::MAX_DIM] {
        self.counts
    }

    /// Parametric coordinates of lattice node `ijk`.
    pub fn parametric(&self, ijk: [usize; rc::MAX_DIM]) -> [f64; rc::MAX_DIM] {
        let mut out = [0.0; rc::MAX_DIM];
        for axis in 0..self.dim {
            let idx = ijk[axis];
            if self.uniform_axis[axis] {
                out[axis] = self.means[axis][idx];
                continue;
            }
            let per_axis = rc::edges_per_axis(self.dim);
            let mut value = 0.0;
            for offset in 0..per_axis {
                let mut weight = 1.0;
                for (k, other) in rc::other_axes(self.dim, axis).enumerate() {
                    let t = self.means[other][ijk[other]];
                    weight *= if (offset >> k) & 1 == 1 { t } else { 1.0 - t };
                }
                value += weight * self.edges[axis * per_axis + offset][idx];
            }
            out[axis] = value;
        }
        out
    }
}

/// Multilinear interpolation of corner coordinates at parametric `uvw`.
pub fn interpolate_corners(
    dim: usize,
    corners: &[&[f64]],
    uvw: [f64; rc::MAX_DIM],
    out: &mut [f64],
) {
    out.iter_mut().for_each(|x| *x = 0.0);
    for (c, xyz) in corners.iter().enumerate() {
        let bits = rc::corner_bits(dim, c);
        let shape: f64 = (0..dim)
            .map(|a| if bits[a] == 1 { uvw[a] } else { 1.0 - uvw[a] })
            .product();
        if shape == 0.0 {
            continue;
        }
        for (o, x) in out.iter_mut().zip(xyz.iter()) {
            *o += shape * x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_grading_is_exactly_uniform() {
        let d = edge_distribution(4, 1.0);
        assert_eq!(d, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn grading_is_last_over_first_cell() {
        let d = edge_distribution(5, 4.0);
        let first = d[1] - d[0];
        let last = d[5] - d[4];
        assert!((last / first - 4.0).abs() < 1e-12);
        assert!(d.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(d[0], 0.0);
        assert_eq!(d[5], 1.0);
    }

    #[test]
    fn inverse_grading_mirrors_distribution() {
        let a = edge_distribution(6, 3.0);
        let b = edge_distribution(6, 1.0 / 3.0);
        for i in 0..=6 {
            assert!((a[i] - (1.0 - b[6 - i])).abs() < 1e-12);
        }
    }

    #[test]
    fn sub_grading_reproduces_parent_nodes() {
        let parent = edge_distribution(10, 5.0);
        let g = sub_grading(10, 5.0, 4, 10);
        let child = edge_distribution(6, g);
        let (lo, hi) = (parent[4], parent[10]);
        for (i, c) in child.iter().enumerate() {
            let mapped = lo + c * (hi - lo);
            assert!((mapped - parent[4 + i]).abs() < 1e-12);
        }
    }

    #[test]
    fn extreme_growth_stays_monotonic() {
        for g in [MAX_GRADING, 1e150, 1e300] {
            let d = edge_distribution(3, g);
            assert_eq!((d[0], d[3]), (0.0, 1.0));
            assert!(d.windows(2).all(|w| w[1] > w[0]), "{g}: {d:?}");
        }
        let d = edge_distribution(40, 1.0 / MAX_GRADING);
        assert!(d.windows(2).all(|w| w[1] > w[0]));
        assert!(is_valid_grading(MAX_GRADING) && is_valid_grading(1.0 / MAX_GRADING));
        assert!(!is_valid_grading(1e300) && !is_valid_grading(1e-7) && !is_valid_grading(f64::NAN));
    }

    #[test]
    fn single_cell_ignores_grading() {
        assert_eq!(edge_distribution(1, 7.0), vec![0.0, 1.0]);
        assert_eq!(sub_grading(1, 7.0, 0, 1), 1.0);
    }

    #[test]
    fn mixed_edges_blend_between_sides() {
        let block = Block::from_parts(vec![0, 1, 2, 3], vec![2, 1], vec![4.0, 1.0, 1.0, 1.0], 0);
        let lattice = BlockLattice::new(2, &block);
        let bottom = lattice.parametric([1, 0, 0]);
        let top = lattice.parametric([1, 1, 0]);
        assert!((bottom[0] - 0.2).abs() < 1e-12);
        assert!((top[0] - 0.5).abs() < 1e-12);
    }
}
