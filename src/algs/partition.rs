//! Balanced partitioning of block topologies along a logical axis.
//!
//! The partitioner stacks the blocks along the chosen axis, counts the cell
//! layers, splits the layer range into `nb_partitions` balanced ranges and
//! cuts every block that straddles a range boundary into sub-blocks. Each
//! resulting block records its partition id, so the mesh builder later emits
//! one contiguous region per partition.
//!
//! Range balancing is the classic scheme: `base = total / nb`, and the first
//! `total % nb` ranges take one extra layer.
//!
//! Calling [`BlockPartitioner::partition`] again on another axis refines the
//! decomposition into a Cartesian process grid (`id = previous * nb + part`).

use std::collections::VecDeque;
use std::ops::Range;

use hashbrown::{HashMap, HashSet};

use crate::algs::grading::{edge_distribution, sub_grading};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::{MeshGenError, Result};
use crate::topology::block::{Block, BlockTopology, face_key};
use crate::topology::block_arrays::BlockArrays;
use crate::topology::patch::{Face, PatchRegistry};
use crate::topology::point_set::PointSet;
use crate::topology::reference_cell as rc;

/// Split `total` cell layers into `nb` contiguous ranges whose sizes differ by at most one.
pub fn balanced_ranges(total: usize, nb: usize, axis: usize) -> Result<Vec<Range<usize>>> {
    if nb == 0 || nb > total {
        return Err(MeshGenError::TooManyPartitions {
            requested: nb,
            layers: total,
            axis,
        });
    }
    let base = total / nb;
    let extra = total % nb;
    let mut start = 0;
    Ok((0..nb)
        .map(|p| {
            let len = base + usize::from(p < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect())
}

/// Layer layout and balanced ranges computed before any block is split.
///
/// Only [`BlockPartitioner::plan`] builds plans; [`BlockPartitioner::apply`]
/// re-checks a plan against the arrays it is applied to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionPlan {
    axis: usize,
    total_layers: usize,
    /// One contiguous layer range per partition.
    ranges: Vec<Range<usize>>,
    /// First global layer of every block along `axis`.
    offsets: Vec<usize>,
}

impl PartitionPlan {
    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn total_layers(&self) -> usize {
        self.total_layers
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn nb_partitions(&self) -> usize {
        self.ranges.len()
    }

    /// Partition owning global layer `layer`.
    pub fn partition_of_layer(&self, layer: usize) -> usize {
        self.ranges.partition_point(|r| r.end <= layer)
    }

    /// Layer count per partition.
    pub fn counts(&self) -> Vec<usize> {
        self.ranges.iter().map(|r| r.len()).collect()
    }
}

/// Splits block topologies into balanced partitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockPartitioner;

impl BlockPartitioner {
    pub fn new() -> Self {
        Self
    }

    /// Compute block layer offsets and partition ranges without modifying anything.
    pub fn plan(&self, arrays: &BlockArrays, nb_partitions: usize, axis: usize) -> Result<PartitionPlan> {
        let topology = &arrays.topology;
        let dimension = topology.dimension();
        if axis >= dimension {
            return Err(MeshGenError::InvalidAxis { axis, dimension });
        }
        topology.check_complete()?;
        let offsets = layer_offsets(topology, axis)?;
        let total_layers = topology
            .blocks()
            .iter()
            .zip(&offsets)
            .map(|(b, &o)| o + b.subdivisions()[axis])
            .max()
            .unwrap_or(0);
        let ranges = balanced_ranges(total_layers, nb_partitions, axis)?;
        log::debug!(
            "partition plan along axis {axis}: {total_layers} layers -> {:?}",
            ranges.iter().map(|r| r.len()).collect::<Vec<_>>()
        );
        Ok(PartitionPlan {
            axis,
            total_layers,
            ranges,
            offsets,
        })
    }

    /// Split `arrays` into `nb_partitions` balanced partitions along `axis`.
    ///
    /// Neighbouring blocks must agree on which local axis is `axis`: blocks
    /// meeting through a face must either both be normal to `axis` across it
    /// (stacked) or both run along it with the same direction and layer
    /// count. Blocks whose local axes are rotated relative to a neighbour can
    /// be meshed but not partitioned; they fail with
    /// [`MeshGenError::InconsistentLayering`].
    pub fn partition(&self, arrays: &BlockArrays, nb_partitions: usize, axis: usize) -> Result<BlockArrays> {
        let plan = self.plan(arrays, nb_partitions, axis)?;
        self.apply(arrays, &plan)
    }

    /// Split blocks according to a previously computed plan.
    ///
    /// The plan must describe `arrays`: a plan computed for other arrays is
    /// rejected with the error `plan` would have raised, or with
    /// [`MeshGenError::InconsistentLayering`] when the layer layout differs.
    pub fn apply(&self, arrays: &BlockArrays, plan: &PartitionPlan) -> Result<BlockArrays> {
        let topology = &arrays.topology;
        let dim = topology.dimension();
        let axis = plan.axis;
        let nb = plan.nb_partitions();
        check_plan(topology, plan)?;

        let mut points = topology.points().clone();
        let mut cut_points: HashMap<(usize, usize, usize), usize> = HashMap::new();
        let mut new_blocks: Vec<Block> = Vec::new();
        let mut children: Vec<Range<usize>> = Vec::with_capacity(topology.nb_blocks());

        for (block_id, block) in topology.blocks().iter().enumerate() {
            let n = block.subdivisions()[axis];
            let offset = plan.offsets[block_id];
            let mut bounds = vec![0];
            bounds.extend(
                plan.ranges[1..]
                    .iter()
                    .map(|r| r.start)
                    .filter(|&cut| cut > offset && cut < offset + n)
                    .map(|cut| cut - offset),
            );
            bounds.push(n);

            let first_child = new_blocks.len();
            if bounds.len() == 2 {
                let part = plan.partition_of_layer(offset);
                new_blocks.push(Block::from_parts(
                    block.corners().to_vec(),
                    block.subdivisions().to_vec(),
                    block.gradings().to_vec(),
                    block.partition() * nb + part,
                ));
            } else {
                for w in bounds.windows(2) {
                    let (lo, hi) = (w[0], w[1]);
                    let part = plan.partition_of_layer(offset + lo);
                    let mut corners = Vec::with_capacity(rc::corner_count(dim));
                    for c in 0..rc::corner_count(dim) {
                        let bits = rc::corner_bits(dim, c);
                        let pos = if bits[axis] == 0 { lo } else { hi };
                        let edge = rc::edge_index(dim, axis, bits);
                        let point = edge_point(block, dim, edge, pos, &mut points, &mut cut_points)?;
                        corners.push(point);
                    }
                    let mut subdivisions = block.subdivisions().to_vec();
                    subdivisions[axis] = hi - lo;
                    let gradings = (0..rc::edge_count(dim))
                        .map(|edge| sub_block_grading(block, dim, axis, edge, lo, hi))
                        .collect();
                    new_blocks.push(Block::from_parts(
                        corners,
                        subdivisions,
                        gradings,
                        block.partition() * nb + part,
                    ));
                }
                log::debug!(
                    "block {block_id}: split into {} sub-blocks at local layers {:?}",
                    bounds.len() - 1,
                    &bounds[1..bounds.len() - 1]
                );
            }
            children.push(first_child..new_blocks.len());
        }

        let mut out = BlockTopology::new(points);
        for block in new_blocks {
            out.push_block(block);
        }
        out.set_nb_partitions(topology.nb_partitions() * nb);
        out.debug_assert_invariants();

        let patches = rewrite_patches(arrays, &out, &children, axis)?;
        log::info!(
            "partitioned {} blocks into {} along axis {axis}: {} partitions, layer counts {:?}",
            topology.nb_blocks(),
            out.nb_blocks(),
            out.nb_partitions(),
            plan.counts()
        );
        Ok(BlockArrays {
            topology: out,
            patches,
            periodic: arrays.periodic.clone(),
        })
    }
}

/// Reject a plan whose axis, block count, ranges or layer layout do not fit `topology`.
fn check_plan(topology: &BlockTopology, plan: &PartitionPlan) -> Result<()> {
    let dimension = topology.dimension();
    let axis = plan.axis;
    if axis >= dimension {
        return Err(MeshGenError::InvalidAxis { axis, dimension });
    }
    topology.check_complete()?;
    if plan.offsets.len() != topology.nb_blocks() {
        return Err(MeshGenError::arity(
            "partition plan block offsets",
            topology.nb_blocks(),
            plan.offsets.len(),
        ));
    }
    let contiguous = plan.ranges.first().is_some_and(|r| r.start == 0)
        && plan.ranges.last().is_some_and(|r| r.end == plan.total_layers)
        && plan.ranges.iter().all(|r| r.start < r.end)
        && plan.ranges.windows(2).all(|w| w[0].end == w[1].start);
    if !contiguous {
        return Err(MeshGenError::TooManyPartitions {
            requested: plan.ranges.len(),
            layers: plan.total_layers,
            axis,
        });
    }
    let mut reached = 0;
    for (block, (b, &offset)) in topology.blocks().iter().zip(&plan.offsets).enumerate() {
        let end = offset + b.subdivisions()[axis];
        if end > plan.total_layers {
            return Err(layering(
                block,
                axis,
                format!("ends at layer {end} beyond the planned {}", plan.total_layers),
            ));
        }
        reached = reached.max(end);
    }
    if reached != plan.total_layers {
        return Err(layering(
            0,
            axis,
            format!("blocks span {reached} layers, plan expects {}", plan.total_layers),
        ));
    }
    Ok(())
}

/// Convenience wrapper around [`BlockPartitioner::partition`].
///
/// Blocks with local axes rotated relative to a neighbour are rejected with
/// [`MeshGenError::InconsistentLayering`].
pub fn partition(arrays: &BlockArrays, nb_partitions: usize, axis: usize) -> Result<BlockArrays> {
    BlockPartitioner.partition(arrays, nb_partitions, axis)
}

fn layering(block: usize, axis: usize, reason: impl Into<String>) -> MeshGenError {
    MeshGenError::InconsistentLayering {
        block,
        axis,
        reason: reason.into(),
    }
}

/// Directed `(low, high)` point pairs of the edges running along `axis`.
fn axis_edges(block: &Block, dim: usize, axis: usize) -> Vec<(usize, usize)> {
    let per_axis = rc::edges_per_axis(dim);
    (axis * per_axis..(axis + 1) * per_axis)
        .map(|e| {
            let (a, b) = rc::edge_corners(dim, e);
            (block.corners()[a], block.corners()[b])
        })
        .collect()
}

/// First global layer of each block along `axis`.
///
/// Blocks meeting through their axis-normal faces are stacked; blocks meeting
/// through any other face must run parallel and share their offset.
/// Disconnected groups of blocks each start at layer 0.
fn layer_offsets(topology: &BlockTopology, axis: usize) -> Result<Vec<usize>> {
    let dim = topology.dimension();
    let nb_blocks = topology.nb_blocks();
    let mut faces: HashMap<Vec<usize>, Vec<(usize, usize, usize)>> = HashMap::new();
    for b in 0..nb_blocks {
        for f in topology.block_faces(b)? {
            faces.entry(f.key()).or_default().push((b, f.axis, f.side));
        }
    }
    let directed: Vec<HashSet<(usize, usize)>> = topology
        .blocks()
        .iter()
        .map(|b| axis_edges(b, dim, axis).into_iter().collect())
        .collect();

    let layers = |b: usize| topology.blocks()[b].subdivisions()[axis] as i64;
    let mut offset: Vec<Option<i64>> = vec![None; nb_blocks];
    let mut result = vec![0; nb_blocks];

    for root in 0..nb_blocks {
        if offset[root].is_some() {
            continue;
        }
        offset[root] = Some(0);
        let mut component = vec![root];
        let mut queue = VecDeque::from([root]);
        while let Some(b) = queue.pop_front() {
            let Some(ob) = offset[b] else { continue };
            for face in topology.block_faces(b)? {
                let Some(owners) = faces.get(&face.key()) else {
                    continue;
                };
                for &(c, c_axis, c_side) in owners {
                    if c == b {
                        continue;
                    }
                    let expected = if face.axis == axis {
                        if c_axis != axis || c_side == face.side {
                            return Err(layering(
                                c,
                                axis,
                                format!("face {:?} of block {b} is not met by an opposite face", face.points),
                            ));
                        }
                        if face.side == 1 { ob + layers(b) } else { ob - layers(c) }
                    } else {
                        if c_axis == axis {
                            return Err(layering(
                                c,
                                axis,
                                format!("side face {:?} of block {b} meets an axis-normal face", face.points),
                            ));
                        }
                        if layers(c) != layers(b) {
                            return Err(layering(
                                c,
                                axis,
                                format!("{} layers next to block {b} with {}", layers(c), layers(b)),
                            ));
                        }
                        let flipped = directed[b].iter().any(|&(lo, hi)| {
                            face.points.contains(&lo)
                                && face.points.contains(&hi)
                                && !directed[c].contains(&(lo, hi))
                        });
                        if flipped {
                            return Err(layering(
                                c,
                                axis,
                                format!("axis direction differs from neighbouring block {b}"),
                            ));
                        }
                        ob
                    };
                    match offset[c] {
                        None => {
                            offset[c] = Some(expected);
                            component.push(c);
                            queue.push_back(c);
                        }
                        Some(existing) if existing != expected => {
                            return Err(layering(
                                c,
                                axis,
                                format!("reached at layer {expected} and at layer {existing}"),
                            ));
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        let min = component.iter().filter_map(|&b| offset[b]).min().unwrap_or(0);
        for &b in &component {
            result[b] = (offset[b].unwrap_or(min) - min) as usize;
        }
    }
    Ok(result)
}

/// Point at layer `pos` of local edge `edge`, creating it on first use.
///
/// Cut points are keyed by the edge's directed end points so that blocks
/// sharing the edge reuse them.
fn edge_point(
    block: &Block,
    dim: usize,
    edge: usize,
    pos: usize,
    points: &mut PointSet,
    cut_points: &mut HashMap<(usize, usize, usize), usize>,
) -> Result<usize> {
    let (a, b) = rc::edge_corners(dim, edge);
    let (lo, hi) = (block.corners()[a], block.corners()[b]);
    let n = block.subdivisions()[rc::edge_axis(dim, edge)];
    if pos == 0 {
        return Ok(lo);
    }
    if pos == n {
        return Ok(hi);
    }
    if let Some(&p) = cut_points.get(&(lo, hi, pos)) {
        return Ok(p);
    }
    let t = edge_distribution(n, block.edge_grading(edge))[pos];
    let xyz: Vec<f64> = points
        .get(lo)?
        .iter()
        .zip(points.get(hi)?)
        .map(|(xl, xh)| xl + t * (xh - xl))
        .collect();
    let p = points.push(&xyz)?;
    cut_points.insert((lo, hi, pos), p);
    Ok(p)
}

/// Grading of `edge` in the sub-block covering layers `lo..hi` along `axis`.
fn sub_block_grading(block: &Block, dim: usize, axis: usize, edge: usize, lo: usize, hi: usize) -> f64 {
    let n = block.subdivisions()[axis];
    if rc::edge_axis(dim, edge) == axis {
        return sub_grading(n, block.edge_grading(edge), lo, hi);
    }
    // Cross edge: it sits at layer `lo` or `hi` of the parent block.
    let (start, _) = rc::edge_corners(dim, edge);
    let mut bits = rc::corner_bits(dim, start);
    let pos = if bits[axis] == 0 { lo } else { hi };
    bits[axis] = 0;
    let low_edge = rc::edge_index(dim, rc::edge_axis(dim, edge), bits);
    bits[axis] = 1;
    let high_edge = rc::edge_index(dim, rc::edge_axis(dim, edge), bits);
    let (g_lo, g_hi) = (block.edge_grading(low_edge), block.edge_grading(high_edge));
    if pos == 0 || g_lo == g_hi {
        return g_lo;
    }
    if pos == n {
        return g_hi;
    }
    let per_axis = rc::edges_per_axis(dim);
    let t = (axis * per_axis..(axis + 1) * per_axis)
        .map(|e| edge_distribution(n, block.edge_grading(e))[pos])
        .sum::<f64>()
        / per_axis as f64;
    g_lo.powf(1.0 - t) * g_hi.powf(t)
}

/// Re-express patch faces of split blocks in terms of their sub-blocks.
fn rewrite_patches(
    arrays: &BlockArrays,
    split: &BlockTopology,
    children: &[Range<usize>],
    axis: usize,
) -> Result<PatchRegistry> {
    let topology = &arrays.topology;
    let mut owners: HashMap<Vec<usize>, Vec<(usize, usize, usize)>> = HashMap::new();
    for b in 0..topology.nb_blocks() {
        for f in topology.block_faces(b)? {
            owners.entry(f.key()).or_default().push((b, f.axis, f.side));
        }
    }

    let mut patches = arrays.patches.clone();
    for patch in arrays.patches.iter() {
        let mut faces: Vec<Face> = Vec::with_capacity(patch.faces().len());
        for face in patch.faces() {
            let key = face_key(face);
            match owners.get(&key).map(Vec::as_slice) {
                Some(&[(b, f_axis, f_side)]) if f_axis != axis && children[b].len() > 1 => {
                    for child in children[b].clone() {
                        let sub = &split.block_faces(child)?[2 * f_axis + f_side];
                        faces.push(sub.points.clone());
                    }
                }
                _ => faces.push(face.clone()),
            }
        }
        patches.replace_faces(patch.name(), faces)?;
    }
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strip(nx: usize) -> BlockArrays {
        let points =
            PointSet::from_rows(2, &[[0.0, 0.0], [10.0, 0.0], [10.0, 1.0], [0.0, 1.0]]).unwrap();
        let mut arrays = BlockArrays::new(points).unwrap();
        arrays.topology.add_blocks(1);
        arrays.topology.set_corners(0, &[0, 1, 2, 3]).unwrap();
        arrays.topology.set_subdivisions(0, &[nx, 2]).unwrap();
        arrays.patches.create_patch("bottom", &[[0, 1]]).unwrap();
        arrays.patches.create_patch("left", &[[3, 0]]).unwrap();
        arrays
    }

    #[test]
    fn ten_into_three() {
        let ranges = balanced_ranges(10, 3, 0).unwrap();
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn too_many_partitions() {
        assert_eq!(
            balanced_ranges(4, 5, 1).unwrap_err(),
            MeshGenError::TooManyPartitions {
                requested: 5,
                layers: 4,
                axis: 1
            }
        );
        assert!(balanced_ranges(4, 0, 0).is_err());
        assert!(matches!(
            partition(&strip(4), 5, 0),
            Err(MeshGenError::TooManyPartitions { requested: 5, layers: 4, .. })
        ));
    }

    #[test]
    fn invalid_axis() {
        assert_eq!(
            partition(&strip(4), 2, 2).unwrap_err(),
            MeshGenError::InvalidAxis {
                axis: 2,
                dimension: 2
            }
        );
    }

    #[test]
    fn split_block_gets_cut_points_and_ids() {
        let arrays = partition(&strip(10), 3, 0).unwrap();
        let topo = &arrays.topology;
        assert_eq!(topo.nb_blocks(), 3);
        assert_eq!(topo.nb_partitions(), 3);
        let counts: Vec<_> = topo.blocks().iter().map(|b| b.subdivisions()[0]).collect();
        assert_eq!(counts, vec![4, 3, 3]);
        let parts: Vec<_> = topo.blocks().iter().map(|b| b.partition()).collect();
        assert_eq!(parts, vec![0, 1, 2]);
        // 4 original points plus two cut lines of two points each
        assert_eq!(topo.points().len(), 8);
        assert_eq!(topo.points().get(4).unwrap(), &[4.0, 0.0]);
        assert_eq!(topo.blocks()[1].corners()[0], topo.blocks()[0].corners()[1]);

        let bottom = arrays.patches.patch("bottom").unwrap();
        assert_eq!(bottom.faces().len(), 3);
        // the left face is normal to the cut axis and stays whole
        assert_eq!(arrays.patches.patch("left").unwrap().faces(), &[vec![3, 0]]);
    }

    #[test]
    fn stacked_blocks_are_layered() {
        let points = PointSet::from_rows(
            2,
            &[[0.0, 0.0], [4.0, 0.0], [10.0, 0.0], [0.0, 1.0], [4.0, 1.0], [10.0, 1.0]],
        )
        .unwrap();
        let mut arrays = BlockArrays::new(points).unwrap();
        arrays.topology.add_blocks(2);
        arrays.topology.set_corners(0, &[0, 1, 4, 3]).unwrap();
        arrays.topology.set_subdivisions(0, &[4, 1]).unwrap();
        arrays.topology.set_corners(1, &[1, 2, 5, 4]).unwrap();
        arrays.topology.set_subdivisions(1, &[6, 1]).unwrap();

        let plan = BlockPartitioner.plan(&arrays, 3, 0).unwrap();
        assert_eq!(plan.offsets(), &[0, 4]);
        assert_eq!(plan.total_layers(), 10);

        let split = BlockPartitioner.apply(&arrays, &plan).unwrap();
        let layout: Vec<_> = split
            .topology
            .blocks()
            .iter()
            .map(|b| (b.subdivisions()[0], b.partition()))
            .collect();
        assert_eq!(layout, vec![(4, 0), (3, 1), (3, 2)]);
    }

    #[test]
    fn foreign_plans_are_rejected() {
        let plan = BlockPartitioner.plan(&strip(10), 3, 0).unwrap();

        let mut unfinished = strip(10);
        unfinished.topology.add_blocks(1);
        assert_eq!(
            BlockPartitioner.apply(&unfinished, &plan).unwrap_err(),
            MeshGenError::IncompleteBlock { block: 1, missing: "corners" }
        );

        let shorter = strip(4);
        assert!(matches!(
            BlockPartitioner.apply(&shorter, &plan),
            Err(MeshGenError::InconsistentLayering { block: 0, axis: 0, .. })
        ));

        let solid = crate::algs::extrude::extrude(&strip(4), &[1.0], &[3], &[1.0]).unwrap();
        let along_z = BlockPartitioner.plan(&solid, 3, 2).unwrap();
        assert_eq!(
            BlockPartitioner.apply(&strip(4), &along_z).unwrap_err(),
            MeshGenError::InvalidAxis { axis: 2, dimension: 2 }
        );
    }

    #[test]
    fn incomplete_blocks_are_rejected() {
        let mut arrays = strip(4);
        let id = arrays.topology.add_blocks(1).start;
        arrays.topology.set_corners(id, &[0, 1, 2, 3]).unwrap();
        assert_eq!(
            partition(&arrays, 2, 0).unwrap_err(),
            MeshGenError::IncompleteBlock { block: 1, missing: "subdivisions" }
        );
    }

    #[test]
    fn flipped_neighbour_is_rejected() {
        let points = PointSet::from_rows(
            2,
            &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]],
        )
        .unwrap();
        let mut arrays = BlockArrays::new(points).unwrap();
        arrays.topology.add_blocks(2);
        arrays.topology.set_corners(0, &[0, 1, 4, 3]).unwrap();
        arrays.topology.set_subdivisions(0, &[2, 2]).unwrap();
        // second block runs its u axis backwards
        arrays.topology.set_corners(1, &[5, 4, 1, 2]).unwrap();
        arrays.topology.set_subdivisions(1, &[2, 2]).unwrap();
        assert!(matches!(
            partition(&arrays, 2, 0),
            Err(MeshGenError::InconsistentLayering { .. })
        ));
    }

    #[test]
    fn cartesian_ids_combine_axes() {
        let once = partition(&strip(4), 2, 0).unwrap();
        let twice = partition(&once, 2, 1).unwrap();
        assert_eq!(twice.topology.nb_partitions(), 4);
        let mut ids: Vec<_> = twice.topology.blocks().iter().map(|b| b.partition()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn graded_split_keeps_progression() {
        let mut arrays = strip(6);
        arrays.topology.set_gradings(0, &[3.0, 1.0]).unwrap();
        let split = partition(&arrays, 2, 0).unwrap();
        let parent = edge_distribution(6, 3.0);
        let cut = split.topology.points().get(4).unwrap()[0];
        assert!((cut - 10.0 * parent[3]).abs() < 1e-12);
        let g0 = split.topology.blocks()[0].gradings()[0];
        let g1 = split.topology.blocks()[1].gradings()[0];
        let r = 3.0f64.powf(1.0 / 5.0);
        assert!((g0 - r.powi(2)).abs() < 1e-12);
        assert!((g1 - r.powi(2)).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn ranges_cover_exactly_once(total in 1usize..500, frac in 0.0f64..1.0) {
            let nb = 1 + ((total - 1) as f64 * frac) as usize;
            let ranges = balanced_ranges(total, nb, 0).unwrap();
            prop_assert_eq!(ranges.len(), nb);
            prop_assert_eq!(ranges[0].start, 0);
            prop_assert_eq!(ranges[nb - 1].end, total);
            for w in ranges.windows(2) {
                prop_assert_eq!(w[0].end, w[1].start);
            }
            let max = ranges.iter().map(|r| r.len()).max().unwrap();
            let min = ranges.iter().map(|r| r.len()).min().unwrap();
            prop_assert!(max - min <= 1);
            prop_assert!(min >= 1);
        }
    }
}
