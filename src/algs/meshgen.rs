//! Realize a block topology into a concrete [`Mesh`].
//!
//! The builder walks the blocks in order and, for each one:
//! 1. places the lattice nodes from graded parametric coordinates
//!    ([`BlockLattice`]) and multilinear corner interpolation,
//! 2. merges nodes shared with earlier blocks through an exact topological
//!    key (corner point, edge endpoints + offset, face corners + offsets),
//! 3. strides the lattice into quad/hex cells tagged with the block id.
//!
//! Patch faces are then matched against the exterior block faces and expanded
//! into the lattice faces they cover. Nothing is returned on error.
//!
//! # Example
//! ```rust
//! # fn try_main() -> Result<(), block_mesh::mesh_error::MeshGenError> {
//! use block_mesh::algs::meshgen::MeshBuilder;
//! use block_mesh::topology::BlockArrays;
//!
//! let mut arrays = BlockArrays::with_points(2, 4)?;
//! for (i, xy) in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]].iter().enumerate() {
//!     arrays.topology.points_mut().set(i, xy)?;
//! }
//! arrays.topology.add_blocks(1);
//! arrays.topology.set_corners(0, &[0, 1, 2, 3])?;
//! arrays.topology.set_subdivisions(0, &[2, 2])?;
//! arrays.patches.create_patch("bottom", &[[0, 1]])?;
//!
//! let mesh = MeshBuilder::default().build(&arrays.topology, &arrays.patches)?;
//! assert_eq!(mesh.nb_nodes(), 9);
//! assert_eq!(mesh.nb_elements(), 4);
//! assert_eq!(mesh.boundary("bottom").unwrap().faces.len(), 2);
//! # Ok(())
//! # }
//! # try_main().unwrap();
//! ```

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::algs::grading::{BlockLattice, interpolate_corners};
use crate::config::BuildOptions;
use crate::debug_invariants::DebugInvariants;
use crate::mesh::{BoundaryFace, BoundaryRegion, ElementGroup, Mesh};
use crate::mesh_error::{MeshGenError, Result};
use crate::topology::block::{BlockFace, BlockTopology, face_key};
use crate::topology::cell_type::CellType;
use crate::topology::patch::PatchRegistry;
use crate::topology::reference_cell as rc;

/// Topological identity of a lattice node that may be shared between blocks.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum NodeKey {
    /// Block corner, identified by its point index.
    Corner(usize),
    /// Edge interior: ascending endpoint points and offset from the first.
    Edge(usize, usize, usize),
    /// Face interior: canonically rotated corner points and offsets.
    Face([usize; 4], usize, usize),
}

/// Per-block lattice bookkeeping kept for patch resolution.
struct RealizedBlock {
    counts: [usize; rc::MAX_DIM],
    /// Global node of each lattice point, `i` fastest.
    nodes: Vec<usize>,
    first_element: usize,
}

impl RealizedBlock {
    fn node(&self, ijk: [usize; rc::MAX_DIM]) -> usize {
        let [nx, ny, _] = self.counts;
        self.nodes[(ijk[2] * (ny + 1) + ijk[1]) * (nx + 1) + ijk[0]]
    }

    fn element(&self, cell: [usize; rc::MAX_DIM]) -> usize {
        let [nx, ny, _] = self.counts;
        self.first_element + (cell[2] * ny + cell[1]) * nx + cell[0]
    }
}

/// Builds [`Mesh`]es from a block topology and patch registry.
#[derive(Clone, Debug, Default)]
pub struct MeshBuilder {
    options: BuildOptions,
}

impl MeshBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Realize `topology` and resolve every patch of `patches`.
    pub fn build(&self, topology: &BlockTopology, patches: &PatchRegistry) -> Result<Mesh> {
        let dim = topology.dimension();
        if patches.dimension() != dim {
            return Err(MeshGenError::InvalidDimension(patches.dimension()));
        }
        topology.check_complete()?;
        check_edge_subdivisions(topology)?;

        let mut coordinates: Vec<f64> = Vec::new();
        let mut shared: HashMap<NodeKey, usize> = HashMap::new();
        let mut groups = Vec::with_capacity(topology.nb_blocks());
        let mut realized = Vec::with_capacity(topology.nb_blocks());
        let mut next_element = 0;

        for (block_id, block) in topology.blocks().iter().enumerate() {
            let lattice = BlockLattice::new(dim, block);
            let counts = lattice.counts();
            let corner_coords: Vec<&[f64]> = block
                .corners()
                .iter()
                .map(|&p| topology.points().get(p))
                .collect::<Result<_>>()?;

            let mut nodes = Vec::with_capacity((0..dim).map(|a| counts[a] + 1).product());
            let mut xyz = vec![0.0; dim];
            let k_max = if dim == 3 { counts[2] } else { 0 };
            for k in 0..=k_max {
                for j in 0..=counts[1] {
                    for i in 0..=counts[0] {
                        let ijk = [i, j, k];
                        let key = node_key(dim, block.corners(), counts, ijk);
                        let existing = key.as_ref().and_then(|key| shared.get(key).copied());
                        let node = match existing {
                            Some(node) => node,
                            None => {
                                let node = coordinates.len() / dim;
                                let uvw = lattice.parametric(ijk);
                                interpolate_corners(dim, &corner_coords, uvw, &mut xyz);
                                coordinates.extend_from_slice(&xyz);
                                if let Some(key) = key {
                                    shared.insert(key, node);
                                }
                                node
                            }
                        };
                        nodes.push(node);
                    }
                }
            }

            let rb = RealizedBlock {
                counts,
                nodes,
                first_element: next_element,
            };
            let connectivity = stride_cells(dim, &rb);
            let cell_type = CellType::volume(dim);
            let group = ElementGroup {
                block: block_id,
                partition: block.partition(),
                cell_type,
                first_element: next_element,
                connectivity,
            };
            next_element += group.len();
            log::debug!(
                "block {block_id}: {} cells, {} nodes so far",
                group.len(),
                coordinates.len() / dim
            );
            groups.push(group);
            realized.push(rb);
        }

        let boundary = self.resolve_patches(topology, patches, &realized)?;
        let mesh = Mesh::from_parts(dim, coordinates, groups, boundary, topology.nb_partitions());
        if self.options.check_invariants {
            mesh.validate_invariants()?;
        }
        mesh.debug_assert_invariants();
        log::info!(
            "built {dim}D mesh: {} nodes, {} elements, {} boundary regions",
            mesh.nb_nodes(),
            mesh.nb_elements(),
            mesh.boundary_regions().count()
        );
        Ok(mesh)
    }

    fn resolve_patches(
        &self,
        topology: &BlockTopology,
        patches: &PatchRegistry,
        realized: &[RealizedBlock],
    ) -> Result<BTreeMap<String, BoundaryRegion>> {
        let dim = topology.dimension();
        let facet = CellType::facet(dim);
        let owners = face_owners(topology)?;
        let mut claimed: HashMap<Vec<usize>, &str> = HashMap::new();
        let mut regions = BTreeMap::new();

        for patch in patches.iter() {
            let mut faces = Vec::new();
            for (face_idx, points) in patch.faces().iter().enumerate() {
                let key = face_key(points);
                let unmatched = || MeshGenError::UnmatchedPatchFace {
                    patch: patch.name().to_string(),
                    face: face_idx,
                    points: points.clone(),
                };
                let block_face = match owners.get(&key).map(Vec::as_slice) {
                    Some([only]) => only,
                    _ => return Err(unmatched()),
                };
                if let Some(first) = claimed.insert(key.clone(), patch.name()) {
                    return Err(MeshGenError::DuplicatePatchFace {
                        points: key,
                        first: first.to_string(),
                        second: patch.name().to_string(),
                    });
                }
                lattice_faces(dim, block_face, &realized[block_face.block], &mut faces);
            }
            log::debug!("patch `{}`: {} faces", patch.name(), faces.len());
            regions.insert(
                patch.name().to_string(),
                BoundaryRegion::new(patch.name(), facet, faces),
            );
        }

        let untagged: Vec<&BlockFace> = owners
            .iter_ordered()
            .filter(|(key, owned)| owned.len() == 1 && !claimed.contains_key(*key))
            .map(|(_, owned)| &owned[0])
            .collect();
        match &self.options.untagged_patch {
            Some(name) => {
                if patches.contains(name) {
                    return Err(MeshGenError::DuplicatePatchName(name.clone()));
                }
                let mut faces = Vec::new();
                for bf in &untagged {
                    lattice_faces(dim, bf, &realized[bf.block], &mut faces);
                }
                regions.insert(name.clone(), BoundaryRegion::new(name, facet, faces));
            }
            None if !untagged.is_empty() => {
                log::debug!("{} exterior block faces are not in any patch", untagged.len());
            }
            None => {}
        }
        Ok(regions)
    }
}

/// Exterior/interior lookup of block faces by sorted corner points.
struct FaceOwners {
    map: HashMap<Vec<usize>, Vec<BlockFace>>,
    order: Vec<Vec<usize>>,
}

impl FaceOwners {
    fn get(&self, key: &[usize]) -> Option<&Vec<BlockFace>> {
        self.map.get(key)
    }

    /// Faces in first-seen order (block order, then local face order).
    fn iter_ordered(&self) -> impl Iterator<Item = (&Vec<usize>, &Vec<BlockFace>)> + '_ {
        self.order.iter().filter_map(|k| self.map.get_key_value(k))
    }
}

fn face_owners(topology: &BlockTopology) -> Result<FaceOwners> {
    let mut map: HashMap<Vec<usize>, Vec<BlockFace>> = HashMap::new();
    let mut order = Vec::new();
    for block in 0..topology.nb_blocks() {
        for face in topology.block_faces(block)? {
            let key = face.key();
            let entry = map.entry(key.clone()).or_default();
            if entry.is_empty() {
                order.push(key);
            }
            entry.push(face);
        }
    }
    Ok(FaceOwners { map, order })
}

/// Every block edge shared by several blocks must carry one subdivision count.
fn check_edge_subdivisions(topology: &BlockTopology) -> Result<()> {
    let dim = topology.dimension();
    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
    for (block_id, block) in topology.blocks().iter().enumerate() {
        for edge in 0..rc::edge_count(dim) {
            let (a, b) = rc::edge_corners(dim, edge);
            let (pa, pb) = (block.corners()[a], block.corners()[b]);
            let key = (pa.min(pb), pa.max(pb));
            let count = block.subdivisions()[rc::edge_axis(dim, edge)];
            match seen.get(&key) {
                Some(&first) if first != count => {
                    return Err(MeshGenError::InconsistentEdgeSubdivision {
                        edge: key,
                        first,
                        second: count,
                        block: block_id,
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(key, count);
                }
            }
        }
    }
    Ok(())
}

/// Shared-node key of lattice point `ijk`, or `None` for block-interior nodes.
fn node_key(
    dim: usize,
    corners: &[usize],
    counts: [usize; rc::MAX_DIM],
    ijk: [usize; rc::MAX_DIM],
) -> Option<NodeKey> {
    let mut bits = [0; rc::MAX_DIM];
    let mut free = [0; rc::MAX_DIM];
    let mut nb_free = 0;
    for axis in 0..dim {
        if ijk[axis] == 0 {
            bits[axis] = 0;
        } else if ijk[axis] == counts[axis] {
            bits[axis] = 1;
        } else {
            free[nb_free] = axis;
            nb_free += 1;
        }
    }
    match nb_free {
        0 => Some(NodeKey::Corner(corners[rc::corner_index(dim, bits)])),
        1 => {
            let axis = free[0];
            let edge = rc::edge_index(dim, axis, bits);
            let (a, b) = rc::edge_corners(dim, edge);
            let (pa, pb) = (corners[a], corners[b]);
            let offset = ijk[axis];
            Some(if pa <= pb {
                NodeKey::Edge(pa, pb, offset)
            } else {
                NodeKey::Edge(pb, pa, counts[axis] - offset)
            })
        }
        2 if dim == 3 => {
            let fixed = (0..dim).find(|a| !free[..nb_free].contains(a))?;
            Some(face_node_key(dim, corners, counts, ijk, fixed, bits[fixed]))
        }
        _ => None,
    }
}

/// Canonical key of a node strictly inside face `(axis, side)` of a hex.
///
/// The face frame is rotated so that it starts at the smallest corner point
/// and runs first toward the smaller of that corner's two neighbours; the
/// lattice offsets are expressed in that frame.
fn face_node_key(
    dim: usize,
    corners: &[usize],
    counts: [usize; rc::MAX_DIM],
    ijk: [usize; rc::MAX_DIM],
    axis: usize,
    side: usize,
) -> NodeKey {
    let mut frame_axes = rc::other_axes(dim, axis);
    let (b, c) = match (frame_axes.next(), frame_axes.next()) {
        (Some(b), Some(c)) => (b, c),
        _ => unreachable!("hex faces have two frame axes"),
    };
    let frame = rc::face_frame(dim);
    let points: Vec<usize> = frame
        .iter()
        .map(|pos| {
            let mut bits = [0; rc::MAX_DIM];
            bits[axis] = side;
            bits[b] = pos[0];
            bits[c] = pos[1];
            corners[rc::corner_index(dim, bits)]
        })
        .collect();

    let start = (0..4).min_by_key(|&s| points[s]).unwrap_or(0);
    let next = (start + 1) % 4;
    let prev = (start + 3) % 4;
    let toward = if points[next] <= points[prev] { next } else { prev };
    let away = if toward == next { prev } else { next };
    let origin = frame[start];

    let along_b = if origin[0] == 0 { ijk[b] } else { counts[b] - ijk[b] };
    let along_c = if origin[1] == 0 { ijk[c] } else { counts[c] - ijk[c] };
    let toward_varies_b = frame[toward][0] != origin[0];
    let (first, second) = if toward_varies_b {
        (along_b, along_c)
    } else {
        (along_c, along_b)
    };
    NodeKey::Face(
        [points[start], points[toward], points[(start + 2) % 4], points[away]],
        first,
        second,
    )
}

/// Quad/hex connectivity of a realized block, cells ordered `i` fastest.
fn stride_cells(dim: usize, rb: &RealizedBlock) -> Vec<usize> {
    let [nx, ny, nz] = rb.counts;
    let layers = if dim == 3 { nz } else { 1 };
    let mut cells = Vec::with_capacity(nx * ny * layers * rc::corner_count(dim));
    for k in 0..layers {
        for j in 0..ny {
            for i in 0..nx {
                let v0 = rb.node([i, j, k]);
                let v1 = rb.node([i + 1, j, k]);
                let v2 = rb.node([i + 1, j + 1, k]);
                let v3 = rb.node([i, j + 1, k]);
                cells.extend_from_slice(&[v0, v1, v2, v3]);
                if dim == 3 {
                    let v4 = rb.node([i, j, k + 1]);
                    let v5 = rb.node([i + 1, j, k + 1]);
                    let v6 = rb.node([i + 1, j + 1, k + 1]);
                    let v7 = rb.node([i, j + 1, k + 1]);
                    cells.extend_from_slice(&[v4, v5, v6, v7]);
                }
            }
        }
    }
    cells
}

/// Append the lattice faces covering block face `bf`, outward oriented.
fn lattice_faces(dim: usize, bf: &BlockFace, rb: &RealizedBlock, out: &mut Vec<BoundaryFace>) {
    let axis = bf.axis;
    let fixed = if bf.side == 0 { 0 } else { rb.counts[axis] };
    let fixed_cell = if bf.side == 0 { 0 } else { rb.counts[axis] - 1 };
    let frame_axes: Vec<usize> = rc::other_axes(dim, axis).collect();
    let nb = rb.counts[frame_axes[0]];
    let nc = frame_axes.get(1).map_or(1, |&c| rb.counts[c]);
    let reversed = rc::face_is_reversed(axis, bf.side);

    for y in 0..nc {
        for x in 0..nb {
            let mut nodes: Vec<usize> = rc::face_frame(dim)
                .iter()
                .map(|pos| {
                    let mut ijk = [0; rc::MAX_DIM];
                    ijk[axis] = fixed;
                    ijk[frame_axes[0]] = x + pos[0];
                    if let Some(&c) = frame_axes.get(1) {
                        ijk[c] = y + pos[1];
                    }
                    rb.node(ijk)
                })
                .collect();
            if reversed {
                rc::reverse_face(&mut nodes);
            }
            let mut cell = [0; rc::MAX_DIM];
            cell[axis] = fixed_cell;
            cell[frame_axes[0]] = x;
            if let Some(&c) = frame_axes.get(1) {
                cell[c] = y;
            }
            out.push(BoundaryFace {
                nodes,
                element: rb.element(cell),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::point_set::PointSet;

    fn square_topology(nx: usize, ny: usize) -> (BlockTopology, PatchRegistry) {
        let points =
            PointSet::from_rows(2, &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap();
        let mut topo = BlockTopology::new(points);
        topo.add_blocks(1);
        topo.set_corners(0, &[0, 1, 2, 3]).unwrap();
        topo.set_subdivisions(0, &[nx, ny]).unwrap();
        (topo, PatchRegistry::new(2).unwrap())
    }

    #[test]
    fn unit_square_two_by_two() {
        let (topo, mut patches) = square_topology(2, 2);
        patches.create_patch("bottom", &[[0, 1]]).unwrap();
        let mesh = MeshBuilder::default().build(&topo, &patches).unwrap();

        assert_eq!(mesh.nb_nodes(), 9);
        assert_eq!(mesh.nb_elements(), 4);
        let mut expected = Vec::new();
        for y in [0.0, 0.5, 1.0] {
            for x in [0.0, 0.5, 1.0] {
                expected.extend_from_slice(&[x, y]);
            }
        }
        assert_eq!(mesh.coordinates(), expected.as_slice());

        let bottom = mesh.boundary("bottom").unwrap();
        let faces: Vec<_> = bottom.faces.iter().map(|f| f.nodes.clone()).collect();
        assert_eq!(faces, vec![vec![0, 1], vec![1, 2]]);
        assert_eq!(bottom.faces[1].element, 1);
        assert_eq!(bottom.cell_type, CellType::Segment);
    }

    #[test]
    fn left_face_is_listed_outward() {
        let (topo, mut patches) = square_topology(1, 2);
        patches.create_patch("left", &[[3, 0]]).unwrap();
        let mesh = MeshBuilder::default().build(&topo, &patches).unwrap();
        let faces: Vec<_> = mesh
            .boundary("left")
            .unwrap()
            .faces
            .iter()
            .map(|f| f.nodes.clone())
            .collect();
        // lattice nodes: row j has nodes 2j, 2j+1
        assert_eq!(faces, vec![vec![2, 0], vec![4, 2]]);
    }

    #[test]
    fn unknown_face_is_rejected() {
        let (topo, mut patches) = square_topology(1, 1);
        patches.create_patch("diag", &[[0, 2]]).unwrap();
        let err = MeshBuilder::default().build(&topo, &patches).unwrap_err();
        assert_eq!(
            err,
            MeshGenError::UnmatchedPatchFace {
                patch: "diag".into(),
                face: 0,
                points: vec![0, 2]
            }
        );
    }

    #[test]
    fn face_in_two_patches_is_rejected() {
        let (topo, mut patches) = square_topology(1, 1);
        patches.create_patch("a", &[[0, 1]]).unwrap();
        patches.create_patch("b", &[[1, 0]]).unwrap();
        let err = MeshBuilder::default().build(&topo, &patches).unwrap_err();
        assert!(matches!(err, MeshGenError::DuplicatePatchFace { .. }));
    }

    #[test]
    fn untagged_faces_collect_into_default_patch() {
        let (topo, mut patches) = square_topology(2, 1);
        patches.create_patch("bottom", &[[0, 1]]).unwrap();
        let builder = MeshBuilder::new(BuildOptions {
            untagged_patch: Some("walls".into()),
            ..BuildOptions::default()
        });
        let mesh = builder.build(&topo, &patches).unwrap();
        assert_eq!(mesh.boundary("walls").unwrap().faces.len(), 4);
    }

    #[test]
    fn incomplete_block_fails() {
        let (mut topo, patches) = square_topology(1, 1);
        topo.add_blocks(1);
        assert!(matches!(
            MeshBuilder::default().build(&topo, &patches),
            Err(MeshGenError::IncompleteBlock { block: 1, .. })
        ));
    }

    #[test]
    fn face_keys_agree_across_orientations() {
        let counts = [3, 2, 4];
        // The same face viewed from a block whose frame is rotated.
        let a = face_node_key(3, &[0, 1, 2, 3, 4, 5, 6, 7], counts, [2, 1, 0], 2, 0);
        let rotated = [1, 2, 3, 0, 5, 6, 7, 4];
        let b = face_node_key(3, &rotated, [2, 3, 4], [1, 1, 0], 2, 0);
        assert_eq!(a, b);
        assert_eq!(a, NodeKey::Face([0, 1, 2, 3], 2, 1));
    }
}
