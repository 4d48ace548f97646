use block_mesh::algs::grading::edge_distribution;
use block_mesh::config::BuildOptions;
use block_mesh::mesh_error::{ErrorKind, MeshGenError};
use block_mesh::prelude::*;

fn unit_square(nx: usize, ny: usize) -> BlockArrays {
    let mut arrays = BlockArrays::with_points(2, 4).unwrap();
    for (i, xy) in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]].iter().enumerate() {
        arrays.topology.points_mut().set(i, xy).unwrap();
    }
    arrays.topology.add_blocks(1);
    arrays.topology.set_corners(0, &[0, 1, 2, 3]).unwrap();
    arrays.topology.set_subdivisions(0, &[nx, ny]).unwrap();
    arrays.topology.set_gradings(0, &[1.0, 1.0, 1.0, 1.0]).unwrap();
    arrays
}

fn build(arrays: &BlockArrays) -> Mesh {
    MeshBuilder::default()
        .build(&arrays.topology, &arrays.patches)
        .unwrap()
}

#[test]
fn unit_square_with_bottom_patch() {
    let mut arrays = unit_square(2, 2);
    arrays.patches.create_patch("bottom", &[[0, 1]]).unwrap();
    let mesh = build(&arrays);

    assert_eq!(mesh.nb_nodes(), 9);
    assert_eq!(mesh.nb_elements(), 4);
    let mut coords: Vec<(f64, f64)> = (0..mesh.nb_nodes())
        .map(|n| {
            let p = mesh.node(n).unwrap();
            (p[0], p[1])
        })
        .collect();
    coords.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut expected = Vec::new();
    for x in [0.0, 0.5, 1.0] {
        for y in [0.0, 0.5, 1.0] {
            expected.push((x, y));
        }
    }
    assert_eq!(coords, expected);

    let bottom = mesh.boundary("bottom").unwrap();
    assert_eq!(bottom.faces.len(), 2);
    let mut segments: Vec<_> = bottom
        .faces
        .iter()
        .map(|f| {
            let a = mesh.node(f.nodes[0]).unwrap()[0];
            let b = mesh.node(f.nodes[1]).unwrap()[0];
            (a.min(b), a.max(b))
        })
        .collect();
    segments.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(segments, vec![(0.0, 0.5), (0.5, 1.0)]);
    for f in &bottom.faces {
        assert!(f.nodes.iter().all(|&n| mesh.node(n).unwrap()[1] == 0.0));
    }
}

#[test]
fn ten_cells_into_three_partitions() {
    assert_eq!(balanced_ranges(10, 3, 0).unwrap(), vec![0..4, 4..7, 7..10]);

    let arrays = unit_square(10, 1);
    let split = partition(&arrays, 3, 0).unwrap();
    let mesh = build(&split);
    let counts: Vec<_> = (0..3).map(|p| mesh.elements_in_partition(p).len()).collect();
    assert_eq!(counts, vec![4, 3, 3]);
    assert_eq!(mesh.nb_nodes(), 22);
}

#[test]
fn unit_grading_is_uniform() {
    for n in 1..20 {
        let d = edge_distribution(n, 1.0);
        for (i, t) in d.iter().enumerate() {
            assert_eq!(*t, i as f64 / n as f64);
        }
    }
    let mesh = build(&unit_square(4, 5));
    for n in 0..mesh.nb_nodes() {
        let p = mesh.node(n).unwrap();
        let (x, y) = (p[0] * 4.0, p[1] * 5.0);
        assert!((x - x.round()).abs() < 1e-12, "x = {}", p[0]);
        assert!((y - y.round()).abs() < 1e-12, "y = {}", p[1]);
    }
}

#[test]
fn rebuild_is_bit_identical() {
    let mut arrays = unit_square(6, 3);
    arrays.topology.set_gradings(0, &[3.0, 0.25, 1.5, 1.5]).unwrap();
    arrays.patches.create_patch("top", &[[2, 3]]).unwrap();
    let first = build(&arrays);
    let second = build(&arrays);
    let bits = |m: &Mesh| m.coordinates().iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&second));
    assert_eq!(first, second);
}

#[test]
fn interior_patch_face_is_structural_error() {
    let points = PointSet::from_rows(
        2,
        &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]],
    )
    .unwrap();
    let mut arrays = BlockArrays::new(points).unwrap();
    arrays.topology.add_blocks(2);
    arrays.topology.set_corners(0, &[0, 1, 4, 3]).unwrap();
    arrays.topology.set_corners(1, &[1, 2, 5, 4]).unwrap();
    for b in 0..2 {
        arrays.topology.set_subdivisions(b, &[2, 2]).unwrap();
    }
    arrays.patches.create_patch("middle", &[[1, 4]]).unwrap();
    let err = MeshBuilder::new(BuildOptions::default())
        .build(&arrays.topology, &arrays.patches)
        .unwrap_err();
    assert_eq!(
        err,
        MeshGenError::UnmatchedPatchFace {
            patch: "middle".into(),
            face: 0,
            points: vec![1, 4],
        }
    );
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn setter_errors_are_validation_errors() {
    assert_eq!(
        PointSet::create(4, 2).unwrap_err(),
        MeshGenError::InvalidDimension(4)
    );
    let mut arrays = unit_square(1, 1);
    let err = arrays.topology.points().get(7).unwrap_err();
    assert!(matches!(
        err,
        MeshGenError::IndexOutOfRange { index: 7, len: 4, .. }
    ));
    let err = arrays.topology.set_gradings(0, &[1.0, f64::NAN]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    arrays.patches.create_patch("bottom", &[[0, 1]]).unwrap();
    let err = arrays.patches.create_patch("bottom", &[[1, 2]]).unwrap_err();
    assert_eq!(err, MeshGenError::DuplicatePatchName("bottom".into()));
    assert_eq!(err.kind(), ErrorKind::Validation);
}
