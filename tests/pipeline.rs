use block_mesh::mesh_error::MeshGenError;
use block_mesh::prelude::*;
use proptest::prelude::*;

fn channel(lx: f64, nx: usize, ny: usize, y_grading: f64) -> BlockArrays {
    let points = PointSet::from_rows(2, &[[0.0, 0.0], [lx, 0.0], [lx, 1.0], [0.0, 1.0]]).unwrap();
    let mut arrays = BlockArrays::new(points).unwrap();
    arrays.topology.add_blocks(1);
    arrays.topology.set_corners(0, &[0, 1, 2, 3]).unwrap();
    arrays.topology.set_subdivisions(0, &[nx, ny]).unwrap();
    arrays.topology.set_gradings(0, &[1.0, y_grading]).unwrap();
    arrays.patches.create_patch("inlet", &[[3, 0]]).unwrap();
    arrays.patches.create_patch("outlet", &[[1, 2]]).unwrap();
    arrays.patches.create_patch("walls", &[[0, 1], [2, 3]]).unwrap();
    arrays.periodic.add("inlet", "outlet", &[lx, 0.0]).unwrap();
    arrays
}

/// L-shape of three axis-aligned blocks: `[0,1]^2`, `[1,2]x[0,1]` and `[0,1]x[1,2]`.
fn aligned_l(nx: [usize; 2], ny: [usize; 2]) -> BlockArrays {
    let mut rows = Vec::new();
    for j in 0..3 {
        for i in 0..3 {
            rows.push([i as f64, j as f64]);
        }
    }
    let mut arrays = BlockArrays::new(PointSet::from_rows(2, &rows).unwrap()).unwrap();
    arrays.topology.add_blocks(3);
    arrays.topology.set_corners(0, &[0, 1, 4, 3]).unwrap();
    arrays.topology.set_subdivisions(0, &[nx[0], ny[0]]).unwrap();
    arrays.topology.set_corners(1, &[1, 2, 5, 4]).unwrap();
    arrays.topology.set_subdivisions(1, &[nx[1], ny[0]]).unwrap();
    arrays.topology.set_corners(2, &[3, 4, 7, 6]).unwrap();
    arrays.topology.set_subdivisions(2, &[nx[0], ny[1]]).unwrap();
    arrays.patches.create_patch("bottom", &[[0, 1], [1, 2]]).unwrap();
    arrays
}

fn build(arrays: &BlockArrays) -> Mesh {
    MeshBuilder::default()
        .build(&arrays.topology, &arrays.patches)
        .unwrap()
}

fn distinct_levels(mesh: &Mesh, axis: usize) -> usize {
    let mut levels: Vec<f64> = (0..mesh.nb_nodes())
        .map(|n| mesh.node(n).unwrap()[axis])
        .collect();
    levels.sort_by(|a, b| a.partial_cmp(b).unwrap());
    levels.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    levels.len()
}

#[test]
fn extrude_partition_build_link() {
    let arrays = channel(4.0, 8, 2, 1.0);
    let solid = extrude(&arrays, &[1.0, 2.0], &[2, 4], &[1.0, 0.5]).unwrap();
    let split = partition(&solid, 2, 0).unwrap();
    let split = partition(&split, 3, 2).unwrap();
    assert_eq!(split.topology.nb_partitions(), 6);

    let mut mesh = build(&split);
    assert_eq!(mesh.nb_elements(), 8 * 2 * 6);
    assert_eq!(mesh.nb_nodes(), 9 * 3 * 7);
    for p in 0..6 {
        assert_eq!(mesh.elements_in_partition(p).len(), 16);
    }
    for name in ["inlet", "outlet", "walls", "front", "back"] {
        assert!(mesh.boundary(name).is_some(), "missing {name}");
    }
    assert_eq!(mesh.boundary("front").unwrap().faces.len(), 16);
    assert_eq!(mesh.boundary("inlet").unwrap().faces.len(), 2 * 6);

    PeriodicConnector::default()
        .link(&mut mesh, split.periodic.links())
        .unwrap();
    assert_eq!(mesh.periodic_links()[0].pairs.len(), 3 * 7);
}

#[test]
fn partitioning_keeps_node_positions() {
    let mut arrays = channel(10.0, 7, 3, 0.5);
    arrays.topology.set_gradings(0, &[2.5, 0.5]).unwrap();
    let whole = build(&arrays);
    let split = build(&partition(&arrays, 3, 0).unwrap());
    assert_eq!(whole.nb_nodes(), split.nb_nodes());
    assert_eq!(whole.nb_elements(), split.nb_elements());
    for n in 0..split.nb_nodes() {
        let p = split.node(n).unwrap();
        let found = (0..whole.nb_nodes()).any(|m| {
            let q = whole.node(m).unwrap();
            (p[0] - q[0]).abs() < 1e-9 && (p[1] - q[1]).abs() < 1e-9
        });
        assert!(found, "node {n} at {p:?} has no counterpart");
    }
}

#[test]
fn periodic_failure_leaves_mesh_usable() {
    let mut mesh = build(&channel(4.0, 4, 2, 1.0));
    let bad = PeriodicLink {
        source: "inlet".into(),
        destination: "walls".into(),
        translation: vec![4.0, 0.0],
    };
    let err = PeriodicConnector::default().link(&mut mesh, &[bad]).unwrap_err();
    assert!(matches!(err, MeshGenError::UnmatchedPeriodicNode { .. }));
    assert!(!mesh.is_periodic());
    assert_eq!(mesh.nb_nodes(), 15);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn partition_covers_every_cell_once(total in 1usize..40, frac in 0.0f64..1.0) {
        let nb = 1 + ((total - 1) as f64 * frac) as usize;
        let arrays = channel(3.0, total, 1, 1.0);
        let split = partition(&arrays, nb, 0).unwrap();
        let mesh = build(&split);
        let counts: Vec<usize> = (0..nb).map(|p| mesh.elements_in_partition(p).len()).collect();
        prop_assert_eq!(counts.iter().sum::<usize>(), total);
        let max = counts.iter().copied().max().unwrap();
        let min = counts.iter().copied().min().unwrap();
        prop_assert!(max - min <= 1);
        prop_assert!(min >= 1);
        prop_assert_eq!(mesh.nb_nodes(), 2 * (total + 1));
    }

    #[test]
    fn multi_block_partition_covers_every_cell_once(
        nx in prop::array::uniform2(1usize..6),
        ny in prop::array::uniform2(1usize..6),
        axis in 0usize..2,
        frac in 0.0f64..1.0,
    ) {
        let arrays = aligned_l(nx, ny);
        let (along, across) = if axis == 0 { (nx, ny) } else { (ny, nx) };
        let total = along[0] + along[1];
        let nb = 1 + ((total - 1) as f64 * frac) as usize;
        let whole = build(&arrays);
        let mesh = build(&partition(&arrays, nb, axis).unwrap());
        prop_assert_eq!(mesh.nb_nodes(), whole.nb_nodes());
        prop_assert_eq!(mesh.nb_elements(), whole.nb_elements());

        // the first `along[0]` layers cross two blocks, the rest only one
        let width = |layer: usize| across[0] + if layer < along[0] { across[1] } else { 0 };
        let ranges = balanced_ranges(total, nb, axis).unwrap();
        let mut seen = vec![false; mesh.nb_elements()];
        for (p, range) in ranges.into_iter().enumerate() {
            let cells = mesh.elements_in_partition(p);
            prop_assert_eq!(cells.len(), range.map(width).sum::<usize>());
            for e in cells {
                prop_assert!(!seen[e]);
                seen[e] = true;
            }
        }
        prop_assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn periodic_pairs_round_trip(
        nx in 1usize..6,
        ny in 1usize..6,
        lx in 0.5f64..10.0,
        g in 0.2f64..5.0,
    ) {
        let arrays = channel(lx, nx, ny, g);
        let mesh = build(&arrays);
        let connector = PeriodicConnector::default();
        let forward = connector.match_link(&mesh, 0, &arrays.periodic.links()[0]).unwrap();
        prop_assert_eq!(forward.pairs.len(), ny + 1);
        for &(a, b) in &forward.pairs {
            let (pa, pb) = (mesh.node(a).unwrap(), mesh.node(b).unwrap());
            let back = [pb[0] - lx, pb[1]];
            let d = ((back[0] - pa[0]).powi(2) + (back[1] - pa[1]).powi(2)).sqrt();
            prop_assert!(d <= forward.tolerance);
        }
        let reverse = PeriodicLink {
            source: "outlet".into(),
            destination: "inlet".into(),
            translation: vec![-lx, 0.0],
        };
        let backward = connector.match_link(&mesh, 0, &reverse).unwrap();
        let mut mirrored: Vec<_> = backward.pairs.iter().map(|&(a, b)| (b, a)).collect();
        mirrored.sort_unstable();
        prop_assert_eq!(forward.pairs, mirrored);
    }

    #[test]
    fn extrusion_adds_one_layer_per_stage(
        segments in prop::collection::vec(1usize..4, 1..4),
        length in 0.25f64..2.0,
    ) {
        let arrays = channel(2.0, 2, 1, 1.0);
        let k = segments.len();
        let lengths = vec![length; k];
        let gradings = vec![1.0; k];
        let solid = extrude(&arrays, &lengths, &segments, &gradings).unwrap();
        prop_assert_eq!(solid.topology.nb_blocks(), k * arrays.topology.nb_blocks());
        let mesh = build(&solid);
        prop_assert_eq!(distinct_levels(&mesh, 2), 1 + segments.iter().sum::<usize>());
        prop_assert_eq!(mesh.nb_nodes(), 3 * 2 * (1 + segments.iter().sum::<usize>()));
    }
}
