//! End-to-end cut-simulation scenarios.

use camber::{CapsuleVolume, GlData, Octree, Point3, SphereVolume};

/// Signed volume enclosed by the pool's triangles (divergence theorem
/// over vertex-origin tetrahedra).
fn enclosed_volume(gl: &GlData) -> f64 {
    let verts = gl.vertices();
    let mut six_vol = 0.0f64;
    for t in gl.indices().chunks(3) {
        let p = |i: usize| {
            let v = &verts[t[i] as usize];
            [v.pos[0] as f64, v.pos[1] as f64, v.pos[2] as f64]
        };
        let (a, b, c) = (p(0), p(1), p(2));
        six_vol += a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0]);
    }
    six_vol.abs() / 6.0
}

/// Subtract a unit sphere into an empty stock cube at depth 4: the
/// extracted surface must bound a volume close to 4*pi/3 and carry one
/// welded vertex per crossed cell edge.
#[test]
fn sphere_subtraction_volume() {
    let mut tree = Octree::new(1.0, 4, Point3::origin());
    let mut gl = GlData::new();

    tree.diff_negative(&SphereVolume::new(Point3::origin(), 1.0));
    tree.update_mesh(&mut gl);
    gl.assert_consistent();

    // welded emission: the 1160 straddling depth-4 leaves share their
    // edge crossings, about 1180 vertices in total
    assert!(
        (600..=1500).contains(&gl.vertex_count()),
        "vertex count {}",
        gl.vertex_count()
    );
    assert!(
        (2000..=2700).contains(&gl.polygon_count()),
        "polygon count {}",
        gl.polygon_count()
    );

    let vol = enclosed_volume(&gl);
    let target = 4.0 * std::f64::consts::PI / 3.0;
    approx::assert_relative_eq!(vol, target, max_relative = 0.1);
}

/// Repeated subtraction only regenerates the invalidated region and
/// the pool stays consistent throughout.
#[test]
fn incremental_subtraction_consistency() {
    let mut tree = Octree::new(10.0, 5, Point3::origin());
    let mut gl = GlData::new();

    tree.diff_negative(&SphereVolume::new(Point3::new(0.0, 0.0, 5.0), 4.0));
    tree.update_mesh(&mut gl);
    gl.assert_consistent();
    let after_first = gl.vertex_count();
    assert!(after_first > 0);

    // a ball-cutter pass through the carved region
    for k in 0..5 {
        let x = -6.0 + 3.0 * k as f64;
        let mv = CapsuleVolume::ball_move(
            1.0,
            Point3::new(x, 0.0, 2.0),
            Point3::new(x + 3.0, 0.0, 2.0),
        );
        tree.diff_negative(&mv);
        tree.update_mesh(&mut gl);
        gl.assert_consistent();
    }
    assert!(tree.invalid_leaf_nodes().is_empty());

    // every emitted vertex still belongs to the node that lists it,
    // and the node ownership lists partition the live vertices
    let mut seen = vec![false; gl.vertex_count()];
    for id in tree.leaf_nodes() {
        for &v in tree.node(id).gl_vertices() {
            assert_eq!(gl.vertex_node(v), id);
            assert!(!seen[v as usize], "vertex {v} owned twice");
            seen[v as usize] = true;
        }
    }
    assert!(seen.iter().all(|&s| s), "orphaned vertex outside any node");
}

/// Collapsing a fully swallowed region retires its geometry.
#[test]
fn collapse_after_engulfing_subtraction() {
    let mut tree = Octree::new(2.0, 3, Point3::origin());
    let mut gl = GlData::new();

    tree.diff_negative(&SphereVolume::new(Point3::origin(), 1.0));
    tree.update_mesh(&mut gl);
    assert!(gl.vertex_count() > 0);

    // now swallow the whole stock
    tree.diff_negative(&SphereVolume::new(Point3::origin(), 100.0));
    tree.update_mesh(&mut gl);
    gl.assert_consistent();
    assert_eq!(gl.vertex_count(), 0, "engulfed stock still has triangles");

    tree.collapse(&mut gl);
    assert!(tree.node(tree.root()).is_leaf());
    gl.assert_consistent();
}
