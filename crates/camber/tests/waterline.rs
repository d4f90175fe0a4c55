//! End-to-end waterline scenarios.

use camber::waterline::{push_cutter_fiber, Weave};
use camber::{Cutter, Fiber, MeshSurface, Point3, Triangle};

/// Equilateral triangle with side 10 in the XY plane.
fn equilateral() -> Triangle {
    Triangle::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(5.0, 5.0 * 3.0f64.sqrt(), 0.0),
    )
}

fn ball() -> Cutter {
    Cutter::Ball {
        diameter: 2.0,
        length: 20.0,
    }
}

fn x_fiber(y: f64, z: f64) -> Fiber {
    Fiber::new(Point3::new(-10.0, y, z), Point3::new(10.0, y, z)).unwrap()
}

fn y_fiber(x: f64, z: f64) -> Fiber {
    Fiber::new(Point3::new(x, -10.0, z), Point3::new(x, 10.0, z)).unwrap()
}

/// One triangle, a radius-1 ball cutter, three fibers per direction,
/// contact elevation Z = 0: one closed loop around the triangle
/// inflated by the cutter radius.
///
/// The twelve CL points are the chords of the r-offset triangle on the
/// six fibers, and those chord endpoints are analytically fixed (the
/// offset edge lines and the apex arc), so the loop length is the
/// closed polygon through them: 31.591. The exact offset boundary has
/// length 30 + 2*pi = 36.28; six fibers cut the three rounded corners
/// short, and denser sampling recovers the difference (see the
/// operation test below).
#[test]
fn triangle_waterline_loop() {
    let tri = equilateral();
    // contact at Z = 0: the fiber plane sits one full-radius height
    // below, so the ball equator meets the z = 0 triangle
    let z = 0.0 - ball().full_radius_height();

    let mut weave = Weave::new();
    for pos in [2.0, 5.0, 8.0] {
        let mut fx = x_fiber(pos, z);
        push_cutter_fiber(&ball(), &mut fx, [&tri]);
        assert_eq!(fx.intervals().len(), 1, "x fiber at {pos}");
        weave.add_fiber(fx);

        let mut fy = y_fiber(pos, z);
        push_cutter_fiber(&ball(), &mut fy, [&tri]);
        assert_eq!(fy.intervals().len(), 1, "y fiber at {pos}");
        weave.add_fiber(fy);
    }

    weave.build();
    weave.face_traverse().unwrap();

    let loops = weave.loops();
    assert_eq!(loops.len(), 1);
    let lp = &loops[0];
    assert_eq!(lp.len(), 12); // two CL endpoints per fiber

    let mut length = 0.0;
    for k in 0..lp.len() {
        length += (lp[(k + 1) % lp.len()] - lp[k]).norm();
    }
    assert!(
        (length - 31.591).abs() < 0.01,
        "loop length {length} departs from the chord-endpoint polygon"
    );

    // all CL points lie in the fiber plane, within a radius of the model
    for p in lp {
        assert_eq!(p.z, z);
        assert!(p.x >= -1.0 - 1e-9 && p.x <= 11.0 + 1e-9);
        assert!(p.y >= -1.0 - 1e-9 && p.y <= 9.7);
    }
}

/// The same scenario through the full waterline operation: fiber
/// generation, batched push, weave. Denser sampling approaches the
/// exact offset perimeter from below.
#[test]
fn triangle_waterline_operation() {
    let surface = MeshSurface::new(vec![equilateral()]);
    let mut wl = camber::Waterline::new(ball(), &surface);
    wl.set_z(0.0);
    wl.set_sampling(0.5);
    wl.run().unwrap();

    assert_eq!(wl.loops().len(), 1);
    let lp = &wl.loops()[0];
    let mut length = 0.0;
    for k in 0..lp.len() {
        length += (lp[(k + 1) % lp.len()] - lp[k]).norm();
    }
    let exact = 30.0 + 2.0 * std::f64::consts::PI;
    assert!(
        length > 35.5 && length < exact + 0.3,
        "loop length {length}"
    );
}

/// Loop filtering keeps the corner structure of a waterline loop.
#[test]
fn triangle_waterline_filtered() {
    let surface = MeshSurface::new(vec![equilateral()]);
    let mut wl = camber::Waterline::new(ball(), &surface);
    wl.set_z(0.0);
    wl.set_sampling(0.25);
    wl.run().unwrap();

    let lp = &wl.loops()[0];
    let filtered = camber::filter_loop(lp, 0.05);
    assert!(filtered.len() < lp.len());
    assert!(filtered.len() >= 6, "filtered down to {}", filtered.len());
}
