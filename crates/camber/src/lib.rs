#![warn(missing_docs)]

//! camber — CAM geometry kernel.
//!
//! Given a triangulated solid and a rotationally symmetric milling
//! cutter, camber computes cutter-location paths:
//!
//! - **waterline loops** at a prescribed Z elevation, via a push-cutter
//!   fiber sweep and a planar weave graph, and
//! - **cut-simulation** state via an adaptively refined signed-distance
//!   octree with incremental marching-cubes isosurface extraction.
//!
//! # Example
//!
//! ```no_run
//! use camber::{Cutter, MeshSurface, Point3, Triangle, Waterline};
//!
//! let surface = MeshSurface::new(vec![Triangle::new(
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(10.0, 0.0, 0.0),
//!     Point3::new(5.0, 8.0, 0.0),
//! )]);
//! let cutter = Cutter::Ball { diameter: 2.0, length: 20.0 };
//! let mut wl = Waterline::new(cutter, &surface);
//! wl.set_z(0.0);
//! wl.set_sampling(0.5);
//! wl.run().unwrap();
//! ```

pub use camber_cutsim as cutsim;
pub use camber_cutter as cutter;
pub use camber_geom as geom;
pub use camber_waterline as waterline;

pub use camber_cutter::{CcPoint, CcType, ClPoint, Cutter, Fiber, FiberDir, Interval};
pub use camber_cutsim::{
    CapsuleVolume, CubeVolume, GlData, GlVertex, NodeId, OctVolume, Octree, SphereVolume,
};
pub use camber_geom::{Bbox, MeshSurface, Point3, Tolerance, Triangle, Vec3};
pub use camber_waterline::{
    batch_push_cutter, filter_loop, filter_polyline, AdaptiveWaterline, Waterline,
    WaterlineError, Weave,
};
