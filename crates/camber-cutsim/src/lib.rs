#![warn(missing_docs)]

//! Octree-based cut simulation.
//!
//! Stock material is tracked as a signed-distance octree; tool-swept
//! volumes are subtracted incrementally, and a marching-cubes pass
//! regenerates the isosurface triangles of invalidated leaves into an
//! indexed vertex/polygon pool whose ids stay dense under deletion.
//! Edge crossings shared between cells are welded in the pool, so the
//! isosurface carries one vertex per crossing.
//!
//! # Example
//!
//! ```
//! use camber_cutsim::{CapsuleVolume, GlData, Octree, SphereVolume};
//! use camber_geom::Point3;
//!
//! let mut tree = Octree::new(10.0, 5, Point3::origin());
//! let mut gl = GlData::new();
//!
//! // carve a sphere, then a ball-cutter move
//! tree.diff_negative(&SphereVolume::new(Point3::new(0.0, 0.0, 5.0), 3.0));
//! tree.diff_negative(&CapsuleVolume::ball_move(
//!     1.5,
//!     Point3::new(-5.0, 0.0, 4.0),
//!     Point3::new(5.0, 0.0, 4.0),
//! ));
//! tree.update_mesh(&mut gl);
//!
//! // gl.vertices() / gl.indices() are ready for upload
//! assert!(gl.vertex_count() > 0);
//! ```

mod gldata;
mod marching_cubes;
mod octree;
mod tables;
mod volume;

pub use gldata::{GlData, GlVertex, PolySwap, VertexRemoval, VertexSwap};
pub use octree::{NodeId, Octnode, Octree, CORNER_DIRECTIONS};
pub use volume::{CapsuleVolume, CubeVolume, OctVolume, SphereVolume};
