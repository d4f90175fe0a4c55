#![warn(missing_docs)]

//! Waterline toolpath extraction.
//!
//! Given a triangulated surface and a cutter, compute the closed
//! cutter-location loops at a prescribed Z elevation:
//!
//! 1. generate X and Y fibers covering the model at the Z slice,
//! 2. push the cutter along every fiber, collecting gouge intervals
//!    (parallel over a shared read-only mesh index),
//! 3. weave the intervals into a planar graph and walk its faces.
//!
//! # Example
//!
//! ```no_run
//! use camber_cutter::Cutter;
//! use camber_geom::MeshSurface;
//! use camber_waterline::Waterline;
//!
//! let surface = MeshSurface::new(Vec::new());
//! let cutter = Cutter::Ball { diameter: 6.0, length: 20.0 };
//! let mut wl = Waterline::new(cutter, &surface);
//! wl.set_z(0.0);
//! wl.set_sampling(0.5);
//! wl.run().unwrap();
//! for lp in wl.loops() {
//!     println!("loop with {} CL points", lp.len());
//! }
//! ```

mod adaptive;
mod error;
mod filter;
mod pushcutter;
mod waterline;
mod weave;

pub use adaptive::AdaptiveWaterline;
pub use error::{Result, WaterlineError, WeaveError};
pub use filter::{filter_loop, filter_polyline};
pub use pushcutter::{batch_push_cutter, push_cutter_fiber, PushStats};
pub use waterline::{Waterline, WaterlineSettings};
pub use weave::{VertexKind, Weave};
