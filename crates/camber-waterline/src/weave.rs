//! Weave planar graph and face traversal.
//!
//! The weave is the planar graph formed by the union of X-fiber and
//! Y-fiber intervals at one Z slice. Interval endpoints become CL
//! vertices, interval crossings become INT vertices, and every interval
//! contributes a chain of edges between its endpoints. Walking the
//! faces of this graph from the CL vertices yields the waterline loops.
//!
//! All vertices and edges live in flat arenas addressed by integer ids;
//! a directed edge is a `(vertex, compass-direction)` pair and its twin
//! is the opposite slot of its head. Edges along X intervals occupy the
//! east/west slots, edges along Y intervals north/south.

use std::collections::HashMap;

use camber_cutter::{Fiber, FiberDir};
use camber_geom::Point3;

use crate::error::WeaveError;

/// Positional snap for merging coincident vertices (mm).
const SNAP: f64 = 1e-7;

/// Vertex classification in the weave graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// Interval endpoint producing a machined point.
    Cl,
    /// Coincident CL endpoints of an X and a Y fiber, merged.
    TwinCl,
    /// Internal interval endpoint; routes edges, not machined.
    Adj,
    /// Interior crossing of an X and a Y interval.
    Int,
}

/// Compass slots of the planar embedding, in counter-clockwise order.
const EAST: usize = 0;
const NORTH: usize = 1;
const WEST: usize = 2;
const SOUTH: usize = 3;

fn opposite(dir: usize) -> usize {
    (dir + 2) % 4
}

#[derive(Debug)]
struct WeaveVertex {
    pos: Point3,
    kind: VertexKind,
    /// Bit 0: reached by an X fiber, bit 1: by a Y fiber.
    axes: u8,
}

/// A directed edge: target vertex plus the owning fiber interval.
#[derive(Debug, Clone, Copy)]
struct EdgeTarget {
    to: u32,
    /// Owning fiber: index into the weave's fiber list (X then Y).
    fiber: u32,
    /// Owning interval within that fiber.
    interval: u32,
}

/// One interval's vertex chain, ordered along the fiber axis.
struct Chain {
    fiber: u32,
    interval: u32,
    dir: FiberDir,
    /// Along-axis span of the owning interval.
    lo: f64,
    hi: f64,
    /// (along-axis coordinate, vertex id)
    verts: Vec<(f64, u32)>,
}

/// The weave graph.
pub struct Weave {
    x_fibers: Vec<Fiber>,
    y_fibers: Vec<Fiber>,
    verts: Vec<WeaveVertex>,
    adj: Vec<[Option<EdgeTarget>; 4]>,
    vert_at: HashMap<(i64, i64), u32>,
    /// CL vertices in creation order; seeds for face traversal.
    cl_verts: Vec<u32>,
    visited: Vec<[bool; 4]>,
    loops: Vec<Vec<Point3>>,
    built: bool,
}

impl Weave {
    /// An empty weave.
    pub fn new() -> Self {
        Self {
            x_fibers: Vec::new(),
            y_fibers: Vec::new(),
            verts: Vec::new(),
            adj: Vec::new(),
            vert_at: HashMap::new(),
            cl_verts: Vec::new(),
            visited: Vec::new(),
            loops: Vec::new(),
            built: false,
        }
    }

    /// Add a push-cut fiber to the weave, taking ownership.
    ///
    /// Fibers without intervals contribute nothing and are dropped.
    pub fn add_fiber(&mut self, fiber: Fiber) {
        if fiber.intervals().is_empty() {
            return;
        }
        match fiber.dir() {
            FiberDir::X => self.x_fibers.push(fiber),
            FiberDir::Y => self.y_fibers.push(fiber),
        }
    }

    /// Number of vertices of a given kind.
    pub fn vertex_count(&self, kind: VertexKind) -> usize {
        self.verts.iter().filter(|v| v.kind == kind).count()
    }

    /// Total number of directed edges in the graph.
    pub fn directed_edge_count(&self) -> usize {
        self.adj
            .iter()
            .map(|slots| slots.iter().flatten().count())
            .sum()
    }

    /// Directed edges not consumed by any loop after `face_traverse`.
    pub fn unvisited_edge_count(&self) -> usize {
        self.adj
            .iter()
            .zip(&self.visited)
            .map(|(slots, vis)| {
                slots
                    .iter()
                    .zip(vis)
                    .filter(|(s, &v)| s.is_some() && !v)
                    .count()
            })
            .sum()
    }

    /// The owning fiber and interval of the edge between two vertices,
    /// if present. Fiber indices count the X fibers first, then the Y
    /// fibers.
    pub fn edge_interval(&self, from: u32, to: u32) -> Option<(u32, u32)> {
        self.adj[from as usize]
            .iter()
            .flatten()
            .find(|e| e.to == to)
            .map(|e| (e.fiber, e.interval))
    }

    /// The loops found by `face_traverse`.
    pub fn loops(&self) -> &[Vec<Point3>] {
        &self.loops
    }

    /// Move the loops out of the weave.
    pub fn take_loops(&mut self) -> Vec<Vec<Point3>> {
        std::mem::take(&mut self.loops)
    }

    fn key(x: f64, y: f64) -> (i64, i64) {
        ((x / SNAP).round() as i64, (y / SNAP).round() as i64)
    }

    fn axis_bit(dir: FiberDir) -> u8 {
        match dir {
            FiberDir::X => 1,
            FiberDir::Y => 2,
        }
    }

    /// Insert or merge a CL vertex at an interval endpoint.
    ///
    /// A second registration from the perpendicular axis upgrades a CL
    /// vertex to TWIN_CL; one from the same axis (touching intervals on
    /// one fiber) makes the endpoint internal, ADJ.
    fn add_cl_vertex(&mut self, pos: Point3, dir: FiberDir) -> u32 {
        let key = Self::key(pos.x, pos.y);
        if let Some(id) = self.vert_at.get(&key).copied() {
            let bit = Self::axis_bit(dir);
            let v = &mut self.verts[id as usize];
            match v.kind {
                VertexKind::Cl | VertexKind::TwinCl => {
                    if v.axes & bit != 0 {
                        v.kind = VertexKind::Adj;
                    } else {
                        v.kind = VertexKind::TwinCl;
                    }
                }
                VertexKind::Adj | VertexKind::Int => {}
            }
            v.axes |= bit;
            return id;
        }
        let id = self.push_vertex(pos, VertexKind::Cl, Self::axis_bit(dir));
        self.cl_verts.push(id);
        id
    }

    fn push_vertex(&mut self, pos: Point3, kind: VertexKind, axes: u8) -> u32 {
        let id = self.verts.len() as u32;
        self.verts.push(WeaveVertex { pos, kind, axes });
        self.adj.push([None; 4]);
        self.vert_at.insert(Self::key(pos.x, pos.y), id);
        id
    }

    /// Build the graph from the collected fibers.
    ///
    /// Phase A creates CL vertices at interval endpoints and INT
    /// vertices at crossings; phase B links each interval's vertices,
    /// sorted along the fiber, into edge chains.
    pub fn build(&mut self) {
        assert!(!self.built, "weave already built");
        self.built = true;

        // Phase A1: CL vertices at every interval endpoint.
        let mut chains: Vec<Chain> = Vec::new();
        let mut x_fibers = std::mem::take(&mut self.x_fibers);
        let mut y_fibers = std::mem::take(&mut self.y_fibers);
        let nx = x_fibers.len();
        for (fi, fiber, dir) in x_fibers
            .iter_mut()
            .enumerate()
            .map(|(i, f)| (i, f, FiberDir::X))
            .chain(
                y_fibers
                    .iter_mut()
                    .enumerate()
                    .map(|(i, f)| (i + nx, f, FiberDir::Y)),
            )
        {
            let (p1, p2) = (fiber.p1, fiber.p2);
            for (ii, interval) in fiber.intervals_mut().iter_mut().enumerate() {
                let p_lo = p1 + (p2 - p1) * interval.lower;
                let p_hi = p1 + (p2 - p1) * interval.upper;
                let v_lo = self.add_cl_vertex(p_lo, dir);
                interval.in_weave_lower = true;
                let v_hi = self.add_cl_vertex(p_hi, dir);
                interval.in_weave_upper = true;

                let along = |p: &Point3| match dir {
                    FiberDir::X => p.x,
                    FiberDir::Y => p.y,
                };
                let (a_lo, a_hi) = (along(&p_lo), along(&p_hi));
                let mut verts = vec![(a_lo, v_lo)];
                if v_hi != v_lo {
                    verts.push((a_hi, v_hi));
                }
                chains.push(Chain {
                    fiber: fi as u32,
                    interval: ii as u32,
                    dir,
                    lo: a_lo.min(a_hi),
                    hi: a_lo.max(a_hi),
                    verts,
                });
            }
        }
        self.x_fibers = x_fibers;
        self.y_fibers = y_fibers;

        // Phase A2: INT vertices at interior crossings. Chains are laid
        // out X fibers first, so x-chains precede y-chains.
        let x_chain_count = chains
            .iter()
            .filter(|c| c.dir == FiberDir::X)
            .count();
        let (x_chains, y_chains) = chains.split_at_mut(x_chain_count);
        for xc in x_chains.iter_mut() {
            let yp = self.x_fibers[xc.fiber as usize].perp_pos();
            let z = self.x_fibers[xc.fiber as usize].z();
            for yc in y_chains.iter_mut() {
                let xq = self.y_fibers[(yc.fiber as usize) - nx].perp_pos();
                if xq < xc.lo - SNAP || xq > xc.hi + SNAP || yp < yc.lo - SNAP || yp > yc.hi + SNAP
                {
                    continue;
                }
                let key = Self::key(xq, yp);
                let id = match self.vert_at.get(&key).copied() {
                    Some(id) => {
                        // crossing lands on an existing endpoint; a CL
                        // endpoint inside the perpendicular interval is
                        // internal, hence ADJ
                        let v = &mut self.verts[id as usize];
                        if v.kind == VertexKind::Cl {
                            v.kind = VertexKind::Adj;
                        }
                        id
                    }
                    None => self.push_vertex(Point3::new(xq, yp, z), VertexKind::Int, 3),
                };
                add_chain_vertex(xc, xq, id);
                add_chain_vertex(yc, yp, id);
            }
        }

        // Phase B: sort each chain and insert the edge pairs.
        for chain in &mut chains {
            chain
                .verts
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            chain.verts.dedup_by_key(|v| v.1);
            let (fwd, rev) = match chain.dir {
                FiberDir::X => (EAST, WEST),
                FiberDir::Y => (NORTH, SOUTH),
            };
            for w in 0..chain.verts.len().saturating_sub(1) {
                let (_, a) = chain.verts[w];
                let (_, b) = chain.verts[w + 1];
                self.insert_edge(a, fwd, b, chain.fiber, chain.interval);
                self.insert_edge(b, rev, a, chain.fiber, chain.interval);
            }
        }

        self.visited = vec![[false; 4]; self.verts.len()];
    }

    fn insert_edge(&mut self, from: u32, dir: usize, to: u32, fiber: u32, interval: u32) {
        let slot = &mut self.adj[from as usize][dir];
        assert!(
            slot.map_or(true, |e| e.to == to),
            "conflicting edge slot at vertex {from} dir {dir}"
        );
        *slot = Some(EdgeTarget { to, fiber, interval });
    }

    /// Walk the faces of the graph from the CL vertices and emit loops.
    ///
    /// From each unvisited directed edge out of a CL vertex the walk
    /// repeatedly takes the next outgoing edge counter-clockwise from
    /// the reversed incoming edge; at a degree-4 INT vertex this is the
    /// X-to-Y axis alternation, at a pendant CL vertex it bounces back.
    /// CL and TWIN_CL positions are collected, ADJ and INT are routing
    /// vertices only.
    pub fn face_traverse(&mut self) -> Result<(), WeaveError> {
        let budget = self.directed_edge_count();
        for seed_idx in 0..self.cl_verts.len() {
            let v0 = self.cl_verts[seed_idx];
            if !matches!(
                self.verts[v0 as usize].kind,
                VertexKind::Cl | VertexKind::TwinCl
            ) {
                continue;
            }
            for d0 in 0..4 {
                if self.adj[v0 as usize][d0].is_none() || self.visited[v0 as usize][d0] {
                    continue;
                }
                let mut pts = Vec::new();
                let (mut v, mut d) = (v0, d0);
                let mut steps = 0usize;
                loop {
                    if self.visited[v as usize][d] {
                        return Err(WeaveError::EdgeRevisited { vertex: v });
                    }
                    self.visited[v as usize][d] = true;
                    steps += 1;
                    if steps > budget {
                        return Err(WeaveError::OpenLoop { steps });
                    }
                    let w = self.adj[v as usize][d].expect("walk on missing edge").to;
                    let wv = &self.verts[w as usize];
                    if matches!(wv.kind, VertexKind::Cl | VertexKind::TwinCl) {
                        pts.push(wv.pos);
                    }
                    let rev = opposite(d);
                    let mut next = rev;
                    for k in 1..=4 {
                        let cand = (rev + k) % 4;
                        if self.adj[w as usize][cand].is_some() {
                            next = cand;
                            break;
                        }
                    }
                    v = w;
                    d = next;
                    if v == v0 && d == d0 {
                        break;
                    }
                }
                if !pts.is_empty() {
                    self.loops.push(pts);
                }
            }
        }
        Ok(())
    }
}

impl Default for Weave {
    fn default() -> Self {
        Self::new()
    }
}

fn add_chain_vertex(chain: &mut Chain, coord: f64, id: u32) {
    if !chain.verts.iter().any(|&(_, v)| v == id) {
        chain.verts.push((coord, id));
    }
}
