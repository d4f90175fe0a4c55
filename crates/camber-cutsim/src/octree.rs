//! Signed-distance octree for cut simulation.
//!
//! The tree tracks the union of every volume subtracted so far: each
//! node stores the signed distance at its eight corners, updated by
//! `f := min(f, vol.dist(corner))`, so `f <= 0` marks the claimed
//! region and the marching-cubes isosurface is its boundary. The root
//! is a cube of half-side `root_scale`; subdivision follows wherever a
//! subtracted volume straddles a node, down to `max_depth`.
//!
//! Nodes live in an arena addressed by [`NodeId`]; a parent owns its
//! `[NodeId; 8]` children exclusively, and a child's parent link is a
//! plain id, never an ownership edge.

use camber_geom::{Bbox, Point3, Vec3};
use tracing::debug;

use crate::gldata::{GlData, GlVertex};
use crate::marching_cubes;
use crate::volume::OctVolume;

/// Far-outside seed for corner distances.
const F_FAR: f64 = 1e6;

/// Corner directions of an octnode relative to its center: corner i is
/// at `center + scale * CORNER_DIRECTIONS[i]`. Corner 2 is the bbox
/// minimum, corner 4 the maximum. The same directions locate the
/// centers of the eight children.
pub const CORNER_DIRECTIONS: [[f64; 3]; 8] = [
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
];

/// Arena id of an octree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw arena index.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One octree node.
#[derive(Debug)]
pub struct Octnode {
    parent: Option<NodeId>,
    /// Which child of the parent this node is (0 for the root).
    idx: u8,
    scale: f64,
    depth: u32,
    center: Point3,
    vertices: [Point3; 8],
    f: [f64; 8],
    inside: bool,
    outside: bool,
    evaluated: bool,
    isosurface_valid: bool,
    children: Option<[NodeId; 8]>,
    /// GL vertices this node owns from its last marching-cubes pass.
    gl_verts: Vec<u32>,
    /// GL polygons this node emitted in its last marching-cubes pass.
    gl_polys: Vec<u32>,
    bbox: Bbox,
}

impl Octnode {
    fn new(parent: Option<NodeId>, idx: u8, center: Point3, scale: f64, depth: u32) -> Self {
        let vertices: [Point3; 8] =
            std::array::from_fn(|i| center + Vec3::from(CORNER_DIRECTIONS[i]) * scale);
        let mut bbox = Bbox::empty();
        bbox.add_point(&vertices[2]);
        bbox.add_point(&vertices[4]);
        Self {
            parent,
            idx,
            scale,
            depth,
            center,
            vertices,
            f: [F_FAR; 8],
            inside: false,
            outside: true,
            evaluated: false,
            isosurface_valid: false,
            children: None,
            gl_verts: Vec::new(),
            gl_polys: Vec::new(),
            bbox,
        }
    }

    /// Parent id, None for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child index within the parent.
    pub fn child_index(&self) -> u8 {
        self.idx
    }

    /// Half-side length of the node cube.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Depth in the tree, 0 for the root.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Node center.
    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Corner position i in the normative enumeration.
    pub fn corner(&self, i: usize) -> Point3 {
        self.vertices[i]
    }

    /// Signed distance stored at corner i.
    pub fn corner_value(&self, i: usize) -> f64 {
        self.f[i]
    }

    /// Node bounding box (`min` = corner 2, `max` = corner 4).
    pub fn bbox(&self) -> &Bbox {
        &self.bbox
    }

    /// True when the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// All corners claimed (`f <= 0`).
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// No corner claimed (`f > 0` everywhere).
    pub fn is_outside(&self) -> bool {
        self.outside
    }

    /// False when the stored distances changed since the last
    /// marching-cubes emission.
    pub fn isosurface_valid(&self) -> bool {
        self.isosurface_valid
    }

    /// Ids of the GL vertices this node currently owns.
    pub fn gl_vertices(&self) -> &[u32] {
        &self.gl_verts
    }

    /// Ids of the GL polygons this node emitted.
    pub fn gl_polygons(&self) -> &[u32] {
        &self.gl_polys
    }

    /// Rename a GL vertex id after a pool swap.
    pub fn swap_index(&mut self, old: u32, new: u32) {
        for v in &mut self.gl_verts {
            if *v == old {
                *v = new;
            }
        }
    }

    /// Rename a GL polygon id after a pool swap.
    pub fn swap_poly_index(&mut self, old: u32, new: u32) {
        for p in &mut self.gl_polys {
            if *p == old {
                *p = new;
            }
        }
    }

    /// Evaluate a volume at the eight corners, keeping the minimum
    /// distance per corner. Returns whether any corner is inside the
    /// volume and whether any is outside it.
    fn evaluate(&mut self, vol: &dyn OctVolume) -> (bool, bool) {
        let mut any_in = false;
        let mut any_out = false;
        for i in 0..8 {
            let d = vol.dist(&self.vertices[i]);
            if d <= 0.0 {
                any_in = true;
            } else {
                any_out = true;
            }
            if !self.evaluated || d < self.f[i] {
                self.f[i] = d;
                self.isosurface_valid = false;
            }
        }
        self.evaluated = true;
        self.inside = self.f.iter().all(|&v| v <= 0.0);
        self.outside = self.f.iter().all(|&v| v > 0.0);
        (any_in, any_out)
    }
}

/// The octree.
pub struct Octree {
    nodes: Vec<Octnode>,
    free: Vec<NodeId>,
    root: NodeId,
    root_scale: f64,
    max_depth: u32,
}

impl Octree {
    /// Create a tree whose root cube has half-side `root_scale` and is
    /// centered at `center`; refinement stops at `max_depth`.
    pub fn new(root_scale: f64, max_depth: u32, center: Point3) -> Self {
        let root = Octnode::new(None, 0, center, root_scale, 0);
        Self {
            nodes: vec![root],
            free: Vec::new(),
            root: NodeId(0),
            root_scale,
            max_depth,
        }
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The maximum refinement depth.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// The root half-side length.
    pub fn root_scale(&self) -> f64 {
        self.root_scale
    }

    /// Half-side of a node at `max_depth`, the tree resolution.
    pub fn leaf_scale(&self) -> f64 {
        self.root_scale / (1u64 << self.max_depth) as f64
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &Octnode {
        &self.nodes[id.index()]
    }

    /// Uniformly subdivide the tree `n` times.
    pub fn init(&mut self, n: u32) {
        for _ in 0..n {
            for id in self.leaf_nodes() {
                self.subdivide(id);
            }
        }
    }

    /// Create the eight children of a leaf.
    ///
    /// Subdividing a non-leaf is a programming error and aborts.
    pub fn subdivide(&mut self, id: NodeId) {
        assert!(
            self.nodes[id.index()].is_leaf(),
            "subdivide called on a non-leaf node"
        );
        let (center, scale, depth, inside, outside) = {
            let n = &self.nodes[id.index()];
            (n.center, n.scale, n.depth, n.inside, n.outside)
        };
        let children: [NodeId; 8] = std::array::from_fn(|i| {
            let child_center = center + Vec3::from(CORNER_DIRECTIONS[i]) * (0.5 * scale);
            let mut child = Octnode::new(Some(id), i as u8, child_center, scale * 0.5, depth + 1);
            child.inside = inside;
            child.outside = outside;
            self.alloc(child)
        });
        self.nodes[id.index()].children = Some(children);
    }

    fn alloc(&mut self, node: Octnode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(node);
                id
            }
        }
    }

    /// Ids of all leaves.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.nodes[id.index()].children {
            None => out.push(id),
            Some(children) => {
                for c in children {
                    self.collect_leaves(c, out);
                }
            }
        }
    }

    /// Ids of leaves whose isosurface needs regeneration.
    pub fn invalid_leaf_nodes(&self) -> Vec<NodeId> {
        self.leaf_nodes()
            .into_iter()
            .filter(|&id| !self.nodes[id.index()].isosurface_valid)
            .collect()
    }

    /// Subtract a volume from the stock.
    ///
    /// Traverses the tree under the volume's bbox, min-updating corner
    /// distances. Leaves straddled by the volume are subdivided until
    /// `max_depth`; hitting the depth cap just stops refining. Nodes
    /// fully outside the volume stop the descent, nodes fully inside
    /// it stay unsubdivided (their isosurface is empty).
    pub fn diff_negative(&mut self, vol: &dyn OctVolume) {
        self.diff_rec(self.root, vol);
        debug!(nodes = self.nodes.len() - self.free.len(), "diff_negative done");
    }

    fn diff_rec(&mut self, id: NodeId, vol: &dyn OctVolume) {
        if !vol.bbox().overlaps(self.nodes[id.index()].bbox()) {
            return;
        }
        let (any_in, any_out) = self.nodes[id.index()].evaluate(vol);
        if !any_in {
            // no corner inside the volume; trust the samples only once
            // the node is smaller than the volume's thinnest extent,
            // otherwise the volume could hide between the corners
            let vb = vol.bbox();
            let min_extent = (vb.max.x - vb.min.x)
                .min(vb.max.y - vb.min.y)
                .min(vb.max.z - vb.min.z);
            if 2.0 * self.nodes[id.index()].scale < min_extent {
                return;
            }
        }
        if let Some(children) = self.nodes[id.index()].children {
            for c in children {
                self.diff_rec(c, vol);
            }
            return;
        }
        if any_in && !any_out {
            // leaf fully inside the volume: uniformly claimed
            return;
        }
        if self.nodes[id.index()].depth < self.max_depth {
            self.subdivide(id);
            let children = self.nodes[id.index()].children.expect("children just created");
            for c in children {
                self.diff_rec(c, vol);
            }
        }
        // depth cap reached: refinement stops, not an error
    }

    /// Collapse uniform subtrees: a node whose children are all leaves
    /// and all inside (or all outside) deletes its children, retiring
    /// their GL vertices.
    pub fn collapse(&mut self, gl: &mut GlData) {
        self.collapse_rec(self.root, gl);
    }

    fn collapse_rec(&mut self, id: NodeId, gl: &mut GlData) {
        let Some(children) = self.nodes[id.index()].children else {
            return;
        };
        for c in children {
            self.collapse_rec(c, gl);
        }
        let uniform = children.iter().all(|&c| {
            let n = &self.nodes[c.index()];
            n.is_leaf() && n.is_inside()
        }) || children.iter().all(|&c| {
            let n = &self.nodes[c.index()];
            n.is_leaf() && n.is_outside()
        });
        if uniform {
            for c in children {
                self.retire_node(c, gl);
                self.free.push(c);
            }
            let node = &mut self.nodes[id.index()];
            node.children = None;
            node.isosurface_valid = false;
        }
    }

    /// Remove a node's isosurface from the pool: its polygons first,
    /// then every owned vertex that has no polygon left. An owned
    /// vertex still referenced by a neighbor's polygon is handed over
    /// to that polygon's node instead of being removed. All rename
    /// notifications are applied to the affected nodes.
    fn retire_node(&mut self, id: NodeId, gl: &mut GlData) {
        while let Some(pid) = self.nodes[id.index()].gl_polys.pop() {
            if let Some(ps) = gl.remove_polygon(pid) {
                self.nodes[ps.node.index()].swap_poly_index(ps.old, ps.new);
            }
        }
        while let Some(vid) = self.nodes[id.index()].gl_verts.pop() {
            if let Some(&pid) = gl.vertex_polygons(vid).first() {
                let new_owner = gl.polygon_node(pid);
                gl.rebind_vertex(vid, new_owner);
                self.nodes[new_owner.index()].gl_verts.push(vid);
            } else {
                let removal = gl.remove_vertex(vid);
                debug_assert!(removal.polygon_swaps.is_empty());
                if let Some(swap) = removal.swap {
                    self.nodes[swap.node.index()].swap_index(swap.old, swap.new);
                }
            }
        }
    }

    /// Regenerate the isosurface of every invalid leaf into the pool.
    ///
    /// Edge crossings shared between cells are welded through the
    /// pool, so a vertex emitted by one leaf is reused by its
    /// neighbors' triangles within and across passes.
    pub fn update_mesh(&mut self, gl: &mut GlData) {
        let invalid = self.invalid_leaf_nodes();
        let count = invalid.len();
        let mut emitted = 0usize;
        for id in invalid {
            self.retire_node(id, gl);
            let node = &self.nodes[id.index()];
            if !node.inside && !node.outside {
                let (verts, tris) = marching_cubes::triangulate(node);
                let ids: Vec<u32> = verts
                    .iter()
                    .map(|&(pos, normal)| {
                        let v = GlVertex {
                            pos: [pos.x as f32, pos.y as f32, pos.z as f32],
                            color: [0.5, 0.5, 0.5],
                            normal: [normal.x as f32, normal.y as f32, normal.z as f32],
                        };
                        let (vid, fresh) = gl.weld_vertex([pos.x, pos.y, pos.z], v, id);
                        if fresh {
                            self.nodes[id.index()].gl_verts.push(vid);
                            emitted += 1;
                        }
                        vid
                    })
                    .collect();
                for t in &tris {
                    let pid = gl.add_polygon(&[ids[t[0]], ids[t[1]], ids[t[2]]], id);
                    self.nodes[id.index()].gl_polys.push(pid);
                }
            }
            self.nodes[id.index()].isosurface_valid = true;
        }
        debug!(leaves = count, vertices = emitted, "isosurface updated");
    }
}
