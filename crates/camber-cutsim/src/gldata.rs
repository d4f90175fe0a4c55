//! Indexed vertex/polygon pool for the cut-simulation isosurface.
//!
//! Vertices and polygons are addressed by dense integer ids. Deletion
//! is swap-with-last-then-shrink on both arrays, so ids stay dense and
//! uploads stay flat; every swap renames an id, and the rename is
//! propagated to the polygons that reference the moved vertex and, via
//! the returned notifications, to the octree node that owns it.
//!
//! Isosurface vertices shared between cells are welded: `weld_vertex`
//! reuses an existing vertex at the same (snapped) position, so a cell
//! corner crossing emitted by one octree node is referenced by the
//! triangles of its neighbors. Each vertex still has exactly one
//! owning node; each polygon records its emitting node so retirement
//! can remove a node's triangles without touching its neighbors'.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::octree::NodeId;

/// Positional snap for welding shared isosurface vertices (mm).
const WELD_SNAP: f64 = 1e-6;

fn weld_key(pos: &[f64; 3]) -> (i64, i64, i64) {
    (
        (pos[0] / WELD_SNAP).round() as i64,
        (pos[1] / WELD_SNAP).round() as i64,
        (pos[2] / WELD_SNAP).round() as i64,
    )
}

/// One isosurface vertex: position, color, normal, all `f32` for
/// direct upload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlVertex {
    /// Position.
    pub pos: [f32; 3],
    /// RGB color.
    pub color: [f32; 3],
    /// Unit normal.
    pub normal: [f32; 3],
}

/// Bookkeeping attached to each vertex: the octree node that owns it,
/// the polygons that reference it, and its weld key if it was emitted
/// through `weld_vertex`.
#[derive(Debug, Clone)]
struct VertexData {
    node: NodeId,
    polygons: Vec<u32>,
    key: Option<(i64, i64, i64)>,
}

/// Rename notification from a swap-and-pop vertex removal: the vertex
/// that was at `old` now has id `new`, and `node` owns it.
#[derive(Debug, Clone, Copy)]
pub struct VertexSwap {
    /// Owner of the moved vertex.
    pub node: NodeId,
    /// Previous id of the moved vertex.
    pub old: u32,
    /// New id of the moved vertex.
    pub new: u32,
}

/// Rename notification from a swap-and-pop polygon removal.
#[derive(Debug, Clone, Copy)]
pub struct PolySwap {
    /// Emitting node of the moved polygon.
    pub node: NodeId,
    /// Previous id of the moved polygon.
    pub old: u32,
    /// New id of the moved polygon.
    pub new: u32,
}

/// Everything a vertex removal renamed: the vertex moved into the
/// hole, plus any polygons renamed while removing the vertex's
/// incident polygons.
#[derive(Debug, Clone, Default)]
pub struct VertexRemoval {
    /// The vertex rename, None when the removed vertex was last.
    pub swap: Option<VertexSwap>,
    /// Polygon renames from the incident-polygon cascade.
    pub polygon_swaps: Vec<PolySwap>,
}

/// The indexed pool.
#[derive(Debug)]
pub struct GlData {
    vertex_array: Vec<GlVertex>,
    vertex_data: Vec<VertexData>,
    index_array: Vec<u32>,
    /// Emitting node of each polygon.
    poly_data: Vec<NodeId>,
    /// Snapped position to vertex id, for cross-cell welding.
    weld: HashMap<(i64, i64, i64), u32>,
    poly_verts: usize,
}

impl GlData {
    /// A pool of triangles.
    pub fn new() -> Self {
        Self::with_poly_verts(3)
    }

    /// A pool of polygons with `poly_verts` vertices each (3 for
    /// triangles, 4 for quads).
    pub fn with_poly_verts(poly_verts: usize) -> Self {
        assert!(poly_verts >= 3, "polygons need at least 3 vertices");
        Self {
            vertex_array: Vec::new(),
            vertex_data: Vec::new(),
            index_array: Vec::new(),
            poly_data: Vec::new(),
            weld: HashMap::new(),
            poly_verts,
        }
    }

    /// Vertices per polygon.
    pub fn poly_verts(&self) -> usize {
        self.poly_verts
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_array.len()
    }

    /// Number of live polygons.
    pub fn polygon_count(&self) -> usize {
        self.index_array.len() / self.poly_verts
    }

    /// The flat vertex array, for upload. Consumers must not mutate.
    pub fn vertices(&self) -> &[GlVertex] {
        &self.vertex_array
    }

    /// The flat index array grouped by `poly_verts`, for upload.
    pub fn indices(&self) -> &[u32] {
        &self.index_array
    }

    /// The octree node that owns a vertex.
    pub fn vertex_node(&self, id: u32) -> NodeId {
        self.vertex_data[id as usize].node
    }

    /// The polygons a vertex participates in.
    pub fn vertex_polygons(&self, id: u32) -> &[u32] {
        &self.vertex_data[id as usize].polygons
    }

    /// The node that emitted a polygon.
    pub fn polygon_node(&self, pid: u32) -> NodeId {
        self.poly_data[pid as usize]
    }

    /// Hand a vertex over to a new owning node. Used when the previous
    /// owner retires while neighbors still reference the vertex.
    pub fn rebind_vertex(&mut self, id: u32, node: NodeId) {
        self.vertex_data[id as usize].node = node;
    }

    /// Append a vertex owned by `node`; returns its id.
    pub fn add_vertex(&mut self, v: GlVertex, node: NodeId) -> u32 {
        let id = self.vertex_array.len() as u32;
        self.vertex_array.push(v);
        self.vertex_data.push(VertexData {
            node,
            polygons: Vec::new(),
            key: None,
        });
        id
    }

    /// Add a vertex at a position, reusing an existing vertex welded
    /// at the same snapped position. Returns the id and whether a new
    /// vertex was created (a reused vertex keeps its original owner).
    pub fn weld_vertex(&mut self, pos: [f64; 3], v: GlVertex, node: NodeId) -> (u32, bool) {
        let key = weld_key(&pos);
        if let Some(&id) = self.weld.get(&key) {
            return (id, false);
        }
        let id = self.add_vertex(v, node);
        self.vertex_data[id as usize].key = Some(key);
        self.weld.insert(key, id);
        (id, true)
    }

    /// Append a polygon over existing vertex ids, emitted by `node`;
    /// returns its id.
    pub fn add_polygon(&mut self, verts: &[u32], node: NodeId) -> u32 {
        assert_eq!(verts.len(), self.poly_verts, "polygon arity mismatch");
        let pid = (self.index_array.len() / self.poly_verts) as u32;
        for &v in verts {
            assert!(
                (v as usize) < self.vertex_array.len(),
                "polygon references dead vertex"
            );
            self.index_array.push(v);
            self.vertex_data[v as usize].polygons.push(pid);
        }
        self.poly_data.push(node);
        pid
    }

    /// Remove a polygon by swap-and-pop on the index array.
    ///
    /// The last polygon group is moved into the hole and re-registered
    /// with its vertices under its new id; when the removed polygon is
    /// the last one, the array just shrinks. Returns the rename of the
    /// moved polygon, which the caller forwards to its emitting node.
    pub fn remove_polygon(&mut self, pid: u32) -> Option<PolySwap> {
        let pv = self.poly_verts;
        let idx = pid as usize * pv;
        assert!(idx + pv <= self.index_array.len(), "polygon id out of range");

        // deregister from its vertices
        for m in 0..pv {
            let v = self.index_array[idx + m] as usize;
            let polys = &mut self.vertex_data[v].polygons;
            if let Some(pos) = polys.iter().position(|&p| p == pid) {
                polys.remove(pos);
            }
        }

        let last_start = self.index_array.len() - pv;
        let last_pid = (last_start / pv) as u32;
        let swap = if idx != last_start {
            // move the last group into the hole and renumber it
            for m in 0..pv {
                self.index_array[idx + m] = self.index_array[last_start + m];
            }
            for m in 0..pv {
                let v = self.index_array[idx + m] as usize;
                let polys = &mut self.vertex_data[v].polygons;
                if let Some(pos) = polys.iter().position(|&p| p == last_pid) {
                    polys[pos] = pid;
                }
            }
            self.poly_data[pid as usize] = self.poly_data[last_pid as usize];
            Some(PolySwap {
                node: self.poly_data[pid as usize],
                old: last_pid,
                new: pid,
            })
        } else {
            None
        };
        self.index_array.truncate(last_start);
        self.poly_data.truncate(last_pid as usize);
        swap
    }

    /// Remove a vertex: delete every polygon incident to it, then
    /// swap-and-pop the vertex arrays.
    ///
    /// Returns every rename the removal caused; the caller forwards
    /// the vertex rename to the moved vertex's owning octree node
    /// (`Octnode::swap_index`) and the polygon renames to their
    /// emitting nodes.
    pub fn remove_vertex(&mut self, id: u32) -> VertexRemoval {
        let idx = id as usize;
        assert!(idx < self.vertex_array.len(), "vertex id out of range");

        // removing a polygon renumbers others; drain until empty
        let mut polygon_swaps = Vec::new();
        while let Some(&pid) = self.vertex_data[idx].polygons.last() {
            if let Some(ps) = self.remove_polygon(pid) {
                polygon_swaps.push(ps);
            }
        }

        // drop the removed vertex's weld entry
        if let Some(key) = self.vertex_data[idx].key {
            if self.weld.get(&key) == Some(&id) {
                self.weld.remove(&key);
            }
        }

        let last = self.vertex_array.len() - 1;
        let swap = if idx != last {
            self.vertex_array[idx] = self.vertex_array[last];
            self.vertex_data[idx] = self.vertex_data[last].clone();
            // the moved vertex keeps its weld key under its new id
            if let Some(key) = self.vertex_data[idx].key {
                self.weld.insert(key, id);
            }
            // renumber the moved vertex inside its polygons
            let polygons = self.vertex_data[idx].polygons.clone();
            for pid in polygons {
                let start = pid as usize * self.poly_verts;
                for m in 0..self.poly_verts {
                    if self.index_array[start + m] == last as u32 {
                        self.index_array[start + m] = id;
                    }
                }
            }
            Some(VertexSwap {
                node: self.vertex_data[idx].node,
                old: last as u32,
                new: id,
            })
        } else {
            None
        };
        self.vertex_array.truncate(last);
        self.vertex_data.truncate(last);
        debug_assert_eq!(self.vertex_array.len(), self.vertex_data.len());
        VertexRemoval {
            swap,
            polygon_swaps,
        }
    }

    /// Check every pool invariant; panics with a diagnostic on
    /// violation. Used by tests after each mutation batch.
    pub fn assert_consistent(&self) {
        assert_eq!(
            self.vertex_array.len(),
            self.vertex_data.len(),
            "vertex arrays out of sync"
        );
        assert_eq!(
            self.index_array.len() % self.poly_verts,
            0,
            "index array not a multiple of poly_verts"
        );
        let n_polys = self.polygon_count();
        assert_eq!(self.poly_data.len(), n_polys, "polygon owners out of sync");
        // every index references a live vertex and is registered there
        for (k, &v) in self.index_array.iter().enumerate() {
            let pid = (k / self.poly_verts) as u32;
            assert!((v as usize) < self.vertex_array.len(), "dangling index");
            assert!(
                self.vertex_data[v as usize].polygons.contains(&pid),
                "vertex {v} missing back-reference to polygon {pid}"
            );
        }
        // every registered polygon exists and references the vertex
        for (v, data) in self.vertex_data.iter().enumerate() {
            for &pid in &data.polygons {
                assert!(
                    (pid as usize) < n_polys,
                    "vertex {v} registered to dead polygon {pid}"
                );
                let start = pid as usize * self.poly_verts;
                assert!(
                    self.index_array[start..start + self.poly_verts]
                        .contains(&(v as u32)),
                    "polygon {pid} does not reference vertex {v}"
                );
            }
        }
        // the weld map and the keyed vertices are in bijection
        for (key, &id) in &self.weld {
            assert!(
                (id as usize) < self.vertex_array.len(),
                "weld entry to dead vertex {id}"
            );
            assert_eq!(
                self.vertex_data[id as usize].key,
                Some(*key),
                "weld entry key mismatch at vertex {id}"
            );
        }
        for (v, data) in self.vertex_data.iter().enumerate() {
            if let Some(key) = data.key {
                assert_eq!(
                    self.weld.get(&key),
                    Some(&(v as u32)),
                    "keyed vertex {v} missing from the weld map"
                );
            }
        }
    }
}

impl Default for GlData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vert(x: f32) -> GlVertex {
        GlVertex {
            pos: [x, 0.0, 0.0],
            color: [0.5, 0.5, 0.5],
            normal: [0.0, 0.0, 1.0],
        }
    }

    fn node(i: u32) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn test_add_vertex_and_polygon() {
        let mut g = GlData::new();
        let a = g.add_vertex(vert(0.0), node(0));
        let b = g.add_vertex(vert(1.0), node(0));
        let c = g.add_vertex(vert(2.0), node(0));
        let p = g.add_polygon(&[a, b, c], node(0));
        assert_eq!(p, 0);
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.polygon_count(), 1);
        assert_eq!(g.vertex_polygons(a), &[0]);
        assert_eq!(g.polygon_node(p), node(0));
        g.assert_consistent();
    }

    #[test]
    fn test_weld_vertex_reuses_position() {
        let mut g = GlData::new();
        let (a, fresh_a) = g.weld_vertex([1.0, 2.0, 3.0], vert(1.0), node(0));
        let (b, fresh_b) = g.weld_vertex([1.0, 2.0, 3.0], vert(1.0), node(5));
        assert!(fresh_a);
        assert!(!fresh_b);
        assert_eq!(a, b);
        // a reused vertex keeps its original owner
        assert_eq!(g.vertex_node(b), node(0));
        assert_eq!(g.vertex_count(), 1);

        let (c, fresh_c) = g.weld_vertex([1.0, 2.0, 4.0], vert(2.0), node(5));
        assert!(fresh_c);
        assert_ne!(a, c);
        g.assert_consistent();

        // removal frees the position for a new weld
        g.remove_vertex(a);
        let (d, fresh_d) = g.weld_vertex([1.0, 2.0, 3.0], vert(1.0), node(7));
        assert!(fresh_d);
        assert_eq!(g.vertex_node(d), node(7));
        g.assert_consistent();
    }

    #[test]
    fn test_remove_vertex_cascades_to_polygons() {
        // scenario: three vertices, one triangle, remove the middle one
        let mut g = GlData::new();
        let v0 = g.add_vertex(vert(0.0), node(0));
        let v1 = g.add_vertex(vert(1.0), node(0));
        let v2 = g.add_vertex(vert(2.0), node(0));
        g.add_polygon(&[v0, v1, v2], node(0));

        g.remove_vertex(v1);
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.polygon_count(), 0);
        assert!(g.indices().is_empty());
        assert!(g.vertex_polygons(0).is_empty());
        g.assert_consistent();
    }

    #[test]
    fn test_remove_vertex_swap_renames() {
        let mut g = GlData::new();
        let v0 = g.add_vertex(vert(0.0), node(0));
        let v1 = g.add_vertex(vert(1.0), node(0));
        let v2 = g.add_vertex(vert(2.0), node(0));
        let v3 = g.add_vertex(vert(3.0), node(7));
        g.add_polygon(&[v1, v2, v3], node(7));

        // v0 has no polygons; removing it moves v3 into slot 0
        let removal = g.remove_vertex(v0);
        let swap = removal.swap.expect("swap expected");
        assert!(removal.polygon_swaps.is_empty());
        assert_eq!(swap.old, 3);
        assert_eq!(swap.new, 0);
        assert_eq!(swap.node, node(7));
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.polygon_count(), 1);
        // the polygon now references the renamed vertex
        assert!(g.indices().contains(&0));
        assert!(!g.indices().contains(&3));
        g.assert_consistent();
    }

    #[test]
    fn test_remove_last_vertex_no_swap() {
        let mut g = GlData::new();
        g.add_vertex(vert(0.0), node(0));
        let v1 = g.add_vertex(vert(1.0), node(0));
        assert!(g.remove_vertex(v1).swap.is_none());
        assert_eq!(g.vertex_count(), 1);
        g.assert_consistent();
    }

    #[test]
    fn test_remove_polygon_middle_and_last() {
        let mut g = GlData::new();
        let vs: Vec<u32> = (0..6)
            .map(|k| g.add_vertex(vert(k as f32), node(0)))
            .collect();
        let p0 = g.add_polygon(&[vs[0], vs[1], vs[2]], node(1));
        let p1 = g.add_polygon(&[vs[1], vs[2], vs[3]], node(2));
        let p2 = g.add_polygon(&[vs[3], vs[4], vs[5]], node(3));

        // removing a middle polygon moves the last one into its slot
        let swap = g.remove_polygon(p1).expect("swap expected");
        assert_eq!(swap.old, p2);
        assert_eq!(swap.new, p1);
        assert_eq!(swap.node, node(3));
        assert_eq!(g.polygon_count(), 2);
        g.assert_consistent();
        // vs[4] now belongs to the renamed polygon 1
        assert_eq!(g.vertex_polygons(vs[4]), &[1]);
        assert_eq!(g.polygon_node(1), node(3));

        // boundary case: the removed polygon is the last group
        assert!(g.remove_polygon(1).is_none());
        assert_eq!(g.polygon_count(), 1);
        g.assert_consistent();
        assert_eq!(g.vertex_polygons(vs[0]), &[p0]);
        assert!(g.vertex_polygons(vs[4]).is_empty());
    }

    #[test]
    fn test_shared_vertex_survives_polygon_removal() {
        let mut g = GlData::new();
        let vs: Vec<u32> = (0..4)
            .map(|k| g.add_vertex(vert(k as f32), node(0)))
            .collect();
        let p0 = g.add_polygon(&[vs[0], vs[1], vs[2]], node(0));
        let p1 = g.add_polygon(&[vs[0], vs[2], vs[3]], node(1));
        g.remove_polygon(p0);
        g.assert_consistent();
        assert_eq!(g.polygon_count(), 1);
        // vs[0] and vs[2] remain registered to the surviving polygon
        assert_eq!(g.vertex_polygons(vs[0]).len(), 1);
        assert_eq!(g.vertex_polygons(vs[2]).len(), 1);
        let _ = p1;
    }

    #[test]
    fn test_rebind_vertex() {
        let mut g = GlData::new();
        let v = g.add_vertex(vert(0.0), node(0));
        g.rebind_vertex(v, node(9));
        assert_eq!(g.vertex_node(v), node(9));
    }
}
