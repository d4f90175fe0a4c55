//! 2D kd-tree over triangle XY bounding boxes.
//!
//! The push-cutter filters mesh triangles per fiber through this index.
//! Leaves hold up to `bucket_size` triangles (default 1, a tuning knob);
//! internal nodes split on the median bbox center, alternating axes.

/// 2D kd-tree over item rectangles `[min_x, min_y, max_x, max_y]`.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    rects: Vec<[f64; 4]>,
    bucket_size: usize,
}

#[derive(Debug)]
enum KdNode {
    Split {
        /// Union rectangle of everything below this node.
        rect: [f64; 4],
        left: u32,
        right: u32,
    },
    Leaf {
        rect: [f64; 4],
        items: Vec<u32>,
    },
}

fn union_rect(rects: &[[f64; 4]], items: &[u32]) -> [f64; 4] {
    let mut r = [
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    ];
    for &i in items {
        let b = rects[i as usize];
        r[0] = r[0].min(b[0]);
        r[1] = r[1].min(b[1]);
        r[2] = r[2].max(b[2]);
        r[3] = r[3].max(b[3]);
    }
    r
}

fn rects_overlap(a: &[f64; 4], b: &[f64; 4]) -> bool {
    a[0] <= b[2] && a[2] >= b[0] && a[1] <= b[3] && a[3] >= b[1]
}

impl KdTree {
    /// Build a tree over item rectangles.
    pub fn build(rects: Vec<[f64; 4]>, bucket_size: usize) -> Self {
        let bucket_size = bucket_size.max(1);
        let mut tree = Self {
            nodes: Vec::new(),
            rects,
            bucket_size,
        };
        let items: Vec<u32> = (0..tree.rects.len() as u32).collect();
        if !items.is_empty() {
            tree.build_node(items, 0);
        }
        tree
    }

    /// The configured leaf bucket size.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    fn build_node(&mut self, mut items: Vec<u32>, axis: usize) -> u32 {
        let rect = union_rect(&self.rects, &items);
        let id = self.nodes.len() as u32;
        if items.len() <= self.bucket_size {
            self.nodes.push(KdNode::Leaf { rect, items });
            return id;
        }
        // Median split on bbox centers along the given axis
        let center = |r: &[f64; 4]| (r[axis] + r[axis + 2]) * 0.5;
        items.sort_by(|&a, &b| {
            center(&self.rects[a as usize])
                .partial_cmp(&center(&self.rects[b as usize]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mid = items.len() / 2;
        let right_items = items.split_off(mid);

        // placeholder, patched after children exist
        self.nodes.push(KdNode::Split {
            rect,
            left: 0,
            right: 0,
        });
        let left = self.build_node(items, 1 - axis);
        let right = self.build_node(right_items, 1 - axis);
        if let KdNode::Split {
            left: l, right: r, ..
        } = &mut self.nodes[id as usize]
        {
            *l = left;
            *r = right;
        }
        id
    }

    /// Collect all items whose rectangle overlaps the query rectangle.
    ///
    /// Results come back in deterministic tree order.
    pub fn query_rect(&self, query: [f64; 4]) -> Vec<u32> {
        let mut out = Vec::new();
        if !self.nodes.is_empty() {
            self.query_node(0, &query, &mut out);
        }
        out
    }

    fn query_node(&self, id: u32, query: &[f64; 4], out: &mut Vec<u32>) {
        match &self.nodes[id as usize] {
            KdNode::Leaf { rect, items } => {
                if rects_overlap(rect, query) {
                    for &i in items {
                        if rects_overlap(&self.rects[i as usize], query) {
                            out.push(i);
                        }
                    }
                }
            }
            KdNode::Split { rect, left, right } => {
                if rects_overlap(rect, query) {
                    self.query_node(*left, query, out);
                    self.query_node(*right, query, out);
                }
            }
        }
    }
}
