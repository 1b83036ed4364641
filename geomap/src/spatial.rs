//! Point quad-tree spatial index.
//!
//! Indexes `(location, value)` pairs for rectangular range queries, so
//! callers can answer "which entities lie in this bounding box" without
//! touching tiles at all. Each node splits the plane into four quadrants
//! relative to its own point; a side map from value to node gives O(1)
//! removal lookup.
//!
//! Nodes live in a flat arena and reference each other by index, so the
//! parent back-pointer needed for removal is a plain `Option<usize>`
//! instead of an ownership cycle.
//!
//! The tree is not internally synchronized. Concurrent mutation from
//! multiple threads is undefined; callers must serialize access
//! externally.

use std::collections::HashMap;
use std::hash::Hash;

use crate::coord::{Area, GeoLocation};

// Quadrants relative to a node's point. West is the lower longitude side,
// south the lower latitude side.
const SOUTH_WEST: usize = 0;
const NORTH_WEST: usize = 1;
const SOUTH_EAST: usize = 2;
const NORTH_EAST: usize = 3;

struct Node<V> {
    location: GeoLocation,
    value: V,
    parent: Option<usize>,
    children: [Option<usize>; 4],
}

/// Point quad-tree over geographic positions.
///
/// Removal reinserts the removed node's subtrees through the normal insert
/// path, which keeps the tree consistent but not height-balanced: repeated
/// insert/remove cycles can degrade query performance toward O(n) in the
/// worst case. That is a structural property of this index, not a defect
/// to balance away.
pub struct QuadTree<V> {
    nodes: Vec<Node<V>>,
    free: Vec<usize>,
    root: Option<usize>,
    index: HashMap<V, usize>,
}

impl<V> Default for QuadTree<V>
where
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> QuadTree<V>
where
    V: Eq + Hash + Clone,
{
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            index: HashMap::new(),
        }
    }

    /// Number of indexed values.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index holds no values.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Insert a value at a geographic position.
    ///
    /// Each value must be inserted at most once. Inserting a value that is
    /// already present updates only the removal lookup (last insert wins):
    /// the earlier node stays in the tree but can no longer be removed
    /// individually. Callers that relocate a value should `remove` it
    /// first.
    pub fn insert(&mut self, location: GeoLocation, value: V) {
        let slot = self.alloc(Node {
            location,
            value: value.clone(),
            parent: None,
            children: [None; 4],
        });
        self.attach(slot);
        self.index.insert(value, slot);
    }

    /// Collect every value whose position lies inside the area.
    ///
    /// The rectangle test is closed on the low edges and open on the high
    /// edges, matching the half-open tiling convention used elsewhere in
    /// this crate. Result order is unspecified.
    pub fn query(&self, area: &Area) -> Vec<&V> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect(root, area, &mut out);
        }
        out
    }

    /// Remove a value from the index.
    ///
    /// Returns `false` if the value is not present; removing an absent
    /// value is a no-op, not an error. The removed node's four subtrees
    /// are reinserted individually, pre-order, through the normal insert
    /// path, so every remaining value stays reachable from the root.
    pub fn remove(&mut self, value: &V) -> bool {
        let Some(slot) = self.index.remove(value) else {
            return false;
        };

        match self.nodes[slot].parent {
            Some(parent) => {
                for child in self.nodes[parent].children.iter_mut() {
                    if *child == Some(slot) {
                        *child = None;
                    }
                }
            }
            None => self.root = None,
        }

        let detached = self.nodes[slot].children;
        self.free.push(slot);

        for subtree in detached.into_iter().flatten() {
            self.reattach(subtree);
        }
        true
    }

    /// Drop every value from the index.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.index.clear();
    }

    fn alloc(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    // Binary recursive descent to the first empty child slot.
    fn attach(&mut self, slot: usize) {
        let location = self.nodes[slot].location;

        let Some(mut current) = self.root else {
            self.nodes[slot].parent = None;
            self.root = Some(slot);
            return;
        };

        loop {
            let quadrant = quadrant_of(&self.nodes[current].location, &location);
            match self.nodes[current].children[quadrant] {
                Some(next) => current = next,
                None => {
                    self.nodes[current].children[quadrant] = Some(slot);
                    self.nodes[slot].parent = Some(current);
                    return;
                }
            }
        }
    }

    // Reinsert a detached node, then recursively its children (pre-order).
    fn reattach(&mut self, slot: usize) {
        let children = self.nodes[slot].children;
        self.nodes[slot].children = [None; 4];
        self.nodes[slot].parent = None;
        self.attach(slot);

        for child in children.into_iter().flatten() {
            self.reattach(child);
        }
    }

    fn collect<'a>(&'a self, slot: usize, area: &Area, out: &mut Vec<&'a V>) {
        let node = &self.nodes[slot];

        if area.contains(&node.location) {
            out.push(&node.value);
        }

        // Descend only into quadrants that can intersect the rectangle
        let west = area.lon_low() < node.location.longitude;
        let east = area.lon_high() >= node.location.longitude;
        let south = area.lat_low() < node.location.latitude;
        let north = area.lat_high() >= node.location.latitude;

        let descend = [
            (SOUTH_WEST, south && west),
            (NORTH_WEST, north && west),
            (SOUTH_EAST, south && east),
            (NORTH_EAST, north && east),
        ];
        for (quadrant, wanted) in descend {
            if wanted {
                if let Some(child) = node.children[quadrant] {
                    self.collect(child, area, out);
                }
            }
        }
    }
}

// Quadrant of `point` relative to `center`. Low sides are strict, high
// sides inclusive, so a point equal to the center lands north-east.
fn quadrant_of(center: &GeoLocation, point: &GeoLocation) -> usize {
    match (
        point.longitude < center.longitude,
        point.latitude < center.latitude,
    ) {
        (true, true) => SOUTH_WEST,
        (true, false) => NORTH_WEST,
        (false, true) => SOUTH_EAST,
        (false, false) => NORTH_EAST,
    }
}
