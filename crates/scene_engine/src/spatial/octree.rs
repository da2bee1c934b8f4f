//! Octree spatial partitioning structure
//!
//! Sparse, lazily subdivided partition of space over axis-aligned bounding
//! boxes. Nodes live in an arena and refer to each other through
//! generational `OctreeNodeId` handles, so a handle to a pruned node can
//! never alias a newer one.
//!
//! An item is stored in the deepest node whose bounds fully contain its
//! box. A node only hands items down to its octants while its smallest side
//! is larger than the subdivision threshold; below that, everything stays
//! in the node's flat list.

use log::trace;
use slotmap::{new_key_type, SlotMap};

use super::aabb::AxisAlignedBox;

/// Default minimum node size below which no further subdivision happens
pub const DEFAULT_SUBDIVISION_THRESHOLD: f32 = 5.0;

new_key_type! {
    /// Handle to a node of an [`Octree`]
    pub struct OctreeNodeId;
}

/// Item stored in the octree together with the box it was indexed by
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeEntry<T> {
    /// The indexed item
    pub item: T,
    /// Bounding box used for placement and intersection tests
    pub bounds: AxisAlignedBox,
}

/// Result of erasing an item from a specific node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseOutcome {
    /// The item was not in that node's list
    NotFound,
    /// The item was removed and the node is still alive
    Removed,
    /// The item was removed and the node, now empty and childless, was deleted
    RemovedAndNodeDeleted,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode<T> {
    bounds: AxisAlignedBox,
    parent: Option<OctreeNodeId>,
    children: [Option<OctreeNodeId>; 8],
    entries: Vec<OctreeEntry<T>>,
}

impl<T> OctreeNode<T> {
    fn new(bounds: AxisAlignedBox, parent: Option<OctreeNodeId>) -> Self {
        Self {
            bounds,
            parent,
            children: [None; 8],
            entries: Vec::new(),
        }
    }

    /// World-space bounds of this node
    pub const fn bounds(&self) -> &AxisAlignedBox {
        &self.bounds
    }

    /// Parent node, `None` for the root
    pub const fn parent(&self) -> Option<OctreeNodeId> {
        self.parent
    }

    /// The eight child slots
    pub const fn children(&self) -> &[Option<OctreeNodeId>; 8] {
        &self.children
    }

    /// Items stored directly in this node
    pub fn entries(&self) -> &[OctreeEntry<T>] {
        &self.entries
    }

    /// Whether the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Whether the node stores no items directly
    pub fn has_no_entries(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Octree over items of type `T`
#[derive(Debug, Clone)]
pub struct Octree<T> {
    nodes: SlotMap<OctreeNodeId, OctreeNode<T>>,
    root: OctreeNodeId,
    subdivision_threshold: f32,
    len: usize,
}

impl<T: Copy + PartialEq> Octree<T> {
    /// Create an octree with the default subdivision threshold
    pub fn new(bounds: AxisAlignedBox) -> Self {
        Self::with_subdivision_threshold(bounds, DEFAULT_SUBDIVISION_THRESHOLD)
    }

    /// Create an octree that stops subdividing once a node's smallest side
    /// is at most `threshold`
    pub fn with_subdivision_threshold(bounds: AxisAlignedBox, threshold: f32) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(OctreeNode::new(bounds, None));
        Self {
            nodes,
            root,
            subdivision_threshold: threshold.max(f32::EPSILON),
            len: 0,
        }
    }

    /// Root node handle; the root lives as long as the octree
    pub const fn root(&self) -> OctreeNodeId {
        self.root
    }

    /// Bounds of the root node
    pub fn bounds(&self) -> AxisAlignedBox {
        self.nodes
            .get(self.root)
            .map_or_else(AxisAlignedBox::default, |node| node.bounds)
    }

    /// Subdivision threshold in world units
    pub const fn subdivision_threshold(&self) -> f32 {
        self.subdivision_threshold
    }

    /// Look up a node
    pub fn node(&self, id: OctreeNodeId) -> Option<&OctreeNode<T>> {
        self.nodes.get(id)
    }

    /// Child of `id` in the given octant slot
    pub fn child(&self, id: OctreeNodeId, octant: usize) -> Option<OctreeNodeId> {
        self.nodes.get(id).and_then(|node| node.children.get(octant).copied().flatten())
    }

    /// Whether `id` refers to a live node without children
    pub fn is_leaf(&self, id: OctreeNodeId) -> bool {
        self.nodes.get(id).is_some_and(OctreeNode::is_leaf)
    }

    /// Number of live nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored items (maintained incrementally)
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the octree stores no items
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Recursive item count of the whole tree
    pub fn count(&self) -> usize {
        self.count_from(self.root)
    }

    /// Recursive item count of the subtree rooted at `id`
    pub fn count_from(&self, id: OctreeNodeId) -> usize {
        self.nodes.get(id).map_or(0, |node| {
            node.entries.len()
                + node
                    .children
                    .iter()
                    .flatten()
                    .map(|child| self.count_from(*child))
                    .sum::<usize>()
        })
    }

    /// Insert an item and return the node that now houses it
    ///
    /// Items outside the root bounds are kept in the root's list.
    pub fn insert(&mut self, item: T, bounds: AxisAlignedBox) -> OctreeNodeId {
        self.len += 1;
        self.insert_from(self.root, OctreeEntry { item, bounds })
    }

    fn insert_from(&mut self, start: OctreeNodeId, entry: OctreeEntry<T>) -> OctreeNodeId {
        let mut current = start;
        loop {
            let Some(node) = self.nodes.get(current) else {
                if current == self.root {
                    return current;
                }
                // Stale start handle, fall back to the root
                current = self.root;
                continue;
            };

            let node_bounds = node.bounds;
            let octant = if node_bounds.min_extent() > self.subdivision_threshold
                && node_bounds.contains(&entry.bounds)
            {
                node_bounds.octant_containing(&entry.bounds)
            } else {
                None
            };

            let Some(octant) = octant else {
                if let Some(node) = self.nodes.get_mut(current) {
                    node.entries.push(entry);
                }
                return current;
            };

            let existing = node.children[octant];
            current = match existing {
                Some(child) => child,
                None => self.create_child(current, octant, node_bounds.octant(octant)),
            };
        }
    }

    fn create_child(&mut self, parent: OctreeNodeId, octant: usize, bounds: AxisAlignedBox) -> OctreeNodeId {
        let child = self.nodes.insert(OctreeNode::new(bounds, Some(parent)));
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children[octant] = Some(child);
        }
        trace!("Octree: subdivided octant {} ({:?} .. {:?})", octant, bounds.min, bounds.max);
        child
    }

    /// Erase an item from the list of node `id`
    ///
    /// Only that node's own list is searched. When the node ends up empty
    /// and childless it is deleted and its parent's slot cleared; the
    /// deletion cascades upward through ancestors left in the same state.
    /// The root is never deleted.
    pub fn erase(&mut self, id: OctreeNodeId, item: T) -> EraseOutcome {
        let Some(node) = self.nodes.get_mut(id) else {
            return EraseOutcome::NotFound;
        };
        let Some(position) = node.entries.iter().position(|entry| entry.item == item) else {
            return EraseOutcome::NotFound;
        };
        node.entries.remove(position);
        self.len -= 1;

        if self.prune(id) {
            EraseOutcome::RemovedAndNodeDeleted
        } else {
            EraseOutcome::Removed
        }
    }

    /// Delete `id` and then its ancestors while they are empty leaves.
    /// Returns whether `id` itself was deleted.
    fn prune(&mut self, id: OctreeNodeId) -> bool {
        let mut current = id;
        let mut deleted_first = false;
        while current != self.root {
            let Some(node) = self.nodes.get(current) else { break };
            if !node.entries.is_empty() || !node.is_leaf() {
                break;
            }
            let parent = node.parent;
            self.nodes.remove(current);
            trace!("Octree: pruned empty node");
            deleted_first |= current == id;

            let Some(parent) = parent else { break };
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                for slot in &mut parent_node.children {
                    if *slot == Some(current) {
                        *slot = None;
                    }
                }
            }
            current = parent;
        }
        deleted_first
    }

    /// Re-place an item whose bounding box changed
    ///
    /// `id` must be the node currently housing the item. Walks up from it to
    /// the first ancestor containing `new_bounds`, reinserts downward from
    /// there and prunes the old node if it was left empty. Returns the new
    /// housing node, or `None` when the item is not in node `id`.
    pub fn notify(&mut self, id: OctreeNodeId, item: T, new_bounds: AxisAlignedBox) -> Option<OctreeNodeId> {
        let node = self.nodes.get_mut(id)?;
        let position = node.entries.iter().position(|entry| entry.item == item)?;
        node.entries.remove(position);

        let mut target = id;
        while let Some(node) = self.nodes.get(target) {
            if node.bounds.contains(&new_bounds) {
                break;
            }
            match node.parent {
                Some(parent) => target = parent,
                None => break,
            }
        }

        let housing = self.insert_from(target, OctreeEntry { item, bounds: new_bounds });
        if housing != id {
            self.prune(id);
        }
        Some(housing)
    }

    /// Find the node housing `item` by searching the whole tree
    pub fn locate(&self, item: T) -> Option<OctreeNodeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else { continue };
            if node.entries.iter().any(|entry| entry.item == item) {
                return Some(id);
            }
            stack.extend(node.children.iter().flatten());
        }
        None
    }

    /// Whether `item` is stored anywhere in the tree
    pub fn contains(&self, item: T) -> bool {
        self.locate(item).is_some()
    }

    /// Append every item whose box intersects `area`
    pub fn query(&self, area: &AxisAlignedBox, out: &mut Vec<T>) {
        self.query_node(self.root, area, out);
    }

    fn query_node(&self, id: OctreeNodeId, area: &AxisAlignedBox, out: &mut Vec<T>) {
        let Some(node) = self.nodes.get(id) else { return };

        out.extend(
            node.entries
                .iter()
                .filter(|entry| area.intersects(&entry.bounds))
                .map(|entry| entry.item),
        );

        for &child_id in node.children.iter().flatten() {
            let Some(child) = self.nodes.get(child_id) else { continue };

            if child.bounds.contains(area) {
                // The area lies inside this octant: siblings can be skipped
                self.query_node(child_id, area, out);
                break;
            } else if area.contains(&child.bounds) {
                self.entities_from(child_id, out);
            } else if area.intersects(&child.bounds) {
                self.query_node(child_id, area, out);
            }
        }
    }

    /// Append every stored item
    pub fn entities(&self, out: &mut Vec<T>) {
        self.entities_from(self.root, out);
    }

    /// Append every item in the subtree rooted at `id`
    pub fn entities_from(&self, id: OctreeNodeId, out: &mut Vec<T>) {
        let Some(node) = self.nodes.get(id) else { return };
        out.extend(node.entries.iter().map(|entry| entry.item));
        for &child in node.children.iter().flatten() {
            self.entities_from(child, out);
        }
    }

    /// Visit every stored item depth-first, without any culling
    pub fn foreach<F: FnMut(T, &AxisAlignedBox)>(&self, mut f: F) {
        self.foreach_node(self.root, &mut f);
    }

    fn foreach_node<F: FnMut(T, &AxisAlignedBox)>(&self, id: OctreeNodeId, f: &mut F) {
        let Some(node) = self.nodes.get(id) else { return };
        for entry in &node.entries {
            f(entry.item, &entry.bounds);
        }
        for &child in node.children.iter().flatten() {
            self.foreach_node(child, f);
        }
    }

    /// Remove every item and every node except the root
    pub fn clear(&mut self) {
        let bounds = self.bounds();
        self.nodes.clear();
        self.root = self.nodes.insert(OctreeNode::new(bounds, None));
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    fn world() -> AxisAlignedBox {
        AxisAlignedBox::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0))
    }

    fn small_box(x: f32, y: f32, z: f32) -> AxisAlignedBox {
        AxisAlignedBox::from_center_extents(Vec3::new(x, y, z), Vec3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_octree_basic_insertion() {
        let mut octree = Octree::new(world());
        let node = octree.insert(1u32, small_box(10.0, 10.0, 10.0));
        assert_eq!(octree.len(), 1);
        assert_eq!(octree.count(), 1);
        assert_ne!(node, octree.root());
        assert!(octree.node(node).is_some_and(|n| n.bounds().contains(&small_box(10.0, 10.0, 10.0))));
    }

    #[test]
    fn test_subdivision_stops_at_threshold() {
        let mut octree = Octree::with_subdivision_threshold(world(), 30.0);
        let node = octree.insert(1u32, small_box(60.0, 60.0, 60.0));
        // 200 -> 100 -> 50 -> 25: the 25-wide node is at or below the threshold
        let bounds = *octree.node(node).map(OctreeNode::bounds).unwrap();
        assert!((bounds.min_extent() - 25.0).abs() < 1e-4);
        assert_eq!(octree.node_count(), 4);
    }

    #[test]
    fn test_straddling_items_stay_high() {
        let mut octree = Octree::new(world());
        let node = octree.insert(1u32, small_box(0.0, 0.0, 0.0));
        assert_eq!(node, octree.root());
        assert_eq!(octree.node_count(), 1);
    }

    #[test]
    fn test_outside_items_degrade_to_root() {
        let mut octree = Octree::new(world());
        let node = octree.insert(7u32, small_box(500.0, 0.0, 0.0));
        assert_eq!(node, octree.root());

        let mut found = Vec::new();
        octree.query(&small_box(500.0, 0.0, 0.0), &mut found);
        assert_eq!(found, vec![7]);
    }

    #[test]
    fn test_erase_only_searches_given_node() {
        let mut octree = Octree::new(world());
        let deep = octree.insert(1u32, small_box(50.0, 50.0, 50.0));
        octree.insert(2u32, small_box(0.0, 0.0, 0.0));

        assert_eq!(octree.erase(octree.root(), 1), EraseOutcome::NotFound);
        assert_eq!(octree.erase(deep, 2), EraseOutcome::NotFound);
        assert_eq!(octree.erase(octree.root(), 2), EraseOutcome::Removed);
        assert_eq!(octree.len(), 1);
    }

    #[test]
    fn test_erase_last_item_deletes_node_and_clears_parent_slot() {
        let mut octree = Octree::new(world());
        let deep = octree.insert(1u32, small_box(50.0, 50.0, 50.0));
        let first_level = octree.child(octree.root(), 7);
        assert!(first_level.is_some());

        assert_eq!(octree.erase(deep, 1), EraseOutcome::RemovedAndNodeDeleted);
        assert!(octree.node(deep).is_none());
        // Empty ancestors are pruned as well
        assert_eq!(octree.child(octree.root(), 7), None);
        assert_eq!(octree.node_count(), 1);
        assert!(octree.is_leaf(octree.root()));
    }

    #[test]
    fn test_erase_keeps_node_with_remaining_items() {
        let mut octree = Octree::new(world());
        let a = octree.insert(1u32, small_box(50.0, 50.0, 50.0));
        let b = octree.insert(2u32, small_box(50.0, 50.0, 50.0));
        assert_eq!(a, b);
        assert_eq!(octree.erase(a, 1), EraseOutcome::Removed);
        assert!(octree.node(a).is_some());
    }

    #[test]
    fn test_root_never_self_deletes() {
        let mut octree = Octree::new(world());
        let root = octree.insert(1u32, small_box(0.0, 0.0, 0.0));
        assert_eq!(octree.erase(root, 1), EraseOutcome::Removed);
        assert!(octree.node(octree.root()).is_some());
    }

    #[test]
    fn test_notify_relocates_item() {
        let mut octree = Octree::new(world());
        let old = octree.insert(1u32, small_box(50.0, 50.0, 50.0));
        let new = octree.notify(old, 1, small_box(-50.0, -50.0, -50.0));

        let new = new.unwrap();
        assert_ne!(old, new);
        assert!(octree.node(old).is_none());
        assert_eq!(octree.len(), 1);
        assert_eq!(octree.count(), 1);
        assert_eq!(octree.locate(1), Some(new));

        let mut found = Vec::new();
        octree.query(&small_box(-50.0, -50.0, -50.0), &mut found);
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn test_notify_with_wrong_node_is_rejected() {
        let mut octree = Octree::new(world());
        octree.insert(1u32, small_box(50.0, 50.0, 50.0));
        assert_eq!(octree.notify(octree.root(), 1, small_box(0.0, 0.0, 0.0)), None);
        assert_eq!(octree.count(), 1);
    }

    #[test]
    fn test_query_bulk_and_partial_paths() {
        let mut octree = Octree::with_subdivision_threshold(world(), 1.0);
        octree.insert(1u32, small_box(50.0, 50.0, 50.0));
        octree.insert(2u32, small_box(-50.0, -50.0, -50.0));
        octree.insert(3u32, small_box(-50.0, 50.0, -50.0));
        octree.insert(4u32, small_box(0.0, 0.0, 0.0));

        // Root bounds: every child is bulk-copied
        let mut found = Vec::new();
        octree.query(&world(), &mut found);
        found.sort_unstable();
        assert_eq!(found, vec![1, 2, 3, 4]);

        // Upper X half only reaches the +X octant
        let area = AxisAlignedBox::new(Vec3::new(0.6, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0));
        let mut found = Vec::new();
        octree.query(&area, &mut found);
        assert_eq!(found, vec![1]);

        // Exactly the (-X, +Y, -Z) octant; the root's own item touches it
        let area = AxisAlignedBox::new(Vec3::new(-100.0, 0.0, -100.0), Vec3::new(0.0, 100.0, 0.0));
        let mut found = Vec::new();
        octree.query(&area, &mut found);
        found.sort_unstable();
        assert_eq!(found, vec![3, 4]);
    }

    #[test]
    fn test_foreach_visits_everything() {
        let mut octree = Octree::new(world());
        for i in 0..20u32 {
            let offset = i as f32 * 9.0 - 90.0;
            octree.insert(i, small_box(offset, -offset, offset * 0.5));
        }
        let mut seen = Vec::new();
        octree.foreach(|item, _| seen.push(item));
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());

        let mut all = Vec::new();
        octree.entities(&mut all);
        assert_eq!(all.len(), octree.count());
    }

    #[test]
    fn test_clear() {
        let mut octree = Octree::new(world());
        octree.insert(1u32, small_box(50.0, 50.0, 50.0));
        octree.clear();
        assert!(octree.is_empty());
        assert_eq!(octree.node_count(), 1);
        assert_eq!(octree.bounds(), world());
    }
}
