//! Top-down transform propagation
//!
//! A node's global transform is its parent's global transform composed with
//! its local transform. After a mutation only the subtree under the mutated
//! node is recomputed, seeded with the parent's current global transform.

use log::{error, warn};

use super::entity::EntityId;
use super::graph::Scene;
use super::{SceneError, SceneResult};
use crate::foundation::math::{translation_of, Mat4, MatrixStack};
use crate::spatial::{AxisAlignedBox, OctreeNodeId};

impl Scene {
    /// Recompute global transforms and bounding boxes under `id`
    ///
    /// Indexed entities in the subtree are re-placed in the octree. Running
    /// it twice without a mutation in between yields identical results.
    pub fn propagate(&mut self, id: EntityId) -> SceneResult<()> {
        let entity = self.entities.get(id).ok_or(SceneError::EntityNotFound(id))?;
        let parent_global = entity
            .parent
            .and_then(|parent| self.entities.get(parent))
            .map_or_else(Mat4::identity, |parent| parent.global_transform);

        let mut stack = MatrixStack::new();
        stack.push_absolute(parent_global);
        let mut budget = self.entities.len();
        self.propagate_node(id, &mut stack, &mut budget);
        Ok(())
    }

    /// Recompute every tree in the scene from its root
    pub fn propagate_all(&mut self) {
        for root in self.roots() {
            if let Err(err) = self.propagate(root) {
                warn!("Scene: skipped propagation of {:?}: {}", root, err);
            }
        }
    }

    fn propagate_node(&mut self, id: EntityId, stack: &mut MatrixStack, budget: &mut usize) {
        // Each node is visited at most once in a tree
        if *budget == 0 {
            error!("Scene: hierarchy cycle detected at {:?}, propagation stopped", id);
            return;
        }
        *budget -= 1;

        let Some(entity) = self.entities.get_mut(id) else { return };
        let global = stack.push(&entity.local_transform.to_matrix());
        entity.global_transform = global;
        entity.global_bounding_box = entity.local_bounding_box.translated(&translation_of(&global));

        let bounds = entity.global_bounding_box;
        let child_count = entity.children.len();
        let octree_node = entity.octree_node;
        if let Some(node) = octree_node {
            self.sync_octree(id, node, bounds);
        }

        for index in 0..child_count {
            let child = self.entities.get(id).and_then(|entity| entity.children.get(index).copied());
            if let Some(child) = child {
                self.propagate_node(child, stack, budget);
            }
        }
        stack.pop();
    }

    fn sync_octree(&mut self, id: EntityId, node: OctreeNodeId, bounds: AxisAlignedBox) {
        let housing = self.octree.notify(node, id, bounds).unwrap_or_else(|| {
            warn!("Scene: {:?} missing from its octree node, reinserting", id);
            if let Some(actual) = self.octree.locate(id) {
                self.octree.erase(actual, id);
            }
            self.octree.insert(id, bounds)
        });
        if let Some(entity) = self.entities.get_mut(id) {
            entity.octree_node = Some(housing);
        }
    }
}
