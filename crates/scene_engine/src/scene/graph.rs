//! Scene ownership, hierarchy and mutation

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use slotmap::SlotMap;

use super::entity::{Entity, EntityDesc, EntityId};
use super::{SceneError, SceneResult};
use crate::config::SceneConfig;
use crate::foundation::math::{translation_of, Mat4, Quat, Sqt, Vec3, Vec4};
use crate::render::primitives::{Camera, Light, Material, Mesh};
use crate::spatial::{AxisAlignedBox, EraseOutcome, Octree};

type TransformListener = Box<dyn FnMut(EntityId, &Mat4) + Send>;
type DeathListener = Box<dyn FnMut(EntityId, &str) + Send>;

/// Owner of every entity and of the spatial index over them
///
/// Every mutation of a local transform goes through the scene, which
/// re-propagates the mutated subtree, keeps the octree in sync and then
/// notifies transform listeners.
pub struct Scene {
    pub(crate) entities: SlotMap<EntityId, Entity>,
    pub(crate) octree: Octree<EntityId>,
    transform_listeners: Vec<TransformListener>,
    death_listeners: Vec<DeathListener>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("entities", &self.entities.len())
            .field("indexed", &self.octree.len())
            .field("octree_nodes", &self.octree.node_count())
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}

impl Scene {
    /// Create an empty scene whose octree covers `bounds`
    pub fn new(bounds: AxisAlignedBox, subdivision_threshold: f32) -> Self {
        Self {
            entities: SlotMap::with_key(),
            octree: Octree::with_subdivision_threshold(bounds, subdivision_threshold),
            transform_listeners: Vec::new(),
            death_listeners: Vec::new(),
        }
    }

    /// Create an empty scene from configuration
    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(config.octree_bounds(), config.subdivision_threshold)
    }

    /// Spatial index over indexed entities
    pub const fn octree(&self) -> &Octree<EntityId> {
        &self.octree
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether `id` refers to a live entity
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Look up an entity
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up an entity, failing with `EntityNotFound`
    pub fn get(&self, id: EntityId) -> SceneResult<&Entity> {
        self.entities.get(id).ok_or(SceneError::EntityNotFound(id))
    }

    /// Iterate over all live entities in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    /// First entity with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities.iter().find(|(_, entity)| entity.name == name).map(|(id, _)| id)
    }

    // ------------------------------------------------------------------
    // Factory
    // ------------------------------------------------------------------

    /// Create a root entity with an identity transform
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.entities.insert(Entity::new(name.into()))
    }

    /// Create an entity from a description
    ///
    /// The local bounding box is taken from the description, or from the
    /// mesh when the description has none.
    pub fn spawn(&mut self, desc: EntityDesc) -> SceneResult<EntityId> {
        if let Some(parent) = desc.parent {
            if !self.entities.contains_key(parent) {
                return Err(SceneError::EntityNotFound(parent));
            }
        }

        let mut entity = Entity::new(desc.name);
        entity.local_transform = desc.local_transform;
        entity.local_bounding_box = desc
            .local_bounding_box
            .or_else(|| desc.mesh.as_ref().map(|mesh| mesh.local_bounding_box))
            .unwrap_or_default();
        entity.mesh = desc.mesh;
        entity.material = desc.material;
        entity.light = desc.light;
        entity.camera = desc.camera;
        let id = self.entities.insert(entity);

        match desc.parent {
            Some(parent) => self.add_child(parent, id)?,
            None => self.propagate(id)?,
        }
        if desc.indexed {
            self.index(id)?;
        }
        Ok(id)
    }

    /// Remove an entity from the scene
    ///
    /// Fires `about_to_die`, erases the entity from the octree and detaches
    /// it from its parent. Its children are not destroyed; they become
    /// independent roots and are re-propagated.
    pub fn destroy(&mut self, id: EntityId) -> SceneResult<()> {
        let entity = self.get(id)?;
        let name = entity.name.clone();
        for listener in &mut self.death_listeners {
            listener(id, &name);
        }

        if self.entities.get(id).is_some_and(Entity::is_indexed) {
            self.unindex(id)?;
        }
        self.detach_from_parent(id);

        let Some(entity) = self.entities.remove(id) else {
            return Err(SceneError::EntityNotFound(id));
        };
        debug!("Scene: destroyed '{}' ({} orphaned children)", name, entity.children.len());

        for child in entity.children {
            if let Some(child_entity) = self.entities.get_mut(child) {
                child_entity.parent = None;
            }
            self.propagate(child)?;
            self.fire_transform_changed(child);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Local transform mutators
    // ------------------------------------------------------------------

    fn modify_local(&mut self, id: EntityId, f: impl FnOnce(&mut Sqt)) -> SceneResult<()> {
        let entity = self.entities.get_mut(id).ok_or(SceneError::EntityNotFound(id))?;
        f(&mut entity.local_transform);
        self.propagate(id)?;
        self.fire_transform_changed(id);
        Ok(())
    }

    /// Replace the local scale
    pub fn set_scale(&mut self, id: EntityId, scale: Vec3) -> SceneResult<()> {
        self.modify_local(id, |local| local.scale = scale)
    }

    /// Multiply the local scale component-wise
    pub fn multiply_scale(&mut self, id: EntityId, factor: Vec3) -> SceneResult<()> {
        self.modify_local(id, |local| local.scale.component_mul_assign(&factor))
    }

    /// Replace the local translation
    pub fn set_translation(&mut self, id: EntityId, translation: Vec3) -> SceneResult<()> {
        self.modify_local(id, |local| local.translation = translation)
    }

    /// Replace the X component of the local translation
    pub fn set_translation_x(&mut self, id: EntityId, x: f32) -> SceneResult<()> {
        self.modify_local(id, |local| local.translation.x = x)
    }

    /// Replace the Y component of the local translation
    pub fn set_translation_y(&mut self, id: EntityId, y: f32) -> SceneResult<()> {
        self.modify_local(id, |local| local.translation.y = y)
    }

    /// Replace the Z component of the local translation
    pub fn set_translation_z(&mut self, id: EntityId, z: f32) -> SceneResult<()> {
        self.modify_local(id, |local| local.translation.z = z)
    }

    /// Offset the local translation
    pub fn add_translation(&mut self, id: EntityId, offset: Vec3) -> SceneResult<()> {
        self.modify_local(id, |local| local.translation += offset)
    }

    /// Replace the local rotation
    pub fn set_rotation(&mut self, id: EntityId, rotation: Quat) -> SceneResult<()> {
        self.modify_local(id, |local| local.rotation = rotation)
    }

    /// `rotation = rotation * q`: `q` is applied in the entity's own frame
    pub fn post_multiply_rotation(&mut self, id: EntityId, rotation: Quat) -> SceneResult<()> {
        self.modify_local(id, |local| {
            local.rotation *= rotation;
            local.rotation.renormalize();
        })
    }

    /// `rotation = q * rotation`: `q` is applied in the parent's frame
    pub fn pre_multiply_rotation(&mut self, id: EntityId, rotation: Quat) -> SceneResult<()> {
        self.modify_local(id, |local| {
            local.rotation = rotation * local.rotation;
            local.rotation.renormalize();
        })
    }

    /// Replace the whole local transform
    pub fn set_local_transform(&mut self, id: EntityId, transform: Sqt) -> SceneResult<()> {
        self.modify_local(id, |local| *local = transform)
    }

    /// Apply `transform` after the current local transform
    pub fn post_add_local_transform(&mut self, id: EntityId, transform: Sqt) -> SceneResult<()> {
        self.modify_local(id, |local| *local %= transform)
    }

    /// Apply `transform` before the current local transform
    pub fn pre_add_local_transform(&mut self, id: EntityId, transform: Sqt) -> SceneResult<()> {
        self.modify_local(id, |local| *local = transform % *local)
    }

    /// Move along the local forward direction (-Z)
    pub fn move_forward(&mut self, id: EntityId, distance: f32) -> SceneResult<()> {
        self.modify_local(id, |local| {
            let step = local.forward() * distance;
            local.translation += step;
        })
    }

    /// Move against the local forward direction
    pub fn move_backward(&mut self, id: EntityId, distance: f32) -> SceneResult<()> {
        self.move_forward(id, -distance)
    }

    /// Move along the local right direction (+X)
    pub fn move_right(&mut self, id: EntityId, distance: f32) -> SceneResult<()> {
        self.modify_local(id, |local| {
            let step = local.right() * distance;
            local.translation += step;
        })
    }

    /// Move against the local right direction
    pub fn move_left(&mut self, id: EntityId, distance: f32) -> SceneResult<()> {
        self.move_right(id, -distance)
    }

    /// Move along the local up direction (+Y)
    pub fn move_up(&mut self, id: EntityId, distance: f32) -> SceneResult<()> {
        self.modify_local(id, |local| {
            let step = local.up() * distance;
            local.translation += step;
        })
    }

    /// Move against the local up direction
    pub fn move_down(&mut self, id: EntityId, distance: f32) -> SceneResult<()> {
        self.move_up(id, -distance)
    }

    // ------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------

    /// Attach or detach a mesh
    ///
    /// Attaching a mesh adopts its bounding box as the local bounding box.
    pub fn set_mesh(&mut self, id: EntityId, mesh: Option<Arc<Mesh>>) -> SceneResult<()> {
        let entity = self.entities.get_mut(id).ok_or(SceneError::EntityNotFound(id))?;
        if let Some(mesh) = &mesh {
            entity.local_bounding_box = mesh.local_bounding_box;
        }
        entity.mesh = mesh;
        self.propagate(id)
    }

    /// Replace the local bounding box
    pub fn set_local_bounding_box(&mut self, id: EntityId, bounds: AxisAlignedBox) -> SceneResult<()> {
        let entity = self.entities.get_mut(id).ok_or(SceneError::EntityNotFound(id))?;
        entity.local_bounding_box = bounds;
        self.propagate(id)
    }

    /// Attach or detach a material
    pub fn set_material(&mut self, id: EntityId, material: Option<Arc<Material>>) -> SceneResult<()> {
        self.entities.get_mut(id).ok_or(SceneError::EntityNotFound(id))?.material = material;
        Ok(())
    }

    /// Attach or detach a light
    pub fn set_light(&mut self, id: EntityId, light: Option<Arc<Light>>) -> SceneResult<()> {
        self.entities.get_mut(id).ok_or(SceneError::EntityNotFound(id))?.light = light;
        Ok(())
    }

    /// Attach or detach a camera
    pub fn set_camera(&mut self, id: EntityId, camera: Option<Arc<Camera>>) -> SceneResult<()> {
        self.entities.get_mut(id).ok_or(SceneError::EntityNotFound(id))?.camera = camera;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------

    /// Make `child` the last child of `parent`
    ///
    /// The child is detached from any previous parent first, then
    /// re-propagated under the new parent's current global transform.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> SceneResult<()> {
        if !self.entities.contains_key(parent) {
            return Err(SceneError::EntityNotFound(parent));
        }
        if !self.entities.contains_key(child) {
            return Err(SceneError::EntityNotFound(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneError::WouldCreateCycle { parent, child });
        }

        self.detach_from_parent(child);
        if let Some(parent_entity) = self.entities.get_mut(parent) {
            parent_entity.children.push(child);
        }
        if let Some(child_entity) = self.entities.get_mut(child) {
            child_entity.parent = Some(parent);
        }
        debug!("Scene: {:?} is now a child of {:?}", child, parent);

        self.propagate(child)?;
        self.fire_transform_changed(child);
        Ok(())
    }

    /// Detach `child` from `parent`, making it a root
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> SceneResult<()> {
        let parent_entity = self.entities.get_mut(parent).ok_or(SceneError::EntityNotFound(parent))?;
        let Some(position) = parent_entity.children.iter().position(|&id| id == child) else {
            return Err(SceneError::NotAChild { parent, child });
        };
        parent_entity.children.remove(position);

        if let Some(child_entity) = self.entities.get_mut(child) {
            child_entity.parent = None;
        }
        debug!("Scene: {:?} detached from {:?}", child, parent);

        self.propagate(child)?;
        self.fire_transform_changed(child);
        Ok(())
    }

    /// Same as `add_child(parent, child)`
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> SceneResult<()> {
        self.add_child(parent, child)
    }

    /// Detach from the current parent, if any
    pub fn unset_parent(&mut self, child: EntityId) -> SceneResult<()> {
        match self.get(child)?.parent {
            Some(parent) => self.remove_child(parent, child),
            None => Ok(()),
        }
    }

    fn detach_from_parent(&mut self, child: EntityId) {
        let Some(parent) = self.entities.get_mut(child).and_then(|entity| entity.parent.take()) else {
            return;
        };
        if let Some(parent_entity) = self.entities.get_mut(parent) {
            parent_entity.children.retain(|&id| id != child);
        }
    }

    /// Parent of an entity
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.get(id).and_then(|entity| entity.parent)
    }

    /// Children of an entity, empty for unknown handles
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.entities.get(id).map(|entity| entity.children.as_slice()).unwrap_or_default()
    }

    /// All entities without a parent
    pub fn roots(&self) -> Vec<EntityId> {
        self.entities.iter().filter(|(_, entity)| entity.is_root()).map(|(id, _)| id).collect()
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: EntityId, id: EntityId) -> bool {
        let mut current = self.parent(id);
        let mut steps = 0;
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.entities.len() {
                break;
            }
            current = self.parent(node);
        }
        false
    }

    /// The subtree rooted at `id` in depth-first pre-order
    pub fn subtree(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(entity) = self.entities.get(current) else { continue };
            if out.len() >= self.entities.len() {
                warn!("Scene: hierarchy cycle while walking subtree of {:?}", id);
                break;
            }
            out.push(current);
            stack.extend(entity.children.iter().rev());
        }
        out
    }

    // ------------------------------------------------------------------
    // Spatial index
    // ------------------------------------------------------------------

    /// Insert an entity into the octree using its global bounding box
    pub fn index(&mut self, id: EntityId) -> SceneResult<()> {
        let entity = self.entities.get_mut(id).ok_or(SceneError::EntityNotFound(id))?;
        if entity.octree_node.is_some() {
            return Err(SceneError::AlreadyIndexed(id));
        }
        entity.octree_node = Some(self.octree.insert(id, entity.global_bounding_box));
        Ok(())
    }

    /// Remove an entity from the octree
    pub fn unindex(&mut self, id: EntityId) -> SceneResult<()> {
        let entity = self.entities.get_mut(id).ok_or(SceneError::EntityNotFound(id))?;
        let node = entity.octree_node.take().ok_or(SceneError::NotIndexed(id))?;

        if self.octree.erase(node, id) == EraseOutcome::NotFound {
            warn!("Scene: {:?} was not in its recorded octree node", id);
            if let Some(actual) = self.octree.locate(id) {
                self.octree.erase(actual, id);
            }
        }
        Ok(())
    }

    /// Indexed entities whose global bounds intersect `area`
    pub fn query(&self, area: &AxisAlignedBox) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.octree.query(area, &mut out);
        out
    }

    /// Visit every indexed entity, no culling
    pub fn foreach_indexed<F: FnMut(EntityId, &Entity)>(&self, mut f: F) {
        let entities = &self.entities;
        self.octree.foreach(|id, _| {
            if let Some(entity) = entities.get(id) {
                f(id, entity);
            }
        });
    }

    // ------------------------------------------------------------------
    // Camera support
    // ------------------------------------------------------------------

    /// View matrix looking through an entity
    ///
    /// Built from the entity's global right, up and forward axes and its
    /// global position.
    pub fn view_matrix(&self, id: EntityId) -> SceneResult<Mat4> {
        let global = self.get(id)?.global_transform;
        let right = (global * Vec4::new(1.0, 0.0, 0.0, 0.0)).xyz();
        let up = (global * Vec4::new(0.0, 1.0, 0.0, 0.0)).xyz();
        let forward = (global * Vec4::new(0.0, 0.0, -1.0, 0.0)).xyz();
        let eye = translation_of(&global);

        #[rustfmt::skip]
        let view = Mat4::new(
            right.x,    right.y,    right.z,    -right.dot(&eye),
            up.x,       up.y,       up.z,       -up.dot(&eye),
            -forward.x, -forward.y, -forward.z, forward.dot(&eye),
            0.0,        0.0,        0.0,        1.0,
        );
        Ok(view)
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Register a callback fired after an entity's transform changed
    ///
    /// Receives the entity that was mutated (not its descendants) and its
    /// new global transform.
    pub fn on_transform_changed<F>(&mut self, listener: F)
    where
        F: FnMut(EntityId, &Mat4) + Send + 'static,
    {
        self.transform_listeners.push(Box::new(listener));
    }

    /// Register a callback fired right before an entity is destroyed
    pub fn on_about_to_die<F>(&mut self, listener: F)
    where
        F: FnMut(EntityId, &str) + Send + 'static,
    {
        self.death_listeners.push(Box::new(listener));
    }

    pub(crate) fn fire_transform_changed(&mut self, id: EntityId) {
        let Some(global) = self.entities.get(id).map(|entity| entity.global_transform) else {
            return;
        };
        for listener in &mut self.transform_listeners {
            listener(id, &global);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use approx::assert_relative_eq;

    use super::*;

    fn scene() -> Scene {
        Scene::new(AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(100.0)), 5.0)
    }

    #[test]
    fn test_child_follows_parent() {
        let mut scene = scene();
        let parent = scene.create_entity("parent");
        let child = scene
            .spawn(EntityDesc::new("child").with_translation(Vec3::new(0.0, 2.0, 0.0)).with_parent(parent))
            .unwrap();

        scene.set_translation(parent, Vec3::new(3.0, 0.0, 0.0)).unwrap();
        let position = translation_of(scene.get(child).unwrap().global_transform());
        assert_relative_eq!(position, Vec3::new(3.0, 2.0, 0.0));
    }

    #[test]
    fn test_move_forward_uses_local_rotation() {
        let mut scene = scene();
        let id = scene.create_entity("mover");
        scene
            .set_rotation(id, Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2))
            .unwrap();
        scene.move_forward(id, 2.0).unwrap();

        // Yaw of +90 degrees turns -Z into -X
        assert_relative_eq!(scene.get(id).unwrap().local_transform().translation, Vec3::new(-2.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_post_and_pre_add_local_transform() {
        let mut scene = scene();
        let id = scene.create_entity("e");
        scene.set_scale(id, Vec3::repeat(2.0)).unwrap();

        scene.post_add_local_transform(id, Sqt::from_translation(Vec3::new(1.0, 0.0, 0.0))).unwrap();
        assert_relative_eq!(scene.get(id).unwrap().local_transform().translation, Vec3::new(1.0, 0.0, 0.0));

        // Applied first, so the translation is scaled by the existing scale
        scene.pre_add_local_transform(id, Sqt::from_translation(Vec3::new(1.0, 0.0, 0.0))).unwrap();
        assert_relative_eq!(scene.get(id).unwrap().local_transform().translation, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_listeners_fire() {
        let mut scene = scene();
        let changed = Arc::new(AtomicUsize::new(0));
        let died = Arc::new(AtomicUsize::new(0));
        let changed_counter = Arc::clone(&changed);
        let died_counter = Arc::clone(&died);
        scene.on_transform_changed(move |_, _| {
            changed_counter.fetch_add(1, Ordering::SeqCst);
        });
        scene.on_about_to_die(move |_, name| {
            assert_eq!(name, "doomed");
            died_counter.fetch_add(1, Ordering::SeqCst);
        });

        let id = scene.create_entity("doomed");
        scene.add_translation(id, Vec3::x()).unwrap();
        scene.set_scale(id, Vec3::repeat(3.0)).unwrap();
        scene.destroy(id).unwrap();

        assert_eq!(changed.load(Ordering::SeqCst), 2);
        assert_eq!(died.load(Ordering::SeqCst), 1);
        assert!(!scene.contains(id));
    }

    #[test]
    fn test_index_twice_is_an_error() {
        let mut scene = scene();
        let id = scene.create_entity("e");
        scene.index(id).unwrap();
        assert_eq!(scene.index(id), Err(SceneError::AlreadyIndexed(id)));
        scene.unindex(id).unwrap();
        assert_eq!(scene.unindex(id), Err(SceneError::NotIndexed(id)));
        assert_eq!(scene.octree().len(), 0);
    }

    #[test]
    fn test_moving_keeps_index_current() {
        let mut scene = scene();
        let id = scene
            .spawn(
                EntityDesc::new("box")
                    .with_bounding_box(AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5)))
                    .with_translation(Vec3::new(-50.0, -50.0, -50.0))
                    .indexed(true),
            )
            .unwrap();

        let far_corner = AxisAlignedBox::new(Vec3::repeat(40.0), Vec3::repeat(60.0));
        assert!(scene.query(&far_corner).is_empty());

        scene.set_translation(id, Vec3::repeat(50.0)).unwrap();
        assert_eq!(scene.query(&far_corner), vec![id]);
        assert_eq!(scene.octree().count(), 1);
    }

    #[test]
    fn test_view_matrix_of_translated_entity() {
        let mut scene = scene();
        let camera = scene.create_entity("camera");
        scene.set_translation(camera, Vec3::new(0.0, 0.0, 5.0)).unwrap();

        let view = scene.view_matrix(camera).unwrap();
        let origin = view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, Vec4::new(0.0, 0.0, -5.0, 1.0));
    }

    #[test]
    fn test_subtree_preorder() {
        let mut scene = scene();
        let root = scene.create_entity("root");
        let a = scene.spawn(EntityDesc::new("a").with_parent(root)).unwrap();
        let b = scene.spawn(EntityDesc::new("b").with_parent(root)).unwrap();
        let a1 = scene.spawn(EntityDesc::new("a1").with_parent(a)).unwrap();
        assert_eq!(scene.subtree(root), vec![root, a, a1, b]);
    }

    #[test]
    fn test_unknown_handle() {
        let mut scene = scene();
        let id = scene.create_entity("gone");
        scene.destroy(id).unwrap();
        assert_eq!(scene.set_scale(id, Vec3::repeat(1.0)), Err(SceneError::EntityNotFound(id)));
        assert!(scene.children(id).is_empty());
    }
}
