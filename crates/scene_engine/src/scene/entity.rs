//! Scene nodes

use std::sync::Arc;

use slotmap::new_key_type;

use crate::foundation::math::{Mat4, Sqt, Vec3};
use crate::render::primitives::{Camera, Light, Material, Mesh};
use crate::spatial::{AxisAlignedBox, OctreeNodeId};

new_key_type! {
    /// Handle to an entity owned by a [`Scene`](super::Scene)
    ///
    /// Handles are generational: once an entity is destroyed its handle
    /// stops resolving, even if the slot is reused.
    pub struct EntityId;
}

/// A node in the scene graph
///
/// Only the scene can change the transform, hierarchy or attachments of an
/// entity; everything here is read access.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Display name, not required to be unique
    pub name: String,
    pub(crate) local_transform: Sqt,
    pub(crate) global_transform: Mat4,
    pub(crate) local_bounding_box: AxisAlignedBox,
    pub(crate) global_bounding_box: AxisAlignedBox,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) mesh: Option<Arc<Mesh>>,
    pub(crate) material: Option<Arc<Material>>,
    pub(crate) light: Option<Arc<Light>>,
    pub(crate) camera: Option<Arc<Camera>>,
    pub(crate) octree_node: Option<OctreeNodeId>,
}

impl Entity {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            local_transform: Sqt::identity(),
            global_transform: Mat4::identity(),
            local_bounding_box: AxisAlignedBox::default(),
            global_bounding_box: AxisAlignedBox::default(),
            parent: None,
            children: Vec::new(),
            mesh: None,
            material: None,
            light: None,
            camera: None,
            octree_node: None,
        }
    }

    /// Transform relative to the parent
    pub const fn local_transform(&self) -> &Sqt {
        &self.local_transform
    }

    /// Accumulated world transform
    pub const fn global_transform(&self) -> &Mat4 {
        &self.global_transform
    }

    /// World-space position (translation of the global transform)
    pub fn global_position(&self) -> Vec3 {
        crate::foundation::math::translation_of(&self.global_transform)
    }

    /// Object-space bounds
    pub const fn local_bounding_box(&self) -> &AxisAlignedBox {
        &self.local_bounding_box
    }

    /// World-space bounds: the local box moved by the global translation
    pub const fn global_bounding_box(&self) -> &AxisAlignedBox {
        &self.global_bounding_box
    }

    /// Parent entity, `None` for a root
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether the entity has no parent
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Attached mesh
    pub const fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Attached material
    pub const fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    /// Attached light
    pub const fn light(&self) -> Option<&Arc<Light>> {
        self.light.as_ref()
    }

    /// Attached camera
    pub const fn camera(&self) -> Option<&Arc<Camera>> {
        self.camera.as_ref()
    }

    /// Whether the entity is in the scene's spatial index
    pub const fn is_indexed(&self) -> bool {
        self.octree_node.is_some()
    }

    /// Octree node currently housing this entity
    pub const fn octree_node(&self) -> Option<OctreeNodeId> {
        self.octree_node
    }
}

/// Description of an entity to spawn
#[derive(Debug, Clone)]
pub struct EntityDesc {
    pub(crate) name: String,
    pub(crate) local_transform: Sqt,
    pub(crate) local_bounding_box: Option<AxisAlignedBox>,
    pub(crate) parent: Option<EntityId>,
    pub(crate) mesh: Option<Arc<Mesh>>,
    pub(crate) material: Option<Arc<Material>>,
    pub(crate) light: Option<Arc<Light>>,
    pub(crate) camera: Option<Arc<Camera>>,
    pub(crate) indexed: bool,
}

impl EntityDesc {
    /// Start describing an entity with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_transform: Sqt::identity(),
            local_bounding_box: None,
            parent: None,
            mesh: None,
            material: None,
            light: None,
            camera: None,
            indexed: false,
        }
    }

    /// Set the local transform
    #[must_use]
    pub fn with_transform(mut self, transform: Sqt) -> Self {
        self.local_transform = transform;
        self
    }

    /// Set only the local translation
    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.local_transform.translation = translation;
        self
    }

    /// Set the local bounding box; overrides the mesh's box
    #[must_use]
    pub fn with_bounding_box(mut self, bounds: AxisAlignedBox) -> Self {
        self.local_bounding_box = Some(bounds);
        self
    }

    /// Attach under a parent
    #[must_use]
    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attach a mesh
    #[must_use]
    pub fn with_mesh(mut self, mesh: Arc<Mesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Attach a material
    #[must_use]
    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// Attach a light
    #[must_use]
    pub fn with_light(mut self, light: Arc<Light>) -> Self {
        self.light = Some(light);
        self
    }

    /// Attach a camera
    #[must_use]
    pub fn with_camera(mut self, camera: Arc<Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Insert the entity into the spatial index once spawned
    #[must_use]
    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }
}
