//! Importer boundary
//!
//! An asset importer hands over flat, parallel lists of entities and shared
//! resources plus the index of the root entity. Entities refer to each other
//! and to resources by index. The scene takes this verbatim: resources are
//! shared as given, never deduplicated.

use std::sync::Arc;

use log::{debug, warn};

use super::entity::{Entity, EntityId};
use super::graph::Scene;
use super::{SceneError, SceneResult};
use crate::config::SceneConfig;
use crate::foundation::math::Sqt;
use crate::render::primitives::{Camera, Light, Material, Mesh};

/// One node as produced by an importer
#[derive(Debug, Clone, Default)]
pub struct ImportedEntity {
    /// Node name
    pub name: String,
    /// Transform relative to the parent node
    pub local_transform: Sqt,
    /// Indices of child nodes in `ImportedScene::entities`, in order
    pub children: Vec<usize>,
    /// Index into `ImportedScene::meshes`
    pub mesh: Option<usize>,
    /// Index into `ImportedScene::materials`
    pub material: Option<usize>,
    /// Index into `ImportedScene::lights`
    pub light: Option<usize>,
    /// Index into `ImportedScene::cameras`
    pub camera: Option<usize>,
}

impl ImportedEntity {
    /// Node with an identity transform and no attachments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Complete importer output
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    /// All nodes
    pub entities: Vec<ImportedEntity>,
    /// Shared materials
    pub materials: Vec<Arc<Material>>,
    /// Shared meshes
    pub meshes: Vec<Arc<Mesh>>,
    /// Shared lights
    pub lights: Vec<Arc<Light>>,
    /// Shared cameras
    pub cameras: Vec<Arc<Camera>>,
    /// Index of the root node
    pub root: usize,
}

/// Entity handles created by an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedHandles {
    /// Handle of the imported root
    pub root: EntityId,
    /// Handles parallel to `ImportedScene::entities`
    pub entities: Vec<EntityId>,
}

fn check_index(kind: &str, owner: usize, index: Option<usize>, len: usize) -> SceneResult<()> {
    match index {
        Some(index) if index >= len => Err(SceneError::InvalidImport(format!(
            "entity {owner} references {kind} {index}, but only {len} exist"
        ))),
        _ => Ok(()),
    }
}

impl ImportedScene {
    /// Check every index and that the nodes form a forest
    pub fn validate(&self) -> SceneResult<()> {
        let count = self.entities.len();
        if self.root >= count {
            return Err(SceneError::InvalidImport(format!(
                "root index {} out of range ({count} entities)",
                self.root
            )));
        }

        let mut parent_of: Vec<Option<usize>> = vec![None; count];
        for (index, entity) in self.entities.iter().enumerate() {
            check_index("mesh", index, entity.mesh, self.meshes.len())?;
            check_index("material", index, entity.material, self.materials.len())?;
            check_index("light", index, entity.light, self.lights.len())?;
            check_index("camera", index, entity.camera, self.cameras.len())?;

            for &child in &entity.children {
                if child >= count {
                    return Err(SceneError::InvalidImport(format!(
                        "entity {index} has child {child}, but only {count} entities exist"
                    )));
                }
                if let Some(previous) = parent_of[child].replace(index) {
                    return Err(SceneError::InvalidImport(format!(
                        "entity {child} is a child of both {previous} and {index}"
                    )));
                }
            }
        }

        if let Some(parent) = parent_of[self.root] {
            return Err(SceneError::InvalidImport(format!(
                "root entity {} is a child of {parent}",
                self.root
            )));
        }

        // With at most one parent each, a cycle shows up as a parent chain longer than the node count
        for start in 0..count {
            let mut current = parent_of[start];
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if steps > count || parent == start {
                    return Err(SceneError::InvalidImport(format!("entity {start} is its own ancestor")));
                }
                current = parent_of[parent];
            }
        }
        Ok(())
    }
}

impl Scene {
    /// Build a new scene from importer output
    pub fn from_import(config: &SceneConfig, imported: &ImportedScene) -> SceneResult<(Self, ImportedHandles)> {
        let mut scene = Self::from_config(config);
        let handles = scene.import(imported)?;
        Ok((scene, handles))
    }

    /// Add importer output to this scene
    ///
    /// Every imported entity is propagated and indexed. Nothing is added
    /// when validation fails.
    pub fn import(&mut self, imported: &ImportedScene) -> SceneResult<ImportedHandles> {
        imported.validate()?;

        let ids: Vec<EntityId> = imported
            .entities
            .iter()
            .map(|source| {
                let mut entity = Entity::new(source.name.clone());
                entity.local_transform = source.local_transform;
                entity.mesh = source.mesh.map(|index| Arc::clone(&imported.meshes[index]));
                entity.material = source.material.map(|index| Arc::clone(&imported.materials[index]));
                entity.light = source.light.map(|index| Arc::clone(&imported.lights[index]));
                entity.camera = source.camera.map(|index| Arc::clone(&imported.cameras[index]));
                if let Some(mesh) = &entity.mesh {
                    entity.local_bounding_box = mesh.local_bounding_box;
                }
                self.entities.insert(entity)
            })
            .collect();

        for (index, source) in imported.entities.iter().enumerate() {
            let parent = ids[index];
            for &child in &source.children {
                let child = ids[child];
                if let Some(entity) = self.entities.get_mut(child) {
                    entity.parent = Some(parent);
                }
                if let Some(entity) = self.entities.get_mut(parent) {
                    entity.children.push(child);
                }
            }
        }

        let mut extra_roots = 0;
        for &id in &ids {
            if self.entities.get(id).is_some_and(Entity::is_root) {
                if id != ids[imported.root] {
                    extra_roots += 1;
                }
                self.propagate(id)?;
            }
        }
        if extra_roots > 0 {
            warn!("Scene: import contains {} root entities besides the designated root", extra_roots);
        }

        for &id in &ids {
            self.index(id)?;
        }
        debug!(
            "Scene: imported {} entities, {} meshes, {} materials, {} lights, {} cameras",
            ids.len(),
            imported.meshes.len(),
            imported.materials.len(),
            imported.lights.len(),
            imported.cameras.len()
        );

        Ok(ImportedHandles {
            root: ids[imported.root],
            entities: ids,
        })
    }
}
