//! Camera-space matrix cache
//!
//! Holds the model (M), view (V) and projection (P) inputs and lazily
//! derives VM, PVM and the normal matrix from them. Each derived matrix has
//! its own dirty flag; a getter recomputes what it depends on first, then
//! itself, and only when dirty. The dependency graph is
//!
//! ```text
//! P   <- viewport size, camera
//! VM  <- V, M
//! PVM <- P, VM
//! N   <- VM
//! ```

use bitflags::bitflags;
use log::trace;

use super::primitives::Camera;
use crate::foundation::math::{Mat3, Mat4};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Dirty: u8 {
        const P = 1 << 0;
        const VM = 1 << 1;
        const PVM = 1 << 2;
        const N = 1 << 3;
    }
}

/// Matrices derived by the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedMatrix {
    /// Projection
    Projection,
    /// View * model
    ModelView,
    /// Projection * view * model
    ProjectionModelView,
    /// Inverse transpose of the upper 3x3 of VM
    Normal,
}

impl CachedMatrix {
    const fn index(self) -> usize {
        match self {
            Self::Projection => 0,
            Self::ModelView => 1,
            Self::ProjectionModelView => 2,
            Self::Normal => 3,
        }
    }

    const fn flag(self) -> Dirty {
        match self {
            Self::Projection => Dirty::P,
            Self::ModelView => Dirty::VM,
            Self::ProjectionModelView => Dirty::PVM,
            Self::Normal => Dirty::N,
        }
    }
}

/// Recompute counters
///
/// Every recompute is stamped with a global sequence number so the order
/// in which matrices were rebuilt can be checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeStats {
    counts: [u64; 4],
    stamps: [Option<u64>; 4],
    sequence: u64,
}

impl RecomputeStats {
    /// Number of times a matrix was recomputed
    pub const fn count(&self, matrix: CachedMatrix) -> u64 {
        self.counts[matrix.index()]
    }

    /// Recomputes across all matrices
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Sequence number of the last recompute of a matrix
    pub const fn last(&self, matrix: CachedMatrix) -> Option<u64> {
        self.stamps[matrix.index()]
    }

    fn record(&mut self, matrix: CachedMatrix) {
        self.sequence += 1;
        self.counts[matrix.index()] += 1;
        self.stamps[matrix.index()] = Some(self.sequence);
        trace!("MatrixCache: recomputed {:?}", matrix);
    }
}

/// Lazily recomputed P, VM, PVM and normal matrices
#[derive(Debug, Clone)]
pub struct MatrixCache {
    camera: Camera,
    width: u32,
    height: u32,
    model: Mat4,
    view: Mat4,
    projection: Mat4,
    model_view: Mat4,
    projection_model_view: Mat4,
    normal: Mat3,
    dirty: Dirty,
    stats: RecomputeStats,
}

impl MatrixCache {
    /// Create a cache for a camera and viewport; everything starts dirty
    pub fn new(camera: Camera, width: u32, height: u32) -> Self {
        Self {
            camera,
            width,
            height,
            model: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            model_view: Mat4::identity(),
            projection_model_view: Mat4::identity(),
            normal: Mat3::identity(),
            dirty: Dirty::all(),
            stats: RecomputeStats::default(),
        }
    }

    /// Set the model matrix; marks VM, PVM and N dirty
    pub fn set_model(&mut self, model: &Mat4) {
        self.model = *model;
        self.dirty |= Dirty::VM | Dirty::PVM | Dirty::N;
    }

    /// Set the view matrix; marks VM, PVM and N dirty
    pub fn set_view(&mut self, view: &Mat4) {
        self.view = *view;
        self.dirty |= Dirty::VM | Dirty::PVM | Dirty::N;
    }

    /// Replace the camera; marks P and PVM dirty
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.dirty |= Dirty::P | Dirty::PVM;
    }

    /// Change the viewport size; marks P and PVM dirty
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.dirty |= Dirty::P | Dirty::PVM;
    }

    /// Camera used for the projection
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Model matrix
    pub const fn model(&self) -> &Mat4 {
        &self.model
    }

    /// View matrix
    pub const fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Whether a matrix will be recomputed on its next read
    pub const fn is_dirty(&self, matrix: CachedMatrix) -> bool {
        self.dirty.contains(matrix.flag())
    }

    /// Recompute counters
    pub const fn stats(&self) -> &RecomputeStats {
        &self.stats
    }

    /// Reset the recompute counters
    pub fn reset_stats(&mut self) {
        self.stats = RecomputeStats::default();
    }

    /// Projection matrix
    pub fn projection(&mut self) -> Mat4 {
        self.update_projection();
        self.projection
    }

    /// View * model
    pub fn model_view(&mut self) -> Mat4 {
        self.update_model_view();
        self.model_view
    }

    /// Projection * view * model
    pub fn projection_model_view(&mut self) -> Mat4 {
        self.update_projection_model_view();
        self.projection_model_view
    }

    /// Normal matrix
    pub fn normal(&mut self) -> Mat3 {
        self.update_normal();
        self.normal
    }

    fn update_projection(&mut self) {
        if self.dirty.contains(Dirty::P) {
            self.projection = self.camera.projection_matrix(self.width, self.height);
            self.dirty.remove(Dirty::P);
            self.stats.record(CachedMatrix::Projection);
        }
    }

    fn update_model_view(&mut self) {
        if self.dirty.contains(Dirty::VM) {
            self.model_view = self.view * self.model;
            self.dirty.remove(Dirty::VM);
            self.stats.record(CachedMatrix::ModelView);
        }
    }

    fn update_projection_model_view(&mut self) {
        self.update_projection();
        self.update_model_view();
        if self.dirty.contains(Dirty::PVM) {
            self.projection_model_view = self.projection * self.model_view;
            self.dirty.remove(Dirty::PVM);
            self.stats.record(CachedMatrix::ProjectionModelView);
        }
    }

    fn update_normal(&mut self) {
        self.update_model_view();
        if self.dirty.contains(Dirty::N) {
            let upper: Mat3 = self.model_view.fixed_view::<3, 3>(0, 0).into_owned();
            self.normal = upper.try_inverse().map_or_else(Mat3::identity, |inverse| inverse.transpose());
            self.dirty.remove(Dirty::N);
            self.stats.record(CachedMatrix::Normal);
        }
    }
}
