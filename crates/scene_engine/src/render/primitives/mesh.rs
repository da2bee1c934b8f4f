//! Uploaded mesh geometry

use crate::render::device::MeshHandle;
use crate::spatial::AxisAlignedBox;

/// Mesh geometry living on the GPU
///
/// Cheap to share between entities through an `Arc`. The local bounding
/// box becomes the entity's local bounding box when attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Mesh name
    pub name: String,
    /// Device handle of the uploaded geometry
    pub handle: MeshHandle,
    /// Object-space bounds
    pub local_bounding_box: AxisAlignedBox,
}

impl Mesh {
    /// Create a mesh record for already uploaded geometry
    pub fn new(name: impl Into<String>, handle: MeshHandle, local_bounding_box: AxisAlignedBox) -> Self {
        Self {
            name: name.into(),
            handle,
            local_bounding_box,
        }
    }
}
