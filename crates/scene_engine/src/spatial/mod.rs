//! Spatial partitioning and bounding volumes
//!
//! The octree indexes scene entities by their global bounding boxes and
//! answers "what overlaps this box?" queries.

pub mod aabb;
pub mod octree;

pub use aabb::AxisAlignedBox;
pub use octree::{EraseOutcome, Octree, OctreeEntry, OctreeNode, OctreeNodeId};
