//! Resources an entity can carry: mesh, material, light and camera

pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;

pub use camera::{Camera, ProjectionType};
pub use light::{Light, LightType};
pub use material::{Material, MaterialFlags};
pub use mesh::Mesh;
