//! Axis-aligned bounding boxes

use crate::foundation::math::Vec3;

/// Axis-aligned bounding box
///
/// All predicates treat the box as closed: touching faces intersect, and a
/// box contains itself.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AxisAlignedBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for AxisAlignedBox {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

impl AxisAlignedBox {
    /// Create a new box from min and max corners
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create the smallest box containing both points, in any order
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Create a box centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// An inverted box that any `expand_to_include` call will overwrite
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Whether `min <= max` holds on every axis
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Grow the box so that it contains `point`
    pub fn expand_to_include(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the full size of the box along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Smallest side length
    pub fn min_extent(&self) -> f32 {
        self.size().min()
    }

    /// Check if this box fully contains another box
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x && other.max.x <= self.max.x &&
        self.min.y <= other.min.y && other.max.y <= self.max.y &&
        self.min.z <= other.min.z && other.max.z <= self.max.z
    }

    /// Check if this box intersects another box
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// The box moved by `offset`
    #[must_use]
    pub fn translated(&self, offset: &Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Bounds of one of the eight octants of this box
    ///
    /// Bit 0 of `index` selects the upper half along X, bit 1 along Y and
    /// bit 2 along Z.
    pub fn octant(&self, index: usize) -> Self {
        let center = self.center();
        let mut min = self.min;
        let mut max = center;
        for axis in 0..3 {
            if index & (1 << axis) != 0 {
                min[axis] = center[axis];
                max[axis] = self.max[axis];
            }
        }
        Self { min, max }
    }

    /// Index of the octant that fully contains `other`, if any
    ///
    /// Only meaningful when `self` contains `other`. A box lying exactly on
    /// a split plane is assigned to the lower half.
    pub fn octant_containing(&self, other: &Self) -> Option<usize> {
        let center = self.center();
        let mut index = 0;
        for axis in 0..3 {
            if other.min[axis] >= center[axis] && other.max[axis] > center[axis] {
                index |= 1 << axis;
            } else if other.max[axis] > center[axis] {
                return None;
            }
        }
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f32, y: f32, z: f32) -> AxisAlignedBox {
        AxisAlignedBox::from_center_extents(Vec3::new(x, y, z), Vec3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_contains_and_intersects() {
        let outer = AxisAlignedBox::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0));
        let inner = unit_box_at(1.0, 2.0, 3.0);
        let straddling = unit_box_at(10.0, 0.0, 0.0);
        let outside = unit_box_at(20.0, 0.0, 0.0);

        assert!(outer.contains(&inner));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&straddling));
        assert!(outer.intersects(&straddling));
        assert!(!outer.intersects(&outside));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn test_touching_faces_intersect() {
        let a = AxisAlignedBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let b = AxisAlignedBox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_octants_cover_box() {
        let b = AxisAlignedBox::new(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(2.0, 2.0, 2.0));
        let low = b.octant(0);
        let high = b.octant(7);
        assert_eq!(low.min, Vec3::new(-2.0, -2.0, -2.0));
        assert_eq!(low.max, Vec3::zeros());
        assert_eq!(high.min, Vec3::zeros());
        assert_eq!(high.max, Vec3::new(2.0, 2.0, 2.0));

        let mixed = b.octant(0b101);
        assert_eq!(mixed.min, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(mixed.max, Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn test_octant_containing() {
        let b = AxisAlignedBox::new(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(2.0, 2.0, 2.0));
        let small = unit_box_at(1.0, -1.0, 1.0);
        let index = b.octant_containing(&small);
        assert_eq!(index, Some(0b101));
        assert!(b.octant(0b101).contains(&small));

        let straddling = unit_box_at(0.0, 1.0, 1.0);
        assert_eq!(b.octant_containing(&straddling), None);
    }

    #[test]
    fn test_empty_box_expands() {
        let mut b = AxisAlignedBox::empty();
        assert!(!b.is_valid());
        b.expand_to_include(&Vec3::new(1.0, -1.0, 0.0));
        b.expand_to_include(&Vec3::new(-1.0, 2.0, 3.0));
        assert!(b.is_valid());
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_translated() {
        let b = unit_box_at(0.0, 0.0, 0.0).translated(&Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(b.center(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(b.min_extent(), 1.0);
    }
}
