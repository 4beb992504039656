//! Vector helpers and numeric constants shared by the calibrators and the compass

use nalgebra::Vector3;

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Standard gravity in m/s², the magnitude every trusted accelerometer point is fitted to
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// Sign octant of the vector as a 3-bit index (bit set = negative component)
    fn octant(&self) -> u8;

    /// True when every component is finite
    fn is_finite(&self) -> bool;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = self.magnitude();
        if mag > 0.0 {
            *self / mag
        } else {
            Vector3::zeros()
        }
    }

    fn octant(&self) -> u8 {
        u8::from(self.x < 0.0) | (u8::from(self.y < 0.0) << 1) | (u8::from(self.z < 0.0) << 2)
    }

    fn is_finite(&self) -> bool {
        self.iter().all(|c| c.is_finite())
    }
}

/// Per-axis bounding box of a point set
///
/// Both calibrators fit their corrections from the per-axis extremes of the
/// samples they have accepted: the centre estimates the offset and the
/// half-range estimates the gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Extent {
    /// Extent of a single point
    pub fn from_point(point: Vector3<f32>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Extent of a point set, `None` when the set is empty
    pub fn from_points(points: &[Vector3<f32>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut extent = Self::from_point(*first);
        for point in rest {
            extent.include(*point);
        }
        Some(extent)
    }

    /// Widen the extent to include `point`
    pub fn include(&mut self, point: Vector3<f32>) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.max + self.min) * 0.5
    }

    pub fn span(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn half_range(&self) -> Vector3<f32> {
        self.span() * 0.5
    }
}
