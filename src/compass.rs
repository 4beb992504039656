//! Tilt-compensated compass
//!
//! Body frame: x forward, y left, z up. A device lying flat reads `+g` on z.
//! Azimuth is the clockwise heading of the x axis from magnetic north.

use nalgebra::{ComplexField, RealField, Vector3};

use crate::math::{RAD_TO_DEG, STANDARD_GRAVITY, Vector3Ext};

/// Gravity magnitude below which tilt is undefined (free fall, no data yet)
pub const MIN_GRAVITY_NORM: f32 = 0.1 * STANDARD_GRAVITY;

/// Pitch and roll in radians from a gravity reading
///
/// `pitch = atan2(-a.x, sqrt(a.y² + a.z²))`, `roll = atan2(a.y, a.z)`.
/// Returns `None` when the reading is too short or not finite.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use akmtastic::compass::tilt;
///
/// let (pitch, roll) = tilt(Vector3::new(0.0, 0.0, 9.8)).unwrap();
/// assert_eq!((pitch, roll), (0.0, 0.0));
/// assert!(tilt(Vector3::zeros()).is_none());
/// ```
pub fn tilt(accelerometer: Vector3<f32>) -> Option<(f32, f32)> {
    if !accelerometer.is_finite() || accelerometer.magnitude() < MIN_GRAVITY_NORM {
        return None;
    }

    let a = accelerometer;
    let pitch = (-a.x).atan2((a.y * a.y + a.z * a.z).sqrt());
    let roll = a.y.atan2(a.z);

    Some((pitch, roll))
}

/// Tilt-compensated azimuth in degrees, `[0, 360)`
///
/// The field is derotated by roll, then pitch, into the horizontal plane.
/// Returns `None` when the horizontal component vanishes (field along
/// gravity) or the inputs are not finite.
pub fn azimuth(magnetometer: Vector3<f32>, pitch: f32, roll: f32) -> Option<f32> {
    if !magnetometer.is_finite() || !pitch.is_finite() || !roll.is_finite() {
        return None;
    }

    let m = magnetometer;
    let (sin_pitch, cos_pitch) = pitch.sin_cos();
    let (sin_roll, cos_roll) = roll.sin_cos();

    let xh = m.x * cos_pitch + m.y * sin_roll * sin_pitch + m.z * cos_roll * sin_pitch;
    let yh = m.y * cos_roll - m.z * sin_roll;

    if xh == 0.0 && yh == 0.0 {
        return None;
    }

    Some(normalize_azimuth(yh.atan2(xh) * RAD_TO_DEG))
}

/// Wrap an angle in degrees into `[0, 360)`
pub fn normalize_azimuth(degrees: f32) -> f32 {
    let mut wrapped = degrees % 360.0;
    if wrapped < 0.0 {
        wrapped += 360.0;
    }
    // Tiny negative inputs round up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Orientation `(azimuth, pitch, roll)` in degrees
///
/// Falls back to `previous` when tilt is undefined, and keeps the previous
/// azimuth when only the heading is undefined.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use akmtastic::compass::orientation;
///
/// // Flat, x axis pointing east: the field runs along +y and down
/// let accel = Vector3::new(0.0, 0.0, 9.8);
/// let mag = Vector3::new(0.0, 20.0, -40.0);
///
/// let angles = orientation(accel, mag, Vector3::zeros());
/// assert!((angles.x - 90.0).abs() < 1e-4);
/// ```
pub fn orientation(
    accelerometer: Vector3<f32>,
    magnetometer: Vector3<f32>,
    previous: Vector3<f32>,
) -> Vector3<f32> {
    let Some((pitch, roll)) = tilt(accelerometer) else {
        return previous;
    };

    let heading = azimuth(magnetometer, pitch, roll).unwrap_or(previous.x);

    Vector3::new(heading, pitch * RAD_TO_DEG, roll * RAD_TO_DEG)
}
