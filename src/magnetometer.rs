//! Magnetometer hard/soft-iron calibrator
//!
//! Unlike gravity, the local field magnitude is not known in advance, so
//! every sample is accepted. What makes the fit well posed is the spread of
//! directions the device sweeps through while it is carried around: once the
//! accumulated samples surround their centre, an axis-aligned ellipsoid is
//! fitted to them and mapped back onto a sphere.

use heapless::HistoryBuffer;
use log::trace;
use nalgebra::{ComplexField, Vector3};

use crate::calibration::Correction;
use crate::math::{Extent, Vector3Ext};

/// Number of field samples kept for fitting
pub const MAG_CAPACITY: usize = 48;

/// Fewest samples a fit is attempted with
const MIN_FIT_POINTS: usize = 8;

/// Octants the samples must occupy around their centre before a fit is attempted
const MIN_FIT_OCTANTS: u32 = 6;

/// Smallest field strength in µT a fit may describe; a resting device
/// produces a tight noise cluster, not a sphere
const MIN_FIELD_STRENGTH: f32 = 10.0;

/// Mean relative radius deviation at which fit consistency drops to zero
const RESIDUAL_TOLERANCE: f32 = 0.25;

/// Hard-iron offset and soft-iron gain calibrator
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use akmtastic::MagCalibrator;
///
/// let mut calibrator = MagCalibrator::new();
/// let offset = Vector3::new(12.0, -7.0, 20.0);
///
/// // Field of 40 uT seen along every axis, shifted by the hard-iron offset
/// for direction in [
///     Vector3::x(), -Vector3::x(), Vector3::y(), -Vector3::y(), Vector3::z(), -Vector3::z(),
///     Vector3::new(-1.0, -1.0, 1.0).normalize(), Vector3::new(1.0, -1.0, -1.0).normalize(),
/// ] {
///     calibrator.push(direction * 40.0 + offset);
/// }
///
/// assert_eq!(calibrator.correction().translation, -offset);
/// ```
#[derive(Debug, Clone)]
pub struct MagCalibrator {
    /// Last accepted correction
    correction: Correction,
    /// Most recent field samples
    samples: HistoryBuffer<Vector3<f32>, MAG_CAPACITY>,
}

impl MagCalibrator {
    pub fn new() -> Self {
        Self {
            correction: Correction::identity(),
            samples: HistoryBuffer::new(),
        }
    }

    /// Record a smoothed magnetometer sample and refit when the samples allow it
    pub fn push(&mut self, sample: Vector3<f32>) {
        self.samples.write(sample);
        self.refit();
    }

    /// Apply the current correction
    pub fn fix(&self, sample: Vector3<f32>) -> Vector3<f32> {
        self.correction.apply(sample)
    }

    /// Forget the recorded samples, keeping the last accepted correction
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Coverage of the corrected directions times consistency of their magnitudes
    pub fn quality(&self) -> f32 {
        let points = self.samples.as_slice();
        if points.is_empty() {
            return 0.0;
        }

        let coverage = octant_coverage(points.iter().map(|p| self.fix(*p))) as f32 / 8.0;
        coverage * consistency(points, &self.correction)
    }

    pub fn correction(&self) -> Correction {
        self.correction
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    /// Fit an axis-aligned ellipsoid to the recorded samples
    ///
    /// The centre of the bounding box is the hard-iron offset; each axis is
    /// scaled so its half-range matches the mean half-range.
    fn refit(&mut self) {
        let points = self.samples.as_slice();
        if points.len() < MIN_FIT_POINTS {
            return;
        }

        let Some(extent) = Extent::from_points(points) else {
            return;
        };

        let center = extent.center();
        if octant_coverage(points.iter().map(|p| p - center)) < MIN_FIT_OCTANTS {
            return;
        }

        let radius = extent.half_range();
        let mean_radius = radius.sum() / 3.0;
        if mean_radius < MIN_FIELD_STRENGTH {
            return;
        }

        let candidate = Correction::new(-center, radius.map(|r| mean_radius / r));

        if !candidate.is_well_conditioned() {
            trace!("magnetometer fit rejected: radius {:?}", radius);
            return;
        }

        // A partial sweep or a resting cluster yields a box that fits the
        // samples worse than the correction already in use
        if consistency(points, &candidate) < consistency(points, &self.correction) {
            return;
        }

        self.correction = candidate;
    }
}

impl Default for MagCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

/// How tightly `correction` maps `points` onto a sphere, in `[0, 1]`
///
/// One minus the mean relative deviation of the corrected magnitudes from
/// their mean, with `RESIDUAL_TOLERANCE` mapping to zero.
fn consistency(points: &[Vector3<f32>], correction: &Correction) -> f32 {
    if points.is_empty() {
        return 0.0;
    }

    let count = points.len() as f32;
    let mean = points.iter().map(|p| correction.apply(*p).magnitude()).sum::<f32>() / count;
    if !(mean > 0.0) {
        return 0.0;
    }

    let deviation = points
        .iter()
        .map(|p| (correction.apply(*p).magnitude() - mean).abs())
        .sum::<f32>()
        / count
        / mean;

    1.0 - (deviation / RESIDUAL_TOLERANCE).min(1.0)
}

/// Number of distinct sign octants visited by a set of directions
fn octant_coverage(directions: impl Iterator<Item = Vector3<f32>>) -> u32 {
    directions
        .fold(0u8, |visited, direction| visited | (1 << direction.octant()))
        .count_ones()
}
