//! Accelerometer gravity calibrator
//!
//! The accelerometer is calibrated against the one reference every device
//! carries: gravity. A long-term exponential average estimates the gravity
//! vector; when a new sample agrees with it in both magnitude and direction
//! the device is assumed to be at rest, and the estimate is folded into a
//! sphere fit that maps every trusted point onto standard gravity.

use heapless::HistoryBuffer;
use log::debug;
use nalgebra::{ComplexField, Vector3};

use crate::calibration::Correction;
use crate::math::{Extent, STANDARD_GRAVITY};

/// Number of trusted gravity estimates kept for fitting
pub const REFRESH: usize = 10;

/// Demand length to match with the long-term average before the vector is
/// trusted to represent gravity. Directions must agree to `acos(1 - ERROR)`.
pub const ERROR: f32 = 0.05;

/// Exponential average applied on acceleration to estimate gravity
pub const GRAVITY_SMOOTH: f32 = 0.8;

/// Trusted span an axis must cover before its offset and gain are fitted,
/// i.e. the axis has been seen pointing close to straight up and straight down
const AXIS_SPAN: f32 = 1.8 * STANDARD_GRAVITY;

/// Share of gravity² the unresolved axes must carry before their common gain is solved
const FREE_SHARE: f32 = 0.25;

/// Gravity-referenced accelerometer calibrator
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use akmtastic::AccelCalibrator;
///
/// let mut calibrator = AccelCalibrator::new();
/// let at_rest = Vector3::new(0.0, 0.0, 9.8);
///
/// for _ in 0..60 {
///     calibrator.push(at_rest);
/// }
///
/// assert_eq!(calibrator.quality(), 1.0);
/// assert!((calibrator.fix(at_rest).z - 9.80665).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct AccelCalibrator {
    /// Last accepted correction
    correction: Correction,
    /// Long-term gravity estimate
    gravity: Vector3<f32>,
    /// Most recent trusted gravity estimates
    trusted: HistoryBuffer<Vector3<f32>, REFRESH>,
    /// Per-axis extremes of every trusted estimate since the last reset
    extent: Option<Extent>,
}

impl AccelCalibrator {
    pub fn new() -> Self {
        Self {
            correction: Correction::identity(),
            gravity: Vector3::zeros(),
            trusted: HistoryBuffer::new(),
            extent: None,
        }
    }

    /// Observe a smoothed accelerometer sample in m/s²
    pub fn push(&mut self, sample: Vector3<f32>) {
        self.gravity = self.gravity * GRAVITY_SMOOTH + sample * (1.0 - GRAVITY_SMOOTH);

        // sample and gravity must have about the same length and point in
        // about the same direction before the gravity estimate is trusted
        let sample_length = sample.magnitude();
        let gravity_length = self.gravity.magnitude();

        if sample_length == 0.0 || gravity_length == 0.0 {
            return;
        }

        let sample_direction = sample / sample_length;
        let gravity_direction = self.gravity / gravity_length;

        if (sample_length - gravity_length).abs() < ERROR
            && sample_direction.dot(&gravity_direction) > 1.0 - ERROR
        {
            self.accept(self.gravity);
        }
    }

    /// Apply the current correction
    pub fn fix(&self, sample: Vector3<f32>) -> Vector3<f32> {
        self.correction.apply(sample)
    }

    /// Forget the gravity estimate and the trusted points
    ///
    /// The last accepted correction stays in place until a new fit replaces
    /// it, so a forced recalibration re-verifies instead of blanking the device.
    pub fn reset(&mut self) {
        self.gravity = Vector3::zeros();
        self.trusted.clear();
        self.extent = None;
    }

    /// Fraction of the `REFRESH` slots holding points consistent with the current correction
    pub fn quality(&self) -> f32 {
        let consistent = self
            .trusted
            .as_slice()
            .iter()
            .filter(|point| self.is_consistent(**point))
            .count();

        consistent as f32 / REFRESH as f32
    }

    pub fn correction(&self) -> Correction {
        self.correction
    }

    /// Current long-term gravity estimate (uncorrected)
    pub fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    /// Number of trusted points currently held
    pub fn trusted_len(&self) -> usize {
        self.trusted.len()
    }

    fn is_consistent(&self, point: Vector3<f32>) -> bool {
        let magnitude = self.correction.apply(point).magnitude();
        (magnitude - STANDARD_GRAVITY).abs() < ERROR * STANDARD_GRAVITY
    }

    fn accept(&mut self, gravity: Vector3<f32>) {
        self.trusted.write(gravity);
        self.extent = Some(match self.extent {
            Some(mut extent) => {
                extent.include(gravity);
                extent
            }
            None => Extent::from_point(gravity),
        });

        self.refit();
    }

    /// Refit translation and scale so trusted points land on standard gravity
    ///
    /// Axes whose trusted span covers both extremes get an independent
    /// min/max sphere fit. The remaining axes keep their translation and
    /// their gains are rescaled by one factor, solved on squared magnitude
    /// over the trusted points.
    fn refit(&mut self) {
        let Some(extent) = self.extent else {
            return;
        };

        let span = extent.span();
        let center = extent.center();
        let mut translation = self.correction.translation;
        let mut scale = self.correction.scale;
        let mut resolved = [false; 3];

        for axis in 0..3 {
            if span[axis] >= AXIS_SPAN {
                translation[axis] = -center[axis];
                scale[axis] = 2.0 * STANDARD_GRAVITY / span[axis];
                resolved[axis] = true;
            }
        }

        if resolved.contains(&false) {
            let mut fixed = 0.0;
            let mut free = 0.0;

            for point in self.trusted.as_slice() {
                let corrected = (point + translation).component_mul(&scale);
                for axis in 0..3 {
                    let square = corrected[axis] * corrected[axis];
                    if resolved[axis] {
                        fixed += square;
                    } else {
                        free += square;
                    }
                }
            }

            let count = self.trusted.len() as f32;
            let (fixed, free) = (fixed / count, free / count);
            let target = STANDARD_GRAVITY * STANDARD_GRAVITY;

            // Too little signal on the unresolved axes keeps their previous gain.
            // Otherwise their gains move by one common factor, keeping their ratios
            if free >= FREE_SHARE * target {
                // Negative under the root yields NaN, rejected below
                let factor = ((target - fixed) / free).sqrt();
                for axis in (0..3).filter(|&axis| !resolved[axis]) {
                    scale[axis] *= factor;
                }
            }
        }

        let candidate = Correction::new(translation, scale);
        if candidate.is_well_conditioned() {
            self.correction = candidate;
        } else {
            debug!(
                "accelerometer fit rejected: translation {:?}, scale {:?}",
                candidate.translation, candidate.scale
            );
        }
    }
}

impl Default for AccelCalibrator {
    fn default() -> Self {
        Self::new()
    }
}
