//! Calibration corrections and the calibrator variants

use nalgebra::Vector3;

use crate::accelerometer::AccelCalibrator;
use crate::magnetometer::MagCalibrator;

/// Lower bound of an accepted per-axis scale; smaller fits are ill-conditioned
pub const MIN_SCALE: f32 = 0.5;
/// Upper bound of an accepted per-axis scale
pub const MAX_SCALE: f32 = 2.0;

/// Per-axis bias and gain correction
///
/// Applied as `(uncalibrated + translation) * scale`, component-wise.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use akmtastic::Correction;
///
/// let correction = Correction::new(Vector3::new(-10.0, 5.0, 0.0), Vector3::new(0.5, 1.0, 2.0));
/// let calibrated = correction.apply(Vector3::new(12.0, -5.0, 1.0));
/// assert_eq!(calibrated, Vector3::new(1.0, 0.0, 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Additive bias correction (hard-iron offset for the magnetometer)
    pub translation: Vector3<f32>,
    /// Multiplicative gain correction (soft-iron scale for the magnetometer)
    pub scale: Vector3<f32>,
}

impl Correction {
    /// Identity correction: leaves readings untouched
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn new(translation: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self { translation, scale }
    }

    /// Apply the correction to a reading
    #[inline]
    pub fn apply(&self, uncalibrated: Vector3<f32>) -> Vector3<f32> {
        (uncalibrated + self.translation).component_mul(&self.scale)
    }

    /// Whether every scale component is finite and inside `[MIN_SCALE, MAX_SCALE]`
    pub fn is_well_conditioned(&self) -> bool {
        self.translation.iter().all(|t| t.is_finite())
            && self
                .scale
                .iter()
                .all(|s| s.is_finite() && (MIN_SCALE..=MAX_SCALE).contains(s))
    }
}

impl Default for Correction {
    fn default() -> Self {
        Self::identity()
    }
}

/// Which sensor a calibrator serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Accelerometer,
    Magnetometer,
}

/// Self-calibrating correction for one sensor
///
/// Both variants share the same contract:
/// - `push` observes a smoothed sample and may refit the correction
/// - `fix` applies the current correction
/// - `reset` forgets observations but keeps the last accepted correction
/// - `quality` reports fit maturity in `[0, 1]`
#[derive(Debug, Clone)]
pub enum Calibrator {
    Accelerometer(AccelCalibrator),
    Magnetometer(MagCalibrator),
}

impl Calibrator {
    /// Fresh calibrator with identity correction for the given sensor
    pub fn new(kind: SensorKind) -> Self {
        match kind {
            SensorKind::Accelerometer => Self::Accelerometer(AccelCalibrator::new()),
            SensorKind::Magnetometer => Self::Magnetometer(MagCalibrator::new()),
        }
    }

    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Accelerometer(_) => SensorKind::Accelerometer,
            Self::Magnetometer(_) => SensorKind::Magnetometer,
        }
    }

    pub fn push(&mut self, sample: Vector3<f32>) {
        match self {
            Self::Accelerometer(calibrator) => calibrator.push(sample),
            Self::Magnetometer(calibrator) => calibrator.push(sample),
        }
    }

    pub fn fix(&self, sample: Vector3<f32>) -> Vector3<f32> {
        self.correction().apply(sample)
    }

    pub fn reset(&mut self) {
        match self {
            Self::Accelerometer(calibrator) => calibrator.reset(),
            Self::Magnetometer(calibrator) => calibrator.reset(),
        }
    }

    pub fn quality(&self) -> f32 {
        match self {
            Self::Accelerometer(calibrator) => calibrator.quality(),
            Self::Magnetometer(calibrator) => calibrator.quality(),
        }
    }

    pub fn correction(&self) -> Correction {
        match self {
            Self::Accelerometer(calibrator) => calibrator.correction(),
            Self::Magnetometer(calibrator) => calibrator.correction(),
        }
    }
}
