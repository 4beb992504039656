//! Core types and settings for the akmtastic engine

use heapless::Vec;
use nalgebra::Vector3;

use crate::average::MAX_WINDOW;
use crate::layout::FormFactor;

/// Most form factors a device can declare
pub const MAX_FORM_FACTORS: usize = 4;

/// Numerator of the accelerometer unit conversion
///
/// Raw counts become m/s² as `raw * ACCELERATION_UNIT / sensitivity`. This is
/// a fixed property of the driver's input format, not a tunable.
pub const ACCELERATION_UNIT: f32 = 720.0;

/// Engine settings
///
/// Configuration parameters for the fusion engine: smoothing windows, the
/// weighting of the goodness metric, and the axis layouts of every device
/// posture.
///
/// # Example
/// ```
/// use akmtastic::{Akmtastic, AxisLayout, EngineSettings, FormFactor};
///
/// let mut settings = EngineSettings {
///     accelerometer_window: 8,      // heavier smoothing
///     accelerometer_weight: 0.25,   // goodness driven mostly by the compass
///     ..Default::default()
/// };
///
/// // Second posture: magnetometer flipped around z
/// let flipped = AxisLayout::from_matrix([[-1, 0, 0], [0, -1, 0], [0, 0, 1]]).unwrap();
/// settings
///     .form_factors
///     .push(FormFactor { accelerometer: AxisLayout::IDENTITY, magnetometer: flipped })
///     .unwrap();
///
/// let engine = Akmtastic::with_settings(settings);
/// assert_eq!(engine.settings().form_factors.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Moving-average window applied to accelerometer samples (1..=32)
    pub accelerometer_window: usize,
    /// Moving-average window applied to magnetometer samples (1..=32)
    ///
    /// Larger windows reduce jitter but delay the response to rotation,
    /// and slow down the spread of samples the magnetometer fit needs.
    pub magnetometer_window: usize,
    /// Share of the accelerometer calibrator in the goodness metric (0..=1)
    ///
    /// The magnetometer gets the remainder.
    pub accelerometer_weight: f32,
    /// Axis layouts, one entry per device posture
    ///
    /// Entry 0 is active after construction. An empty table behaves like a
    /// single identity entry.
    pub form_factors: Vec<FormFactor, MAX_FORM_FACTORS>,
}

impl EngineSettings {
    /// Window and weight values clamped into their supported ranges
    pub(crate) fn sanitized(mut self) -> Self {
        self.accelerometer_window = self.accelerometer_window.clamp(1, MAX_WINDOW);
        self.magnetometer_window = self.magnetometer_window.clamp(1, MAX_WINDOW);
        self.accelerometer_weight = if self.accelerometer_weight.is_finite() {
            self.accelerometer_weight.clamp(0.0, 1.0)
        } else {
            0.5
        };
        if self.form_factors.is_empty() {
            let _ = self.form_factors.push(FormFactor::default());
        }
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        let mut form_factors = Vec::new();
        let _ = form_factors.push(FormFactor::default());

        Self {
            accelerometer_window: 4,
            magnetometer_window: 4,
            accelerometer_weight: 0.5,
            form_factors,
        }
    }
}

/// Magnetometer status and measurement period as reported by the driver
///
/// The engine records these for the sensor adapter; they do not influence
/// the calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MagneticStatus {
    /// Driver status word of the last sample
    pub status: i32,
    /// Measurement period of the last sample
    pub period: i32,
}

/// Raw sensor sample as handed over by the hardware adapter
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use akmtastic::{Akmtastic, Sample};
///
/// let mut engine = Akmtastic::new();
/// engine.start("/dev/akm8975").unwrap();
///
/// let raw = Vector3::new(0.0, 0.0, 9.8);
/// engine.push(Sample::Acceleration { raw, sensitivity: 720.0 }).unwrap();
///
/// let raw = Vector3::new(20.0, 0.0, -40.0);
/// engine.push(Sample::Magnetic { raw, status: 3, period: 20 }).unwrap();
///
/// assert_eq!(engine.magnetic_status().status, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Accelerometer counts with their counts-per-unit divisor
    Acceleration { raw: Vector3<f32>, sensitivity: f32 },
    /// Magnetometer reading in µT with driver status and period
    Magnetic {
        raw: Vector3<f32>,
        status: i32,
        period: i32,
    },
}
