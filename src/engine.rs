//! Fusion engine: raw samples in, calibrated orientation out

use log::{debug, info, warn};
use nalgebra::{ComplexField, Vector3};

use crate::average::RunningAverage;
use crate::calibration::{Calibrator, SensorKind};
use crate::compass;
use crate::error::{EngineError, Result};
use crate::layout::{AxisLayout, FormFactor};
use crate::math::Vector3Ext;
use crate::types::{ACCELERATION_UNIT, EngineSettings, MagneticStatus, Sample};

/// Smoothing, calibration and last corrected value of one sensor
#[derive(Debug, Clone)]
struct Channel {
    average: RunningAverage,
    calibrator: Calibrator,
    /// Last corrected body-frame vector
    value: Vector3<f32>,
}

impl Channel {
    fn new(kind: SensorKind, window: usize) -> Self {
        Self {
            average: RunningAverage::new(window),
            calibrator: Calibrator::new(kind),
            value: Vector3::zeros(),
        }
    }

    /// Smooth and calibrate in the sensor frame, store the corrected result in the body frame
    fn push(&mut self, sensor: Vector3<f32>, layout: AxisLayout) {
        let smoothed = self.average.push(sensor);
        self.calibrator.push(smoothed);
        self.value = layout.remap(self.calibrator.fix(smoothed));
    }
}

/// Accelerometer + magnetometer fusion engine
///
/// Owns one smoothing filter and one self-calibrator per sensor. Every push
/// smooths the raw sample, lets the calibrator refine its correction and
/// caches the corrected vector remapped into the body frame of the active
/// form factor. Calibration lives in the sensor frame, so it carries over
/// unchanged when the device switches posture. Orientation is derived from
/// both cached vectors on demand and cached until the next push.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use akmtastic::Akmtastic;
///
/// let mut engine = Akmtastic::new();
/// engine.start("/dev/compass").unwrap();
///
/// // Device flat on the table, x axis towards magnetic north
/// for _ in 0..10 {
///     engine.push_acceleration(Vector3::new(0.0, 0.0, 9.8), 720.0).unwrap();
/// }
/// engine.push_magnetic(Vector3::new(20.0, 0.0, -40.0), 1, 20).unwrap();
///
/// let orientation = engine.orientation();
/// assert_eq!(orientation, Vector3::new(0.0, 0.0, 0.0));
/// ```
#[derive(Debug)]
pub struct Akmtastic {
    /// Engine settings, sanitised
    settings: EngineSettings,
    accelerometer: Channel,
    magnetometer: Channel,
    /// Cached `(azimuth, pitch, roll)` in degrees
    orientation: Vector3<f32>,
    /// Orientation must be recomputed before it is read
    dirty: bool,
    started: bool,
    /// Index into `settings.form_factors`
    form_factor: usize,
    /// Driver status of the last magnetometer sample
    magnetic_status: MagneticStatus,
}

impl Akmtastic {
    /// Create a new engine with default settings
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    /// Create a new engine with the given settings
    pub fn with_settings(settings: EngineSettings) -> Self {
        let settings = settings.sanitized();

        Self {
            accelerometer: Channel::new(SensorKind::Accelerometer, settings.accelerometer_window),
            magnetometer: Channel::new(SensorKind::Magnetometer, settings.magnetometer_window),
            settings,
            orientation: Vector3::zeros(),
            dirty: false,
            started: false,
            form_factor: 0,
            magnetic_status: MagneticStatus::default(),
        }
    }

    /// Current settings
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Replace the settings
    ///
    /// Calibration state survives. Smoothing windows that change restart
    /// their average; an active form factor missing from the new table
    /// falls back to entry 0.
    pub fn set_settings(&mut self, settings: EngineSettings) {
        let settings = settings.sanitized();

        if settings.accelerometer_window != self.settings.accelerometer_window {
            self.accelerometer.average = RunningAverage::new(settings.accelerometer_window);
        }
        if settings.magnetometer_window != self.settings.magnetometer_window {
            self.magnetometer.average = RunningAverage::new(settings.magnetometer_window);
        }

        let active = self.settings.form_factors.get(self.form_factor);
        if settings.form_factors.get(self.form_factor) != active {
            self.form_factor = self.form_factor.min(settings.form_factors.len() - 1);
            self.accelerometer.average.reset();
            self.magnetometer.average.reset();
            self.dirty = true;
        }

        self.settings = settings;
    }

    /// Begin a sensor session
    ///
    /// `path` names the device the adapter reads from; it is only logged.
    pub fn start(&mut self, path: &str) -> Result<()> {
        if self.started {
            return Err(EngineError::AlreadyStarted);
        }

        info!("compass session started on {}", path);
        self.started = true;
        Ok(())
    }

    /// End the sensor session
    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Err(EngineError::NotStarted);
        }

        info!("compass session stopped");
        self.started = false;
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Ingest a raw accelerometer sample
    ///
    /// # Arguments
    /// * `raw` - Accelerometer counts in the sensor frame
    /// * `sensitivity` - Counts divisor; `raw * 720 / sensitivity` yields m/s²
    pub fn push_acceleration(&mut self, raw: Vector3<f32>, sensitivity: f32) -> Result<()> {
        self.ensure_started()?;

        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            return Err(EngineError::InvalidSensitivity(sensitivity));
        }

        let converted = raw * (ACCELERATION_UNIT / sensitivity);
        if !converted.is_finite() {
            warn!("dropping non-finite accelerometer sample {:?}", raw);
            return Ok(());
        }

        let layout = self.current_form_factor().accelerometer;
        self.accelerometer.push(converted, layout);
        self.dirty = true;
        Ok(())
    }

    /// Ingest a magnetometer sample
    ///
    /// # Arguments
    /// * `raw` - Field in µT in the sensor frame
    /// * `status` - Driver status word, recorded for the adapter
    /// * `period` - Measurement period, recorded for the adapter
    pub fn push_magnetic(&mut self, raw: Vector3<f32>, status: i32, period: i32) -> Result<()> {
        self.ensure_started()?;

        self.magnetic_status = MagneticStatus { status, period };

        if !raw.is_finite() {
            warn!("dropping non-finite magnetometer sample {:?}", raw);
            return Ok(());
        }

        let layout = self.current_form_factor().magnetometer;
        self.magnetometer.push(raw, layout);
        self.dirty = true;
        Ok(())
    }

    /// Ingest either kind of sample
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        match sample {
            Sample::Acceleration { raw, sensitivity } => self.push_acceleration(raw, sensitivity),
            Sample::Magnetic { raw, status, period } => self.push_magnetic(raw, status, period),
        }
    }

    /// Orientation `(azimuth, pitch, roll)` in degrees
    ///
    /// Azimuth is in `[0, 360)`, pitch in `[-90, 90]`, roll in `[-180, 180]`.
    /// Recomputed only after a push; when the corrected gravity is unusable
    /// the last valid orientation is returned.
    pub fn orientation(&mut self) -> Vector3<f32> {
        if self.dirty {
            self.orientation = compass::orientation(
                self.accelerometer.value,
                self.magnetometer.value,
                self.orientation,
            );
            self.dirty = false;
        }

        self.orientation
    }

    /// Last calibrated magnetic field in µT, body frame
    pub fn magnetic(&self) -> Vector3<f32> {
        self.magnetometer.value
    }

    /// Last calibrated acceleration in m/s², body frame
    pub fn acceleration(&self) -> Vector3<f32> {
        self.accelerometer.value
    }

    /// Combined calibration quality as a percentage
    pub fn calibration_goodness(&self) -> u32 {
        let weight = self.settings.accelerometer_weight;
        let quality = weight * self.accelerometer.calibrator.quality()
            + (1.0 - weight) * self.magnetometer.calibrator.quality();

        (quality * 100.0).round().clamp(0.0, 100.0) as u32
    }

    /// Restart accelerometer calibration
    ///
    /// The current correction stays in use until a new fit replaces it.
    /// Magnetometer calibration is left alone.
    pub fn recalibrate(&mut self) {
        debug!("accelerometer recalibration requested");
        self.accelerometer.calibrator.reset();
    }

    /// Switch to another device posture
    pub fn change_form_factor(&mut self, index: usize) -> Result<()> {
        let count = self.settings.form_factors.len();
        if index >= count {
            return Err(EngineError::InvalidFormFactor { index, count });
        }

        debug!("form factor {} -> {}", self.form_factor, index);
        self.form_factor = index;
        // Samples from different postures must not be averaged together
        self.accelerometer.average.reset();
        self.magnetometer.average.reset();
        self.dirty = true;
        Ok(())
    }

    /// Index of the active form factor
    pub fn form_factor(&self) -> usize {
        self.form_factor
    }

    /// Status and period of the last magnetometer sample
    pub fn magnetic_status(&self) -> MagneticStatus {
        self.magnetic_status
    }

    /// Accelerometer calibrator; its correction applies in the sensor frame
    pub fn accelerometer_calibrator(&self) -> &Calibrator {
        &self.accelerometer.calibrator
    }

    /// Magnetometer calibrator; its correction applies in the sensor frame
    pub fn magnetometer_calibrator(&self) -> &Calibrator {
        &self.magnetometer.calibrator
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(EngineError::NotStarted)
        }
    }

    fn current_form_factor(&self) -> FormFactor {
        // Sanitised settings always hold at least one entry
        self.settings
            .form_factors
            .get(self.form_factor)
            .copied()
            .unwrap_or_default()
    }
}

impl Default for Akmtastic {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Akmtastic {
    fn drop(&mut self) {
        if self.started {
            let _ = self.stop();
        }
    }
}
