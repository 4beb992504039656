#![no_std]

//! akmtastic - a self-calibrating electronic compass engine
//!
//! Turns raw tri-axis accelerometer and magnetometer samples into a
//! tilt-compensated orientation (azimuth, pitch, roll) and a calibrated
//! magnetic-field reading. Both sensors are calibrated continuously from
//! natural device motion: no factory calibration, no figure-eight prompt.
//!
//! # Features
//!
//! - Gravity-referenced accelerometer offset and gain calibration
//! - Hard-iron offset and soft-iron gain magnetometer calibration
//! - Tilt-compensated azimuth, cached until the next sample
//! - Calibration goodness percentage for user feedback
//! - Per-posture axis layouts for sliders and folding devices
//! - `#![no_std]`, no heap: fixed-capacity buffers only
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use akmtastic::Akmtastic;
//!
//! let mut engine = Akmtastic::new();
//! engine.start("/dev/akm8975").unwrap();
//!
//! // Raw counts with the driver's sensitivity divisor
//! engine.push_acceleration(Vector3::new(0.0, 0.0, 9.8), 720.0).unwrap();
//! // Field in µT with driver status and measurement period
//! engine.push_magnetic(Vector3::new(0.0, 20.0, -40.0), 1, 20).unwrap();
//!
//! let orientation = engine.orientation();
//! let (azimuth, pitch, roll) = (orientation.x, orientation.y, orientation.z);
//! assert!((azimuth - 90.0).abs() < 1e-3); // x axis points east
//! assert_eq!((pitch, roll), (0.0, 0.0));
//!
//! println!("calibration goodness: {}%", engine.calibration_goodness());
//! ```

mod accelerometer;
mod average;
pub mod calibration;
pub mod compass;
mod engine;
mod error;
mod layout;
mod magnetometer;
mod math;
mod types;

// Re-export all public types and functions
pub use accelerometer::{AccelCalibrator, ERROR, GRAVITY_SMOOTH, REFRESH};
pub use average::{MAX_WINDOW, RunningAverage};
pub use calibration::{Calibrator, Correction, SensorKind};
pub use compass::MIN_GRAVITY_NORM;
pub use engine::Akmtastic;
pub use error::{EngineError, Result};
pub use layout::{AxisLayout, FormFactor};
pub use magnetometer::{MAG_CAPACITY, MagCalibrator};
pub use math::{DEG_TO_RAD, Extent, RAD_TO_DEG, STANDARD_GRAVITY, Vector3Ext};
pub use types::*;
