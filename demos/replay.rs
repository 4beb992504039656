//! Compass session replay
//!
//! Feeds a recorded accelerometer + magnetometer session through the engine
//! and charts what it produces while the calibration converges.
//!
//! Features demonstrated:
//! - Raw accelerometer counts with a driver sensitivity divisor
//! - Magnetometer status and period passed through from the driver
//! - Calibration goodness while the device is moved around
//! - Calibrated orientation against the recorded reference heading
//!
//! Run with: `cargo run --example replay`

use akmtastic::{Akmtastic, EngineSettings};
use nalgebra::Vector3;
use plotters::prelude::*;
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize)]
struct SensorData {
    #[serde(rename = "Time (s)")]
    time: f32,
    #[serde(rename = "Accelerometer X (counts)")]
    accel_x: f32,
    #[serde(rename = "Accelerometer Y (counts)")]
    accel_y: f32,
    #[serde(rename = "Accelerometer Z (counts)")]
    accel_z: f32,
    #[serde(rename = "Sensitivity")]
    sensitivity: f32,
    #[serde(rename = "Magnetometer X (uT)")]
    mag_x: f32,
    #[serde(rename = "Magnetometer Y (uT)")]
    mag_y: f32,
    #[serde(rename = "Magnetometer Z (uT)")]
    mag_z: f32,
    #[serde(rename = "Status")]
    status: i32,
    #[serde(rename = "Period (ms)")]
    period: i32,
    #[serde(rename = "Heading (deg)")]
    heading: Option<f32>,
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("Compass replay - self-calibration from natural motion");

    let mut reader = csv::Reader::from_path("testdata/compass_session.csv")?;
    let mut sensor_data = Vec::new();

    for result in reader.deserialize() {
        let record: SensorData = result?;
        sensor_data.push(record);
    }

    let settings = EngineSettings {
        accelerometer_window: 4, // 200 ms at 20 Hz
        magnetometer_window: 4,
        accelerometer_weight: 0.5, // goodness weighs both sensors equally
        ..Default::default()
    };
    let mut engine = Akmtastic::with_settings(settings);
    engine.start("testdata/compass_session.csv")?;

    println!("Processing {} sensor samples...", sensor_data.len());

    let mut orientations = Vec::with_capacity(sensor_data.len());
    let mut goodness = Vec::with_capacity(sensor_data.len());

    for (i, data) in sensor_data.iter().enumerate() {
        let accelerometer = Vector3::new(data.accel_x, data.accel_y, data.accel_z);
        let magnetometer = Vector3::new(data.mag_x, data.mag_y, data.mag_z);

        engine.push_acceleration(accelerometer, data.sensitivity)?;
        engine.push_magnetic(magnetometer, data.status, data.period)?;

        let orientation = engine.orientation();
        orientations.push(orientation);
        goodness.push(engine.calibration_goodness() as f32);

        if i % 100 == 0 {
            println!(
                "t={:5.2}s: azimuth={:6.1}° pitch={:5.1}° roll={:6.1}° goodness={}%",
                data.time,
                orientation.x,
                orientation.y,
                orientation.z,
                engine.calibration_goodness()
            );
        }
    }

    engine.stop()?;

    let magnetometer = engine.magnetometer_calibrator().correction();
    let accelerometer = engine.accelerometer_calibrator().correction();
    println!(
        "Magnetometer hard iron: ({:.2}, {:.2}, {:.2}) µT",
        -magnetometer.translation.x, -magnetometer.translation.y, -magnetometer.translation.z
    );
    println!(
        "Accelerometer offset: ({:.3}, {:.3}, {:.3}) m/s², gain: ({:.3}, {:.3}, {:.3})",
        accelerometer.translation.x,
        accelerometer.translation.y,
        accelerometer.translation.z,
        accelerometer.scale.x,
        accelerometer.scale.y,
        accelerometer.scale.z
    );

    println!("Generating replay plots...");
    create_plots(&sensor_data, &orientations, &goodness)?;

    println!("✓ Plots saved to replay_plots.png");
    Ok(())
}

/// Three stacked panels: azimuth with reference, pitch and roll, goodness
fn create_plots(
    sensor_data: &[SensorData],
    orientations: &[Vector3<f32>],
    goodness: &[f32],
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new("replay_plots.png", (1000, 900)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((3, 1));
    let (Some(first), Some(last)) = (sensor_data.first(), sensor_data.last()) else {
        return Err("empty session".into());
    };
    let time_range = first.time..last.time;

    // 1. Azimuth
    let mut azimuth_chart = ChartBuilder::on(&panels[0])
        .caption("Azimuth, Tilt and Calibration Goodness", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(0)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range.clone(), 0f32..360f32)?;

    azimuth_chart.configure_mesh().y_desc("Degrees").draw()?;

    azimuth_chart
        .draw_series(LineSeries::new(
            sensor_data
                .iter()
                .zip(orientations.iter())
                .map(|(d, o)| (d.time, o.x)),
            &BLUE,
        ))?
        .label("Azimuth")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLUE));

    azimuth_chart
        .draw_series(sensor_data.iter().filter_map(|d| {
            d.heading
                .map(|heading| Circle::new((d.time, heading), 1, BLACK.filled()))
        }))?
        .label("Reference")
        .legend(|(x, y)| Circle::new((x + 5, y), 2, BLACK.filled()));

    azimuth_chart.configure_series_labels().draw()?;

    // 2. Pitch and roll
    let mut tilt_chart = ChartBuilder::on(&panels[1])
        .margin(5)
        .x_label_area_size(0)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range.clone(), -180f32..180f32)?;

    tilt_chart.configure_mesh().y_desc("Degrees").draw()?;

    tilt_chart
        .draw_series(LineSeries::new(
            sensor_data
                .iter()
                .zip(orientations.iter())
                .map(|(d, o)| (d.time, o.y)),
            &GREEN,
        ))?
        .label("Pitch")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], GREEN));

    tilt_chart
        .draw_series(LineSeries::new(
            sensor_data
                .iter()
                .zip(orientations.iter())
                .map(|(d, o)| (d.time, o.z)),
            &RED,
        ))?
        .label("Roll")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RED));

    tilt_chart.configure_series_labels().draw()?;

    // 3. Goodness
    let mut goodness_chart = ChartBuilder::on(&panels[2])
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range, 0f32..100f32)?;

    goodness_chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Percent")
        .draw()?;

    goodness_chart
        .draw_series(LineSeries::new(
            sensor_data
                .iter()
                .zip(goodness.iter())
                .map(|(d, g)| (d.time, *g)),
            &RGBColor(255, 165, 0), // orange
        ))?
        .label("Calibration goodness")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RGBColor(255, 165, 0)));

    goodness_chart.configure_series_labels().draw()?;

    root.present()?;
    Ok(())
}
