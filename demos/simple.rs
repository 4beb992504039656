use akmtastic::Akmtastic;
use nalgebra::Vector3;

const SENSITIVITY: f32 = 720.0; // driver counts divisor, 720 means counts are already m/s²

fn main() {
    let mut engine = Akmtastic::new();
    engine.start("/dev/akm8975").expect("fresh engine always starts");

    for _ in 0..10 {
        // this loop should repeat each time new sensor data is available
        let accelerometer = Vector3::new(0.0, 0.0, 9.8); // actual accelerometer counts
        let magnetometer = Vector3::new(14.1, 14.1, -40.0); // actual field in µT

        engine.push_acceleration(accelerometer, SENSITIVITY).expect("engine is started");
        engine.push_magnetic(magnetometer, 1, 20).expect("engine is started");

        let orientation = engine.orientation();

        println!(
            "Azimuth: {:.2}, Pitch: {:.2}, Roll: {:.2}, Goodness: {}%",
            orientation.x,
            orientation.y,
            orientation.z,
            engine.calibration_goodness()
        );
    }
}
