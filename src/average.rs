//! Moving-average smoothing applied to raw samples before calibration

use heapless::Deque;
use nalgebra::Vector3;

/// Largest supported smoothing window
pub const MAX_WINDOW: usize = 32;

/// Fixed-window moving average over the most recent samples
///
/// Smoothing runs before the calibrators so that single-sample jitter cannot
/// defeat the accelerometer trust gate. Until the window fills, the output is
/// the mean of the samples seen so far, so the first output equals the first
/// input.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use akmtastic::RunningAverage;
///
/// let mut average = RunningAverage::new(2);
/// average.push(Vector3::new(0.0, 0.0, 2.0));
/// let smoothed = average.push(Vector3::new(0.0, 0.0, 4.0));
/// assert_eq!(smoothed, Vector3::new(0.0, 0.0, 3.0));
/// ```
#[derive(Debug, Clone)]
pub struct RunningAverage {
    window: usize,
    samples: Deque<Vector3<f32>, MAX_WINDOW>,
}

impl RunningAverage {
    /// Create an average over `window` samples, clamped to `1..=MAX_WINDOW`
    pub fn new(window: usize) -> Self {
        Self {
            window: window.clamp(1, MAX_WINDOW),
            samples: Deque::new(),
        }
    }

    /// Add a sample and return the smoothed value
    pub fn push(&mut self, sample: Vector3<f32>) -> Vector3<f32> {
        while self.samples.len() >= self.window {
            self.samples.pop_front();
        }

        // Room is guaranteed: the window never exceeds the deque capacity
        let _ = self.samples.push_back(sample);

        let sum = self
            .samples
            .iter()
            .fold(Vector3::zeros(), |sum, sample| sum + sample);
        sum / self.samples.len() as f32
    }

    /// Forget all samples
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of samples currently averaged
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for RunningAverage {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_output_equals_input() {
        let mut average = RunningAverage::new(8);
        let sample = Vector3::new(1.5, -2.5, 9.75);
        assert_eq!(average.push(sample), sample);
    }

    #[test]
    fn test_window_of_one_passes_through() {
        let mut average = RunningAverage::new(1);
        for i in 0..5 {
            let sample = Vector3::new(i as f32, 2.0 * i as f32, -(i as f32));
            assert_eq!(average.push(sample), sample);
        }
        assert_eq!(average.len(), 1);
    }

    #[test]
    fn test_window_slides() {
        let mut average = RunningAverage::new(3);
        average.push(Vector3::new(3.0, 0.0, 0.0));
        average.push(Vector3::new(6.0, 0.0, 0.0));
        let full = average.push(Vector3::new(9.0, 0.0, 0.0));
        assert_eq!(full, Vector3::new(6.0, 0.0, 0.0));

        // Oldest sample (3.0) drops out
        let slid = average.push(Vector3::new(12.0, 0.0, 0.0));
        assert_eq!(slid, Vector3::new(9.0, 0.0, 0.0));
        assert_eq!(average.len(), 3);
    }

    #[test]
    fn test_window_is_clamped() {
        assert_eq!(RunningAverage::new(0).window(), 1);
        assert_eq!(RunningAverage::new(1000).window(), MAX_WINDOW);

        let mut average = RunningAverage::new(1000);
        for _ in 0..(MAX_WINDOW * 2) {
            average.push(Vector3::new(1.0, 1.0, 1.0));
        }
        assert_eq!(average.len(), MAX_WINDOW);
    }

    #[test]
    fn test_reset_restarts_cleanly() {
        let mut average = RunningAverage::new(4);
        average.push(Vector3::new(100.0, 100.0, 100.0));
        average.push(Vector3::new(50.0, 50.0, 50.0));

        average.reset();
        assert!(average.is_empty());

        let sample = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(average.push(sample), sample);
    }

    #[test]
    fn test_constant_input_is_stable() {
        let mut average = RunningAverage::new(4);
        let sample = Vector3::new(0.0, 0.0, 9.8);
        for _ in 0..20 {
            let smoothed = average.push(sample);
            assert!((smoothed - sample).magnitude() < 1e-5);
        }
    }
}
