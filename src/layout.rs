//! Sensor axis layouts for mounting orientations and device form factors
//!
//! Compass chips are rarely soldered with their axes aligned to the device
//! body, and devices with several postures (slider, folding) move the chips
//! relative to each other. Each posture is described by a [`FormFactor`]
//! holding one [`AxisLayout`] per sensor.
//!
//! # Example
//! ```
//! use nalgebra::Vector3;
//! use akmtastic::AxisLayout;
//!
//! // Body X = +sensor Y, body Y = -sensor X, body Z = +sensor Z
//! let layout = AxisLayout::from_matrix([[0, 1, 0], [-1, 0, 0], [0, 0, 1]]).unwrap();
//!
//! let body = layout.remap(Vector3::new(1.0, 2.0, 3.0));
//! assert_eq!(body, Vector3::new(2.0, -1.0, 3.0));
//! ```

use nalgebra::{Matrix3, Vector3};

use crate::error::{EngineError, Result};

/// Signed permutation matrix mapping sensor axes onto body axes.
///
/// Row `i` holds a single `+1` or `-1` in the column of the sensor axis that
/// becomes body axis `i`. This is the `int16[3][3]` layout matrix vendor
/// compass HAL configurations ship per board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisLayout {
    rows: [[i8; 3]; 3],
}

impl AxisLayout {
    /// Sensor axes already match body axes
    pub const IDENTITY: Self = Self {
        rows: [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
    };

    /// Build a layout from a vendor layout matrix
    ///
    /// Fails with [`EngineError::InvalidLayout`] unless every row and every
    /// column holds exactly one non-zero entry and that entry is `±1`.
    pub fn from_matrix(matrix: [[i16; 3]; 3]) -> Result<Self> {
        let mut rows = [[0i8; 3]; 3];
        let mut column_used = [false; 3];

        for (row, source) in rows.iter_mut().zip(matrix.iter()) {
            let mut selected = None;
            for (column, &value) in source.iter().enumerate() {
                match value {
                    0 => {}
                    1 | -1 if selected.is_none() => selected = Some((column, value as i8)),
                    _ => return Err(EngineError::InvalidLayout),
                }
            }

            let (column, sign) = selected.ok_or(EngineError::InvalidLayout)?;
            if column_used[column] {
                return Err(EngineError::InvalidLayout);
            }
            column_used[column] = true;
            row[column] = sign;
        }

        Ok(Self { rows })
    }

    /// Remap a sensor-frame reading into the body frame
    #[inline]
    pub fn remap(&self, sensor: Vector3<f32>) -> Vector3<f32> {
        let axis = |row: &[i8; 3]| -> f32 {
            row.iter()
                .zip(sensor.iter())
                .filter(|(sign, _)| **sign != 0)
                .map(|(&sign, &value)| if sign < 0 { -value } else { value })
                .sum()
        };

        Vector3::new(axis(&self.rows[0]), axis(&self.rows[1]), axis(&self.rows[2]))
    }

    /// Inverse layout: maps body-frame vectors back into the sensor frame
    pub fn transpose(&self) -> Self {
        let mut rows = [[0i8; 3]; 3];
        for (i, row) in self.rows.iter().enumerate() {
            for (j, &sign) in row.iter().enumerate() {
                rows[j][i] = sign;
            }
        }
        Self { rows }
    }

    /// Layout as a rotation matrix
    pub fn matrix(&self) -> Matrix3<f32> {
        Matrix3::from_fn(|i, j| f32::from(self.rows[i][j]))
    }
}

impl Default for AxisLayout {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Axis layouts for one device posture
///
/// # Example
/// ```
/// use akmtastic::{AxisLayout, FormFactor};
///
/// // Slider open: the magnetometer board is flipped relative to the main board
/// let open = FormFactor {
///     accelerometer: AxisLayout::IDENTITY,
///     magnetometer: AxisLayout::from_matrix([[-1, 0, 0], [0, -1, 0], [0, 0, 1]]).unwrap(),
/// };
/// assert_ne!(open, FormFactor::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormFactor {
    /// Accelerometer sensor-to-body layout
    pub accelerometer: AxisLayout,
    /// Magnetometer sensor-to-body layout
    pub magnetometer: AxisLayout,
}

impl FormFactor {
    /// Same layout for both sensors
    pub const fn uniform(layout: AxisLayout) -> Self {
        Self {
            accelerometer: layout,
            magnetometer: layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// All 48 signed permutation matrices
    fn all_layouts() -> impl Iterator<Item = AxisLayout> {
        const PERMUTATIONS: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        PERMUTATIONS.into_iter().flat_map(|permutation| {
            (0..8u8).map(move |signs| {
                let mut matrix = [[0i16; 3]; 3];
                for (row, &column) in permutation.iter().enumerate() {
                    matrix[row][column] = if signs & (1 << row) != 0 { -1 } else { 1 };
                }
                AxisLayout::from_matrix(matrix).unwrap()
            })
        })
    }

    #[test]
    fn test_identity_layout() {
        let sensor = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(AxisLayout::IDENTITY.remap(sensor), sensor);
        assert_eq!(AxisLayout::default(), AxisLayout::IDENTITY);
    }

    #[test]
    fn test_specific_layouts() {
        let sensor = Vector3::new(1.0, 2.0, 3.0);

        // x'=x, y'=-z, z'=y
        let layout = AxisLayout::from_matrix([[1, 0, 0], [0, 0, -1], [0, 1, 0]]).unwrap();
        assert_eq!(layout.remap(sensor), Vector3::new(1.0, -3.0, 2.0));

        // x'=-x, y'=-y, z'=z
        let layout = AxisLayout::from_matrix([[-1, 0, 0], [0, -1, 0], [0, 0, 1]]).unwrap();
        assert_eq!(layout.remap(sensor), Vector3::new(-1.0, -2.0, 3.0));

        // x'=z, y'=x, z'=y
        let layout = AxisLayout::from_matrix([[0, 0, 1], [1, 0, 0], [0, 1, 0]]).unwrap();
        assert_eq!(layout.remap(sensor), Vector3::new(3.0, 1.0, 2.0));
    }

    #[test]
    fn test_every_layout_preserves_magnitude_and_inverts() {
        let sensor = Vector3::new(1.0f32, -2.0, 3.0);
        let mut count = 0;

        for layout in all_layouts() {
            let body = layout.remap(sensor);
            assert!(
                (body.magnitude() - sensor.magnitude()).abs() < 1e-6,
                "{:?} changed magnitude",
                layout
            );
            assert_eq!(layout.transpose().remap(body), sensor, "{:?} round trip", layout);
            assert_eq!(layout.matrix() * sensor, body, "{:?} matrix form", layout);
            count += 1;
        }

        assert_eq!(count, 48);
    }

    #[test]
    fn test_invalid_matrices_rejected() {
        let invalid = [
            [[0, 0, 0], [0, 1, 0], [0, 0, 1]],  // empty row
            [[1, 1, 0], [0, 1, 0], [0, 0, 1]],  // two entries in a row
            [[1, 0, 0], [1, 0, 0], [0, 0, 1]],  // column reused
            [[2, 0, 0], [0, 1, 0], [0, 0, 1]],  // not unit
            [[1, 0, 0], [0, -3, 0], [0, 0, 1]], // not unit
        ];

        for matrix in invalid {
            assert_eq!(
                AxisLayout::from_matrix(matrix),
                Err(EngineError::InvalidLayout),
                "{:?} should be rejected",
                matrix
            );
        }
    }

    #[test]
    fn test_uniform_form_factor() {
        let layout = AxisLayout::from_matrix([[0, -1, 0], [1, 0, 0], [0, 0, 1]]).unwrap();
        let form_factor = FormFactor::uniform(layout);
        assert_eq!(form_factor.accelerometer, layout);
        assert_eq!(form_factor.magnetometer, layout);
    }
}
