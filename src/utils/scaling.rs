use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::utils::{EngineError, Result};

/// A fitted standard scaler: (x - mean) / scale per column
///
/// Parameters come from a training-time fit and are loaded as part of a
/// model's artifacts. This type never fits anything itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-column mean, in fit order
    pub mean: Vec<f64>,
    /// Per-column scale (standard deviation), in fit order
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Number of columns the scaler was fit on
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    fn check_consistent(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(EngineError::ArtifactUnavailable(format!(
                "scaler mean/scale length mismatch: {} vs {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }

    /// Scale every position of `row` in place
    ///
    /// # Returns
    /// * `Err(EngineError::ArtifactUnavailable)` if the row length does not
    ///   match the fitted column count
    pub fn transform_row(&self, row: &mut Array1<f64>) -> Result<()> {
        self.check_consistent()?;
        if row.len() != self.len() {
            return Err(EngineError::ArtifactUnavailable(format!(
                "scaler expects {} columns, got {}",
                self.len(),
                row.len()
            )));
        }
        for (i, value) in row.iter_mut().enumerate() {
            *value = self.scale_one(i, *value);
        }
        Ok(())
    }

    /// Scale only the selected positions of `row` in place
    ///
    /// `positions` lists the row indices the scaler was fit on, in fit order;
    /// all other positions are left untouched.
    pub fn transform_subset(&self, row: &mut Array1<f64>, positions: &[usize]) -> Result<()> {
        self.check_consistent()?;
        if positions.len() != self.len() {
            return Err(EngineError::ArtifactUnavailable(format!(
                "scaler expects {} columns, got {} positions",
                self.len(),
                positions.len()
            )));
        }
        for (i, &pos) in positions.iter().enumerate() {
            if pos >= row.len() {
                return Err(EngineError::ArtifactUnavailable(format!(
                    "scaler position {} out of range for row of length {}",
                    pos,
                    row.len()
                )));
            }
            row[pos] = self.scale_one(i, row[pos]);
        }
        Ok(())
    }

    fn scale_one(&self, column: usize, value: f64) -> f64 {
        let scale = self.scale[column];
        if scale.abs() < f64::EPSILON {
            // Constant column, pass through centered
            value - self.mean[column]
        } else {
            (value - self.mean[column]) / scale
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_transform_row_normal() {
        let scaler = StandardScaler {
            mean: vec![10.0, 0.0],
            scale: vec![2.0, 4.0],
        };
        let mut row = arr1(&[14.0, -2.0]);
        scaler.transform_row(&mut row).unwrap();

        assert!((row[0] - 2.0).abs() < 1e-12); // (14-10)/2
        assert!((row[1] + 0.5).abs() < 1e-12); // (-2-0)/4
    }

    #[test]
    fn test_transform_row_length_mismatch() {
        let scaler = StandardScaler {
            mean: vec![0.0],
            scale: vec![1.0],
        };
        let mut row = arr1(&[1.0, 2.0]);
        assert!(scaler.transform_row(&mut row).is_err());
    }

    #[test]
    fn test_transform_subset_leaves_others_untouched() {
        let scaler = StandardScaler {
            mean: vec![1.0, 2.0],
            scale: vec![1.0, 2.0],
        };
        let mut row = arr1(&[5.0, 99.0, 6.0]);
        scaler.transform_subset(&mut row, &[0, 2]).unwrap();

        assert!((row[0] - 4.0).abs() < 1e-12); // (5-1)/1
        assert_eq!(row[1], 99.0); // untouched
        assert!((row[2] - 2.0).abs() < 1e-12); // (6-2)/2
    }

    #[test]
    fn test_transform_subset_position_out_of_range() {
        let scaler = StandardScaler {
            mean: vec![0.0],
            scale: vec![1.0],
        };
        let mut row = arr1(&[1.0]);
        assert!(scaler.transform_subset(&mut row, &[3]).is_err());
    }

    #[test]
    fn test_constant_column_passes_through_centered() {
        let scaler = StandardScaler {
            mean: vec![7.0],
            scale: vec![0.0],
        };
        let mut row = arr1(&[7.0]);
        scaler.transform_row(&mut row).unwrap();
        assert_eq!(row[0], 0.0);
    }

    #[test]
    fn test_inconsistent_scaler_rejected() {
        let scaler = StandardScaler {
            mean: vec![0.0, 1.0],
            scale: vec![1.0],
        };
        let mut row = arr1(&[1.0, 2.0]);
        assert!(scaler.transform_row(&mut row).is_err());
    }
}
