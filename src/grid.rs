//! Sweep grid description

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Parameters of one BLER-versus-SNR sweep
///
/// The SNR axis is an arithmetic progression of `num_snr` values starting at `first_snr_db`; the
/// code sizes are listed in display order. A `GridSpec` is immutable for the lifetime of a sweep.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct GridSpec {
    /// First SNR value (dB)
    pub first_snr_db: f64,
    /// SNR step (dB)
    pub snr_step_db: f64,
    /// Number of SNR values
    pub num_snr: u32,
    /// Code sizes (bits) in display order
    pub code_sizes: Vec<u32>,
    /// Number of simulation iterations per grid point
    pub iterations: u32,
}

impl GridSpec {
    /// Checks validity of grid parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the code size list is empty, if the number of SNR values or iterations
    /// is zero, or if the SNR step is not positive.
    pub fn check(&self) -> Result<(), Error> {
        if self.code_sizes.is_empty() {
            return Err(Error::InvalidInput(
                "List of code sizes cannot be empty".to_string(),
            ));
        }
        if self.num_snr == 0 {
            return Err(Error::InvalidInput(
                "Number of SNR values cannot be zero".to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(Error::InvalidInput(
                "Number of iterations cannot be zero".to_string(),
            ));
        }
        if self.snr_step_db <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "SNR step ({} dB) must be positive",
                self.snr_step_db
            )));
        }
        Ok(())
    }

    /// Returns all SNR values (dB) in sweep order.
    #[must_use]
    pub fn snr_values(&self) -> Vec<f64> {
        (0 .. self.num_snr)
            .map(|n| self.first_snr_db + self.snr_step_db * f64::from(n))
            .collect()
    }

    /// Returns all grid points in evaluation order.
    ///
    /// The code size is the outer dimension and the SNR the inner one, so all points for one code
    /// size are contiguous. The iterator is lazy and can be restarted by calling this again.
    ///
    /// # Examples
    ///
    /// ```
    /// use pucch_bler::GridSpec;
    ///
    /// let grid = GridSpec {
    ///     first_snr_db: -1.0,
    ///     snr_step_db: 1.0,
    ///     num_snr: 2,
    ///     code_sizes: vec![2, 4],
    ///     iterations: 100,
    /// };
    /// let points: Vec<(u32, f64)> = grid.points().collect();
    /// assert_eq!(points, [(2, -1.0), (2, 0.0), (4, -1.0), (4, 0.0)]);
    /// ```
    pub fn points(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.code_sizes
            .iter()
            .copied()
            .cartesian_product(self.snr_values())
    }
}
