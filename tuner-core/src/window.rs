//! Hann window coefficients, computed once per analysis length.

use std::f32::consts::PI;

/// Precomputed symmetric Hann window.
///
/// The Hann window reduces spectral leakage by tapering the signal to zero
/// at the edges. Coefficients follow `0.5 * (1 - cos(2*pi*i / (n - 1)))`.
#[derive(Debug, Clone, PartialEq)]
pub struct HannWindow {
    coefficients: Vec<f32>,
}

impl HannWindow {
    pub fn new(len: usize) -> Self {
        let coefficients = match len {
            0 => Vec::new(),
            1 => vec![1.0],
            _ => {
                let n_minus_1 = (len - 1) as f32;
                (0..len)
                    .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n_minus_1).cos()))
                    .collect()
            }
        };
        Self { coefficients }
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Returns the elementwise product of `buffer` and the window.
    ///
    /// # Panics
    /// * If `buffer` is not the same length as the window
    pub fn apply(&self, buffer: &[f32]) -> Vec<f32> {
        assert_eq!(buffer.len(), self.len(), "buffer length must match window");
        buffer
            .iter()
            .zip(&self.coefficients)
            .map(|(sample, coeff)| sample * coeff)
            .collect()
    }

    /// Writes the windowed buffer into `out` without allocating.
    pub fn apply_into(&self, buffer: &[f32], out: &mut [f32]) {
        assert_eq!(buffer.len(), self.len(), "buffer length must match window");
        assert_eq!(out.len(), self.len(), "output length must match window");
        for ((dst, sample), coeff) in out.iter_mut().zip(buffer).zip(&self.coefficients) {
            *dst = sample * coeff;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn tapers_to_zero_at_both_edges() {
        let window = HannWindow::new(9);
        let c = window.coefficients();
        assert_abs_diff_eq!(c[0], 0.0);
        assert_abs_diff_eq!(c[8], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c[4], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn is_symmetric() {
        let window = HannWindow::new(64);
        let c = window.coefficients();
        for i in 0..32 {
            assert_abs_diff_eq!(c[i], c[63 - i], epsilon = 1e-6);
        }
    }

    #[test]
    fn apply_is_deterministic() {
        let window = HannWindow::new(128);
        let buffer: Vec<f32> = (0..128).map(|i| (i as f32 * 0.37).sin()).collect();
        assert_eq!(window.apply(&buffer), window.apply(&buffer));

        let mut out = vec![0.0; 128];
        window.apply_into(&buffer, &mut out);
        assert_eq!(out, window.apply(&buffer));
    }

    #[test]
    fn degenerate_lengths() {
        assert!(HannWindow::new(0).is_empty());
        assert_eq!(HannWindow::new(1).coefficients(), &[1.0]);
    }
}
