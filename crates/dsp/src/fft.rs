// Copyright 2025-2026 CEMAXECUTER LLC

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Forward FFT across the virtual-antenna axis (angle of arrival).
///
/// Inputs shorter than the FFT size are zero-padded, longer inputs are
/// truncated. No normalisation is applied.
pub struct AngleFft {
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl AngleFft {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();
        Self {
            fft,
            buffer: vec![Complex64::new(0.0, 0.0); size],
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
        }
    }

    /// Zero-pad (or truncate) `input` to the FFT size and transform it.
    /// The result borrows an internal buffer reused across calls.
    pub fn process_padded<I>(&mut self, input: I) -> &[Complex64]
    where
        I: IntoIterator<Item = Complex64>,
    {
        self.buffer.fill(Complex64::new(0.0, 0.0));
        for (slot, v) in self.buffer.iter_mut().zip(input) {
            *slot = v;
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_across_array_is_broadside() {
        let mut fft = AngleFft::new(64);
        let out = fft.process_padded(vec![Complex64::new(1.0, 0.0); 64]);

        assert!((out[0].norm() - 64.0).abs() < 1e-9);
        assert!(out[1..].iter().all(|v| v.norm() < 1e-9));
    }

    #[test]
    fn test_phase_ramp_peaks_at_its_bin() {
        let mut fft = AngleFft::new(64);
        let ramp = (0..8).map(|a| Complex64::from_polar(1.0, 2.0 * std::f64::consts::PI * 4.0 * a as f64 / 64.0));
        let out = fft.process_padded(ramp);

        let peak = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(k, v)| (k, v.norm()));
        let (k, mag) = peak.unwrap();
        assert_eq!(k, 4);
        // Eight unit samples add coherently at the tone bin
        assert!((mag - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_padding() {
        let mut fft = AngleFft::new(64);
        let out = fft.process_padded(vec![Complex64::new(2.0, 0.0); 8]);
        assert_eq!(out.len(), 64);
        // Eight equal samples: DC is their sum
        assert!((out[0].re - 16.0).abs() < 1e-9);
        assert!(out[32].norm() < 1e-9);

        // Buffer is cleared between calls
        let out = fft.process_padded(std::iter::empty());
        assert!(out.iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn test_truncates_long_input() {
        let mut fft = AngleFft::new(4);
        let out = fft.process_padded(vec![Complex64::new(1.0, 0.0); 10]);
        assert!((out[0].re - 4.0).abs() < 1e-12);
    }
}
