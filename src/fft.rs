//! Real-to-half-complex FFT boundary.
//!
//! Thin wrapper over `realfft` plans for one fixed power-of-two frame size.
//! The scaling convention is: unnormalized forward, inverse scaled by
//! `1/frame_size`, so `inverse(forward(x)) == x` for any real frame when no
//! intermediate processing occurs. Plans (twiddle factors) and scratch
//! buffers are allocated once at construction and reused across calls.

use std::sync::Arc;

use realfft::{num_complex::Complex, ComplexToReal, RealFftPlanner, RealToComplex};

use crate::{Result, SegmenterError};

pub struct RealDft {
    frame_size: usize,
    half_spectrum_size: usize,
    forward_plan: Arc<dyn RealToComplex<f64>>,
    inverse_plan: Arc<dyn ComplexToReal<f64>>,
    time_buf: Vec<f64>,
    freq_buf: Vec<Complex<f64>>,
    forward_scratch: Vec<Complex<f64>>,
    inverse_scratch: Vec<Complex<f64>>,
}

impl RealDft {
    /// Plan forward and inverse transforms for `frame_size` points.
    ///
    /// `frame_size` must be a power of two; callers are expected to have
    /// validated this already.
    pub fn new(frame_size: usize) -> Self {
        debug_assert!(frame_size.is_power_of_two());
        let mut planner = RealFftPlanner::<f64>::new();
        let forward_plan = planner.plan_fft_forward(frame_size);
        let inverse_plan = planner.plan_fft_inverse(frame_size);
        let time_buf = forward_plan.make_input_vec();
        let freq_buf = forward_plan.make_output_vec();
        let forward_scratch = forward_plan.make_scratch_vec();
        let inverse_scratch = inverse_plan.make_scratch_vec();
        RealDft {
            frame_size,
            half_spectrum_size: frame_size / 2 + 1,
            forward_plan,
            inverse_plan,
            time_buf,
            freq_buf,
            forward_scratch,
            inverse_scratch,
        }
    }

    /// Number of complex bins in the half spectrum, `frame_size / 2 + 1`.
    pub fn half_spectrum_size(&self) -> usize {
        self.half_spectrum_size
    }

    /// Forward transform of one real frame into `frame_size / 2 + 1` bins.
    pub fn forward(&mut self, frame: &[f64], out: &mut [Complex<f64>]) -> Result<()> {
        self.time_buf.copy_from_slice(frame);
        self.forward_plan
            .process_with_scratch(&mut self.time_buf, out, &mut self.forward_scratch)
            .map_err(|e| SegmenterError::Fft(format!("forward FFT failed: {}", e)))?;
        Ok(())
    }

    /// Inverse transform of one half spectrum into `frame_size` real samples.
    ///
    /// Scales by `1/frame_size` to undo the unnormalized forward pass.
    pub fn inverse(&mut self, spectrum: &[Complex<f64>], out: &mut [f64]) -> Result<()> {
        self.freq_buf.copy_from_slice(spectrum);

        // realfft requires DC and Nyquist to have zero imaginary part
        self.freq_buf[0].im = 0.0;
        self.freq_buf[self.half_spectrum_size - 1].im = 0.0;

        self.inverse_plan
            .process_with_scratch(&mut self.freq_buf, out, &mut self.inverse_scratch)
            .map_err(|e| SegmenterError::Fft(format!("inverse FFT failed: {}", e)))?;

        let norm = 1.0 / self.frame_size as f64;
        out.iter_mut().for_each(|x| *x *= norm);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_forward_is_flat_spectrum() {
        let n = 8;
        let mut dft = RealDft::new(n);
        let mut frame = vec![0.0; n];
        frame[0] = 1.0;
        let mut spectrum = vec![Complex::new(0.0, 0.0); dft.half_spectrum_size()];

        dft.forward(&frame, &mut spectrum).unwrap();

        for (k, c) in spectrum.iter().enumerate() {
            assert!((c.re - 1.0).abs() < 1e-12, "bin {k}: {c}");
            assert!(c.im.abs() < 1e-12, "bin {k}: {c}");
        }
    }

    #[test]
    fn inverse_undoes_forward_exactly() {
        let n = 16;
        let mut dft = RealDft::new(n);
        let frame: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * 3.0 * i as f64 / n as f64).sin() + 0.25)
            .collect();
        let mut spectrum = vec![Complex::new(0.0, 0.0); dft.half_spectrum_size()];
        let mut reconstructed = vec![0.0; n];

        dft.forward(&frame, &mut spectrum).unwrap();
        dft.inverse(&spectrum, &mut reconstructed).unwrap();

        for (a, b) in frame.iter().zip(&reconstructed) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn dirty_nyquist_imaginary_part_is_tolerated() {
        // Host-side spectral processing can leave residue on bins realfft
        // insists are purely real; the wrapper clears them instead of failing.
        let n = 8;
        let mut dft = RealDft::new(n);
        let mut spectrum = vec![Complex::new(1.0, 0.0); dft.half_spectrum_size()];
        spectrum[0].im = 1e-3;
        spectrum[n / 2].im = -1e-3;
        let mut out = vec![0.0; n];

        dft.inverse(&spectrum, &mut out).unwrap();
        assert!(out.iter().all(|x| x.is_finite()));
    }
}
