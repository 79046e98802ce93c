//! Polar representations of spectrogram data.
//!
//! Spectral processing pipelines often want magnitude and phase rather than
//! raw complex bins. These helpers split a half-spectrum buffer (as produced
//! by [`crate::Segmenter::spectrogram`]) into polar parts and recombine them
//! as `magnitude * e^{i*phase}` for the inverse pass. They are pure
//! per-element maps, so the same flat batch-first layout and shapes carry
//! through unchanged.

use realfft::num_complex::Complex;

use crate::shape::check_buffer_len;
use crate::Result;

/// Split a complex spectrogram into magnitude and phase buffers.
///
/// Phase is the principal-value angle in `(-pi, pi]`; the phase of a zero
/// bin is 0.
pub fn magnitude_phase(
    spectrum: &[Complex<f64>],
    magnitude: &mut [f64],
    phase: &mut [f64],
) -> Result<()> {
    check_buffer_len(magnitude, spectrum.len())?;
    check_buffer_len(phase, spectrum.len())?;
    for (i, c) in spectrum.iter().enumerate() {
        magnitude[i] = c.norm();
        phase[i] = c.arg();
    }
    Ok(())
}

/// Magnitude of every bin.
pub fn magnitude(spectrum: &[Complex<f64>], out: &mut [f64]) -> Result<()> {
    check_buffer_len(out, spectrum.len())?;
    for (dst, c) in out.iter_mut().zip(spectrum) {
        *dst = c.norm();
    }
    Ok(())
}

/// Principal-value phase angle of every bin.
pub fn phase(spectrum: &[Complex<f64>], out: &mut [f64]) -> Result<()> {
    check_buffer_len(out, spectrum.len())?;
    for (dst, c) in out.iter_mut().zip(spectrum) {
        *dst = c.arg();
    }
    Ok(())
}

/// Recombine magnitude and phase buffers into a complex spectrogram,
/// `spectrum[i] = magnitude[i] * e^{i * phase[i]}`.
pub fn from_magnitude_phase(
    magnitude: &[f64],
    phase: &[f64],
    spectrum: &mut [Complex<f64>],
) -> Result<()> {
    check_buffer_len(phase, magnitude.len())?;
    check_buffer_len(spectrum, magnitude.len())?;
    for (i, dst) in spectrum.iter_mut().enumerate() {
        *dst = Complex::from_polar(magnitude[i], phase[i]);
    }
    Ok(())
}
