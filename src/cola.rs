//! Constant-overlap-add (COLA) compliance checking.
//!
//! Overlap-add reconstruction is exact only when summing shifted copies of
//! the window at multiples of the hop size yields a location-independent
//! constant. Rather than brute-forcing the sum in the time domain, the check
//! bounds the ripple through the window's DTFT sampled at the hop-rate
//! harmonics: the shifted-window sum equals `sum(window)/hop` plus aliasing
//! terms whose magnitudes are `|W(k/hop)|/hop` for `k = 1..hop`. If every
//! aliasing term vanished the sum would be exactly constant, so the spread
//! between the upper and lower bound measures the worst-case deviation.
//! O(hop_size × window_len), no FFT required.

/// Default tolerance on the COLA deviation bound.
pub const DEFAULT_COLA_EPS: f64 = 1e-5;

/// Outcome of a COLA check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColaResult {
    /// Whether the deviation bound is below the requested tolerance.
    pub is_cola: bool,
    /// The constant value of the shifted-window sum, `(ubound + lbound) / 2`.
    /// Dividing the synthesis window by this value makes reconstruction
    /// unit-gain.
    pub normalization: f64,
    /// Measured deviation bound `ubound - lbound`; reported in errors.
    pub deviation: f64,
}

/// Check whether `window` satisfies the COLA condition for `hop_size`.
///
/// A `hop_size` of 1 is trivially compliant: every sample position receives
/// the full window sum.
pub fn check_cola(window: &[f64], hop_size: usize, eps: f64) -> ColaResult {
    let window_sum: f64 = window.iter().sum();

    if hop_size <= 1 {
        return ColaResult {
            is_cola: true,
            normalization: window_sum,
            deviation: 0.0,
        };
    }

    let factor = window_sum / hop_size as f64;
    let mut ubound = factor;
    let mut lbound = factor;

    let frame_rate = 1.0 / hop_size as f64;
    for k in 1..hop_size {
        let f = frame_rate * k as f64;

        // W(f) = sum_n window[n] * e^{-2*pi*i*f*n}
        let (mut re, mut im) = (0.0f64, 0.0f64);
        for (n, &w) in window.iter().enumerate() {
            let phase = -2.0 * std::f64::consts::PI * f * n as f64;
            re += w * phase.cos();
            im += w * phase.sin();
        }

        let magnitude = re.hypot(im);
        ubound += magnitude / hop_size as f64;
        lbound -= magnitude / hop_size as f64;
    }

    let deviation = ubound - lbound;
    ColaResult {
        is_cola: deviation < eps,
        normalization: (ubound + lbound) / 2.0,
        deviation,
    }
}
