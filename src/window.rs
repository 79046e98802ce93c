//! Analysis window generation.
//!
//! All generators are defined for any positive length, odd or even, and
//! produce non-negative samples so the result can feed the WOLA square-root
//! path unchanged.

use std::f64::consts::PI;

use crate::{Result, SegmenterError};

/// Supported analysis window families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Bartlett,
    Blackman,
    Hamming,
    Hann,
    Rectangular,
}

/// Generate a window of the given kind and length.
///
/// Deterministic and side-effect free. The Hamming variant uses the "exact"
/// coefficient `alpha = 25/46` rather than the common 0.54/0.46 split, and
/// the Blackman coefficients are the exact fractions 7938/18608, 9240/18608
/// and 1430/18608.
pub fn generate(kind: WindowKind, length: usize) -> Vec<f64> {
    debug_assert!(length > 0, "window length must be positive");
    match kind {
        WindowKind::Bartlett => bartlett(length),
        WindowKind::Blackman => blackman(length),
        WindowKind::Hamming => hamming(length),
        WindowKind::Hann => hann(length),
        WindowKind::Rectangular => vec![1.0; length],
    }
}

fn bartlett(length: usize) -> Vec<f64> {
    let m = (length + 1) as f64;
    (0..length)
        .map(|i| 1.0 - (-(m - 1.0) / 2.0 + i as f64).abs() * 2.0 / (m - 1.0))
        .collect()
}

fn blackman(length: usize) -> Vec<f64> {
    let m = (length + 1) as f64;
    (0..length)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / (m - 1.0);
            7938.0 / 18608.0 - 9240.0 / 18608.0 * x.cos() + 1430.0 / 18608.0 * (2.0 * x).cos()
        })
        .collect()
}

fn hamming(length: usize) -> Vec<f64> {
    let m = length as f64;
    let alpha = 25.0 / 46.0;
    let beta = (1.0 - alpha) / 2.0;
    (0..length)
        .map(|i| alpha - 2.0 * beta * (2.0 * PI * i as f64 / m).cos())
        .collect()
}

fn hann(length: usize) -> Vec<f64> {
    let m = length as f64;
    (0..length)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / m).cos()))
        .collect()
}

/// Resolve a named windowing scheme into a window and its matching hop size.
///
/// Scheme names combine a window family with an overlap percentage, e.g.
/// `"hann50"` is a Hann window advancing by half a frame. Supported:
/// `bartlett50`, `bartlett75`, `blackman67`, `hamming50`, `hamming75`,
/// `hann50`, `hann75`, `rectangular0`, `rectangular50`. The 75% schemes
/// require the frame size to be a multiple of four, the 50% schemes a
/// multiple of two, and `blackman67` (2/3 overlap) a multiple of three.
pub fn from_scheme(name: &str, frame_size: usize) -> Result<(Vec<f64>, usize)> {
    let (kind, divisor) = match name {
        "bartlett50" => (WindowKind::Bartlett, 2),
        "bartlett75" => (WindowKind::Bartlett, 4),
        "blackman67" => (WindowKind::Blackman, 3),
        "hamming50" => (WindowKind::Hamming, 2),
        "hamming75" => (WindowKind::Hamming, 4),
        "hann50" => (WindowKind::Hann, 2),
        "hann75" => (WindowKind::Hann, 4),
        "rectangular0" => (WindowKind::Rectangular, 1),
        "rectangular50" => (WindowKind::Rectangular, 2),
        other => return Err(SegmenterError::UnknownScheme(other.to_string())),
    };
    if frame_size % divisor != 0 {
        return Err(SegmenterError::SchemeIndivisibleFrameSize {
            scheme: name.to_string(),
            frame_size,
            divisor,
        });
    }
    Ok((generate(kind, frame_size), frame_size / divisor))
}
