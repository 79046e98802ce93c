//! Batched overlap-add segmentation and spectrogram engine.
//!
//! `segmenter-core` cuts continuous signals into overlapping analysis frames
//! and reconstructs them by overlap-add, optionally moving through a
//! half-spectrum frequency-domain representation on the way. It is the
//! numerical engine under short-time analysis pipelines such as STFT-based
//! audio processing.
//!
//! The window/hop pair is verified against the constant-overlap-add (COLA)
//! condition at construction time, boundary frames get dedicated
//! edge-corrected windows, and the four transforms (`segment`, `unsegment`,
//! `spectrogram`, `unspectrogram`) operate on flat, batch-first row-major
//! buffers with fail-fast shape validation.
//!
//! ```
//! use segmenter_core::{
//!     generate, Segmenter, SegmenterConfig, SignalShape, WindowKind,
//! };
//!
//! let config = SegmenterConfig::new(8, 4, generate(WindowKind::Hann, 8));
//! let seg = Segmenter::new(config)?;
//!
//! let signal: Vec<f64> = (0..16).map(|i| i as f64).collect();
//! let ishape = SignalShape::new(1, 16);
//! let oshape = seg.segmented_shape(ishape)?;
//!
//! let mut frames = vec![0.0; oshape.len()];
//! seg.segment(&signal, ishape, &mut frames, oshape)?;
//!
//! let mut reconstructed = vec![0.0; ishape.len()];
//! seg.unsegment(&frames, oshape, &mut reconstructed, ishape)?;
//! # Ok::<(), segmenter_core::SegmenterError>(())
//! ```

pub mod cola;
pub mod error;
pub mod fft;
pub mod segmenter;
pub mod shape;
pub mod transform;
pub mod window;

pub use cola::{check_cola, ColaResult, DEFAULT_COLA_EPS};
pub use error::{Result, SegmenterError};
pub use fft::RealDft;
pub use segmenter::{Mode, Segmenter, SegmenterConfig};
pub use shape::{FrameGeometry, FrameShape, SignalShape, SpectrumShape};
pub use transform::{from_magnitude_phase, magnitude, magnitude_phase, phase};
pub use window::{from_scheme, generate, WindowKind};

/// Complex type used for half-spectrum buffers, re-exported from `realfft`.
pub use realfft::num_complex::Complex;
