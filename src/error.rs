use std::fmt;

/// Top-level error type for the segmenter-core public API.
///
/// Every failure is a synchronous precondition violation detected before any
/// output buffer is written; nothing is retried or recovered internally.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmenterError {
    /// Frame size must be even.
    OddFrameSize(usize),
    /// Hop size may not exceed the frame size.
    HopExceedsFrameSize { hop_size: usize, frame_size: usize },
    /// Supplied window length differs from the configured frame size.
    WindowLengthMismatch { expected: usize, actual: usize },
    /// Window samples must be non-negative (WOLA takes their square root).
    NegativeWindowSample { index: usize, value: f64 },
    /// The window/hop pair fails the constant-overlap-add check.
    NotCola { deviation: f64, eps: f64 },
    /// Mode string was not exactly "wola" or "ola".
    UnknownMode(String),
    /// Window scheme name not recognized.
    UnknownScheme(String),
    /// Frame size incompatible with the scheme's overlap divisor.
    SchemeIndivisibleFrameSize { scheme: String, frame_size: usize, divisor: usize },
    /// Signal length is not a multiple of the hop size.
    HopMisaligned { num_samples: usize, hop_size: usize },
    /// Signal shorter than one frame; no segmentation is possible.
    SignalTooShort { num_samples: usize, frame_size: usize },
    /// Batch axes of the supplied input/output shapes differ.
    BatchMismatch { expected: usize, actual: usize },
    /// Frame-count axis does not match the shape derived from the signal.
    FrameCountMismatch { expected: usize, actual: usize },
    /// Per-frame axis (frame size or bin count) does not match.
    FrameSizeMismatch { expected: usize, actual: usize },
    /// Spectral transforms require a power-of-two frame size.
    NonPowerOfTwoFrameSize(usize),
    /// A flat buffer does not hold the element count its shape implies.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// FFT failure reported by the spectral transform, wrapped verbatim.
    Fft(String),
}

impl fmt::Display for SegmenterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmenterError::OddFrameSize(n) => {
                write!(f, "only even frame sizes are supported, got {}", n)
            }
            SegmenterError::HopExceedsFrameSize { hop_size, frame_size } => {
                write!(
                    f,
                    "hop size ({}) cannot be larger than frame size ({})",
                    hop_size, frame_size
                )
            }
            SegmenterError::WindowLengthMismatch { expected, actual } => {
                write!(
                    f,
                    "window must match the frame size: expected {} samples, got {}",
                    expected, actual
                )
            }
            SegmenterError::NegativeWindowSample { index, value } => {
                write!(f, "window contains a negative sample at index {}: {}", index, value)
            }
            SegmenterError::NotCola { deviation, eps } => {
                write!(
                    f,
                    "window is not COLA compliant for the given hop size: deviation {:e} exceeds eps {:e}",
                    deviation, eps
                )
            }
            SegmenterError::UnknownMode(s) => {
                write!(f, "unknown segmenter mode {:?} (expected \"wola\" or \"ola\")", s)
            }
            SegmenterError::UnknownScheme(s) => {
                write!(f, "unknown window scheme {:?}", s)
            }
            SegmenterError::SchemeIndivisibleFrameSize { scheme, frame_size, divisor } => {
                write!(
                    f,
                    "scheme {:?} requires a frame size divisible by {}, got {}",
                    scheme, divisor, frame_size
                )
            }
            SegmenterError::HopMisaligned { num_samples, hop_size } => {
                write!(
                    f,
                    "signal length ({}) is not a multiple of the hop size ({})",
                    num_samples, hop_size
                )
            }
            SegmenterError::SignalTooShort { num_samples, frame_size } => {
                write!(
                    f,
                    "signal length ({}) is shorter than one frame ({})",
                    num_samples, frame_size
                )
            }
            SegmenterError::BatchMismatch { expected, actual } => {
                write!(f, "batch size mismatch: expected {}, got {}", expected, actual)
            }
            SegmenterError::FrameCountMismatch { expected, actual } => {
                write!(f, "frame count mismatch: expected {}, got {}", expected, actual)
            }
            SegmenterError::FrameSizeMismatch { expected, actual } => {
                write!(f, "per-frame size mismatch: expected {}, got {}", expected, actual)
            }
            SegmenterError::NonPowerOfTwoFrameSize(n) => {
                write!(
                    f,
                    "spectral transforms require a power-of-two frame size, got {}",
                    n
                )
            }
            SegmenterError::BufferSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "buffer length mismatch: shape implies {} elements, buffer holds {}",
                    expected, actual
                )
            }
            SegmenterError::Fft(msg) => write!(f, "FFT error: {}", msg),
        }
    }
}

impl std::error::Error for SegmenterError {}

/// Convenience alias so callers can write `Result<T>` instead of
/// `Result<T, SegmenterError>`.
pub type Result<T> = std::result::Result<T, SegmenterError>;
