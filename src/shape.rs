//! Shape inference and validation for the batched tensor transforms.
//!
//! All buffers are batch-first, row-major and contiguous. The shapes of an
//! unsegmented signal and its segmented (or spectrogram) counterpart are
//! linked by
//!
//! ```text
//! num_samples = (num_frames - 1) * hop_size + frame_size
//! ```
//!
//! with `num_samples` an exact multiple of `hop_size`. Every transform
//! validates the caller-supplied shape pair against this relation before
//! touching any buffer.

use crate::{Result, SegmenterError};

/// Shape of an unsegmented signal tensor `(batch, num_samples)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalShape {
    pub batch: usize,
    pub num_samples: usize,
}

impl SignalShape {
    pub fn new(batch: usize, num_samples: usize) -> Self {
        Self { batch, num_samples }
    }

    /// Element count of the backing flat buffer.
    pub fn len(&self) -> usize {
        self.batch * self.num_samples
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shape of a segmented tensor `(batch, num_frames, frame_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
    pub batch: usize,
    pub num_frames: usize,
    pub frame_size: usize,
}

impl FrameShape {
    pub fn new(batch: usize, num_frames: usize, frame_size: usize) -> Self {
        Self { batch, num_frames, frame_size }
    }

    pub fn len(&self) -> usize {
        self.batch * self.num_frames * self.frame_size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shape of a complex spectrogram tensor `(batch, num_frames, num_bins)`
/// where `num_bins = frame_size / 2 + 1` (the half-spectrum).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrumShape {
    pub batch: usize,
    pub num_frames: usize,
    pub num_bins: usize,
}

impl SpectrumShape {
    pub fn new(batch: usize, num_frames: usize, num_bins: usize) -> Self {
        Self { batch, num_frames, num_bins }
    }

    pub fn len(&self) -> usize {
        self.batch * self.num_frames * self.num_bins
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Frame/hop geometry shared by all shape computations.
///
/// Pure and stateless; the segmenter engine constructs one from its config
/// and delegates every shape question here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub frame_size: usize,
    pub hop_size: usize,
}

impl FrameGeometry {
    pub fn new(frame_size: usize, hop_size: usize) -> Self {
        Self { frame_size, hop_size }
    }

    /// Frames produced by one batch row of `num_samples` samples.
    ///
    /// Errors if the signal length is not hop-aligned or yields fewer than
    /// one frame.
    fn num_frames(&self, num_samples: usize) -> Result<usize> {
        if num_samples % self.hop_size != 0 {
            return Err(SegmenterError::HopMisaligned {
                num_samples,
                hop_size: self.hop_size,
            });
        }
        if num_samples < self.frame_size {
            return Err(SegmenterError::SignalTooShort {
                num_samples,
                frame_size: self.frame_size,
            });
        }
        let num_frames = num_samples / self.hop_size - self.frame_size / self.hop_size + 1;
        // When the hop does not divide the frame size no frame count covers
        // the signal exactly; the floor-division count would read past the
        // end of the row.
        if (num_frames - 1) * self.hop_size + self.frame_size != num_samples {
            return Err(SegmenterError::HopMisaligned {
                num_samples,
                hop_size: self.hop_size,
            });
        }
        Ok(num_frames)
    }

    /// Segmented shape produced from an unsegmented signal shape.
    pub fn segmented_from_signal(&self, signal: SignalShape) -> Result<FrameShape> {
        Ok(FrameShape {
            batch: signal.batch,
            num_frames: self.num_frames(signal.num_samples)?,
            frame_size: self.frame_size,
        })
    }

    /// Unsegmented signal shape reconstructed from a segmented shape.
    ///
    /// A zero-frame shape reconstructs nothing and is rejected rather than
    /// wrapping the sample count.
    pub fn signal_from_segmented(&self, segmented: FrameShape) -> Result<SignalShape> {
        if segmented.num_frames == 0 {
            return Err(SegmenterError::SignalTooShort {
                num_samples: 0,
                frame_size: self.frame_size,
            });
        }
        let num_samples = (segmented.num_frames - 1) * self.hop_size + self.frame_size;
        if num_samples % self.hop_size != 0 {
            return Err(SegmenterError::HopMisaligned {
                num_samples,
                hop_size: self.hop_size,
            });
        }
        Ok(SignalShape { batch: segmented.batch, num_samples })
    }

    /// Spectrogram shape produced from an unsegmented signal shape.
    ///
    /// The spectral path is restricted to power-of-two frame sizes.
    pub fn spectrum_from_signal(&self, signal: SignalShape) -> Result<SpectrumShape> {
        self.require_power_of_two()?;
        Ok(SpectrumShape {
            batch: signal.batch,
            num_frames: self.num_frames(signal.num_samples)?,
            num_bins: self.frame_size / 2 + 1,
        })
    }

    /// Unsegmented signal shape reconstructed from a spectrogram shape.
    pub fn signal_from_spectrum(&self, spectrum: SpectrumShape) -> Result<SignalShape> {
        self.require_power_of_two()?;
        if spectrum.num_frames == 0 {
            return Err(SegmenterError::SignalTooShort {
                num_samples: 0,
                frame_size: self.frame_size,
            });
        }
        let num_samples = (spectrum.num_frames - 1) * self.hop_size + self.frame_size;
        if num_samples % self.hop_size != 0 {
            return Err(SegmenterError::HopMisaligned {
                num_samples,
                hop_size: self.hop_size,
            });
        }
        Ok(SignalShape { batch: spectrum.batch, num_samples })
    }

    /// Validate a signal/segmented shape pair, reporting a distinct error for
    /// the first mismatching axis.
    pub fn validate_segmented(&self, signal: SignalShape, segmented: FrameShape) -> Result<()> {
        let expected = self.segmented_from_signal(signal)?;
        if segmented.batch != expected.batch {
            return Err(SegmenterError::BatchMismatch {
                expected: expected.batch,
                actual: segmented.batch,
            });
        }
        if segmented.num_frames != expected.num_frames {
            return Err(SegmenterError::FrameCountMismatch {
                expected: expected.num_frames,
                actual: segmented.num_frames,
            });
        }
        if segmented.frame_size != expected.frame_size {
            return Err(SegmenterError::FrameSizeMismatch {
                expected: expected.frame_size,
                actual: segmented.frame_size,
            });
        }
        Ok(())
    }

    /// Validate a signal/spectrogram shape pair; also rejects non-power-of-two
    /// frame sizes.
    pub fn validate_spectrum(&self, signal: SignalShape, spectrum: SpectrumShape) -> Result<()> {
        let expected = self.spectrum_from_signal(signal)?;
        if spectrum.batch != expected.batch {
            return Err(SegmenterError::BatchMismatch {
                expected: expected.batch,
                actual: spectrum.batch,
            });
        }
        if spectrum.num_frames != expected.num_frames {
            return Err(SegmenterError::FrameCountMismatch {
                expected: expected.num_frames,
                actual: spectrum.num_frames,
            });
        }
        if spectrum.num_bins != expected.num_bins {
            return Err(SegmenterError::FrameSizeMismatch {
                expected: expected.num_bins,
                actual: spectrum.num_bins,
            });
        }
        Ok(())
    }

    fn require_power_of_two(&self) -> Result<()> {
        if !self.frame_size.is_power_of_two() {
            return Err(SegmenterError::NonPowerOfTwoFrameSize(self.frame_size));
        }
        Ok(())
    }
}

/// Check that a flat buffer holds exactly the element count a shape implies.
pub(crate) fn check_buffer_len<T>(buffer: &[T], expected: usize) -> Result<()> {
    if buffer.len() != expected {
        return Err(SegmenterError::BufferSizeMismatch {
            expected,
            actual: buffer.len(),
        });
    }
    Ok(())
}
