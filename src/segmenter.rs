//! The segmenter engine: batched segment/unsegment and
//! spectrogram/unspectrogram transforms over flat row-major buffers.
//!
//! Construction validates the configuration, runs the COLA check once and
//! caches the three operating windows (interior, leading edge, trailing
//! edge) plus the FFT plans for the spectral path. The engine owns mutable
//! scratch reused across calls, so one instance must not be invoked from
//! multiple threads at once; give each worker its own instance instead
//! (construction is cheap relative to a batch run).

use std::str::FromStr;

use realfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::cola::{check_cola, DEFAULT_COLA_EPS};
use crate::fft::RealDft;
use crate::shape::{check_buffer_len, FrameGeometry, FrameShape, SignalShape, SpectrumShape};
use crate::{Result, SegmenterError};

/// Operating mode of the engine.
///
/// WOLA applies the square root of the window on both analysis and
/// synthesis, splitting the total gain across the two passes so that
/// spectral processing between them still reconstructs cleanly. OLA applies
/// the full window once, on synthesis only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Wola,
    Ola,
}

impl FromStr for Mode {
    type Err = SegmenterError;

    /// Case-sensitive: exactly `"wola"` or `"ola"`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wola" => Ok(Mode::Wola),
            "ola" => Ok(Mode::Ola),
            other => Err(SegmenterError::UnknownMode(other.to_string())),
        }
    }
}

/// Immutable segmenter configuration.
///
/// This is also the persistence surface: serializing it captures exactly the
/// state needed to rebuild an identical engine elsewhere. The core performs
/// no file I/O itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    pub window: Vec<f64>,
    pub mode: Mode,
    pub edge_correction: bool,
    pub normalize_window: bool,
    pub cola_eps: f64,
}

impl SegmenterConfig {
    /// Start a configuration with the defaults of the host-facing surface:
    /// WOLA mode, edge correction on, window normalization on, COLA epsilon
    /// `1e-5`.
    pub fn new(frame_size: usize, hop_size: usize, window: Vec<f64>) -> Self {
        SegmenterConfig {
            frame_size,
            hop_size,
            window,
            mode: Mode::Wola,
            edge_correction: true,
            normalize_window: true,
            cola_eps: DEFAULT_COLA_EPS,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn edge_correction(mut self, enabled: bool) -> Self {
        self.edge_correction = enabled;
        self
    }

    pub fn normalize_window(mut self, enabled: bool) -> Self {
        self.normalize_window = enabled;
        self
    }

    pub fn cola_eps(mut self, eps: f64) -> Self {
        self.cola_eps = eps;
        self
    }
}

/// The engine. See the module docs for the threading contract.
pub struct Segmenter {
    config: SegmenterConfig,
    geometry: FrameGeometry,
    interior_window: Vec<f64>,
    leading_window: Vec<f64>,
    trailing_window: Vec<f64>,
    /// Present only for power-of-two frame sizes; the spectral transforms
    /// reject other sizes during shape validation before reaching this.
    dft: Option<RealDft>,
    scratch: Vec<f64>,
}

impl Segmenter {
    /// Validate the configuration and derive the operating windows.
    ///
    /// Checks, in order: even frame size, hop not exceeding the frame,
    /// window length, non-negative window samples, COLA compliance. The
    /// first failure is returned as-is.
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        if config.frame_size % 2 != 0 {
            return Err(SegmenterError::OddFrameSize(config.frame_size));
        }
        if config.hop_size > config.frame_size {
            return Err(SegmenterError::HopExceedsFrameSize {
                hop_size: config.hop_size,
                frame_size: config.frame_size,
            });
        }
        if config.window.len() != config.frame_size {
            return Err(SegmenterError::WindowLengthMismatch {
                expected: config.frame_size,
                actual: config.window.len(),
            });
        }
        for (index, &value) in config.window.iter().enumerate() {
            if value < 0.0 {
                return Err(SegmenterError::NegativeWindowSample { index, value });
            }
        }

        let cola = check_cola(&config.window, config.hop_size, config.cola_eps);
        if !cola.is_cola {
            return Err(SegmenterError::NotCola {
                deviation: cola.deviation,
                eps: config.cola_eps,
            });
        }
        log::debug!(
            "segmenter: frame_size={} hop_size={} mode={:?} cola deviation={:e} normalization={}",
            config.frame_size,
            config.hop_size,
            config.mode,
            cola.deviation,
            cola.normalization
        );

        let mut interior_window = config.window.clone();
        let mut leading_window = config.window.clone();
        let mut trailing_window = config.window.clone();

        if config.edge_correction {
            apply_edge_correction(
                &config.window,
                config.hop_size,
                &mut leading_window,
                &mut trailing_window,
            );
        }

        if config.normalize_window {
            for w in [&mut interior_window, &mut leading_window, &mut trailing_window] {
                w.iter_mut().for_each(|s| *s /= cola.normalization);
            }
        }

        if config.mode == Mode::Wola {
            // Samples are non-negative here: the raw window was validated
            // above and correction/normalization preserve the sign.
            for w in [&mut interior_window, &mut leading_window, &mut trailing_window] {
                w.iter_mut().for_each(|s| *s = s.sqrt());
            }
        }

        let dft = config
            .frame_size
            .is_power_of_two()
            .then(|| RealDft::new(config.frame_size));
        let geometry = FrameGeometry::new(config.frame_size, config.hop_size);
        let scratch = vec![0.0; config.frame_size];

        Ok(Segmenter {
            config,
            geometry,
            interior_window,
            leading_window,
            trailing_window,
            dft,
            scratch,
        })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// COLA-normalized window applied to all frames except the first and
    /// last of a sequence (square-rooted in WOLA mode).
    pub fn interior_window(&self) -> &[f64] {
        &self.interior_window
    }

    /// Interior window plus the compensation for frames missing before the
    /// start of a finite signal.
    pub fn leading_window(&self) -> &[f64] {
        &self.leading_window
    }

    /// The symmetric correction for the last frame.
    pub fn trailing_window(&self) -> &[f64] {
        &self.trailing_window
    }

    /// Segmented shape a signal of the given shape produces.
    pub fn segmented_shape(&self, signal: SignalShape) -> Result<FrameShape> {
        self.geometry.segmented_from_signal(signal)
    }

    /// Signal shape a segmented tensor reconstructs into.
    pub fn signal_shape_from_segmented(&self, segmented: FrameShape) -> Result<SignalShape> {
        self.geometry.signal_from_segmented(segmented)
    }

    /// Spectrogram shape a signal of the given shape produces.
    pub fn spectrum_shape(&self, signal: SignalShape) -> Result<SpectrumShape> {
        self.geometry.spectrum_from_signal(signal)
    }

    /// Signal shape a spectrogram reconstructs into.
    pub fn signal_shape_from_spectrum(&self, spectrum: SpectrumShape) -> Result<SignalShape> {
        self.geometry.signal_from_spectrum(spectrum)
    }

    /// Cut a batch of signals into overlapping frames.
    ///
    /// In WOLA mode each frame is weighted by its operating window (leading
    /// for the first frame, trailing for the last, interior otherwise; a
    /// single frame gets the leading window only). In OLA mode the copy is
    /// unweighted and windowing happens entirely in [`Self::unsegment`].
    pub fn segment(
        &self,
        input: &[f64],
        input_shape: SignalShape,
        output: &mut [f64],
        output_shape: FrameShape,
    ) -> Result<()> {
        self.geometry.validate_segmented(input_shape, output_shape)?;
        check_buffer_len(input, input_shape.len())?;
        check_buffer_len(output, output_shape.len())?;

        let frame_size = self.config.frame_size;
        let hop_size = self.config.hop_size;
        let num_frames = output_shape.num_frames;

        for b in 0..input_shape.batch {
            let row = &input[b * input_shape.num_samples..(b + 1) * input_shape.num_samples];
            for j in 0..num_frames {
                let src = &row[j * hop_size..j * hop_size + frame_size];
                let dst_start = (b * num_frames + j) * frame_size;
                let dst = &mut output[dst_start..dst_start + frame_size];
                match self.config.mode {
                    Mode::Wola => {
                        let window = self.frame_window(j, num_frames);
                        for k in 0..frame_size {
                            dst[k] = window[k] * src[k];
                        }
                    }
                    Mode::Ola => dst.copy_from_slice(src),
                }
            }
        }
        Ok(())
    }

    /// Overlap-add reconstruction, the exact inverse of [`Self::segment`].
    ///
    /// The output is zeroed and every contributing frame's windowed value is
    /// accumulated into it; overlapping frames sum.
    pub fn unsegment(
        &self,
        input: &[f64],
        input_shape: FrameShape,
        output: &mut [f64],
        output_shape: SignalShape,
    ) -> Result<()> {
        self.geometry.validate_segmented(output_shape, input_shape)?;
        check_buffer_len(input, input_shape.len())?;
        check_buffer_len(output, output_shape.len())?;

        let frame_size = self.config.frame_size;
        let hop_size = self.config.hop_size;
        let num_frames = input_shape.num_frames;

        output.fill(0.0);
        for b in 0..output_shape.batch {
            let row =
                &mut output[b * output_shape.num_samples..(b + 1) * output_shape.num_samples];
            for j in 0..num_frames {
                let src_start = (b * num_frames + j) * frame_size;
                let src = &input[src_start..src_start + frame_size];
                let window = self.frame_window(j, num_frames);
                for k in 0..frame_size {
                    row[j * hop_size + k] += window[k] * src[k];
                }
            }
        }
        Ok(())
    }

    /// Like [`Self::segment`] but passes each windowed frame through the
    /// forward FFT, producing half-spectrum complex frames.
    pub fn spectrogram(
        &mut self,
        input: &[f64],
        input_shape: SignalShape,
        output: &mut [Complex<f64>],
        output_shape: SpectrumShape,
    ) -> Result<()> {
        self.geometry.validate_spectrum(input_shape, output_shape)?;
        check_buffer_len(input, input_shape.len())?;
        check_buffer_len(output, output_shape.len())?;

        let frame_size = self.config.frame_size;
        let hop_size = self.config.hop_size;
        let mode = self.config.mode;
        let num_frames = output_shape.num_frames;
        let num_bins = output_shape.num_bins;

        // Validation guarantees a power-of-two frame size, so the plans exist.
        let dft = match self.dft.as_mut() {
            Some(dft) => dft,
            None => return Err(SegmenterError::NonPowerOfTwoFrameSize(frame_size)),
        };

        for b in 0..input_shape.batch {
            let row = &input[b * input_shape.num_samples..(b + 1) * input_shape.num_samples];
            for j in 0..num_frames {
                let src = &row[j * hop_size..j * hop_size + frame_size];
                match mode {
                    Mode::Wola => {
                        let window = frame_window_of(
                            &self.leading_window,
                            &self.interior_window,
                            &self.trailing_window,
                            j,
                            num_frames,
                        );
                        for k in 0..frame_size {
                            self.scratch[k] = window[k] * src[k];
                        }
                    }
                    Mode::Ola => self.scratch.copy_from_slice(src),
                }
                let dst_start = (b * num_frames + j) * num_bins;
                dft.forward(&self.scratch, &mut output[dst_start..dst_start + num_bins])?;
            }
        }
        Ok(())
    }

    /// Inverse of [`Self::spectrogram`]: each complex frame goes through the
    /// inverse FFT and is then accumulated exactly as in [`Self::unsegment`].
    pub fn unspectrogram(
        &mut self,
        input: &[Complex<f64>],
        input_shape: SpectrumShape,
        output: &mut [f64],
        output_shape: SignalShape,
    ) -> Result<()> {
        self.geometry.validate_spectrum(output_shape, input_shape)?;
        check_buffer_len(input, input_shape.len())?;
        check_buffer_len(output, output_shape.len())?;

        let frame_size = self.config.frame_size;
        let hop_size = self.config.hop_size;
        let num_frames = input_shape.num_frames;
        let num_bins = input_shape.num_bins;

        let dft = match self.dft.as_mut() {
            Some(dft) => dft,
            None => return Err(SegmenterError::NonPowerOfTwoFrameSize(frame_size)),
        };

        output.fill(0.0);
        for b in 0..output_shape.batch {
            for j in 0..num_frames {
                let src_start = (b * num_frames + j) * num_bins;
                dft.inverse(&input[src_start..src_start + num_bins], &mut self.scratch)?;

                let window = frame_window_of(
                    &self.leading_window,
                    &self.interior_window,
                    &self.trailing_window,
                    j,
                    num_frames,
                );
                let row_start = b * output_shape.num_samples;
                for k in 0..frame_size {
                    output[row_start + j * hop_size + k] += window[k] * self.scratch[k];
                }
            }
        }
        Ok(())
    }

    fn frame_window(&self, j: usize, num_frames: usize) -> &[f64] {
        frame_window_of(
            &self.leading_window,
            &self.interior_window,
            &self.trailing_window,
            j,
            num_frames,
        )
    }
}

/// Pick the operating window for frame `j` of `num_frames`.
///
/// A single frame is simultaneously first and last; it gets the leading
/// window only, never both corrections.
fn frame_window_of<'a>(
    leading: &'a [f64],
    interior: &'a [f64],
    trailing: &'a [f64],
    j: usize,
    num_frames: usize,
) -> &'a [f64] {
    if j == 0 {
        leading
    } else if j + 1 == num_frames {
        trailing
    } else {
        interior
    }
}

/// Fold the contributions of the frames missing beyond each boundary back
/// into the edge windows.
///
/// At steady state, sample `k` of a frame also receives `window[k + s]` from
/// the neighbor shifted `s` samples earlier, for every hop multiple `s`. At
/// the start of a finite signal those neighbors do not exist, so their mass
/// is added to the leading window directly; the trailing window gets the
/// mirror-image treatment. When `hop_size == frame_size` no shift lands
/// inside the frame and both windows stay equal to the interior one.
fn apply_edge_correction(
    window: &[f64],
    hop_size: usize,
    leading: &mut [f64],
    trailing: &mut [f64],
) {
    let frame_size = window.len();
    let mut shift = hop_size;
    while shift < frame_size {
        for k in 0..frame_size - shift {
            leading[k] += window[k + shift];
            trailing[k + shift] += window[k];
        }
        shift += hop_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{generate, WindowKind};

    fn hann_config() -> SegmenterConfig {
        SegmenterConfig::new(8, 4, generate(WindowKind::Hann, 8))
    }

    #[test]
    fn mode_parsing_is_case_sensitive() {
        assert_eq!("wola".parse::<Mode>().unwrap(), Mode::Wola);
        assert_eq!("ola".parse::<Mode>().unwrap(), Mode::Ola);
        for bad in ["WOLA", "Ola", "", "overlap-add"] {
            assert!(matches!(
                bad.parse::<Mode>(),
                Err(SegmenterError::UnknownMode(_))
            ));
        }
    }

    #[test]
    fn odd_frame_size_fails_first() {
        // Odd frame size must win even when other parameters are also bad.
        let config = SegmenterConfig::new(7, 9, vec![]);
        assert!(matches!(
            Segmenter::new(config),
            Err(SegmenterError::OddFrameSize(7))
        ));
    }

    #[test]
    fn hop_larger_than_frame_is_rejected() {
        let config = SegmenterConfig::new(8, 9, generate(WindowKind::Hann, 8));
        assert!(matches!(
            Segmenter::new(config),
            Err(SegmenterError::HopExceedsFrameSize { hop_size: 9, frame_size: 8 })
        ));
    }

    #[test]
    fn window_length_mismatch_is_rejected() {
        let config = SegmenterConfig::new(8, 4, generate(WindowKind::Hann, 6));
        assert!(matches!(
            Segmenter::new(config),
            Err(SegmenterError::WindowLengthMismatch { expected: 8, actual: 6 })
        ));
    }

    #[test]
    fn negative_window_sample_is_rejected() {
        let mut window = generate(WindowKind::Hann, 8);
        window[3] = -0.25;
        let config = SegmenterConfig::new(8, 4, window);
        assert!(matches!(
            Segmenter::new(config),
            Err(SegmenterError::NegativeWindowSample { index: 3, .. })
        ));
    }

    #[test]
    fn non_cola_window_is_rejected_with_deviation() {
        // Hann at hop 3 against frame 8 misses the COLA condition.
        let config = SegmenterConfig::new(8, 3, generate(WindowKind::Hann, 8));
        match Segmenter::new(config) {
            Err(SegmenterError::NotCola { deviation, eps }) => {
                assert!(deviation > eps);
            }
            other => panic!("expected NotCola, got {:?}", other.err()),
        }
    }

    #[test]
    fn hann_half_overlap_constructs() {
        Segmenter::new(hann_config()).unwrap();
    }

    #[test]
    fn edge_correction_is_noop_when_hop_equals_frame() {
        let config = SegmenterConfig::new(8, 8, generate(WindowKind::Rectangular, 8));
        let seg = Segmenter::new(config).unwrap();
        assert_eq!(seg.leading_window(), seg.interior_window());
        assert_eq!(seg.trailing_window(), seg.interior_window());
    }

    #[test]
    fn edge_windows_absorb_missing_neighbors() {
        // Without normalization or WOLA sqrt the derivation is directly
        // visible: leading[k] = w[k] + w[k + hop] while that index exists.
        let window = generate(WindowKind::Hann, 8);
        let config = SegmenterConfig::new(8, 4, window.clone())
            .mode(Mode::Ola)
            .normalize_window(false);
        let seg = Segmenter::new(config).unwrap();

        for k in 0..8 {
            let expected = window[k] + if k + 4 < 8 { window[k + 4] } else { 0.0 };
            assert!(
                (seg.leading_window()[k] - expected).abs() < 1e-12,
                "leading[{k}]"
            );
            let expected = window[k] + if k >= 4 { window[k - 4] } else { 0.0 };
            assert!(
                (seg.trailing_window()[k] - expected).abs() < 1e-12,
                "trailing[{k}]"
            );
        }
    }

    #[test]
    fn wola_windows_are_square_rooted() {
        let window = generate(WindowKind::Hann, 8);
        let config = SegmenterConfig::new(8, 4, window.clone())
            .edge_correction(false)
            .normalize_window(false);
        let seg = Segmenter::new(config).unwrap();
        for k in 0..8 {
            assert!((seg.interior_window()[k] - window[k].sqrt()).abs() < 1e-12);
        }
    }

    #[test]
    fn segment_ramp_scenario() {
        // frame_size=8, hop_size=4, Hann, WOLA, normalize and edge
        // correction on: a 16-sample ramp yields exactly 3 frames of 8, the
        // first weighted by the leading window and the last by the trailing.
        let seg = Segmenter::new(hann_config()).unwrap();
        let input: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let ishape = SignalShape::new(1, 16);
        let oshape = seg.segmented_shape(ishape).unwrap();
        assert_eq!(oshape, FrameShape::new(1, 3, 8));

        let mut output = vec![0.0; oshape.len()];
        seg.segment(&input, ishape, &mut output, oshape).unwrap();

        for k in 0..8 {
            assert!((output[k] - seg.leading_window()[k] * input[k]).abs() < 1e-12);
            assert!(
                (output[8 + k] - seg.interior_window()[k] * input[4 + k]).abs() < 1e-12
            );
            assert!(
                (output[16 + k] - seg.trailing_window()[k] * input[8 + k]).abs() < 1e-12
            );
        }
    }

    #[test]
    fn single_frame_gets_leading_window_only() {
        let seg = Segmenter::new(hann_config()).unwrap();
        let input: Vec<f64> = (0..8).map(|i| 1.0 + i as f64).collect();
        let ishape = SignalShape::new(1, 8);
        let oshape = seg.segmented_shape(ishape).unwrap();
        assert_eq!(oshape.num_frames, 1);

        let mut output = vec![0.0; oshape.len()];
        seg.segment(&input, ishape, &mut output, oshape).unwrap();

        for k in 0..8 {
            assert!(
                (output[k] - seg.leading_window()[k] * input[k]).abs() < 1e-12,
                "frame 0 must be weighted by the leading window alone"
            );
        }
    }

    #[test]
    fn ola_segment_copies_unweighted() {
        let config = hann_config().mode(Mode::Ola);
        let seg = Segmenter::new(config).unwrap();
        let input: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let ishape = SignalShape::new(1, 16);
        let oshape = seg.segmented_shape(ishape).unwrap();

        let mut output = vec![0.0; oshape.len()];
        seg.segment(&input, ishape, &mut output, oshape).unwrap();

        for j in 0..3 {
            for k in 0..8 {
                assert_eq!(output[j * 8 + k], input[j * 4 + k]);
            }
        }
    }

    #[test]
    fn shape_validation_happens_before_any_write() {
        let seg = Segmenter::new(hann_config()).unwrap();
        let input = vec![1.0; 16];
        let mut output = vec![7.0; 24];
        // Wrong frame count: claim 2 frames instead of 3.
        let err = seg
            .segment(
                &input,
                SignalShape::new(1, 16),
                &mut output,
                FrameShape::new(1, 2, 8),
            )
            .unwrap_err();
        assert!(matches!(err, SegmenterError::FrameCountMismatch { .. }));
        assert!(output.iter().all(|&x| x == 7.0), "output was touched");
    }

    #[test]
    fn zero_frame_segmented_shape_is_rejected() {
        let seg = Segmenter::new(hann_config()).unwrap();
        assert!(matches!(
            seg.signal_shape_from_segmented(FrameShape::new(1, 0, 8)),
            Err(SegmenterError::SignalTooShort { num_samples: 0, frame_size: 8 })
        ));
        assert!(matches!(
            seg.signal_shape_from_spectrum(SpectrumShape::new(1, 0, 5)),
            Err(SegmenterError::SignalTooShort { num_samples: 0, frame_size: 8 })
        ));
    }

    #[test]
    fn buffer_length_mismatch_is_rejected() {
        let seg = Segmenter::new(hann_config()).unwrap();
        let input = vec![1.0; 15]; // one sample short of its declared shape
        let mut output = vec![0.0; 24];
        let err = seg
            .segment(
                &input,
                SignalShape::new(1, 16),
                &mut output,
                FrameShape::new(1, 3, 8),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SegmenterError::BufferSizeMismatch { expected: 16, actual: 15 }
        ));
    }

    #[test]
    fn spectral_call_on_non_power_of_two_frame_is_rejected() {
        let config = SegmenterConfig::new(12, 6, generate(WindowKind::Hann, 12));
        let mut seg = Segmenter::new(config).unwrap();
        let input = vec![0.0; 24];
        let mut output = vec![Complex::new(0.0, 0.0); 2 * 7];
        let err = seg
            .spectrogram(
                &input,
                SignalShape::new(1, 24),
                &mut output,
                SpectrumShape::new(1, 2, 7),
            )
            .unwrap_err();
        assert!(matches!(err, SegmenterError::NonPowerOfTwoFrameSize(12)));
    }

    #[test]
    fn config_snapshot_round_trips_through_serde() {
        let config = hann_config().mode(Mode::Ola).cola_eps(1e-3);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"ola\""));
        let back: SegmenterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
