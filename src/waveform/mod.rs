//! DAC waveform generation: photon pulse synthesis and recorded-waveform playback.
//!
//! Both paths produce a [`WaveformBuffer`] of the configured length; the loader
//! does not care which one made it.

pub mod library;
pub mod limiter;
pub mod params;
pub mod player;
pub mod synth;

pub use library::{LibraryError, RecordedWaveformLibrary, LIBRARY_SIZE};
pub use limiter::{SampleLimiter, SAMPLE_LIMIT};
pub use params::{EventParameterSet, ParameterError, PhotonEvent};
pub use player::Player;
pub use synth::PulseSynth;

/// One waveform's worth of signed DAC samples, each within `[-SAMPLE_LIMIT, SAMPLE_LIMIT]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformBuffer {
    samples: Vec<i16>,
}

impl WaveformBuffer {
    /// A buffer of `len` zero samples.
    pub fn zeroed(len: usize) -> Self {
        Self {
            samples: vec![0; len],
        }
    }

    /// Wrap samples that are already known to be in range.
    pub(crate) fn from_samples(samples: Vec<i16>) -> Self {
        debug_assert!(samples.iter().all(|s| s.unsigned_abs() <= SAMPLE_LIMIT as u16));
        Self { samples }
    }

    /// The sample data.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consume the buffer, returning its samples.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}
