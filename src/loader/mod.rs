//! Signal-generator loader: picks a waveform source, writes the result into
//! the generator's RAM, commits it and resets the generator.
//!
//! A load is all-or-nothing from the caller's point of view: every sample is
//! staged, then one commit pushes them, and only after a successful commit is
//! the generator reset. A failed stage or commit never resets the device, so
//! it keeps playing the previously committed waveform. Retrying means calling
//! [`SigGenLoader::load_waveform`] again from the start.

use serde::{Deserialize, Serialize};

use crate::config::LoaderConfig;
use crate::device::{SinkError, WaveformSink};
use crate::waveform::{EventParameterSet, ParameterError, Player, PulseSynth, WaveformBuffer};

/// Which source the next load draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Render the current event parameters.
    #[default]
    Synthesize,
    /// Play the next recorded waveform.
    Playback,
}

impl From<bool> for RunMode {
    /// `true` selects playback, matching the boolean `RunMode` register.
    fn from(playback: bool) -> Self {
        if playback {
            RunMode::Playback
        } else {
            RunMode::Synthesize
        }
    }
}

/// Source resolved at the start of one load.
#[derive(Debug, Clone, Copy)]
pub enum WaveformSource<'a> {
    Synthesize(&'a EventParameterSet),
    Play(usize),
}

/// Errors from a single load.
#[derive(Debug)]
pub enum LoadError {
    /// Staging a sample failed; nothing was committed.
    Write { index: usize, source: SinkError },
    /// The bulk commit failed; the generator was not reset.
    Commit(SinkError),
    /// The commit succeeded but the generator reset failed.
    Reset(SinkError),
    /// The recorded waveforms are not as long as the configured buffer.
    LibraryLength { expected: usize, actual: usize },
    /// No recorded waveform at this library index.
    MissingWaveform(usize),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Write { index, source } => {
                write!(f, "staging sample {index} failed: {source}")
            }
            LoadError::Commit(e) => write!(f, "waveform commit failed: {e}"),
            LoadError::Reset(e) => write!(f, "signal generator reset failed: {e}"),
            LoadError::LibraryLength { expected, actual } => write!(
                f,
                "recorded waveforms hold {actual} samples, buffer needs {expected}"
            ),
            LoadError::MissingWaveform(index) => write!(f, "no recorded waveform {index}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Write { source, .. } => Some(source),
            LoadError::Commit(e) | LoadError::Reset(e) => Some(e),
            LoadError::LibraryLength { .. } | LoadError::MissingWaveform(_) => None,
        }
    }
}

/// What a successful load delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub mode: RunMode,
    /// Library index of the played waveform, for playback loads.
    pub playback_index: Option<usize>,
    pub samples: usize,
}

/// Loads synthesized or recorded waveforms into a signal generator.
///
/// `load_waveform` takes `&mut self`, so two loads on the same loader can
/// never interleave; share it across threads only through a single owner such
/// as [`ControlLoop`](crate::control::ControlLoop).
pub struct SigGenLoader<S> {
    synth: PulseSynth,
    params: EventParameterSet,
    run_mode: RunMode,
    player: Player,
    sink: S,
    loads: u64,
}

impl<S: WaveformSink> SigGenLoader<S> {
    /// Build a loader from config, an already-loaded player and a device.
    ///
    /// Fails if the player's waveforms differ in length from the configured
    /// buffer.
    pub fn new(config: &LoaderConfig, player: Player, sink: S) -> Result<Self, LoadError> {
        if player.buffer_length() != config.buffer_length() {
            return Err(LoadError::LibraryLength {
                expected: config.buffer_length(),
                actual: player.buffer_length(),
            });
        }
        Ok(Self {
            synth: PulseSynth::new(config.sample_rate, config.buffer_length()),
            params: EventParameterSet::uniform(config.max_events, config.events.into()),
            run_mode: config.run_mode,
            player,
            sink,
            loads: 0,
        })
    }

    pub fn params(&self) -> &EventParameterSet {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut EventParameterSet {
        &mut self.params
    }

    pub fn set_amplitude(&mut self, values: Vec<i16>) -> Result<(), ParameterError> {
        self.params.set_amplitude(values)
    }

    pub fn set_decay(&mut self, values: Vec<f64>) -> Result<(), ParameterError> {
        self.params.set_decay(values)
    }

    pub fn set_rise(&mut self, values: Vec<f64>) -> Result<(), ParameterError> {
        self.params.set_rise(values)
    }

    pub fn set_incident_time(&mut self, values: Vec<f64>) -> Result<(), ParameterError> {
        self.params.set_incident_time(values)
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn set_run_mode(&mut self, mode: RunMode) {
        self.run_mode = mode;
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn synth(&self) -> &PulseSynth {
        &self.synth
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Number of successful loads so far.
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    /// Resolve the run mode into a source. Called once per load.
    pub fn source(&self) -> WaveformSource<'_> {
        match self.run_mode {
            RunMode::Synthesize => WaveformSource::Synthesize(&self.params),
            RunMode::Playback => WaveformSource::Play(self.player.cursor()),
        }
    }

    /// Produce the waveform for `source`. `None` if a playback index is
    /// outside the library.
    pub fn render(&self, source: WaveformSource<'_>) -> Option<WaveformBuffer> {
        match source {
            WaveformSource::Synthesize(params) => Some(self.synth.render(params)),
            WaveformSource::Play(index) => self.player.library().get(index).cloned(),
        }
    }

    /// Build the active waveform, write it to the generator, commit, reset.
    ///
    /// In playback mode the cursor advances only after the whole sequence
    /// succeeds, so a retry after a failure delivers the same waveform.
    pub fn load_waveform(&mut self) -> Result<LoadOutcome, LoadError> {
        let source = self.source();
        let (mode, playback_index) = match source {
            WaveformSource::Synthesize(_) => (RunMode::Synthesize, None),
            WaveformSource::Play(index) => (RunMode::Playback, Some(index)),
        };
        let waveform = self
            .render(source)
            .ok_or(LoadError::MissingWaveform(playback_index.unwrap_or_default()))?;

        write_and_commit(&mut self.sink, &waveform)?;
        self.sink.reset().map_err(LoadError::Reset)?;

        if mode == RunMode::Playback {
            self.player.advance();
        }
        self.loads += 1;

        log::info!(
            "loaded {} samples ({mode:?}{})",
            waveform.len(),
            playback_index.map_or(String::new(), |i| format!(", waveform {i}"))
        );

        Ok(LoadOutcome {
            mode,
            playback_index,
            samples: waveform.len(),
        })
    }

    /// Give back the device.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Stage every sample of `waveform`, then push them in one commit.
pub fn write_and_commit<S: WaveformSink + ?Sized>(
    sink: &mut S,
    waveform: &WaveformBuffer,
) -> Result<(), LoadError> {
    for (index, &value) in waveform.samples().iter().enumerate() {
        sink.buffered_set(index, value)
            .map_err(|source| LoadError::Write { index, source })?;
    }
    sink.commit().map_err(LoadError::Commit)
}
