//! WAV-file signal generator: every commit rewrites a mono 16-bit WAV with the
//! staged waveform, one RAM entry per frame.
//!
//! A commit writes a sibling `.tmp` file and renames it over the target, so a
//! failed commit leaves the previous waveform in place.
//!
//! The DAC runs far above what a WAV header can express, so the header carries
//! a nominal rate for viewing the file in ordinary audio tools.

use std::path::{Path, PathBuf};

use super::{SinkError, WaveformSink};

/// Header sample rate used when none is given.
pub const DEFAULT_HEADER_RATE: u32 = 48_000;

/// Signal generator backed by a WAV file on disk.
#[derive(Debug, Clone)]
pub struct WavSink {
    path: PathBuf,
    header_rate: u32,
    shadow: Vec<i16>,
    commits: u64,
    resets: u64,
}

impl WavSink {
    /// A sink with `depth` entries writing to `path`.
    pub fn new(path: impl Into<PathBuf>, depth: usize) -> Self {
        Self::with_header_rate(path, depth, DEFAULT_HEADER_RATE)
    }

    pub fn with_header_rate(path: impl Into<PathBuf>, depth: usize, header_rate: u32) -> Self {
        Self {
            path: path.into(),
            header_rate,
            shadow: vec![0; depth],
            commits: 0,
            resets: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_wav(&self, path: &Path) -> Result<(), SinkError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.header_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &s in &self.shadow {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

impl WaveformSink for WavSink {
    fn buffered_set(&mut self, index: usize, value: i16) -> Result<(), SinkError> {
        let depth = self.shadow.len();
        let slot = self
            .shadow
            .get_mut(index)
            .ok_or(SinkError::IndexOutOfRange { index, depth })?;
        *slot = value;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        let staging = self.staging_path();
        if let Err(e) = self.write_wav(&staging) {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }
        std::fs::rename(&staging, &self.path)?;
        self.commits += 1;
        log::debug!(
            "committed {} samples to {}",
            self.shadow.len(),
            self.path.display()
        );
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        self.resets += 1;
        Ok(())
    }
}
