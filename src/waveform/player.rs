//! Round-robin playback over the recorded waveform table.

use super::library::RecordedWaveformLibrary;
use super::WaveformBuffer;

/// Hands out recorded waveforms in table order, wrapping after the last one.
///
/// The cursor only moves on [`advance`](Player::advance), which the loader
/// calls once the current waveform has been delivered to the device.
#[derive(Debug, Clone)]
pub struct Player {
    library: RecordedWaveformLibrary,
    cursor: usize,
}

impl Player {
    /// Start at the first waveform of `library`.
    pub fn new(library: RecordedWaveformLibrary) -> Self {
        Self { library, cursor: 0 }
    }

    /// Index of the waveform the next playback load will deliver.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Waveform under the cursor.
    pub fn current(&self) -> &WaveformBuffer {
        // The library is never empty and the cursor stays below its length.
        &self.library.waveforms()[self.cursor]
    }

    /// Move to the next waveform, wrapping to 0 after the last.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.library.len();
    }

    /// Samples per waveform.
    pub fn buffer_length(&self) -> usize {
        self.library.buffer_length()
    }

    pub fn library(&self) -> &RecordedWaveformLibrary {
        &self.library
    }
}
