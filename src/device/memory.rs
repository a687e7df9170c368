//! In-memory signal generator, used when no board is attached and by tests.

use super::{SinkError, TriggerLine, WaveformSink};

/// Simulated DAC signal generator with separate shadow and committed RAM.
#[derive(Debug, Clone)]
pub struct MemorySigGen {
    shadow: Vec<i16>,
    committed: Vec<i16>,
    commits: u64,
    resets: u64,
}

impl MemorySigGen {
    /// A generator with `depth` sample entries, all zero.
    pub fn new(depth: usize) -> Self {
        Self {
            shadow: vec![0; depth],
            committed: vec![0; depth],
            commits: 0,
            resets: 0,
        }
    }

    /// Values the generator is currently playing.
    pub fn committed(&self) -> &[i16] {
        &self.committed
    }

    /// Staged values not yet committed.
    pub fn shadow(&self) -> &[i16] {
        &self.shadow
    }

    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    pub fn reset_count(&self) -> u64 {
        self.resets
    }
}

impl WaveformSink for MemorySigGen {
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
        self.committed.copy_from_slice(&self.shadow);
        self.commits += 1;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        self.resets += 1;
        Ok(())
    }
}

/// In-memory start flag that counts rising edges.
#[derive(Debug, Clone, Default)]
pub struct SoftwareFlag {
    high: bool,
    rising_edges: u64,
}

impl SoftwareFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Number of low-to-high transitions seen.
    pub fn rising_edges(&self) -> u64 {
        self.rising_edges
    }
}

impl TriggerLine for SoftwareFlag {
    fn set(&mut self, high: bool) -> Result<(), SinkError> {
        if high && !self.high {
            self.rising_edges += 1;
        }
        self.high = high;
        Ok(())
    }
}
