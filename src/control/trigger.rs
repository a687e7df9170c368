//! Software trigger: pulses the DAC start flag to fire one waveform burst.

use crate::device::{SinkError, TriggerLine};

/// `getWaveformBurst` gated by `EnableSoftTrig`.
#[derive(Debug, Clone)]
pub struct SoftTrigger<L> {
    enabled: bool,
    line: L,
}

impl<L: TriggerLine> SoftTrigger<L> {
    pub fn new(line: L, enabled: bool) -> Self {
        Self { enabled, line }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Pulse the start flag high then low.
    ///
    /// Returns `Ok(false)` without touching the flag when the soft trigger is
    /// disabled.
    pub fn get_waveform_burst(&mut self) -> Result<bool, SinkError> {
        if !self.enabled {
            return Ok(false);
        }
        self.line.set(true)?;
        self.line.set(false)?;
        Ok(true)
    }

    pub fn line(&self) -> &L {
        &self.line
    }
}
