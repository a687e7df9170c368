//! Per-event pulse parameters, exposed to the control plane as four fixed-length arrays.

use crate::config::EventDefaults;

/// Errors from writing event parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// An array write did not match the number of event slots.
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A per-slot write addressed a slot that doesn't exist.
    IndexOutOfRange { index: usize, max_events: usize },
}

impl std::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterError::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(f, "{field} needs {expected} values, got {actual}"),
            ParameterError::IndexOutOfRange { index, max_events } => {
                write!(f, "event index {index} out of range (max_events = {max_events})")
            }
        }
    }
}

impl std::error::Error for ParameterError {}

/// One photon event's pulse shape.
///
/// `decay` and `rise` are expected to be positive; zero or negative values are
/// evaluated as-is by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotonEvent {
    /// Peak scale in DAC counts.
    pub amplitude: i16,
    /// Decay time constant in seconds.
    pub decay: f64,
    /// Rise time constant in seconds.
    pub rise: f64,
    /// Arrival time in seconds from the first sample.
    pub incident_time: f64,
}

impl From<EventDefaults> for PhotonEvent {
    fn from(d: EventDefaults) -> Self {
        Self {
            amplitude: d.amplitude,
            decay: d.decay,
            rise: d.rise,
            incident_time: d.incident_time,
        }
    }
}

/// Parameters for `max_events` simultaneous photon events.
///
/// Every array always has exactly `max_events` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct EventParameterSet {
    amplitude: Vec<i16>,
    decay: Vec<f64>,
    rise: Vec<f64>,
    incident_time: Vec<f64>,
}

impl EventParameterSet {
    /// Fill every slot with the same event.
    pub fn uniform(max_events: usize, event: PhotonEvent) -> Self {
        Self {
            amplitude: vec![event.amplitude; max_events],
            decay: vec![event.decay; max_events],
            rise: vec![event.rise; max_events],
            incident_time: vec![event.incident_time; max_events],
        }
    }

    /// Build from explicit events; the slot count is `events.len()`.
    pub fn from_events(events: &[PhotonEvent]) -> Self {
        Self {
            amplitude: events.iter().map(|e| e.amplitude).collect(),
            decay: events.iter().map(|e| e.decay).collect(),
            rise: events.iter().map(|e| e.rise).collect(),
            incident_time: events.iter().map(|e| e.incident_time).collect(),
        }
    }

    /// Number of event slots.
    pub fn max_events(&self) -> usize {
        self.amplitude.len()
    }

    /// Event in slot `index`.
    pub fn event(&self, index: usize) -> Option<PhotonEvent> {
        Some(PhotonEvent {
            amplitude: *self.amplitude.get(index)?,
            decay: self.decay[index],
            rise: self.rise[index],
            incident_time: self.incident_time[index],
        })
    }

    /// All events in slot order.
    pub fn events(&self) -> impl Iterator<Item = PhotonEvent> + '_ {
        (0..self.max_events()).filter_map(|i| self.event(i))
    }

    pub fn amplitude(&self) -> &[i16] {
        &self.amplitude
    }

    pub fn decay(&self) -> &[f64] {
        &self.decay
    }

    pub fn rise(&self) -> &[f64] {
        &self.rise
    }

    pub fn incident_time(&self) -> &[f64] {
        &self.incident_time
    }

    pub fn set_amplitude(&mut self, values: Vec<i16>) -> Result<(), ParameterError> {
        check_len("Amplitude", self.max_events(), values.len())?;
        self.amplitude = values;
        Ok(())
    }

    pub fn set_decay(&mut self, values: Vec<f64>) -> Result<(), ParameterError> {
        check_len("Decay", self.max_events(), values.len())?;
        self.decay = values;
        Ok(())
    }

    pub fn set_rise(&mut self, values: Vec<f64>) -> Result<(), ParameterError> {
        check_len("Rise", self.max_events(), values.len())?;
        self.rise = values;
        Ok(())
    }

    pub fn set_incident_time(&mut self, values: Vec<f64>) -> Result<(), ParameterError> {
        check_len("IncidentTime", self.max_events(), values.len())?;
        self.incident_time = values;
        Ok(())
    }

    /// Overwrite a single slot.
    pub fn set_event(&mut self, index: usize, event: PhotonEvent) -> Result<(), ParameterError> {
        if index >= self.max_events() {
            return Err(ParameterError::IndexOutOfRange {
                index,
                max_events: self.max_events(),
            });
        }
        self.amplitude[index] = event.amplitude;
        self.decay[index] = event.decay;
        self.rise[index] = event.rise;
        self.incident_time[index] = event.incident_time;
        Ok(())
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), ParameterError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ParameterError::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}
