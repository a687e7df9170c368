//! Device boundary: the signal generator's waveform RAM and its start flag.
//!
//! The loader only needs three primitives from the signal generator: stage a
//! sample, push every staged sample in one transfer, and reset the playback
//! state machine. [`WaveformSink`] is exactly that surface.

pub mod memory;
pub mod wav;

pub use memory::{MemorySigGen, SoftwareFlag};
pub use wav::WavSink;

/// Errors reported by a device backend.
#[derive(Debug)]
pub enum SinkError {
    /// A staged write addressed past the end of waveform RAM.
    IndexOutOfRange { index: usize, depth: usize },
    /// The underlying transport failed.
    Io(std::io::Error),
    /// The device rejected the operation.
    Device(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::IndexOutOfRange { index, depth } => {
                write!(f, "waveform index {index} out of range (depth {depth})")
            }
            SinkError::Io(e) => write!(f, "device I/O error: {e}"),
            SinkError::Device(s) => write!(f, "device error: {s}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError::Io(e)
    }
}

impl From<hound::Error> for SinkError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => SinkError::Io(io),
            other => SinkError::Device(other.to_string()),
        }
    }
}

/// Waveform RAM of a signal generator.
///
/// `buffered_set` only stages a value; nothing reaches the device until
/// `commit`. `reset` restarts the generator's load/playback state machine.
pub trait WaveformSink {
    /// Stage `value` at RAM index `index`.
    fn buffered_set(&mut self, index: usize, value: i16) -> Result<(), SinkError>;

    /// Push every staged value to the device in one transfer.
    fn commit(&mut self) -> Result<(), SinkError>;

    /// Reset the signal generator so it picks up the committed contents.
    fn reset(&mut self) -> Result<(), SinkError>;
}

/// One-bit start register of the DAC signal generator.
pub trait TriggerLine {
    fn set(&mut self, high: bool) -> Result<(), SinkError>;
}

impl<S: WaveformSink + ?Sized> WaveformSink for Box<S> {
    fn buffered_set(&mut self, index: usize, value: i16) -> Result<(), SinkError> {
        (**self).buffered_set(index, value)
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        (**self).commit()
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        (**self).reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_error_display() {
        assert_eq!(
            SinkError::IndexOutOfRange { index: 9, depth: 8 }.to_string(),
            "waveform index 9 out of range (depth 8)"
        );
        assert_eq!(
            SinkError::Device("bus timeout".into()).to_string(),
            "device error: bus timeout"
        );
    }

    #[test]
    fn boxed_sink_forwards() {
        let mut sink: Box<dyn WaveformSink> = Box::new(MemorySigGen::new(2));
        sink.buffered_set(0, 7).unwrap();
        sink.commit().unwrap();
        sink.reset().unwrap();
        assert!(sink.buffered_set(2, 0).is_err());
    }
}
