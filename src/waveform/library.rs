//! Recorded SiPM waveform table: 100 calibration waveforms loaded once at startup.
//!
//! The table is plain comma-separated integers, one waveform per row. Rows may
//! carry more fields than the configured buffer length; the extras are ignored.

use std::io::BufRead;
use std::path::Path;

use super::limiter::SAMPLE_LIMIT;
use super::WaveformBuffer;

/// Number of waveforms in the recorded table.
pub const LIBRARY_SIZE: usize = 100;

/// Errors that can occur when loading the recorded waveform table.
#[derive(Debug)]
pub enum LibraryError {
    /// The table could not be opened or read.
    Io(std::io::Error),
    /// The table does not hold exactly [`LIBRARY_SIZE`] rows.
    RowCount { expected: usize, actual: usize },
    /// A row has fewer fields than the buffer length.
    ShortRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// A field is not an integer.
    BadSample {
        row: usize,
        column: usize,
        value: String,
    },
    /// A field is outside `[-32767, 32767]`.
    SampleOutOfRange { row: usize, column: usize, value: i64 },
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(e) => write!(f, "waveform table I/O error: {e}"),
            LibraryError::RowCount { expected, actual } => {
                write!(f, "waveform table has {actual} rows, expected {expected}")
            }
            LibraryError::ShortRow {
                row,
                expected,
                actual,
            } => write!(f, "row {row} has {actual} samples, expected at least {expected}"),
            LibraryError::BadSample { row, column, value } => {
                write!(f, "row {row} column {column}: {value:?} is not an integer")
            }
            LibraryError::SampleOutOfRange { row, column, value } => {
                write!(f, "row {row} column {column}: {value} exceeds ±{SAMPLE_LIMIT}")
            }
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LibraryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(e: std::io::Error) -> Self {
        LibraryError::Io(e)
    }
}

/// The fixed set of recorded waveforms. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct RecordedWaveformLibrary {
    waveforms: Vec<WaveformBuffer>,
}

impl RecordedWaveformLibrary {
    /// Load the table from a file.
    pub fn load(path: &Path, buffer_length: usize) -> Result<Self, LibraryError> {
        let file = std::fs::File::open(path)?;
        let library = Self::from_reader(std::io::BufReader::new(file), buffer_length)?;
        log::info!(
            "loaded {} recorded waveforms from {}",
            library.len(),
            path.display()
        );
        Ok(library)
    }

    /// Parse the table from any buffered reader. Blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R, buffer_length: usize) -> Result<Self, LibraryError> {
        let mut waveforms = Vec::with_capacity(LIBRARY_SIZE);

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = waveforms.len();
            waveforms.push(parse_row(line, row, buffer_length)?);
        }

        if waveforms.len() != LIBRARY_SIZE {
            return Err(LibraryError::RowCount {
                expected: LIBRARY_SIZE,
                actual: waveforms.len(),
            });
        }

        Ok(Self { waveforms })
    }

    /// Build from in-memory rows, applying the same checks as the file loader.
    pub fn from_rows(rows: Vec<Vec<i16>>, buffer_length: usize) -> Result<Self, LibraryError> {
        if rows.len() != LIBRARY_SIZE {
            return Err(LibraryError::RowCount {
                expected: LIBRARY_SIZE,
                actual: rows.len(),
            });
        }

        let mut waveforms = Vec::with_capacity(LIBRARY_SIZE);
        for (row, mut samples) in rows.into_iter().enumerate() {
            if samples.len() < buffer_length {
                return Err(LibraryError::ShortRow {
                    row,
                    expected: buffer_length,
                    actual: samples.len(),
                });
            }
            if let Some(column) = samples.iter().position(|&s| s == i16::MIN) {
                return Err(LibraryError::SampleOutOfRange {
                    row,
                    column,
                    value: i64::from(i16::MIN),
                });
            }
            samples.truncate(buffer_length);
            waveforms.push(WaveformBuffer::from_samples(samples));
        }

        Ok(Self { waveforms })
    }

    /// Waveform at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&WaveformBuffer> {
        self.waveforms.get(index)
    }

    /// All waveforms in table order.
    pub fn waveforms(&self) -> &[WaveformBuffer] {
        &self.waveforms
    }

    /// Number of waveforms.
    pub fn len(&self) -> usize {
        self.waveforms.len()
    }

    /// Always false for a successfully loaded table.
    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    /// Samples per waveform.
    pub fn buffer_length(&self) -> usize {
        self.waveforms.first().map_or(0, WaveformBuffer::len)
    }
}

fn parse_row(line: &str, row: usize, buffer_length: usize) -> Result<WaveformBuffer, LibraryError> {
    let mut samples = Vec::with_capacity(buffer_length);

    for (column, field) in line.split(',').take(buffer_length).enumerate() {
        let field = field.trim();
        let value: i64 = field.parse().map_err(|_| LibraryError::BadSample {
            row,
            column,
            value: field.to_string(),
        })?;
        if !(-i64::from(SAMPLE_LIMIT)..=i64::from(SAMPLE_LIMIT)).contains(&value) {
            return Err(LibraryError::SampleOutOfRange { row, column, value });
        }
        samples.push(value as i16);
    }

    if samples.len() < buffer_length {
        return Err(LibraryError::ShortRow {
            row,
            expected: buffer_length,
            actual: samples.len(),
        });
    }

    Ok(WaveformBuffer::from_samples(samples))
}
