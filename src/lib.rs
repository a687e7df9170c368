//! Photon SigGen: DAC waveform synthesis and signal-generator loading for the
//! RFSoC photon-detector board.

pub mod config;
pub mod control;
pub mod device;
pub mod loader;
pub mod logging;
pub mod waveform;
