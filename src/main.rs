//! photon-siggen: load DAC waveforms into the RFSoC signal generator.
//!
//! Start-up follows the board's bring-up order for the parts handled here:
//! read config, load the recorded waveform table, build the loader, load the
//! initial waveform. With `--serve` the control loop then keeps running, firing
//! the polled soft trigger until Ctrl-C.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use photon_siggen::config::LoaderConfig;
use photon_siggen::control::{ControlLoop, SoftTrigger};
use photon_siggen::device::{MemorySigGen, SoftwareFlag, WavSink, WaveformSink};
use photon_siggen::loader::{RunMode, SigGenLoader};
use photon_siggen::logging::init_logger;
use photon_siggen::waveform::{Player, RecordedWaveformLibrary};

#[derive(Debug, Parser)]
#[command(version, about = "DAC waveform synthesizer and signal-generator loader")]
struct Args {
    /// Loader config file (YAML). Defaults to ~/.photon-siggen/loader.yaml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Install root used to locate config/SipmWave8GSPS.csv.
    #[arg(long)]
    top_level: Option<PathBuf>,

    /// Recorded waveform table, overriding the top-level lookup.
    #[arg(long)]
    library: Option<PathBuf>,

    /// Start in recorded-waveform playback mode.
    #[arg(long)]
    playback: bool,

    /// Commit waveforms to this WAV file instead of the in-memory generator.
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Number of LoadWaveform calls at start-up.
    #[arg(long, default_value_t = 1)]
    loads: u32,

    /// Keep the control loop running until Ctrl-C.
    #[arg(long)]
    serve: bool,
}

fn fail(message: String) -> ! {
    log::error!("{message}");
    process::exit(1);
}

fn main() {
    init_logger();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LoaderConfig::load(path)
            .unwrap_or_else(|e| fail(format!("{}: {e}", path.display()))),
        None => LoaderConfig::load_default().unwrap_or_default(),
    };
    if args.top_level.is_some() {
        config.top_level = args.top_level.clone();
    }
    if args.playback {
        config.run_mode = RunMode::Playback;
    }
    if let Err(e) = config.validate() {
        fail(e.to_string());
    }

    let buffer_length = config.buffer_length();
    log::info!(
        "signal generator: {} events, {} samples @ {:.3} GSPS",
        config.max_events,
        buffer_length,
        config.sample_rate / 1.0e9
    );

    let library_path = args
        .library
        .clone()
        .unwrap_or_else(|| config.recorded_waveform_path());
    let library = RecordedWaveformLibrary::load(&library_path, buffer_length)
        .unwrap_or_else(|e| fail(format!("{}: {e}", library_path.display())));

    let sink: Box<dyn WaveformSink + Send> = match &args.wav {
        Some(path) => Box::new(WavSink::new(path, buffer_length)),
        None => Box::new(MemorySigGen::new(buffer_length)),
    };
    let mut loader = SigGenLoader::new(&config, Player::new(library), sink)
        .unwrap_or_else(|e| fail(format!("{}: {e}", library_path.display())));

    for _ in 0..args.loads {
        if let Err(e) = loader.load_waveform() {
            fail(format!("initial LoadWaveform failed: {e}"));
        }
    }

    if !args.serve {
        return;
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst)) {
            fail(format!("failed to install Ctrl-C handler: {e}"));
        }
    }

    let trigger = SoftTrigger::new(SoftwareFlag::new(), config.enable_soft_trig);
    let poll = Some(Duration::from_millis(config.poll_interval_ms));
    let (handle, control) = ControlLoop::new(loader, trigger, poll);
    let join = control
        .spawn()
        .unwrap_or_else(|e| fail(format!("failed to start control loop: {e}")));

    log::info!("serving; press Ctrl-C to stop");
    while !stop.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }
    drop(handle);

    match join.join() {
        Ok(exit) => log::info!(
            "{} loads ok, {} failed, {} bursts",
            exit.report.loads_ok,
            exit.report.loads_failed,
            exit.report.bursts
        ),
        Err(_) => fail("control loop panicked".to_string()),
    }
}
