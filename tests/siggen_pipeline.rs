//! Integration tests for the waveform pipeline.
//!
//! Tests the full path: config → synthesizer / recorded table → loader → device.
//! No hardware required: the in-memory generator stands in for the board.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use photon_siggen::config::LoaderConfig;
use photon_siggen::device::{MemorySigGen, SinkError, WaveformSink};
use photon_siggen::loader::{LoadError, RunMode, SigGenLoader};
use photon_siggen::waveform::{
    EventParameterSet, PhotonEvent, Player, PulseSynth, RecordedWaveformLibrary, LIBRARY_SIZE,
};

const SEED: u64 = 42;

/// One event, 8 samples at 1 Hz: A=10000, decay=2 s, rise=1 s, t0=0.
fn single_event_config() -> LoaderConfig {
    let mut config = LoaderConfig {
        max_events: 1,
        ram_addr_width: 3,
        samples_per_cycle: 1,
        sample_rate: 1.0,
        ..LoaderConfig::default()
    };
    config.events.amplitude = 10000;
    config.events.decay = 2.0;
    config.events.rise = 1.0;
    config.events.incident_time = 0.0;
    config
}

/// Write a 100-row table where row `r` is `r, r+1, ...` into `<top>/config/`.
fn write_table(top: &std::path::Path, len: usize) {
    let dir = top.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    let text = (0..LIBRARY_SIZE)
        .map(|r| {
            (0..len)
                .map(|c| (r + c).to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(dir.join("SipmWave8GSPS.csv"), text).unwrap();
}

fn flat_player(len: usize) -> Player {
    let rows = (0..LIBRARY_SIZE).map(|r| vec![r as i16; len]).collect();
    Player::new(RecordedWaveformLibrary::from_rows(rows, len).unwrap())
}

#[test]
fn single_event_golden_waveform() {
    let config = single_event_config();
    let len = config.buffer_length();
    let mut loader = SigGenLoader::new(&config, flat_player(len), MemorySigGen::new(len)).unwrap();

    loader.load_waveform().unwrap();

    // 10000 · exp(-x/2) · (1 - exp(-x)), truncated toward zero.
    assert_eq!(
        loader.sink().committed(),
        &[0, 3834, 3180, 2120, 1328, 815, 496, 301]
    );
    assert_eq!(loader.sink().commit_count(), 1);
    assert_eq!(loader.sink().reset_count(), 1);
}

#[test]
fn single_event_rises_then_decays() {
    let synth = PulseSynth::new(1.0e9, 512);
    let params = EventParameterSet::uniform(
        1,
        PhotonEvent {
            amplitude: 20000,
            decay: 50.0e-9,
            rise: 5.0e-9,
            incident_time: 0.0,
        },
    );
    let samples = synth.render(&params).into_samples();
    assert_eq!(samples[0], 0);

    let peak = samples
        .iter()
        .enumerate()
        .max_by_key(|&(_, s)| *s)
        .map(|(i, _)| i)
        .unwrap();
    assert!(peak > 0);
    assert!(samples[1..=peak].windows(2).all(|w| w[0] <= w[1]));
    assert!(samples[peak..].windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn clamping_happens_after_every_event() {
    let synth = PulseSynth::new(1.0, 4);
    // Slow decay and fast rise make each pulse ≈ its amplitude for t > 0.
    let flat = |amplitude| PhotonEvent {
        amplitude,
        decay: 1.0e9,
        rise: 1.0e-6,
        incident_time: 0.0,
    };
    let params = EventParameterSet::from_events(&[flat(30000), flat(30000), flat(-30000)]);
    let samples = synth.render(&params).into_samples();

    // 30000 + 30000 saturates at 32767 before the negative pulse lands.
    // Clamping only the final sum would have given 29999.
    assert_eq!(samples, vec![0, 2767, 2767, 2767]);
}

#[test]
fn random_events_stay_in_range() {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let synth = PulseSynth::new(8.128e9, 1024);

    for _ in 0..20 {
        let events: Vec<PhotonEvent> = (0..4)
            .map(|_| PhotonEvent {
                amplitude: rng.gen_range(-32767..=32767),
                decay: rng.gen_range(1.0e-9..500.0e-9),
                rise: rng.gen_range(0.1e-9..50.0e-9),
                incident_time: rng.gen_range(0.0..100.0e-9),
            })
            .collect();
        let waveform = synth.render(&EventParameterSet::from_events(&events));
        assert_eq!(waveform.len(), 1024);
        assert!(waveform.samples().iter().all(|&s| (-32767..=32767).contains(&s)));
    }
}

#[test]
fn playback_cycles_through_table_from_top_level() {
    let top = tempfile::tempdir().unwrap();
    let config = LoaderConfig {
        top_level: Some(top.path().to_path_buf()),
        ram_addr_width: 2,
        samples_per_cycle: 2,
        run_mode: RunMode::Playback,
        ..LoaderConfig::default()
    };
    let len = config.buffer_length();
    write_table(top.path(), len + 3);

    let library = RecordedWaveformLibrary::load(&config.recorded_waveform_path(), len).unwrap();
    let expected: Vec<Vec<i16>> = library
        .waveforms()
        .iter()
        .map(|w| w.samples().to_vec())
        .collect();
    let mut loader = SigGenLoader::new(&config, Player::new(library), MemorySigGen::new(len)).unwrap();

    for (i, row) in expected.iter().enumerate() {
        let outcome = loader.load_waveform().unwrap();
        assert_eq!(outcome.playback_index, Some(i));
        assert_eq!(loader.sink().committed(), row.as_slice());
    }
    assert_eq!(loader.player().cursor(), 0);
    assert_eq!(loader.sink().reset_count(), LIBRARY_SIZE as u64);

    // Wraps back to row 0.
    loader.load_waveform().unwrap();
    assert_eq!(loader.sink().committed(), expected[0].as_slice());
}

#[test]
fn missing_table_is_fatal() {
    let top = tempfile::tempdir().unwrap();
    let config = LoaderConfig {
        top_level: Some(top.path().to_path_buf()),
        ..LoaderConfig::default()
    };
    assert!(
        RecordedWaveformLibrary::load(&config.recorded_waveform_path(), config.buffer_length())
            .is_err()
    );
}

#[test]
fn mode_switches_do_not_interact() {
    let config = single_event_config();
    let len = config.buffer_length();
    let mut loader = SigGenLoader::new(&config, flat_player(len), MemorySigGen::new(len)).unwrap();

    loader.set_run_mode(RunMode::Playback);
    loader.load_waveform().unwrap();
    assert_eq!(loader.sink().committed(), &[0; 8]);

    loader.set_run_mode(RunMode::Synthesize);
    for _ in 0..5 {
        loader.load_waveform().unwrap();
    }
    assert_eq!(loader.player().cursor(), 1);
    assert_eq!(loader.sink().committed()[1], 3834);

    loader.set_run_mode(RunMode::Playback);
    loader.load_waveform().unwrap();
    assert_eq!(loader.sink().committed(), &[1; 8]);
}

/// Generator whose commit always fails.
struct BrokenBus {
    inner: MemorySigGen,
    resets: u32,
}

impl WaveformSink for BrokenBus {
    fn buffered_set(&mut self, index: usize, value: i16) -> Result<(), SinkError> {
        self.inner.buffered_set(index, value)
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        Err(SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "memory bus timeout",
        )))
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        self.resets += 1;
        Ok(())
    }
}

#[test]
fn commit_failure_never_resets() {
    let config = single_event_config();
    let len = config.buffer_length();
    let sink = BrokenBus {
        inner: MemorySigGen::new(len),
        resets: 0,
    };
    let mut loader = SigGenLoader::new(&config, flat_player(len), sink).unwrap();

    for _ in 0..3 {
        let err = loader.load_waveform().unwrap_err();
        assert!(matches!(err, LoadError::Commit(SinkError::Io(_))));
    }
    assert_eq!(loader.sink().resets, 0);
    assert!(loader.sink().inner.committed().iter().all(|&s| s == 0));
    assert_eq!(loader.load_count(), 0);
}
