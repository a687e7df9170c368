//! Photon pulse synthesizer.
//!
//! Each event contributes a bi-exponential pulse
//! `A · exp(-Δt/decay) · (1 - exp(-Δt/rise))` for `Δt > 0`, where `Δt` is the
//! sample time minus the event's incident time. Events are superposed in slot
//! order and the running sum is clamped after every contribution, so a
//! saturated sample stays saturated relative to what later events add.

use super::limiter::SampleLimiter;
use super::params::{EventParameterSet, PhotonEvent};
use super::WaveformBuffer;

/// Pulse value of one event at `delta_t` seconds after its incident time.
///
/// Zero for `delta_t <= 0`: a pulse never appears before its photon arrives.
#[inline]
pub fn pulse_shape(event: &PhotonEvent, delta_t: f64) -> f64 {
    if delta_t > 0.0 {
        f64::from(event.amplitude)
            * (-delta_t / event.decay).exp()
            * (1.0 - (-delta_t / event.rise).exp())
    } else {
        0.0
    }
}

/// Renders event parameter sets into DAC waveforms of a fixed length.
#[derive(Debug, Clone)]
pub struct PulseSynth {
    sample_rate: f64,
    buffer_length: usize,
    limiter: SampleLimiter,
}

impl PulseSynth {
    /// `sample_rate` in Hz, `buffer_length` in samples.
    pub fn new(sample_rate: f64, buffer_length: usize) -> Self {
        debug_assert!(sample_rate > 0.0);
        Self {
            sample_rate,
            buffer_length,
            limiter: SampleLimiter::default(),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    /// Accumulate every event into a fresh float buffer, clamping per event.
    pub fn accumulate(&self, params: &EventParameterSet) -> Vec<f64> {
        let mut acc = vec![0.0_f64; self.buffer_length];

        for event in params.events() {
            for (x, sample) in acc.iter_mut().enumerate() {
                let t = x as f64 / self.sample_rate;
                let delta_t = t - event.incident_time;
                if delta_t > 0.0 {
                    *sample = self.limiter.process(*sample + pulse_shape(&event, delta_t));
                }
            }
        }

        acc
    }

    /// Render the superposition of all events as DAC samples.
    pub fn render(&self, params: &EventParameterSet) -> WaveformBuffer {
        let acc = self.accumulate(params);

        let non_finite = acc.iter().filter(|s| !s.is_finite()).count();
        if non_finite > 0 {
            log::warn!(
                "{non_finite} synthesized samples are not finite; check for zero or negative rise/decay"
            );
        }

        WaveformBuffer::from_samples(acc.iter().map(|&s| self.limiter.quantize(s)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn event(amplitude: i16, decay: f64, rise: f64, incident_time: f64) -> PhotonEvent {
        PhotonEvent {
            amplitude,
            decay,
            rise,
            incident_time,
        }
    }

    #[test]
    fn pulse_is_causal() {
        let e = event(10000, 2.0, 1.0, 1.0);
        assert_eq!(pulse_shape(&e, 0.0), 0.0);
        assert_eq!(pulse_shape(&e, -0.5), 0.0);
        assert!(pulse_shape(&e, 0.5) > 0.0);
    }

    #[test]
    fn pulse_shape_value() {
        let e = event(10000, 2.0, 1.0, 0.0);
        assert_approx_eq!(pulse_shape(&e, 1.0), 3834.0049956420357, 1e-9);
        assert_approx_eq!(pulse_shape(&e, 2.0), 3180.923728035784, 1e-9);
    }

    #[test]
    fn output_length_matches_config() {
        let synth = PulseSynth::new(8.128e9, 8192);
        let params = EventParameterSet::uniform(4, event(5000, 100e-9, 10e-9, 4e-6));
        assert_eq!(synth.render(&params).len(), 8192);
    }

    #[test]
    fn zero_amplitude_renders_silence() {
        let synth = PulseSynth::new(1.0e9, 256);
        let params = EventParameterSet::uniform(4, event(0, 10e-9, 1e-9, 0.0));
        assert!(synth.render(&params).samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn events_superpose() {
        let synth = PulseSynth::new(1.0, 8);
        let single = EventParameterSet::uniform(1, event(1000, 2.0, 1.0, 0.0));
        let double = EventParameterSet::uniform(2, event(1000, 2.0, 1.0, 0.0));
        let one = synth.accumulate(&single);
        let two = synth.accumulate(&double);
        for (a, b) in one.iter().zip(&two) {
            assert_approx_eq!(2.0 * a, *b, 1e-9);
        }
    }

    #[test]
    fn late_event_leaves_early_samples_untouched() {
        let synth = PulseSynth::new(1.0, 8);
        let params = EventParameterSet::uniform(1, event(1000, 2.0, 1.0, 4.0));
        let samples = synth.render(&params).into_samples();
        assert!(samples[..=4].iter().all(|&s| s == 0));
        assert!(samples[5..].iter().all(|&s| s > 0));
    }

    #[test]
    fn saturates_positive() {
        let synth = PulseSynth::new(1.0, 4);
        let params = EventParameterSet::uniform(4, event(i16::MAX, 1.0e9, 1.0e-6, 0.0));
        let samples = synth.render(&params).into_samples();
        assert_eq!(samples[0], 0);
        assert!(samples[1..].iter().all(|&s| s == 32767));
    }

    #[test]
    fn saturates_negative_without_reaching_i16_min() {
        let synth = PulseSynth::new(1.0, 4);
        let params = EventParameterSet::uniform(4, event(i16::MIN, 1.0e9, 1.0e-6, 0.0));
        let samples = synth.render(&params).into_samples();
        assert!(samples[1..].iter().all(|&s| s == -32767));
    }

    #[test]
    fn zero_decay_contributes_nothing() {
        let synth = PulseSynth::new(1.0, 4);
        let params = EventParameterSet::uniform(1, event(1000, 0.0, 1.0, 0.0));
        assert!(synth.render(&params).samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn render_is_stateless() {
        let synth = PulseSynth::new(1.0, 8);
        let params = EventParameterSet::uniform(2, event(1000, 2.0, 1.0, 0.0));
        assert_eq!(synth.render(&params), synth.render(&params));
    }
}
