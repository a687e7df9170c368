//! Control plane: the single path through which waveform loads happen.
//!
//! Remote writes arrive as [`ControlCommand`]s on a lock-free ring buffer and
//! are applied in order by one [`ControlLoop`], which owns the loader. Loads
//! requested from several producers are therefore serialised, never
//! interleaved. The loop also fires the polled soft trigger.

pub mod trigger;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};

use crate::device::{TriggerLine, WaveformSink};
use crate::loader::{RunMode, SigGenLoader};

pub use trigger::SoftTrigger;

/// Ring buffer capacity (number of commands).
const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Sleep between queue polls when idle.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Writes and actions accepted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetAmplitude(Vec<i16>),
    SetDecay(Vec<f64>),
    SetRise(Vec<f64>),
    SetIncidentTime(Vec<f64>),
    SetRunMode(RunMode),
    SetEnableSoftTrig(bool),
    /// Build and load the active waveform.
    LoadWaveform,
    /// Fire one burst through the soft trigger.
    GetWaveformBurst,
    /// Leave the loop.
    Stop,
}

/// Errors from the producer side of the control queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The loop is not draining fast enough.
    QueueFull,
    /// The loop has already shut down.
    Closed,
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::QueueFull => write!(f, "control command queue is full"),
            ControlError::Closed => write!(f, "control loop has stopped"),
        }
    }
}

impl std::error::Error for ControlError {}

/// Counters collected while the loop runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlReport {
    pub loads_ok: u64,
    pub loads_failed: u64,
    pub bursts: u64,
    pub rejected_writes: u64,
}

/// Everything the loop owned, handed back when it exits.
pub struct ControlExit<S, L> {
    pub loader: SigGenLoader<S>,
    pub trigger: SoftTrigger<L>,
    pub report: ControlReport,
}

/// Producer end of the control queue.
pub struct ControlHandle {
    producer: HeapProd<ControlCommand>,
    running: Arc<AtomicBool>,
}

impl ControlHandle {
    /// Queue a command for the loop.
    pub fn send(&mut self, command: ControlCommand) -> Result<(), ControlError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(ControlError::Closed);
        }
        self.producer
            .try_push(command)
            .map_err(|_| ControlError::QueueFull)
    }

    /// Whether the loop is still accepting commands.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for ControlHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Single owner of the loader and soft trigger.
pub struct ControlLoop<S, L> {
    loader: SigGenLoader<S>,
    trigger: SoftTrigger<L>,
    consumer: HeapCons<ControlCommand>,
    running: Arc<AtomicBool>,
    poll_interval: Option<Duration>,
    report: ControlReport,
}

impl<S: WaveformSink, L: TriggerLine> ControlLoop<S, L> {
    /// Create the loop and its command handle.
    ///
    /// With `poll_interval` set, the loop calls the soft trigger once per
    /// interval in addition to any queued `GetWaveformBurst` commands.
    pub fn new(
        loader: SigGenLoader<S>,
        trigger: SoftTrigger<L>,
        poll_interval: Option<Duration>,
    ) -> (ControlHandle, Self) {
        let rb = HeapRb::<ControlCommand>::new(COMMAND_QUEUE_CAPACITY);
        let (producer, consumer) = rb.split();
        let running = Arc::new(AtomicBool::new(true));

        let handle = ControlHandle {
            producer,
            running: Arc::clone(&running),
        };
        let control = Self {
            loader,
            trigger,
            consumer,
            running,
            poll_interval: poll_interval.filter(|p| !p.is_zero()),
            report: ControlReport::default(),
        };
        (handle, control)
    }

    pub fn loader(&self) -> &SigGenLoader<S> {
        &self.loader
    }

    pub fn report(&self) -> ControlReport {
        self.report
    }

    /// Apply every queued command. Returns false once `Stop` is seen.
    pub fn drain(&mut self) -> bool {
        while let Some(command) = self.consumer.try_pop() {
            if !self.apply(command) {
                return false;
            }
        }
        true
    }

    /// Run until `Stop` arrives or the handle is dropped.
    ///
    /// Commands already queued when the handle is dropped are still applied.
    pub fn run(mut self) -> ControlExit<S, L> {
        let mut next_poll = self.poll_interval.map(|p| Instant::now() + p);

        loop {
            if !self.drain() {
                break;
            }
            if !self.running.load(Ordering::Acquire) {
                self.drain();
                break;
            }
            if let (Some(due), Some(period)) = (next_poll, self.poll_interval) {
                let now = Instant::now();
                if now >= due {
                    self.burst();
                    next_poll = Some(now + period);
                }
            }
            thread::sleep(IDLE_SLEEP);
        }

        self.running.store(false, Ordering::Release);
        log::info!("control loop stopped: {:?}", self.report);
        ControlExit {
            loader: self.loader,
            trigger: self.trigger,
            report: self.report,
        }
    }

    fn apply(&mut self, command: ControlCommand) -> bool {
        log::debug!("control command: {command:?}");

        let write = match command {
            ControlCommand::SetAmplitude(v) => self.loader.set_amplitude(v),
            ControlCommand::SetDecay(v) => self.loader.set_decay(v),
            ControlCommand::SetRise(v) => self.loader.set_rise(v),
            ControlCommand::SetIncidentTime(v) => self.loader.set_incident_time(v),
            ControlCommand::SetRunMode(mode) => {
                self.loader.set_run_mode(mode);
                Ok(())
            }
            ControlCommand::SetEnableSoftTrig(enabled) => {
                self.trigger.set_enabled(enabled);
                Ok(())
            }
            ControlCommand::LoadWaveform => {
                match self.loader.load_waveform() {
                    Ok(_) => self.report.loads_ok += 1,
                    Err(e) => {
                        self.report.loads_failed += 1;
                        log::error!("LoadWaveform failed: {e}");
                    }
                }
                Ok(())
            }
            ControlCommand::GetWaveformBurst => {
                self.burst();
                Ok(())
            }
            ControlCommand::Stop => return false,
        };

        if let Err(e) = write {
            self.report.rejected_writes += 1;
            log::warn!("rejected parameter write: {e}");
        }
        true
    }

    fn burst(&mut self) {
        match self.trigger.get_waveform_burst() {
            Ok(true) => self.report.bursts += 1,
            Ok(false) => log::trace!("soft trigger disabled"),
            Err(e) => log::error!("waveform burst failed: {e}"),
        }
    }
}

impl<S, L> ControlLoop<S, L>
where
    S: WaveformSink + Send + 'static,
    L: TriggerLine + Send + 'static,
{
    /// Run the loop on a dedicated thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<ControlExit<S, L>>> {
        thread::Builder::new()
            .name("siggen-control".into())
            .spawn(move || self.run())
    }
}
