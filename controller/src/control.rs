use marker_signal_common::config::{Config, ConfigError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::detector::MarkerDetector;
use crate::link::{SerialLink, SignalTransmitter};
use crate::observer::PipelineObserver;
use crate::policy::PresencePolicy;
use crate::source::FrameSource;
use crate::ControlError;

const PROGRESS_EVERY: u64 = 100;

/// Caps how often an event may happen by sleeping until one period has
/// passed since the last time it was marked.
#[derive(Debug)]
pub struct Pacer {
    period: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Record that the paced event just happened.
    pub fn mark(&mut self) {
        self.last = Some(Instant::now());
    }

    /// Sleep out whatever is left of the period since the last `mark`.
    /// Returns the time slept; never sleeps before the first mark.
    pub fn wait(&mut self) -> Duration {
        let Some(last) = self.last else {
            return Duration::ZERO;
        };
        let remaining = self.period.saturating_sub(last.elapsed());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        remaining
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Devices are open; the camera warm-up has not finished yet.
    Initializing,
    Running,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// Minimum time between two transmissions.
    pub period: Duration,
    pub warmup: Duration,
}

impl TryFrom<&Config> for LoopSettings {
    type Error = ConfigError;

    fn try_from(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            period: config.control.period()?,
            warmup: config.camera.warmup(),
        })
    }
}

/// Capture, detect, decide, transmit, once per frame, at a capped rate.
///
/// Owns the camera and serial handles for its whole life. Any stage failure
/// ends the loop with an error; nothing is retried.
pub struct ControlLoop<L> {
    state: LoopState,
    settings: LoopSettings,
    source: Box<dyn FrameSource>,
    detector: Box<dyn MarkerDetector>,
    policy: Box<dyn PresencePolicy>,
    transmitter: SignalTransmitter<L>,
    observers: Vec<Box<dyn PipelineObserver>>,
    pacer: Pacer,
    frames: u64,
}

impl<L: SerialLink> ControlLoop<L> {
    pub fn new(
        settings: LoopSettings,
        source: Box<dyn FrameSource>,
        detector: Box<dyn MarkerDetector>,
        policy: Box<dyn PresencePolicy>,
        transmitter: SignalTransmitter<L>,
    ) -> Self {
        Self {
            state: LoopState::Initializing,
            settings,
            source,
            detector,
            policy,
            transmitter,
            observers: Vec::new(),
            pacer: Pacer::new(settings.period),
            frames: 0,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn PipelineObserver>) -> Self {
        debug!(observer = observer.name(), "observer attached");
        self.observers.push(observer);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames fully processed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn transmitter(&self) -> &SignalTransmitter<L> {
        &self.transmitter
    }

    /// Wait out the camera warm-up and switch to running. Only the first call sleeps.
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        if !self.settings.warmup.is_zero() {
            std::thread::sleep(self.settings.warmup);
        }
        info!(
            source = self.source.name(),
            detector = self.detector.name(),
            policy = self.policy.name(),
            "camera initialized, control loop running"
        );
        self.state = LoopState::Running;
    }

    /// Run one iteration and return the signal that was sent, or `None` if
    /// the source has no more frames.
    ///
    /// Blocks before transmitting until a full period has passed since the
    /// previous transmission, which caps the loop at one send per period.
    pub fn step(&mut self) -> Result<Option<bool>, ControlError> {
        self.start();

        let frame = match self.source.next_frame()? {
            Some(frame) => frame,
            None => return Ok(None),
        };
        for observer in &mut self.observers {
            observer.on_frame(&frame);
        }

        let markers = self.detector.detect(&frame)?;
        for observer in &mut self.observers {
            observer.on_markers(&frame, &markers);
        }

        let signal = self.policy.evaluate(&markers);

        let inbound = self.transmitter.drain()?;
        if !inbound.is_empty() {
            for observer in &mut self.observers {
                observer.on_inbound(&inbound);
            }
        }

        // Transmissions are what the rate cap applies to.
        self.pacer.wait();
        self.transmitter.send(signal)?;
        self.pacer.mark();
        for observer in &mut self.observers {
            observer.on_signal(&frame, signal);
        }

        self.frames += 1;
        if self.frames % PROGRESS_EVERY == 0 {
            debug!(frames = self.frames, sent = self.transmitter.sent(), "frames processed");
        }
        Ok(Some(signal))
    }

    /// Loop until the source runs dry (a camera never does) or a stage fails.
    pub fn run(&mut self) -> Result<(), ControlError> {
        self.start();
        info!(period_ms = self.settings.period.as_millis() as u64, "entering control loop");

        while self.step()?.is_some() {}

        info!(frames = self.frames, "frame source exhausted");
        Ok(())
    }
}
