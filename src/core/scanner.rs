//! Camera / detection loop.
//!
//! The loop is a small state machine (`Idle -> Active -> Idle | Closed`)
//! driven by explicit timestamps: the caller asks for `next_deadline()`,
//! waits until then and calls `advance(now)`. Two timers exist while active,
//! the sampling interval and the inactivity timeout; both are plain deadlines
//! owned by the scanner, so stopping it cancels them on the spot.

use crate::core::checkin::{CheckInGateway, CheckInResponse};
use crate::core::dedup::ScanDeduplicator;
use crate::errors::{AppError, AppResult};
use crate::models::service::Service;
use std::time::{Duration, Instant};

/// A frame source such as a camera.
pub trait CaptureDevice {
    type Stream;
    type Frame;

    /// Fails with `AppError::DeviceError` when the device is missing or denied.
    fn acquire(&mut self) -> AppResult<Self::Stream>;

    /// Next frame, if one is ready.
    fn capture(&mut self, stream: &mut Self::Stream) -> AppResult<Option<Self::Frame>>;

    fn release(&mut self, stream: Self::Stream);
}

/// Machine-readable code extraction (QR, barcode...).
pub trait CodeDecoder<F> {
    fn decode(&mut self, frame: &F) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    Active,
    /// Terminal. The device is released and nothing can restart it.
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct ScannerSettings {
    pub sample_interval: Duration,
    pub inactivity_timeout: Duration,
    pub duplicate_window: Duration,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(500),
            inactivity_timeout: Duration::from_secs(30),
            duplicate_window: Duration::from_millis(2000),
        }
    }
}

/// What a call to `advance` did.
#[derive(Debug)]
pub enum ScanEvent {
    /// A sample was taken but carried no code.
    NoCode,
    /// Same code as a moment ago; dropped.
    Suppressed(String),
    /// Recorded. The scanner is idle again.
    CheckedIn(CheckInResponse),
    /// The member already had a record. The scanner is idle again.
    AlreadyCheckedIn(CheckInResponse),
    /// Not recorded, but the user may scan again; the scanner stays active.
    Rejected { code: String, message: String },
    /// Stopped because of an error that makes further sampling pointless.
    Halted(AppError),
    /// No accepted detection for the whole inactivity timeout.
    TimedOut,
}

pub struct Scanner<D: CaptureDevice, C, G> {
    device: D,
    decoder: C,
    gateway: G,
    target: Service,
    settings: ScannerSettings,
    dedup: ScanDeduplicator,
    state: ScannerState,
    stream: Option<D::Stream>,
    next_sample: Option<Instant>,
    idle_deadline: Option<Instant>,
}

impl<D: CaptureDevice, C, G> Scanner<D, C, G> {
    pub fn new(
        device: D,
        decoder: C,
        gateway: G,
        target: Service,
        settings: ScannerSettings,
    ) -> Self {
        Self {
            device,
            decoder,
            gateway,
            target,
            dedup: ScanDeduplicator::new(settings.duplicate_window),
            settings,
            state: ScannerState::Idle,
            stream: None,
            next_sample: None,
            idle_deadline: None,
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    pub fn target(&self) -> &Service {
        &self.target
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Earliest pending timer, `None` unless active.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_sample, self.idle_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Cancel both timers and hand the stream back to the device.
    fn shut_down(&mut self) {
        self.next_sample = None;
        self.idle_deadline = None;
        if let Some(stream) = self.stream.take() {
            self.device.release(stream);
            tracing::debug!(service_id = self.target.id, "Capture device released");
        }
    }

    /// Active -> Idle. No-op in any other state.
    pub fn stop(&mut self) {
        self.shut_down();
        if self.state == ScannerState::Active {
            self.state = ScannerState::Idle;
        }
    }

    /// Any state -> Closed.
    pub fn close(&mut self) {
        self.shut_down();
        self.state = ScannerState::Closed;
    }
}

impl<D, C, G> Scanner<D, C, G>
where
    D: CaptureDevice,
    C: CodeDecoder<D::Frame>,
    G: CheckInGateway,
{
    /// Idle -> Active. On a device failure the scanner stays idle and the
    /// error is returned; it never becomes active without a stream.
    pub fn start(&mut self, now: Instant) -> AppResult<()> {
        match self.state {
            ScannerState::Active => return Ok(()),
            ScannerState::Closed => {
                return Err(AppError::DeviceError("scanner has been closed".into()));
            }
            ScannerState::Idle => {}
        }

        let stream = self.device.acquire().map_err(|e| match e {
            AppError::DeviceError(_) => e,
            other => AppError::DeviceError(other.to_string()),
        })?;

        self.stream = Some(stream);
        self.state = ScannerState::Active;
        self.dedup.reset();
        self.next_sample = Some(now + self.settings.sample_interval);
        self.idle_deadline = Some(now + self.settings.inactivity_timeout);

        tracing::info!(service_id = self.target.id, "Scanner active");
        Ok(())
    }

    /// Fire whichever timer is due at `now`. Returns `None` when nothing was due.
    pub fn advance(&mut self, now: Instant) -> Option<ScanEvent> {
        if self.state != ScannerState::Active {
            return None;
        }

        let idle_due = self.idle_deadline.filter(|d| *d <= now);
        let sample_due = self.next_sample.filter(|d| *d <= now);

        match (idle_due, sample_due) {
            (Some(idle), Some(sample)) if idle <= sample => Some(self.time_out()),
            (Some(_), None) => Some(self.time_out()),
            (_, Some(_)) => {
                self.next_sample = Some(now + self.settings.sample_interval);
                Some(self.sample(now))
            }
            (None, None) => None,
        }
    }

    fn time_out(&mut self) -> ScanEvent {
        tracing::info!(
            service_id = self.target.id,
            timeout_secs = self.settings.inactivity_timeout.as_secs(),
            "Inactivity timeout, closing camera"
        );
        self.stop();
        ScanEvent::TimedOut
    }

    fn halt(&mut self, err: AppError) -> ScanEvent {
        tracing::warn!(service_id = self.target.id, error = %err, "Scanner halted");
        self.stop();
        ScanEvent::Halted(err)
    }

    fn sample(&mut self, now: Instant) -> ScanEvent {
        let Some(stream) = self.stream.as_mut() else {
            return self.halt(AppError::DeviceError("no active stream".into()));
        };

        let frame = match self.device.capture(stream) {
            Ok(Some(frame)) => frame,
            Ok(None) => return ScanEvent::NoCode,
            Err(e) => return self.halt(e),
        };

        let Some(code) = self.decoder.decode(&frame) else {
            return ScanEvent::NoCode;
        };

        if !self.dedup.should_process(&code, now) {
            return ScanEvent::Suppressed(code);
        }

        tracing::debug!(service_id = self.target.id, code = %code, "Code accepted");
        self.idle_deadline = Some(now + self.settings.inactivity_timeout);

        self.handle_code(code)
    }

    /// Also used for typed identifiers, which skip the camera entirely.
    pub fn handle_code(&mut self, code: String) -> ScanEvent {
        if self.target.is_template() {
            let err = AppError::InvalidTarget(self.target.name.clone());
            return self.halt(err);
        }

        match self.gateway.check_in(&code, self.target.id) {
            Ok(resp) if resp.success => {
                self.stop();
                ScanEvent::CheckedIn(resp)
            }
            Ok(resp) if resp.already_checked_in => {
                self.stop();
                ScanEvent::AlreadyCheckedIn(resp)
            }
            Ok(resp) => ScanEvent::Rejected {
                code,
                message: resp.message,
            },
            Err(e) if e.halts_scanner() => self.halt(e),
            Err(e) => ScanEvent::Rejected {
                code,
                message: e.to_string(),
            },
        }
    }
}

impl<D: CaptureDevice, C, G> Drop for Scanner<D, C, G> {
    fn drop(&mut self) {
        self.close();
    }
}
