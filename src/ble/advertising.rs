//! Advertising Configuration State Machine
//!
//! Tracks the two asynchronous configuration steps (advertising data and
//! scan response data) and issues "start advertising" exactly once, from the
//! completion event that empties the pending mask. Start/stop outcomes and
//! connection parameter updates are reported, never retried.
//!
//! The machine owns its [`HostStack`] and is driven by explicit
//! [`handle_event`](AdvertisingStateMachine::handle_event) calls, so it runs
//! the same against the SoftDevice and against a test double.

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;

use crate::ble::events::{AckStatus, ConnParamsUpdate, EventQueue, GapEvent};
use crate::ble::gap_state::{AdvState, PendingConfigMask, MAX_DEVICE_NAME_LEN};
use crate::ble::host::{HostError, HostOp, HostStack};
use crate::ble::params::AdvertisingParameters;
use crate::ble::payload::AdvertisingPayload;
use crate::error::{AdvError, ConfigError};

/// Device name set before advertising starts
pub const DEFAULT_DEVICE_NAME: &str = "BLE_START";

/// How a failed set-data acknowledgment affects progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckPolicy {
    /// A completed step counts toward starting whatever its status
    #[default]
    CountFailures,
    /// A failed step ends the cycle in `AdvertisingFailed`
    RequireSuccess,
}

/// Advertiser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertiserConfig {
    device_name: String<MAX_DEVICE_NAME_LEN>,
    pub ack_policy: AckPolicy,
}

impl AdvertiserConfig {
    pub fn new(device_name: &str) -> Result<Self, ConfigError> {
        let device_name = String::try_from(device_name).map_err(|_| ConfigError::NameTooLong)?;
        Ok(Self {
            device_name,
            ack_policy: AckPolicy::default(),
        })
    }

    pub fn with_ack_policy(mut self, ack_policy: AckPolicy) -> Self {
        self.ack_policy = ack_policy;
        self
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Default for AdvertiserConfig {
    fn default() -> Self {
        let mut device_name = String::new();
        // Fits: shorter than MAX_DEVICE_NAME_LEN
        let _ = device_name.push_str(DEFAULT_DEVICE_NAME);
        Self {
            device_name,
            ack_policy: AckPolicy::default(),
        }
    }
}

/// Diagnostic emitted while handling an event or request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    AckFailure { op: HostOp, status: AckStatus },
    SubmissionFailed { op: HostOp, error: HostError },
    AdvertisingStarted,
    AdvertisingStopped,
    ConnParamsUpdated(ConnParamsUpdate),
    UnhandledEvent(u16),
    /// Event with no meaning in the current state (duplicates included)
    UnexpectedEvent { event: GapEvent, state: AdvState },
}

/// Outcome of one event or request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: AdvState,
    pub to: AdvState,
    /// Host operation issued while handling, if any
    pub issued: Option<HostOp>,
    pub report: Option<Report>,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Advertising configuration state machine
pub struct AdvertisingStateMachine<H: HostStack> {
    host: H,
    config: AdvertiserConfig,
    state: AdvState,
    pending: PendingConfigMask,
    /// Submissions accepted by the host whose completion has not arrived
    awaiting: PendingConfigMask,
    /// Completions still owed by abandoned cycles, per step
    stale_adv_data: u8,
    stale_scan_rsp: u8,
    params: AdvertisingParameters,
    stop_outstanding: bool,
    start_count: u32,
}

impl<H: HostStack> AdvertisingStateMachine<H> {
    pub fn new(host: H, config: AdvertiserConfig) -> Self {
        Self {
            host,
            config,
            state: AdvState::Idle,
            pending: PendingConfigMask::EMPTY,
            awaiting: PendingConfigMask::EMPTY,
            stale_adv_data: 0,
            stale_scan_rsp: 0,
            params: AdvertisingParameters::DEFAULT,
            stop_outstanding: false,
            start_count: 0,
        }
    }

    pub fn state(&self) -> AdvState {
        self.state
    }

    pub fn pending(&self) -> PendingConfigMask {
        self.pending
    }

    pub fn config(&self) -> &AdvertiserConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Number of start commands issued to the host over the machine's life
    pub fn start_count(&self) -> u32 {
        self.start_count
    }

    /// Start a configuration cycle
    ///
    /// Omitting `scan_response` makes the advertising data completion alone
    /// trigger the start.
    pub fn begin_configuration(
        &mut self,
        payload: &AdvertisingPayload,
        scan_response: Option<&AdvertisingPayload>,
        params: AdvertisingParameters,
    ) -> Result<Transition, AdvError> {
        if !self.state.accepts_configuration() {
            warn!("configuration refused in state {:?}", self.state);
            return Err(ConfigError::Busy(self.state).into());
        }
        if payload.is_scan_response() || scan_response.is_some_and(|rsp| !rsp.is_scan_response()) {
            return Err(ConfigError::PayloadRole.into());
        }
        params.validate()?;

        let from = self.state;
        self.params = params;
        self.stop_outstanding = false;
        self.pending = PendingConfigMask::ADV_DATA_PENDING;
        if scan_response.is_some() {
            self.pending.insert(PendingConfigMask::SCAN_RSP_PENDING);
        }
        self.state = AdvState::configuring(self.pending);
        info!("configuring advertising, {} step(s) pending", self.pending.count());

        if let Err(error) = self.host.submit_advertising_data(payload) {
            return Err(self.submission_failed(HostOp::SetAdvData, error));
        }
        self.awaiting.insert(PendingConfigMask::ADV_DATA_PENDING);
        if let Some(rsp) = scan_response {
            if let Err(error) = self.host.submit_scan_response_data(rsp) {
                return Err(self.submission_failed(HostOp::SetScanRspData, error));
            }
            self.awaiting.insert(PendingConfigMask::SCAN_RSP_PENDING);
        }

        Ok(Transition {
            from,
            to: self.state,
            issued: None,
            report: None,
        })
    }

    /// Ask the host to stop advertising; the outcome arrives as `AdvStopComplete`
    pub fn request_stop(&mut self) -> Result<Transition, AdvError> {
        if self.state != AdvState::Advertising || self.stop_outstanding {
            warn!("stop refused in state {:?}", self.state);
            return Err(ConfigError::Busy(self.state).into());
        }

        match self.host.stop_advertising() {
            Ok(()) => {
                info!("stopping advertising");
                self.stop_outstanding = true;
                Ok(Transition {
                    from: self.state,
                    to: self.state,
                    issued: Some(HostOp::StopAdvertising),
                    report: None,
                })
            }
            Err(error) => {
                error!("stop advertising failed, error code = {:x}", error.code());
                Err(AdvError::Submission {
                    op: HostOp::StopAdvertising,
                    error,
                })
            }
        }
    }

    /// Handle one GAP event
    pub fn handle_event(&mut self, event: GapEvent) -> Transition {
        let from = self.state;
        let (issued, report) = match event {
            GapEvent::AdvDataSetComplete(status) => {
                info!("ADV DATA set");
                self.on_config_complete(event, PendingConfigMask::ADV_DATA_PENDING, HostOp::SetAdvData, status)
            }
            GapEvent::ScanRspSetComplete(status) => {
                info!("ADV RSP DATA set");
                self.on_config_complete(
                    event,
                    PendingConfigMask::SCAN_RSP_PENDING,
                    HostOp::SetScanRspData,
                    status,
                )
            }
            GapEvent::AdvStartComplete(status) => (None, Some(self.on_start_complete(event, status))),
            GapEvent::AdvStopComplete(status) => (None, Some(self.on_stop_complete(event, status))),
            GapEvent::ConnParamsUpdate(update) => {
                info!(
                    "update connection params status = {:?}, min_int = {}, max_int = {}, conn_int = {}, latency = {}, timeout = {}",
                    update.status,
                    update.min_int,
                    update.max_int,
                    update.conn_int,
                    update.latency,
                    update.timeout
                );
                (None, Some(Report::ConnParamsUpdated(update)))
            }
            GapEvent::Other(code) => {
                info!("Unhandled GAP event: {}", code);
                (None, Some(Report::UnhandledEvent(code)))
            }
        };

        Transition {
            from,
            to: self.state,
            issued,
            report,
        }
    }

    /// Handle every event already queued, without waiting
    pub fn dispatch_pending<M: RawMutex, const N: usize>(&mut self, queue: &EventQueue<M, N>) -> usize {
        let mut handled = 0;
        while let Some(event) = queue.try_next() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Dispatch events from `queue` forever
    pub async fn run<M: RawMutex, const N: usize>(&mut self, queue: &EventQueue<M, N>) -> ! {
        loop {
            let event = queue.next().await;
            let transition = self.handle_event(event);
            if transition.changed() {
                debug!("advertising state {:?} -> {:?}", transition.from, transition.to);
            }
        }
    }

    fn unexpected(&self, event: GapEvent) -> Report {
        debug!("ignoring {:?} in state {:?}", event, self.state);
        Report::UnexpectedEvent {
            event,
            state: self.state,
        }
    }

    fn submission_failed(&mut self, op: HostOp, error: HostError) -> AdvError {
        error!("{:?} submission failed, error code = {:x}", op, error.code());
        self.abandon_cycle();
        AdvError::Submission { op, error }
    }

    /// Give up on the current cycle
    ///
    /// Completions for submissions the host already accepted will still
    /// arrive; they are owed to this cycle and must not count toward the next.
    fn abandon_cycle(&mut self) {
        if self.awaiting.contains(PendingConfigMask::ADV_DATA_PENDING) {
            self.stale_adv_data = self.stale_adv_data.saturating_add(1);
        }
        if self.awaiting.contains(PendingConfigMask::SCAN_RSP_PENDING) {
            self.stale_scan_rsp = self.stale_scan_rsp.saturating_add(1);
        }
        self.awaiting = PendingConfigMask::EMPTY;
        self.pending = PendingConfigMask::EMPTY;
        self.state = AdvState::AdvertisingFailed;
    }

    /// Consume one completion owed by an abandoned cycle, if any
    fn take_stale(&mut self, step: PendingConfigMask) -> bool {
        let owed = if step == PendingConfigMask::ADV_DATA_PENDING {
            &mut self.stale_adv_data
        } else {
            &mut self.stale_scan_rsp
        };
        if *owed == 0 {
            return false;
        }
        *owed -= 1;
        true
    }

    fn on_config_complete(
        &mut self,
        event: GapEvent,
        step: PendingConfigMask,
        op: HostOp,
        status: AckStatus,
    ) -> (Option<HostOp>, Option<Report>) {
        if self.take_stale(step) {
            debug!("{:?} completion belongs to an abandoned cycle", op);
            return (None, Some(self.unexpected(event)));
        }
        // Duplicates and late completions find their bit already clear
        if !self.state.is_configuring() || !self.pending.clear(step) {
            return (None, Some(self.unexpected(event)));
        }
        self.awaiting.clear(step);

        let mut report = None;
        if !status.is_success() {
            warn!("{:?} acknowledged with failure {:?}", op, status);
            report = Some(Report::AckFailure { op, status });
            if self.config.ack_policy == AckPolicy::RequireSuccess {
                self.abandon_cycle();
                return (None, report);
            }
        }

        if !self.pending.is_empty() {
            self.state = AdvState::configuring(self.pending);
            return (None, report);
        }

        let start_report = self.issue_start();
        (Some(HostOp::StartAdvertising), start_report.or(report))
    }

    /// Name the device and issue the single start of this cycle
    fn issue_start(&mut self) -> Option<Report> {
        if let Err(error) = self.host.set_device_name(self.config.device_name()) {
            warn!("set device name failed, error code = {:x}", error.code());
        }

        info!("starting advertising");
        self.state = AdvState::ReadyToAdvertise;
        self.start_count += 1;
        match self.host.start_advertising(&self.params) {
            Ok(()) => None,
            Err(error) => {
                self.submission_failed(HostOp::StartAdvertising, error);
                Some(Report::SubmissionFailed {
                    op: HostOp::StartAdvertising,
                    error,
                })
            }
        }
    }

    fn on_start_complete(&mut self, event: GapEvent, status: AckStatus) -> Report {
        if self.state != AdvState::ReadyToAdvertise {
            return self.unexpected(event);
        }

        if status.is_success() {
            info!("advertising started");
            self.state = AdvState::Advertising;
            Report::AdvertisingStarted
        } else {
            error!("Advertising start failed: {:?}", status);
            self.state = AdvState::AdvertisingFailed;
            Report::AckFailure {
                op: HostOp::StartAdvertising,
                status,
            }
        }
    }

    fn on_stop_complete(&mut self, event: GapEvent, status: AckStatus) -> Report {
        if self.state != AdvState::Advertising {
            return self.unexpected(event);
        }

        self.stop_outstanding = false;
        if status.is_success() {
            info!("Stop adv successfully");
            self.state = AdvState::Stopped;
            Report::AdvertisingStopped
        } else {
            warn!("Advertising stop failed: {:?}", status);
            Report::AckFailure {
                op: HostOp::StopAdvertising,
                status,
            }
        }
    }
}
