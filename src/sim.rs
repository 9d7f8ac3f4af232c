/// Simulated audio device manager
///
/// Stands in for the audio subsystem when no hardware is attached: it
/// counts every call, keeps the most recent ones, tracks which endpoints hold
/// a registered process, and answers polls from a script.

use crate::endpoint::Endpoint;
use crate::manager::{AudioDeviceManager, ManagerError, MessageId, ProcessType, SpeechDetectMode};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};

/// Call made against the simulated manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerCall {
    RegisterProcessType(Endpoint, ProcessType, SpeechDetectMode),
    RegisterProcessHandler(Endpoint, ProcessType),
    UnregisterProcess(Endpoint),
    StartProcessType(Endpoint, SpeechDetectMode),
    StopProcessType(Endpoint, SpeechDetectMode),
    PollHandlerMessage(Endpoint),
}

/// Calls kept by [`SimulatedAudioManager::new`]
pub const DEFAULT_CALL_LOG_CAPACITY: usize = 1024;

/// Discriminant of [`ManagerCall`], for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    RegisterProcessType,
    RegisterProcessHandler,
    UnregisterProcess,
    StartProcessType,
    StopProcessType,
    PollHandlerMessage,
}

impl ManagerCall {
    pub fn kind(&self) -> CallKind {
        match self {
            ManagerCall::RegisterProcessType(..) => CallKind::RegisterProcessType,
            ManagerCall::RegisterProcessHandler(..) => CallKind::RegisterProcessHandler,
            ManagerCall::UnregisterProcess(..) => CallKind::UnregisterProcess,
            ManagerCall::StartProcessType(..) => CallKind::StartProcessType,
            ManagerCall::StopProcessType(..) => CallKind::StopProcessType,
            ManagerCall::PollHandlerMessage(..) => CallKind::PollHandlerMessage,
        }
    }
}

impl CallKind {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        match self {
            CallKind::RegisterProcessType => 0,
            CallKind::RegisterProcessHandler => 1,
            CallKind::UnregisterProcess => 2,
            CallKind::StartProcessType => 3,
            CallKind::StopProcessType => 4,
            CallKind::PollHandlerMessage => 5,
        }
    }
}

pub type PollReply = Result<Option<MessageId>, ManagerError>;

#[derive(Debug, Default)]
struct Failures {
    register: Option<ManagerError>,
    register_handler: Option<ManagerError>,
    unregister: Option<ManagerError>,
    start: Option<ManagerError>,
    stop: Option<ManagerError>,
}

#[derive(Debug)]
struct SimState {
    calls: VecDeque<ManagerCall>,
    call_log_capacity: usize,
    counts: [usize; CallKind::COUNT],
    registered: HashSet<Endpoint>,
    running: HashSet<Endpoint>,
    failures: Failures,
    script: VecDeque<PollReply>,
    fallback: PollReply,
    detect_every: Option<u64>,
    polls: u64,
}

impl SimState {
    fn record(&mut self, call: ManagerCall) {
        self.counts[call.kind().index()] += 1;

        if self.call_log_capacity == 0 {
            return;
        }
        if self.calls.len() == self.call_log_capacity {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }
}

#[derive(Debug)]
pub struct SimulatedAudioManager {
    state: Mutex<SimState>,
}

impl Default for SimulatedAudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAudioManager {
    /// Manager on which every operation succeeds and polls find nothing
    pub fn new() -> Self {
        Self::with_call_log_capacity(DEFAULT_CALL_LOG_CAPACITY)
    }

    /// Keep only the last `capacity` calls (0 keeps none). Counters are
    /// unaffected.
    pub fn with_call_log_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(SimState {
                calls: VecDeque::with_capacity(capacity.min(DEFAULT_CALL_LOG_CAPACITY)),
                call_log_capacity: capacity,
                counts: [0; CallKind::COUNT],
                registered: HashSet::new(),
                running: HashSet::new(),
                failures: Failures::default(),
                script: VecDeque::new(),
                fallback: Ok(None),
                detect_every: None,
                polls: 0,
            }),
        }
    }

    pub fn fail_register(&self, err: ManagerError) {
        self.state.lock().failures.register = Some(err);
    }

    pub fn fail_register_handler(&self, err: ManagerError) {
        self.state.lock().failures.register_handler = Some(err);
    }

    pub fn fail_unregister(&self, err: ManagerError) {
        self.state.lock().failures.unregister = Some(err);
    }

    pub fn fail_start(&self, err: ManagerError) {
        self.state.lock().failures.start = Some(err);
    }

    pub fn fail_stop(&self, err: ManagerError) {
        self.state.lock().failures.stop = Some(err);
    }

    /// Queue a reply for an upcoming poll
    pub fn push_poll(&self, reply: PollReply) {
        self.state.lock().script.push_back(reply);
    }

    /// Reply used once the script runs dry
    pub fn set_fallback(&self, reply: PollReply) {
        self.state.lock().fallback = reply;
    }

    /// Post a keyword message on every `n`th unscripted poll
    pub fn detect_every(&self, n: u64) {
        self.state.lock().detect_every = (n > 0).then_some(n);
    }

    /// Most recent calls, oldest first
    pub fn calls(&self) -> Vec<ManagerCall> {
        self.state.lock().calls.iter().copied().collect()
    }

    /// Total calls of `kind` since creation
    pub fn count(&self, kind: CallKind) -> usize {
        self.state.lock().counts[kind.index()]
    }

    pub fn is_registered(&self, endpoint: Endpoint) -> bool {
        self.state.lock().registered.contains(&endpoint)
    }

    pub fn is_running(&self, endpoint: Endpoint) -> bool {
        self.state.lock().running.contains(&endpoint)
    }
}

impl AudioDeviceManager for SimulatedAudioManager {
    fn register_process_type(
        &self,
        endpoint: Endpoint,
        process: ProcessType,
        mode: SpeechDetectMode,
    ) -> Result<(), ManagerError> {
        let mut state = self.state.lock();
        state.record(ManagerCall::RegisterProcessType(endpoint, process, mode));

        if let Some(err) = state.failures.register {
            return Err(err);
        }

        state.registered.insert(endpoint);
        Ok(())
    }

    fn register_process_handler(
        &self,
        endpoint: Endpoint,
        process: ProcessType,
    ) -> Result<(), ManagerError> {
        let mut state = self.state.lock();
        state.record(ManagerCall::RegisterProcessHandler(endpoint, process));

        if let Some(err) = state.failures.register_handler {
            return Err(err);
        }
        if !state.registered.contains(&endpoint) {
            return Err(ManagerError::NotRegistered);
        }

        Ok(())
    }

    fn unregister_process(&self, endpoint: Endpoint) -> Result<(), ManagerError> {
        let mut state = self.state.lock();
        state.record(ManagerCall::UnregisterProcess(endpoint));

        if let Some(err) = state.failures.unregister {
            return Err(err);
        }
        if !state.registered.remove(&endpoint) {
            return Err(ManagerError::NotRegistered);
        }

        state.running.remove(&endpoint);
        Ok(())
    }

    fn start_process_type(
        &self,
        endpoint: Endpoint,
        mode: SpeechDetectMode,
    ) -> Result<(), ManagerError> {
        let mut state = self.state.lock();
        state.record(ManagerCall::StartProcessType(endpoint, mode));

        if let Some(err) = state.failures.start {
            return Err(err);
        }
        if !state.registered.contains(&endpoint) {
            return Err(ManagerError::NotRegistered);
        }

        state.running.insert(endpoint);
        Ok(())
    }

    fn stop_process_type(
        &self,
        endpoint: Endpoint,
        mode: SpeechDetectMode,
    ) -> Result<(), ManagerError> {
        let mut state = self.state.lock();
        state.record(ManagerCall::StopProcessType(endpoint, mode));
        state.running.remove(&endpoint);

        match state.failures.stop {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn poll_handler_message(&self, endpoint: Endpoint) -> Result<Option<MessageId>, ManagerError> {
        let mut state = self.state.lock();
        state.record(ManagerCall::PollHandlerMessage(endpoint));

        if let Some(reply) = state.script.pop_front() {
            return reply;
        }

        state.polls += 1;
        if let Some(n) = state.detect_every {
            if state.polls % n == 0 {
                return Ok(Some(SpeechDetectMode::KeywordDetect.message_id()));
            }
        }

        state.fallback
    }
}
