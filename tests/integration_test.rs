/// Integration tests for the hardware keyword detector
///
/// Drives the detector end-to-end against the simulated audio manager and
/// the real-time clock.

use hw_keyword_detector::{
    CallKind, DetectionOutcome, DetectorError, Endpoint, EndpointRegistry,
    HardwareKeywordDetector, ManagerCall, ManagerError, ProcessType, SimulatedAudioManager,
    SpeechDetectMode, StreamFormat, DEFAULT_CALL_LOG_CAPACITY,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const KD: SpeechDetectMode = SpeechDetectMode::KeywordDetect;

fn setup(endpoint: Endpoint) -> (Arc<SimulatedAudioManager>, HardwareKeywordDetector) {
    let sim = Arc::new(SimulatedAudioManager::new());
    let manager: Arc<SimulatedAudioManager> = Arc::clone(&sim);
    let detector = HardwareKeywordDetector::new(endpoint, manager)
        .with_registry(EndpointRegistry::new());
    (sim, detector)
}

#[test]
fn test_initialize_deinitialize_leaves_nothing_registered() {
    for (card, device) in [(0, 0), (0, 1), (3, 7)] {
        let endpoint = Endpoint::new(card, device);
        let (sim, mut detector) = setup(endpoint);

        detector.initialize(StreamFormat::default()).expect("initialize failed");
        assert!(sim.is_registered(endpoint));

        detector.deinitialize();
        assert!(!sim.is_registered(endpoint));

        assert_eq!(
            sim.calls(),
            vec![
                ManagerCall::RegisterProcessType(endpoint, ProcessType::SpeechDetector, KD),
                ManagerCall::RegisterProcessHandler(endpoint, ProcessType::SpeechDetector),
                ManagerCall::UnregisterProcess(endpoint),
            ]
        );
    }
}

#[test]
fn test_failed_registration_never_registers_handler() {
    let (sim, mut detector) = setup(Endpoint::new(0, 0));
    sim.fail_register(ManagerError::InvalidParam);

    assert!(detector.initialize(StreamFormat::default()).is_err());
    assert_eq!(sim.count(CallKind::RegisterProcessHandler), 0);
    assert!(!detector.is_initialized());
}

#[test]
fn test_failed_handler_registration_leaves_nothing_registered() {
    let endpoint = Endpoint::new(0, 0);
    let (sim, mut detector) = setup(endpoint);
    sim.fail_register_handler(ManagerError::Failed);

    assert!(matches!(
        detector.initialize(StreamFormat::default()),
        Err(DetectorError::HandlerRegistrationFailed { .. })
    ));
    assert!(!sim.is_registered(endpoint));
}

#[test]
fn test_zero_timeout_returns_quickly() {
    let (_sim, mut detector) = setup(Endpoint::new(0, 0));
    detector.initialize(StreamFormat::default()).unwrap();

    let start = Instant::now();
    let outcome = detector.start_keyword_detect(Duration::ZERO).unwrap();

    assert_eq!(outcome, DetectionOutcome::TimedOut);
    assert!(start.elapsed() < Duration::from_millis(200));
}

#[test]
fn test_detection_on_first_poll_stops_once() {
    let endpoint = Endpoint::new(0, 0);
    let (sim, mut detector) = setup(endpoint);
    sim.push_poll(Ok(Some(KD.message_id())));
    detector.initialize(StreamFormat::default()).unwrap();

    assert!(detector.start_keyword_detect(Duration::from_secs(5)).unwrap().is_detected());

    assert_eq!(sim.count(CallKind::PollHandlerMessage), 1);
    assert_eq!(sim.count(CallKind::StopProcessType), 1);
    assert_eq!(
        sim.calls().last(),
        Some(&ManagerCall::StopProcessType(endpoint, KD))
    );
    assert!(!sim.is_running(endpoint));
}

#[test]
fn test_unsupported_device_stops_without_further_polls() {
    let (sim, mut detector) = setup(Endpoint::new(0, 0));
    sim.push_poll(Err(ManagerError::InvalidDevice));
    detector.initialize(StreamFormat::default()).unwrap();

    let outcome = detector.start_keyword_detect(Duration::from_secs(5)).unwrap();

    assert_eq!(outcome, DetectionOutcome::Unsupported);
    assert_eq!(sim.count(CallKind::PollHandlerMessage), 1);
    assert_eq!(sim.count(CallKind::StopProcessType), 1);
}

#[test]
fn test_timeout_bounds() {
    let (sim, detector) = setup(Endpoint::new(0, 0));
    let mut detector = detector.with_poll_interval(Duration::from_millis(5));
    detector.initialize(StreamFormat::default()).unwrap();

    let timeout = Duration::from_secs(1);
    let start = Instant::now();
    let outcome = detector.start_keyword_detect(timeout).unwrap();
    let elapsed = start.elapsed();

    assert_eq!(outcome, DetectionOutcome::TimedOut);
    assert!(elapsed >= timeout, "returned early after {:?}", elapsed);
    assert!(elapsed < timeout + Duration::from_millis(250), "overran: {:?}", elapsed);
    assert!(sim.count(CallKind::PollHandlerMessage) > 1);
    assert_eq!(sim.count(CallKind::StopProcessType), 1);
}

#[test]
fn test_start_failure_skips_poll_and_stop() {
    let (sim, mut detector) = setup(Endpoint::new(0, 0));
    sim.fail_start(ManagerError::DeviceFailed);
    detector.initialize(StreamFormat::default()).unwrap();

    let start = Instant::now();
    let result = detector.start_keyword_detect(Duration::from_secs(5));

    assert!(matches!(result, Err(DetectorError::StartFailed { .. })));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(sim.count(CallKind::PollHandlerMessage), 0);
    assert_eq!(sim.count(CallKind::StopProcessType), 0);
}

#[test]
fn test_detection_after_some_polls() {
    let (sim, mut detector) = setup(Endpoint::new(1, 1));
    sim.detect_every(25);
    detector.initialize(StreamFormat::default()).unwrap();

    assert!(detector.wait_for_keyword(Duration::from_secs(5)).is_ok());
    assert_eq!(sim.count(CallKind::PollHandlerMessage), 25);
}

#[test]
fn test_repeated_attempts_rearm_hardware() {
    let (sim, mut detector) = setup(Endpoint::new(0, 0));
    detector.initialize(StreamFormat::default()).unwrap();

    for _ in 0..3 {
        sim.push_poll(Ok(Some(KD.message_id())));
        assert!(detector.start_keyword_detect(Duration::from_secs(1)).unwrap().is_detected());
    }

    assert_eq!(sim.count(CallKind::StartProcessType), 3);
    assert_eq!(sim.count(CallKind::StopProcessType), 3);
}

#[test]
fn test_unregister_failure_is_not_fatal() {
    let endpoint = Endpoint::new(0, 0);
    let registry = EndpointRegistry::new();
    let sim = Arc::new(SimulatedAudioManager::new());
    sim.fail_unregister(ManagerError::DeviceFailed);

    let manager: Arc<SimulatedAudioManager> = Arc::clone(&sim);
    let mut detector = HardwareKeywordDetector::new(endpoint, manager)
        .with_registry(registry.clone());
    detector.initialize(StreamFormat::default()).unwrap();

    detector.deinitialize();

    assert!(!detector.is_initialized());
    assert!(!registry.is_claimed(endpoint));
    assert_eq!(sim.count(CallKind::UnregisterProcess), 1);
}

#[test]
fn test_endpoint_reusable_after_drop() {
    let endpoint = Endpoint::new(2, 2);
    let registry = EndpointRegistry::new();
    let sim = Arc::new(SimulatedAudioManager::new());

    {
        let manager: Arc<SimulatedAudioManager> = Arc::clone(&sim);
        let mut first = HardwareKeywordDetector::new(endpoint, manager)
            .with_registry(registry.clone());
        first.initialize(StreamFormat::default()).unwrap();

        let manager: Arc<SimulatedAudioManager> = Arc::clone(&sim);
        let mut second = HardwareKeywordDetector::new(endpoint, manager)
            .with_registry(registry.clone());
        assert!(matches!(
            second.initialize(StreamFormat::default()),
            Err(DetectorError::EndpointBusy(_))
        ));
    }

    assert!(!sim.is_registered(endpoint));

    let manager: Arc<SimulatedAudioManager> = Arc::clone(&sim);
    let mut third = HardwareKeywordDetector::new(endpoint, manager)
        .with_registry(registry.clone());
    assert!(third.initialize(StreamFormat::default()).is_ok());
}

#[test]
fn test_long_listening_run_keeps_call_log_bounded() {
    let (sim, mut detector) = setup(Endpoint::new(0, 0));
    sim.detect_every(50_000);
    detector.initialize(StreamFormat::default()).unwrap();

    let mut detections = 0;
    for _ in 0..4 {
        if detector.start_keyword_detect(Duration::from_millis(250)).unwrap().is_detected() {
            detections += 1;
        }
    }

    let polls = sim.count(CallKind::PollHandlerMessage);
    println!("Long run: {} polls, {} detections", polls, detections);

    assert!(polls > DEFAULT_CALL_LOG_CAPACITY);
    assert!(sim.calls().len() <= DEFAULT_CALL_LOG_CAPACITY);
    assert_eq!(sim.count(CallKind::StartProcessType), 4);
    assert_eq!(sim.count(CallKind::StopProcessType), 4);
}
