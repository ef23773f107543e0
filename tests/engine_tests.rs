// adcwatch - Integration Tests
//
// The tests are organized into categories:
// 1. Threshold gate
// 2. Time limit
// 3. Baseline and snapshot contract
// 4. Device profiles and errors

use std::time::Duration;

use adcwatch::{
    AdcError, ConfigError, DeviceConfig, DeviceProfile, EmitReason, Emitter, EngineConfig, Gain,
    HardwareIoError, JsonLinesEmitter, ManualClock, MemorySource, SampleSource, SamplingEngine,
    ScriptedSource,
};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn engine_with(
    levels: Vec<f64>,
    threshold: f64,
    max_interval: Duration,
) -> (SamplingEngine<MemorySource, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let config = EngineConfig::new(levels.len(), threshold, max_interval);
    let engine =
        SamplingEngine::with_clock(MemorySource::new(levels), config, clock.clone()).unwrap();
    (engine, clock)
}

// ============================================================================
// Threshold Gate Tests
// ============================================================================

#[test]
fn test_delta_equal_to_threshold_does_not_emit() {
    // Binary-exact values so the delta is exactly the threshold
    let (mut engine, clock) = engine_with(vec![1.0, 2.0], 0.125, Duration::from_secs(1));
    engine.source_mut().set(0, 1.125);
    clock.advance(Duration::from_millis(100));

    assert!(engine.poll().unwrap().is_none());
}

#[test]
fn test_delta_above_threshold_emits_every_channel() {
    let (mut engine, clock) = engine_with(vec![1.0, 2.0, 3.0, 4.0], 0.05, Duration::from_secs(1));
    engine.source_mut().set(2, 3.0 + 0.05 + 1e-6);
    clock.advance(Duration::from_millis(100));

    let snapshot = engine.poll().unwrap().expect("threshold crossed");
    assert_eq!(snapshot.reason(), EmitReason::Changed);
    assert_eq!(
        snapshot.keys().collect::<Vec<_>>(),
        vec!["a0", "a1", "a2", "a3"]
    );
    assert_eq!(snapshot.get("a0"), Some("1.000"));
    assert_eq!(snapshot.get("a2"), Some("3.050"));
    assert_eq!(snapshot.get("a3"), Some("4.000"));
}

#[test]
fn test_sub_threshold_drift_does_not_accumulate() {
    let (mut engine, clock) = engine_with(vec![1.0, 2.0], 0.05, Duration::from_secs(1));

    // Binary-exact levels so averaging returns them unchanged
    engine.source_mut().set(0, 1.0390625);
    clock.advance(Duration::from_millis(100));
    assert!(engine.poll().unwrap().is_none());
    assert_eq!(engine.last_emitted(), &[1.0390625, 2.0]);

    // 0.078 above the construction baseline, but only 0.039 above last cycle
    engine.source_mut().set(0, 1.078125);
    clock.advance(Duration::from_millis(100));
    assert!(engine.poll().unwrap().is_none());
    assert_eq!(engine.last_emitted(), &[1.078125, 2.0]);

    // Time limit eventually reports the drift
    clock.advance(Duration::from_millis(900));
    let snapshot = engine.poll().unwrap().expect("time limit");
    assert_eq!(snapshot.reason(), EmitReason::TimedOut);
    assert_eq!(snapshot.get("a0"), Some("1.078"));
}

#[test]
fn test_random_noise_under_threshold_is_suppressed() {
    let mut rng = StdRng::seed_from_u64(42);
    let (mut engine, clock) = engine_with(vec![1.5; 4], 0.01, Duration::from_secs(60));

    let mut previous = vec![1.5; 4];
    for _ in 0..200 {
        // Each step moves at most 0.004 from the previous level
        let levels: Vec<f64> = previous
            .iter()
            .map(|p| p + rng.gen_range(-0.004..0.004))
            .collect();
        engine.source_mut().set_all(&levels);
        clock.advance(Duration::from_millis(50));
        assert!(engine.poll().unwrap().is_none());
        previous = levels;
    }

    assert_eq!(engine.stats().polls, 200);
    assert_eq!(engine.stats().emitted, 0);
}

// ============================================================================
// Time Limit Tests
// ============================================================================

#[test]
fn test_documented_two_channel_scenario() {
    let (mut engine, clock) = engine_with(vec![1.00, 2.00], 0.05, Duration::from_secs(1));

    // Cycle 1 at t=0: baseline equals the reading, timer not expired
    assert!(engine.poll().unwrap().is_none());

    // Cycle 2 at t=0.2s
    clock.set_elapsed(Duration::from_millis(200));
    assert!(engine.poll().unwrap().is_none());

    // Cycle 3 at t=1.1s
    clock.set_elapsed(Duration::from_millis(1100));
    let snapshot = engine.poll().unwrap().expect("time limit");
    assert_eq!(snapshot.to_json(), r#"{"a0":"1.000","a1":"2.000"}"#);
    assert_eq!(snapshot.reason(), EmitReason::TimedOut);
}

#[test]
fn test_timer_resets_after_emission() {
    let (mut engine, clock) = engine_with(vec![0.0], 0.05, Duration::from_secs(1));

    clock.advance(Duration::from_millis(1500));
    assert!(engine.poll().unwrap().is_some());

    clock.advance(Duration::from_millis(1));
    assert!(engine.poll().unwrap().is_none());

    clock.advance(Duration::from_millis(999));
    assert!(engine.poll().unwrap().is_none(), "exactly max_interval");

    clock.advance(Duration::from_millis(1));
    assert!(engine.poll().unwrap().is_some());
}

#[test]
fn test_change_emission_also_resets_timer() {
    let (mut engine, clock) = engine_with(vec![0.0], 0.05, Duration::from_secs(1));

    clock.advance(Duration::from_millis(800));
    engine.source_mut().set(0, 1.0);
    assert_eq!(
        engine.poll().unwrap().unwrap().reason(),
        EmitReason::Changed
    );

    // 0.4s after the change emission: not yet timed out
    clock.advance(Duration::from_millis(400));
    assert!(engine.poll().unwrap().is_none());
}

// ============================================================================
// Baseline and Snapshot Contract Tests
// ============================================================================

#[test]
fn test_oversampling_average() {
    let source = ScriptedSource::new(1)
        .with_readings(0, [0.0])
        .with_readings(0, [1.0, 2.0, 3.0, 4.0]);
    let config = EngineConfig::new(1, 10.0, Duration::from_secs(1)).with_num_samples(4);
    let mut engine = SamplingEngine::with_clock(source, config, ManualClock::new()).unwrap();

    assert!(engine.poll().unwrap().is_none());
    assert_relative_eq!(engine.last_emitted()[0], 2.5);
}

#[test]
fn test_engine_samples_only_configured_channels() {
    let clock = ManualClock::new();
    let config = EngineConfig::new(2, 0.05, Duration::from_secs(1));
    let source = MemorySource::new(vec![1.0, 2.0, 3.0, 4.0]);
    let mut engine = SamplingEngine::with_clock(source, config, clock.clone()).unwrap();

    clock.advance(Duration::from_secs(2));
    let snapshot = engine.poll().unwrap().unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.get("a2").is_none());
    assert_eq!(engine.source().reads(2), 0);
    // One seed read plus ten oversampled reads
    assert_eq!(engine.source().reads(0), 11);
}

#[test]
fn test_raw_code_profile_renders_volts() {
    let clock = ManualClock::new();
    let profile = DeviceProfile::mcp3008(3.3, 8);
    let config = profile.engine_config(2, Duration::from_secs(1));
    let source = MemorySource::new(vec![0.0, 32768.0]);
    let mut engine = SamplingEngine::with_clock(source, config, clock.clone()).unwrap();

    // 300 counts is under the 350-count threshold
    engine.source_mut().set(0, 300.0);
    assert!(engine.poll().unwrap().is_none());

    engine.source_mut().set(0, 65535.0);
    let snapshot = engine.poll().unwrap().unwrap();
    assert_eq!(snapshot.get("a0"), Some("3.300"));
    assert_eq!(snapshot.get("a1"), Some("1.650"));
    assert_eq!(snapshot.averages(), vec![65535.0, 32768.0]);
}

#[test]
fn test_emitted_snapshots_flow_to_json_lines() {
    let (mut engine, clock) = engine_with(vec![1.0], 0.05, Duration::from_secs(1));
    let mut emitter = JsonLinesEmitter::new(Vec::new());

    for step in 0..5 {
        engine.source_mut().set(0, 1.0 + step as f64 * 0.1);
        clock.advance(Duration::from_millis(100));
        if let Some(snapshot) = engine.poll().unwrap() {
            emitter.emit("generic", &snapshot).unwrap();
        }
    }

    // Step 0 is unchanged; steps 1-4 each move 0.1
    assert_eq!(emitter.lines(), 4);
    let out = String::from_utf8(emitter.into_inner()).unwrap();
    assert!(out.lines().last().unwrap().contains(r#""a0":"1.400""#));
}

// ============================================================================
// Config File Tests
// ============================================================================

fn engine_from_file(
    json: &str,
    levels: Vec<f64>,
) -> (SamplingEngine<MemorySource, ManualClock>, ManualClock) {
    let device = DeviceConfig::from_json(json).unwrap();
    device.validate().unwrap();
    let clock = ManualClock::new();
    let engine =
        SamplingEngine::with_clock(MemorySource::new(levels), device.engine, clock.clone())
            .unwrap();
    (engine, clock)
}

#[test]
fn test_mcp3008_file_renders_volts() {
    let (mut engine, clock) = engine_from_file(
        r#"{"device":"mcp3008","vref":3.3,"engine":{"num_channels":1}}"#,
        vec![32768.0],
    );
    assert!((engine.config().noise_threshold - 350.0).abs() < 1e-12);

    // 200 counts of noise stays under the count threshold
    engine.source_mut().set(0, 32968.0);
    clock.advance(Duration::from_millis(500));
    assert!(engine.poll().unwrap().is_none());

    engine.source_mut().set(0, 32768.0);
    clock.advance(Duration::from_secs(2));
    let snapshot = engine.poll().unwrap().expect("time limit");
    assert_eq!(snapshot.get("a0"), Some("1.650"));
}

#[test]
fn test_ads1115_file_renders_volts() {
    let (mut engine, clock) = engine_from_file(
        r#"{"device":"ads1115","address":73,"engine":{"num_channels":2,"noise_threshold":0.01}}"#,
        vec![1.25, 2.5],
    );

    engine.source_mut().set(1, 2.5078125);
    clock.advance(Duration::from_millis(100));
    assert!(engine.poll().unwrap().is_none());

    engine.source_mut().set(1, 2.625);
    clock.advance(Duration::from_millis(100));
    let snapshot = engine.poll().unwrap().expect("change");
    assert_eq!(snapshot.to_json(), r#"{"a0":"1.250","a1":"2.625"}"#);
}

#[test]
fn test_thermistor_file_renders_celsius() {
    let (mut engine, clock) = engine_from_file(
        r#"{"device":"mcp3008","vref":3.3,"engine":{"num_channels":2,"thermistor":{}}}"#,
        vec![32767.5, 65535.0],
    );

    clock.advance(Duration::from_secs(2));
    let snapshot = engine.poll().unwrap().expect("time limit");
    // Half scale sits at the nominal temperature; full scale is off the divider curve
    assert_eq!(snapshot.to_json(), r#"{"a0f":"23.0","a1f":"nan"}"#);
}

// ============================================================================
// Device Profile and Error Tests
// ============================================================================

#[test]
fn test_ads1115_channel_limit() {
    let profile = DeviceProfile::ads1115(Gain::One, 0x48);
    let config = profile.engine_config(5, Duration::from_secs(1));
    assert!(matches!(
        config.validate(profile.max_channels()),
        Err(ConfigError::ChannelCount {
            requested: 5,
            max: 4
        })
    ));
}

#[test]
fn test_failed_read_mid_cycle_returns_no_partial_snapshot() {
    let (mut engine, clock) = engine_with(vec![1.0, 2.0, 3.0], 0.05, Duration::from_secs(1));
    engine.source_mut().set_all(&[9.0, 9.0, 9.0]);
    engine.source_mut().fail_next_read(2);
    clock.advance(Duration::from_secs(3));

    match engine.poll() {
        Err(AdcError::Hardware(HardwareIoError::NotResponding(_))) => {}
        other => panic!("expected hardware error, got {:?}", other),
    }
    assert_eq!(engine.last_emitted(), &[1.0, 2.0, 3.0]);

    // Caller retries the whole cycle
    let snapshot = engine.poll().unwrap().unwrap();
    assert_eq!(snapshot.reason(), EmitReason::ChangedAndTimedOut);
    assert_eq!(engine.stats().hardware_errors, 1);
}

#[test]
fn test_boxed_dyn_source() {
    let source: Box<dyn SampleSource> = Box::new(MemorySource::uniform(3, 0.25));
    let config = EngineConfig::new(3, 0.05, Duration::from_secs(1));
    let mut engine = SamplingEngine::with_clock(source, config, ManualClock::new()).unwrap();
    assert!(engine.poll().unwrap().is_none());
}
