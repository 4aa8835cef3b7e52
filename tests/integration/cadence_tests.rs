//! Sensor timer, update throttle and the push hook.

use roomlink::app::events::AppEvent;
use roomlink::config::SystemConfig;
use roomlink::remote::{ChangeEvent, HUMIDITY_PATH, TEMPERATURE_PATH};

use super::mock_hw::{MockRemote, RecordingSink, TestLoop, build, started};

/// Advance past the next sensor deadline, then tick once.
fn sample_tick(lp: &mut TestLoop, sink: &mut RecordingSink) {
    let interval = u64::from(lp.config().sensor_interval_ms);
    lp.clock_mut().now += interval;
    lp.tick(sink);
}

// ── Sensor timer ──────────────────────────────────────────────

#[test]
fn sensor_sampled_at_most_once_per_interval() {
    let (mut lp, mut sink) = started(MockRemote::default());

    // 1000 ticks of 10 ms: deadlines at 2 s, 4 s, 6 s, 8 s.
    for _ in 0..1_000 {
        lp.tick(&mut sink);
    }

    assert_eq!(lp.stats().samples, 4);
    assert_eq!(lp.hw().samples, 4);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorSampled(_))), 4);
}

#[test]
fn no_sample_before_first_interval() {
    let (mut lp, mut sink) = started(MockRemote::default());
    let just_before = u64::from(lp.config().sensor_interval_ms) - 1;
    lp.clock_mut().now = just_before;

    lp.tick(&mut sink);

    assert_eq!(lp.stats().samples, 0);
    assert_eq!(lp.hw().last_frame()[2], "Temp: 0.00");
}

#[test]
fn readings_reach_the_display() {
    let (mut lp, mut sink) = started(MockRemote::default());

    sample_tick(&mut lp, &mut sink);

    let frame = lp.hw().last_frame();
    assert_eq!(frame[2], "Temp: 21.00");
    assert_eq!(frame[3], "Humid: 45.00");
}

#[test]
fn sampling_continues_alongside_channel_traffic() {
    let mut remote = MockRemote::default();
    remote.push(ChangeEvent::put("/LedStatus", 0));
    let (mut lp, mut sink) = started(remote);

    sample_tick(&mut lp, &mut sink);

    assert_eq!(lp.stats().events_applied, 1);
    assert_eq!(lp.stats().samples, 1);
}

// ── Faulty readings ───────────────────────────────────────────

#[test]
fn failed_temperature_keeps_previous_value() {
    let (mut lp, mut sink) = started(MockRemote::default());
    lp.hw_mut().temps.extend([Some(23.5), None]);

    sample_tick(&mut lp, &mut sink);
    sample_tick(&mut lp, &mut sink);

    assert_eq!(lp.mirrored().temperature(), 23.5);
    assert_eq!(lp.mirrored().humidity(), 45.0);
    assert_eq!(lp.hw().last_frame()[2], "Temp: 23.50");
    assert_eq!(
        sink.count(|e| *e == AppEvent::SensorFault { temperature: true, humidity: false }),
        1
    );
}

#[test]
fn nan_counts_as_a_failed_read() {
    let (mut lp, mut sink) = started(MockRemote::default());
    lp.hw_mut().humids.extend([Some(40.0), Some(f32::NAN)]);

    sample_tick(&mut lp, &mut sink);
    sample_tick(&mut lp, &mut sink);

    assert_eq!(lp.mirrored().humidity(), 40.0);
    assert_eq!(lp.hw().last_frame()[3], "Humid: 40.00");
}

// ── Throttle + push hook ──────────────────────────────────────

#[test]
fn hook_runs_every_fifteenth_sample() {
    let (mut lp, mut sink) = started(MockRemote::default());

    for i in 1..=30 {
        sample_tick(&mut lp, &mut sink);
        let expected = u64::from(i >= 15) + u64::from(i >= 30);
        assert_eq!(lp.stats().publish_hook_calls, expected, "after sample {i}");
    }

    assert_eq!(lp.stats().samples, 30);
    // Publishing is off by default: the hook runs but sends nothing.
    assert!(lp.remote().floats.is_empty());
    assert_eq!(sink.count(|e| *e == AppEvent::PublishHook { transmitted: false }), 2);
}

#[test]
fn hook_pushes_readings_when_enabled() {
    let config = SystemConfig {
        publish_readings: true,
        ..SystemConfig::default()
    };
    let mut lp = build(config, MockRemote::default());
    let mut sink = RecordingSink::new();
    lp.start(&mut sink);

    for _ in 0..15 {
        sample_tick(&mut lp, &mut sink);
    }

    assert_eq!(
        lp.remote().floats,
        [(TEMPERATURE_PATH.to_string(), 21.0), (HUMIDITY_PATH.to_string(), 45.0)]
    );
    assert!(sink.events.contains(&AppEvent::PublishHook { transmitted: true }));
}

#[test]
fn custom_publish_cadence() {
    let config = SystemConfig {
        publish_every_samples: 3,
        ..SystemConfig::default()
    };
    let mut lp = build(config, MockRemote::default());
    let mut sink = RecordingSink::new();
    lp.start(&mut sink);

    for _ in 0..10 {
        sample_tick(&mut lp, &mut sink);
    }

    assert_eq!(lp.stats().publish_hook_calls, 3);
}
