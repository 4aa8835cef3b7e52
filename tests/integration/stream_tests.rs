//! The loop driven through the real stream channel over the simulated store.

use roomlink::adapters::firebase::FirebaseTransport;
use roomlink::app::events::AppEvent;
use roomlink::app::service::{ChannelState, ReconciliationLoop};
use roomlink::config::SystemConfig;
use roomlink::error::ChannelError;
use roomlink::registry::ActuatorId;
use roomlink::remote::StreamChannel;

use super::mock_hw::{FakeClock, MockBoard, MockPin, RecordingSink, registry};

type StoreLoop = ReconciliationLoop<StreamChannel<FirebaseTransport>, MockBoard, FakeClock, MockPin>;

fn config() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.remote_host.push_str("room-rtdb.example.com").unwrap();
    c.remote_auth.push_str("token").unwrap();
    c
}

fn store_loop(config: SystemConfig, seed: impl FnOnce(&mut FirebaseTransport)) -> (StoreLoop, RecordingSink) {
    let mut transport = FirebaseTransport::new(&config);
    seed(&mut transport);
    let mut lp = ReconciliationLoop::new(
        config,
        StreamChannel::new(transport),
        MockBoard::default(),
        FakeClock::default(),
        registry(),
    );
    let mut sink = RecordingSink::new();
    lp.start(&mut sink);
    (lp, sink)
}

fn sim(lp: &mut StoreLoop) -> &mut FirebaseTransport {
    lp.remote_mut().transport_mut()
}

#[test]
fn stored_values_load_at_start() {
    let (lp, _) = store_loop(config(), |t| {
        t.sim_set("/LedStatus", "0");
        t.sim_set("/PowerAC", "1");
    });

    assert_eq!(lp.registry().is_on(ActuatorId::Bulb), Some(true));
    assert_eq!(lp.registry().is_on(ActuatorId::PowerOutlet), Some(false));
    assert_eq!(lp.channel_state(), ChannelState::Streaming);
    assert_eq!(lp.remote().transport().sim_opens(), 1);
}

#[test]
fn streamed_put_drives_outlet() {
    let (mut lp, mut sink) = store_loop(config(), |_| {});
    sim(&mut lp).sim_push_event("put", r#"{"path":"/PowerAC","data":0}"#);

    lp.tick(&mut sink);

    assert_eq!(lp.registry().is_on(ActuatorId::PowerOutlet), Some(true));
    assert_eq!(lp.hw().last_frame()[1], "Power AC: ON");
    // Resubscribed after the event.
    assert_eq!(lp.remote().transport().sim_opens(), 2);
}

#[test]
fn frames_in_one_read_all_survive_resubscription() {
    let (mut lp, mut sink) = store_loop(config(), |_| {});
    sim(&mut lp).sim_push_event("keep-alive", "null");
    sim(&mut lp).sim_push_event("put", r#"{"path":"/LedStatus","data":0}"#);
    sim(&mut lp).sim_push_event("put", r#"{"path":"/PowerAC","data":"0"}"#);

    lp.tick(&mut sink);
    lp.tick(&mut sink);

    assert_eq!(lp.stats().events_applied, 2);
    assert_eq!(lp.registry().is_on(ActuatorId::Bulb), Some(true));
    assert_eq!(lp.registry().is_on(ActuatorId::PowerOutlet), Some(true));
}

#[test]
fn root_snapshot_and_patch_are_ignored() {
    let (mut lp, mut sink) = store_loop(config(), |_| {});
    sim(&mut lp).sim_push_event("put", r#"{"path":"/","data":{"LedStatus":0,"PowerAC":0}}"#);
    sim(&mut lp).sim_push_event("patch", r#"{"path":"/","data":{"LedStatus":0}}"#);

    lp.tick(&mut sink);
    lp.tick(&mut sink);

    assert_eq!(lp.stats().events_ignored, 2);
    assert_eq!(lp.registry().is_on(ActuatorId::Bulb), Some(false));
}

#[test]
fn revoked_auth_fails_then_reopens() {
    let (mut lp, mut sink) = store_loop(config(), |_| {});
    sim(&mut lp).sim_push_event("auth_revoked", "\"credential is no longer valid\"");

    lp.tick(&mut sink);
    assert_eq!(lp.channel_state(), ChannelState::Failed(ChannelError::AuthRevoked));

    lp.tick(&mut sink);
    assert_eq!(lp.channel_state(), ChannelState::Streaming);
    assert_eq!(lp.remote().transport().sim_opens(), 2);
    assert!(sink.events.contains(&AppEvent::Resubscribing { attempt: 1 }));
}

#[test]
fn dropped_connection_recovers() {
    let (mut lp, mut sink) = store_loop(config(), |_| {});
    sim(&mut lp).sim_fail_next_read(ChannelError::StreamClosed);

    lp.tick(&mut sink);
    assert_eq!(lp.stats().channel_failures, 1);

    sim(&mut lp).sim_push_event("put", r#"{"path":"/LedStatus","data":0}"#);
    lp.tick(&mut sink);
    lp.tick(&mut sink);

    assert_eq!(lp.registry().is_on(ActuatorId::Bulb), Some(true));
}

#[test]
fn publish_writes_readings_to_store() {
    let cfg = SystemConfig {
        publish_readings: true,
        publish_every_samples: 1,
        ..config()
    };
    let (mut lp, mut sink) = store_loop(cfg, |_| {});
    lp.clock_mut().now = 2_000;

    lp.tick(&mut sink);

    assert_eq!(lp.remote().transport().sim_value("/Temperature"), Some("21"));
    assert_eq!(lp.remote().transport().sim_value("/Humidity"), Some("45"));
}

#[test]
fn unconfigured_store_keeps_retrying() {
    let (mut lp, mut sink) = store_loop(SystemConfig::default(), |_| {});
    assert_eq!(lp.channel_state(), ChannelState::Failed(ChannelError::NotConnected));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::InitialFetchFailed { .. })), 2);

    lp.tick(&mut sink);
    lp.tick(&mut sink);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::SubscribeFailed(_))), 3);
    assert_eq!(lp.hw().frames.len(), 2);
}
