//! Channel failures: backoff, resubscription and what keeps running meanwhile.

use roomlink::app::events::AppEvent;
use roomlink::app::service::{ChannelState, LoopPhase};
use roomlink::config::SystemConfig;
use roomlink::error::ChannelError;
use roomlink::registry::ActuatorId;
use roomlink::remote::ChangeEvent;

use super::mock_hw::{MockRemote, primary_level, started};

#[test]
fn poll_error_marks_channel_failed() {
    let mut remote = MockRemote::default();
    remote.fail_next_poll(ChannelError::StreamClosed);
    let (mut lp, mut sink) = started(remote);

    lp.tick(&mut sink);

    assert_eq!(lp.channel_state(), ChannelState::Failed(ChannelError::StreamClosed));
    assert_eq!(lp.phase(), LoopPhase::ResubscribeWait);
    assert_eq!(lp.stats().channel_failures, 1);
    assert!(sink.events.contains(&AppEvent::ChannelFailed(ChannelError::StreamClosed)));
    // The failing tick still refreshed the display.
    assert_eq!(lp.hw().frames.len(), 1);
}

#[test]
fn next_tick_backs_off_then_resubscribes_without_polling() {
    let mut remote = MockRemote::default();
    remote.fail_next_poll(ChannelError::Transport);
    let (mut lp, mut sink) = started(remote);
    let cfg = SystemConfig::default();

    lp.tick(&mut sink);
    let polls = lp.remote().polls;
    lp.tick(&mut sink);

    assert_eq!(lp.remote().polls, polls);
    assert_eq!(lp.remote().subscribes.len(), 2);
    assert_eq!(lp.channel_state(), ChannelState::Streaming);
    assert_eq!(
        lp.clock().delays,
        [cfg.loop_tick_ms, cfg.resubscribe_backoff_ms, cfg.loop_tick_ms]
    );
    assert!(sink.events.contains(&AppEvent::Resubscribing { attempt: 1 }));
    assert_eq!(lp.hw().frames.len(), 2);
}

#[test]
fn recovery_tick_skips_the_sensor() {
    let mut remote = MockRemote::default();
    remote.fail_next_poll(ChannelError::Transport);
    let (mut lp, mut sink) = started(remote);

    lp.tick(&mut sink);
    lp.clock_mut().now = 5_000;
    lp.tick(&mut sink);
    assert_eq!(lp.stats().samples, 0);

    lp.tick(&mut sink);
    assert_eq!(lp.stats().samples, 1);
}

#[test]
fn repeated_subscribe_failures_count_attempts() {
    let mut remote = MockRemote::default();
    remote.subscribe_results.extend([
        Err(ChannelError::Transport),
        Err(ChannelError::Http(503)),
        Err(ChannelError::Transport),
    ]);
    let (mut lp, mut sink) = started(remote);
    assert_eq!(lp.channel_state(), ChannelState::Failed(ChannelError::Transport));

    lp.tick(&mut sink);
    lp.tick(&mut sink);
    assert_eq!(lp.channel_state(), ChannelState::Failed(ChannelError::Transport));
    lp.tick(&mut sink);
    assert_eq!(lp.channel_state(), ChannelState::Streaming);

    let attempts: Vec<u32> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Resubscribing { attempt } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, [1, 2, 3]);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SubscribeFailed(_))), 3);
    // Subscribe failures are not stream failures.
    assert_eq!(lp.stats().channel_failures, 0);
    assert_eq!(lp.hw().frames.len(), 3);
}

#[test]
fn attempt_counter_resets_after_success() {
    let mut remote = MockRemote::default();
    remote.subscribe_results.push_back(Err(ChannelError::Transport));
    let (mut lp, mut sink) = started(remote);

    lp.tick(&mut sink);
    assert_eq!(lp.channel_state(), ChannelState::Streaming);

    lp.remote_mut().fail_next_poll(ChannelError::Cancelled);
    lp.tick(&mut sink);
    sink.clear();
    lp.tick(&mut sink);

    assert!(sink.events.contains(&AppEvent::Resubscribing { attempt: 1 }));
}

#[test]
fn outputs_and_display_hold_while_disconnected() {
    let mut remote = MockRemote::default();
    remote.push(ChangeEvent::put("/LedStatus", 0));
    remote.subscribe_results.extend([Ok(()), Err(ChannelError::Transport), Err(ChannelError::Transport)]);
    let (mut lp, mut sink) = started(remote);

    // Event applied, then the resubscription fails.
    lp.tick(&mut sink);
    assert!(matches!(lp.channel_state(), ChannelState::Failed(_)));

    lp.tick(&mut sink);
    lp.tick(&mut sink);

    assert_eq!(primary_level(&lp, ActuatorId::Bulb), Some(false));
    assert!(lp.hw().frames.iter().all(|f| f[0] == "LED: ON"));
}

#[test]
fn events_after_recovery_are_applied() {
    let mut remote = MockRemote::default();
    remote.fail_next_poll(ChannelError::AuthRevoked);
    remote.push(ChangeEvent::put("/PowerAC", 0));
    let (mut lp, mut sink) = started(remote);

    lp.tick(&mut sink);
    lp.tick(&mut sink);
    assert_eq!(lp.stats().events_applied, 0);

    lp.tick(&mut sink);
    assert_eq!(lp.stats().events_applied, 1);
    assert_eq!(lp.registry().is_on(ActuatorId::PowerOutlet), Some(true));
}

#[test]
fn queued_events_wait_for_a_successful_resubscribe() {
    let mut remote = MockRemote::default();
    remote.push(ChangeEvent::put("/PowerAC", 0));
    remote.push(ChangeEvent::put("/LedStatus", 0));
    remote.subscribe_results.extend([
        Err(ChannelError::Transport),
        Err(ChannelError::Transport),
        Err(ChannelError::Http(503)),
        Err(ChannelError::Transport),
    ]);
    let (mut lp, mut sink) = started(remote);

    // Three failed recovery ticks, then one that gets the stream back.
    for _ in 0..4 {
        lp.tick(&mut sink);
        assert_eq!(lp.remote().polls, 0);
        assert_eq!(lp.stats().events_applied, 0);
        assert_eq!(lp.registry().is_on(ActuatorId::PowerOutlet), Some(false));
    }
    assert_eq!(lp.channel_state(), ChannelState::Streaming);

    lp.tick(&mut sink);
    assert_eq!(lp.remote().polls, 1);
    assert_eq!(lp.stats().events_applied, 1);
    assert_eq!(lp.registry().is_on(ActuatorId::PowerOutlet), Some(true));
}
