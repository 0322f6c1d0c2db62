mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::{OTHER, PHASE, Recorder, SAVED, TICK, init_tracing};
use eventvisor::{
    Event, EventType, HandlerError, Hub, HubConfig, HubError, HubHandle, MAX_INTERVAL, Payload,
    Subscribe, TimerSpec,
};
use serde_json::json;

fn start() -> (HubHandle, tokio::task::JoinHandle<()>) {
    init_tracing();
    let (hub, handle) = Hub::new(HubConfig::default());
    (handle, hub.spawn())
}

#[tokio::test(start_paused = true)]
async fn delivers_only_when_mask_intersects() {
    let (handle, _join) = start();
    let phases = Arc::new(Recorder::default());
    let saves = Arc::new(Recorder::default());
    handle.subscribe(&phases, PHASE | TICK, None).unwrap();
    handle.subscribe(&saves, SAVED, None).unwrap();

    handle.publish(PHASE, Payload::new()).unwrap();
    handle.publish(SAVED | OTHER, Payload::new()).unwrap();
    handle.publish(OTHER, Payload::new()).unwrap();
    handle.publish(TICK | SAVED, Payload::new()).unwrap();
    handle.snapshot().await.unwrap();

    assert_eq!(phases.kinds(), vec![PHASE, TICK | SAVED]);
    assert_eq!(saves.kinds(), vec![SAVED | OTHER, TICK | SAVED]);
}

#[tokio::test(start_paused = true)]
async fn resubscribe_accumulates_mask() {
    let (handle, _join) = start();
    let rec = Arc::new(Recorder::default());
    handle.subscribe(&rec, PHASE, None).unwrap();
    handle.subscribe(&rec, SAVED, None).unwrap();

    handle.publish(PHASE, Payload::new()).unwrap();
    handle.publish(SAVED, Payload::new()).unwrap();
    let snap = handle.snapshot().await.unwrap();

    assert_eq!(rec.count(), 2);
    // One entry for the recorder, one for the retry monitor.
    assert_eq!(snap.subscriptions, 2);
}

#[tokio::test(start_paused = true)]
async fn partial_unsubscribe_clears_bits() {
    let (handle, _join) = start();
    let rec = Arc::new(Recorder::default());
    let sub = handle.subscribe(&rec, PHASE | SAVED, None).unwrap();
    handle.unsubscribe(&sub, Some(PHASE)).unwrap();

    handle.publish(PHASE, Payload::new()).unwrap();
    handle.publish(SAVED, Payload::new()).unwrap();
    handle.snapshot().await.unwrap();
    assert_eq!(rec.kinds(), vec![SAVED]);

    handle.unsubscribe(&rec, Some(SAVED)).unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.subscriptions, 1);
}

#[tokio::test(start_paused = true)]
async fn timer_fires_once_per_elapsed_interval() {
    let (handle, _join) = start();
    let rec = Arc::new(Recorder::default());
    let timer = TimerSpec::from_secs_f64(1.0, TICK).unwrap();
    handle.subscribe(&rec, TICK, Some(timer)).unwrap();
    handle.snapshot().await.unwrap();

    tokio::time::sleep(Duration::from_millis(3300)).await;
    handle.snapshot().await.unwrap();

    assert_eq!(rec.count(), 3);
    assert!(rec.kinds().iter().all(|k| *k == TICK | EventType::TIMER));
}

#[tokio::test(start_paused = true)]
async fn timer_events_are_addressed_not_broadcast() {
    let (handle, _join) = start();
    let ticking = Arc::new(Recorder::default());
    let bystander = Arc::new(Recorder::default());
    let timer = TimerSpec::new(Duration::from_secs(1), TICK);
    handle.subscribe(&ticking, TICK, Some(timer)).unwrap();
    handle.subscribe(&bystander, TICK | EventType::TIMER, None).unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    handle.snapshot().await.unwrap();

    assert_eq!(ticking.timer_count(), 2);
    assert_eq!(bystander.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unsubscribe_cancels_timer() {
    let (handle, _join) = start();
    let rec = Arc::new(Recorder::default());
    let timer = TimerSpec::new(Duration::from_secs(1), TICK);
    let sub = handle.subscribe(&rec, TICK, Some(timer)).unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.unsubscribe(sub, None).unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.timers, 1, "only the retry monitor timer remains");

    tokio::time::sleep(Duration::from_secs(5)).await;
    handle.publish(TICK, Payload::new()).unwrap();
    handle.snapshot().await.unwrap();
    assert_eq!(rec.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn replacing_timer_resets_schedule() {
    let (handle, _join) = start();
    let rec = Arc::new(Recorder::default());
    handle
        .subscribe(&rec, TICK, Some(TimerSpec::new(Duration::from_secs(10), TICK)))
        .unwrap();
    handle
        .subscribe(&rec, TICK, Some(TimerSpec::new(Duration::from_secs(1), TICK)))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(4500)).await;
    let snap = handle.snapshot().await.unwrap();

    assert_eq!(rec.timer_count(), 4);
    assert_eq!(snap.timers, 2);
}

#[tokio::test(start_paused = true)]
async fn dropped_subscriber_is_pruned_on_next_dispatch() {
    let (handle, _join) = start();
    let keep = Arc::new(Recorder::default());
    let gone = Arc::new(Recorder::default());
    handle.subscribe(&keep, PHASE, None).unwrap();
    handle.subscribe(&gone, PHASE, None).unwrap();
    assert_eq!(handle.snapshot().await.unwrap().subscriptions, 3);

    drop(gone);
    handle.publish(SAVED, Payload::new()).unwrap();
    let snap = handle.snapshot().await.unwrap();

    assert_eq!(snap.subscriptions, 2);
    handle.publish(PHASE, Payload::new()).unwrap();
    handle.snapshot().await.unwrap();
    assert_eq!(keep.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_timer_subscriber_is_pruned_by_scheduler() {
    let (handle, _join) = start();
    let rec = Arc::new(Recorder::default());
    let timer = TimerSpec::new(Duration::from_secs(1), TICK);
    handle.subscribe(&rec, TICK, Some(timer)).unwrap();
    assert_eq!(handle.snapshot().await.unwrap().timers, 2);

    drop(rec);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let snap = handle.snapshot().await.unwrap();

    assert_eq!(snap.timers, 1);
    assert_eq!(snap.subscriptions, 1);
}

#[tokio::test(start_paused = true)]
async fn oversized_interval_is_rejected_and_hub_keeps_running() {
    let (handle, join) = start();
    let rec = Arc::new(Recorder::default());

    assert!(TimerSpec::from_secs_f64(1e19, TICK).is_err());
    let huge = TimerSpec::new(Duration::MAX, TICK);
    assert!(matches!(
        handle.subscribe(&rec, TICK, Some(huge)),
        Err(HubError::InvalidArgument { .. })
    ));

    let longest = TimerSpec::new(MAX_INTERVAL, TICK);
    handle.subscribe(&rec, TICK, Some(longest)).unwrap();
    handle.publish(TICK, Payload::new()).unwrap();
    let snap = handle.snapshot().await.unwrap();

    assert_eq!(snap.timers, 2);
    assert_eq!(rec.count(), 1);
    assert!(!join.is_finished());
}

/// Re-publishes every OTHER event while switched on, so the mailbox is never empty.
struct Flood {
    handle: HubHandle,
    on: AtomicBool,
}

impl Subscribe for Flood {
    fn on_event(&self, _event: &Event) -> Result<(), HandlerError> {
        if self.on.load(Ordering::Relaxed) {
            self.handle
                .publish(OTHER, Payload::new())
                .map_err(|e| HandlerError::failed(e.to_string()))?;
        }
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn timers_fire_while_mailbox_stays_busy() {
    let (handle, _join) = start();
    let rec = Arc::new(Recorder::default());
    let flood = Arc::new(Flood {
        handle: handle.clone(),
        on: AtomicBool::new(true),
    });
    let timer = TimerSpec::new(Duration::from_secs(1), TICK);
    handle.subscribe(&rec, TICK, Some(timer)).unwrap();
    handle.subscribe(&flood, OTHER, None).unwrap();
    handle.snapshot().await.unwrap();

    handle.publish(OTHER, Payload::new()).unwrap();
    for _ in 0..5 {
        tokio::time::advance(Duration::from_secs(1)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }
    let fired = rec.timer_count();

    flood.on.store(false, Ordering::Relaxed);
    handle.snapshot().await.unwrap();
    assert!(fired >= 3, "timer fired {fired} times over 5s of constant traffic");
}

struct Flaky;

impl Subscribe for Flaky {
    fn on_event(&self, event: &Event) -> Result<(), HandlerError> {
        if event.payload.contains_key("panic") {
            panic!("flaky subscriber panicked");
        }
        Err(HandlerError::failed("always failing"))
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[tokio::test(start_paused = true)]
async fn handler_failure_does_not_stop_delivery() {
    let (handle, _join) = start();
    let flaky = Arc::new(Flaky);
    let rec = Arc::new(Recorder::default());
    handle.subscribe(&flaky, PHASE, None).unwrap();
    handle.subscribe(&rec, PHASE, None).unwrap();

    handle.publish(PHASE, Payload::new()).unwrap();
    handle
        .publish_event(Event::new(PHASE).with_field("panic", json!(true)))
        .unwrap();
    handle.snapshot().await.unwrap();

    assert_eq!(rec.count(), 2);
    assert!(!handle.is_closed());
}

/// Answers every PHASE event with a SAVED event through its own handle.
struct Relay {
    handle: HubHandle,
}

impl Subscribe for Relay {
    fn on_event(&self, event: &Event) -> Result<(), HandlerError> {
        let mut payload = Payload::new();
        payload.insert("from_seq".into(), json!(event.seq));
        self.handle
            .publish(SAVED, payload)
            .map_err(|e| HandlerError::failed(e.to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn handlers_may_publish_reentrantly() {
    let (handle, _join) = start();
    let relay = Arc::new(Relay {
        handle: handle.clone(),
    });
    let rec = Arc::new(Recorder::default());
    handle.subscribe(&relay, PHASE, None).unwrap();
    handle.subscribe(&rec, PHASE | SAVED, None).unwrap();

    handle.publish(PHASE, Payload::new()).unwrap();
    handle.snapshot().await.unwrap();
    // The relayed event is queued behind the PHASE dispatch.
    assert_eq!(rec.kinds(), vec![PHASE]);

    handle.snapshot().await.unwrap();
    assert_eq!(rec.kinds(), vec![PHASE, SAVED]);
}

#[tokio::test(start_paused = true)]
async fn invalid_arguments_are_rejected() {
    let (handle, _join) = start();
    let rec = Arc::new(Recorder::default());

    let err = handle.subscribe(&rec, EventType::EMPTY, None).unwrap_err();
    assert_eq!(err.as_label(), "hub_invalid_argument");

    let zero = TimerSpec::new(Duration::ZERO, TICK);
    assert!(matches!(
        handle.subscribe(&rec, TICK, Some(zero)),
        Err(HubError::InvalidArgument { .. })
    ));
    assert!(TimerSpec::from_secs_f64(-2.0, TICK).is_err());
    assert!(handle.publish(EventType::EMPTY, Payload::new()).is_err());
    assert!(handle.unsubscribe(&rec, Some(EventType::EMPTY)).is_err());

    assert_eq!(handle.snapshot().await.unwrap().subscriptions, 1);
}

#[tokio::test(start_paused = true)]
async fn operations_fail_after_shutdown() {
    let (handle, join) = start();
    handle.shutdown();
    join.await.unwrap();

    assert!(handle.is_closed());
    assert_eq!(
        handle.publish(PHASE, Payload::new()),
        Err(HubError::Closed)
    );
    assert_eq!(handle.snapshot().await, Err(HubError::Closed));
}

#[tokio::test(start_paused = true)]
async fn loop_stops_when_all_handles_drop() {
    init_tracing();
    let (hub, handle) = Hub::new(HubConfig::default());
    let join = hub.spawn();
    drop(handle);

    tokio::time::timeout(Duration::from_secs(1), join)
        .await
        .expect("hub loop should stop")
        .unwrap();
}
