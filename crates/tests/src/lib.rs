//! # Integration Tests
//!
//! Cross-crate end-to-end tests.
//!
//! Covers:
//! - Observer wire format
//! - Reading -> recorders -> broadcaster flows with scripted recorders
//! - History backfill for late observers
//! - Shutdown draining

#[cfg(test)]
mod contract_tests {
    use chrono::{TimeZone, Utc};
    use contracts::{CompositeEvent, HistoryMessage, Reading, Receipt, SinkKind, SinkOutcome};
    use serde_json::json;

    fn reading() -> Reading {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        Reading::new("IOT-abc123xyz", 24.5, 51.25, ts)
    }

    #[test]
    fn test_reading_wire_format() {
        let value = serde_json::to_value(reading()).unwrap();
        assert_eq!(
            value,
            json!({
                "deviceId": "IOT-abc123xyz",
                "temperature": 24.5,
                "humidity": 51.25,
                "timestamp": "2024-05-01T12:30:00.000Z",
                "unit_temp": "°C",
                "unit_humidity": "%"
            })
        );
    }

    #[test]
    fn test_event_with_absent_streaming_recorder() {
        let ledger = SinkOutcome::succeeded(
            SinkKind::Ledger,
            Receipt::new("0.0.1@1714566600.000000001").with_status("SUCCESS"),
        );
        let event = CompositeEvent::new(reading(), Some(ledger), None);

        let value = serde_json::to_value(&event).unwrap();
        assert!(value["neuron"].is_null());
        assert_eq!(value["hedera"]["success"], true);
        assert_eq!(value["hedera"]["transactionId"], "0.0.1@1714566600.000000001");
        assert_eq!(value["hedera"]["status"], "SUCCESS");
        assert_eq!(value["sensor"]["deviceId"], "IOT-abc123xyz");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_failed_outcome_wire_format() {
        let outcome =
            SinkOutcome::failed(SinkKind::Streaming, "sink 'streaming' timed out after 2000ms");
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("timed out"));
        assert!(value.get("deviceId").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_history_message_wire_format() {
        let value = serde_json::to_value(HistoryMessage::new(vec![reading()])).unwrap();
        assert_eq!(value["type"], "history");
        assert_eq!(value["data"][0]["temperature"], 24.5);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use broadcaster::{Broadcaster, Subscription};
    use chrono::Utc;
    use contracts::{DropPolicy, Reading, ReadingSource};
    use history::HistoryBuffer;
    use ingestion::{
        enqueue_reading, work_queue, CoordinatorReport, DeviceSimulator, IngestCommand,
        IngestHandle, IngestionCoordinator, IngestionMetrics,
    };
    use recorders::{MockBehavior, MockSink, SinkAdapter};
    use serde_json::Value;
    use tokio::task::JoinHandle;

    type MockCoordinator = IngestionCoordinator<MockSink, MockSink>;

    const DEVICE_ID: &str = "IOT-e2e";

    fn reading(temperature: f64) -> Reading {
        Reading::new(DEVICE_ID, temperature, 50.0, Utc::now())
    }

    fn adapter(
        behavior: MockBehavior,
        sink: fn(MockBehavior) -> MockSink,
        timeout_ms: u64,
    ) -> Option<SinkAdapter<MockSink>> {
        Some(SinkAdapter::new(sink(behavior), Duration::from_millis(timeout_ms)))
    }

    struct Relay {
        history: Arc<HistoryBuffer>,
        broadcaster: Arc<Broadcaster>,
        metrics: Arc<IngestionMetrics>,
    }

    impl Relay {
        fn new(history_capacity: usize, observer_queue: usize) -> Self {
            let history = Arc::new(HistoryBuffer::new(history_capacity));
            let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&history), observer_queue));
            Self {
                history,
                broadcaster,
                metrics: Arc::new(IngestionMetrics::new()),
            }
        }

        fn coordinator(
            &self,
            ledger: Option<SinkAdapter<MockSink>>,
            streaming: Option<SinkAdapter<MockSink>>,
        ) -> MockCoordinator {
            IngestionCoordinator::new(
                Arc::clone(&self.history),
                Arc::clone(&self.broadcaster),
                Arc::clone(&self.metrics),
            )
            .with_ledger(ledger)
            .with_streaming(streaming)
        }

        /// Spawn the coordinator behind a work queue and return a trigger handle
        fn start(
            &self,
            coordinator: MockCoordinator,
        ) -> (IngestHandle, JoinHandle<CoordinatorReport>) {
            let (tx, rx) = work_queue(16);
            let source: Arc<dyn ReadingSource> =
                Arc::new(DeviceSimulator::new(DEVICE_ID, [20.0, 30.0], [40.0, 60.0]));
            let handle = IngestHandle::new(tx, source, Arc::clone(&self.metrics));
            (handle, coordinator.spawn(rx))
        }
    }

    async fn next_frame(sub: &mut Subscription) -> Value {
        let frame = tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("subscription closed");
        serde_json::from_str(&frame).unwrap()
    }

    fn temperatures(history_frame: &Value) -> Vec<f64> {
        history_frame["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["temperature"].as_f64().unwrap())
            .collect()
    }

    /// One recorder always fails: every event still reaches observers,
    /// with the failure inside it and the sibling outcome untouched
    #[tokio::test]
    async fn test_e2e_failing_recorder_is_contained() {
        let relay = Relay::new(10, 16);
        let coordinator = relay.coordinator(
            adapter(MockBehavior::Fail("gateway rejected".into()), MockSink::ledger, 200),
            adapter(MockBehavior::Succeed, MockSink::streaming, 200),
        );
        let mut sub = relay.broadcaster.connect().unwrap();
        assert_eq!(next_frame(&mut sub).await["type"], "history");

        let (handle, coordinator) = relay.start(coordinator);
        for _ in 0..3 {
            let event = handle.trigger().await.unwrap();
            let ledger = event.ledger.unwrap();
            assert!(!ledger.success);
            assert!(ledger.error.unwrap().contains("gateway rejected"));
            assert!(event.streaming.unwrap().success);

            let frame = next_frame(&mut sub).await;
            assert_eq!(frame["hedera"]["success"], false);
            assert_eq!(frame["neuron"]["success"], true);
        }

        handle.close();
        let report = coordinator.await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.summary.ledger.failure, 3);
        assert_eq!(report.summary.streaming.success, 3);
    }

    /// A recorder that never answers costs at most its time budget
    #[tokio::test]
    async fn test_e2e_hanging_recorder_times_out() {
        let relay = Relay::new(10, 16);
        let mut coordinator = relay.coordinator(
            adapter(MockBehavior::Hang, MockSink::ledger, 200),
            adapter(MockBehavior::Succeed, MockSink::streaming, 200),
        );

        let started = Instant::now();
        let event = coordinator.process(reading(22.0)).await;
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_millis(600), "took {elapsed:?}");
        let ledger = event.ledger.unwrap();
        assert!(!ledger.success);
        assert!(ledger.error.unwrap().contains("timed out"));
        assert!(event.streaming.unwrap().success);
        assert_eq!(relay.history.len(), 1);
    }

    /// Late observer with fewer readings than the window gets all of them
    #[tokio::test]
    async fn test_e2e_late_observer_partial_window() {
        let relay = Relay::new(5, 16);
        let mut coordinator = relay.coordinator(None, None);
        for t in [21.0, 22.0, 23.0] {
            coordinator.process(reading(t)).await;
        }

        let mut sub = relay.broadcaster.connect().unwrap();
        let history = next_frame(&mut sub).await;
        assert_eq!(history["type"], "history");
        assert_eq!(temperatures(&history), vec![21.0, 22.0, 23.0]);
    }

    /// Late observer after the window overflowed gets the newest readings,
    /// oldest first, then live events
    #[tokio::test]
    async fn test_e2e_late_observer_full_window() {
        let relay = Relay::new(3, 16);
        let mut coordinator = relay.coordinator(None, None);
        for t in [21.0, 22.0, 23.0, 24.0] {
            coordinator.process(reading(t)).await;
        }

        let mut sub = relay.broadcaster.connect().unwrap();
        let history = next_frame(&mut sub).await;
        assert_eq!(temperatures(&history), vec![22.0, 23.0, 24.0]);

        coordinator.process(reading(25.0)).await;
        let event = next_frame(&mut sub).await;
        assert_eq!(event["sensor"]["temperature"], 25.0);
        assert!(event["hedera"].is_null());
        assert!(event["neuron"].is_null());
    }

    /// Observers joining while readings flow: each gets its backfill first,
    /// then live events that pick up where the backfill stopped, in order
    /// and without gaps. The reading in flight during a connect may show up
    /// in both, never in neither.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_connects_during_broadcast() {
        const READINGS: u32 = 300;
        const OBSERVERS: u64 = 48;

        let relay = Relay::new(8, READINGS as usize + 8);
        let coordinator = relay.coordinator(
            None,
            adapter(
                MockBehavior::Delay(Duration::from_millis(1)),
                MockSink::streaming,
                200,
            ),
        );
        let (tx, rx) = work_queue(16);
        let coordinator = coordinator.spawn(rx);

        let producer = tokio::spawn(async move {
            for i in 1..=READINGS {
                tx.send(IngestCommand::Reading(reading(f64::from(i))))
                    .await
                    .unwrap();
            }
        });

        let joiners: Vec<_> = (0..OBSERVERS)
            .map(|i| {
                let broadcaster = Arc::clone(&relay.broadcaster);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(i * 6)).await;
                    broadcaster.connect().unwrap()
                })
            })
            .collect();

        let mut subs = Vec::new();
        for joiner in joiners {
            subs.push(joiner.await.unwrap());
        }
        producer.await.unwrap();
        let report = coordinator.await.unwrap();
        assert_eq!(report.processed, u64::from(READINGS));

        let last = f64::from(READINGS);
        for mut sub in subs {
            let history: Value = serde_json::from_str(&sub.try_recv().unwrap()).unwrap();
            assert_eq!(history["type"], "history");
            let backfill = temperatures(&history);
            assert!(backfill.windows(2).all(|w| w[1] == w[0] + 1.0), "{backfill:?}");

            let mut live = Vec::new();
            while let Some(frame) = sub.try_recv() {
                let event: Value = serde_json::from_str(&frame).unwrap();
                live.push(event["sensor"]["temperature"].as_f64().unwrap());
            }
            assert!(live.windows(2).all(|w| w[1] == w[0] + 1.0), "{live:?}");

            let resume = backfill.last().copied().unwrap_or(0.0);
            match live.first() {
                Some(&first) => {
                    assert!(first == resume || first == resume + 1.0, "{resume} -> {first}");
                    assert_eq!(live.last().copied(), Some(last));
                }
                None => assert_eq!(resume, last),
            }
        }
    }

    /// Every observer sees events in ingestion order
    #[tokio::test]
    async fn test_e2e_per_observer_ordering() {
        let relay = Relay::new(50, 32);
        let coordinator = relay.coordinator(
            None,
            adapter(MockBehavior::Delay(Duration::from_millis(2)), MockSink::streaming, 200),
        );
        let mut first = relay.broadcaster.connect().unwrap();
        let mut second = relay.broadcaster.connect().unwrap();

        let (tx, rx) = work_queue(32);
        let coordinator = coordinator.spawn(rx);
        let metrics = IngestionMetrics::new();
        for i in 0..20 {
            enqueue_reading(&tx, reading(i as f64), DropPolicy::Block, &metrics)
                .await
                .unwrap();
        }
        tx.close();
        coordinator.await.unwrap();

        for sub in [&mut first, &mut second] {
            assert_eq!(next_frame(sub).await["type"], "history");
            for i in 0..20 {
                assert_eq!(next_frame(sub).await["sensor"]["temperature"], i as f64);
            }
        }
    }

    /// A departed observer and a stalled observer do not affect a healthy one
    #[tokio::test]
    async fn test_e2e_observer_failures_are_isolated() {
        let relay = Relay::new(10, 2);
        let mut coordinator = relay.coordinator(None, None);

        let departed = relay.broadcaster.connect().unwrap();
        let _stalled = relay.broadcaster.connect().unwrap();
        let mut healthy = relay.broadcaster.connect().unwrap();
        drop(departed);

        assert_eq!(next_frame(&mut healthy).await["type"], "history");
        for t in [1.0, 2.0, 3.0, 4.0] {
            coordinator.process(reading(t)).await;
            assert_eq!(next_frame(&mut healthy).await["sensor"]["temperature"], t);
        }

        assert_eq!(relay.broadcaster.observer_count(), 2);
        let snapshot = relay.broadcaster.metrics().snapshot();
        assert_eq!(snapshot.observers_removed, 1);
        assert!(snapshot.frames_dropped >= 1);
    }

    /// Manual trigger without observers still records and returns the event
    #[tokio::test]
    async fn test_e2e_trigger_without_observers() {
        let relay = Relay::new(10, 16);
        let coordinator = relay.coordinator(
            adapter(MockBehavior::Succeed, MockSink::ledger, 200),
            None,
        );
        let (handle, coordinator) = relay.start(coordinator);

        let event = handle.trigger().await.unwrap();
        assert_eq!(event.sensor.device_id, DEVICE_ID);
        assert_eq!(event.ledger.unwrap().correlation_id.as_deref(), Some("mock_ledger-1"));
        assert!(event.streaming.is_none());
        assert_eq!(relay.history.len(), 1);
        assert_eq!(relay.broadcaster.observer_count(), 0);

        handle.close();
        coordinator.await.unwrap();
        assert!(handle.trigger().await.is_err());
    }

    /// Shutdown drains queued readings before observers are closed
    #[tokio::test]
    async fn test_e2e_shutdown_drains_then_closes_observers() {
        let relay = Relay::new(10, 16);
        let coordinator = relay.coordinator(
            adapter(MockBehavior::Delay(Duration::from_millis(10)), MockSink::ledger, 200),
            None,
        );
        let mut sub = relay.broadcaster.connect().unwrap();

        let (tx, rx) = work_queue(8);
        for t in [1.0, 2.0, 3.0] {
            tx.send(IngestCommand::Reading(reading(t))).await.unwrap();
        }
        let coordinator = coordinator.spawn(rx);
        tx.close();
        let report = coordinator.await.unwrap();
        relay.broadcaster.close_all();

        assert_eq!(report.processed, 3);
        assert!(!report.ledger.unwrap().connected);

        assert_eq!(next_frame(&mut sub).await["type"], "history");
        for t in [1.0, 2.0, 3.0] {
            assert_eq!(next_frame(&mut sub).await["sensor"]["temperature"], t);
        }
        assert!(sub.recv().await.is_none());
    }
}

#[cfg(test)]
mod recorder_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use broadcaster::Broadcaster;
    use chrono::Utc;
    use contracts::Reading;
    use history::HistoryBuffer;
    use ingestion::{IngestionCoordinator, IngestionMetrics};
    use recorders::{create_streaming_adapter, MockSink};
    use serde_json::Value;
    use tokio::net::UdpSocket;

    /// Config file -> real streaming recorder -> UDP datagram and event
    #[tokio::test]
    async fn test_streaming_recorder_from_config() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();

        let blueprint = config_loader::ConfigLoader::load_from_str(
            &format!(
                r#"
                [device]
                device_id = "IOT-udp"

                [streaming]
                device_id = "neuron-udp"
                addr = "{target}"
                timeout_ms = 500
                "#
            ),
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let streaming = create_streaming_adapter(&blueprint.streaming, "IOT-udp")
            .await
            .unwrap();
        assert!(streaming.is_some());

        let history = Arc::new(HistoryBuffer::new(blueprint.history.capacity));
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&history), 4));
        let mut coordinator: IngestionCoordinator<MockSink, _> = IngestionCoordinator::new(
            history,
            broadcaster,
            Arc::new(IngestionMetrics::new()),
        )
        .with_streaming(streaming);

        let event = coordinator
            .process(Reading::new("IOT-udp", 23.4, 48.0, Utc::now()))
            .await;
        let outcome = event.streaming.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.correlation_id.as_deref(), Some("neuron-udp"));

        let mut buf = [0u8; 2048];
        let (n, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let datagram: Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(datagram["deviceId"], "neuron-udp");
        assert_eq!(datagram["data"]["temperature"], 23.4);
    }
    /// An IPv6 target that passes validation must also start
    #[tokio::test]
    async fn test_streaming_recorder_ipv6_target() {
        if std::net::UdpSocket::bind("[::1]:0").is_err() {
            return;
        }

        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
            [streaming]
            addr = "[::1]:9999"
            "#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let streaming = create_streaming_adapter(&blueprint.streaming, "IOT-v6")
            .await
            .unwrap();
        assert!(streaming.is_some_and(|adapter| adapter.is_connected()));
    }
}
