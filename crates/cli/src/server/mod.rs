//! HTTP / WebSocket surface of the relay.

mod routes;
mod state;
mod ws;

pub use routes::router;
pub use state::{AppState, RelayContext, StreamingStatus};

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve the relay until `shutdown` is cancelled
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .context("Listener has no local address")?;
    info!(%addr, "Relay server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("Relay server failed")?;

    info!("Relay server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcaster::Broadcaster;
    use chrono::Utc;
    use contracts::{Reading, ReadingSource, SinkKind};
    use futures_util::StreamExt;
    use history::HistoryBuffer;
    use ingestion::{
        work_queue, CoordinatorReport, DeviceSimulator, IngestHandle, IngestionCoordinator,
        IngestionMetrics,
    };
    use recorders::{MockBehavior, MockSink, SinkAdapter};
    use serde_json::Value;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    struct TestRelay {
        addr: SocketAddr,
        state: AppState,
        coordinator: JoinHandle<CoordinatorReport>,
        shutdown: CancellationToken,
    }

    async fn start_relay(capacity: usize, preload: &[f64]) -> TestRelay {
        let history = Arc::new(HistoryBuffer::new(capacity));
        for t in preload {
            history.append(Reading::new("IOT-server", *t, 50.0, Utc::now()));
        }
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&history), 16));
        let metrics = Arc::new(IngestionMetrics::new());

        let streaming = SinkAdapter::new(
            MockSink::streaming(MockBehavior::Succeed),
            Duration::from_millis(200),
        );
        let coordinator: IngestionCoordinator<MockSink, MockSink> = IngestionCoordinator::new(
            Arc::clone(&history),
            Arc::clone(&broadcaster),
            Arc::clone(&metrics),
        )
        .with_streaming(Some(streaming));
        let streaming_metrics = coordinator.sink_metrics(SinkKind::Streaming);

        let (tx, rx) = work_queue(8);
        let coordinator = coordinator.spawn(rx);

        let source: Arc<dyn ReadingSource> =
            Arc::new(DeviceSimulator::new("IOT-server", [20.0, 30.0], [40.0, 60.0]));
        let ingest = IngestHandle::new(tx, source, metrics);

        let state = Arc::new(
            RelayContext::new(history, broadcaster, ingest).with_streaming(
                streaming_metrics.map(|m| StreamingStatus::new("neuron-test", m)),
            ),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        tokio::spawn(serve(listener, Arc::clone(&state), shutdown.clone()));

        TestRelay {
            addr,
            state,
            coordinator,
            shutdown,
        }
    }

    type Observer = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    async fn next_json(stream: &mut Observer) -> Value {
        let msg = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        serde_json::from_str(msg.to_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_services() {
        let relay = start_relay(5, &[21.0]).await;

        let body: Value = reqwest::get(format!("http://{}/health", relay.addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(body["services"]["hedera"], "not configured");
        assert_eq!(body["services"]["neuron"]["connected"], true);
        assert_eq!(body["services"]["neuron"]["deviceId"], "neuron-test");
        assert_eq!(body["services"]["iot"]["deviceId"], "IOT-server");
        assert_eq!(body["history"], 1);
        assert_eq!(body["observers"], 0);

        relay.shutdown.cancel();
    }

    #[tokio::test]
    async fn test_recent_returns_history_window() {
        let relay = start_relay(3, &[21.0, 22.0, 23.0, 24.0]).await;

        let body: Value = reqwest::get(format!("http://{}/api/recent", relay.addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["count"], 3);
        let temps: Vec<f64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["temperature"].as_f64().unwrap())
            .collect();
        assert_eq!(temps, vec![22.0, 23.0, 24.0]);

        relay.shutdown.cancel();
    }

    #[tokio::test]
    async fn test_observer_gets_history_then_triggered_event() {
        let relay = start_relay(5, &[21.0, 22.0]).await;

        let (mut ws, _) = connect_async(format!("ws://{}/ws", relay.addr))
            .await
            .unwrap();

        let history = next_json(&mut ws).await;
        assert_eq!(history["type"], "history");
        assert_eq!(history["data"].as_array().unwrap().len(), 2);

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/trigger", relay.addr))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        let triggered: Value = response.json().await.unwrap();
        assert!(triggered["hedera"].is_null());
        assert_eq!(triggered["neuron"]["success"], true);

        let event = next_json(&mut ws).await;
        assert_eq!(event["sensor"], triggered["sensor"]);
        assert_eq!(event["neuron"]["deviceId"], triggered["neuron"]["deviceId"]);

        relay.shutdown.cancel();
    }

    #[tokio::test]
    async fn test_trigger_after_shutdown_is_an_error() {
        let relay = start_relay(5, &[]).await;
        relay.state.ingest.close();
        relay.coordinator.await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/trigger", relay.addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("closed"));

        relay.shutdown.cancel();
    }

    #[tokio::test]
    async fn test_close_all_sends_close_frame() {
        let relay = start_relay(5, &[]).await;

        let (mut ws, _) = connect_async(format!("ws://{}/", relay.addr)).await.unwrap();
        next_json(&mut ws).await;

        relay.state.broadcaster.close_all();

        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for close");
        match msg {
            Some(Ok(m)) => assert!(m.is_close(), "expected close frame, got {m:?}"),
            Some(Err(_)) | None => {}
        }

        relay.shutdown.cancel();
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogCapture {
        fn count(&self, needle: &str) -> usize {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .matches(needle)
                .count()
        }
    }

    #[tokio::test]
    async fn test_observer_lifecycle_logged_once() {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let relay = start_relay(5, &[20.0]).await;
        let (mut ws, _) = connect_async(format!("ws://{}/ws", relay.addr)).await.unwrap();
        next_json(&mut ws).await;
        ws.close(None).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while relay.state.broadcaster.observer_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("observer never left");

        assert_eq!(capture.count("Observer connected"), 1);
        assert_eq!(capture.count("Observer disconnected"), 1);

        relay.shutdown.cancel();
    }
}
