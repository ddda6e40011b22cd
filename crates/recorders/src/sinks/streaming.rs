//! StreamingSink - per-reading frames to a streaming endpoint over UDP

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use chrono::{DateTime, Utc};
use contracts::{timestamp::iso_millis, ContractError, Reading, Receipt, RecordingSink, SinkKind};
use serde::Serialize;
use tokio::net::UdpSocket;
use tracing::{debug, info, instrument};

/// Where frames go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Datagram per reading to a fixed target
    Udp(SocketAddr),
    /// No endpoint; frames are logged and acknowledged locally
    Simulated,
}

/// Configuration for StreamingSink
#[derive(Debug, Clone)]
pub struct StreamingSinkConfig {
    /// Device id announced in every frame
    pub device_id: String,
    /// UDP target; `None` selects simulated mode
    pub target: Option<SocketAddr>,
}

#[derive(Serialize)]
struct StreamFrame<'a> {
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    data: &'a Reading,
    #[serde(serialize_with = "iso_millis::serialize")]
    timestamp: DateTime<Utc>,
}

/// Recorder that publishes each reading as one JSON datagram
pub struct StreamingSink {
    name: String,
    device_id: String,
    mode: StreamMode,
    socket: Option<UdpSocket>,
    connected: bool,
}

impl StreamingSink {
    /// Connect a new StreamingSink
    #[instrument(name = "streaming_sink_connect", skip(name, config))]
    pub async fn connect(
        name: impl Into<String>,
        config: StreamingSinkConfig,
    ) -> Result<Self, ContractError> {
        let name = name.into();

        let (mode, socket) = match config.target {
            Some(addr) => {
                let socket = UdpSocket::bind(local_bind_addr(addr))
                    .await
                    .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;
                socket
                    .connect(addr)
                    .await
                    .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;
                (StreamMode::Udp(addr), Some(socket))
            }
            None => (StreamMode::Simulated, None),
        };

        info!(sink = %name, device_id = %config.device_id, mode = ?mode, "StreamingSink connected");

        Ok(Self {
            name,
            device_id: config.device_id,
            mode,
            socket,
            connected: true,
        })
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn encode(&self, reading: &Reading) -> Result<Vec<u8>, ContractError> {
        let frame = StreamFrame {
            device_id: &self.device_id,
            data: reading,
            timestamp: Utc::now(),
        };
        serde_json::to_vec(&frame)
            .map_err(|e| ContractError::sink_write(&self.name, format!("json error: {e}")))
    }
}

impl RecordingSink for StreamingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Streaming
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    #[instrument(name = "streaming_sink_record", skip(self, reading), fields(sink = %self.name))]
    async fn record(&mut self, reading: &Reading) -> Result<Receipt, ContractError> {
        if !self.connected {
            return Err(ContractError::sink_unavailable(&self.name, "Not connected"));
        }

        let data = self.encode(reading)?;
        match (&self.mode, &self.socket) {
            (StreamMode::Udp(_), Some(socket)) => {
                let sent = socket
                    .send(&data)
                    .await
                    .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
                debug!(sink = %self.name, bytes = sent, "Sent");
            }
            (StreamMode::Udp(_), None) => {
                return Err(ContractError::sink_write(&self.name, "socket not connected"));
            }
            (StreamMode::Simulated, _) => {
                debug!(sink = %self.name, bytes = data.len(), "Simulated publish");
            }
        }

        Ok(Receipt::new(self.device_id.clone()))
    }

    #[instrument(name = "streaming_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        self.connected = false;
        debug!(sink = %self.name, "StreamingSink closed");
        Ok(())
    }
}

/// Ephemeral wildcard address of the same family as `target`
fn local_bind_addr(target: SocketAddr) -> SocketAddr {
    let ip = if target.is_ipv6() {
        IpAddr::V6(Ipv6Addr::UNSPECIFIED)
    } else {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    };
    SocketAddr::new(ip, 0)
}
