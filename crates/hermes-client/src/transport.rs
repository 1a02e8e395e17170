//! MQTT transport layer.
//!
//! The client loop never talks to rumqttc directly: it consumes a stream
//! of [`TransportEvent`]s from an mpsc channel (the only producer/consumer
//! boundary between the network task and dispatch) and issues commands
//! through the [`Transport`] trait. Tests substitute an in-memory
//! transport behind the same seam.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use url::Url;

/// Configuration for the MQTT transport.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker URL, e.g. `tcp://localhost:1883`.
    pub broker: String,
    /// Client id presented to the broker.
    pub client_id: String,
    /// Optional username.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Keep-alive interval.
    pub keep_alive: Duration,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: "tcp://localhost:1883".to_string(),
            client_id: "hermes-client".to_string(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(30),
        }
    }
}

/// Events surfaced by a transport to the client loop.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Connection acknowledged by the broker. Sent again after every
    /// reconnect, so the client can replay its subscriptions.
    Connected,
    /// Connection lost. The transport keeps reconnecting on its own.
    Disconnected,
    /// An application message arrived.
    Message {
        /// Concrete topic the message was published on.
        topic: String,
        /// Raw payload bytes.
        payload: Vec<u8>,
    },
}

/// Commands a client can issue to its transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Subscribe to a topic (which may contain MQTT wildcards).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request could not be queued.
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError>;

    /// Publish a payload to a concrete topic.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request could not be queued.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// MQTT transport backed by rumqttc.
pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    /// Connect to the broker and start the event pump.
    ///
    /// Returns the transport plus the event stream to hand to the client
    /// loop. The pump task keeps polling (and thereby reconnecting) until
    /// the receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the broker URL cannot be parsed.
    pub fn connect(
        config: &MqttConfig,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        let (host, port) = parse_mqtt_url(&config.broker)?;

        let mut options = MqttOptions::new(&config.client_id, host, port);
        options.set_keep_alive(config.keep_alive);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username.clone(), password.clone());
        }

        let (client, eventloop) = AsyncClient::new(options, 100);
        let (events_tx, events_rx) = mpsc::channel(256);

        tokio::spawn(pump(eventloop, events_tx));

        Ok((Self { client }, events_rx))
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::Subscribe(e.to_string()))
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))
    }
}

/// Forward rumqttc events into the client's event channel.
async fn pump(mut eventloop: EventLoop, events: mpsc::Sender<TransportEvent>) {
    loop {
        let event = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("Connected to MQTT broker");
                Some(TransportEvent::Connected)
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => Some(TransportEvent::Message {
                topic: publish.topic.clone(),
                payload: publish.payload.to_vec(),
            }),
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::warn!("Broker closed the connection");
                Some(TransportEvent::Disconnected)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::error!(error = %e, "MQTT error");
                // rumqttc reconnects on the next poll
                tokio::time::sleep(Duration::from_secs(5)).await;
                Some(TransportEvent::Disconnected)
            }
        };

        if let Some(event) = event {
            if events.send(event).await.is_err() {
                tracing::debug!("Event receiver dropped, stopping transport pump");
                break;
            }
        }
    }
}

/// Parse an MQTT broker URL into host and port.
fn parse_mqtt_url(input: &str) -> Result<(String, u16), TransportError> {
    if input.contains("://") {
        let url = Url::parse(input)
            .map_err(|e| TransportError::InvalidBrokerUrl(format!("{input}: {e}")))?;

        match url.scheme() {
            "tcp" | "mqtt" => {}
            scheme => {
                return Err(TransportError::InvalidBrokerUrl(format!(
                    "{input}: unsupported scheme '{scheme}'"
                )));
            }
        }

        let host = url
            .host_str()
            .ok_or_else(|| TransportError::InvalidBrokerUrl(format!("{input}: missing host")))?;
        let port = url.port().unwrap_or(1883);

        return Ok((host.to_string(), port));
    }

    let mut parts = input.split(':');
    let host = parts
        .next()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| TransportError::InvalidBrokerUrl(format!("{input}: missing host")))?;
    let port = match parts.next() {
        None => 1883,
        Some(port) => port.parse().map_err(|_| {
            TransportError::InvalidBrokerUrl(format!("{input}: invalid port '{port}'"))
        })?,
    };
    if parts.next().is_some() {
        return Err(TransportError::InvalidBrokerUrl(format!(
            "{input}: too many ':' separators"
        )));
    }

    Ok((host.to_string(), port))
}

/// Errors for transport operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Invalid MQTT broker URL
    #[error("invalid MQTT broker URL: {0}")]
    InvalidBrokerUrl(String),
    /// Subscription failed
    #[error("subscription error: {0}")]
    Subscribe(String),
    /// Publish failed
    #[error("publish error: {0}")]
    Publish(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mqtt_url_tcp() {
        let (host, port) = parse_mqtt_url("tcp://localhost:1883").unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_default_port() {
        let (host, port) = parse_mqtt_url("tcp://broker.example.com").unwrap();
        assert_eq!(host, "broker.example.com");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_no_scheme() {
        let (host, port) = parse_mqtt_url("localhost:1883").unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_rejects_other_schemes() {
        assert!(parse_mqtt_url("ws://localhost:9001").is_err());
        assert!(parse_mqtt_url("localhost:1883:extra").is_err());
    }
}
