//! # Hermes Client
//!
//! MQTT client harness for the Hermes voice-assistant protocol.
//!
//! ## Architecture
//!
//! Three pieces cooperate around one mpsc channel:
//!
//! 1. **Transport** ([`transport`]): a rumqttc pump task turns broker
//!    traffic into [`TransportEvent`]s; the trait seam lets tests feed the
//!    same channel from memory.
//! 2. **Router** ([`dispatch`]): matches an inbound `(topic, payload)`
//!    against the subscribed kinds in registration order and resolves the
//!    site/session ids.
//! 3. **Client loop** ([`client`]): single consumer of events and
//!    commands; owns the subscription registry and site filter, replays
//!    subscriptions on reconnect, and delivers messages to the
//!    application's [`MessageHandler`] in blocking or concurrent mode.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod dispatch;
pub mod transport;

pub use client::{
    ClientConfig, ClientError, DispatchMode, HermesClient, HermesHandle, MessageHandler, Outbound,
};
pub use dispatch::Inbound;
pub use transport::{MqttConfig, MqttTransport, Transport, TransportError, TransportEvent};
