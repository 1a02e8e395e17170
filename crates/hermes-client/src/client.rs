//! Hermes client session and delivery loop.
//!
//! A single loop task owns the subscription registry and the site-id
//! filter. Inbound transport events and application commands (subscribe,
//! publish, stop) are both drained here, so no other task ever mutates
//! client state; handlers reach the loop through a cloneable
//! [`HermesHandle`].

use std::sync::Arc;

use async_trait::async_trait;
use hermes_proto::{Message, MessageKind, TopicArgs, TopicError};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::dispatch::{self, Inbound};
use crate::transport::{Transport, TransportEvent};

/// How handler invocations for a subscription are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// The handler (and the publishing of everything it returns) completes
    /// before the next inbound message is processed. For kinds that need
    /// strict ordering, e.g. training requests.
    Blocking,
    /// The handler runs on its own task; the loop moves on immediately and
    /// does not await completion.
    #[default]
    Concurrent,
}

/// An outgoing message plus the topic parameters its template needs.
#[derive(Debug, Clone)]
pub struct Outbound {
    /// Message to publish.
    pub message: Message,
    /// Values for the topic template's placeholders.
    pub args: TopicArgs,
}

impl Outbound {
    /// Wrap a message whose topic needs no parameters.
    #[must_use]
    pub fn new(message: impl Into<Message>) -> Self {
        Self {
            message: message.into(),
            args: TopicArgs::new(),
        }
    }

    /// Wrap a message with explicit topic parameters.
    #[must_use]
    pub fn with_args(message: impl Into<Message>, args: TopicArgs) -> Self {
        Self {
            message: message.into(),
            args,
        }
    }

    /// Render the concrete publish topic.
    ///
    /// # Errors
    ///
    /// Returns [`TopicError::InvalidParameters`] if the template needs a
    /// placeholder that `args` does not supply.
    pub fn topic(&self) -> Result<String, TopicError> {
        self.message.kind().publish_topic(&self.args)
    }
}

/// Application handler invoked for each dispatched message.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Handle one inbound message. Returned messages are published in
    /// order before the invocation counts as complete.
    async fn on_message(&self, inbound: Inbound) -> Vec<Outbound>;

    /// Observe every raw MQTT message before typed dispatch, including
    /// ones no subscribed kind matches.
    async fn on_raw_message(&self, _topic: &str, _payload: &[u8]) {}
}

enum Command {
    Subscribe {
        kinds: Vec<MessageKind>,
        mode: DispatchMode,
    },
    Publish(Outbound),
    Stop,
}

/// Cloneable handle for talking to a running [`HermesClient`].
#[derive(Clone)]
pub struct HermesHandle {
    commands: mpsc::Sender<Command>,
}

impl HermesHandle {
    /// Subscribe to message kinds. Takes effect immediately when
    /// connected; otherwise the topics are queued and flushed on the next
    /// connect.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Stopped`] if the client loop has exited.
    pub async fn subscribe(
        &self,
        kinds: &[MessageKind],
        mode: DispatchMode,
    ) -> Result<(), ClientError> {
        self.commands
            .send(Command::Subscribe {
                kinds: kinds.to_vec(),
                mode,
            })
            .await
            .map_err(|_| ClientError::Stopped)
    }

    /// Publish a message, regardless of connection state (the transport
    /// buffers during outages).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidTopic`] if the message's topic
    /// template needs parameters that were not supplied, or
    /// [`ClientError::Stopped`] if the client loop has exited.
    pub async fn publish(&self, outbound: Outbound) -> Result<(), ClientError> {
        outbound.topic()?;
        self.commands
            .send(Command::Publish(outbound))
            .await
            .map_err(|_| ClientError::Stopped)
    }

    /// Stop the client loop. The in-flight blocking handler (if any) has
    /// already completed; concurrent handlers are not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Stopped`] if the client loop already exited.
    pub async fn stop(&self) -> Result<(), ClientError> {
        self.commands
            .send(Command::Stop)
            .await
            .map_err(|_| ClientError::Stopped)
    }
}

/// Configuration for a Hermes client.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Name used in log events.
    pub client_name: String,
    /// Allowed site ids; empty allows all sites.
    pub site_ids: Vec<String>,
}

struct Subscription {
    kind: MessageKind,
    mode: DispatchMode,
}

/// A Hermes MQTT client: subscription registry, site-id filter, and the
/// dispatch loop delivering typed messages to a [`MessageHandler`].
pub struct HermesClient<H> {
    name: String,
    site_ids: Vec<String>,
    handler: Arc<H>,
    transport: Arc<dyn Transport>,
    events: mpsc::Receiver<TransportEvent>,
    commands_rx: mpsc::Receiver<Command>,
    commands_tx: mpsc::Sender<Command>,
    subscriptions: Vec<Subscription>,
    topics: Vec<String>,
    connected: bool,
}

impl<H: MessageHandler> HermesClient<H> {
    /// Create a client over a connected transport.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        events: mpsc::Receiver<TransportEvent>,
        handler: H,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(64);

        Self {
            name: config.client_name,
            site_ids: config.site_ids,
            handler: Arc::new(handler),
            transport,
            events,
            commands_rx,
            commands_tx,
            subscriptions: Vec::new(),
            topics: Vec::new(),
            connected: false,
        }
    }

    /// Handle for subscribing, publishing, and stopping from other tasks
    /// (including handler code).
    #[must_use]
    pub fn handle(&self) -> HermesHandle {
        HermesHandle {
            commands: self.commands_tx.clone(),
        }
    }

    /// Register subscriptions before the loop starts; the topics are sent
    /// on the first connect.
    pub fn subscribe(&mut self, kinds: &[MessageKind], mode: DispatchMode) {
        self.register(kinds, mode);
    }

    /// Run the dispatch loop until a stop request or until the transport
    /// event stream closes.
    ///
    /// No error is fatal here: decode failures, handler faults, and
    /// transport hiccups are logged and the loop continues.
    pub async fn run(mut self) {
        tracing::info!(client = %self.name, "Hermes client running");

        loop {
            tokio::select! {
                // Drain inbound messages before commands so that a stop
                // request never overtakes already-delivered traffic.
                biased;

                event = self.events.recv() => match event {
                    Some(event) => self.on_event(event).await,
                    None => {
                        tracing::warn!(client = %self.name, "transport event stream closed");
                        break;
                    }
                },
                command = self.commands_rx.recv() => match command {
                    Some(Command::Stop) | None => break,
                    Some(command) => self.on_command(command).await,
                },
            }
        }

        tracing::info!(client = %self.name, "Hermes client stopped");
    }

    async fn on_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.connected = true;
                tracing::info!(
                    client = %self.name,
                    topics = self.topics.len(),
                    "connected, replaying subscriptions"
                );
                // Broker-side subscriptions do not survive a reconnect;
                // replay the full set, each literal topic exactly once.
                let topics = self.topics.clone();
                self.send_subscriptions(&topics).await;
            }
            TransportEvent::Disconnected => {
                self.connected = false;
                tracing::warn!(client = %self.name, "disconnected, waiting for reconnect");
            }
            TransportEvent::Message { topic, payload } => {
                self.on_message(topic, payload).await;
            }
        }
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Subscribe { kinds, mode } => {
                let added = self.register(&kinds, mode);
                if self.connected {
                    self.send_subscriptions(&added).await;
                }
            }
            Command::Publish(outbound) => {
                publish_outbound(self.transport.as_ref(), &outbound).await;
            }
            Command::Stop => unreachable!("handled by the run loop"),
        }
    }

    async fn on_message(&mut self, topic: String, payload: Vec<u8>) {
        self.handler.on_raw_message(&topic, &payload).await;

        let kinds = self.subscriptions.iter().map(|s| s.kind).collect::<Vec<_>>();
        let inbound = match dispatch::route(kinds, &topic, &payload) {
            Ok(Some(inbound)) => inbound,
            Ok(None) => {
                tracing::trace!(topic = %topic, "no subscribed kind matches");
                return;
            }
            Err(err) => {
                tracing::warn!(topic = %topic, error = %err, "dropping undecodable message");
                return;
            }
        };

        if !self.site_allowed(inbound.site_id.as_deref()) {
            tracing::debug!(
                topic = %topic,
                site_id = ?inbound.site_id,
                "discarding message for filtered site"
            );
            return;
        }

        let kind = inbound.message.kind();
        if kind.is_high_volume() {
            tracing::trace!(kind = kind.name(), bytes = payload.len(), "received");
        } else {
            tracing::debug!(kind = kind.name(), message = ?inbound.message, "received");
        }

        let mode = self
            .subscriptions
            .iter()
            .find(|s| s.kind == kind)
            .map_or(DispatchMode::Concurrent, |s| s.mode);

        let handler = Arc::clone(&self.handler);
        let transport = Arc::clone(&self.transport);
        let task = tokio::spawn(async move {
            let outputs = handler.on_message(inbound).await;
            for outbound in outputs {
                publish_outbound(transport.as_ref(), &outbound).await;
            }
        });

        match mode {
            DispatchMode::Blocking => report_handler_result(task.await, kind, &topic),
            DispatchMode::Concurrent => {
                tokio::spawn(async move {
                    report_handler_result(task.await, kind, &topic);
                });
            }
        }
    }

    /// Add subscriptions to the registry, returning the literal topics not
    /// yet requested from the transport. Re-registering a kind is a no-op.
    fn register(&mut self, kinds: &[MessageKind], mode: DispatchMode) -> Vec<String> {
        let mut added = Vec::new();

        for &kind in kinds {
            if self.subscriptions.iter().any(|s| s.kind == kind) {
                continue;
            }

            for prior in &self.subscriptions {
                if prior.kind.template().overlaps(kind.template()) {
                    tracing::warn!(
                        first = prior.kind.name(),
                        second = kind.name(),
                        "topic templates overlap, first registered match wins"
                    );
                }
            }

            self.subscriptions.push(Subscription { kind, mode });

            for topic in self.topics_for(kind) {
                if !self.topics.contains(&topic) {
                    self.topics.push(topic.clone());
                    added.push(topic);
                }
            }
        }

        added
    }

    /// Concrete subscription topics for a kind: one per allowed site when
    /// the site id is in the topic path, otherwise the wildcard form.
    fn topics_for(&self, kind: MessageKind) -> Vec<String> {
        if !self.site_ids.is_empty() && kind.site_in_topic() {
            self.site_ids
                .iter()
                .map(|site| kind.subscription_topic(&TopicArgs::new().with("site_id", site.clone())))
                .collect()
        } else {
            vec![kind.subscription_topic(&TopicArgs::new())]
        }
    }

    async fn send_subscriptions(&self, topics: &[String]) {
        for topic in topics {
            match self.transport.subscribe(topic).await {
                Ok(()) => tracing::debug!(topic = %topic, "subscribed"),
                Err(err) => tracing::warn!(
                    topic = %topic,
                    error = %err,
                    "subscribe failed, retried on next reconnect"
                ),
            }
        }
    }

    fn site_allowed(&self, site_id: Option<&str>) -> bool {
        match site_id {
            Some(site) if !self.site_ids.is_empty() => {
                self.site_ids.iter().any(|allowed| allowed == site)
            }
            _ => true,
        }
    }
}

fn report_handler_result(result: Result<(), JoinError>, kind: MessageKind, topic: &str) {
    if let Err(err) = result {
        tracing::error!(
            kind = kind.name(),
            topic = %topic,
            error = %err,
            "message handler failed"
        );
    }
}

/// Encode and publish one outbound message; all failures are logged, none
/// stop the loop.
async fn publish_outbound(transport: &dyn Transport, outbound: &Outbound) {
    let kind = outbound.message.kind();

    let topic = match outbound.topic() {
        Ok(topic) => topic,
        Err(err) => {
            tracing::error!(kind = kind.name(), error = %err, "cannot render publish topic");
            return;
        }
    };

    let payload = match outbound.message.encode() {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(kind = kind.name(), error = %err, "cannot encode message");
            return;
        }
    };

    if kind.is_high_volume() {
        tracing::trace!(kind = kind.name(), bytes = payload.len(), "publish");
    } else {
        tracing::debug!(
            kind = kind.name(),
            topic = %topic,
            bytes = payload.len(),
            message = ?outbound.message,
            "publish"
        );
    }

    if let Err(err) = transport.publish(&topic, payload).await {
        tracing::warn!(kind = kind.name(), topic = %topic, error = %err, "publish failed");
    }
}

/// Errors surfaced to callers of [`HermesHandle`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The client loop has exited.
    #[error("client is stopped")]
    Stopped,
    /// A publish topic could not be rendered.
    #[error(transparent)]
    InvalidTopic(#[from] TopicError),
}
