//! Client loop tests over an in-memory transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hermes_client::{
    ClientConfig, ClientError, DispatchMode, HermesClient, Inbound, MessageHandler, Outbound,
    Transport, TransportError, TransportEvent,
};
use hermes_proto::tts::TtsSay;
use hermes_proto::wake::HotwordDetected;
use hermes_proto::{Message, MessageKind};
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Default)]
struct FakeTransport {
    subscriptions: Mutex<Vec<String>>,
    publishes: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FakeTransport {
    fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    fn publishes(&self) -> Vec<(String, Vec<u8>)> {
        self.publishes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.subscriptions.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.publishes
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

/// Records every dispatched message; echoes NLU queries as TTS messages
/// when asked to.
struct EchoHandler {
    received: Arc<Mutex<Vec<Inbound>>>,
    respond: bool,
}

#[async_trait]
impl MessageHandler for EchoHandler {
    async fn on_message(&self, inbound: Inbound) -> Vec<Outbound> {
        self.received.lock().unwrap().push(inbound.clone());

        if !self.respond {
            return Vec::new();
        }

        match &inbound.message {
            Message::NluQuery(query) => vec![Outbound::new(TtsSay {
                text: query.input.clone(),
                lang: None,
                id: query.id.clone(),
                site_id: query.site_id.clone(),
                session_id: None,
            })],
            _ => Vec::new(),
        }
    }
}

struct Harness {
    fake: Arc<FakeTransport>,
    received: Arc<Mutex<Vec<Inbound>>>,
    events: mpsc::Sender<TransportEvent>,
    handle: hermes_client::HermesHandle,
    task: tokio::task::JoinHandle<()>,
}

fn start_client(
    site_ids: &[&str],
    kinds: &[MessageKind],
    mode: DispatchMode,
    respond: bool,
) -> Harness {
    let fake = Arc::new(FakeTransport::default());
    let received = Arc::new(Mutex::new(Vec::new()));
    let (events_tx, events_rx) = mpsc::channel(64);

    let config = ClientConfig {
        client_name: "test-client".to_string(),
        site_ids: site_ids.iter().map(ToString::to_string).collect(),
    };
    let handler = EchoHandler {
        received: Arc::clone(&received),
        respond,
    };

    let mut client = HermesClient::new(config, fake.clone(), events_rx, handler);
    client.subscribe(kinds, mode);
    let handle = client.handle();
    let task = tokio::spawn(client.run());

    Harness {
        fake,
        received,
        events: events_tx,
        handle,
        task,
    }
}

fn query_payload(input: &str, site_id: Option<&str>) -> Vec<u8> {
    let mut body = serde_json::json!({ "input": input });
    if let Some(site_id) = site_id {
        body["siteId"] = site_id.into();
    }
    serde_json::to_vec(&body).unwrap()
}

async fn send_query(events: &mpsc::Sender<TransportEvent>, input: &str, site_id: Option<&str>) {
    events
        .send(TransportEvent::Message {
            topic: "hermes/nlu/query".to_string(),
            payload: query_payload(input, site_id),
        })
        .await
        .unwrap();
}

async fn shutdown(harness: Harness) -> (Arc<FakeTransport>, Arc<Mutex<Vec<Inbound>>>) {
    harness.handle.stop().await.unwrap();
    timeout(Duration::from_secs(5), harness.task)
        .await
        .expect("client loop did not stop")
        .unwrap();
    (harness.fake, harness.received)
}

#[tokio::test]
async fn site_filter_discards_foreign_sites() {
    let harness = start_client(
        &["kitchen"],
        &[MessageKind::NluQuery],
        DispatchMode::Blocking,
        false,
    );

    harness.events.send(TransportEvent::Connected).await.unwrap();
    send_query(&harness.events, "lights off", Some("living_room")).await;
    send_query(&harness.events, "lights on", Some("kitchen")).await;
    send_query(&harness.events, "no site", None).await;

    let (_, received) = shutdown(harness).await;
    let received = received.lock().unwrap();

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].site_id.as_deref(), Some("kitchen"));
}

#[tokio::test]
async fn empty_filter_allows_all_sites() {
    let harness = start_client(&[], &[MessageKind::NluQuery], DispatchMode::Blocking, false);

    harness.events.send(TransportEvent::Connected).await.unwrap();
    send_query(&harness.events, "a", Some("living_room")).await;
    send_query(&harness.events, "b", None).await;

    let (_, received) = shutdown(harness).await;
    let received = received.lock().unwrap();

    assert_eq!(received.len(), 2);
    assert_eq!(received[1].site_id.as_deref(), Some("default"));
}

#[tokio::test]
async fn blocking_dispatch_publishes_in_order() {
    let harness = start_client(&[], &[MessageKind::NluQuery], DispatchMode::Blocking, true);

    harness.events.send(TransportEvent::Connected).await.unwrap();
    for input in ["a", "b", "c"] {
        send_query(&harness.events, input, None).await;
    }

    let (fake, _) = shutdown(harness).await;
    let publishes = fake.publishes();

    assert_eq!(publishes.len(), 3);
    for (expected, (topic, payload)) in ["a", "b", "c"].iter().zip(&publishes) {
        assert_eq!(topic, "hermes/tts/say");
        let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
        assert_eq!(&value["text"], expected);
    }
}

#[tokio::test]
async fn decode_failure_does_not_stop_dispatch() {
    let harness = start_client(&[], &[MessageKind::NluQuery], DispatchMode::Blocking, false);

    harness.events.send(TransportEvent::Connected).await.unwrap();
    send_query(&harness.events, "a", None).await;
    harness
        .events
        .send(TransportEvent::Message {
            topic: "hermes/nlu/query".to_string(),
            payload: b"{broken".to_vec(),
        })
        .await
        .unwrap();
    send_query(&harness.events, "c", None).await;

    let (_, received) = shutdown(harness).await;
    let received = received.lock().unwrap();

    let inputs: Vec<&str> = received
        .iter()
        .map(|inbound| match &inbound.message {
            Message::NluQuery(query) => query.input.as_str(),
            other => panic!("unexpected message: {other:?}"),
        })
        .collect();
    assert_eq!(inputs, ["a", "c"]);
}

#[tokio::test]
async fn reconnect_replays_all_subscriptions_once() {
    let kinds = [
        MessageKind::NluQuery,
        MessageKind::TtsSay,
        MessageKind::AudioFrame,
    ];
    let harness = start_client(&[], &kinds, DispatchMode::Concurrent, false);

    harness.events.send(TransportEvent::Connected).await.unwrap();
    harness
        .events
        .send(TransportEvent::Disconnected)
        .await
        .unwrap();
    harness.events.send(TransportEvent::Connected).await.unwrap();

    let (fake, _) = shutdown(harness).await;
    let subscriptions = fake.subscriptions();

    let expected = [
        "hermes/nlu/query",
        "hermes/tts/say",
        "hermes/audioServer/+/audioFrame",
    ];
    assert_eq!(subscriptions.len(), 6);
    assert_eq!(subscriptions[..3], expected[..]);
    assert_eq!(subscriptions[3..], expected[..]);
}

#[tokio::test]
async fn site_scoped_subscriptions_use_concrete_topics() {
    let harness = start_client(
        &["kitchen", "bedroom"],
        &[MessageKind::AudioFrame, MessageKind::NluQuery],
        DispatchMode::Concurrent,
        false,
    );

    harness.events.send(TransportEvent::Connected).await.unwrap();

    let (fake, _) = shutdown(harness).await;
    let subscriptions = fake.subscriptions();

    assert_eq!(
        subscriptions,
        [
            "hermes/audioServer/kitchen/audioFrame",
            "hermes/audioServer/bedroom/audioFrame",
            "hermes/nlu/query",
        ]
    );
}

#[tokio::test]
async fn subscribe_while_disconnected_flushes_on_connect() {
    let harness = start_client(&[], &[], DispatchMode::Blocking, false);

    harness
        .handle
        .subscribe(&[MessageKind::TtsSay], DispatchMode::Blocking)
        .await
        .unwrap();
    // Re-subscribing the same kind must not produce a second topic.
    harness
        .handle
        .subscribe(&[MessageKind::TtsSay], DispatchMode::Blocking)
        .await
        .unwrap();
    harness.events.send(TransportEvent::Connected).await.unwrap();

    let (fake, _) = shutdown(harness).await;

    assert_eq!(fake.subscriptions(), ["hermes/tts/say"]);
}

#[tokio::test]
async fn concurrent_handlers_deliver_everything() {
    let harness = start_client(&[], &[MessageKind::NluQuery], DispatchMode::Concurrent, true);

    harness.events.send(TransportEvent::Connected).await.unwrap();
    for input in ["a", "b", "c"] {
        send_query(&harness.events, input, None).await;
    }

    // Concurrent handlers finish on their own schedule; wait for all
    // three responses before stopping.
    timeout(Duration::from_secs(5), async {
        while harness.fake.publishes().len() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("concurrent handlers did not publish");

    let (fake, _) = shutdown(harness).await;

    let mut texts: Vec<String> = fake
        .publishes()
        .iter()
        .map(|(_, payload)| {
            let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
            value["text"].as_str().unwrap().to_string()
        })
        .collect();
    texts.sort();
    assert_eq!(texts, ["a", "b", "c"]);
}

#[tokio::test]
async fn publish_without_required_topic_params_fails() {
    let harness = start_client(&[], &[], DispatchMode::Blocking, false);

    let detected = HotwordDetected {
        model_id: "porcupine-v1".to_string(),
        model_version: "1".to_string(),
        model_type: "personal".to_string(),
        current_sensitivity: 0.5,
        site_id: "default".to_string(),
    };

    let err = harness
        .handle
        .publish(Outbound::new(detected))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidTopic(_)));

    shutdown(harness).await;
}
