//! Inbound message routing.
//!
//! One decision per inbound `(topic, payload)` pair: walk the subscribed
//! kinds in registration order, decode the first whose template matches,
//! and resolve the site and session ids from the topic path or the JSON
//! body depending on the kind.

use hermes_proto::{DecodeError, Message, MessageKind, DEFAULT_SITE_ID};

/// A decoded inbound message with resolved identifiers.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// The decoded message.
    pub message: Message,
    /// Resolved site id. `None` only for binary kinds whose topic carries
    /// no site.
    pub site_id: Option<String>,
    /// Resolved session id, if any.
    pub session_id: Option<String>,
    /// The concrete topic the message arrived on.
    pub topic: String,
}

/// Match and decode an inbound message against the subscribed kinds, in
/// registration order. The first matching kind wins and the search stops.
///
/// Returns `Ok(None)` when no kind matches.
///
/// # Errors
///
/// Returns [`DecodeError`] when a kind matched but its payload did not
/// decode; the caller logs and drops the message.
pub fn route(
    kinds: impl IntoIterator<Item = MessageKind>,
    topic: &str,
    payload: &[u8],
) -> Result<Option<Inbound>, DecodeError> {
    for kind in kinds {
        if kind.matches(topic) {
            return decode(kind, topic, payload).map(Some);
        }
    }

    Ok(None)
}

fn decode(kind: MessageKind, topic: &str, payload: &[u8]) -> Result<Inbound, DecodeError> {
    let template = kind.template();

    if kind.is_binary() {
        // No body to inspect: identifiers come from the topic or nowhere.
        let message = kind.decode(payload)?;
        return Ok(Inbound {
            message,
            site_id: template.extract(topic, "site_id").map(str::to_string),
            session_id: template.extract(topic, "session_id").map(str::to_string),
            topic: topic.to_string(),
        });
    }

    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|err| DecodeError::Json {
            kind: kind.name(),
            detail: err.to_string(),
        })?;

    let site_id = if kind.site_in_topic() {
        template.extract(topic, "site_id").map(str::to_string)
    } else {
        Some(
            value
                .get("siteId")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(DEFAULT_SITE_ID)
                .to_string(),
        )
    };

    let session_id = if kind.session_in_topic() {
        template.extract(topic, "session_id").map(str::to_string)
    } else {
        value
            .get("sessionId")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };

    let message = kind.decode_value(value)?;

    Ok(Inbound {
        message,
        site_id,
        session_id,
        topic: topic.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registered_match_wins() {
        // Both templates match this pathological topic; registration order
        // decides, deterministically.
        let topic = "hermes/audioServer/kitchen/playBytes/audioSessionFrame";
        let kinds = [MessageKind::AudioPlayBytes, MessageKind::AudioSessionFrame];

        let inbound = route(kinds, topic, b"\x00").unwrap().unwrap();
        assert_eq!(inbound.message.kind(), MessageKind::AudioPlayBytes);

        let reversed = [MessageKind::AudioSessionFrame, MessageKind::AudioPlayBytes];
        let inbound = route(reversed, topic, b"\x00").unwrap().unwrap();
        assert_eq!(inbound.message.kind(), MessageKind::AudioSessionFrame);
    }

    #[test]
    fn binary_frame_resolves_ids_from_topic() {
        let payload = b"\x00\x01\x02";
        let inbound = route(
            [MessageKind::AudioFrame],
            "hermes/audioServer/kitchen/audioFrame",
            payload,
        )
        .unwrap()
        .unwrap();

        assert_eq!(inbound.site_id.as_deref(), Some("kitchen"));
        assert_eq!(inbound.session_id, None);
        match inbound.message {
            Message::AudioFrame(frame) => assert_eq!(frame.wav_bytes, payload),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn json_body_supplies_site_and_session() {
        let payload = br#"{"input": "turn on the light", "siteId": "kitchen", "sessionId": "sess-9"}"#;
        let inbound = route([MessageKind::NluQuery], "hermes/nlu/query", payload)
            .unwrap()
            .unwrap();

        assert_eq!(inbound.site_id.as_deref(), Some("kitchen"));
        assert_eq!(inbound.session_id.as_deref(), Some("sess-9"));
        match inbound.message {
            Message::NluQuery(query) => assert_eq!(query.input, "turn on the light"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn missing_body_site_falls_back_to_default() {
        let inbound = route(
            [MessageKind::TtsSayFinished],
            "hermes/tts/sayFinished",
            b"{}",
        )
        .unwrap()
        .unwrap();

        assert_eq!(inbound.site_id.as_deref(), Some(DEFAULT_SITE_ID));
        assert_eq!(inbound.session_id, None);
    }

    #[test]
    fn session_in_topic_wins_over_body() {
        let inbound = route(
            [MessageKind::AudioSessionFrame],
            "hermes/audioServer/kitchen/sess-1/audioSessionFrame",
            b"\x00",
        )
        .unwrap()
        .unwrap();

        assert_eq!(inbound.site_id.as_deref(), Some("kitchen"));
        assert_eq!(inbound.session_id.as_deref(), Some("sess-1"));
    }

    #[test]
    fn unmatched_topic_yields_none() {
        let result = route([MessageKind::NluQuery], "hermes/tts/say", b"{}").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let err = route([MessageKind::NluQuery], "hermes/nlu/query", b"{oops").unwrap_err();
        assert!(matches!(err, DecodeError::Json { .. }));
    }

    #[test]
    fn intent_name_extracted_from_topic() {
        let payload = br#"{
            "input": "set the light to red",
            "intent": { "intentName": "SetColor", "confidenceScore": 0.97 },
            "siteId": "kitchen"
        }"#;
        let inbound = route(
            [MessageKind::NluIntent],
            "hermes/intent/SetColor",
            payload,
        )
        .unwrap()
        .unwrap();

        let extracted = MessageKind::NluIntent
            .template()
            .extract(&inbound.topic, "intent_name");
        assert_eq!(extracted, Some("SetColor"));
        assert_eq!(inbound.site_id.as_deref(), Some("kitchen"));
    }
}
