//! The closed registry of Hermes message schemas.
//!
//! [`MessageKind`] enumerates every schema the protocol defines, one per
//! MQTT topic; [`Message`] is the matching decoded instance. The registry
//! is generated from a single table so that the topic template, the payload
//! encoding, and the Rust type of each schema stay in one place.

use once_cell::sync::Lazy;

use crate::topic::{TopicArgs, TopicError, TopicTemplate};
use crate::{asr, audioserver, dialogue, g2p, handle, nlu, train, tts, wake};

/// Messages whose payload is a raw byte buffer rather than JSON.
///
/// The payload is the sole field; decoding copies the bytes as-is and
/// encoding returns them unmodified.
pub trait BinaryBody: From<Vec<u8>> {
    /// Borrow the raw payload bytes.
    fn body(&self) -> &[u8];
}

/// Errors decoding an inbound payload.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    /// Payload did not match the expected JSON shape.
    #[error("invalid payload for {kind}: {detail}")]
    Json {
        /// Schema the payload was decoded against
        kind: &'static str,
        /// Parser error detail
        detail: String,
    },
    /// A JSON decode was requested for a binary kind.
    #[error("{kind} carries a binary payload")]
    BinaryPayload {
        /// Schema the decode was requested for
        kind: &'static str,
    },
}

/// Errors encoding an outbound message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EncodeError {
    /// Serialization failed.
    #[error("failed to serialize {kind}: {detail}")]
    Json {
        /// Schema being serialized
        kind: &'static str,
        /// Serializer error detail
        detail: String,
    },
}

macro_rules! message_registry {
    (
        $( $payload:ident $variant:ident($ty:ty) => $topic:literal ),+ $(,)?
    ) => {
        /// Identifier of a Hermes message schema.
        ///
        /// Declaration order is the canonical registration order used by
        /// dispatch (first registered match wins).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageKind {
            $( #[doc = concat!("`", $topic, "`")] $variant, )+
        }

        /// A decoded Hermes message.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $( #[doc = concat!("`", $topic, "`")] $variant($ty), )+
        }

        impl MessageKind {
            /// Every known message kind, in declaration order.
            pub const ALL: &'static [MessageKind] = &[ $( MessageKind::$variant, )+ ];

            /// Short schema name, e.g. `NluQuery`.
            #[must_use]
            pub const fn name(&self) -> &'static str {
                match self { $( Self::$variant => stringify!($variant), )+ }
            }

            /// Compiled topic template for this kind.
            #[must_use]
            pub fn template(&self) -> &'static TopicTemplate {
                match self {
                    $( Self::$variant => {
                        static TEMPLATE: Lazy<TopicTemplate> =
                            Lazy::new(|| TopicTemplate::parse($topic));
                        &TEMPLATE
                    } )+
                }
            }

            /// True when the payload is raw bytes rather than JSON.
            #[must_use]
            pub const fn is_binary(&self) -> bool {
                match self { $( Self::$variant => message_registry!(@binary $payload), )+ }
            }

            /// Decode a raw MQTT payload into a typed message.
            ///
            /// JSON kinds ignore unknown keys and apply the documented
            /// field defaults; binary kinds take the payload as-is.
            ///
            /// # Errors
            ///
            /// Returns [`DecodeError`] if a JSON payload does not match the
            /// schema.
            pub fn decode(&self, payload: &[u8]) -> Result<Message, DecodeError> {
                match self {
                    $( Self::$variant => message_registry!(@decode $payload, $variant, $ty, payload), )+
                }
            }

            /// Decode from an already-parsed JSON value.
            ///
            /// # Errors
            ///
            /// Returns [`DecodeError`] if the value does not match the
            /// schema, or [`DecodeError::BinaryPayload`] for binary kinds.
            pub fn decode_value(&self, value: serde_json::Value) -> Result<Message, DecodeError> {
                match self {
                    $( Self::$variant => message_registry!(@decode_value $payload, $variant, $ty, value), )+
                }
            }
        }

        impl Message {
            /// The schema this instance belongs to.
            #[must_use]
            pub fn kind(&self) -> MessageKind {
                match self { $( Self::$variant(_) => MessageKind::$variant, )+ }
            }

            /// Encode to a raw MQTT payload.
            ///
            /// # Errors
            ///
            /// Returns [`EncodeError`] if JSON serialization fails.
            pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
                match self {
                    $( Self::$variant(inner) => message_registry!(@encode $payload, $variant, inner), )+
                }
            }
        }

        $(
            impl From<$ty> for Message {
                fn from(inner: $ty) -> Self {
                    Message::$variant(inner)
                }
            }
        )+
    };

    (@binary binary) => { true };
    (@binary json) => { false };

    (@decode binary, $variant:ident, $ty:ty, $payload:ident) => {
        Ok(Message::$variant(<$ty>::from($payload.to_vec())))
    };
    (@decode json, $variant:ident, $ty:ty, $payload:ident) => {
        serde_json::from_slice::<$ty>($payload)
            .map(Message::$variant)
            .map_err(|err| DecodeError::Json {
                kind: stringify!($variant),
                detail: err.to_string(),
            })
    };

    (@decode_value binary, $variant:ident, $ty:ty, $value:ident) => {{
        let _ = $value;
        Err(DecodeError::BinaryPayload { kind: stringify!($variant) })
    }};
    (@decode_value json, $variant:ident, $ty:ty, $value:ident) => {
        serde_json::from_value::<$ty>($value)
            .map(Message::$variant)
            .map_err(|err| DecodeError::Json {
                kind: stringify!($variant),
                detail: err.to_string(),
            })
    };

    (@encode binary, $variant:ident, $inner:ident) => {
        Ok(BinaryBody::body($inner).to_vec())
    };
    (@encode json, $variant:ident, $inner:ident) => {
        serde_json::to_vec($inner).map_err(|err| EncodeError::Json {
            kind: stringify!($variant),
            detail: err.to_string(),
        })
    };
}

message_registry! {
    json AsrToggleOn(asr::AsrToggleOn) => "hermes/asr/toggleOn",
    json AsrToggleOff(asr::AsrToggleOff) => "hermes/asr/toggleOff",
    json AsrStartListening(asr::AsrStartListening) => "hermes/asr/startListening",
    json AsrStopListening(asr::AsrStopListening) => "hermes/asr/stopListening",
    json AsrTextCaptured(asr::AsrTextCaptured) => "hermes/asr/textCaptured",
    json AsrError(asr::AsrError) => "hermes/error/asr",
    json AsrTrain(asr::AsrTrain) => "rhasspy/asr/{site_id}/train",
    json AsrTrainSuccess(asr::AsrTrainSuccess) => "rhasspy/asr/{site_id}/trainSuccess",
    binary AsrAudioCaptured(asr::AsrAudioCaptured) => "rhasspy/asr/{site_id}/{session_id}/audioCaptured",
    binary AudioFrame(audioserver::AudioFrame) => "hermes/audioServer/{site_id}/audioFrame",
    binary AudioSessionFrame(audioserver::AudioSessionFrame) => "hermes/audioServer/{site_id}/{session_id}/audioSessionFrame",
    binary AudioPlayBytes(audioserver::AudioPlayBytes) => "hermes/audioServer/{site_id}/playBytes/{request_id}",
    json AudioPlayFinished(audioserver::AudioPlayFinished) => "hermes/audioServer/{site_id}/playFinished",
    json AudioSummary(audioserver::AudioSummary) => "hermes/audioServer/{site_id}/audioSummary",
    json SummaryToggleOn(audioserver::SummaryToggleOn) => "hermes/audioServer/toggleSummaryOn",
    json SummaryToggleOff(audioserver::SummaryToggleOff) => "hermes/audioServer/toggleSummaryOff",
    json AudioToggleOn(audioserver::AudioToggleOn) => "hermes/audioServer/toggleOn",
    json AudioToggleOff(audioserver::AudioToggleOff) => "hermes/audioServer/toggleOff",
    json AudioGetDevices(audioserver::AudioGetDevices) => "rhasspy/audioServer/getDevices",
    json AudioDevices(audioserver::AudioDevices) => "rhasspy/audioServer/devices",
    json AudioRecordError(audioserver::AudioRecordError) => "hermes/error/audioServer/record",
    json AudioPlayError(audioserver::AudioPlayError) => "hermes/error/audioServer/play",
    json DialogueStartSession(dialogue::DialogueStartSession) => "hermes/dialogueManager/startSession",
    json DialogueSessionQueued(dialogue::DialogueSessionQueued) => "hermes/dialogueManager/sessionQueued",
    json DialogueSessionStarted(dialogue::DialogueSessionStarted) => "hermes/dialogueManager/sessionStarted",
    json DialogueContinueSession(dialogue::DialogueContinueSession) => "hermes/dialogueManager/continueSession",
    json DialogueEndSession(dialogue::DialogueEndSession) => "hermes/dialogueManager/endSession",
    json DialogueSessionEnded(dialogue::DialogueSessionEnded) => "hermes/dialogueManager/sessionEnded",
    json DialogueIntentNotRecognized(dialogue::DialogueIntentNotRecognized) => "hermes/dialogueManager/intentNotRecognized",
    json DialogueConfigure(dialogue::DialogueConfigure) => "hermes/dialogueManager/configure",
    json DialogueError(dialogue::DialogueError) => "hermes/error/dialogueManager",
    json G2pPronounce(g2p::G2pPronounce) => "rhasspy/g2p/pronounce",
    json G2pPhonemes(g2p::G2pPhonemes) => "rhasspy/g2p/phonemes",
    json G2pError(g2p::G2pError) => "rhasspy/error/g2p",
    json HandleToggleOn(handle::HandleToggleOn) => "rhasspy/handle/toggleOn",
    json HandleToggleOff(handle::HandleToggleOff) => "rhasspy/handle/toggleOff",
    json HotwordToggleOn(wake::HotwordToggleOn) => "hermes/hotword/toggleOn",
    json HotwordToggleOff(wake::HotwordToggleOff) => "hermes/hotword/toggleOff",
    json HotwordDetected(wake::HotwordDetected) => "hermes/hotword/{wakeword_id}/detected",
    json NluQuery(nlu::NluQuery) => "hermes/nlu/query",
    json NluIntent(nlu::NluIntent) => "hermes/intent/{intent_name}",
    json NluIntentNotRecognized(nlu::NluIntentNotRecognized) => "hermes/nlu/intentNotRecognized",
    json NluError(nlu::NluError) => "hermes/error/nlu",
    json TtsSay(tts::TtsSay) => "hermes/tts/say",
    json TtsSayFinished(tts::TtsSayFinished) => "hermes/tts/sayFinished",
    json IntentGraphRequest(train::IntentGraphRequest) => "rhasspy/train/getIntentGraph",
    binary IntentGraph(train::IntentGraph) => "rhasspy/train/intentGraph/{request_id}",
}

impl MessageKind {
    /// True if the site id is read from the topic path rather than the
    /// JSON body.
    #[must_use]
    pub fn site_in_topic(&self) -> bool {
        self.template().has_placeholder("site_id")
    }

    /// True if the session id is read from the topic path rather than the
    /// JSON body.
    #[must_use]
    pub fn session_in_topic(&self) -> bool {
        self.template().has_placeholder("session_id")
    }

    /// True for kinds published at a high rate whose payloads must never
    /// be dumped to the log (audio frames and per-frame summaries).
    #[must_use]
    pub fn is_high_volume(&self) -> bool {
        matches!(
            self,
            Self::AudioFrame | Self::AudioSessionFrame | Self::AudioSummary
        )
    }

    /// True if the concrete topic string is an instance of this kind's
    /// template.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        self.template().matches(topic)
    }

    /// Build the MQTT subscription pattern for this kind; missing
    /// placeholders become wildcards.
    #[must_use]
    pub fn subscription_topic(&self, args: &TopicArgs) -> String {
        self.template().subscription(args)
    }

    /// Render the concrete publish topic for this kind.
    ///
    /// # Errors
    ///
    /// Returns [`TopicError::InvalidParameters`] if a placeholder value is
    /// missing.
    pub fn publish_topic(&self, args: &TopicArgs) -> Result<String, TopicError> {
        self.template().render(args)
    }
}

impl Message {
    /// Short schema name of this instance.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_SITE_ID;

    #[test]
    fn only_the_documented_template_collision_exists() {
        // `.../playBytes/{request_id}` and `.../{session_id}/audioSessionFrame`
        // share a prefix and can both match a topic whose last level is
        // literally "audioSessionFrame". Registration order resolves that
        // pair; no other pair may collide.
        let mut collisions = Vec::new();
        for (i, a) in MessageKind::ALL.iter().enumerate() {
            for b in &MessageKind::ALL[i + 1..] {
                if a.template().overlaps(b.template()) {
                    collisions.push((a.name(), b.name()));
                }
            }
        }

        assert_eq!(collisions, vec![("AudioSessionFrame", "AudioPlayBytes")]);
    }

    #[test]
    fn rendered_topics_match_their_template() {
        let args = TopicArgs::new()
            .with("site_id", "kitchen")
            .with("session_id", "sess-1")
            .with("request_id", "req-1")
            .with("intent_name", "SetColor")
            .with("wakeword_id", "porcupine");

        for kind in MessageKind::ALL {
            let topic = kind.publish_topic(&args).unwrap();
            assert!(kind.matches(&topic), "{}: {topic}", kind.name());
        }
    }

    #[test]
    fn extract_returns_substituted_values() {
        let args = TopicArgs::new()
            .with("site_id", "kitchen")
            .with("session_id", "sess-1");
        let topic = MessageKind::AudioSessionFrame.publish_topic(&args).unwrap();

        let template = MessageKind::AudioSessionFrame.template();
        assert_eq!(template.extract(&topic, "site_id"), Some("kitchen"));
        assert_eq!(template.extract(&topic, "session_id"), Some("sess-1"));
    }

    #[test]
    fn identifier_placement_follows_templates() {
        assert!(MessageKind::AudioFrame.site_in_topic());
        assert!(!MessageKind::AudioFrame.session_in_topic());
        assert!(MessageKind::AsrAudioCaptured.session_in_topic());
        assert!(!MessageKind::NluQuery.site_in_topic());
        assert!(!MessageKind::HotwordDetected.site_in_topic());
        assert!(MessageKind::IntentGraph.is_binary());
        assert!(!MessageKind::IntentGraph.site_in_topic());
    }

    #[test]
    fn json_roundtrip_preserves_instances() {
        let say = crate::tts::TtsSay {
            text: "hello there".to_string(),
            lang: Some("en".to_string()),
            id: Some("req-7".to_string()),
            site_id: "kitchen".to_string(),
            session_id: None,
        };

        let message = Message::from(say);
        let payload = message.encode().unwrap();
        let decoded = MessageKind::TtsSay.decode(&payload).unwrap();

        assert_eq!(message, decoded);
    }

    #[test]
    fn decode_ignores_unknown_keys() {
        let payload = br#"{"text": "hi", "siteId": "kitchen", "futureField": [1, 2, 3]}"#;
        let decoded = MessageKind::TtsSay.decode(payload).unwrap();

        match decoded {
            Message::TtsSay(say) => {
                assert_eq!(say.text, "hi");
                assert_eq!(say.site_id, "kitchen");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn decode_applies_defaults() {
        let payload = br#"{"input": "turn on the light"}"#;
        let decoded = MessageKind::NluQuery.decode(payload).unwrap();

        match decoded {
            Message::NluQuery(query) => {
                assert_eq!(query.input, "turn on the light");
                assert_eq!(query.site_id, DEFAULT_SITE_ID);
                assert_eq!(query.session_id, None);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn wire_keys_are_camel_case() {
        let captured = crate::asr::AsrTextCaptured {
            text: "what time is it".to_string(),
            likelihood: 0.95,
            seconds: 1.5,
            site_id: "kitchen".to_string(),
            session_id: Some("sess-1".to_string()),
            wakeword_id: None,
            asr_tokens: None,
            lang: None,
        };

        let payload = Message::from(captured).encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["siteId"], "kitchen");
        assert_eq!(value["sessionId"], "sess-1");
        assert!(value.get("site_id").is_none());
    }

    #[test]
    fn binary_payload_identity() {
        let payload = b"\x00\x01\x02\x03";
        let decoded = MessageKind::AudioFrame.decode(payload).unwrap();

        assert_eq!(decoded.encode().unwrap(), payload);
        match decoded {
            Message::AudioFrame(frame) => assert_eq!(frame.wav_bytes, payload),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = MessageKind::NluQuery.decode(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json { kind: "NluQuery", .. }));
    }
}
