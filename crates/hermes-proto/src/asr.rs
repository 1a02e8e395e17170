//! Messages for automated speech recognition.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::BinaryBody;
use crate::nlu::AsrToken;
use crate::{default_site_id, default_true};

/// Reason for an ASR toggle on/off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AsrToggleReason {
    /// Unknown; overrides all other reasons.
    #[default]
    #[serde(rename = "")]
    Unknown,
    /// A dialogue session is active.
    DialogueSession,
    /// Audio is currently playing.
    PlayAudio,
    /// The text to speech system is currently speaking.
    TtsSay,
}

/// Activate the ASR component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrToggleOn {
    /// Id of the site where ASR should be turned on.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Why ASR was toggled on.
    #[serde(default)]
    pub reason: AsrToggleReason,
}

/// Deactivate the ASR component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrToggleOff {
    /// Id of the site where ASR should be turned off.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Why ASR was toggled off.
    #[serde(default)]
    pub reason: AsrToggleReason,
}

/// Tell the ASR component to start listening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrStartListening {
    /// Site that must be listened to.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Related session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Language of the incoming audio stream.
    #[serde(default)]
    pub lang: Option<String>,
    /// Automatically detect the end of the voice command.
    #[serde(default = "default_true")]
    pub stop_on_silence: bool,
    /// Emit an `audioCaptured` message with the recorded audio.
    #[serde(default)]
    pub send_audio_captured: bool,
    /// Id of the wakeword used to activate the ASR.
    #[serde(default)]
    pub wakeword_id: Option<String>,
    /// Intent names to restrict the ASR to.
    #[serde(default)]
    pub intent_filter: Option<Vec<String>>,
}

/// Tell the ASR component to stop listening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrStopListening {
    /// Id of the site where the ASR should stop listening.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Full transcription results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrTextCaptured {
    /// The captured text.
    pub text: String,
    /// Likelihood of the capture.
    pub likelihood: f64,
    /// Seconds it took to transcribe.
    pub seconds: f64,
    /// Id of the site where the text was captured.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Id of the wakeword used to activate the ASR.
    #[serde(default)]
    pub wakeword_id: Option<String>,
    /// Tokens of the capture, one list per likely transcription.
    #[serde(default)]
    pub asr_tokens: Option<Vec<Vec<AsrToken>>>,
    /// Language of the session.
    #[serde(default)]
    pub lang: Option<String>,
}

/// Error from the ASR component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrError {
    /// Description of the error.
    pub error: String,
    /// Id of the site where the error occurred.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Context in which the error occurred.
    #[serde(default)]
    pub context: Option<String>,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Request to retrain the ASR from an intent graph.
///
/// The site id lives in the topic so satellites only see their own
/// training requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrTrain {
    /// Path to the intent graph file.
    pub graph_path: String,
    /// Unique id for the training request.
    #[serde(default)]
    pub id: Option<String>,
    /// Format of the graph file.
    #[serde(default)]
    pub graph_format: Option<String>,
    /// Training sentences, keyed by intent name.
    #[serde(default)]
    pub sentences: Option<HashMap<String, String>>,
    /// Slot values, keyed by slot name.
    #[serde(default)]
    pub slots: Option<HashMap<String, Vec<String>>>,
}

/// Result from successful training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrTrainSuccess {
    /// Unique id from the training request.
    #[serde(default)]
    pub id: Option<String>,
}

/// Audio captured from an ASR session, as a raw WAV payload.
#[derive(Clone, PartialEq, Eq)]
pub struct AsrAudioCaptured {
    /// Captured audio in WAV format.
    pub wav_bytes: Vec<u8>,
}

impl From<Vec<u8>> for AsrAudioCaptured {
    fn from(wav_bytes: Vec<u8>) -> Self {
        Self { wav_bytes }
    }
}

impl BinaryBody for AsrAudioCaptured {
    fn body(&self) -> &[u8] {
        &self.wav_bytes
    }
}

impl fmt::Debug for AsrAudioCaptured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsrAudioCaptured({} byte(s))", self.wav_bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_reason_wire_values() {
        let on: AsrToggleOn =
            serde_json::from_str(r#"{"siteId": "kitchen", "reason": "dialogueSession"}"#).unwrap();
        assert_eq!(on.reason, AsrToggleReason::DialogueSession);

        let off: AsrToggleOff = serde_json::from_str(r#"{"reason": ""}"#).unwrap();
        assert_eq!(off.reason, AsrToggleReason::Unknown);
        assert_eq!(off.site_id, "default");
    }

    #[test]
    fn start_listening_defaults() {
        let msg: AsrStartListening = serde_json::from_str("{}").unwrap();

        assert_eq!(msg.site_id, "default");
        assert!(msg.stop_on_silence);
        assert!(!msg.send_audio_captured);
        assert_eq!(msg.intent_filter, None);
    }
}
