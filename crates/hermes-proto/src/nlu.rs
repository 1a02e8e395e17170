//! Messages for `hermes/nlu`.

use serde::{Deserialize, Serialize};

use crate::default_site_id;
use crate::intent::{Intent, Slot};

/// Send text to the NLU component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NluQuery {
    /// Text to recognize an intent from.
    pub input: String,
    /// Intent names to restrict the resolution to.
    #[serde(default)]
    pub intent_filter: Option<Vec<String>>,
    /// Unique id for the request.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the site where the query originated.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Intent recognized.
///
/// Published to `hermes/intent/{intent_name}` so handlers can subscribe to
/// a single intent; the site id stays in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NluIntent {
    /// Input text the intent was recognized from.
    pub input: String,
    /// The recognized intent.
    pub intent: Intent,
    /// Recognized slots.
    #[serde(default)]
    pub slots: Vec<Slot>,
    /// Unique id from the query.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the site where the intent was recognized.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Custom data attached to the session.
    #[serde(default)]
    pub custom_data: Option<String>,
}

/// Intent not recognized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NluIntentNotRecognized {
    /// Input text that could not be matched to an intent.
    pub input: String,
    /// Unique id from the query.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the site where the query originated.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Error from the NLU component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NluError {
    /// Description of the error.
    pub error: String,
    /// Context in which the error occurred.
    #[serde(default)]
    pub context: Option<String>,
    /// Id of the site where the error occurred.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// One token the ASR captured, as attached to transcription results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrToken {
    /// Text of the token.
    pub value: String,
    /// Confidence of the token, between 0 and 1.
    pub confidence: f64,
    /// Start index (inclusive) in the input.
    pub range_start: usize,
    /// End index (exclusive) in the input.
    pub range_end: usize,
    /// Timing of the token in the audio stream.
    #[serde(default)]
    pub time: Option<AsrTokenTime>,
}

/// Audio timing of an ASR token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrTokenTime {
    /// Start time in seconds, relative to the start of the utterance.
    pub start: f64,
    /// End time in seconds, relative to the start of the utterance.
    pub end: f64,
}
