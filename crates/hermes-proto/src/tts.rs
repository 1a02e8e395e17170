//! Messages for `hermes/tts`.

use serde::{Deserialize, Serialize};

use crate::default_site_id;

/// Send text to be spoken by the text to speech component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsSay {
    /// Text to speak.
    pub text: String,
    /// Language for the text to speech.
    #[serde(default)]
    pub lang: Option<String>,
    /// Unique id for the request.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the site where the text should be spoken.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Sent when the text to speech component has finished speaking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsSayFinished {
    /// Unique id from the request.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}
