//! Messages for `hermes/dialogueManager`.

use serde::{Deserialize, Serialize};

use crate::default_site_id;

/// Session initialization description, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DialogueInit {
    /// The end user is expected to respond.
    Action(DialogueAction),
    /// The user is only informed; no response expected.
    Notification(DialogueNotification),
}

/// Dialogue session action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueAction {
    /// If true, the session starts when there is no pending one on the
    /// site; otherwise it is dropped if one is running.
    pub can_be_enqueued: bool,
    /// Text the TTS should say at the beginning of the session.
    #[serde(default)]
    pub text: Option<String>,
    /// Intent names to restrict the NLU resolution on the first query.
    #[serde(default)]
    pub intent_filter: Option<Vec<String>>,
    /// Send non-recognized intents to the client instead of handling them
    /// in the dialogue manager.
    #[serde(default)]
    pub send_intent_not_recognized: bool,
}

/// Dialogue session notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueNotification {
    /// Text the TTS should say.
    pub text: String,
}

/// Why a dialogue session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogueSessionTerminationReason {
    /// The session ended as expected.
    Nominal,
    /// The session was aborted by the user.
    AbortedByUser,
    /// No intent was successfully detected.
    IntentNotRecognized,
    /// A component did not respond in a timely manner.
    Timeout,
    /// The session failed with an error.
    Error,
}

/// Structured description of why a session ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueSessionTermination {
    /// The reason the session was ended.
    pub reason: DialogueSessionTerminationReason,
}

/// Start a dialogue session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueStartSession {
    /// Session initialization description.
    pub init: DialogueInit,
    /// Site where the session should start.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Data attached to every message of the new session.
    #[serde(default)]
    pub custom_data: Option<String>,
    /// Language of the session.
    #[serde(default)]
    pub lang: Option<String>,
}

/// Sent when a dialogue session has been queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueSessionQueued {
    /// Session identifier that was enqueued.
    pub session_id: String,
    /// Site where the user interaction will take place.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Custom data from the `startSession` message.
    #[serde(default)]
    pub custom_data: Option<String>,
}

/// Sent when a dialogue session has been started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueSessionStarted {
    /// Session identifier that was started.
    pub session_id: String,
    /// Site where the user interaction is taking place.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Custom data from the `startSession` message.
    #[serde(default)]
    pub custom_data: Option<String>,
    /// Language of the session.
    #[serde(default)]
    pub lang: Option<String>,
}

/// Continue a dialogue session with an additional request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueContinueSession {
    /// Identifier of the session to continue.
    pub session_id: String,
    /// Site where the user interaction is taking place.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Update to the session's custom data.
    #[serde(default)]
    pub custom_data: Option<String>,
    /// Text the TTS should say to start this request.
    #[serde(default)]
    pub text: Option<String>,
    /// Intent names to restrict the NLU resolution on the answer.
    #[serde(default)]
    pub intent_filter: Option<Vec<String>>,
    /// Send non-recognized intents to the client.
    #[serde(default)]
    pub send_intent_not_recognized: bool,
    /// Unused; kept for wire compatibility.
    #[serde(default)]
    pub slot: Option<String>,
    /// Language of the session; empty keeps the starting value.
    #[serde(default)]
    pub lang: Option<String>,
}

/// End a dialogue session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueEndSession {
    /// Identifier of the session to end.
    pub session_id: String,
    /// Site where the user interaction is taking place.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Text the TTS should say to end the session.
    #[serde(default)]
    pub text: Option<String>,
    /// Update to the session's custom data.
    #[serde(default)]
    pub custom_data: Option<String>,
}

/// Sent when a dialogue session has ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueSessionEnded {
    /// Why the session ended.
    pub termination: DialogueSessionTermination,
    /// Session identifier of the ended session.
    pub session_id: String,
    /// Site where the user interaction took place.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Custom data from the start/continue/end session messages.
    #[serde(default)]
    pub custom_data: Option<String>,
}

/// Intent not recognized within a session.
///
/// Only sent when `send_intent_not_recognized` was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueIntentNotRecognized {
    /// Session that generated this event.
    pub session_id: String,
    /// Site where the user interaction took place.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// NLU input that generated this event.
    #[serde(default)]
    pub input: Option<String>,
    /// Custom data from the start/continue session messages.
    #[serde(default)]
    pub custom_data: Option<String>,
}

/// Enable/disable a specific intent in a configure message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueConfigureIntent {
    /// Name of the intent to enable or disable.
    pub intent_id: String,
    /// True if the intent should be enabled.
    pub enable: bool,
}

/// Enable/disable specific intents for future dialogue sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueConfigure {
    /// Intents and whether to enable them.
    pub intents: Vec<DialogueConfigureIntent>,
    /// Id of the site to configure.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

/// Error from the dialogue manager component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_session_init_tagged_by_type() {
        let json = serde_json::json!({
            "init": { "type": "notification", "text": "door open" },
            "siteId": "porch"
        });

        let msg: DialogueStartSession = serde_json::from_value(json).unwrap();
        assert!(matches!(msg.init, DialogueInit::Notification(_)));
        assert_eq!(msg.site_id, "porch");

        let json = serde_json::json!({
            "init": { "type": "action", "canBeEnqueued": true, "text": "yes?" }
        });

        let msg: DialogueStartSession = serde_json::from_value(json).unwrap();
        match msg.init {
            DialogueInit::Action(action) => assert!(action.can_be_enqueued),
            DialogueInit::Notification(_) => panic!("expected action"),
        }
    }

    #[test]
    fn termination_reason_wire_values() {
        let msg: DialogueSessionEnded = serde_json::from_value(serde_json::json!({
            "termination": { "reason": "abortedByUser" },
            "sessionId": "abc"
        }))
        .unwrap();

        assert_eq!(
            msg.termination.reason,
            DialogueSessionTerminationReason::AbortedByUser
        );
    }
}
