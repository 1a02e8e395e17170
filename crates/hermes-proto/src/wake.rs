//! Messages for `hermes/hotword`.

use serde::{Deserialize, Serialize};

use crate::default_site_id;

/// Activate the wake word component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotwordToggleOn {
    /// Id of the site where the wake word component should be activated.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

/// Deactivate the wake word component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotwordToggleOff {
    /// Id of the site where the wake word component should be deactivated.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The wake word component has detected a specific wake word.
///
/// The wakeword id lives in the topic path; the site id stays in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotwordDetected {
    /// Id of the model that triggered.
    pub model_id: String,
    /// Version of the model.
    pub model_version: String,
    /// Type of the model (e.g. personal, universal).
    pub model_type: String,
    /// Sensitivity the model was configured with.
    pub current_sensitivity: f64,
    /// Id of the site where the wake word was detected.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}
