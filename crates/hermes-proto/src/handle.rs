//! Messages for intent handling.

use serde::{Deserialize, Serialize};

use crate::default_site_id;

/// Enable intent handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleToggleOn {
    /// Id of the site to enable intent handling on.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

/// Disable intent handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleToggleOff {
    /// Id of the site to disable intent handling on.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}
