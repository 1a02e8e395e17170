//! Messages for training.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::default_site_id;
use crate::message::BinaryBody;

/// Request publication of the intent graph from training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentGraphRequest {
    /// Unique id for the request, appended to the reply topic.
    pub id: String,
    /// Id of the site where training occurred.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

/// Intent graph from training, as an opaque binary payload.
#[derive(Clone, PartialEq, Eq)]
pub struct IntentGraph {
    /// Serialized intent graph.
    pub graph_bytes: Vec<u8>,
}

impl From<Vec<u8>> for IntentGraph {
    fn from(graph_bytes: Vec<u8>) -> Self {
        Self { graph_bytes }
    }
}

impl BinaryBody for IntentGraph {
    fn body(&self) -> &[u8] {
        &self.graph_bytes
    }
}

impl fmt::Debug for IntentGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntentGraph({} byte(s))", self.graph_bytes.len())
    }
}
