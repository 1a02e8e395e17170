//! Messages for looking up or guessing word pronunciations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::default_site_id;

fn default_num_guesses() -> usize {
    5
}

/// Get phonetic pronunciations for words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct G2pPronounce {
    /// Words to guess pronunciations for.
    pub words: Vec<String>,
    /// Unique id for the request.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the site to request pronunciations from.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Maximum guesses for words not in the dictionary.
    #[serde(default = "default_num_guesses")]
    pub num_guesses: usize,
}

/// Phonetic pronunciation of a single word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct G2pPronunciation {
    /// Phonemes of the word.
    pub phonemes: Vec<String>,
    /// True if guessed by a g2p model, false if from a dictionary.
    #[serde(default)]
    pub guessed: Option<bool>,
}

/// Response to `g2p/pronounce`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct G2pPhonemes {
    /// Guessed or looked-up pronunciations, keyed by word.
    pub word_phonemes: HashMap<String, Vec<G2pPronunciation>>,
    /// Unique id from the request.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the site where pronunciations were requested.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Error from the G2P component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct G2pError {
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
