//! Intent and slot types shared by NLU and dialogue messages.

use serde::{Deserialize, Serialize};

/// A recognized intent with its confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Name of the detected intent.
    pub intent_name: String,
    /// Probability of the detection, between 0 and 1.
    pub confidence_score: f64,
}

/// Character range where a slot was found in the input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRange {
    /// Start index (inclusive) in the substituted input.
    pub start: usize,
    /// End index (exclusive) in the substituted input.
    pub end: usize,
    /// Start index (inclusive) in the unsubstituted input.
    #[serde(default)]
    pub raw_start: Option<usize>,
    /// End index (exclusive) in the unsubstituted input.
    #[serde(default)]
    pub raw_end: Option<usize>,
}

/// A named entity recognized inside an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Entity of the slot.
    pub entity: String,
    /// Resolved value of the slot; contains at least a `"value"` key.
    pub value: serde_json::Value,
    /// Name of the slot; falls back to the entity when absent.
    #[serde(default)]
    pub slot_name: Option<String>,
    /// Raw value as it appeared in the input.
    #[serde(default)]
    pub raw_value: Option<String>,
    /// Confidence score of the slot, between 0 and 1.
    #[serde(default)]
    pub confidence: f64,
    /// Range where the slot is found in the input text.
    #[serde(default)]
    pub range: Option<SlotRange>,
}

impl Slot {
    /// Slot name, falling back to the entity.
    #[must_use]
    pub fn slot_name(&self) -> &str {
        self.slot_name.as_deref().unwrap_or(&self.entity)
    }

    /// Raw value, falling back to the resolved `"value"` key.
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        self.raw_value
            .as_deref()
            .or_else(|| self.value.get("value").and_then(serde_json::Value::as_str))
    }

    /// Start index (inclusive) of the slot value.
    #[must_use]
    pub fn start(&self) -> usize {
        self.range.as_ref().map_or(0, |range| range.start)
    }

    /// End index (exclusive) of the slot value.
    #[must_use]
    pub fn end(&self) -> usize {
        self.range.as_ref().map_or(1, |range| range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_fallbacks() {
        let slot = Slot {
            entity: "color".to_string(),
            value: serde_json::json!({ "value": "red" }),
            slot_name: None,
            raw_value: None,
            confidence: 0.9,
            range: None,
        };

        assert_eq!(slot.slot_name(), "color");
        assert_eq!(slot.raw_value(), Some("red"));
        assert_eq!(slot.start(), 0);
        assert_eq!(slot.end(), 1);
    }

    #[test]
    fn slot_wire_names_are_camel_case() {
        let json = serde_json::json!({
            "entity": "room",
            "value": { "value": "kitchen" },
            "slotName": "location",
            "rawValue": "the kitchen",
            "confidence": 1.0,
            "range": { "start": 12, "end": 23 }
        });

        let slot: Slot = serde_json::from_value(json).unwrap();
        assert_eq!(slot.slot_name(), "location");
        assert_eq!(slot.range.as_ref().unwrap().raw_start, None);
    }
}
