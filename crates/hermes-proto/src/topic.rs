//! Topic templates for Hermes messages.
//!
//! Every message kind declares a topic template such as
//! `hermes/hotword/{wakeword_id}/detected`. A compiled [`TopicTemplate`]
//! renders concrete publish topics, builds MQTT subscription patterns
//! (missing placeholders become wildcards), and extracts placeholder values
//! back out of observed topics.

use std::collections::HashMap;

/// One level of a topic template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    /// Fixed topic level, matched verbatim.
    Literal(&'static str),
    /// Named placeholder, matches exactly one non-empty level.
    Placeholder(&'static str),
}

/// A compiled topic template.
#[derive(Debug, Clone)]
pub struct TopicTemplate {
    template: &'static str,
    segments: Vec<Segment>,
}

impl TopicTemplate {
    /// Compile a template string.
    ///
    /// Placeholders are written as `{name}` and must span a whole topic
    /// level; everything else is matched verbatim.
    #[must_use]
    pub fn parse(template: &'static str) -> Self {
        let segments = template
            .split('/')
            .map(|part| {
                part.strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                    .map_or(Segment::Literal(part), Segment::Placeholder)
            })
            .collect();

        Self { template, segments }
    }

    /// The raw template string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.template
    }

    /// True if the template declares a placeholder with this name.
    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Placeholder(n) if *n == name))
    }

    /// Render a concrete publish topic.
    ///
    /// # Errors
    ///
    /// Returns [`TopicError::InvalidParameters`] if any placeholder is
    /// missing from `args`; a publish topic must not contain wildcards.
    pub fn render(&self, args: &TopicArgs) -> Result<String, TopicError> {
        let mut levels = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => levels.push((*text).to_string()),
                Segment::Placeholder(name) => match args.get(name) {
                    Some(value) => levels.push(value.to_string()),
                    None => {
                        return Err(TopicError::InvalidParameters {
                            template: self.template,
                            name,
                        })
                    }
                },
            }
        }

        Ok(levels.join("/"))
    }

    /// Build an MQTT subscription pattern.
    ///
    /// Placeholders present in `args` are substituted; missing ones render
    /// as `+` mid-path and `#` in the final position.
    #[must_use]
    pub fn subscription(&self, args: &TopicArgs) -> String {
        let last = self.segments.len() - 1;
        let levels: Vec<&str> = self
            .segments
            .iter()
            .enumerate()
            .map(|(index, segment)| match segment {
                Segment::Literal(text) => *text,
                Segment::Placeholder(name) => args.get(name).unwrap_or({
                    if index == last {
                        "#"
                    } else {
                        "+"
                    }
                }),
            })
            .collect();

        levels.join("/")
    }

    /// True if a concrete topic string is an instance of this template.
    ///
    /// Wildcard topics are not instances; a placeholder matches exactly one
    /// non-empty level.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        let levels: Vec<&str> = topic.split('/').collect();
        if levels.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&levels)
            .all(|(segment, level)| match segment {
                Segment::Literal(text) => text == level,
                Segment::Placeholder(_) => !level.is_empty(),
            })
    }

    /// Extract the value bound to a named placeholder from an observed
    /// topic, or `None` if the topic does not match or the template has no
    /// such placeholder.
    #[must_use]
    pub fn extract<'t>(&self, topic: &'t str, name: &str) -> Option<&'t str> {
        if !self.matches(topic) {
            return None;
        }

        self.segments
            .iter()
            .zip(topic.split('/'))
            .find_map(|(segment, level)| match segment {
                Segment::Placeholder(n) if *n == name => Some(level),
                _ => None,
            })
    }

    /// True if the two templates can both match some concrete topic.
    ///
    /// Used to reject ambiguous registrations: with overlapping templates
    /// the dispatch result would depend on registration order.
    #[must_use]
    pub fn overlaps(&self, other: &TopicTemplate) -> bool {
        if self.segments.len() != other.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| match (a, b) {
                (Segment::Literal(x), Segment::Literal(y)) => x == y,
                _ => true,
            })
    }
}

/// Named values for topic placeholders.
#[derive(Debug, Clone, Default)]
pub struct TopicArgs {
    values: HashMap<String, String>,
}

impl TopicArgs {
    /// Create an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a placeholder value, consuming and returning `self`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add a placeholder value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a placeholder value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Errors for topic rendering.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TopicError {
    /// A publish topic was rendered without a required placeholder value.
    #[error("missing value for placeholder '{{{name}}}' in {template}")]
    InvalidParameters {
        /// The template being rendered
        template: &'static str,
        /// The missing placeholder name
        name: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_placeholders() {
        let template = TopicTemplate::parse("hermes/hotword/{wakeword_id}/detected");
        let topic = template
            .render(&TopicArgs::new().with("wakeword_id", "porcupine"))
            .unwrap();

        assert_eq!(topic, "hermes/hotword/porcupine/detected");
    }

    #[test]
    fn render_fails_without_required_placeholder() {
        let template = TopicTemplate::parse("hermes/intent/{intent_name}");
        let err = template.render(&TopicArgs::new()).unwrap_err();

        assert!(matches!(
            err,
            TopicError::InvalidParameters {
                name: "intent_name",
                ..
            }
        ));
    }

    #[test]
    fn subscription_wildcards_by_position() {
        let template =
            TopicTemplate::parse("hermes/audioServer/{site_id}/playBytes/{request_id}");

        assert_eq!(
            template.subscription(&TopicArgs::new()),
            "hermes/audioServer/+/playBytes/#"
        );
        assert_eq!(
            template.subscription(&TopicArgs::new().with("site_id", "kitchen")),
            "hermes/audioServer/kitchen/playBytes/#"
        );
    }

    #[test]
    fn matches_and_extract_roundtrip() {
        let template = TopicTemplate::parse("hermes/hotword/{wakeword_id}/detected");
        let topic = "hermes/hotword/porcupine/detected";

        assert!(template.matches(topic));
        assert_eq!(template.extract(topic, "wakeword_id"), Some("porcupine"));
        assert_eq!(template.extract(topic, "site_id"), None);
    }

    #[test]
    fn placeholder_matches_exactly_one_level() {
        let template = TopicTemplate::parse("hermes/audioServer/{site_id}/audioFrame");

        assert!(template.matches("hermes/audioServer/kitchen/audioFrame"));
        assert!(!template.matches("hermes/audioServer/a/b/audioFrame"));
        assert!(!template.matches("hermes/audioServer//audioFrame"));
        assert!(!template.matches("hermes/audioServer/kitchen/audioSessionFrame"));
    }

    #[test]
    fn fixed_template_matches_itself_only() {
        let template = TopicTemplate::parse("hermes/nlu/query");

        assert!(template.matches("hermes/nlu/query"));
        assert!(!template.matches("hermes/nlu/query/extra"));
        assert!(template.render(&TopicArgs::new()).is_ok());
    }

    #[test]
    fn overlapping_templates_detected() {
        let generic = TopicTemplate::parse("hermes/audioServer/{site_id}/audioFrame");
        let shadow = TopicTemplate::parse("hermes/audioServer/{other}/audioFrame");
        let session = TopicTemplate::parse("hermes/audioServer/{site_id}/{session_id}/audioSessionFrame");

        assert!(generic.overlaps(&shadow));
        assert!(!generic.overlaps(&session));
    }
}
