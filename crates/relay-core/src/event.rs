use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A single piece of multi-part content. Parts without text (for example
/// function calls) carry `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Text carried by this part, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// A part carrying `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// A part with no text.
    pub fn empty() -> Self {
        Self { text: None }
    }
}

/// The content of an [`AgentEvent`].
///
/// Runtimes report the same semantic output in different record layouts. Each
/// layout is one variant. A record may carry more than one of the fields;
/// deserialization keeps the first of `parts`, `content`, `text` that yields
/// non-empty text, falling back to the first field present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventContent {
    /// `{parts: [{text?}, ...]}`, the standard multi-part layout.
    Parts {
        /// Ordered content parts.
        parts: Vec<Part>,
        /// Author role reported by the runtime (`model`, `user`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
    },
    /// `{content: "..."}`, a chat-completion style message.
    Message {
        /// The whole message text.
        content: String,
    },
    /// `{text: "..."}`, bare text.
    Text {
        /// The whole text.
        text: String,
    },
}

/// Content as it arrives on the wire, before a layout is chosen.
#[derive(Debug, Deserialize)]
struct RawContent {
    parts: Option<Vec<Part>>,
    role: Option<String>,
    content: Option<String>,
    text: Option<String>,
}

impl<'de> Deserialize<'de> for EventContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawContent::deserialize(deserializer).map(Self::from)
    }
}

impl From<RawContent> for EventContent {
    fn from(raw: RawContent) -> Self {
        let RawContent {
            parts,
            role,
            content,
            text,
        } = raw;

        let candidates = [
            parts.map(|parts| Self::Parts { parts, role }),
            content.map(|content| Self::Message { content }),
            text.map(|text| Self::Text { text }),
        ];

        let mut first_present = None;
        for candidate in candidates.into_iter().flatten() {
            if !candidate.extract_text().is_empty() {
                return candidate;
            }
            first_present.get_or_insert(candidate);
        }

        // Nothing carried text: keep the highest-priority layout that was there.
        first_present.unwrap_or(Self::Parts {
            parts: Vec::new(),
            role: None,
        })
    }
}

impl EventContent {
    /// Parts-shaped content from a list of parts, authored by the model.
    pub fn parts(parts: Vec<Part>) -> Self {
        Self::Parts {
            parts,
            role: Some("model".to_string()),
        }
    }

    /// Extract the plain text carried by this content.
    ///
    /// Parts are concatenated in order, skipping parts without text.
    pub fn extract_text(&self) -> String {
        match self {
            Self::Parts { parts, .. } => parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .filter(|text| !text.is_empty())
                .collect(),
            Self::Message { content } => content.clone(),
            Self::Text { text } => text.clone(),
        }
    }

    /// Short name of the layout, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Parts { .. } => "parts",
            Self::Message { .. } => "message",
            Self::Text { .. } => "text",
        }
    }
}

/// One event emitted by an agent runtime during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Runtime-assigned event identifier.
    #[serde(default = "new_event_id")]
    pub id: String,
    /// Name of the agent (or `user`) that produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// What the event carries, if anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<EventContent>,
    /// `true` for an incremental streaming chunk, `false` for a final result.
    #[serde(default)]
    pub partial: bool,
}

fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}

impl AgentEvent {
    /// Creates an event with the given content and partial flag.
    pub fn new(content: Option<EventContent>, partial: bool) -> Self {
        Self {
            id: new_event_id(),
            author: None,
            content,
            partial,
        }
    }

    /// An incremental chunk carrying `text` in a single part.
    pub fn partial_text(text: impl Into<String>) -> Self {
        Self::new(Some(EventContent::parts(vec![Part::text(text)])), true)
    }

    /// A final, aggregated event carrying `text` in a single part.
    pub fn final_text(text: impl Into<String>) -> Self {
        Self::new(Some(EventContent::parts(vec![Part::text(text)])), false)
    }

    /// Sets the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Plain text carried by this event; empty when there is no content.
    pub fn text(&self) -> String {
        self.content
            .as_ref()
            .map(EventContent::extract_text)
            .unwrap_or_default()
    }
}
