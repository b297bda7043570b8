use serde::{Deserialize, Serialize};

/// Platform-neutral message body. The Discord notifier renders it as a single
/// embed; `to_plain_text` is used for logs and plain-text fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<ContentField>,
    pub footer: Option<String>,
    /// Stamp the message with the send/edit time.
    pub timestamped: bool,
    /// Text file sent alongside the message, for payloads too large for fields.
    pub attachment: Option<ContentAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAttachment {
    pub filename: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl MessageContent {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(ContentField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn timestamped(mut self) -> Self {
        self.timestamped = true;
        self
    }

    pub fn attach(mut self, filename: impl Into<String>, body: impl Into<String>) -> Self {
        self.attachment = Some(ContentAttachment {
            filename: filename.into(),
            body: body.into(),
        });
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn to_plain_text(&self) -> String {
        let mut out = Vec::new();
        if let Some(t) = &self.title {
            out.push(t.clone());
        }
        if let Some(d) = &self.description {
            out.push(d.clone());
        }
        for f in &self.fields {
            out.push(format!("{}: {}", f.name, f.value));
        }
        if let Some(ft) = &self.footer {
            out.push(ft.clone());
        }
        if let Some(a) = &self.attachment {
            out.push(format!("[{}]", a.filename));
        }
        out.join("\n")
    }
}

/// Where a notifier should deliver content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// Private message to a user ID.
    User(String),
    /// Public message in a channel ID.
    Channel(String),
}

/// Identifies a message the notifier just sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub channel_id: String,
    pub message_id: String,
}
