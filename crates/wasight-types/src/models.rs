/// Typed rows loaded from a msgstore export.
///
/// Rows are immutable once loaded; optional sub-records (media, location,
/// live share) are explicit `Option`s instead of absent columns.
use serde::{Deserialize, Serialize};

/// Message category, decoded from `message.message_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Text,
    Image,
    Audio,
    Video,
    Contact,
    Location,
    Document,
    Call,
    Other(i64),
}

impl Category {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Category::Text,
            1 => Category::Image,
            2 => Category::Audio,
            3 => Category::Video,
            4 => Category::Contact,
            5 => Category::Location,
            9 => Category::Document,
            13 => Category::Call,
            other => Category::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Category::Text => 0,
            Category::Image => 1,
            Category::Audio => 2,
            Category::Video => 3,
            Category::Contact => 4,
            Category::Location => 5,
            Category::Document => 9,
            Category::Call => 13,
            Category::Other(code) => code,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Text => "Text",
            Category::Image => "Image",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Contact => "Contact",
            Category::Location => "Location",
            Category::Document => "Document",
            Category::Call => "Call",
            Category::Other(_) => "Unknown",
        }
    }

    /// Categories whose media file can be opened with the OS handler.
    pub fn is_playable_media(self) -> bool {
        matches!(self, Category::Image | Category::Audio | Category::Video)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub path: String,
    pub name: String,
    pub caption: String,
    pub mime_type: String,
    pub size: i64,
    pub duration_secs: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// A live location share. Final coordinates mark where sharing ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveShare {
    pub duration_secs: i64,
    pub sequence_number: i64,
    pub final_latitude: Option<f64>,
    pub final_longitude: Option<f64>,
    pub final_timestamp: Option<i64>,
}

impl LiveShare {
    pub fn final_point(&self) -> Option<(f64, f64)> {
        self.final_latitude.zip(self.final_longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_name: String,
    pub place_address: String,
    pub url: String,
    pub live: Option<LiveShare>,
}

impl LocationInfo {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: i64,
    pub key_id: String,
    pub chat_jid: String,
    pub chat_name: String,
    pub sender_jid: String,
    pub from_me: bool,
    pub status: i64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: Option<i64>,
    pub category: Category,
    pub text: String,
    pub media: Option<MediaRef>,
    pub location: Option<LocationInfo>,
}

impl MessageRow {
    /// Chat subject for groups, the chat JID otherwise.
    pub fn chat_display_name(&self) -> &str {
        if self.chat_name.is_empty() {
            &self.chat_jid
        } else {
            &self.chat_name
        }
    }

    pub fn media_caption(&self) -> &str {
        self.media.as_ref().map(|m| m.caption.as_str()).unwrap_or("")
    }

    pub fn media_path(&self) -> Option<&str> {
        self.media
            .as_ref()
            .map(|m| m.path.as_str())
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    OutgoingAnswered,
    OutgoingUnanswered,
    IncomingAnswered,
    IncomingMissed,
}

impl CallOutcome {
    pub fn label(self) -> &'static str {
        match self {
            CallOutcome::OutgoingAnswered => "Outgoing answered",
            CallOutcome::OutgoingUnanswered => "Outgoing unanswered",
            CallOutcome::IncomingAnswered => "Incoming answered",
            CallOutcome::IncomingMissed => "Incoming missed",
        }
    }
}

/// `call_log.call_result` value for a call that was picked up.
pub const CALL_RESULT_ANSWERED: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRow {
    pub id: i64,
    pub counterparty: String,
    pub from_me: bool,
    pub call_id: String,
    pub timestamp: Option<i64>,
    pub duration_secs: i64,
    pub video: bool,
    pub result: i64,
    pub call_type: i64,
}

impl CallRow {
    pub fn outcome(&self) -> CallOutcome {
        let answered = self.result == CALL_RESULT_ANSWERED;
        match (self.from_me, answered) {
            (true, true) => CallOutcome::OutgoingAnswered,
            (true, false) => CallOutcome::OutgoingUnanswered,
            (false, true) => CallOutcome::IncomingAnswered,
            (false, false) => CallOutcome::IncomingMissed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    /// Row id of the message carrying the location.
    pub id: i64,
    pub counterparty: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_name: String,
    pub place_address: String,
    pub url: String,
    pub live: Option<LiveShare>,
    pub timestamp: Option<i64>,
}

impl LocationRow {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Any loaded record, tagged by entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum Row {
    Message(MessageRow),
    Call(CallRow),
    Location(LocationRow),
}

/// Field access the filter engine needs, shared by every row kind.
pub trait Record {
    fn id(&self) -> i64;
    fn timestamp(&self) -> Option<i64>;
    /// Chat JID for messages, counterparty JID for calls and locations.
    fn scope_key(&self) -> &str;
    fn category(&self) -> Category;
    fn primary_text(&self) -> &str;
    fn caption(&self) -> &str;
}

impl Record for MessageRow {
    fn id(&self) -> i64 {
        self.id
    }
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
    fn scope_key(&self) -> &str {
        &self.chat_jid
    }
    fn category(&self) -> Category {
        self.category
    }
    fn primary_text(&self) -> &str {
        &self.text
    }
    fn caption(&self) -> &str {
        self.media_caption()
    }
}

impl Record for CallRow {
    fn id(&self) -> i64 {
        self.id
    }
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
    fn scope_key(&self) -> &str {
        &self.counterparty
    }
    fn category(&self) -> Category {
        Category::Call
    }
    fn primary_text(&self) -> &str {
        &self.counterparty
    }
    fn caption(&self) -> &str {
        ""
    }
}

impl Record for LocationRow {
    fn id(&self) -> i64 {
        self.id
    }
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
    fn scope_key(&self) -> &str {
        &self.counterparty
    }
    fn category(&self) -> Category {
        Category::Location
    }
    fn primary_text(&self) -> &str {
        &self.place_name
    }
    fn caption(&self) -> &str {
        &self.place_address
    }
}

impl Record for Row {
    fn id(&self) -> i64 {
        match self {
            Row::Message(m) => m.id(),
            Row::Call(c) => c.id(),
            Row::Location(l) => l.id(),
        }
    }
    fn timestamp(&self) -> Option<i64> {
        match self {
            Row::Message(m) => m.timestamp(),
            Row::Call(c) => c.timestamp(),
            Row::Location(l) => l.timestamp(),
        }
    }
    fn scope_key(&self) -> &str {
        match self {
            Row::Message(m) => m.scope_key(),
            Row::Call(c) => c.scope_key(),
            Row::Location(l) => l.scope_key(),
        }
    }
    fn category(&self) -> Category {
        match self {
            Row::Message(m) => m.category(),
            Row::Call(c) => c.category(),
            Row::Location(l) => l.category(),
        }
    }
    fn primary_text(&self) -> &str {
        match self {
            Row::Message(m) => m.primary_text(),
            Row::Call(c) => c.primary_text(),
            Row::Location(l) => l.primary_text(),
        }
    }
    fn caption(&self) -> &str {
        match self {
            Row::Message(m) => Record::caption(m),
            Row::Call(c) => Record::caption(c),
            Row::Location(l) => Record::caption(l),
        }
    }
}
