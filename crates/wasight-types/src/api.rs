//! Request and response bodies of the HTTP display surface.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// -- Messages --

#[derive(Debug, Default, Deserialize)]
pub struct ChatSearchQuery {
    #[serde(default)]
    pub search: String,
}

/// Replaces the message predicate set. Absent dates fall back to the
/// dataset extent.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRequest {
    pub text: Option<String>,
    #[serde(default)]
    pub category: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ScrollRequest {
    pub value: i64,
    pub page_step: i64,
    pub maximum: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub chat_jid: Option<String>,
    pub chat_name: Option<String>,
    pub matched: usize,
    pub loaded: usize,
    pub can_grow: bool,
}

// -- Calls --

#[derive(Debug, Deserialize)]
pub struct StarQuery {
    pub search: Option<String>,
    pub top: Option<usize>,
}

/// Pointer input on the star diagram, in diagram coordinates.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerRequest {
    Press { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Release,
    DoubleClick,
}

// -- Locations --

#[derive(Debug, Default, Deserialize)]
pub struct ContactFilterRequest {
    #[serde(default)]
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SelectionRequest {
    Check { number: String, checked: bool },
    SelectAll,
    Clear,
}

/// Millisecond bounds for the location date-time pickers.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeRequest {
    pub from: i64,
    pub to: i64,
}
