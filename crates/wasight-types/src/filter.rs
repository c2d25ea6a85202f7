//! The predicate set a view is filtered with.
//!
//! A `Predicates` value is replaced wholesale on every input change; the
//! fields are public so a controller can build the next value from the
//! current one with struct update syntax.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::models::Category;
use crate::time::{day_end_in, day_start_in};

/// Which chat or counterparties a view is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "keys", rename_all = "snake_case")]
pub enum Scope {
    #[default]
    All,
    One(String),
    /// An empty set matches nothing.
    Set(BTreeSet<String>),
}

impl Scope {
    pub fn admits(&self, key: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::One(k) => k == key,
            Scope::Set(keys) => keys.contains(key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn admits(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => CategoryFilter::All,
            "text" => CategoryFilter::Only(Category::Text),
            "image" | "images" => CategoryFilter::Only(Category::Image),
            "audio" => CategoryFilter::Only(Category::Audio),
            "video" | "videos" => CategoryFilter::Only(Category::Video),
            "contact" | "contacts" => CategoryFilter::Only(Category::Contact),
            "location" | "locations" => CategoryFilter::Only(Category::Location),
            "document" | "documents" => CategoryFilter::Only(Category::Document),
            "call" | "calls" => CategoryFilter::Only(Category::Call),
            other => return Err(format!("unknown category: {}", other)),
        };
        Ok(filter)
    }
}

/// Inclusive millisecond bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub const ALL: TimeRange = TimeRange {
        from: i64::MIN,
        to: i64::MAX,
    };

    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    /// The dataset extent, or the unbounded range when nothing has a timestamp.
    pub fn from_bounds(bounds: Option<(i64, i64)>) -> Self {
        bounds.map(|(from, to)| Self { from, to }).unwrap_or(Self::ALL)
    }

    /// Whole calendar days `from..=to` in the zone.
    pub fn from_days_in<Tz: TimeZone>(tz: &Tz, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: day_start_in(tz, from),
            to: day_end_in(tz, to),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::ALL
    }

    /// Rows without a timestamp only pass the unbounded range.
    pub fn contains(&self, ts: Option<i64>) -> bool {
        match ts {
            Some(ts) => self.from <= ts && ts <= self.to,
            None => self.is_unbounded(),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Predicates {
    pub scope: Scope,
    pub category: CategoryFilter,
    pub text: Option<String>,
    pub range: TimeRange,
}

impl Predicates {
    /// Predicates that admit every row.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Reset state for a view scoped to `scope`: no text, all categories,
    /// the given range.
    pub fn reset(scope: Scope, range: TimeRange) -> Self {
        Self {
            scope,
            category: CategoryFilter::All,
            text: None,
            range,
        }
    }

    /// Lowercased search needle, `None` when the text filter is bypassed.
    pub fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}
