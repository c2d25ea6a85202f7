//! Interaction controller for the chat/message viewer.

use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use wasight_types::api::SessionStatus;
use wasight_types::{
    Category, CategoryFilter, ConversationSummary, MessageRow, Predicates, Scope, Table, TimeRange,
};

use crate::filter::{apply, search_summaries, summarize};
use crate::media::MediaRoot;
use crate::open::Effect;
use crate::paging::{PageError, Pager};

/// Pixels from the bottom at which scrolling loads the next batch.
pub const SCROLL_THRESHOLD: i64 = 50;

pub fn openstreetmap_url(lat: f64, lon: f64) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=15/{lat}/{lon}",
        lat = lat,
        lon = lon
    )
}

pub struct MessageController {
    table: Arc<Table<MessageRow>>,
    summaries: Vec<ConversationSummary>,
    visible_chats: Vec<ConversationSummary>,
    selected: Option<ConversationSummary>,
    predicates: Predicates,
    extent: TimeRange,
    pager: Pager<MessageRow>,
    media: MediaRoot,
}

impl MessageController {
    pub fn new(table: Arc<Table<MessageRow>>, media: MediaRoot, batch_size: usize) -> Self {
        let summaries = summarize(table.rows());
        let extent = TimeRange::from_bounds(table.timestamp_bounds());
        Self {
            visible_chats: summaries.clone(),
            summaries,
            selected: None,
            predicates: Predicates::reset(Scope::All, extent),
            extent,
            table,
            pager: Pager::new(batch_size),
            media,
        }
    }

    pub fn table(&self) -> &Table<MessageRow> {
        &self.table
    }

    /// Conversation list after the chat search.
    pub fn chats(&self) -> &[ConversationSummary] {
        &self.visible_chats
    }

    pub fn search_chats(&mut self, text: &str) -> &[ConversationSummary] {
        self.visible_chats = search_summaries(&self.summaries, text);
        &self.visible_chats
    }

    pub fn selected(&self) -> Option<&ConversationSummary> {
        self.selected.as_ref()
    }

    pub fn predicates(&self) -> &Predicates {
        &self.predicates
    }

    /// Full timestamp extent of the loaded table.
    pub fn extent(&self) -> TimeRange {
        self.extent
    }

    pub fn pager(&self) -> &Pager<MessageRow> {
        &self.pager
    }

    /// Select a chat, rebind its rows and reset the filters. Unknown chats
    /// leave the current state alone.
    pub fn select_chat(&mut self, chat_jid: &str) -> bool {
        let Some(summary) = self.summaries.iter().find(|s| s.chat_jid == chat_jid) else {
            return false;
        };
        debug!("Selected chat {}", chat_jid);
        self.selected = Some(summary.clone());
        self.clear_filters();
        true
    }

    pub fn set_text(&mut self, text: &str) {
        let text = Some(text.to_string()).filter(|t| !t.is_empty());
        self.replace_predicates(Predicates {
            text,
            ..self.predicates.clone()
        });
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.replace_predicates(Predicates {
            category,
            ..self.predicates.clone()
        });
    }

    pub fn set_range(&mut self, range: TimeRange) {
        self.replace_predicates(Predicates {
            range,
            ..self.predicates.clone()
        });
    }

    /// Replace text, category and range in one step.
    pub fn set_filters(&mut self, text: Option<String>, category: CategoryFilter, range: TimeRange) {
        self.replace_predicates(Predicates {
            scope: self.predicates.scope.clone(),
            category,
            text: text.filter(|t| !t.is_empty()),
            range,
        });
    }

    pub fn clear_filters(&mut self) {
        let scope = self.scope();
        self.replace_predicates(Predicates::reset(scope, self.extent));
    }

    fn scope(&self) -> Scope {
        match &self.selected {
            Some(s) => Scope::One(s.chat_jid.clone()),
            None => Scope::All,
        }
    }

    fn replace_predicates(&mut self, predicates: Predicates) {
        self.predicates = predicates;
        self.refilter();
    }

    /// Re-run the filter for the selected chat and expose the first batch.
    fn refilter(&mut self) {
        if self.selected.is_none() {
            self.pager.unbind();
            return;
        }
        let view = apply(self.table.rows(), &self.predicates);
        self.pager.bind(view);
        self.pager.grow();
    }

    pub fn grow(&mut self) -> Range<usize> {
        self.pager.grow()
    }

    /// Scrollbar moved; grows when the viewport is near the bottom.
    /// Values come from the client and are not trusted to stay in range.
    pub fn on_scroll(&mut self, value: i64, page_step: i64, maximum: i64) -> Range<usize> {
        let near_bottom = value.saturating_add(page_step) >= maximum.saturating_sub(SCROLL_THRESHOLD);
        if self.pager.can_grow() && near_bottom {
            self.pager.grow()
        } else {
            0..0
        }
    }

    /// Effect for a double-click on a loaded row, if it has one.
    pub fn on_double_click(&self, index: usize) -> Result<Option<Effect>, PageError> {
        let row = self.pager.row_at(index)?;
        Ok(self.effect_for(row))
    }

    fn effect_for(&self, row: &MessageRow) -> Option<Effect> {
        if row.category == Category::Location {
            let (lat, lon) = row.location.as_ref()?.coordinates()?;
            return Some(Effect::OpenUrl(openstreetmap_url(lat, lon)));
        }
        if row.category.is_playable_media() {
            let path = self.media.existing(row.media_path()?)?;
            return Some(Effect::OpenFile(path));
        }
        None
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            chat_jid: self.selected.as_ref().map(|s| s.chat_jid.clone()),
            chat_name: self.selected.as_ref().map(|s| s.display_name.clone()),
            matched: self.pager.total(),
            loaded: self.pager.loaded(),
            can_grow: self.pager.can_grow(),
        }
    }
}
