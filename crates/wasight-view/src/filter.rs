use std::collections::HashMap;

use tracing::debug;

use wasight_types::time::format_timestamp;
use wasight_types::{ConversationSummary, MessageRow, Predicates, Record};

/// Rows of `rows` passing every predicate, sorted by timestamp ascending.
///
/// Order of checks: scope, category, text, time range. The sort is stable,
/// so rows with equal timestamps keep their load order; rows without a
/// timestamp sort first.
pub fn apply<R: Record + Clone>(rows: &[R], predicates: &Predicates) -> Vec<R> {
    let needle = predicates.needle();

    let mut out: Vec<R> = rows
        .iter()
        .filter(|r| predicates.scope.admits(r.scope_key()))
        .filter(|r| predicates.category.admits(r.category()))
        .filter(|r| match &needle {
            Some(n) => contains_ignore_case(r.primary_text(), n) || contains_ignore_case(r.caption(), n),
            None => true,
        })
        .filter(|r| predicates.range.contains(r.timestamp()))
        .cloned()
        .collect();

    out.sort_by_key(|r| r.timestamp());
    debug!("Filter kept {} of {} rows", out.len(), rows.len());
    out
}

/// Case-insensitive substring test; `needle` must already be lowercase.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if haystack.is_ascii() && needle.is_ascii() {
        let h = haystack.as_bytes();
        let n = needle.as_bytes();
        return n.len() <= h.len()
            && h.windows(n.len()).any(|w| w.iter().zip(n).all(|(a, b)| a.to_ascii_lowercase() == *b));
    }
    haystack.to_lowercase().contains(needle)
}

/// One summary per chat JID taken from its most recent message, most
/// recent chat first. Among equal timestamps the earliest loaded row wins.
pub fn summarize(rows: &[MessageRow]) -> Vec<ConversationSummary> {
    let mut latest: HashMap<&str, &MessageRow> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for row in rows {
        match latest.get(row.chat_jid.as_str()) {
            Some(current) if current.timestamp >= row.timestamp => {}
            Some(_) => {
                latest.insert(&row.chat_jid, row);
            }
            None => {
                order.push(&row.chat_jid);
                latest.insert(&row.chat_jid, row);
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = order
        .into_iter()
        .map(|jid| {
            let row = latest[jid];
            ConversationSummary {
                chat_jid: row.chat_jid.clone(),
                display_name: row.chat_display_name().to_string(),
                last_text: row.text.clone(),
                last_timestamp: row.timestamp,
                display_timestamp: row.timestamp.and_then(format_timestamp),
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.last_timestamp.cmp(&a.last_timestamp));
    summaries
}

/// Summaries whose display name contains `search`, ignoring case.
pub fn search_summaries(summaries: &[ConversationSummary], search: &str) -> Vec<ConversationSummary> {
    let needle = search.trim().to_lowercase();
    summaries
        .iter()
        .filter(|s| contains_ignore_case(&s.display_name, &needle))
        .cloned()
        .collect()
}
