use serde::{Deserialize, Serialize};

/// One entry of the conversation list: the most recent message of a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub chat_jid: String,
    pub display_name: String,
    pub last_text: String,
    pub last_timestamp: Option<i64>,
    pub display_timestamp: Option<String>,
}
