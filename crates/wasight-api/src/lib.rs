pub mod calls;
pub mod locations;
pub mod messages;
pub mod pages;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};

use state::AppState;

/// All view routes. Layers (tracing, CORS) are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/view/{name}", get(pages::view))
        // Messages
        .route("/chats", get(messages::list_chats))
        .route("/chats/{chat_jid}/select", post(messages::select_chat))
        .route("/messages", get(messages::loaded_messages))
        .route("/messages/status", get(messages::status))
        .route("/messages/filter", post(messages::apply_filter))
        .route("/messages/filter/clear", post(messages::clear_filter))
        .route("/messages/scroll", post(messages::scroll))
        .route("/messages/{index}/open", post(messages::open_row))
        .route("/media/{row_id}/thumbnail", get(messages::thumbnail))
        // Calls
        .route("/calls/star", get(calls::star))
        .route("/calls/pointer", post(calls::pointer))
        .route("/calls/{jid}/detail", get(calls::detail))
        .route("/calls/{jid}/export", get(calls::export_csv))
        // Locations
        .route("/locations/contacts", get(locations::contacts))
        .route("/locations/contacts/filter", post(locations::filter_contacts))
        .route("/locations/selection", post(locations::selection))
        .route("/locations/range", get(locations::range).post(locations::set_range))
        .route("/locations/commands", get(locations::commands))
        .route("/locations/positions", get(locations::positions))
        .route("/locations/{id}", get(locations::detail))
        .route("/locations/{id}/highlight", post(locations::highlight))
        .route("/locations/{id}/final", post(locations::final_marker))
        .with_state(state)
}
