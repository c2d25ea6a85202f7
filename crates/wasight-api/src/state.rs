use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::StatusCode;
use tracing::error;

use wasight_view::calls::CallController;
use wasight_view::layout::{MonospaceMeasure, Renderer};
use wasight_view::locations::LocationController;
use wasight_view::messages::MessageController;
use wasight_view::open::Opener;

/// Glyph metrics the browser page renders message bubbles with.
pub const BODY_METRICS: MonospaceMeasure = MonospaceMeasure {
    char_width: 8,
    line_height: 18,
};
pub const SMALL_METRICS: MonospaceMeasure = MonospaceMeasure {
    char_width: 7,
    line_height: 14,
};

pub type AppState = Arc<AppStateInner>;

/// One controller per view. Each view is a single-user session, so a
/// plain mutex per controller is enough.
pub struct AppStateInner {
    pub messages: Mutex<MessageController>,
    pub renderer: Mutex<Renderer<MonospaceMeasure>>,
    pub calls: Mutex<CallController>,
    pub locations: Mutex<LocationController>,
    pub opener: Arc<dyn Opener + Send + Sync>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StatusCode> {
    mutex.lock().map_err(|_| {
        error!("View state lock poisoned");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
