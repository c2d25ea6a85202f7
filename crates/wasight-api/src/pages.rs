use axum::{extract::Path, http::StatusCode, response::Html};

const INDEX: &str = include_str!("../assets/index.html");
const MESSAGES: &str = include_str!("../assets/messages.html");
const CALLS: &str = include_str!("../assets/calls.html");
const MAP: &str = include_str!("../assets/map.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX)
}

pub async fn view(Path(name): Path<String>) -> Result<Html<&'static str>, StatusCode> {
    match name.as_str() {
        "messages" => Ok(Html(MESSAGES)),
        "calls" => Ok(Html(CALLS)),
        "map" => Ok(Html(MAP)),
        _ => Err(StatusCode::NOT_FOUND),
    }
}
