use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use wasight_api::router;
use wasight_api::state::{AppStateInner, BODY_METRICS, SMALL_METRICS};
use wasight_types::{
    CallRow, Category, LiveShare, LocationInfo, LocationRow, MediaRef, MessageRow, Table,
};
use wasight_view::calls::CallController;
use wasight_view::layout::Renderer;
use wasight_view::locations::LocationController;
use wasight_view::media::MediaRoot;
use wasight_view::messages::MessageController;
use wasight_view::open::{Effect, Opener};

const T0: i64 = 1_700_000_000_000;

#[derive(Default)]
struct RecordingOpener(Mutex<Vec<Effect>>);

impl Opener for RecordingOpener {
    fn open(&self, effect: &Effect) -> io::Result<()> {
        self.0.lock().unwrap().push(effect.clone());
        Ok(())
    }
}

fn message(id: i64, chat: &str, ts: i64, category: Category, text: &str) -> MessageRow {
    MessageRow {
        id,
        key_id: format!("k{}", id),
        chat_jid: chat.into(),
        chat_name: String::new(),
        sender_jid: String::new(),
        from_me: false,
        status: 0,
        timestamp: Some(ts),
        category,
        text: text.into(),
        media: None,
        location: None,
    }
}

fn messages() -> Vec<MessageRow> {
    let mut place = message(2, "a@s", T0 + 2_000, Category::Location, "");
    place.location = Some(LocationInfo {
        latitude: Some(-17.78),
        longitude: Some(-63.18),
        place_name: "Plaza".into(),
        place_address: String::new(),
        url: String::new(),
        live: None,
    });
    let mut image = message(3, "a@s", T0 + 3_000, Category::Image, "");
    image.media = Some(MediaRef {
        path: "Media/WhatsApp Images/missing.jpg".into(),
        name: String::new(),
        caption: String::new(),
        mime_type: "image/jpeg".into(),
        size: 0,
        duration_secs: 0,
        width: None,
        height: None,
    });
    vec![
        message(1, "a@s", T0 + 1_000, Category::Text, "hello there"),
        place,
        image,
        message(4, "b@s", T0 + 4_000, Category::Text, "bye"),
    ]
}

fn call(id: i64, jid: &str, from_me: bool, result: i64) -> CallRow {
    CallRow {
        id,
        counterparty: jid.into(),
        from_me,
        call_id: format!("c{}", id),
        timestamp: Some(T0 + id),
        duration_secs: 42,
        video: false,
        result,
        call_type: 0,
    }
}

fn location(id: i64, number: &str, ts: i64, live: Option<LiveShare>) -> LocationRow {
    LocationRow {
        id,
        counterparty: number.into(),
        latitude: Some(10.0 + id as f64),
        longitude: Some(20.0),
        place_name: String::new(),
        place_address: String::new(),
        url: String::new(),
        live,
        timestamp: Some(ts),
    }
}

/// The router plus its (empty) media root, which must outlive the router.
fn app(opener: Arc<RecordingOpener>) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (router_with_media(opener, dir.path()), dir)
}

fn router_with_media(opener: Arc<RecordingOpener>, media_dir: &Path) -> Router {
    let media = MediaRoot::new(media_dir);
    let messages = Arc::new(Table::new(messages()));
    let calls = Arc::new(Table::new(vec![
        call(1, "ana@s", true, 5),
        call(2, "ana@s", false, 0),
        call(3, "bob@s", false, 5),
    ]));
    let live = LiveShare {
        duration_secs: 300,
        sequence_number: 1,
        final_latitude: Some(1.5),
        final_longitude: Some(2.5),
        final_timestamp: Some(T0 + 9_000),
    };
    let locations = Arc::new(Table::new(vec![
        location(1, "ana@s", T0, None),
        location(2, "ana@s", T0 + 1_000, Some(live)),
        location(3, "bob@s", T0 + 2_000, None),
    ]));

    let state = Arc::new(AppStateInner {
        messages: Mutex::new(MessageController::new(messages, media.clone(), 2)),
        renderer: Mutex::new(Renderer::new(BODY_METRICS, SMALL_METRICS, media)),
        calls: Mutex::new(CallController::new(calls, "me@s", 10)),
        locations: Mutex::new(LocationController::new(locations)),
        opener,
    });
    router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, bytes)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn pages_are_served() {
    let (app, _media) = app(Arc::default());
    assert_eq!(send(&app, "GET", "/", None).await.0, StatusCode::OK);
    assert_eq!(send(&app, "GET", "/view/map", None).await.0, StatusCode::OK);
    assert_eq!(send(&app, "GET", "/view/nope", None).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_list_and_selection() {
    let (app, _media) = app(Arc::default());
    let (status, chats) = send_json(&app, "GET", "/chats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chats[0]["chat_jid"], "b@s");
    assert_eq!(chats.as_array().unwrap().len(), 2);

    let (_, found) = send_json(&app, "GET", "/chats?search=A%40", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, _) = send_json(&app, "POST", "/chats/zz%40s/select", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, session) = send_json(&app, "POST", "/chats/a%40s/select", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["matched"], 3);
    assert_eq!(session["loaded"], 2);
    assert_eq!(session["can_grow"], true);
}

#[tokio::test]
async fn filters_scroll_and_render() {
    let (app, _media) = app(Arc::default());
    send(&app, "POST", "/chats/a%40s/select", None).await;

    let (status, session) = send_json(
        &app,
        "POST",
        "/messages/filter",
        Some(json!({ "text": "HELLO", "category": "all" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["matched"], 1);

    let (status, _) = send_json(
        &app,
        "POST",
        "/messages/filter",
        Some(json!({ "category": "stickers" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/messages/filter",
        Some(json!({ "from": "2024-02-01", "to": "2024-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, session) = send_json(&app, "POST", "/messages/filter/clear", None).await;
    assert_eq!(session["matched"], 3);

    let (_, scrolled) = send_json(
        &app,
        "POST",
        "/messages/scroll",
        Some(json!({ "value": 400, "page_step": 300, "maximum": 700 })),
    )
    .await;
    assert_eq!(scrolled["start"], 2);
    assert_eq!(scrolled["end"], 3);
    assert_eq!(scrolled["status"]["can_grow"], false);

    let (status, rows) = send_json(&app, "GET", "/messages?width=400", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["plan"]["body"], "hello there");
    assert_eq!(rows[0]["ops"][0]["op"], "bubble");
    // Rows are stacked: the second bubble starts below the first row.
    let first_height = rows[0]["plan"]["height"].as_u64().unwrap();
    assert!(rows[1]["ops"][0]["rect"]["y"].as_u64().unwrap() >= first_height);
    // Image without a decodable file has neither thumbnail nor button.
    assert_eq!(rows[2]["plan"]["thumbnail"], Value::Null);
    assert_eq!(rows[2]["plan"]["action"], Value::Null);
}

#[tokio::test]
async fn extreme_scroll_values_leave_the_session_usable() {
    let (app, _media) = app(Arc::default());
    send(&app, "POST", "/chats/a%40s/select", None).await;

    let (status, scrolled) = send_json(
        &app,
        "POST",
        "/messages/scroll",
        Some(json!({ "value": i64::MAX, "page_step": 10, "maximum": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scrolled["end"], 3);

    let (status, _) = send_json(
        &app,
        "POST",
        "/messages/scroll",
        Some(json!({ "value": 0, "page_step": 0, "maximum": i64::MIN })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, session) = send_json(&app, "GET", "/messages/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["loaded"], 3);
}

#[tokio::test]
async fn double_click_runs_effects() {
    let opener = Arc::new(RecordingOpener::default());
    let (app, _media) = app(opener.clone());
    send(&app, "POST", "/chats/a%40s/select", None).await;

    let (status, _) = send(&app, "POST", "/messages/0/open", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, effect) = send_json(&app, "POST", "/messages/1/open", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(effect["type"], "open_url");
    assert_eq!(
        effect["target"],
        "https://www.openstreetmap.org/?mlat=-17.78&mlon=-63.18#map=15/-17.78/-63.18"
    );
    assert_eq!(opener.0.lock().unwrap().len(), 1);

    // Only two rows are loaded so far.
    let (status, _) = send(&app, "POST", "/messages/2/open", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/media/3/thumbnail", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn star_diagram_drag_and_detail() {
    let (app, _media) = app(Arc::default());
    let (status, star) = send_json(&app, "GET", "/calls/star", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(star["nodes"][0]["jid"], "ana@s");
    assert_eq!(star["nodes"][0]["total_calls"], 2);

    let (x, y) = (
        star["nodes"][0]["x"].as_f64().unwrap(),
        star["nodes"][0]["y"].as_f64().unwrap(),
    );
    let (_, pressed) = send_json(&app, "POST", "/calls/pointer", Some(json!({ "type": "press", "x": x, "y": y }))).await;
    assert_eq!(pressed["selected"], "ana@s");
    assert_eq!(pressed["dragging"], true);

    let (_, moved) = send_json(
        &app,
        "POST",
        "/calls/pointer",
        Some(json!({ "type": "move", "x": x + 1.0, "y": y })),
    )
    .await;
    let new_x = moved["diagram"]["nodes"][0]["x"].as_f64().unwrap();
    assert!((new_x - (x + 1.0)).abs() < 1e-9);

    send(&app, "POST", "/calls/pointer", Some(json!({ "type": "release" }))).await;
    let (_, clicked) = send_json(&app, "POST", "/calls/pointer", Some(json!({ "type": "double_click" }))).await;
    assert_eq!(clicked["detail"]["columns"], json!(["date", "time", "call_type", "duration"]));
    assert_eq!(clicked["detail"]["rows"][1][2], "Incoming missed");

    let (status, _) = send(&app, "GET", "/calls/zz%40s/detail", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, csv) = send(&app, "GET", "/calls/bob%40s/export", None).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.starts_with("date,time,call_type,duration\n"));
    assert!(csv.contains("Incoming answered,42"));
}

#[tokio::test]
async fn location_selection_produces_map_commands() {
    let (app, _media) = app(Arc::default());
    let (_, contacts) = send_json(&app, "GET", "/locations/contacts", None).await;
    assert_eq!(contacts[0]["number"], "ana@s");
    assert_eq!(contacts[0]["count"], 2);

    let (_, commands) = send_json(&app, "GET", "/locations/commands", None).await;
    assert_eq!(commands, json!([{ "command": "clear" }]));

    let (status, _) = send(
        &app,
        "POST",
        "/locations/selection",
        Some(json!({ "action": "check", "number": "nobody", "checked": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, commands) = send_json(
        &app,
        "POST",
        "/locations/selection",
        Some(json!({ "action": "check", "number": "ana@s", "checked": true })),
    )
    .await;
    let commands = commands.as_array().unwrap();
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[1]["command"], "add_marker");
    assert_eq!(commands[2]["live"], "final");

    let (_, positions) = send_json(&app, "GET", "/locations/positions", None).await;
    assert_eq!(positions[0]["place"], "Unnamed");

    let (_, highlight) = send_json(&app, "POST", "/locations/1/highlight", None).await;
    assert_eq!(highlight["command"], "highlight");

    let (_, detail) = send_json(&app, "GET", "/locations/2", None).await;
    assert_eq!(detail["live"], true);
    assert_eq!(detail["duration_secs"], 300);

    let (_, marker) = send_json(&app, "POST", "/locations/2/final", None).await;
    assert_eq!(marker["id"], 999_999);
    assert_eq!(send(&app, "POST", "/locations/1/final", None).await.0, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/locations/range", Some(json!({ "from": 5, "to": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, commands) = send_json(
        &app,
        "POST",
        "/locations/range",
        Some(json!({ "from": T0 + 500, "to": T0 + 5_000 })),
    )
    .await;
    assert_eq!(commands.as_array().unwrap().len(), 2);

    let (_, range) = send_json(&app, "GET", "/locations/range", None).await;
    assert_eq!(range["extent"]["from"], T0);
}

#[tokio::test]
async fn contact_filter_is_a_separate_write() {
    let (app, _media) = app(Arc::default());
    send(&app, "POST", "/locations/selection", Some(json!({ "action": "select_all" }))).await;

    // Reading the list never narrows it.
    for _ in 0..2 {
        let (status, contacts) = send_json(&app, "GET", "/locations/contacts?filter=an", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(contacts.as_array().unwrap().len(), 2);
    }
    let (_, commands) = send_json(&app, "GET", "/locations/commands", None).await;
    assert_eq!(commands.as_array().unwrap().len(), 4);

    let (status, contacts) = send_json(
        &app,
        "POST",
        "/locations/contacts/filter",
        Some(json!({ "filter": "AN" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let contacts = contacts.as_array().unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["number"], "ana@s");
    assert_eq!(contacts[0]["checked"], true);

    // bob@s was filtered out, so its markers are gone.
    let (_, commands) = send_json(&app, "GET", "/locations/commands", None).await;
    assert_eq!(commands.as_array().unwrap().len(), 3);
}
