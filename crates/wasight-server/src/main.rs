mod config;
mod launch;
mod terminal;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use wasight_api::state::{AppState, AppStateInner, BODY_METRICS, SMALL_METRICS};
use wasight_db::MsgStore;
use wasight_types::{CategoryFilter, TimeRange};
use wasight_view::calls::CallController;
use wasight_view::layout::{Rect, Renderer};
use wasight_view::locations::LocationController;
use wasight_view::media::MediaRoot;
use wasight_view::messages::MessageController;
use wasight_view::open::SystemOpener;

use config::Config;
use launch::View;
use terminal::{TERMINAL_METRICS, TextCanvas};

#[derive(Parser, Debug)]
#[command(name = "wasight", version)]
#[command(about = "Browse a WhatsApp msgstore export: chats, call diagram and location map")]
struct Cli {
    /// SQLite export to read (overrides WASIGHT_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Media directory (overrides WASIGHT_MEDIA_ROOT)
    #[arg(long, global = true)]
    media: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Serve the three views over HTTP (default)
    Serve,
    /// List conversations, most recent first
    Chats {
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Print the messages of one chat as bubbles
    Chat {
        jid: String,
        #[arg(short, long)]
        text: Option<String>,
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(short, long, default_value_t = 80)]
        width: u32,
        /// Print every match instead of the first batch
        #[arg(long)]
        all: bool,
    },
    /// Call counts per contact, or the call list of one contact
    Calls {
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long)]
        detail: Option<String>,
        /// Write the detail table as CSV
        #[arg(long, requires = "detail")]
        export: Option<PathBuf>,
    },
    /// Positions of the given contacts and the map commands for them
    Locations {
        numbers: Vec<String>,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Start the server and open a view in the browser
    Launch {
        #[arg(value_enum, default_value_t = View::Messages)]
        view: View,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wasight=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    // Config
    let mut config = Config::from_env()?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(media) = &cli.media {
        config.media_root = media.clone();
    }

    match cli.command.unwrap_or(Cmd::Serve) {
        Cmd::Serve => serve(&config).await,
        Cmd::Chats { search } => print_chats(&config, &search),
        Cmd::Chat {
            jid,
            text,
            category,
            from,
            to,
            width,
            all,
        } => print_chat(&config, &jid, text, category, (from, to), width, all),
        Cmd::Calls {
            search,
            top,
            detail,
            export,
        } => print_calls(&config, &search, top, detail.as_deref(), export.as_deref()),
        Cmd::Locations {
            numbers,
            all,
            from,
            to,
        } => print_locations(&config, &numbers, all, (from, to)),
        Cmd::Launch { view } => {
            let addr = config.bind_addr()?;
            let mut args = Vec::new();
            if let Some(db) = &cli.db {
                args.extend(["--db".to_string(), db.display().to_string()]);
            }
            if let Some(media) = &cli.media {
                args.extend(["--media".to_string(), media.display().to_string()]);
            }
            tokio::task::spawn_blocking(move || launch::run(addr, view, &args)).await?
        }
    }
}

/// Open the export and read from it. Any failure here is fatal.
fn load<T>(
    path: &Path,
    read: impl FnOnce(&MsgStore) -> wasight_db::Result<T>,
) -> anyhow::Result<T> {
    MsgStore::open(path).and_then(|store| read(&store)).map_err(|e| {
        error!("Cannot load {}: {}", path.display(), e);
        e.into()
    })
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let (messages, calls, locations) = load(&config.db_path, |store| {
        Ok((
            Arc::new(store.load_messages()?),
            Arc::new(store.load_calls()?),
            Arc::new(store.load_locations()?),
        ))
    })?;
    let media = MediaRoot::new(&config.media_root);

    let state: AppState = Arc::new(AppStateInner {
        messages: Mutex::new(MessageController::new(
            messages,
            media.clone(),
            config.batch_size,
        )),
        renderer: Mutex::new(Renderer::new(BODY_METRICS, SMALL_METRICS, media)),
        calls: Mutex::new(CallController::new(
            calls,
            config.own_number.clone(),
            config.top_n,
        )),
        locations: Mutex::new(LocationController::new(locations)),
        opener: Arc::new(SystemOpener),
    });

    let app = wasight_api::router(state).layer(TraceLayer::new_for_http());

    let addr = config.bind_addr()?;
    info!("wasight listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn day_range(extent: TimeRange, (from, to): (Option<NaiveDate>, Option<NaiveDate>)) -> anyhow::Result<TimeRange> {
    let from = from
        .map(|d| wasight_types::time::day_start_in(&Local, d))
        .unwrap_or(extent.from);
    let to = to
        .map(|d| wasight_types::time::day_end_in(&Local, d))
        .unwrap_or(extent.to);
    if from > to {
        bail!("--from is after --to");
    }
    Ok(TimeRange::new(from, to))
}

fn print_chats(config: &Config, search: &str) -> anyhow::Result<()> {
    let table = Arc::new(load(&config.db_path, MsgStore::load_messages)?);
    let mut controller = MessageController::new(table, MediaRoot::new(&config.media_root), config.batch_size);
    for chat in controller.search_chats(search) {
        println!(
            "{:<20} {:<40} {}",
            chat.display_timestamp.as_deref().unwrap_or(""),
            chat.display_name,
            chat.last_text.lines().next().unwrap_or("")
        );
    }
    Ok(())
}

fn print_chat(
    config: &Config,
    jid: &str,
    text: Option<String>,
    category: CategoryFilter,
    days: (Option<NaiveDate>, Option<NaiveDate>),
    width: u32,
    all: bool,
) -> anyhow::Result<()> {
    let table = Arc::new(load(&config.db_path, MsgStore::load_messages)?);
    let media = MediaRoot::new(&config.media_root);
    let mut controller = MessageController::new(table, media.clone(), config.batch_size);
    if !controller.select_chat(jid) {
        bail!("no chat with JID {}", jid);
    }
    let range = day_range(controller.extent(), days)?;
    controller.set_filters(text, category, range);
    if all {
        while controller.pager().can_grow() {
            controller.grow();
        }
    }

    let viewport = width.max(20) * TERMINAL_METRICS.char_width;
    let mut renderer = Renderer::new(TERMINAL_METRICS, TERMINAL_METRICS, media);
    for row in controller.pager().loaded_rows() {
        let plan = renderer.layout(row, viewport);
        let mut canvas = TextCanvas::new(viewport);
        let bounds = Rect {
            x: 0,
            y: 0,
            width: viewport,
            height: plan.height,
        };
        renderer.paint(&plan, bounds, &mut canvas);
        println!("{}", canvas.render());
    }

    let status = controller.status();
    println!("-- {} of {} messages shown", status.loaded, status.matched);
    Ok(())
}

fn print_calls(
    config: &Config,
    search: &str,
    top: Option<usize>,
    detail: Option<&str>,
    export: Option<&Path>,
) -> anyhow::Result<()> {
    let table = Arc::new(load(&config.db_path, MsgStore::load_calls)?);
    let mut controller = CallController::new(table, config.own_number.clone(), top.unwrap_or(config.top_n));

    let Some(jid) = detail else {
        controller.set_search(search);
        let diagram = controller.diagram();
        if diagram.nodes.is_empty() {
            println!("No contacts match");
        }
        for node in &diagram.nodes {
            println!("{:>6}  {:<40} ({:.2}, {:.2})", node.total_calls, node.jid, node.x, node.y);
        }
        return Ok(());
    };

    let table = controller.detail(jid);
    if table.is_empty() {
        bail!("no calls with {}", jid);
    }
    match export {
        Some(path) => table
            .save_csv(path)
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => table.write_csv(std::io::stdout().lock())?,
    }
    Ok(())
}

fn print_locations(
    config: &Config,
    numbers: &[String],
    all: bool,
    days: (Option<NaiveDate>, Option<NaiveDate>),
) -> anyhow::Result<()> {
    let table = Arc::new(load(&config.db_path, MsgStore::load_locations)?);
    let mut controller = LocationController::new(table);

    if numbers.is_empty() && !all {
        for contact in controller.contacts() {
            println!("{:>6}  {}", contact.count, contact.number);
        }
        return Ok(());
    }

    let range = day_range(controller.extent(), days)?;
    controller.set_range(range);
    if all {
        controller.select_all();
    }
    for number in numbers {
        if !controller.check(number, true) {
            bail!("{} shared no locations", number);
        }
    }

    for position in controller.positions() {
        println!("{:<20} {:<28} {}", position.time, position.coordinates, position.place);
    }
    for command in controller.commands() {
        println!("{}", serde_json::to_string(&command)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rusqlite::Connection;
    use wasight_db::{DataSourceError, schema};

    fn empty_export() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msgstore.db");
        let conn = Connection::open(&path).unwrap();
        schema::create_tables(&conn).unwrap();
        (dir, path)
    }

    #[test]
    fn load_reads_through_the_store() {
        let (_dir, path) = empty_export();
        let table = load(&path, MsgStore::load_messages).unwrap();
        assert!(table.rows().is_empty());
    }

    #[test]
    fn load_fails_on_open_and_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load(&dir.path().join("nope.db"), MsgStore::load_calls).unwrap_err();
        assert!(missing.to_string().contains("not found"));

        let (_dir, path) = empty_export();
        let failed = load(&path, |_: &MsgStore| -> wasight_db::Result<()> {
            Err(DataSourceError::MissingTable("message"))
        })
        .unwrap_err();
        assert!(failed.downcast_ref::<DataSourceError>().is_some());
    }
}
