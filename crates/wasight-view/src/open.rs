use std::io;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

/// A side effect requested by an interaction handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum Effect {
    /// Open a URL in the default browser.
    OpenUrl(String),
    /// Open a local file with the OS default handler.
    OpenFile(PathBuf),
}

pub trait Opener {
    fn open(&self, effect: &Effect) -> io::Result<()>;
}

/// Hands effects to the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    /// Blocks until the platform launcher returns.
    fn open(&self, effect: &Effect) -> io::Result<()> {
        info!("Opening {:?}", effect);
        match effect {
            Effect::OpenUrl(url) => ::open::that(url),
            Effect::OpenFile(path) => ::open::that(path),
        }
    }
}
