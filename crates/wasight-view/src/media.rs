//! Media path resolution and the per-row thumbnail cache.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};
use tracing::{debug, warn};

/// Thumbnails are scaled down to at most this width.
pub const MAX_THUMBNAIL_WIDTH: u32 = 300;

/// Prefix the export stores in front of media paths.
const MEDIA_PREFIX: &str = "Media/";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media file not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),
}

/// Directory the export's relative media paths resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRoot {
    root: PathBuf,
}

impl MediaRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// `Media/WhatsApp Images/a.jpg` resolves to `<root>/WhatsApp Images/a.jpg`.
    pub fn resolve(&self, stored: &str) -> PathBuf {
        let relative = stored.strip_prefix(MEDIA_PREFIX).unwrap_or(stored);
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Resolved path, only if a file exists there.
    pub fn existing(&self, stored: &str) -> Option<PathBuf> {
        let path = self.resolve(stored);
        path.is_file().then_some(path)
    }
}

/// A decoded, scaled RGBA thumbnail. Cloning shares the pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pixels: Arc<[u8]>,
}

impl Thumbnail {
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw().into(),
        }
    }

    pub fn to_png(&self) -> Result<Vec<u8>, MediaError> {
        let image = RgbaImage::from_raw(self.width, self.height, self.pixels.to_vec())
            .ok_or_else(|| {
                MediaError::Encode(image::ImageError::Parameter(
                    image::error::ParameterError::from_kind(
                        image::error::ParameterErrorKind::DimensionMismatch,
                    ),
                ))
            })?;
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .map_err(MediaError::Encode)?;
        Ok(out.into_inner())
    }
}

/// Decode `path` and scale it to at most `max_width` wide, keeping the
/// aspect ratio.
pub fn decode_thumbnail(path: &Path, max_width: u32) -> Result<Thumbnail, MediaError> {
    if !path.is_file() {
        return Err(MediaError::NotFound(path.to_path_buf()));
    }
    let decoded = image::open(path).map_err(|source| MediaError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let scaled = if decoded.width() > max_width {
        decoded.resize(max_width, u32::MAX, FilterType::Triangle)
    } else {
        decoded
    };
    Ok(Thumbnail::from_image(scaled.to_rgba8()))
}

/// Thumbnails memoized by row id for the cache's lifetime, including the
/// "no image" outcome. Lookups never fail.
#[derive(Debug)]
pub struct ThumbnailCache {
    root: MediaRoot,
    max_width: u32,
    entries: HashMap<i64, Option<Thumbnail>>,
    decode_attempts: usize,
}

impl ThumbnailCache {
    pub fn new(root: MediaRoot) -> Self {
        Self {
            root,
            max_width: MAX_THUMBNAIL_WIDTH,
            entries: HashMap::new(),
            decode_attempts: 0,
        }
    }

    pub fn root(&self) -> &MediaRoot {
        &self.root
    }

    pub fn get(&mut self, row_id: i64, stored_path: &str) -> Option<Thumbnail> {
        if let Some(entry) = self.entries.get(&row_id) {
            return entry.clone();
        }

        self.decode_attempts += 1;
        let path = self.root.resolve(stored_path);
        let entry = match decode_thumbnail(&path, self.max_width) {
            Ok(thumb) => Some(thumb),
            Err(MediaError::NotFound(p)) => {
                debug!("No media for row {} at {}", row_id, p.display());
                None
            }
            Err(e) => {
                warn!("Thumbnail for row {} unavailable: {}", row_id, e);
                None
            }
        };
        self.entries.insert(row_id, entry.clone());
        entry
    }

    /// Cached result without triggering a decode.
    pub fn peek(&self, row_id: i64) -> Option<&Option<Thumbnail>> {
        self.entries.get(&row_id)
    }

    /// Filesystem decode attempts so far.
    pub fn decode_attempts(&self) -> usize {
        self.decode_attempts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn resolve_strips_media_prefix() {
        let root = MediaRoot::new("/exports/media");
        assert_eq!(
            root.resolve("Media/WhatsApp Images/IMG-1.jpg"),
            PathBuf::from("/exports/media/WhatsApp Images/IMG-1.jpg")
        );
        assert_eq!(
            root.resolve("Voice/a.opus"),
            PathBuf::from("/exports/media/Voice/a.opus")
        );
    }

    #[test]
    fn missing_file_caches_none_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ThumbnailCache::new(MediaRoot::new(dir.path()));
        assert_eq!(cache.get(7, "Media/none.jpg"), None);
        assert_eq!(cache.get(7, "Media/none.jpg"), None);
        assert_eq!(cache.decode_attempts(), 1);
        assert_eq!(cache.peek(7), Some(&None));
    }

    #[test]
    fn decoded_thumbnail_is_scaled_and_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(600, 200, Rgba([10, 20, 30, 255]));
        img.save(dir.path().join("wide.png")).unwrap();

        let mut cache = ThumbnailCache::new(MediaRoot::new(dir.path()));
        let first = cache.get(1, "Media/wide.png").unwrap();
        assert_eq!((first.width, first.height), (300, 100));

        let second = cache.get(1, "Media/wide.png").unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.decode_attempts(), 1);

        let png = first.to_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn undecodable_file_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();
        let mut cache = ThumbnailCache::new(MediaRoot::new(dir.path()));
        assert_eq!(cache.get(3, "broken.jpg"), None);
        assert_eq!(cache.len(), 1);
    }
}
