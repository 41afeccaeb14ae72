//! Screenshot blobs written to a sandboxed directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

/// Failure while writing an image into the store.
#[derive(Debug)]
pub enum ScreenshotError {
    /// Input byte slice was empty.
    EmptyImage,
    /// Caller-supplied name reduced to nothing after sanitizing.
    UnusableName(String),
    /// Filesystem failure while writing or renaming.
    Io(std::io::Error),
}

impl From<std::io::Error> for ScreenshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Result alias for screenshot writes.
pub type ScreenshotResult<T> = Result<T, ScreenshotError>;

/// Writes image blobs into one sandboxed directory.
///
/// Names are sanitized to bare file names, so writes cannot escape the
/// directory. An existing file under the same name is replaced.
#[derive(Debug)]
pub struct ScreenshotStore {
    dir: PathBuf,
}

impl ScreenshotStore {
    /// Opens the store, creating the backing directory if missing.
    pub fn open(dir: impl Into<PathBuf>) -> ScreenshotResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory screenshots are written into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `image` under `name`, or under a generated timestamp name when
    /// `name` is absent. Returns the path written.
    ///
    /// The bytes land in a temporary sibling first and move into place by
    /// rename, so a failed write leaves no partial file at the returned path.
    pub fn save(&self, image: &[u8], name: Option<&str>) -> ScreenshotResult<PathBuf> {
        if image.is_empty() {
            return Err(ScreenshotError::EmptyImage);
        }

        let file_name = match name {
            Some(raw) => sanitize_file_name(raw)
                .ok_or_else(|| ScreenshotError::UnusableName(raw.to_string()))?,
            None => self.generated_name(),
        };

        let target = self.dir.join(&file_name);
        let tmp = self.dir.join(format!("{file_name}.tmp"));
        if let Err(err) = fs::write(&tmp, image) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }

        debug!(path = %target.display(), bytes = image.len(), "screenshot written");
        Ok(target)
    }

    fn generated_name(&self) -> String {
        let base = now_ms();
        let mut candidate = format!("{base}.png");
        let mut bump = 1u32;
        while self.dir.join(&candidate).exists() {
            candidate = format!("{base}_{bump}.png");
            bump += 1;
        }
        candidate
    }
}

/// Reduces a caller-supplied name to a bare file name, appending `.png` when
/// no extension is present. Returns `None` for names with no usable stem.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let trimmed = Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .trim();
    if trimmed.is_empty() {
        return None;
    }
    if Path::new(trimmed).extension().is_some() {
        Some(trimmed.to_string())
    } else {
        Some(format!("{trimmed}.png"))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
