//! Trend weights read from `config/weights.json`, picked up again whenever the
//! file's mtime moves.
//!
//! ```json
//! { "recent": 0.6, "commission": 0.2, "priceValue": 0.2 }
//! ```
//!
//! Keys that are absent keep their default. A file that fails to parse or
//! carries a negative/non-finite weight is logged and the previous weights stay.
//! File I/O happens in `refresh`, run by the polling thread; request paths only
//! read the in-memory snapshot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, Weak};
use std::thread;
use std::time::{Duration, SystemTime};

use super::scoring::TrendWeights;

pub const DEFAULT_WEIGHTS_PATH: &str = "config/weights.json";
pub const DEFAULT_RELOAD_POLL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    weights: TrendWeights,
    seen_mtime: Option<SystemTime>,
}

#[derive(Debug)]
pub struct HotReloadWeights {
    file: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl HotReloadWeights {
    /// `None` means `config/weights.json`. The file is read once here.
    pub fn new(path: Option<&Path>) -> Self {
        let file = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(DEFAULT_WEIGHTS_PATH),
        };
        let hot = Self {
            file,
            snapshot: RwLock::new(Snapshot {
                weights: TrendWeights::default(),
                seen_mtime: None,
            }),
        };
        hot.refresh();
        hot
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Weights as of the last refresh. No I/O.
    pub fn current(&self) -> TrendWeights {
        self.read().weights
    }

    /// Re-read the file if its mtime changed. Returns true when new weights
    /// were installed. Blocking; keep it off async worker threads.
    pub fn refresh(&self) -> bool {
        let Ok(mtime) = fs::metadata(&self.file).and_then(|m| m.modified()) else {
            return false;
        };
        if self.read().seen_mtime == Some(mtime) {
            return false;
        }

        let mut slot = match self.snapshot.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        if slot.seen_mtime == Some(mtime) {
            return false;
        }
        slot.seen_mtime = Some(mtime);
        match load_weights_file(&self.file) {
            Ok(w) if w.is_valid() => {
                tracing::info!(target: "trending", file = %self.file.display(), ?w, "trend weights loaded");
                slot.weights = w;
                true
            }
            Ok(w) => {
                tracing::warn!(target: "trending", file = %self.file.display(), ?w, "trend weights rejected");
                false
            }
            Err(e) => {
                tracing::warn!(target: "trending", file = %self.file.display(), error = %e, "trend weights unreadable");
                false
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        match self.snapshot.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }
}

/// Poll the weights file every `poll` on a plain thread. The thread stops once
/// the last `Arc` to `weights` is dropped.
pub fn start_hot_reload_thread(weights: &Arc<HotReloadWeights>, poll: Duration) {
    let weak: Weak<HotReloadWeights> = Arc::downgrade(weights);
    thread::spawn(move || loop {
        thread::sleep(poll);
        match weak.upgrade() {
            Some(w) => {
                w.refresh();
            }
            None => break,
        }
    });
}

/// Parse a weights file without touching any cached state.
pub fn load_weights_file(path: &Path) -> io::Result<TrendWeights> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
