/// Background loading of dropped or requested files
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use stlview_core::{stl, MeshBatch, RenderList};

/// Result of one load request, reported back to the redraw loop
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded { path: PathBuf, triangles: usize },
    Failed { path: PathBuf, error: String },
    /// Parsed fine, but a newer request had already been committed
    Superseded { path: PathBuf },
}

impl LoadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Loaded { path, .. } | Self::Failed { path, .. } | Self::Superseded { path } => {
                path
            }
        }
    }
}

/// Orders commits so a slow, older request can't replace a newer model.
struct CommitGate {
    list: Arc<RenderList>,
    committed: Mutex<u64>,
}

impl CommitGate {
    fn new(list: Arc<RenderList>) -> Self {
        Self {
            list,
            committed: Mutex::new(0),
        }
    }

    fn commit(&self, ticket: u64, path: PathBuf, batch: MeshBatch) -> LoadOutcome {
        let mut committed = self.committed.lock();
        if ticket <= *committed {
            log::debug!("dropping stale load of {}", path.display());
            return LoadOutcome::Superseded { path };
        }

        let triangles = batch.len();
        self.list.submit(batch);
        *committed = ticket;
        LoadOutcome::Loaded { path, triangles }
    }
}

/// Parses files off the render thread and submits them to the render list.
pub struct BackgroundLoader {
    gate: Arc<CommitGate>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    next_ticket: u64,
}

impl BackgroundLoader {
    pub fn new(list: Arc<RenderList>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            gate: Arc::new(CommitGate::new(list)),
            tx,
            rx,
            next_ticket: 0,
        }
    }

    /// Start loading `path` on a worker thread.
    ///
    /// The current batch stays on screen until the new one is ready, and
    /// stays there for good if the load fails.
    pub fn request(&mut self, path: PathBuf) -> std::io::Result<()> {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let gate = Arc::clone(&self.gate);
        let tx = self.tx.clone();

        log::info!("loading {} (request #{})", path.display(), ticket);
        thread::Builder::new()
            .name(format!("stl-load-{ticket}"))
            .spawn(move || {
                let outcome = match stl::load_stl(&path) {
                    Ok(batch) => gate.commit(ticket, path, batch),
                    Err(err) => {
                        log::warn!("{err}");
                        LoadOutcome::Failed {
                            path,
                            error: err.to_string(),
                        }
                    }
                };
                // Receiver gone means the app is shutting down
                let _ = tx.send(outcome);
            })?;
        Ok(())
    }

    /// Next finished load, if any. Never blocks.
    pub fn poll(&self) -> Option<LoadOutcome> {
        self.rx.try_recv().ok()
    }
}

/// Turn the text a terminal pastes for a dropped file into a path.
///
/// Handles quoted paths, backslash-escaped paths and `file://` URIs.
pub fn parse_dropped_path(text: &str) -> Option<PathBuf> {
    let text = text.trim();
    if text.is_empty() || text.contains(['\n', '\r']) {
        return None;
    }

    let unquoted = ['\'', '"']
        .into_iter()
        .find_map(|q| text.strip_prefix(q)?.strip_suffix(q));

    let raw = match unquoted {
        Some(inner) => inner.trim().to_string(),
        None if cfg!(windows) => text.to_string(),
        None => unescape(text),
    };

    let path = match raw.strip_prefix("file://") {
        Some(rest) => {
            // Skip an authority such as "localhost"
            let rest = rest.find('/').map_or(rest, |i| &rest[i..]);
            percent_decode(rest)
        }
        None => raw,
    };

    (!path.is_empty()).then(|| PathBuf::from(path))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
            .map(|hex| hex_value(hex[0]) << 4 | hex_value(hex[1]));
        match escaped {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
