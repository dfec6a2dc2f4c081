use crossbeam_channel::Sender;
use ignore::{WalkBuilder, WalkState};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};
use treemap_core::Entry;

#[derive(Debug, Clone)]
pub enum ScanMsg {
    Progress { scanned: u64, bytes: u64 },
    Error(String),
    Done(Entry),
}

pub struct Scanner {
    cancel: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self { cancel }
    }

    /// Walks `root` in parallel and sends a single `Done` with the file tree
    /// once the walk finishes or is cancelled.
    pub fn scan(&self, root: PathBuf, tx: Sender<ScanMsg>) {
        let cancel = self.cancel.clone();

        let scanned = Arc::new(AtomicU64::new(0));
        let bytes = Arc::new(Mutex::new(0u64));
        let files: Arc<Mutex<Vec<(PathBuf, u64)>>> = Arc::new(Mutex::new(Vec::with_capacity(4096)));

        let mut builder = WalkBuilder::new(&root);
        builder
            .hidden(false)
            .git_global(false)
            .follow_links(false)
            .threads(num_cpus::get());

        let walker = builder.build_parallel();
        walker.run(|| {
            let cancel = cancel.clone();
            let tx = tx.clone();
            let scanned = scanned.clone();
            let bytes = bytes.clone();
            let files = files.clone();
            Box::new(move |entry| {
                if cancel.load(Ordering::Relaxed) {
                    return WalkState::Quit;
                }
                match entry {
                    Ok(ent) => {
                        if !ent.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                            return WalkState::Continue;
                        }
                        match ent.metadata() {
                            Ok(md) => {
                                let sz = md.len();
                                files.lock().push((ent.path().to_path_buf(), sz));
                                let mut b = bytes.lock();
                                *b = b.saturating_add(sz);
                                let _ = tx.send(ScanMsg::Progress {
                                    scanned: scanned.fetch_add(1, Ordering::Relaxed) + 1,
                                    bytes: *b,
                                });
                            }
                            Err(e) => {
                                let _ = tx.send(ScanMsg::Error(e.to_string()));
                            }
                        }
                        WalkState::Continue
                    }
                    Err(e) => {
                        let _ = tx.send(ScanMsg::Error(e.to_string()));
                        WalkState::Continue
                    }
                }
            })
        });

        let files = Arc::try_unwrap(files)
            .map(|m| m.into_inner())
            .unwrap_or_else(|arc| arc.lock().clone());
        let _ = tx.send(ScanMsg::Done(build_entry(&root, files)));
    }
}

enum Slot {
    File(u64),
    Dir(BTreeMap<String, Slot>),
}

/// Folds a flat list of file sizes under `root` into a nested description.
/// Entries are ordered by name; a `root` that is itself a file becomes a leaf.
pub fn build_entry(root: &Path, files: Vec<(PathBuf, u64)>) -> Entry {
    let name = root
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    let mut top: BTreeMap<String, Slot> = BTreeMap::new();
    'files: for (path, sz) in files {
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Some((file, dirs)) = parts.split_last() else {
            return Entry::leaf(name, sz);
        };

        let mut level = &mut top;
        for dir in dirs {
            level = match level
                .entry(dir.clone())
                .or_insert_with(|| Slot::Dir(BTreeMap::new()))
            {
                Slot::Dir(children) => children,
                Slot::File(_) => continue 'files,
            };
        }
        level.entry(file.clone()).or_insert(Slot::File(sz));
    }

    Entry::branch(name, into_entries(top))
}

fn into_entries(level: BTreeMap<String, Slot>) -> Vec<Entry> {
    level
        .into_iter()
        .map(|(name, slot)| match slot {
            Slot::File(sz) => Entry::leaf(name, sz),
            Slot::Dir(children) => Entry::branch(name, into_entries(children)),
        })
        .collect()
}
