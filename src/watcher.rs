//! Live reload: turns file-system changes into rebuild requests.
//!
//! The watcher runs on `notify`'s own thread and only ever sends
//! [`ReloadRequest`]s down a channel; the renderer drains that channel
//! between frames, so rebuilds never overlap a render.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// One observed change to a watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadRequest {
    pub path: PathBuf,
}

pub struct SourceWatcher {
    // Dropping the watcher stops the notifications.
    _watcher: RecommendedWatcher,
    targets: Vec<PathBuf>,
}

impl SourceWatcher {
    /// Watch each file's parent directory and forward changes to the files
    /// themselves. Editors that save by replacing the file are still seen.
    pub fn spawn(files: &[PathBuf], sender: Sender<ReloadRequest>) -> anyhow::Result<Self> {
        let targets = files
            .iter()
            .map(|file| absolute(file))
            .collect::<io::Result<Vec<_>>>()?;

        let filter = targets.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if let Some(path) = relevant_path(&event, &filter) {
                        debug!(path = %path.display(), kind = ?event.kind, "Watched file changed");
                        // The renderer has gone away; nothing left to notify.
                        let _ = sender.send(ReloadRequest { path });
                    }
                }
                Err(e) => warn!("File watcher error: {e}"),
            }
        })?;

        let mut dirs: Vec<&Path> = targets.iter().filter_map(|t| t.parent()).collect();
        dirs.sort();
        dirs.dedup();
        for dir in dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        Ok(SourceWatcher {
            _watcher: watcher,
            targets,
        })
    }

    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    // Canonicalize the directory rather than the file so a file that is
    // briefly missing mid-save does not fail the lookup.
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "not a file path"))?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(parent.canonicalize()?.join(file_name))
}

/// The watched file an event touches, if the event is a content change.
pub fn relevant_path(event: &Event, targets: &[PathBuf]) -> Option<PathBuf> {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return None;
    }
    event
        .paths
        .iter()
        .find(|path| targets.iter().any(|target| target == *path))
        .cloned()
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind};

    use super::*;

    #[test]
    fn only_content_changes_to_targets_are_relevant() {
        let target = PathBuf::from("/tmp/anim/script.json");
        let targets = vec![target.clone()];

        let modify = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(target.clone());
        assert_eq!(relevant_path(&modify, &targets), Some(target.clone()));

        let create = Event::new(EventKind::Create(CreateKind::File)).add_path(target.clone());
        assert_eq!(relevant_path(&create, &targets), Some(target.clone()));

        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path(target.clone());
        assert_eq!(relevant_path(&access, &targets), None);

        let other = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/tmp/anim/other.json"));
        assert_eq!(relevant_path(&other, &targets), None);
    }

    #[test]
    fn absolute_keeps_file_name_under_canonical_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = absolute(&dir.path().join("missing.json")).unwrap();
        assert_eq!(path, dir.path().canonicalize().unwrap().join("missing.json"));
    }

    #[test]
    fn file_writes_send_reload_requests() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.json");
        std::fs::write(&script, "{}").unwrap();

        let (tx, rx) = mpsc::channel();
        let watcher = SourceWatcher::spawn(&[script.clone()], tx).unwrap();
        std::fs::write(&script, r#"{ "entities": [] }"#).unwrap();

        let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(request.path, watcher.targets()[0]);
    }
}
