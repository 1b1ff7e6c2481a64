//! Native file-system event backend.
//!
//! Bridges `notify` events into the pipeline's channel form. Polling
//! adapters are equally valid as long as they deliver the same three event
//! kinds with at-least-once semantics; dropping the watcher unsubscribes.

use std::path::Path;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::Result;
use crate::events::{WatchEvent, WatchEventKind};

/// Handle keeping a native watch alive. Dropping it stops delivery.
pub struct NotifyWatcher {
    _watcher: RecommendedWatcher,
}

impl NotifyWatcher {
    /// Watch a directory recursively, delivering events on the returned
    /// channel.
    pub fn subscribe(dir: &Path, capacity: usize) -> Result<(Self, mpsc::Receiver<WatchEvent>)> {
        let (tx, rx) = mpsc::channel(capacity);
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let Some(kind) = map_kind(&event.kind) else {
                        return;
                    };
                    for path in event.paths {
                        if tx.blocking_send(WatchEvent::new(kind, path)).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "watch backend error"),
            })?;
        watcher.watch(dir, RecursiveMode::Recursive)?;
        Ok((Self { _watcher: watcher }, rx))
    }
}

fn map_kind(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatchEventKind::Added),
        EventKind::Modify(_) => Some(WatchEventKind::Changed),
        EventKind::Remove(_) => Some(WatchEventKind::Removed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn maps_the_three_event_kinds() {
        assert_eq!(
            map_kind(&EventKind::Create(CreateKind::File)),
            Some(WatchEventKind::Added)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(WatchEventKind::Changed)
        );
        assert_eq!(
            map_kind(&EventKind::Remove(RemoveKind::File)),
            Some(WatchEventKind::Removed)
        );
        assert_eq!(map_kind(&EventKind::Access(notify::event::AccessKind::Any)), None);
    }
}
