use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;

use crate::page::{MediaElement, Page};

type ReplacedCallback = Box<dyn Fn(&Arc<dyn MediaElement>) + Send + Sync>;

#[derive(Default)]
pub struct MediaTracker {
    current: RwLock<Option<Arc<dyn MediaElement>>>,
    on_replaced: RwLock<Vec<ReplacedCallback>>,
}

impl MediaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<dyn MediaElement>> {
        self.current.read().clone()
    }

    pub fn on_replaced(&self, callback: impl Fn(&Arc<dyn MediaElement>) + Send + Sync + 'static) {
        self.on_replaced.write().push(Box::new(callback));
    }

    // Re-queries the page and swaps the tracked reference when a different
    // element is present. Returns whether the reference changed.
    pub fn resync(&self, page: &dyn Page) -> bool {
        let Some(found) = page.media_element() else {
            // Keep the previous reference until a replacement shows up; a
            // transient teardown during navigation is not a replacement.
            return false;
        };

        let first = {
            let mut current = self.current.write();
            if let Some(old) = &*current {
                if old.node_id() == found.node_id() {
                    return false;
                }
            }
            let first = current.is_none();
            *current = Some(Arc::clone(&found));
            first
        };

        if first {
            info!("Media element found (node {})", found.node_id());
        } else {
            debug!("Media element replaced (node {})", found.node_id());
        }

        // Callbacks run outside the lock so they may call current().
        for callback in self.on_replaced.read().iter() {
            callback(&found);
        }
        true
    }
}
