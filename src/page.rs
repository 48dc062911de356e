use std::sync::Arc;

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    // Batched notification that subtrees were added or removed somewhere
    // in the document.
    Mutated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    LoadedMetadata,
    TimeUpdate,
}

pub trait Page: Send + Sync {
    fn selector_exists(&self, selector: &str) -> bool;

    fn has_class(&self, selector: &str, class: &str) -> bool;

    fn media_element(&self) -> Option<Arc<dyn MediaElement>>;

    fn events(&self) -> broadcast::Receiver<PageEvent>;
}

pub trait MediaElement: Send + Sync {
    // Stable for the lifetime of the underlying node; a replacement node
    // must report a different id.
    fn node_id(&self) -> u64;

    fn playback_rate(&self) -> f64;

    fn muted(&self) -> bool;

    fn set_playback_rate(&self, rate: f64) -> anyhow::Result<()>;

    fn set_muted(&self, muted: bool) -> anyhow::Result<()>;

    fn events(&self) -> broadcast::Receiver<MediaEvent>;
}
