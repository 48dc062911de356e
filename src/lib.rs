mod config;
mod detector;
mod page;
mod playback;
mod tracker;
mod watcher;

pub use config::Config;
pub use detector::is_ad_playing;
pub use page::{MediaElement, MediaEvent, Page, PageEvent};
pub use playback::{reconcile, PlaybackPolicy, Transition};
pub use tracker::MediaTracker;
pub use watcher::{AdWatcher, WatchConfig};
