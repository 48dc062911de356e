use crate::page::Page;

// Structural ad markers. Any single one is sufficient evidence that an ad
// break is running; all of them absent is the only negative signal.
const AD_MARKER_SELECTORS: [&str; 7] = [
    ".video-ads.ytp-ad-module",
    ".ad-showing",
    ".ytp-ad-player-overlay",
    ".ytp-ad-skip-button",
    ".ytp-ad-preview-text",
    ".ytp-ad-text",
    ".ytp-ad-preview-container",
];

const PLAYER_CONTAINER_SELECTOR: &str = ".html5-video-player";
const PLAYER_AD_CLASS: &str = "ad-showing";

pub fn is_ad_playing(page: &dyn Page) -> bool {
    AD_MARKER_SELECTORS
        .iter()
        .any(|selector| page.selector_exists(selector))
        || page.has_class(PLAYER_CONTAINER_SELECTOR, PLAYER_AD_CLASS)
}
