use std::{sync::Arc, time::Duration};

use log::{debug, error, info};
use serde::Deserialize;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time,
};

use crate::{
    config::Config,
    detector,
    page::{MediaElement, Page, PageEvent},
    playback::{self, PlaybackPolicy},
    tracker::MediaTracker,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
    pub acquire_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            acquire_interval_ms: 100,
        }
    }
}

impl WatchConfig {
    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    fn acquire_interval(&self) -> Duration {
        Duration::from_millis(self.acquire_interval_ms.max(1))
    }
}

pub struct AdWatcher {
    page: Arc<dyn Page>,
    tracker: Arc<MediaTracker>,
    policy: PlaybackPolicy,
    config: WatchConfig,
    rebind_rx: watch::Receiver<()>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl AdWatcher {
    pub fn new(page: Arc<dyn Page>, config: Config) -> Self {
        let tracker = Arc::new(MediaTracker::new());

        let (rebind_tx, rebind_rx) = watch::channel(());
        tracker.on_replaced(move |_| {
            let _ = rebind_tx.send(());
        });

        let (shutdown_tx, _) = watch::channel(false);

        Self {
            page,
            tracker,
            policy: config.playback,
            config: config.watch,
            rebind_rx,
            shutdown_tx,
            tasks: Vec::new(),
        }
    }

    pub fn tracker(&self) -> Arc<MediaTracker> {
        Arc::clone(&self.tracker)
    }

    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = shutdown_tx;

        // Subscribe before the tasks run so no mutation between start() and
        // the first poll of the task is lost.
        let page_events = self.page.events();

        self.tasks = vec![
            tokio::spawn(Self::acquire_task(
                Arc::clone(&self.page),
                Arc::clone(&self.tracker),
                self.config.acquire_interval(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(Self::poll_task(
                Arc::clone(&self.page),
                Arc::clone(&self.tracker),
                self.policy.clone(),
                self.config.poll_interval(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(Self::mutation_task(
                Arc::clone(&self.page),
                Arc::clone(&self.tracker),
                self.policy.clone(),
                page_events,
                shutdown_rx.clone(),
            )),
            tokio::spawn(Self::media_events_task(
                Arc::clone(&self.page),
                Arc::clone(&self.tracker),
                self.policy.clone(),
                self.rebind_rx.clone(),
                shutdown_rx,
            )),
        ];

        info!("Ad watcher started");
    }

    pub async fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                error!("Watcher task failed during shutdown: {err:?}");
            }
        }

        info!("Ad watcher stopped");
    }

    // Probes for the media element until one is tracked, then exits.
    async fn acquire_task(
        page: Arc<dyn Page>,
        tracker: Arc<MediaTracker>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = time::interval(interval);
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = ticker.tick() => {
                    if tracker.current().is_some() || tracker.resync(page.as_ref()) {
                        return;
                    }
                }
            }
        }
    }

    // Fallback for ad transitions that produce no structural mutation,
    // e.g. a pure overlay class toggle.
    async fn poll_task(
        page: Arc<dyn Page>,
        tracker: Arc<MediaTracker>,
        policy: PlaybackPolicy,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = time::interval(interval);
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = ticker.tick() => evaluate(page.as_ref(), &tracker, &policy),
            }
        }
    }

    async fn mutation_task(
        page: Arc<dyn Page>,
        tracker: Arc<MediaTracker>,
        policy: PlaybackPolicy,
        mut events: broadcast::Receiver<PageEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                event = events.recv() => match event {
                    Ok(PageEvent::Mutated) => {
                        tracker.resync(page.as_ref());
                        evaluate(page.as_ref(), &tracker, &policy);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Skipped {skipped} mutation notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                },
            }
        }
    }

    // Listens to the tracked element's own playback events and re-binds
    // whenever the tracker swaps the element, so the stale element's stream
    // is dropped along with the reference.
    async fn media_events_task(
        page: Arc<dyn Page>,
        tracker: Arc<MediaTracker>,
        policy: PlaybackPolicy,
        mut rebind: watch::Receiver<()>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        'bind: loop {
            let media = loop {
                match tracker.current() {
                    Some(media) => break media,
                    None => tokio::select! {
                        _ = shutdown.changed() => return,
                        _ = rebind.changed() => {}
                    },
                }
            };
            let mut events = media.events();

            loop {
                tokio::select! {
                    _ = shutdown.changed() => return,
                    _ = rebind.changed() => continue 'bind,
                    event = events.recv() => match event {
                        Ok(_) => evaluate(page.as_ref(), &tracker, &policy),
                        Err(broadcast::error::RecvError::Lagged(..)) => {}
                        Err(broadcast::error::RecvError::Closed) => {
                            tokio::select! {
                                _ = shutdown.changed() => return,
                                _ = rebind.changed() => {}
                            }
                            continue 'bind;
                        }
                    },
                }
            }
        }
    }
}

fn evaluate(page: &dyn Page, tracker: &MediaTracker, policy: &PlaybackPolicy) {
    let Some(media) = tracker.current() else {
        return;
    };
    let ad_playing = detector::is_ad_playing(page);
    playback::reconcile(media.as_ref(), ad_playing, policy);
}
