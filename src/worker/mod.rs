#[cfg(test)]
mod tests;

use crate::error::Error;
use crate::upstream::{SharedMap, SourceManager};
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

#[derive(Clone, Debug, PartialEq)]
pub enum FetchRequest {
    All,
    One(String),
}

#[derive(Clone, Debug)]
pub enum FetchEvent {
    Started(FetchRequest),
    /// Per-source record counts; -1 marks a failed source.
    Finished(HashMap<String, i64>),
}

/// Single background fetch worker. All provider I/O runs on its task;
/// the request side only sends commands and reads events. At most one
/// fetch is in flight at a time.
#[derive(Clone)]
pub struct NavProcessor {
    tx: mpsc::UnboundedSender<FetchRequest>,
    busy: Arc<AtomicBool>,
}

impl NavProcessor {
    /// Start the worker task. Returns the handle used to request
    /// fetches and the event stream for completion notifications.
    pub fn spawn(
        manager: Arc<Mutex<SourceManager>>,
        map: SharedMap,
    ) -> (Self, mpsc::UnboundedReceiver<FetchEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<FetchRequest>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<FetchEvent>();
        let busy = Arc::new(AtomicBool::new(false));

        let worker_busy = busy.clone();
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let _ = event_tx.send(FetchEvent::Started(request.clone()));
                let results = {
                    let mut manager = manager.lock().await;
                    match &request {
                        FetchRequest::All => manager.fetch_all(&map).await,
                        FetchRequest::One(id) => manager.fetch_one(id, &map).await,
                    }
                };
                if results.values().any(|count| *count < 0) {
                    error!("Fetch finished with errors: {:?}", results);
                } else {
                    info!("Fetch finished: {:?}", results);
                }
                worker_busy.store(false, Ordering::SeqCst);
                let _ = event_tx.send(FetchEvent::Finished(results));
            }
        });

        (Self { tx, busy }, event_rx)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// User-initiated refresh: while a fetch is running this fails with
    /// `ProcessRunning` so the caller can surface it.
    pub fn request(&self, request: FetchRequest) -> Result<(), Error> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(Error::ProcessRunning);
        }
        if self.tx.send(request).is_err() {
            self.busy.store(false, Ordering::SeqCst);
            return Err(Error::ProcessRunning);
        }
        Ok(())
    }

    /// Periodic refresh: silently skipped while a fetch is running.
    pub fn try_request(&self, request: FetchRequest) -> bool {
        match self.request(request) {
            Ok(()) => true,
            Err(_) => {
                debug!("Fetch already running, skipping");
                false
            }
        }
    }

    /// Tick `FetchRequest::All` on a fixed interval while any source is
    /// enabled. The interval clamps to the supported 10..=600 range.
    pub fn spawn_auto_refresh(
        &self,
        manager: Arc<Mutex<SourceManager>>,
        interval_secs: u64,
    ) -> tokio::task::JoinHandle<()> {
        let processor = self.clone();
        let secs = interval_secs.clamp(10, 600);
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(secs));
            // the first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !manager.lock().await.has_enabled() {
                    continue;
                }
                processor.try_request(FetchRequest::All);
            }
        })
    }
}
