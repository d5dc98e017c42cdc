// Poller - Runs the sample/append cycle on a fixed interval
use crate::application::battery_source::SamplerError;
use crate::application::sampler::TelemetrySampler;
use crate::application::store::TelemetryStore;
use crate::domain::telemetry::Sample;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const LIVE_CHANNEL_CAPACITY: usize = 64;

pub struct Poller {
    sampler: TelemetrySampler,
    store: Arc<TelemetryStore>,
    interval: Duration,
    live: broadcast::Sender<Sample>,
    last_error: RwLock<Option<String>>,
}

impl Poller {
    pub fn new(sampler: TelemetrySampler, store: Arc<TelemetryStore>, interval: Duration) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            sampler,
            store,
            interval,
            live,
            last_error: RwLock::new(None),
        }
    }

    /// Receive every sample appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Sample> {
        self.live.subscribe()
    }

    /// Error of the most recent cycle, cleared by the next successful one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle: sample, append, publish to live subscribers.
    pub async fn poll_once(&self) -> Result<usize, SamplerError> {
        let result = self.sampler.sample(self.store.origin()).await;
        let mut last_error = self.last_error.write().unwrap_or_else(PoisonError::into_inner);

        match result {
            Ok(samples) => {
                *last_error = None;
                drop(last_error);

                if samples.is_empty() {
                    tracing::debug!("Poll cycle returned no battery records");
                    return Ok(0);
                }
                let added = self.store.append(samples.clone());
                for sample in samples {
                    // No subscribers is fine
                    let _ = self.live.send(sample);
                }
                tracing::debug!("Appended {} sample(s), series length {}", added, self.store.len());
                Ok(added)
            }
            Err(e) => {
                *last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Spawn the polling loop. The first cycle runs immediately.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = self.poll_once().await {
                    tracing::error!("Battery poll cycle failed: {}", e);
                }
            }
        })
    }
}
