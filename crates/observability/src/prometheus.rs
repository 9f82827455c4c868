//! Prometheus metrics recorder.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_RECORDER: OnceLock<PrometheusRecorder> = OnceLock::new();

/// Install the Prometheus recorder as the global metrics recorder.
///
/// Installing twice returns the recorder installed first.
pub fn install_prometheus_recorder() -> eyre::Result<PrometheusRecorder> {
    if let Some(recorder) = PROMETHEUS_RECORDER.get() {
        return Ok(recorder.clone());
    }
    let recorder = PrometheusRecorder::install()?;
    Ok(PROMETHEUS_RECORDER.get_or_init(|| recorder).clone())
}

/// Handle to the installed Prometheus recorder.
#[derive(Clone)]
pub struct PrometheusRecorder {
    handle: PrometheusHandle,
    upkeep_started: Arc<AtomicBool>,
}

impl std::fmt::Debug for PrometheusRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusRecorder")
            .field("upkeep_started", &self.upkeep_started.load(Ordering::Relaxed))
            .finish()
    }
}

impl PrometheusRecorder {
    fn install() -> eyre::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        Ok(Self {
            handle,
            upkeep_started: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Periodically drain histogram buckets. Starts at most one task.
    pub fn spawn_upkeep(&self, interval: Duration) {
        if self
            .upkeep_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let handle = self.handle.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                handle.run_upkeep();
            }
        });
    }
}
