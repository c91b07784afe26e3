//! Background rendering with cancellation of superseded passes.
//!
//! ## Threading
//!
//! Each [`RenderSession::request`] spawns one worker thread that prepares the
//! elevation tiles for the viewport and rasterizes the rules. Workers report
//! back over a `crossbeam-channel`, tagged with the generation number of the
//! request that started them:
//! - A new request cancels the previous pass's [`CancelToken`]
//! - [`RenderSession::latest`] and [`RenderSession::wait_latest`] only ever
//!   return the result of the newest generation; older results are dropped
//! - The tile cache is shared by all workers through the provider

use crate::{CancelToken, Overlay, RasterConfig, RasterGenerator, RenderError, Result};
use avaraster_bulletin::{AvalancheConfig, GenerationRule};
use avaraster_common::Bounds;
use avaraster_dem::{PrepareSummary, TerrainRgbProvider, TileSource};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of one background pass.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Generation of the request that produced this result.
    pub generation: u64,
    /// Viewport that was rendered.
    pub viewport: Bounds,
    /// Tile preparation statistics.
    pub prepare: PrepareSummary,
    /// The overlay, or `None` when nothing was painted or the pass was
    /// cancelled.
    pub overlay: Option<Overlay>,
}

/// Runs render passes off the caller's thread, newest request wins.
pub struct RenderSession<S> {
    provider: Arc<TerrainRgbProvider<S>>,
    raster: RasterConfig,
    avalanche: Arc<AvalancheConfig>,
    generation: u64,
    current: Option<CancelToken>,
    result_tx: Sender<RenderOutcome>,
    result_rx: Receiver<RenderOutcome>,
    workers: Vec<JoinHandle<()>>,
}

impl<S> std::fmt::Debug for RenderSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("generation", &self.generation)
            .field("workers", &self.workers.len())
            .finish()
    }
}

impl<S: TileSource + 'static> RenderSession<S> {
    /// Create a session over a shared provider.
    pub fn new(provider: Arc<TerrainRgbProvider<S>>, raster: RasterConfig, avalanche: AvalancheConfig) -> Self {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        Self {
            provider,
            raster,
            avalanche: Arc::new(avalanche),
            generation: 0,
            current: None,
            result_tx,
            result_rx,
            workers: Vec::new(),
        }
    }

    /// Generation number of the newest request, 0 before the first.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start rendering `rules` over `viewport`, cancelling any pass still in
    /// flight. Returns the new generation number.
    ///
    /// An empty rule list completes immediately with no overlay and no tile
    /// preparation.
    pub fn request(&mut self, viewport: Bounds, map_zoom: f64, rules: Arc<[GenerationRule]>) -> Result<u64> {
        self.cancel();
        self.workers.retain(|worker| !worker.is_finished());

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancelToken::new();
        self.current = Some(cancel.clone());

        let provider = Arc::clone(&self.provider);
        let avalanche = Arc::clone(&self.avalanche);
        let raster = self.raster;
        let result_tx = self.result_tx.clone();

        let worker = thread::Builder::new()
            .name(format!("render-{generation}"))
            .spawn(move || {
                let mut outcome = RenderOutcome {
                    generation,
                    viewport,
                    prepare: PrepareSummary::default(),
                    overlay: None,
                };
                if !rules.is_empty() {
                    outcome.prepare = provider.prepare(&viewport, map_zoom);
                    outcome.overlay = RasterGenerator::new(&raster, &avalanche).draw_cancellable(
                        &rules,
                        &viewport,
                        provider.as_ref(),
                        &cancel,
                    );
                }
                // The session may already be gone.
                let _ = result_tx.send(outcome);
            })
            .map_err(RenderError::Io)?;

        self.workers.push(worker);
        debug!(generation, ?viewport, map_zoom, "Requested render");
        Ok(generation)
    }

    /// Cancel the pass in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    /// Newest finished result, without blocking.
    ///
    /// Results of older generations are discarded.
    pub fn latest(&self) -> Option<RenderOutcome> {
        self.result_rx
            .try_iter()
            .filter(|outcome| self.is_current(outcome))
            .last()
    }

    /// Block until the newest request finishes or `timeout` elapses.
    pub fn wait_latest(&self, timeout: Duration) -> Option<RenderOutcome> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.result_rx.recv_timeout(remaining) {
                Ok(outcome) if self.is_current(&outcome) => return Some(outcome),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Cancel outstanding work and wait for every worker to exit.
    pub fn shutdown(mut self) {
        self.cancel();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("Render worker panicked");
            }
        }
    }

    fn is_current(&self, outcome: &RenderOutcome) -> bool {
        let current = outcome.generation == self.generation;
        if !current {
            debug!(
                stale = outcome.generation,
                current = self.generation,
                "Discarding stale render result"
            );
        }
        current
    }
}

impl<S> Drop for RenderSession<S> {
    fn drop(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}
