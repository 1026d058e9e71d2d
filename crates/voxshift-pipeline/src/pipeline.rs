//! Pipeline object tying the pool, queues, worker and dispatcher together.

use crate::packet::PacketRequest;
use crate::worker::{PitchWorker, WorkerMessage, WorkerState};
use crate::{
    Error, FrameDispatcher, PacketPool, PipelineConfig, PipelineMetrics, PipelineMetricsSnapshot,
    Result,
};
use crossbeam_channel::{unbounded, Sender};
use std::sync::Arc;
use voxshift_core::ActorId;

/// Voice pipeline: pending queue, one worker thread, output queue.
///
/// Construct one per process (or per voice service) and hand out
/// [`PipelineHandle`]s to every submission site.
pub struct VoicePipeline {
    config: PipelineConfig,
    handle: PipelineHandle,
    worker: PitchWorker,
    dispatcher: FrameDispatcher,
    metrics: Arc<PipelineMetrics>,
}

impl VoicePipeline {
    /// Build a stopped pipeline. Call [`start`](Self::start) to spawn the worker.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let metrics = Arc::new(PipelineMetrics::new());
        let pool = PacketPool::new(
            config.preallocated_packets,
            config.max_packet_bytes,
            Arc::clone(&metrics),
        );
        let (pending_tx, pending_rx) = unbounded();
        let (output_tx, output_rx) = unbounded();

        let worker = PitchWorker::new(
            pending_tx.clone(),
            WorkerState::new(pending_rx, &config),
            output_tx,
            pool.clone(),
            Arc::clone(&metrics),
            config.clone(),
        );
        let dispatcher = FrameDispatcher::new(output_rx, pool.clone(), Arc::clone(&metrics));
        let handle = PipelineHandle {
            pending_tx,
            pool,
            metrics: Arc::clone(&metrics),
            max_packet_bytes: config.max_packet_bytes,
        };

        tracing::debug!(
            "Voice pipeline: {} Hz, {} samples/frame, fft {}, hop {}, latency {} samples",
            config.sample_rate,
            config.frame_samples,
            config.vocoder.fft_size(),
            config.vocoder.hop_size(),
            config.vocoder.latency()
        );

        Ok(Self {
            config,
            handle,
            worker,
            dispatcher,
            metrics,
        })
    }

    /// Spawn the worker thread. No-op if already running.
    pub fn start(&mut self) -> Result<()> {
        self.worker.start()
    }

    /// Process everything submitted so far, then join the worker.
    ///
    /// Packets submitted after `stop` wait in the pending queue until the
    /// next `start`. Completed packets wait for the next [`tick`](Self::tick).
    pub fn stop(&mut self) {
        self.worker.stop();
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Cloneable submission handle, usable from any thread.
    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    pub fn dispatcher(&self) -> &FrameDispatcher {
        &self.dispatcher
    }

    /// Scheduler hook: drain completed packets and run their callbacks.
    ///
    /// Call exactly once per output frame, on the thread allowed to send.
    pub fn tick(&self) -> usize {
        self.dispatcher.drain()
    }

    pub fn metrics(&self) -> PipelineMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl Drop for VoicePipeline {
    fn drop(&mut self) {
        self.worker.stop();
    }
}

/// Submission side of a [`VoicePipeline`].
#[derive(Clone)]
pub struct PipelineHandle {
    pending_tx: Sender<WorkerMessage>,
    pool: PacketPool,
    metrics: Arc<PipelineMetrics>,
    max_packet_bytes: usize,
}

impl PipelineHandle {
    /// Copy the request into a pooled packet and queue it for the worker.
    ///
    /// Never blocks. Returns once the packet is queued; a later processing
    /// failure drops the packet without running its callback.
    pub fn submit(&self, request: PacketRequest<'_>) -> Result<()> {
        request.validate(self.max_packet_bytes)?;

        let mut packet = self.pool.acquire();
        packet.fill(request);
        self.metrics.record_submitted();

        if let Err(rejected) = self.pending_tx.send(WorkerMessage::Process(packet)) {
            if let WorkerMessage::Process(packet) = rejected.into_inner() {
                self.pool.release(packet);
            }
            return Err(Error::WorkerGone);
        }
        Ok(())
    }

    /// Start fresh vocoder state for `actor`, ordered after packets already queued.
    pub fn open_session(&self, actor: ActorId) -> Result<()> {
        self.pending_tx
            .send(WorkerMessage::OpenSession(actor))
            .map_err(|_| Error::WorkerGone)
    }

    /// Drop `actor`'s vocoder state once its queued packets are processed.
    pub fn close_session(&self, actor: ActorId) -> Result<()> {
        self.pending_tx
            .send(WorkerMessage::CloseSession(actor))
            .map_err(|_| Error::WorkerGone)
    }

    /// Record a frame forwarded without entering the pipeline.
    pub fn record_bypass(&self) {
        self.metrics.record_bypassed();
    }

    pub fn metrics(&self) -> PipelineMetricsSnapshot {
        self.metrics.snapshot()
    }
}
