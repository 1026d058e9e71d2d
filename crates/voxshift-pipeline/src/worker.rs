//! Dedicated thread that applies packet actions.

use crate::bank::VocoderBank;
use crate::error::panic_message;
use crate::packet::{Packet, PacketAction};
use crate::{CodecError, Error, PacketPool, PipelineConfig, PipelineMetrics, ProcessError, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use thread_priority::ThreadPriority;
use voxshift_core::ActorId;

/// Messages on the pending queue.
///
/// Session changes travel in-band so they are ordered with the packets
/// submitted around them.
pub(crate) enum WorkerMessage {
    Process(Box<Packet>),
    OpenSession(ActorId),
    CloseSession(ActorId),
    Shutdown,
}

/// State that survives a stop/start cycle.
pub(crate) struct WorkerState {
    pending_rx: Receiver<WorkerMessage>,
    bank: VocoderBank,
}

impl WorkerState {
    pub(crate) fn new(pending_rx: Receiver<WorkerMessage>, config: &PipelineConfig) -> Self {
        Self {
            pending_rx,
            bank: VocoderBank::new(config.vocoder),
        }
    }
}

/// Owner of the worker thread.
pub(crate) struct PitchWorker {
    pending_tx: Sender<WorkerMessage>,
    output_tx: Sender<Box<Packet>>,
    pool: PacketPool,
    metrics: Arc<PipelineMetrics>,
    config: PipelineConfig,
    /// Parked while the thread is not running
    state: Option<WorkerState>,
    thread_handle: Option<JoinHandle<WorkerState>>,
}

impl PitchWorker {
    pub(crate) fn new(
        pending_tx: Sender<WorkerMessage>,
        state: WorkerState,
        output_tx: Sender<Box<Packet>>,
        pool: PacketPool,
        metrics: Arc<PipelineMetrics>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            pending_tx,
            output_tx,
            pool,
            metrics,
            config,
            state: Some(state),
            thread_handle: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    pub(crate) fn start(&mut self) -> Result<()> {
        if self.thread_handle.is_some() {
            return Ok(());
        }
        let Some(state) = self.state.take() else {
            return Err(Error::WorkerGone);
        };

        let context = WorkerContext {
            output_tx: self.output_tx.clone(),
            pool: self.pool.clone(),
            metrics: Arc::clone(&self.metrics),
            config: self.config.clone(),
            scratch: vec![0.0; self.config.frame_samples],
        };
        let elevate = self.config.elevate_worker_priority;

        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                if elevate {
                    if let Err(e) =
                        thread_priority::set_current_thread_priority(ThreadPriority::Max)
                    {
                        tracing::warn!("Could not raise worker priority: {:?}", e);
                    }
                }
                worker_loop(state, context)
            })
            .map_err(|e| Error::WorkerSpawn(e.to_string()))?;

        tracing::info!("Started pipeline worker '{}'", self.config.thread_name);
        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Finish everything queued so far, then join the thread.
    pub(crate) fn stop(&mut self) {
        let Some(handle) = self.thread_handle.take() else {
            return;
        };
        let _ = self.pending_tx.send(WorkerMessage::Shutdown);

        match handle.join() {
            Ok(state) => self.state = Some(state),
            Err(payload) => tracing::error!(
                "Pipeline worker panicked outside packet processing: {}",
                panic_message(payload.as_ref())
            ),
        }
        tracing::info!("Stopped pipeline worker '{}'", self.config.thread_name);
    }
}

impl Drop for PitchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the loop needs besides the queue and vocoder state.
struct WorkerContext {
    output_tx: Sender<Box<Packet>>,
    pool: PacketPool,
    metrics: Arc<PipelineMetrics>,
    config: PipelineConfig,
    /// Decoded PCM for the packet being processed
    scratch: Vec<f32>,
}

fn worker_loop(mut state: WorkerState, mut context: WorkerContext) -> WorkerState {
    let idle_sleep = context.config.idle_sleep();

    loop {
        let mut handled = false;

        loop {
            match state.pending_rx.try_recv() {
                Ok(WorkerMessage::Process(packet)) => {
                    handled = true;
                    context.process_packet(&mut state.bank, packet);
                }
                Ok(WorkerMessage::OpenSession(actor)) => {
                    handled = true;
                    if let Err(e) = state.bank.open(actor) {
                        tracing::warn!("Failed to open vocoder for {}: {}", actor, e);
                    }
                }
                Ok(WorkerMessage::CloseSession(actor)) => {
                    handled = true;
                    state.bank.close(actor);
                }
                Ok(WorkerMessage::Shutdown) => {
                    tracing::debug!("Worker shutting down with {} vocoders", state.bank.len());
                    return state;
                }
                Err(TryRecvError::Empty) => break,
                // Every sender is gone, so nothing more can arrive
                Err(TryRecvError::Disconnected) => return state,
            }
        }

        if !handled {
            thread::sleep(idle_sleep);
        }
    }
}

impl WorkerContext {
    fn process_packet(&mut self, bank: &mut VocoderBank, mut packet: Box<Packet>) {
        let Some(action) = packet.action.clone() else {
            self.metrics.record_dropped_no_action();
            self.pool.release(packet);
            return;
        };

        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.apply(bank, &action, &mut packet)
        }))
        .unwrap_or_else(|payload| Err(ProcessError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(()) => {
                self.metrics.record_processed(started.elapsed());
                if let Err(returned) = self.output_tx.send(packet) {
                    // Dispatcher dropped; nothing will drain this packet
                    self.pool.release(returned.into_inner());
                }
            }
            Err(e) => {
                self.metrics.record_failed();
                match packet.speaker {
                    Some(actor) => tracing::warn!(
                        "Dropped packet from {} on {}: {}",
                        actor,
                        packet.channel,
                        e
                    ),
                    None => tracing::warn!("Dropped packet on {}: {}", packet.channel, e),
                }
                self.pool.release(packet);
            }
        }
    }

    fn apply(
        &mut self,
        bank: &mut VocoderBank,
        action: &PacketAction,
        packet: &mut Packet,
    ) -> std::result::Result<(), ProcessError> {
        match action {
            PacketAction::PitchShift => self.pitch_shift(bank, packet),
            PacketAction::Custom(modifier) => modifier.modify(packet),
        }
    }

    /// Decode, shift with the speaker's vocoder, re-encode into the packet.
    fn pitch_shift(
        &mut self,
        bank: &mut VocoderBank,
        packet: &mut Packet,
    ) -> std::result::Result<(), ProcessError> {
        let actor = packet.speaker.ok_or(ProcessError::MissingSpeaker)?;
        let decoder = packet
            .decoder
            .as_ref()
            .ok_or(ProcessError::MissingCodec)?
            .upgrade()
            .ok_or(ProcessError::HandleReleased(actor))?;
        let encoder = packet
            .encoder
            .as_ref()
            .ok_or(ProcessError::MissingCodec)?
            .upgrade()
            .ok_or(ProcessError::HandleReleased(actor))?;

        let decoded = decoder.lock().decode(&packet.buffer, &mut self.scratch)?;
        let pcm = &mut self.scratch[..decoded];

        bank.get_or_create(actor)?
            .shift(packet.pitch, self.config.sample_rate, pcm);

        packet.buffer.resize(self.config.max_packet_bytes, 0);
        let encoded = encoder.lock().encode(pcm, &mut packet.buffer)?;
        if encoded > packet.buffer.len() {
            return Err(CodecError::new(format!(
                "encoder reported {} bytes into a {} byte buffer",
                encoded,
                packet.buffer.len()
            ))
            .into());
        }
        packet.buffer.truncate(encoded);
        Ok(())
    }
}
