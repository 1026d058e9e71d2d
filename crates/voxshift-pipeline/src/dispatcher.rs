//! Output-side drain, run once per scheduler tick.

use crate::error::panic_message;
use crate::packet::Packet;
use crate::{PacketPool, PipelineMetrics};
use crossbeam_channel::Receiver;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Delivers processed packets to their completion callbacks.
///
/// Callbacks run on whichever thread calls [`drain`](Self::drain), which lets
/// the host keep network sends on its own tick thread.
pub struct FrameDispatcher {
    output_rx: Receiver<Box<Packet>>,
    pool: PacketPool,
    metrics: Arc<PipelineMetrics>,
}

impl FrameDispatcher {
    pub(crate) fn new(
        output_rx: Receiver<Box<Packet>>,
        pool: PacketPool,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            output_rx,
            pool,
            metrics,
        }
    }

    /// Run the callback of every processed packet currently queued, in
    /// completion order, and return the packets to the pool.
    ///
    /// Packets completed while this runs are left for the next call.
    /// Returns how many packets were drained.
    pub fn drain(&self) -> usize {
        let mut drained = 0;
        for _ in 0..self.output_rx.len() {
            let Ok(mut packet) = self.output_rx.try_recv() else {
                break;
            };
            drained += 1;

            if let Some(callback) = packet.on_processed.take() {
                self.metrics.record_callback();
                let packet_ref: &Packet = &packet;
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(packet_ref))) {
                    self.metrics.record_callback_panic();
                    tracing::error!(
                        "Completion callback panicked on {}: {}",
                        packet.channel,
                        panic_message(payload.as_ref())
                    );
                }
            }

            self.pool.release(packet);
        }
        drained
    }

    /// Processed packets waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.output_rx.len()
    }
}
