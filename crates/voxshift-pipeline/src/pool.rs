//! Free list of reusable packets.

use crate::packet::Packet;
use crate::PipelineMetrics;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

/// Thread-safe packet pool.
///
/// `acquire` and `release` may be called from any thread. The pool grows on
/// demand and never shrinks; released packets keep their buffer allocation.
#[derive(Clone)]
pub struct PacketPool {
    free_tx: Sender<Box<Packet>>,
    free_rx: Receiver<Box<Packet>>,
    packet_capacity: usize,
    metrics: Arc<PipelineMetrics>,
}

impl PacketPool {
    /// Create a pool holding `preallocated` packets of `packet_capacity` bytes.
    pub fn new(preallocated: usize, packet_capacity: usize, metrics: Arc<PipelineMetrics>) -> Self {
        let (free_tx, free_rx) = unbounded();
        let pool = Self {
            free_tx,
            free_rx,
            packet_capacity,
            metrics,
        };
        for _ in 0..preallocated {
            pool.metrics.record_allocated();
            let _ = pool
                .free_tx
                .send(Box::new(Packet::with_capacity(packet_capacity)));
        }
        pool
    }

    /// Take a cleared packet, allocating a new one when the pool is empty.
    pub fn acquire(&self) -> Box<Packet> {
        self.metrics.record_acquired();
        match self.free_rx.try_recv() {
            Ok(packet) => packet,
            Err(_) => {
                self.metrics.record_allocated();
                Box::new(Packet::with_capacity(self.packet_capacity))
            }
        }
    }

    /// Clear a packet and return it to the free list.
    pub fn release(&self, mut packet: Box<Packet>) {
        packet.clear();
        self.metrics.record_released();
        // Both ends live in `self`, so the channel cannot be disconnected.
        let _ = self.free_tx.send(packet);
    }

    /// Packets currently idle in the pool.
    pub fn available(&self) -> usize {
        self.free_rx.len()
    }

    pub fn packet_capacity(&self) -> usize {
        self.packet_capacity
    }
}
