//! Pipeline integration tests: ordering, resilience, pool conservation.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{generate_sine, init_tracing, tick_pipeline_until, FRAME_SAMPLES};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use voxshift::prelude::*;
use voxshift::{pcm16_bytes, PacketAction, PacketRequest, ProcessError, VoicePipeline};

fn started_pipeline() -> VoicePipeline {
    let mut pipeline = VoicePipeline::new(PipelineConfig::default()).unwrap();
    pipeline.start().unwrap();
    pipeline
}

/// Custom action that stamps the payload so callbacks can tell it ran.
fn stamp() -> PacketAction {
    PacketAction::from_fn(|packet| {
        packet.buffer_mut().push(0xAA);
        Ok(())
    })
}

#[test]
fn test_per_actor_order_with_concurrent_producers() {
    init_tracing();
    let pipeline = started_pipeline();
    let delivered: Arc<Mutex<HashMap<u64, Vec<u32>>>> = Arc::new(Mutex::new(HashMap::new()));

    let producers: Vec<_> = (0..4u64)
        .map(|actor| {
            let handle = pipeline.handle();
            let delivered = Arc::clone(&delivered);
            std::thread::spawn(move || {
                for seq in 0..50u32 {
                    let delivered = Arc::clone(&delivered);
                    handle
                        .submit(
                            PacketRequest::new(&seq.to_le_bytes(), VoiceChannel(actor as u8))
                                .action(stamp())
                                .speaker(ActorId(actor))
                                .on_processed(move |packet| {
                                    let mut bytes = [0u8; 4];
                                    bytes.copy_from_slice(&packet.data()[..4]);
                                    delivered
                                        .lock()
                                        .entry(actor)
                                        .or_default()
                                        .push(u32::from_le_bytes(bytes));
                                }),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert!(tick_pipeline_until(&pipeline, 5000, || {
        delivered.lock().values().map(Vec::len).sum::<usize>() == 200
    }));

    let delivered = delivered.lock();
    for actor in 0..4u64 {
        let expected: Vec<u32> = (0..50).collect();
        assert_eq!(delivered[&actor], expected, "actor {} reordered", actor);
    }
}

#[test]
fn test_throwing_action_spares_neighbours() {
    let pipeline = started_pipeline();
    let handle = pipeline.handle();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let throws_on_second = PacketAction::from_fn(|packet| match packet.data() {
        [2] => Err(ProcessError::action("bad frame")),
        _ => Ok(()),
    });

    for id in 1..=3u8 {
        let seen = Arc::clone(&seen);
        handle
            .submit(
                PacketRequest::new(&[id], VoiceChannel(0))
                    .action(throws_on_second.clone())
                    .on_processed(move |packet| seen.lock().push(packet.data()[0])),
            )
            .unwrap();
    }

    assert!(tick_pipeline_until(&pipeline, 5000, || seen.lock().len() == 2));
    assert_eq!(*seen.lock(), vec![1, 3]);

    // The worker is still alive for later submissions
    let later = Arc::clone(&seen);
    handle
        .submit(
            PacketRequest::new(&[4], VoiceChannel(0))
                .action(stamp())
                .on_processed(move |packet| later.lock().push(packet.data()[0])),
        )
        .unwrap();
    assert!(tick_pipeline_until(&pipeline, 5000, || seen.lock().len() == 3));
    assert_eq!(seen.lock()[2], 4);
}

#[test]
fn test_pool_conservation_under_mixed_outcomes() {
    let pipeline = started_pipeline();
    let handle = pipeline.handle();
    let decoder = shared_decoder(Pcm16Codec);
    let encoder = shared_encoder(Pcm16Codec);
    let callbacks = Arc::new(Mutex::new(0usize));

    let voice = pcm16_bytes(&generate_sine(200.0, 48000.0, FRAME_SAMPLES));
    for i in 0..60u32 {
        let callbacks = Arc::clone(&callbacks);
        let request = match i % 4 {
            0 => PacketRequest::new(&voice, VoiceChannel(1)).pitch_shift(
                1.2,
                ActorId(1),
                &decoder,
                &encoder,
            ),
            1 => PacketRequest::new(&voice, VoiceChannel(1)).action(stamp()),
            2 => PacketRequest::new(&voice, VoiceChannel(1))
                .action(PacketAction::from_fn(|_| panic!("contained"))),
            // Odd-length payload fails to decode
            _ => PacketRequest::new(&voice[..7], VoiceChannel(1)).pitch_shift(
                0.9,
                ActorId(2),
                &decoder,
                &encoder,
            ),
        };
        handle
            .submit(request.on_processed(move |_| *callbacks.lock() += 1))
            .unwrap();
    }
    // Plus a handful with no action at all
    for _ in 0..5 {
        handle
            .submit(PacketRequest::new(&voice, VoiceChannel(1)))
            .unwrap();
    }

    assert!(tick_pipeline_until(&pipeline, 10_000, || {
        let m = pipeline.metrics();
        m.processed + m.failed + m.dropped_no_action == 65
            && pipeline.dispatcher().pending() == 0
    }));
    pipeline.tick();

    let metrics = pipeline.metrics();
    assert_eq!(metrics.acquired, metrics.released);
    assert_eq!(metrics.in_flight(), 0);
    assert_eq!(metrics.processed, 30);
    assert_eq!(metrics.failed, 30);
    assert_eq!(metrics.dropped_no_action, 5);
    assert_eq!(*callbacks.lock(), 30);
    assert_eq!(metrics.callbacks_invoked, 30);
}

#[test]
fn test_submitter_buffer_is_not_aliased() {
    let pipeline = started_pipeline();
    let handle = pipeline.handle();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut scratch = vec![1u8, 2, 3];
    let sink = Arc::clone(&seen);
    handle
        .submit(
            PacketRequest::new(&scratch, VoiceChannel(0))
                .action(stamp())
                .on_processed(move |packet| sink.lock().extend_from_slice(packet.data())),
        )
        .unwrap();
    scratch.iter_mut().for_each(|b| *b = 0);

    assert!(tick_pipeline_until(&pipeline, 5000, || !seen.lock().is_empty()));
    assert_eq!(*seen.lock(), vec![1, 2, 3, 0xAA]);
}

#[test]
fn test_callbacks_only_run_on_tick() {
    let pipeline = started_pipeline();
    let handle = pipeline.handle();
    let ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&ran);

    handle
        .submit(
            PacketRequest::new(&[0], VoiceChannel(0))
                .action(stamp())
                .on_processed(move |_| *flag.lock() = true),
        )
        .unwrap();

    // Wait for the worker without draining
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while pipeline.dispatcher().pending() == 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    assert_eq!(pipeline.dispatcher().pending(), 1);
    assert!(!*ran.lock());

    assert_eq!(pipeline.tick(), 1);
    assert!(*ran.lock());
}

#[test]
fn test_drop_joins_worker() {
    let pipeline = started_pipeline();
    let handle = pipeline.handle();
    for i in 0..10u8 {
        handle
            .submit(PacketRequest::new(&[i], VoiceChannel(0)).action(stamp()))
            .unwrap();
    }
    drop(pipeline);

    // The worker's queue went with the pipeline
    assert!(matches!(
        handle.submit(PacketRequest::new(&[0], VoiceChannel(0)).action(stamp())),
        Err(voxshift::pipeline::Error::WorkerGone)
    ));
    let metrics = handle.metrics();
    assert_eq!(metrics.acquired, metrics.released + 10);
}
