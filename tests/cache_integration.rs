//! Integration tests for the AverageCache + Session flow.
//!
//! Tests the acceptance criteria:
//! - AC: First block size change computes and caches
//! - AC: Same (image, block size) again is a cache hit
//! - AC: Padding and style changes never recompute
//! - AC: Concurrent callers compute each key once

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use pixelate::cache::{AverageCache, ImageId};
use pixelate::pixels::{average_blocks, BlockSize, Color, PixelGrid};
use pixelate::render::{RecordingSurface, Style};
use pixelate::session::Session;

fn block(s: u32) -> BlockSize {
    BlockSize::new(s).unwrap()
}

fn gradient_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255]);
        }
    }
    data
}

fn loaded_session(cache: Arc<AverageCache>) -> Session<RecordingSurface, StdRng> {
    let mut session = Session::new(RecordingSurface::default(), StdRng::seed_from_u64(3), cache);
    session
        .load_image(&gradient_bytes(32, 24), 32, 24, ImageId::new("gradient"))
        .expect("Failed to load image");
    session
}

/// Integration test: cache flow across block size, padding and style changes.
#[test]
fn test_cache_flow_integration() {
    let cache = AverageCache::shared();
    let mut session = loaded_session(Arc::clone(&cache));

    // ===== Step 1: First change computes =====
    assert!(cache.is_empty(), "Cache should be empty initially");
    session.set_block_size(block(8)).unwrap();
    assert_eq!(cache.stats().computations, 1);
    assert!(cache.contains(&ImageId::new("gradient"), block(8)));

    // ===== Step 2: Same key again is a hit =====
    session.set_block_size(block(6)).unwrap();
    session.set_block_size(block(8)).unwrap();
    let stats = cache.stats();
    assert_eq!(stats.computations, 2, "Only 8 and 6 should have been computed");
    assert_eq!(stats.entries, 2);
    assert!(stats.hits >= 1);

    // ===== Step 3: Padding/style never recompute =====
    session.set_padding(2).unwrap();
    session.set_style(Style::Square).unwrap();
    session.set_jitter(false).unwrap();
    session.set_padding(0).unwrap();
    assert_eq!(cache.stats().computations, 2);
}

#[test]
fn test_cache_shared_between_sessions() {
    let cache = AverageCache::shared();
    let mut first = loaded_session(Arc::clone(&cache));
    let mut second = loaded_session(Arc::clone(&cache));

    first.set_block_size(block(4)).unwrap();
    second.set_block_size(block(4)).unwrap();

    assert_eq!(cache.stats().computations, 1);
    assert_eq!(first.averaged(), second.averaged());
}

#[test]
fn test_different_images_do_not_share_entries() {
    let cache = AverageCache::shared();
    let mut session = loaded_session(Arc::clone(&cache));
    session.set_block_size(block(4)).unwrap();

    session
        .load_image(&gradient_bytes(32, 24), 32, 24, ImageId::new("other"))
        .unwrap();
    session.set_block_size(block(4)).unwrap();

    assert_eq!(cache.stats().computations, 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_concurrent_get_or_compute_runs_once() {
    let cache = AverageCache::shared();
    let pixels = Arc::new(PixelGrid::filled(64, 64, Color::WHITE));
    let runs = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let pixels = Arc::clone(&pixels);
            let runs = Arc::clone(&runs);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_compute(ImageId::new("shared"), block(4), || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    average_blocks(&pixels, block(4))
                })
            })
        })
        .collect();

    let grids: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().computations, 1);
    assert!(grids.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_clear_forces_recompute() {
    let cache = AverageCache::shared();
    let mut session = loaded_session(Arc::clone(&cache));
    session.set_block_size(block(5)).unwrap();
    cache.clear();
    assert!(cache.get(&ImageId::new("gradient"), block(5)).is_none());

    // The session still holds its current grid, so re-rendering at the
    // same size does not go back to the cache
    session.set_padding(1).unwrap();
    assert_eq!(cache.stats().computations, 1);

    session.set_block_size(block(6)).unwrap();
    session.set_block_size(block(5)).unwrap();
    assert_eq!(cache.stats().computations, 3);
}
