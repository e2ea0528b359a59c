//! Start/end preview thumbnails with stale-request cancellation.
//!
//! Each logical slot (start frame, end frame) carries a generation
//! counter. Issuing a new request for a slot bumps its generation; a
//! worker finishing an older request finds its generation stale and drops
//! the result, so only the latest requested timestamp is ever delivered.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use image::DynamicImage;

use super::frame::FrameSource;
use crate::models::MediaTime;

/// Logical preview slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailSlot {
    /// Preview of the trim start frame.
    Start,
    /// Preview of the trim end frame.
    End,
}

impl ThumbnailSlot {
    fn index(self) -> usize {
        match self {
            ThumbnailSlot::Start => 0,
            ThumbnailSlot::End => 1,
        }
    }
}

/// Background thumbnail extractor for the two preview slots.
pub struct ThumbnailService {
    source: Arc<dyn FrameSource>,
    generations: Arc<[AtomicU64; 2]>,
    max_dimension: u32,
}

impl ThumbnailService {
    /// Create a service over a frame source.
    ///
    /// `max_dimension` caps the longer edge of every delivered thumbnail.
    pub fn new(source: Arc<dyn FrameSource>, max_dimension: u32) -> Self {
        Self {
            source,
            generations: Arc::new([AtomicU64::new(0), AtomicU64::new(0)]),
            max_dimension,
        }
    }

    /// Request the frame at `at` for a slot.
    ///
    /// Supersedes any outstanding request for the same slot; the stale
    /// request's result is dropped, not delivered. Extraction failures are
    /// logged and nothing is delivered (the previous preview stays up).
    pub fn request<F>(&self, asset: &Path, slot: ThumbnailSlot, at: MediaTime, deliver: F)
    where
        F: FnOnce(ThumbnailSlot, DynamicImage) + Send + 'static,
    {
        let generation = self.generations[slot.index()].fetch_add(1, Ordering::SeqCst) + 1;
        let generations = Arc::clone(&self.generations);
        let source = Arc::clone(&self.source);
        let asset: PathBuf = asset.to_path_buf();
        let max_dimension = self.max_dimension;

        thread::spawn(move || {
            let result = source.extract_frame(&asset, at, Some(max_dimension));

            if generations[slot.index()].load(Ordering::SeqCst) != generation {
                tracing::trace!("Dropping stale {:?} thumbnail (generation {})", slot, generation);
                return;
            }

            match result {
                Ok(img) => deliver(slot, img),
                Err(e) => tracing::warn!("Thumbnail extraction failed: {}", e),
            }
        });
    }

    /// Invalidate all outstanding requests without issuing new ones.
    pub fn cancel_all(&self) {
        for generation in self.generations.iter() {
            generation.fetch_add(1, Ordering::SeqCst);
        }
    }
}
