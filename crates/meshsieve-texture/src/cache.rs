//! Single-flight image decode cache.
//!
//! Keyed by the content hash of the encoded bytes, so the same underlying
//! image shared by several materials, or several assets in one batch,
//! decodes exactly once. Concurrent requests for a key converge on one
//! in-flight decode: the map lock is only held to hand out the per-key
//! cell, and waiters block on the cell itself.
//!
//! The cache is constructed at batch start and dropped at batch end. It is
//! never process-global, so two batch runs in one process cannot see each
//! other's entries.

use crate::buffer::PixelBuffer;
use meshsieve_core::AssetError;
use meshsieve_geometry::ImageResource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

type Slot = Arc<OnceLock<Result<Arc<PixelBuffer>, String>>>;

/// Batch-scoped decode cache with a single-flight guarantee per key.
#[derive(Default)]
pub struct DecodeCache {
    slots: Mutex<HashMap<String, Slot>>,
    decodes: AtomicUsize,
}

impl DecodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `resource`, or return the shared result of a previous (or
    /// concurrent) decode of the same bytes.
    pub fn get_or_decode(&self, resource: &ImageResource) -> Result<Arc<PixelBuffer>, AssetError> {
        let slot: Slot = {
            let mut slots = self.slots.lock().expect("decode cache poisoned");
            slots.entry(resource.key.clone()).or_default().clone()
        };

        let result = slot.get_or_init(|| {
            self.decodes.fetch_add(1, Ordering::Relaxed);
            decode(resource).map(Arc::new)
        });

        match result {
            Ok(buffer) => Ok(Arc::clone(buffer)),
            Err(detail) => Err(AssetError::Load(format!(
                "embedded image {} failed to decode: {detail}",
                resource.key
            ))),
        }
    }

    /// Number of decodes actually performed (not lookups).
    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }
}

fn decode(resource: &ImageResource) -> Result<PixelBuffer, String> {
    let decoded = image::load_from_memory(&resource.bytes)
        .map_err(|e| format!("{} ({})", e, resource.mime))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_rgba8(width, height, rgba.into_raw())
        .ok_or_else(|| "decoded buffer has inconsistent dimensions".to_string())
}
