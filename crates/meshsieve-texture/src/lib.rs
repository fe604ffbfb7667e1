//! Meshsieve PBR channel extraction.
//!
//! [`resolve`] walks a model's material slots and turns every semantic
//! channel into decoded pixels, a constant, or an explicit absence, sharing
//! decode work through the single-flight [`DecodeCache`]. [`normalize`]
//! then flattens the bindings into one fixed-format buffer per channel
//! role, and [`png_out`] serializes those buffers byte-identically across
//! runs.

pub mod buffer;
pub mod cache;
pub mod normalize;
pub mod png_out;
pub mod resolve;

pub use buffer::PixelBuffer;
pub use cache::DecodeCache;
pub use normalize::{normalize, NormalizedChannel, NormalizedTextureSet};
pub use png_out::{PngConfig, PngError};
pub use resolve::{resolve, MaterialBinding, ResolvedChannel};
