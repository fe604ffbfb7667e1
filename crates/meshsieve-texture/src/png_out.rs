//! Deterministic PNG writer.
//!
//! Fixed compression settings so the same pixel buffer always serializes
//! to byte-identical output; the manifest records BLAKE3 hashes of the
//! written files and those hashes must be reproducible across runs.

use crate::buffer::PixelBuffer;
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors from PNG encoding.
#[derive(Debug, Error)]
pub enum PngError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),
}

/// PNG export configuration.
#[derive(Debug, Clone)]
pub struct PngConfig {
    /// Fixed compression level.
    pub compression: Compression,
    /// Fixed filter. `NoFilter` keeps the byte stream independent of
    /// encoder heuristics.
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

/// Write an RGBA buffer to any writer.
pub fn write_rgba_to_writer<W: Write>(
    buffer: &PixelBuffer,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    let mut encoder = Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&buffer.data)?;
    Ok(())
}

/// Write an RGBA buffer to a PNG file.
pub fn write_rgba(buffer: &PixelBuffer, path: &Path, config: &PngConfig) -> Result<(), PngError> {
    let file = std::fs::File::create(path)?;
    write_rgba_to_writer(buffer, std::io::BufWriter::new(file), config)
}

/// Encode to memory and return the bytes with their BLAKE3 hash.
pub fn write_rgba_to_vec_with_hash(
    buffer: &PixelBuffer,
    config: &PngConfig,
) -> Result<(Vec<u8>, String), PngError> {
    let mut data = Vec::new();
    write_rgba_to_writer(buffer, &mut data, config)?;
    let hash = blake3::hash(&data).to_hex().to_string();
    Ok((data, hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_encoding_is_deterministic() {
        let mut buffer = PixelBuffer::uniform(32, 32, [0, 0, 0, 255]);
        for y in 0..32u32 {
            for x in 0..32u32 {
                let idx = ((y * 32 + x) * 4) as usize;
                buffer.data[idx] = (x * 8) as u8;
                buffer.data[idx + 1] = (y * 8) as u8;
            }
        }

        let config = PngConfig::default();
        let (data1, hash1) = write_rgba_to_vec_with_hash(&buffer, &config).unwrap();
        let (data2, hash2) = write_rgba_to_vec_with_hash(&buffer, &config).unwrap();
        assert_eq!(data1, data2);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_written_file_matches_memory_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let buffer = PixelBuffer::uniform(8, 8, [200, 100, 50, 255]);
        let config = PngConfig::default();

        write_rgba(&buffer, &path, &config).unwrap();
        let on_disk = std::fs::read(&path).unwrap();
        let (in_memory, _) = write_rgba_to_vec_with_hash(&buffer, &config).unwrap();
        assert_eq!(on_disk, in_memory);
    }
}
