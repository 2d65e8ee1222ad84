//! Single-frame zstd packing
//!
//! The whole payload is one zstd frame. Its compressed length becomes the
//! encrypted length, so both sizes go into the [`SizeHeader`] that is later
//! embedded and bound into the AEAD tag.

use anyhow::{bail, ensure, Context, Result};
use nsteg_core::SizeHeader;

/// Default zstd level, favouring size over speed since carrier capacity is
/// the scarce resource.
pub const DEFAULT_LEVEL: i32 = 19;

/// A compressed payload and the sizes that describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPayload {
    pub sizes: SizeHeader,
    pub compressed: Vec<u8>,
}

/// Compress `data` at zstd `level`.
pub fn pack(data: &[u8], level: i32) -> Result<PackedPayload> {
    let levels = zstd::compression_level_range();
    ensure!(
        levels.contains(&level),
        "zstd level {level} outside {}..={}",
        levels.start(),
        levels.end()
    );

    let compressed = zstd::bulk::compress(data, level).context("zstd compress payload")?;
    let Some(sizes) = SizeHeader::from_lengths(data.len(), compressed.len()) else {
        bail!(
            "payload of {} bytes ({} compressed) exceeds the 32-bit size header",
            data.len(),
            compressed.len()
        );
    };

    tracing::debug!(
        uncompressed = sizes.uncompressed,
        compressed = sizes.compressed,
        level,
        "packed payload"
    );
    Ok(PackedPayload { sizes, compressed })
}

/// Decompress a payload packed by [`pack`].
///
/// Output is capped at `sizes.uncompressed` bytes and must reach it exactly.
pub fn unpack(compressed: &[u8], sizes: &SizeHeader) -> Result<Vec<u8>> {
    ensure!(
        compressed.len() == sizes.compressed as usize,
        "compressed payload is {} bytes, header declares {}",
        compressed.len(),
        sizes.compressed
    );

    let data = zstd::bulk::decompress(compressed, sizes.uncompressed as usize)
        .context("zstd decompress payload")?;
    ensure!(
        data.len() == sizes.uncompressed as usize,
        "decompressed {} bytes, header declares {}",
        data.len(),
        sizes.uncompressed
    );

    tracing::trace!(len = data.len(), "unpacked payload");
    Ok(data)
}
