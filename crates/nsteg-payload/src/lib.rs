//! nsteg-payload: payload compression ahead of encryption
//!
//! # Overview
//! - `pack`: zstd-compress a payload and record its [`SizeHeader`]
//! - `unpack`: decompress, refusing output that disagrees with the header
//!
//! [`SizeHeader`]: nsteg_core::SizeHeader

pub mod pack;

pub use pack::{pack, unpack, PackedPayload, DEFAULT_LEVEL};
