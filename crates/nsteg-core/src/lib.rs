pub mod config;
pub mod error;
pub mod types;

pub use error::{NstegError, NstegResult};
pub use types::SizeHeader;
