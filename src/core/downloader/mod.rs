mod checksum;
mod client;

pub use checksum::{Checksum, HashType};
pub use client::{write_atomic, Downloader};
