//! Stream type negotiation.
//!
//! The sink's preference list is scanned in order and the first stream type
//! the source supports wins, so the consumer gets first refusal.

use crate::enums::StreamType;
use crate::error::{Result, StreamError};
use crate::traits::source::Source;

/// First entry of `preferred` that `source` supports.
pub fn negotiate<S: Source + ?Sized>(source: &S, preferred: &[StreamType]) -> Result<StreamType> {
    preferred
        .iter()
        .copied()
        .find(|&st| source.supports(st))
        .ok_or_else(|| StreamError::UnsupportedStreamingMode {
            preferred: preferred.to_vec(),
        })
}
