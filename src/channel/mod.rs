//! Per-transportation broadcast groups for live position updates.
//!
//! Groups live only in memory and carry no authoritative state; everything a
//! member sees has already been written to the store.

pub mod hub;
pub mod protocol;

pub use hub::{ChannelEvent, ChannelHub};
