//! Hardware constants for the emulated multi-processor fabric.
//!
//! The fabric is reached through a narrow bank of "wire" registers on the
//! host adapter: an inbound range the host writes and an outbound range the
//! host reads, with three ready/valid channels (instruction, input, output)
//! layered on top. This crate holds the bit-exact address map and the
//! per-channel register descriptors; it performs no I/O of its own.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channel;
pub mod wires;

pub use channel::{Channel, ChannelDesc};
pub use wires::WireAddr;
