//! Host driver for the emulated multi-processor fabric.
//!
//! The fabric hangs off a narrow bank of memory-mapped "wire" registers on
//! the host adapter. Three ready/valid channels are layered on those wires
//! — instruction enqueue, input-stream enqueue, output-stream dequeue —
//! plus scalar control registers for reset, step count, and active
//! processors. This crate turns that register bank into ordered,
//! backpressure-aware queue operations and a session lifecycle.
//!
//! # Layers
//!
//! ```text
//! Session          reset / configure / per-channel operations
//!   Queue driver   generic ready/valid enqueue + dequeue, retry policy
//!     RegisterBus  read(addr) / write(addr, value, mask)
//!       Backends   XDMA char device  |  in-process simulator
//! ```
//!
//! # Quick start
//!
//! ```
//! use fabric_driver::{RetryPolicy, Session, SimBackend};
//!
//! # fn main() -> fabric_driver::Result<()> {
//! let mut session = Session::new(SimBackend::new());
//! session.reset()?;
//! session.configure(6, 6)?;
//!
//! session.enqueue_instruction(0x80, 0x01, RetryPolicy::unbounded())?;
//! session.enqueue_input(0x4, RetryPolicy::unbounded())?;
//! let out = session.dequeue_output(RetryPolicy::bounded(1000))?;
//! # assert_eq!(out, 0x4);
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency model
//!
//! Single-threaded and synchronous. The transport serializes register
//! accesses in issue order with no protection of its own, so the session
//! owns the bus exclusively and blocking waits are spin-polls on the
//! calling thread. Callers interleave `try_*` calls from one control loop
//! instead of sharing channels across threads.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod backend;
pub mod backends;
mod bus;
mod error;
pub mod queue;
mod session;

pub use backend::{select_backend, BackendSelection};
pub use backends::{SimBackend, XdmaBackend};
pub use bus::{RegisterBus, MASK_ALL};
pub use error::{FabricError, Result};
pub use queue::RetryPolicy;
pub use session::{GateStatus, Session};

pub use fabric_chip::{channel, wires, Channel, ChannelDesc, WireAddr};
