//! Register-bus backends
//!
//! Two transports implement [`crate::RegisterBus`]:
//! - **Xdma**: the hardware path through `/dev/xdma<N>_user` (AXI-Lite
//!   window over PCIe).
//! - **Sim**: an in-process model of the fabric front end, used for CI,
//!   protocol tests, and running without hardware.

pub mod sim;
pub mod xdma;

pub use sim::SimBackend;
pub use xdma::XdmaBackend;
