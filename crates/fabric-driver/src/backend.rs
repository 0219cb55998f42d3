//! Backend selection
//!
//! Mirrors the usual open-the-best-transport flow: prefer the hardware
//! window when the adapter is present, fall back to the simulator so the
//! same session code runs everywhere.

use crate::backends::{SimBackend, XdmaBackend};
use crate::bus::RegisterBus;
use crate::error::Result;

/// Which register-bus transport to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    /// Try XDMA hardware first, fall back to the simulator.
    Auto,
    /// Require the XDMA hardware transport.
    Xdma,
    /// Use the in-process simulator.
    Sim,
}

/// Open a register bus according to `selection`.
///
/// `pcie_addr` names the host adapter (e.g. `0000:3b:00.0`); it is ignored
/// by the simulator.
///
/// # Errors
///
/// Returns an error if the requested transport cannot be opened; `Auto`
/// never fails, since the simulator is always available.
pub fn select_backend(selection: BackendSelection, pcie_addr: &str) -> Result<Box<dyn RegisterBus>> {
    match selection {
        BackendSelection::Auto => match XdmaBackend::open(pcie_addr) {
            Ok(backend) => {
                tracing::info!("Using XDMA backend for {pcie_addr}");
                Ok(Box::new(backend))
            }
            Err(e) => {
                tracing::info!("XDMA unavailable ({e}), using simulator");
                Ok(Box::new(SimBackend::new()))
            }
        },
        BackendSelection::Xdma => {
            XdmaBackend::open(pcie_addr).map(|b| Box::new(b) as Box<dyn RegisterBus>)
        }
        BackendSelection::Sim => Ok(Box::new(SimBackend::new())),
    }
}
