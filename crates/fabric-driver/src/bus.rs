//! Register bus abstraction
//!
//! The sole primitive the rest of the driver is written against: addressable
//! 32-bit reads and masked writes over the adapter's wire registers. The
//! trait takes `&mut self` throughout — a read forces a bus transaction and
//! the underlying transport serializes accesses in issue order with no
//! concurrent-access protection of its own, so exclusive ownership is the
//! locking discipline.

use std::fmt::Debug;

use fabric_chip::WireAddr;

use crate::error::Result;

/// Write mask selecting every bit of a wire register.
pub const MASK_ALL: u32 = u32::MAX;

/// Addressable read/write access to the device's wire registers.
///
/// Implementations own the physical (or simulated) link. Failure is
/// transport-level only; flow control is layered above in [`crate::queue`].
pub trait RegisterBus: Debug + Send {
    /// Read one outbound wire register.
    ///
    /// Forces a fresh device-side sample before returning, so two
    /// consecutive reads of the same address may legitimately differ.
    ///
    /// # Errors
    ///
    /// Returns an error only on a transport fault.
    fn read(&mut self, addr: WireAddr) -> Result<u32>;

    /// Write the bits of `addr` selected by `mask`; unselected bits keep
    /// their prior device-side value. Commits immediately.
    ///
    /// # Errors
    ///
    /// Returns an error only on a transport fault.
    fn write_masked(&mut self, addr: WireAddr, value: u32, mask: u32) -> Result<()>;

    /// Write a full wire register (mask = all ones).
    ///
    /// # Errors
    ///
    /// Returns an error only on a transport fault.
    fn write(&mut self, addr: WireAddr, value: u32) -> Result<()> {
        self.write_masked(addr, value, MASK_ALL)
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn read(&mut self, addr: WireAddr) -> Result<u32> {
        (**self).read(addr)
    }

    fn write_masked(&mut self, addr: WireAddr, value: u32, mask: u32) -> Result<()> {
        (**self).write_masked(addr, value, mask)
    }

    fn write(&mut self, addr: WireAddr, value: u32) -> Result<()> {
        (**self).write(addr, value)
    }
}
