//! XDMA transport backend
//!
//! Reaches the fabric's wire registers through the Xilinx XDMA character
//! device: `/dev/xdma<N>_user` maps the AXI-Lite control window, one wire
//! per 32-bit word. Discovery walks PCIe sysfs to verify the device identity
//! and find the XDMA instance number; bitstream loading and clock setup are
//! assumed complete before this backend is opened.
//!
//! AXI-Lite has no per-bit write strobe at wire granularity, so non-trivial
//! write masks are emulated by read-modify-write against a host-side shadow
//! of the inbound wires (inbound wires cannot be read back from the device).

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fabric_chip::WireAddr;
use rustix::io::{pread, pwrite};

use crate::bus::{RegisterBus, MASK_ALL};
use crate::error::{FabricError, Result};

/// PCIe vendor id of the host adapter (Xilinx).
const XILINX_VENDOR_ID: u32 = 0x10ee;

/// Byte stride between consecutive wire registers in the AXIL window.
const WIRE_STRIDE: u64 = 4;

/// Wire-register access over `/dev/xdma<N>_user`.
#[derive(Debug)]
pub struct XdmaBackend {
    user: File,
    /// Last committed value of each inbound wire, for masked writes.
    shadow: BTreeMap<WireAddr, u32>,
}

impl XdmaBackend {
    /// Open the XDMA control device for the adapter at `pcie_addr`
    /// (e.g. `0000:3b:00.0`).
    ///
    /// # Errors
    ///
    /// Returns an error if the sysfs node is missing, the vendor id does
    /// not match, no XDMA instance is bound, or the character device
    /// cannot be opened.
    pub fn open(pcie_addr: &str) -> Result<Self> {
        let sysfs = PathBuf::from(format!("/sys/bus/pci/devices/{pcie_addr}"));
        if !sysfs.exists() {
            return Err(FabricError::device_not_found(sysfs));
        }

        let vendor = read_sysfs_id(&sysfs.join("vendor"))?;
        if vendor != XILINX_VENDOR_ID {
            return Err(FabricError::transport(format!(
                "{pcie_addr}: vendor {vendor:#06x}, expected {XILINX_VENDOR_ID:#06x}"
            )));
        }

        let xdma_id = find_xdma_id(&sysfs.join("xdma"))?;
        let user_path = format!("/dev/xdma{xdma_id}_user");
        tracing::info!("Opening XDMA control device {user_path}");

        let user = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&user_path)
            .map_err(|e| {
                tracing::error!("Cannot open {user_path}: {e}");
                FabricError::from(e)
            })?;

        Ok(Self {
            user,
            shadow: BTreeMap::new(),
        })
    }

    /// Wrap an already open file as the control window.
    ///
    /// Used by tests to exercise the transport against a plain file; any
    /// seekable read/write file behaves like a register window.
    #[must_use]
    pub fn from_file(user: File) -> Self {
        Self {
            user,
            shadow: BTreeMap::new(),
        }
    }

    const fn offset(addr: WireAddr) -> u64 {
        addr as u64 * WIRE_STRIDE
    }
}

impl RegisterBus for XdmaBackend {
    fn read(&mut self, addr: WireAddr) -> Result<u32> {
        let mut buf = [0u8; 4];
        pread(&self.user, &mut buf, Self::offset(addr))
            .map_err(|e| FabricError::transport(format!("read of wire {addr:#04x} failed: {e}")))?;
        let value = u32::from_le_bytes(buf);
        tracing::trace!(addr, value, "xdma read");
        Ok(value)
    }

    fn write_masked(&mut self, addr: WireAddr, value: u32, mask: u32) -> Result<()> {
        let merged = if mask == MASK_ALL {
            value
        } else {
            let old = self.shadow.get(&addr).copied().unwrap_or(0);
            (old & !mask) | (value & mask)
        };
        pwrite(&self.user, &merged.to_le_bytes(), Self::offset(addr)).map_err(|e| {
            FabricError::transport(format!("write of wire {addr:#04x} failed: {e}"))
        })?;
        self.shadow.insert(addr, merged);
        tracing::trace!(addr, value = merged, "xdma write");
        Ok(())
    }
}

/// Read a sysfs hex id file of the form `0x10ee`.
fn read_sysfs_id(path: &Path) -> Result<u32> {
    let text = std::fs::read_to_string(path)?;
    let text = text.trim();
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u32::from_str_radix(digits, 16)
        .map_err(|e| FabricError::transport(format!("{}: bad id {text:?}: {e}", path.display())))
}

/// Find the XDMA instance number under a device's `xdma/` sysfs directory
/// by locating the `xdma<N>_h2c_0` entry.
fn find_xdma_id(xdma_dir: &Path) -> Result<u32> {
    let entries = std::fs::read_dir(xdma_dir)
        .map_err(|_| FabricError::device_not_found(xdma_dir))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(rest) = name.strip_prefix("xdma") {
            if name.ends_with("_h2c_0") {
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                if let Ok(id) = digits.parse() {
                    tracing::debug!("Found XDMA instance {id} ({name})");
                    return Ok(id);
                }
            }
        }
    }
    Err(FabricError::transport(format!(
        "no XDMA instance under {}",
        xdma_dir.display()
    )))
}
