//! Simulated fabric backend
//!
//! Implements [`RegisterBus`] against an in-process model of the adapter's
//! wire front end: level-held inbound wires, edge-sampled valid/ready
//! pulses, bounded queues behind the three channels, and the reset wire
//! clearing everything device-side. Inputs loop back to the output queue,
//! which is enough to drive a full session without hardware.
//!
//! This backend doubles as the test instrument for the protocol: it keeps
//! a journal of every register access in issue order, exposes a snapshot
//! of device state for drift checks, and can pin an outbound wire low to
//! simulate a channel that never becomes ready.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use fabric_chip::wires::{inbound, outbound, RESET_MASK};
use fabric_chip::WireAddr;

use crate::bus::RegisterBus;
use crate::error::{FabricError, Result};

/// Default depth of the simulated channel queues.
const DEFAULT_DEPTH: usize = 16;

/// One recorded register access, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// A read of `addr`.
    Read {
        /// Wire address read.
        addr: WireAddr,
    },
    /// A masked write of `value` to `addr`.
    Write {
        /// Wire address written.
        addr: WireAddr,
        /// Value supplied by the driver.
        value: u32,
        /// Bit mask supplied by the driver.
        mask: u32,
    },
}

/// Opaque copy of the simulated device state, for drift comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    wires: BTreeMap<WireAddr, u32>,
    insns: VecDeque<(u32, u32)>,
    outputs: VecDeque<u32>,
}

/// In-process simulation of the fabric's wire interface.
#[derive(Debug)]
pub struct SimBackend {
    /// Current level of every inbound wire, keyed by address.
    wires: BTreeMap<WireAddr, u32>,
    /// Instructions accepted through the instruction channel, (hi, lo).
    insns: VecDeque<(u32, u32)>,
    /// Output queue; inputs loop back here.
    outputs: VecDeque<u32>,
    depth: usize,
    pinned_low: BTreeSet<WireAddr>,
    journal: Vec<Access>,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend {
    /// Create a simulator with the default queue depth.
    #[must_use]
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_DEPTH)
    }

    /// Create a simulator whose channel queues hold `depth` entries.
    #[must_use]
    pub fn with_depth(depth: usize) -> Self {
        Self {
            wires: BTreeMap::new(),
            insns: VecDeque::new(),
            outputs: VecDeque::new(),
            depth,
            pinned_low: BTreeSet::new(),
            journal: Vec::new(),
        }
    }

    /// Force reads of `addr` to return zero until [`Self::unpin`].
    pub fn pin_low(&mut self, addr: WireAddr) {
        self.pinned_low.insert(addr);
    }

    /// Remove a [`Self::pin_low`] override.
    pub fn unpin(&mut self, addr: WireAddr) {
        self.pinned_low.remove(&addr);
    }

    /// Preload a word into the device's output queue.
    pub fn push_output(&mut self, word: u32) {
        self.outputs.push_back(word);
    }

    /// Instructions the device has accepted so far, in arrival order.
    #[must_use]
    pub fn accepted_instructions(&self) -> Vec<(u32, u32)> {
        self.insns.iter().copied().collect()
    }

    /// Words currently queued on the output channel.
    #[must_use]
    pub fn pending_outputs(&self) -> Vec<u32> {
        self.outputs.iter().copied().collect()
    }

    /// Every register access issued against this backend, in order.
    #[must_use]
    pub fn journal(&self) -> &[Access] {
        &self.journal
    }

    /// Discard the recorded journal.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Copy of the device state (wires and queues, not the journal).
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            wires: self.wires.clone(),
            insns: self.insns.clone(),
            outputs: self.outputs.clone(),
        }
    }

    fn wire(&self, addr: WireAddr) -> u32 {
        self.wires.get(&addr).copied().unwrap_or(0)
    }

    /// Instruction ready is gated on the run scalars being configured,
    /// matching the fabric top's behavior after reset.
    fn insns_ready(&self) -> bool {
        self.insns.len() < self.depth
            && self.wire(inbound::HOST_STEPS) != 0
            && self.wire(inbound::USED_PROCS) != 0
    }

    const fn is_outbound(addr: WireAddr) -> bool {
        outbound::INSNS_READY <= addr && addr <= outbound::IO_O_BITS_0
    }
}

impl RegisterBus for SimBackend {
    fn read(&mut self, addr: WireAddr) -> Result<u32> {
        self.journal.push(Access::Read { addr });
        if self.pinned_low.contains(&addr) {
            return Ok(0);
        }
        let value = match addr {
            outbound::INSNS_READY => u32::from(self.insns_ready()),
            outbound::IO_I_READY => u32::from(self.outputs.len() < self.depth),
            outbound::IO_O_VALID => u32::from(!self.outputs.is_empty()),
            outbound::IO_O_BITS_0 => self.outputs.front().copied().unwrap_or(0),
            _ => self.wire(addr),
        };
        Ok(value)
    }

    fn write_masked(&mut self, addr: WireAddr, value: u32, mask: u32) -> Result<()> {
        self.journal.push(Access::Write { addr, value, mask });
        if Self::is_outbound(addr) {
            return Err(FabricError::transport(format!(
                "write to read-only outbound wire {addr:#04x}"
            )));
        }

        let old = self.wire(addr);
        let new = (old & !mask) | (value & mask);
        self.wires.insert(addr, new);
        let rising = old == 0 && new != 0;

        match addr {
            inbound::RESET if new & RESET_MASK != 0 => {
                tracing::debug!("sim: reset asserted, dropping queued state");
                self.insns.clear();
                self.outputs.clear();
            }
            inbound::INSNS_VALID if rising => {
                if self.insns_ready() {
                    let hi = self.wire(inbound::INSNS_BITS_1);
                    let lo = self.wire(inbound::INSNS_BITS_0);
                    self.insns.push_back((hi, lo));
                    tracing::trace!(hi, lo, "sim: instruction accepted");
                }
            }
            inbound::IO_I_VALID if rising => {
                if self.outputs.len() < self.depth {
                    // Loopback: the simulated fabric echoes inputs.
                    let word = self.wire(inbound::IO_I_BITS_0);
                    self.outputs.push_back(word);
                    tracing::trace!(word, "sim: input accepted");
                }
            }
            inbound::IO_O_READY if rising => {
                let _ = self.outputs.pop_front();
            }
            _ => {}
        }
        Ok(())
    }
}
