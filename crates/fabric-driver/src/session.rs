//! Fabric session controller
//!
//! A [`Session`] is the live binding between the driver and one device
//! instance: it owns the register bus exclusively for its lifetime and
//! composes the three channel drivers with the scalar control registers
//! into one lifecycle: construct → reset → configure → operate.
//!
//! Sequencing beyond that is the caller's responsibility. In particular,
//! `configure` must follow `reset` before any channel operation — the
//! fabric gates the instruction channel's ready on the run scalars — and
//! `reset` must never race a blocking enqueue/dequeue (a reset can drop
//! the ready bit the blocked loop is spinning on).

use fabric_chip::channel::{Channel, INPUT, INSTRUCTION, OUTPUT};
use fabric_chip::wires::{inbound, RESET_MASK};

use crate::backend::{select_backend, BackendSelection};
use crate::bus::RegisterBus;
use crate::error::Result;
use crate::queue::{self, RetryPolicy};

/// Sampled state of the three gate signals, for probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStatus {
    /// Instruction channel can accept a word pair.
    pub insns_ready: bool,
    /// Input channel can accept a word.
    pub io_i_ready: bool,
    /// Output channel holds a word.
    pub io_o_valid: bool,
}

/// Exclusive, single-owner handle to one fabric instance.
#[derive(Debug)]
pub struct Session<B = Box<dyn RegisterBus>> {
    bus: B,
}

impl Session<Box<dyn RegisterBus>> {
    /// Open a session on the selected transport.
    ///
    /// Device discovery, bitstream load, and clock setup are external
    /// preconditions; this only binds the address map to an open bus.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be opened.
    pub fn open(selection: BackendSelection, pcie_addr: &str) -> Result<Self> {
        let bus = select_backend(selection, pcie_addr)?;
        tracing::info!("Fabric session opened");
        Ok(Self { bus })
    }
}

impl<B: RegisterBus> Session<B> {
    /// Bind a session directly to a bus. The session takes exclusive
    /// ownership; there is no shared or ambient device handle.
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Borrow the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Borrow the underlying bus mutably, for raw register access.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the session and recover the bus.
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Pulse the fabric reset. All channels return to idle and queued
    /// device-side data is discarded; the driver holds no queued state,
    /// so there is nothing to clean up on the host.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault.
    pub fn reset(&mut self) -> Result<()> {
        tracing::debug!("Fabric reset");
        self.bus.write_masked(inbound::RESET, 0xff, RESET_MASK)?;
        self.bus.write_masked(inbound::RESET, 0, RESET_MASK)
    }

    /// Write the run scalars. Must follow [`Self::reset`] and precede any
    /// channel operation; the instruction channel stays not-ready until
    /// both scalars are nonzero.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault.
    pub fn configure(&mut self, host_steps: u32, used_procs: u32) -> Result<()> {
        tracing::debug!(host_steps, used_procs, "Fabric configure");
        self.bus.write(inbound::HOST_STEPS, host_steps)?;
        self.bus.write(inbound::USED_PROCS, used_procs)
    }

    /// Offer one instruction word pair without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault.
    pub fn try_enqueue_instruction(&mut self, hi: u32, lo: u32) -> Result<bool> {
        queue::try_enqueue(&mut self.bus, &INSTRUCTION, &[hi, lo])
    }

    /// Enqueue one instruction word pair, retrying under `policy`.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault or an exhausted poll budget.
    pub fn enqueue_instruction(&mut self, hi: u32, lo: u32, policy: RetryPolicy) -> Result<()> {
        queue::enqueue(&mut self.bus, &INSTRUCTION, &[hi, lo], policy)
    }

    /// Offer one input word without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault.
    pub fn try_enqueue_input(&mut self, word: u32) -> Result<bool> {
        queue::try_enqueue(&mut self.bus, &INPUT, &[word])
    }

    /// Enqueue one input word, retrying under `policy`.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault or an exhausted poll budget.
    pub fn enqueue_input(&mut self, word: u32, policy: RetryPolicy) -> Result<()> {
        queue::enqueue(&mut self.bus, &INPUT, &[word], policy)
    }

    /// Accept one output word without blocking; `None` when the output
    /// channel is empty.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault.
    pub fn try_dequeue_output(&mut self) -> Result<Option<u32>> {
        Ok(queue::try_dequeue(&mut self.bus, &OUTPUT)?.map(|words| words[0]))
    }

    /// Dequeue one output word, retrying under `policy`.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault or an exhausted poll budget.
    pub fn dequeue_output(&mut self, policy: RetryPolicy) -> Result<u32> {
        Ok(queue::dequeue(&mut self.bus, &OUTPUT, policy)?[0])
    }

    /// Offer one transfer on any enqueue channel by descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is [`Channel::Output`]; output is dequeue-only.
    pub fn try_enqueue(&mut self, channel: Channel, words: &[u32]) -> Result<bool> {
        assert!(
            !matches!(channel, Channel::Output),
            "output channel is dequeue-only"
        );
        queue::try_enqueue(&mut self.bus, &channel.desc(), words)
    }

    /// Sample the three gate signals in one pass.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport fault.
    pub fn probe(&mut self) -> Result<GateStatus> {
        Ok(GateStatus {
            insns_ready: self.bus.read(INSTRUCTION.ready)? != 0,
            io_i_ready: self.bus.read(INPUT.ready)? != 0,
            io_o_valid: self.bus.read(OUTPUT.valid)? != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::SimBackend;

    #[test]
    fn lifecycle_reset_configure_probe() {
        let mut session = Session::new(SimBackend::new());
        session.reset().unwrap();
        let gates = session.probe().unwrap();
        assert!(!gates.insns_ready, "ready must stay low until configured");

        session.configure(6, 6).unwrap();
        let gates = session.probe().unwrap();
        assert!(gates.insns_ready);
        assert!(gates.io_i_ready);
        assert!(!gates.io_o_valid);
    }

    #[test]
    fn instruction_payload_reaches_device_in_order() {
        let mut session = Session::new(SimBackend::new());
        session.reset().unwrap();
        session.configure(1, 1).unwrap();
        assert!(session.try_enqueue_instruction(0x184, 0xb33).unwrap());
        assert_eq!(
            session.bus().accepted_instructions(),
            vec![(0x184, 0xb33)]
        );
    }

    #[test]
    fn input_word_comes_back_on_output_channel() {
        let mut session = Session::new(SimBackend::new());
        session.reset().unwrap();
        session.configure(1, 1).unwrap();
        assert!(session.try_enqueue_input(0x9).unwrap());
        assert_eq!(session.try_dequeue_output().unwrap(), Some(0x9));
        assert_eq!(session.try_dequeue_output().unwrap(), None);
    }

    #[test]
    #[should_panic(expected = "dequeue-only")]
    fn enqueue_on_output_channel_is_a_bug() {
        let mut session = Session::new(SimBackend::new());
        let _ = session.try_enqueue(Channel::Output, &[0]);
    }
}
