//! Wire-register address map for the fabric top.
//!
//! Two disjoint ranges exist: *inbound* wires (host → device, writable) and
//! *outbound* wires (device → host, read-only). Addresses are fixed for the
//! lifetime of a session. These values match the FPGATop wire endpoints and
//! must not be reordered.

/// Address of one wire register.
pub type WireAddr = u32;

/// Width of the reset wire. Reset is the only narrow inbound register;
/// every other wire carries a full 32-bit word.
pub const RESET_MASK: u32 = 0xff;

/// Inbound wires (host → device).
pub mod inbound {
    use super::WireAddr;

    /// Fabric reset, 8-bit field. Write `0xff` then `0` to pulse.
    pub const RESET: WireAddr = 0x00;
    /// Number of host steps per run.
    pub const HOST_STEPS: WireAddr = 0x01;
    /// Number of active processors in the fabric.
    pub const USED_PROCS: WireAddr = 0x02;
    /// Instruction channel valid pulse.
    pub const INSNS_VALID: WireAddr = 0x03;
    /// Instruction payload, low word.
    pub const INSNS_BITS_0: WireAddr = 0x04;
    /// Instruction payload, high word.
    pub const INSNS_BITS_1: WireAddr = 0x05;
    /// Input channel valid pulse.
    pub const IO_I_VALID: WireAddr = 0x06;
    /// Input payload word.
    pub const IO_I_BITS_0: WireAddr = 0x07;
    /// Output channel ready acknowledge pulse.
    pub const IO_O_READY: WireAddr = 0x08;
}

/// Outbound wires (device → host).
pub mod outbound {
    use super::WireAddr;

    /// Instruction channel ready.
    pub const INSNS_READY: WireAddr = 0x20;
    /// Input channel ready.
    pub const IO_I_READY: WireAddr = 0x21;
    /// Output channel valid.
    pub const IO_O_VALID: WireAddr = 0x22;
    /// Output payload word.
    pub const IO_O_BITS_0: WireAddr = 0x23;
}

/// Alternate single-channel image (the interface-test bitstream).
///
/// Same ready/valid protocol, one enqueue/dequeue pair instead of three
/// channels, and the reset wire parked at the top of the inbound range.
pub mod loopback {
    use super::WireAddr;

    /// Enqueue valid pulse (host → device).
    pub const ENQ_VAL: WireAddr = 0x00;
    /// Enqueue payload word (host → device).
    pub const ENQ_DATA: WireAddr = 0x01;
    /// Dequeue ready acknowledge pulse (host → device).
    pub const DEQ_RDY: WireAddr = 0x02;
    /// Reset, 8-bit field (host → device).
    pub const RST: WireAddr = 0x80;

    /// Enqueue ready (device → host).
    pub const ENQ_RDY: WireAddr = 0x20;
    /// Dequeue valid (device → host).
    pub const DEQ_VAL: WireAddr = 0x21;
    /// Dequeue payload word (device → host).
    pub const DEQ_DATA: WireAddr = 0x22;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_and_outbound_ranges_disjoint() {
        assert!(inbound::IO_O_READY < outbound::INSNS_READY);
        assert!(loopback::DEQ_RDY < loopback::ENQ_RDY);
    }

    #[test]
    fn wire_endpoints_match_bitstream() {
        // Pinned by the FPGATop endpoint assignment.
        assert_eq!(inbound::RESET, 0x00);
        assert_eq!(inbound::INSNS_BITS_1, 0x05);
        assert_eq!(outbound::INSNS_READY, 0x20);
        assert_eq!(outbound::IO_O_BITS_0, 0x23);
        assert_eq!(loopback::RST, 0x80);
    }
}
