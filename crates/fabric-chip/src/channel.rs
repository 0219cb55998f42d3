//! Channel descriptors for the ready/valid wire protocol.
//!
//! Each flow-controlled path between host and fabric is described by three
//! addresses: a valid wire, a ready wire, and one or more data wires. The
//! same descriptor shape serves both directions — for host-driven channels
//! the host writes valid and reads ready, for device-driven channels the
//! host reads valid and writes ready. The queue driver in `fabric-driver`
//! consumes these descriptors generically, so the per-channel wiring lives
//! here and nowhere else.

use crate::wires::{inbound, loopback, outbound, WireAddr};

/// Register addresses of one ready/valid channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDesc {
    /// Valid wire. Host-asserted for enqueue channels, device-asserted for
    /// dequeue channels.
    pub valid: WireAddr,
    /// Ready wire. The complement of `valid` on the other side.
    pub ready: WireAddr,
    /// Data wires, in transfer order. The device samples every data wire on
    /// the same valid edge, so multi-word payloads are written completely
    /// before valid is pulsed.
    pub data: &'static [WireAddr],
}

impl ChannelDesc {
    /// Number of data words the channel carries per transfer.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.data.len()
    }
}

/// Instruction enqueue channel: two payload words, written high word first.
pub const INSTRUCTION: ChannelDesc = ChannelDesc {
    valid: inbound::INSNS_VALID,
    ready: outbound::INSNS_READY,
    data: &[inbound::INSNS_BITS_1, inbound::INSNS_BITS_0],
};

/// Input stream enqueue channel.
pub const INPUT: ChannelDesc = ChannelDesc {
    valid: inbound::IO_I_VALID,
    ready: outbound::IO_I_READY,
    data: &[inbound::IO_I_BITS_0],
};

/// Output stream dequeue channel.
pub const OUTPUT: ChannelDesc = ChannelDesc {
    valid: outbound::IO_O_VALID,
    ready: inbound::IO_O_READY,
    data: &[outbound::IO_O_BITS_0],
};

/// Enqueue side of the single-channel interface-test image.
pub const LOOPBACK_ENQ: ChannelDesc = ChannelDesc {
    valid: loopback::ENQ_VAL,
    ready: loopback::ENQ_RDY,
    data: &[loopback::ENQ_DATA],
};

/// Dequeue side of the single-channel interface-test image.
pub const LOOPBACK_DEQ: ChannelDesc = ChannelDesc {
    valid: loopback::DEQ_VAL,
    ready: loopback::DEQ_RDY,
    data: &[loopback::DEQ_DATA],
};

/// The three channels of the fabric top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Instruction enqueue (host → fabric, two words).
    Instruction,
    /// Input stream enqueue (host → fabric).
    Input,
    /// Output stream dequeue (fabric → host).
    Output,
}

impl Channel {
    /// Register addresses for this channel.
    #[must_use]
    pub const fn desc(self) -> ChannelDesc {
        match self {
            Self::Instruction => INSTRUCTION,
            Self::Input => INPUT,
            Self::Output => OUTPUT,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instruction => write!(f, "instruction"),
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}
