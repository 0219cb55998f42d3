//! Generic ready/valid handshake-queue driver
//!
//! One implementation of the two-sided handshake, instantiated per channel
//! through a [`ChannelDesc`]. The driver itself is stateless: both sides of
//! every queue live in device registers, and the host merely polls them.
//!
//! The protocol has no atomic compare-and-swap, which forces a strict
//! access order on every transfer:
//!
//! - enqueue: check ready first; only then write all data words, then pulse
//!   valid high and low. The two-write pulse emulates a single-cycle strobe
//!   from polled software, and deasserting before the next attempt keeps
//!   the device from sampling a stale valid as a second handshake.
//! - dequeue: check valid first; read the data words *before* pulsing
//!   ready, because the acknowledge may advance the device to the next
//!   value and clobber the data register.
//!
//! A gate observation (ready or valid) is authoritative for one call only
//! and is never cached: the device state can change between any two
//! register accesses.

use std::time::Duration;

use fabric_chip::ChannelDesc;

use crate::bus::RegisterBus;
use crate::error::{FabricError, Result};

/// Poll budget for the blocking enqueue/dequeue wrappers.
///
/// The original host loops spin forever (`while true`); an injectable
/// budget keeps that behavior available while letting tests and callers
/// with deadlines bound the wait. Exhausting a bounded budget yields
/// [`FabricError::Stalled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_polls: Option<u64>,
    interval: Option<Duration>,
}

impl RetryPolicy {
    /// Spin until the device accepts; may block indefinitely.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_polls: None,
            interval: None,
        }
    }

    /// Give up after `max_polls` failed attempts.
    #[must_use]
    pub const fn bounded(max_polls: u64) -> Self {
        Self {
            max_polls: Some(max_polls),
            interval: None,
        }
    }

    /// Sleep for `interval` between failed attempts.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Offer one transfer on an enqueue channel without blocking.
///
/// Reads the channel's ready wire; if deasserted, returns `Ok(false)`
/// without touching any other register, so the caller can retry without
/// corrupting in-flight state. If asserted, writes every data word in
/// descriptor order, pulses valid high then low, and returns `Ok(true)`.
///
/// # Panics
///
/// Panics if `words.len()` does not match the channel width; the payload
/// shape is fixed by the bitstream, so a mismatch is a programming error.
///
/// # Errors
///
/// Returns an error only on a transport fault.
pub fn try_enqueue<B: RegisterBus + ?Sized>(
    bus: &mut B,
    ch: &ChannelDesc,
    words: &[u32],
) -> Result<bool> {
    assert_eq!(
        words.len(),
        ch.width(),
        "payload width mismatch for channel with valid wire {:#04x}",
        ch.valid
    );

    if bus.read(ch.ready)? == 0 {
        return Ok(false);
    }

    // The device samples all data wires on the same valid edge, so the
    // payload must be complete before the pulse.
    for (&addr, &word) in ch.data.iter().zip(words) {
        bus.write(addr, word)?;
    }
    bus.write(ch.valid, 1)?;
    bus.write(ch.valid, 0)?;

    tracing::trace!(valid = ch.valid, ?words, "enqueued");
    Ok(true)
}

/// Offer one transfer on an enqueue channel, retrying under `policy`.
///
/// Failed attempts have no side effects, so the retry loop is idempotent.
///
/// # Errors
///
/// Returns [`FabricError::Stalled`] if a bounded policy runs out of polls,
/// or any transport fault from the bus.
pub fn enqueue<B: RegisterBus + ?Sized>(
    bus: &mut B,
    ch: &ChannelDesc,
    words: &[u32],
    policy: RetryPolicy,
) -> Result<()> {
    let mut polls = 0u64;
    loop {
        if try_enqueue(bus, ch, words)? {
            return Ok(());
        }
        polls += 1;
        if let Some(max) = policy.max_polls {
            if polls >= max {
                return Err(FabricError::Stalled {
                    valid: ch.valid,
                    polls,
                });
            }
        }
        if let Some(interval) = policy.interval {
            std::thread::sleep(interval);
        }
    }
}

/// Accept one transfer from a dequeue channel without blocking.
///
/// Reads the channel's valid wire; if deasserted, returns `Ok(None)` with
/// no other register touched. If asserted, reads every data word — strictly
/// before the acknowledge — then pulses ready high and low to let the
/// device advance, and returns the payload.
///
/// # Errors
///
/// Returns an error only on a transport fault.
pub fn try_dequeue<B: RegisterBus + ?Sized>(
    bus: &mut B,
    ch: &ChannelDesc,
) -> Result<Option<Vec<u32>>> {
    if bus.read(ch.valid)? == 0 {
        return Ok(None);
    }

    let mut words = Vec::with_capacity(ch.width());
    for &addr in ch.data {
        words.push(bus.read(addr)?);
    }
    bus.write(ch.ready, 1)?;
    bus.write(ch.ready, 0)?;

    tracing::trace!(valid = ch.valid, ?words, "dequeued");
    Ok(Some(words))
}

/// Accept one transfer from a dequeue channel, retrying under `policy`.
///
/// # Errors
///
/// Returns [`FabricError::Stalled`] if a bounded policy runs out of polls,
/// or any transport fault from the bus.
pub fn dequeue<B: RegisterBus + ?Sized>(
    bus: &mut B,
    ch: &ChannelDesc,
    policy: RetryPolicy,
) -> Result<Vec<u32>> {
    let mut polls = 0u64;
    loop {
        if let Some(words) = try_dequeue(bus, ch)? {
            return Ok(words);
        }
        polls += 1;
        if let Some(max) = policy.max_polls {
            if polls >= max {
                return Err(FabricError::Stalled {
                    valid: ch.valid,
                    polls,
                });
            }
        }
        if let Some(interval) = policy.interval {
            std::thread::sleep(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_chip::channel::{LOOPBACK_DEQ, LOOPBACK_ENQ};
    use fabric_chip::WireAddr;
    use std::collections::BTreeMap;

    /// Flat register file with no handshake semantics; just enough to
    /// check the driver's access pattern on the loopback image.
    #[derive(Debug, Default)]
    struct FlatBus {
        regs: BTreeMap<WireAddr, u32>,
        log: Vec<(char, WireAddr, u32)>,
    }

    impl RegisterBus for FlatBus {
        fn read(&mut self, addr: WireAddr) -> Result<u32> {
            let v = self.regs.get(&addr).copied().unwrap_or(0);
            self.log.push(('r', addr, v));
            Ok(v)
        }

        fn write_masked(&mut self, addr: WireAddr, value: u32, mask: u32) -> Result<()> {
            let old = self.regs.get(&addr).copied().unwrap_or(0);
            let new = (old & !mask) | (value & mask);
            self.regs.insert(addr, new);
            self.log.push(('w', addr, new));
            Ok(())
        }
    }

    #[test]
    fn try_enqueue_backs_off_when_ready_low() {
        let mut bus = FlatBus::default();
        assert!(!try_enqueue(&mut bus, &LOOPBACK_ENQ, &[7]).unwrap());
        // Only the ready wire was read; nothing was written.
        assert_eq!(bus.log, vec![('r', LOOPBACK_ENQ.ready, 0)]);
    }

    #[test]
    fn try_enqueue_pulses_valid_after_data() {
        let mut bus = FlatBus::default();
        bus.regs.insert(LOOPBACK_ENQ.ready, 1);
        assert!(try_enqueue(&mut bus, &LOOPBACK_ENQ, &[0xbeef]).unwrap());
        assert_eq!(
            bus.log,
            vec![
                ('r', LOOPBACK_ENQ.ready, 1),
                ('w', LOOPBACK_ENQ.data[0], 0xbeef),
                ('w', LOOPBACK_ENQ.valid, 1),
                ('w', LOOPBACK_ENQ.valid, 0),
            ]
        );
    }

    #[test]
    fn try_dequeue_reads_data_before_acknowledge() {
        let mut bus = FlatBus::default();
        bus.regs.insert(LOOPBACK_DEQ.valid, 1);
        bus.regs.insert(LOOPBACK_DEQ.data[0], 0x42);
        let words = try_dequeue(&mut bus, &LOOPBACK_DEQ).unwrap().unwrap();
        assert_eq!(words, vec![0x42]);
        assert_eq!(
            bus.log,
            vec![
                ('r', LOOPBACK_DEQ.valid, 1),
                ('r', LOOPBACK_DEQ.data[0], 0x42),
                ('w', LOOPBACK_DEQ.ready, 1),
                ('w', LOOPBACK_DEQ.ready, 0),
            ]
        );
    }

    #[test]
    fn try_dequeue_empty_touches_nothing_else() {
        let mut bus = FlatBus::default();
        assert!(try_dequeue(&mut bus, &LOOPBACK_DEQ).unwrap().is_none());
        assert_eq!(bus.log, vec![('r', LOOPBACK_DEQ.valid, 0)]);
    }

    #[test]
    fn bounded_enqueue_stalls_with_poll_count() {
        let mut bus = FlatBus::default();
        let err = enqueue(&mut bus, &LOOPBACK_ENQ, &[1], RetryPolicy::bounded(3)).unwrap_err();
        match err {
            FabricError::Stalled { valid, polls } => {
                assert_eq!(valid, LOOPBACK_ENQ.valid);
                assert_eq!(polls, 3);
            }
            other => panic!("expected stall, got {other}"),
        }
        // Three polls, each a single ready read.
        assert_eq!(bus.log.len(), 3);
    }

    #[test]
    fn bounded_dequeue_stalls_with_poll_count() {
        let mut bus = FlatBus::default();
        let err = dequeue(&mut bus, &LOOPBACK_DEQ, RetryPolicy::bounded(2)).unwrap_err();
        assert!(matches!(err, FabricError::Stalled { polls: 2, .. }));
    }

    #[test]
    #[should_panic(expected = "payload width mismatch")]
    fn wrong_payload_width_is_a_bug() {
        let mut bus = FlatBus::default();
        let _ = try_enqueue(&mut bus, &LOOPBACK_ENQ, &[1, 2]);
    }
}
