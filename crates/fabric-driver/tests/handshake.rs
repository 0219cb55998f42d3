//! Handshake protocol properties, checked against the simulator's access
//! journal: exact register ordering, no side effects on backoff, and the
//! reset invariant.

use fabric_driver::backends::sim::Access;
use fabric_driver::channel::{Channel, INPUT, INSTRUCTION, OUTPUT};
use fabric_driver::wires::{inbound, outbound};
use fabric_driver::{queue, RetryPolicy, Session, SimBackend, MASK_ALL};

fn operational_session() -> Session<SimBackend> {
    let mut session = Session::new(SimBackend::new());
    session.reset().expect("reset");
    session.configure(6, 6).expect("configure");
    session.bus_mut().clear_journal();
    session
}

#[test]
fn backoff_leaves_every_channel_register_untouched() {
    for channel in [Channel::Instruction, Channel::Input] {
        let mut session = operational_session();
        let desc = channel.desc();
        session.bus_mut().pin_low(desc.ready);

        let words = vec![0u32; desc.width()];
        let accepted = session.try_enqueue(channel, &words).unwrap();
        assert!(!accepted);

        assert_eq!(
            session.bus().journal(),
            &[Access::Read { addr: desc.ready }],
            "{channel}: a refused offer must only read the ready wire"
        );
    }
}

#[test]
fn accepted_offer_is_one_pulse_with_no_interleaved_ready_read() {
    let mut session = operational_session();
    assert!(session.try_enqueue_input(0x7).unwrap());

    let journal = session.bus().journal();
    let valid_writes: Vec<usize> = journal
        .iter()
        .enumerate()
        .filter_map(|(i, a)| match a {
            Access::Write { addr, .. } if *addr == INPUT.valid => Some(i),
            _ => None,
        })
        .collect();

    // Exactly one assert followed by one deassert.
    assert_eq!(valid_writes.len(), 2);
    assert_eq!(
        journal[valid_writes[0]],
        Access::Write { addr: INPUT.valid, value: 1, mask: MASK_ALL }
    );
    assert_eq!(
        journal[valid_writes[1]],
        Access::Write { addr: INPUT.valid, value: 0, mask: MASK_ALL }
    );
    // Adjacent: nothing, in particular no ready read, between the edges.
    assert_eq!(valid_writes[1], valid_writes[0] + 1);
}

#[test]
fn dequeue_reads_data_strictly_before_the_acknowledge() {
    let mut session = operational_session();
    session.bus_mut().push_output(0x4);
    session.bus_mut().clear_journal();

    assert_eq!(session.dequeue_output(RetryPolicy::bounded(1)).unwrap(), 0x4);

    let journal = session.bus().journal();
    let data_read = journal
        .iter()
        .position(|a| *a == Access::Read { addr: outbound::IO_O_BITS_0 })
        .expect("data word must be read");
    let ack = journal
        .iter()
        .position(|a| matches!(a, Access::Write { addr, value: 1, .. } if *addr == OUTPUT.ready))
        .expect("ready must be pulsed");
    assert!(data_read < ack, "data read must precede the ready pulse");

    // The data wire is never read again once the device may have advanced.
    assert!(!journal[ack..]
        .iter()
        .any(|a| *a == Access::Read { addr: outbound::IO_O_BITS_0 }));
}

#[test]
fn dequeue_acknowledge_is_a_full_pulse() {
    let mut session = operational_session();
    session.bus_mut().push_output(1);
    session.try_dequeue_output().unwrap();

    let writes: Vec<&Access> = session
        .bus()
        .journal()
        .iter()
        .filter(|a| matches!(a, Access::Write { addr, .. } if *addr == OUTPUT.ready))
        .collect();
    assert_eq!(
        writes,
        &[
            &Access::Write { addr: OUTPUT.ready, value: 1, mask: MASK_ALL },
            &Access::Write { addr: OUTPUT.ready, value: 0, mask: MASK_ALL },
        ]
    );
}

#[test]
fn reset_empties_every_channel() {
    let mut session = operational_session();
    session.enqueue_input(0xf, RetryPolicy::bounded(1)).unwrap();
    session
        .enqueue_instruction(0x100, 0x0, RetryPolicy::bounded(1))
        .unwrap();

    session.reset().unwrap();

    assert_eq!(session.try_dequeue_output().unwrap(), None);
    for desc in [INSTRUCTION, INPUT, OUTPUT] {
        let bus = session.bus_mut();
        assert_eq!(
            queue::try_dequeue(bus, &desc).unwrap(),
            None,
            "channel with valid wire {:#04x} must be empty after reset",
            desc.valid
        );
    }
}

#[test]
fn refused_offers_never_drift_device_state() {
    let mut session = operational_session();
    session.bus_mut().pin_low(INPUT.ready);

    let baseline = session.bus().snapshot();
    for _ in 0..8 {
        assert!(!session.try_enqueue_input(0xdead).unwrap());
        assert_eq!(session.bus().snapshot(), baseline, "backend state drifted");
    }
}

#[test]
fn instruction_enqueue_writes_in_exact_order_and_returns_after_one_poll() {
    let mut session = operational_session();
    session
        .enqueue_instruction(0x80, 0x01, RetryPolicy::bounded(1))
        .unwrap();

    assert_eq!(
        session.bus().journal(),
        &[
            Access::Read { addr: outbound::INSNS_READY },
            Access::Write { addr: inbound::INSNS_BITS_1, value: 0x80, mask: MASK_ALL },
            Access::Write { addr: inbound::INSNS_BITS_0, value: 0x01, mask: MASK_ALL },
            Access::Write { addr: inbound::INSNS_VALID, value: 1, mask: MASK_ALL },
            Access::Write { addr: inbound::INSNS_VALID, value: 0, mask: MASK_ALL },
        ]
    );
    assert_eq!(session.bus().accepted_instructions(), vec![(0x80, 0x01)]);
}

#[test]
fn end_to_end_instruction_stream_then_io() {
    let mut session = operational_session();
    let program = [
        (0x80, 0x01),
        (0x100, 0x0),
        (0x184, 0xb33),
        (0x4, 0xc43),
        (0x58, 0x14b3),
    ];
    for &(hi, lo) in &program {
        session
            .enqueue_instruction(hi, lo, RetryPolicy::bounded(100))
            .unwrap();
    }
    assert_eq!(session.bus().accepted_instructions(), program.to_vec());

    for word in [0x0, 0x4, 0x9, 0xf] {
        session.enqueue_input(word, RetryPolicy::bounded(100)).unwrap();
        let out = session.dequeue_output(RetryPolicy::bounded(100)).unwrap();
        assert_eq!(out, word);
    }
}

#[test]
fn bounded_stall_reports_the_channel() {
    let mut session = operational_session();
    session.bus_mut().pin_low(INSTRUCTION.ready);

    let err = session
        .enqueue_instruction(0, 0, RetryPolicy::bounded(5))
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("5 polls"), "unexpected error text: {text}");
}
