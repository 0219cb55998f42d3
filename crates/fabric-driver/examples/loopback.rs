//! Drive a full session against the simulator backend: reset, configure,
//! load a small instruction stream, then stream inputs and drain outputs.
//!
//! Run with: `cargo run --example loopback`

use fabric_driver::{RetryPolicy, Session, SimBackend};

fn main() -> fabric_driver::Result<()> {
    let mut session = Session::new(SimBackend::new());

    session.reset()?;
    session.configure(6, 6)?;

    let program = [(0x80, 0x01), (0x100, 0x0), (0x184, 0xb33), (0x4, 0xc43)];
    for (hi, lo) in program {
        session.enqueue_instruction(hi, lo, RetryPolicy::unbounded())?;
    }
    println!("loaded {} instructions", program.len());

    for word in [0x0u32, 0x4, 0x9, 0xf] {
        session.enqueue_input(word, RetryPolicy::bounded(1000))?;
        let out = session.dequeue_output(RetryPolicy::bounded(1000))?;
        println!("in {word:#x} -> out {out:#x}");
    }

    Ok(())
}
