//! `fabric` — command-line interface for the emulated processor fabric.
//!
//! ```text
//! USAGE:
//!   fabric probe                       Sample the channel gate signals
//!   fabric reset                       Pulse the fabric reset
//!   fabric run --program prog.hex      Reset, configure, load, stream I/O
//! ```
//!
//! The program file holds one instruction per line as two hex words,
//! high word first: `0x80 0x01`. Blank lines and `#` comments are skipped.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use fabric_driver::{BackendSelection, RetryPolicy, Session};

#[derive(Parser)]
#[command(name = "fabric", about = "Processor fabric host CLI", version)]
struct Cli {
    /// Transport to the fabric's wire registers.
    #[arg(long, value_enum, default_value_t = Backend::Auto)]
    backend: Backend,

    /// PCIe address of the host adapter (e.g. 0000:3b:00.0).
    #[arg(long, default_value = "0000:03:00.0")]
    device: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// Prefer hardware, fall back to the simulator.
    Auto,
    /// Require the XDMA hardware transport.
    Xdma,
    /// In-process simulator, no hardware needed.
    Sim,
}

impl From<Backend> for BackendSelection {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Auto => Self::Auto,
            Backend::Xdma => Self::Xdma,
            Backend::Sim => Self::Sim,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Sample the ready/valid gate signals of the three channels.
    Probe,
    /// Pulse the fabric reset.
    Reset,
    /// Reset, configure, load an instruction stream, then stream inputs
    /// and print the dequeued outputs.
    Run {
        /// Instruction file: two hex words per line, high word first.
        #[arg(long)]
        program: PathBuf,
        /// Input words to stream after the program is loaded.
        #[arg(long, value_parser = parse_word, num_args = 0..)]
        input: Vec<u32>,
        /// Host steps per run.
        #[arg(long, default_value_t = 6)]
        steps: u32,
        /// Active processors in the fabric.
        #[arg(long, default_value_t = 6)]
        procs: u32,
        /// Give up on a stalled channel after this many polls.
        #[arg(long, default_value_t = 100_000)]
        poll_budget: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let mut session = Session::open(cli.backend.into(), &cli.device)?;

    match cli.command {
        Cmd::Probe => {
            let gates = session.probe()?;
            println!("insns_ready  {}", u32::from(gates.insns_ready));
            println!("io_i_ready   {}", u32::from(gates.io_i_ready));
            println!("io_o_valid   {}", u32::from(gates.io_o_valid));
        }
        Cmd::Reset => {
            session.reset()?;
            println!("reset pulsed");
        }
        Cmd::Run {
            program,
            input,
            steps,
            procs,
            poll_budget,
        } => {
            let instructions = load_program(&program)
                .with_context(|| format!("loading {}", program.display()))?;

            session.reset()?;
            session.configure(steps, procs)?;

            let policy =
                RetryPolicy::bounded(poll_budget).with_interval(std::time::Duration::from_micros(100));

            for &(hi, lo) in &instructions {
                session.enqueue_instruction(hi, lo, policy)?;
            }
            println!("loaded {} instructions", instructions.len());

            for &word in &input {
                session.enqueue_input(word, policy)?;
                let out = session.dequeue_output(policy)?;
                println!("in {word:#x} -> out {out:#x}");
            }
        }
    }

    Ok(())
}

/// Parse one instruction stream file into (hi, lo) word pairs.
fn load_program(path: &std::path::Path) -> Result<Vec<(u32, u32)>> {
    let text = std::fs::read_to_string(path)?;
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.len() != 2 {
            bail!("line {}: expected two words, got {}", lineno + 1, words.len());
        }
        let hi = parse_word(words[0]).map_err(anyhow::Error::msg)?;
        let lo = parse_word(words[1]).map_err(anyhow::Error::msg)?;
        out.push((hi, lo));
    }
    Ok(out)
}

/// Accept `0x`-prefixed hex or plain decimal.
fn parse_word(s: &str) -> std::result::Result<u32, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("bad word {s:?}: {e}"))
}
