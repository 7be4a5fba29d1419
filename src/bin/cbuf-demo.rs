//! Small driver that streams bytes through a `cbuf::RingBuffer`.

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use cbuf::{RingBuffer, WriteError};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cbuf-demo")]
#[command(about = "Stream bytes through a fixed-capacity ring buffer")]
#[command(version)]
struct Cli {
    /// Usable capacity of the buffer in bytes
    #[arg(short, long, default_value = "10")]
    capacity: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write each word, draining the buffer whenever a word does not fit
    Words {
        /// Words to push through the buffer
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Write incrementing slices and read back slightly less each round
    Stream {
        /// Bytes written per round
        #[arg(short, long, default_value = "5")]
        slice: usize,

        /// Number of rounds
        #[arg(short, long, default_value = "5")]
        rounds: usize,

        /// Pause between rounds in milliseconds
        #[arg(long, default_value = "0")]
        pause_ms: u64,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let rb = RingBuffer::new(cli.capacity).context("creating ring buffer")?;

    match cli.command {
        Command::Words { words } => push_words(&rb, &words)?,
        Command::Stream {
            slice,
            rounds,
            pause_ms,
        } => stream_slices(&rb, slice, rounds, Duration::from_millis(pause_ms)),
    }

    rb.destroy().context("destroying ring buffer")?;
    Ok(())
}

fn push_words(rb: &RingBuffer, words: &[String]) -> Result<()> {
    let mut drained = vec![0u8; rb.capacity()];

    for word in words {
        loop {
            match rb.write(word.as_bytes()) {
                Ok(n) => {
                    println!("write ret={n}\tword={word}");
                    break;
                }
                Err(WriteError::NotEnoughSpace { requested, .. }) if requested > rb.capacity() => {
                    bail!(
                        "'{word}' ({requested} bytes) can never fit in a buffer of {} bytes",
                        rb.capacity()
                    );
                }
                Err(e) => {
                    info!(%e, word = word.as_str(), "draining before retry");
                    let n = rb.read(&mut drained);
                    info!(read = n, contents = %String::from_utf8_lossy(&drained[..n]), "drained");
                }
            }
        }
    }

    let n = rb.read(&mut drained);
    println!("buffer contents='{}'", String::from_utf8_lossy(&drained[..n]));
    Ok(())
}

fn stream_slices(rb: &RingBuffer, slice: usize, rounds: usize, pause: Duration) {
    let mut out = vec![0u8; slice];

    for round in 0..rounds {
        let data: Vec<u8> = (0..slice).map(|j| (round * slice + j + 1) as u8).collect();
        match rb.write(&data) {
            Ok(n) => println!("WRITE: {data:?} ({n} bytes)"),
            Err(e) => println!("WRITE: refused, {e}"),
        }
        println!("{}", rb.dump());

        let n = rb.read(&mut out[..slice.saturating_sub(2)]);
        println!("READ : {:?}", &out[..n]);
        println!("{}", rb.dump());
        println!();

        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }
}
