//! Standalone peephole optimizer
//!
//! Reads a textual IR file (one instruction per line, three
//! whitespace-separated fields, missing arguments written as `_`), runs the
//! compiler's peephole passes to fixpoint, and writes the rewritten stream.
//! Reports the input and output paths on success; any I/O or parse failure
//! exits nonzero.

use clap::Parser;
use rexion_core::ir::{format_ir_text, parse_ir_text};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "peephole")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Peephole-optimize a textual Rexion IR file", long_about = None)]
struct Cli {
    /// Input IR file
    input: PathBuf,

    /// Output IR file
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let text = match fs::read_to_string(&cli.input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("peephole: error: {}: {}", cli.input.display(), err);
            return 1;
        }
    };

    let ir = match parse_ir_text(&text) {
        Ok(ir) => ir,
        Err(message) => {
            eprintln!("peephole: error: {}: {}", cli.input.display(), message);
            return 1;
        }
    };

    let optimized = rexc::optimizer::optimize(ir);

    if let Err(err) = fs::write(&cli.output, format_ir_text(&optimized)) {
        eprintln!("peephole: error: {}: {}", cli.output.display(), err);
        return 1;
    }

    println!(
        "peephole optimization complete: {} -> {}",
        cli.input.display(),
        cli.output.display()
    );
    0
}
