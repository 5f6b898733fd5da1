//! Rexion Compiler CLI
//!
//! Stage flags run exactly one pipeline stage each against the accumulated
//! state of the compilation, in canonical pipeline order (tokens, parse,
//! ir, asm). The macro flags operate on the loaded `.r4meta` table and do
//! not require a source file. Assembling and linking the emitted
//! `rexion.asm` is left to external tools:
//!
//! ```text
//! rexc hello.r4 --asm
//! nasm -felf64 rexion.asm && ld rexion.o -o rexion
//! ```
//!
//! Exit codes: 0 success, 1 bad invocation or I/O failure, 2 parse error.

use clap::{CommandFactory, Parser as ClapParser};
use clap_complete::{Shell, generate};
use rexc::config::CompilerConfig;
use rexc::driver::{Pipeline, Stage};
use rexc::error::CompileError;
use rexc::macros::{self, MacroTable, SharedMacroTable};
use rexc::watch::MacroWatcher;
use rexc::{bundle, codex};
use rexion_core::target::Target;
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "rexc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rexion compiler - lower .r4 sources to x86-64 assembly", long_about = None)]
struct Cli {
    /// Input .r4 source file
    source: Option<PathBuf>,

    /// Dump the token stream
    #[arg(long)]
    tokens: bool,

    /// Run the parser
    #[arg(long)]
    parse: bool,

    /// Emit and dump the IR
    #[arg(long)]
    ir: bool,

    /// Emit NASM assembly to rexion.asm
    #[arg(long)]
    asm: bool,

    /// Run every stage with full dumps
    #[arg(long)]
    debug_full: bool,

    /// Run the peephole passes between lowering and emission
    #[arg(short = 'O', long)]
    optimize: bool,

    /// Emission target (x86_64, arm64, riscv)
    #[arg(long, value_name = "ARCH", default_value = "x86_64")]
    target: String,

    /// Load a .r4meta macro definition file
    #[arg(long, value_name = "PATH")]
    meta: Option<PathBuf>,

    /// Show all loaded macros with their expansions
    #[arg(long)]
    complete_macros: bool,

    /// Reload macros from the metadata file without recompilation
    #[arg(long)]
    reload_macros: bool,

    /// Export the macros as a shareable bundle into DIR
    #[arg(long, value_name = "DIR")]
    export_macros: Option<PathBuf>,

    /// Watch the metadata file and hot-reload macros while running
    #[arg(long)]
    watch_macros: bool,

    /// Rewrite the source file, expanding |NAME| macro lines, into PATH
    #[arg(long, value_name = "PATH")]
    rewrite: Option<PathBuf>,

    /// Rewrite every .r4 file in SRC_DIR into a .rexasm file in OUT_DIR
    #[arg(long, value_names = ["SRC_DIR", "OUT_DIR"], num_args = 2)]
    batch: Option<Vec<PathBuf>>,

    /// View the language codex
    #[arg(long)]
    codex: bool,

    /// Generate shell completion scripts
    #[arg(long, value_name = "SHELL", value_enum)]
    completions: Option<Shell>,
}

fn main() {
    // Set up logging to stderr; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rexc=warn".parse().expect("static directive parses")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    process::exit(run(cli));
}

fn fail(err: &CompileError) -> i32 {
    eprintln!("rexc: error: {}", err);
    err.exit_code()
}

fn run(cli: Cli) -> i32 {
    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        generate(shell, &mut command, "rexc", &mut io::stdout());
        return 0;
    }

    if cli.codex {
        return show_codex();
    }

    let target = match cli.target.parse::<Target>() {
        Ok(target) => target,
        Err(message) => {
            eprintln!("rexc: error: {}", message);
            return 1;
        }
    };
    let config = CompilerConfig::new()
        .with_target(target)
        .with_optimize(cli.optimize);

    // One macro table is threaded through the standalone macro operations,
    // the optional watcher, and the compile itself.
    let macro_table: SharedMacroTable = macros::shared(match &cli.meta {
        Some(path) => MacroTable::load(path),
        None => MacroTable::new(),
    });

    // The handle must stay alive for reloads to keep arriving; dropping it
    // on exit stops the watcher with the table in a consistent state.
    let _watcher: Option<MacroWatcher> = if cli.watch_macros {
        match MacroWatcher::spawn(macro_table.clone()) {
            Ok(watcher) => {
                eprint!("{}", rexc::trace::watch_banner(watcher.path()));
                Some(watcher)
            }
            Err(err) => return fail(&err),
        }
    } else {
        None
    };

    if cli.reload_macros {
        macros::reload_shared(&macro_table);
        println!("macros reloaded from disk");
    }

    if cli.complete_macros {
        match macro_table.read() {
            Ok(guard) => print!("{}", macros::listing(&guard)),
            Err(_) => return 1,
        }
    }

    if let Some(destination) = &cli.export_macros {
        let result = match macro_table.read() {
            Ok(guard) => bundle::export(&guard, destination),
            Err(_) => return 1,
        };
        match result {
            Ok(path) => println!("macros exported to {}", path.display()),
            Err(err) => return fail(&err),
        }
    }

    if let Some(dirs) = &cli.batch {
        let result = match macro_table.read() {
            Ok(guard) => macros::batch_rewrite(&guard, &dirs[0], &dirs[1]),
            Err(_) => return 1,
        };
        match result {
            Ok(count) => println!("rewrote {} files into {}", count, dirs[1].display()),
            Err(err) => return fail(&err),
        }
    }

    let mut stages = Vec::new();
    if cli.tokens || cli.debug_full {
        stages.push(Stage::Tokens);
    }
    if cli.parse || cli.debug_full {
        stages.push(Stage::Parse);
    }
    if cli.ir || cli.debug_full {
        stages.push(Stage::Ir);
    }
    if cli.asm || cli.debug_full {
        stages.push(Stage::Asm);
    }

    let needs_source = !stages.is_empty() || cli.rewrite.is_some();
    let Some(source) = &cli.source else {
        if needs_source {
            eprintln!("rexc: error: a source file is required for this invocation");
            return 1;
        }
        return 0;
    };

    if let Some(output) = &cli.rewrite {
        let result = match macro_table.read() {
            Ok(guard) => macros::rewrite(&guard, source, output),
            Err(_) => return 1,
        };
        match result {
            Ok(()) => println!("rewrote {} -> {}", source.display(), output.display()),
            Err(err) => return fail(&err),
        }
    }

    if stages.is_empty() {
        return 0;
    }

    let mut pipeline = match Pipeline::new(source, config) {
        Ok(pipeline) => pipeline,
        Err(err) => return fail(&err),
    };
    pipeline.set_macro_table(macro_table);

    match pipeline.run(&stages) {
        Ok(report) => {
            print!("{}", report);
            0
        }
        Err(err) => fail(&err),
    }
}

fn show_codex() -> i32 {
    match codex::find_codex() {
        Some(path) => match codex::render(&path) {
            Ok(text) => {
                print!("{}", text);
                0
            }
            Err(err) => fail(&err),
        },
        None => {
            println!("(Codex not found. Expected docs/rexion_language_overview.md.)");
            1
        }
    }
}
