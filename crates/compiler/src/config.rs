//! Compiler configuration
//!
//! Per-compilation knobs threaded through the pipeline. The float-print
//! backend default is fixed at build time by the `float-printf` Cargo
//! feature; the struct stays constructible with either backend so both
//! paths are testable in one build.

use rexion_core::target::Target;
use std::path::PathBuf;

/// How `print` of a float value reaches the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPrintBackend {
    /// libc-linked fast path (`extern printf`).
    Printf,
    /// Self-contained path: x87 string conversion plus `write(2)`.
    Syscall,
}

impl Default for FloatPrintBackend {
    fn default() -> Self {
        if cfg!(feature = "float-printf") {
            FloatPrintBackend::Printf
        } else {
            FloatPrintBackend::Syscall
        }
    }
}

/// Configuration for one compilation.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Which assembly backend runs. Only x86-64 is implemented.
    pub target: Target,
    /// Float print lowering selected at IR emission time.
    pub float_print: FloatPrintBackend,
    /// Run the peephole passes between lowering and emission.
    pub optimize: bool,
    /// Where the assembly text lands. The driver uses the fixed name
    /// `rexion.asm` in the working directory.
    pub asm_path: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            target: Target::default(),
            float_print: FloatPrintBackend::default(),
            optimize: false,
            asm_path: PathBuf::from("rexion.asm"),
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_float_print(mut self, backend: FloatPrintBackend) -> Self {
        self.float_print = backend;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_asm_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.asm_path = path.into();
        self
    }
}
