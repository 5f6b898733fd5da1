//! Assembly generation
//!
//! The backend is selected by [`rexion_core::target::Target`]. Only x86-64
//! is implemented; the ARM64 and RISC-V entry points exist so that selecting
//! them fails with a clear "unsupported architecture" error instead of
//! silently producing wrong output.
//!
//! # Module Structure
//!
//! - `x86_64.rs`: NASM-syntax ELF64 emitter (SysV ABI, `_start` entry)
//! - `arm64.rs`, `riscv.rs`: declared, deliberately unimplemented

mod arm64;
mod riscv;
mod x86_64;

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::lower::LoweredIr;
use rexion_core::target::Target;

/// Generate assembly text for the selected target.
pub fn generate(
    target: Target,
    ir: &LoweredIr,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    match target {
        Target::X86_64 => x86_64::generate(ir, config),
        Target::Arm64 => arm64::generate(ir, config),
        Target::RiscV => riscv::generate(ir, config),
    }
}
