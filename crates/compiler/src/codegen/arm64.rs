//! ARM64 backend stub
//!
//! The interface exists so the target tag is recognized; the body is
//! deliberately unimplemented and reports a structured error.

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::lower::LoweredIr;
use rexion_core::target::Target;

pub fn generate(_ir: &LoweredIr, _config: &CompilerConfig) -> Result<String, CompileError> {
    Err(CompileError::UnsupportedTarget(Target::Arm64))
}
