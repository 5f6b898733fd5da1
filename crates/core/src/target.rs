//! Emission target selection
//!
//! Only x86-64 has a full backend. The other tags are recognized so that
//! selecting them fails with a clear "unsupported architecture" error
//! instead of silently producing wrong output.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    X86_64,
    Arm64,
    RiscV,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::X86_64 => "x86_64",
            Target::Arm64 => "arm64",
            Target::RiscV => "riscv",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" | "x86-64" => Ok(Target::X86_64),
            "arm64" | "aarch64" => Ok(Target::Arm64),
            "riscv" | "riscv64" => Ok(Target::RiscV),
            other => Err(format!(
                "unknown target '{}' (expected x86_64, arm64, or riscv)",
                other
            )),
        }
    }
}
