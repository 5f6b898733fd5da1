//! Register-oriented intermediate representation
//!
//! An IR instruction is a record `{ op, arg1?, arg2? }`. `arg2` is present
//! for binary ops and absent for unary and zero-ary ops. Two renderings
//! exist:
//!
//! - the *dump* form ([`std::fmt::Display`]): `OP arg1, arg2` with a
//!   comma-separated argument list, matching the debug IR trace;
//! - the *file* form ([`IrInstruction::format_line`] /
//!   [`IrInstruction::parse_line`]): exactly three whitespace-separated
//!   fields per line, with missing arguments written as the sentinel `_`.
//!   This is the interchange format of the standalone peephole tool.

use std::fmt;

/// Sentinel written for a missing argument in the three-field file form.
pub const MISSING_ARG: &str = "_";

/// The closed operation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrOp {
    Load,
    Store,
    Add,
    Sub,
    Mul,
    Div,
    Mov,
    FloatLoad,
    FloatAdd,
    Print,
    PrintFloatPrintf,
    PrintFloatSyscall,
    Cmp,
    Jmp,
    Call,
    Nop,
    Halt,
    // Class lowering
    Class,
    EndClass,
    Field,
    Method,
    Inherit,
    New,
    Eval,
    /// Pass-through annotation (feature statements). Rendered as the comment
    /// `; [FEATURE] <lexeme>` in dumps and skipped by the file reader.
    Annotation,
}

impl IrOp {
    pub fn as_str(self) -> &'static str {
        match self {
            IrOp::Load => "LOAD",
            IrOp::Store => "STORE",
            IrOp::Add => "ADD",
            IrOp::Sub => "SUB",
            IrOp::Mul => "MUL",
            IrOp::Div => "DIV",
            IrOp::Mov => "MOV",
            IrOp::FloatLoad => "FLOAT_LOAD",
            IrOp::FloatAdd => "FLOAT_ADD",
            IrOp::Print => "PRINT",
            IrOp::PrintFloatPrintf => "PRINT_FLOAT_PRINTF",
            IrOp::PrintFloatSyscall => "PRINT_FLOAT_SYSCALL",
            IrOp::Cmp => "CMP",
            IrOp::Jmp => "JMP",
            IrOp::Call => "CALL",
            IrOp::Nop => "NOP",
            IrOp::Halt => "HALT",
            IrOp::Class => "CLASS",
            IrOp::EndClass => "ENDCLASS",
            IrOp::Field => "FIELD",
            IrOp::Method => "METHOD",
            IrOp::Inherit => "INHERIT",
            IrOp::New => "NEW",
            IrOp::Eval => "EVAL",
            IrOp::Annotation => "ANNOTATION",
        }
    }

    pub fn parse(text: &str) -> Option<IrOp> {
        let op = match text {
            "LOAD" => IrOp::Load,
            "STORE" => IrOp::Store,
            "ADD" => IrOp::Add,
            "SUB" => IrOp::Sub,
            "MUL" => IrOp::Mul,
            "DIV" => IrOp::Div,
            "MOV" => IrOp::Mov,
            "FLOAT_LOAD" => IrOp::FloatLoad,
            "FLOAT_ADD" => IrOp::FloatAdd,
            "PRINT" => IrOp::Print,
            "PRINT_FLOAT_PRINTF" => IrOp::PrintFloatPrintf,
            "PRINT_FLOAT_SYSCALL" => IrOp::PrintFloatSyscall,
            "CMP" => IrOp::Cmp,
            "JMP" => IrOp::Jmp,
            "CALL" => IrOp::Call,
            "NOP" => IrOp::Nop,
            "HALT" => IrOp::Halt,
            "CLASS" => IrOp::Class,
            "ENDCLASS" => IrOp::EndClass,
            "FIELD" => IrOp::Field,
            "METHOD" => IrOp::Method,
            "INHERIT" => IrOp::Inherit,
            "NEW" => IrOp::New,
            "EVAL" => IrOp::Eval,
            "ANNOTATION" => IrOp::Annotation,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for IrOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single IR record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrInstruction {
    pub op: IrOp,
    pub arg1: Option<String>,
    pub arg2: Option<String>,
}

impl IrInstruction {
    pub fn nullary(op: IrOp) -> Self {
        IrInstruction {
            op,
            arg1: None,
            arg2: None,
        }
    }

    pub fn unary(op: IrOp, arg1: impl Into<String>) -> Self {
        IrInstruction {
            op,
            arg1: Some(arg1.into()),
            arg2: None,
        }
    }

    pub fn binary(op: IrOp, arg1: impl Into<String>, arg2: impl Into<String>) -> Self {
        IrInstruction {
            op,
            arg1: Some(arg1.into()),
            arg2: Some(arg2.into()),
        }
    }

    /// Rewrite this record to a `NOP` with both argument fields cleared.
    pub fn clear_to_nop(&mut self) {
        self.op = IrOp::Nop;
        self.arg1 = None;
        self.arg2 = None;
    }

    /// Render the three-field file form: `OP arg1 arg2`, missing arguments
    /// written as [`MISSING_ARG`].
    pub fn format_line(&self) -> String {
        format!(
            "{} {} {}",
            self.op,
            self.arg1.as_deref().unwrap_or(MISSING_ARG),
            self.arg2.as_deref().unwrap_or(MISSING_ARG),
        )
    }

    /// Parse one line of the file form.
    ///
    /// Blank lines and `;` comment lines yield `Ok(None)`. Any other line
    /// must carry exactly three whitespace-separated fields, the first being
    /// a known op name; `_` in an argument field means "absent".
    pub fn parse_line(line: &str) -> Result<Option<IrInstruction>, String> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            return Ok(None);
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(format!(
                "expected 3 fields per IR line, found {}: '{}'",
                fields.len(),
                trimmed
            ));
        }
        let op = IrOp::parse(fields[0]).ok_or_else(|| format!("unknown IR op '{}'", fields[0]))?;
        let arg = |f: &str| {
            if f == MISSING_ARG {
                None
            } else {
                Some(f.to_string())
            }
        };
        Ok(Some(IrInstruction {
            op,
            arg1: arg(fields[1]),
            arg2: arg(fields[2]),
        }))
    }
}

impl fmt::Display for IrInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op == IrOp::Annotation {
            return write!(f, "; [FEATURE] {}", self.arg1.as_deref().unwrap_or(""));
        }
        match (&self.arg1, &self.arg2) {
            (Some(a1), Some(a2)) => write!(f, "{} {}, {}", self.op, a1, a2),
            (Some(a1), None) => write!(f, "{} {}", self.op, a1),
            _ => write!(f, "{}", self.op),
        }
    }
}

/// Parse a whole IR file in the three-field form. Line numbers in error
/// messages are 1-based.
pub fn parse_ir_text(text: &str) -> Result<Vec<IrInstruction>, String> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match IrInstruction::parse_line(line) {
            Ok(Some(instr)) => out.push(instr),
            Ok(None) => {}
            Err(e) => return Err(format!("line {}: {}", idx + 1, e)),
        }
    }
    Ok(out)
}

/// Render a sequence of records in the three-field file form, one per line,
/// with a trailing newline.
pub fn format_ir_text(instructions: &[IrInstruction]) -> String {
    let mut out = String::new();
    for instr in instructions {
        out.push_str(&instr.format_line());
        out.push('\n');
    }
    out
}
