//! x86-64 assembly emission
//!
//! Writes NASM-syntax text targeting the SysV ABI on ELF64 with `_start`
//! as the entry symbol. The output is meant for an external
//! `nasm -felf64` / `ld` step; nothing is assembled here.
//!
//! Virtual registers have no physical meaning, so every virtual register
//! and named memory operand is backed by an 8-byte `.data` slot (`vr_R1`,
//! `var_x`); `rax` and `rbx` serve as scratch. The fixed scratch inventory
//! is always present: `result`, a 64-byte `buffer`, the float literal slots
//! `fltval`/`fltval2` (more as needed), `fltstr`, `ten`, and `newline`.
//!
//! Integer printing converts through `int_to_str` (base-10 backward fill
//! into the scratch buffer) and goes out via `write(1, ..)`. Float printing
//! is whichever backend the IR carries: `PRINT_FLOAT_PRINTF` links against
//! libc (`extern printf`), `PRINT_FLOAT_SYSCALL` uses the self-contained
//! x87 `float_to_str` conversion. Only the path actually used appears in
//! the output.
//!
//! Ops with no machine semantics in the source language (class records,
//! `CALL`, `EVAL`, `JMP`, feature annotations) are emitted as comment
//! lines so the stream stays inspectable without inventing behavior.

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::lower::LoweredIr;
use rexion_core::ir::{IrInstruction, IrOp};
use std::fmt::Write as _;

pub fn generate(ir: &LoweredIr, _config: &CompilerConfig) -> Result<String, CompileError> {
    let mut emitter = Emitter::new(ir);
    emitter.scan_operands();
    Ok(emitter.render())
}

/// A resolved instruction operand.
enum Operand {
    Immediate(i64),
    Slot(String),
}

struct Emitter<'a> {
    ir: &'a LoweredIr,
    /// Memory slot labels in first-use order (fixed `result` excluded).
    int_slots: Vec<String>,
    /// Float literal slots: (virtual register, literal text).
    float_slots: Vec<(String, String)>,
    needs_printf: bool,
    needs_float_to_str: bool,
}

impl<'a> Emitter<'a> {
    fn new(ir: &'a LoweredIr) -> Self {
        let needs_printf = ir
            .instructions
            .iter()
            .any(|i| i.op == IrOp::PrintFloatPrintf);
        let needs_float_to_str = ir
            .instructions
            .iter()
            .any(|i| i.op == IrOp::PrintFloatSyscall);
        Emitter {
            ir,
            int_slots: Vec::new(),
            float_slots: Vec::new(),
            needs_printf,
            needs_float_to_str,
        }
    }

    /// First pass: assign `.data` slots to every storage operand.
    fn scan_operands(&mut self) {
        for instr in &self.ir.instructions {
            match instr.op {
                IrOp::Load | IrOp::Store | IrOp::Mov => {
                    self.intern(instr.arg1.as_deref());
                    self.intern_source(instr.arg2.as_deref());
                }
                IrOp::Add | IrOp::Sub | IrOp::Mul | IrOp::Div | IrOp::Cmp => {
                    self.intern(instr.arg1.as_deref());
                    self.intern_source(instr.arg2.as_deref());
                }
                IrOp::Print => {
                    if let Some(name) = instr.arg1.as_deref() {
                        let resolved = self.resolve_print_operand(name);
                        self.intern(Some(resolved.as_str()));
                    }
                }
                IrOp::FloatLoad => {
                    if let (Some(register), Some(literal)) =
                        (instr.arg1.as_deref(), instr.arg2.as_deref())
                        && !self.float_slots.iter().any(|(r, _)| r == register)
                    {
                        let literal = if literal.parse::<f64>().is_ok() {
                            literal.to_string()
                        } else {
                            "0.0".to_string()
                        };
                        self.float_slots.push((register.to_string(), literal));
                    }
                }
                _ => {}
            }
        }
    }

    /// `print x` goes through the symbol table: a known integer variable
    /// prints the slot of its virtual register.
    fn resolve_print_operand(&self, name: &str) -> String {
        match self.ir.symbols.lookup(name) {
            Some(sym) if !sym.is_float => sym.register.clone(),
            _ => name.to_string(),
        }
    }

    fn intern(&mut self, operand: Option<&str>) {
        if let Some(label) = operand.and_then(slot_label)
            && label != "result"
            && !self.int_slots.contains(&label)
        {
            self.int_slots.push(label);
        }
    }

    /// Source positions may also be integer literals; only idents get slots.
    fn intern_source(&mut self, operand: Option<&str>) {
        if let Some(text) = operand
            && text.parse::<i64>().is_err()
        {
            self.intern(Some(text));
        }
    }

    fn float_slot(&self, register: &str) -> String {
        self.float_slots
            .iter()
            .position(|(r, _)| r == register)
            .map(float_slot_name)
            .unwrap_or_else(|| "fltval".to_string())
    }

    fn operand(&self, text: &str) -> Option<Operand> {
        if let Ok(value) = text.parse::<i64>() {
            return Some(Operand::Immediate(value));
        }
        slot_label(text).map(Operand::Slot)
    }

    fn render(&self) -> String {
        let mut out = String::new();
        self.render_data(&mut out);
        self.render_text(&mut out);
        out
    }

    fn render_data(&self, out: &mut String) {
        out.push_str("section .data\n");
        out.push_str("result dq 0\n");
        out.push_str("buffer db 64 dup(0)\n");
        // The first two float literal slots are always present.
        for index in 0..self.float_slots.len().max(2) {
            let literal = self
                .float_slots
                .get(index)
                .map(|(_, lit)| lit.as_str())
                .unwrap_or("0.0");
            let _ = writeln!(out, "{} dq {}", float_slot_name(index), literal);
        }
        out.push_str("fltstr db 64 dup(0)\n");
        out.push_str("ten dq 10.0\n");
        out.push_str("newline db 0xA, 0\n");
        if self.needs_printf {
            out.push_str("fmt db '%f', 10, 0\n");
        }
        for label in &self.int_slots {
            let _ = writeln!(out, "{} dq 0", label);
        }
    }

    fn render_text(&self, out: &mut String) {
        out.push_str("section .text\n");
        if self.needs_printf {
            out.push_str("extern printf\n");
        }
        out.push_str("global _start\n");
        out.push_str("_start:\n");

        let mut halted = false;
        for instr in &self.ir.instructions {
            self.translate(instr, out);
            if instr.op == IrOp::Halt {
                halted = true;
            }
        }
        if !halted {
            // A stream without HALT still terminates cleanly.
            self.emit_exit(out);
        }

        self.render_int_to_str(out);
        if self.needs_float_to_str {
            self.render_float_to_str(out);
        }
    }

    fn translate(&self, instr: &IrInstruction, out: &mut String) {
        match instr.op {
            IrOp::Load | IrOp::Store | IrOp::Mov => {
                let Some(dest) = instr.arg1.as_deref().and_then(slot_label) else {
                    emit_comment(instr, out);
                    return;
                };
                match instr.arg2.as_deref().and_then(|a| self.operand(a)) {
                    Some(Operand::Immediate(value)) => {
                        let _ = writeln!(out, "    mov rax, {}", value);
                    }
                    Some(Operand::Slot(src)) => {
                        let _ = writeln!(out, "    mov rax, [{}]", src);
                    }
                    None => out.push_str("    mov rax, 0\n"),
                }
                let _ = writeln!(out, "    mov [{}], rax", dest);
            }
            IrOp::Add | IrOp::Sub | IrOp::Mul | IrOp::Div => {
                let (Some(dest), Some(src)) = (
                    instr.arg1.as_deref().and_then(slot_label),
                    instr.arg2.as_deref().and_then(|a| self.operand(a)),
                ) else {
                    emit_comment(instr, out);
                    return;
                };
                let _ = writeln!(out, "    mov rax, [{}]", dest);
                match src {
                    Operand::Immediate(value) => {
                        let _ = writeln!(out, "    mov rbx, {}", value);
                    }
                    Operand::Slot(label) => {
                        let _ = writeln!(out, "    mov rbx, [{}]", label);
                    }
                }
                match instr.op {
                    IrOp::Add => out.push_str("    add rax, rbx\n"),
                    IrOp::Sub => out.push_str("    sub rax, rbx\n"),
                    IrOp::Mul => out.push_str("    imul rax, rbx\n"),
                    IrOp::Div => {
                        out.push_str("    cqo\n");
                        out.push_str("    idiv rbx\n");
                    }
                    _ => {}
                }
                let _ = writeln!(out, "    mov [{}], rax", dest);
            }
            IrOp::Cmp => {
                let (Some(lhs), Some(rhs)) = (
                    instr.arg1.as_deref().and_then(|a| self.operand(a)),
                    instr.arg2.as_deref().and_then(|a| self.operand(a)),
                ) else {
                    emit_comment(instr, out);
                    return;
                };
                for (register, side) in [("rax", lhs), ("rbx", rhs)] {
                    match side {
                        Operand::Immediate(value) => {
                            let _ = writeln!(out, "    mov {}, {}", register, value);
                        }
                        Operand::Slot(label) => {
                            let _ = writeln!(out, "    mov {}, [{}]", register, label);
                        }
                    }
                }
                out.push_str("    cmp rax, rbx\n");
            }
            IrOp::Print => {
                let resolved = instr
                    .arg1
                    .as_deref()
                    .map(|name| self.resolve_print_operand(name));
                let Some(slot) = resolved.as_deref().and_then(slot_label) else {
                    emit_comment(instr, out);
                    return;
                };
                let _ = writeln!(out, "    mov rdi, [{}]", slot);
                out.push_str("    mov rsi, buffer\n");
                out.push_str("    call int_to_str\n");
                // int_to_str leaves rsi at the first digit and the length
                // in rax.
                out.push_str("    mov rdx, rax\n");
                out.push_str("    mov rax, 1\n");
                out.push_str("    mov rdi, 1\n");
                out.push_str("    syscall\n");
                out.push_str("    mov rax, 1\n");
                out.push_str("    mov rdi, 1\n");
                out.push_str("    mov rsi, newline\n");
                out.push_str("    mov rdx, 1\n");
                out.push_str("    syscall\n");
            }
            IrOp::FloatLoad => {
                // The literal lives in its .data slot; the x87 work happens
                // at the consuming FLOAT_ADD / print.
                if let (Some(register), Some(literal)) =
                    (instr.arg1.as_deref(), instr.arg2.as_deref())
                {
                    let _ = writeln!(
                        out,
                        "    ; {} := {} ({})",
                        register,
                        self.float_slot(register),
                        literal
                    );
                }
            }
            IrOp::FloatAdd => {
                let lhs = instr.arg1.as_deref().map(|r| self.float_slot(r));
                let rhs = instr.arg2.as_deref().map(|r| self.float_slot(r));
                let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                    emit_comment(instr, out);
                    return;
                };
                let _ = writeln!(out, "    fld qword [{}]", lhs);
                let _ = writeln!(out, "    fadd qword [{}]", rhs);
                out.push_str("    fstp qword [fltstr]\n");
            }
            IrOp::PrintFloatPrintf => {
                out.push_str("    lea rdi, [rel fmt]\n");
                out.push_str("    movq xmm0, [fltstr]\n");
                out.push_str("    mov rax, 1\n");
                out.push_str("    call printf\n");
            }
            IrOp::PrintFloatSyscall => {
                out.push_str("    call float_to_str\n");
                out.push_str("    mov rdx, rax\n");
                out.push_str("    mov rax, 1\n");
                out.push_str("    mov rdi, 1\n");
                out.push_str("    lea rsi, [fltstr + 16]\n");
                out.push_str("    syscall\n");
            }
            IrOp::Nop => out.push_str("    nop\n"),
            IrOp::Halt => self.emit_exit(out),
            // No machine semantics defined: keep the record visible.
            IrOp::Class
            | IrOp::EndClass
            | IrOp::Field
            | IrOp::Method
            | IrOp::Inherit
            | IrOp::New
            | IrOp::Eval
            | IrOp::Call
            | IrOp::Jmp
            | IrOp::Annotation => emit_comment(instr, out),
        }
    }

    fn emit_exit(&self, out: &mut String) {
        out.push_str("    mov eax, 60\n");
        out.push_str("    xor edi, edi\n");
        out.push_str("    syscall\n");
    }

    fn render_int_to_str(&self, out: &mut String) {
        out.push_str(INT_TO_STR);
    }

    fn render_float_to_str(&self, out: &mut String) {
        out.push_str(FLOAT_TO_STR);
    }
}

/// Base-10 conversion: backward fill toward the end of the 64-byte scratch
/// buffer. On return rsi points at the first digit and rax holds the length.
const INT_TO_STR: &str = "
int_to_str:
    mov rbx, 10
    mov rax, rdi
    xor rcx, rcx
    add rsi, 63
    mov byte [rsi], 0
.convert:
    xor rdx, rdx
    div rbx
    add dl, '0'
    dec rsi
    mov [rsi], dl
    inc rcx
    test rax, rax
    jnz .convert
    mov rax, rcx
    ret
";

/// x87 integer/fraction split via frndint and a multiply by `ten`. The
/// value sits in the first 8 bytes of `fltstr`; the rendered string (one
/// fractional digit) is built at `fltstr + 16`. Returns the length in rax.
const FLOAT_TO_STR: &str = "
float_to_str:
    fld qword [fltstr]
    fld st0
    frndint
    fsub st1, st0
    fistp qword [buffer + 32]
    fabs
    fmul qword [ten]
    frndint
    fistp qword [buffer + 40]
    mov rdi, [buffer + 32]
    mov rsi, buffer
    call int_to_str
    xor rcx, rcx
.copy:
    mov bl, [rsi + rcx]
    mov [fltstr + 16 + rcx], bl
    inc rcx
    cmp rcx, rax
    jne .copy
    mov byte [fltstr + 16 + rcx], '.'
    inc rcx
    mov rbx, [buffer + 40]
    add bl, '0'
    mov [fltstr + 16 + rcx], bl
    inc rcx
    mov rax, rcx
    ret
";

fn emit_comment(instr: &IrInstruction, out: &mut String) {
    let rendered = instr.to_string();
    if rendered.starts_with(';') {
        let _ = writeln!(out, "    {}", rendered);
    } else {
        let _ = writeln!(out, "    ; {}", rendered);
    }
}

/// `.data` label for a storage operand: virtual registers become `vr_*`,
/// `result` is the fixed slot, any other plain identifier becomes `var_*`.
/// Operands that are not plain identifiers (e.g. `<eval_result>`) get no
/// slot and the consuming record is emitted as a comment.
fn slot_label(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    if name == "result" {
        return Some("result".to_string());
    }
    if is_virtual_register(name) {
        return Some(format!("vr_{}", name));
    }
    Some(format!("var_{}", name))
}

fn is_virtual_register(name: &str) -> bool {
    let digits = name
        .strip_prefix("XMM")
        .or_else(|| name.strip_prefix('R'));
    digits.is_some_and(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
}

fn float_slot_name(index: usize) -> String {
    match index {
        0 => "fltval".to_string(),
        1 => "fltval2".to_string(),
        n => format!("fltval{}", n + 1),
    }
}
