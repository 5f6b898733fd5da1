//! Syntax tree -> IR lowering
//!
//! Emits the header pair (`section .code`, `entry main`) once per
//! compilation unit, then a stream of IR records, terminated by `HALT`.
//!
//! Class lowering:
//!
//! ```text
//! CLASS <name>
//!   INHERIT <base1>, <base2>, ...        (only if bases are present)
//!   FIELD  <vis> <name> : <type>         (Define members)
//!   METHOD <vis> <name>()                (Func members; body IR follows)
//! ENDCLASS
//! ```
//!
//! A method's body records follow its `METHOD` record, before the next
//! member or `ENDCLASS`. Nested classes are a hard error.
//!
//! Feature statements lower to a pass-through annotation record (rendered
//! `; [FEATURE] <lexeme>` in dumps) so the source intent is preserved
//! without committing to semantics. Bare `this` / `this.member` accesses
//! produce no IR; only calls do.

use crate::ast::{Program, Statement, Visibility};
use crate::config::{CompilerConfig, FloatPrintBackend};
use crate::error::CompileError;
use rexion_core::ir::{IrInstruction, IrOp};
use rexion_core::symtab::SymbolTable;

/// Type names that classify a `define` as float-valued.
const FLOAT_TYPES: &[&str] = &["float", "double"];

/// The lowered artifact: the instruction stream plus the symbol table that
/// names its virtual registers.
#[derive(Debug, Clone)]
pub struct LoweredIr {
    pub instructions: Vec<IrInstruction>,
    pub symbols: SymbolTable,
}

impl LoweredIr {
    /// Wrap a bare instruction stream (no symbol information), as used by
    /// the standalone tools that read IR from a file.
    pub fn from_instructions(instructions: Vec<IrInstruction>) -> Self {
        LoweredIr {
            instructions,
            symbols: SymbolTable::new(),
        }
    }

    /// Render the debug dump: header pair, then one record per line.
    pub fn dump(&self) -> String {
        let mut out = String::from("section .code\nentry main\n");
        for instr in &self.instructions {
            out.push_str(&instr.to_string());
            out.push('\n');
        }
        out
    }
}

/// Per-compilation IR emitter. Owns the symbol table and the growing
/// record stream; [`IrEmitter::finish`] seals the stream with `HALT`.
pub struct IrEmitter<'a> {
    config: &'a CompilerConfig,
    symbols: SymbolTable,
    ir: Vec<IrInstruction>,
    object_count: usize,
}

/// Lower a parsed program. Every compilation starts with a fresh symbol
/// table; nothing is shared across compilations.
pub fn lower(program: &Program, config: &CompilerConfig) -> Result<LoweredIr, CompileError> {
    let mut emitter = IrEmitter::new(config);
    emitter.lower_program(program)?;
    Ok(emitter.finish())
}

impl<'a> IrEmitter<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        IrEmitter {
            config,
            symbols: SymbolTable::new(),
            ir: Vec::new(),
            object_count: 0,
        }
    }

    /// Append one record to the stream.
    pub fn emit(&mut self, instr: IrInstruction) {
        self.ir.push(instr);
    }

    /// Lower every statement of `program` into the stream.
    pub fn lower_program(&mut self, program: &Program) -> Result<(), CompileError> {
        for statement in &program.statements {
            self.lower_statement(statement)?;
        }
        Ok(())
    }

    /// Terminate the logical flow and hand back the artifact.
    pub fn finish(mut self) -> LoweredIr {
        self.emit(IrInstruction::nullary(IrOp::Halt));
        LoweredIr {
            instructions: self.ir,
            symbols: self.symbols,
        }
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Define { name, type_name } => self.lower_define(name, type_name),
            Statement::Print { ident } => self.lower_print(ident),
            Statement::Func { body, .. } => {
                // No free-function call convention is defined; the body
                // lowers inline.
                for inner in body {
                    self.lower_statement(inner)?;
                }
                Ok(())
            }
            Statement::Class {
                name,
                bases,
                members,
            } => self.lower_class(name, bases, members),
            Statement::Visibility { inner, .. } => {
                // Outside a class body the modifier carries no meaning;
                // lower the wrapped declaration.
                self.lower_statement(inner)
            }
            Statement::New { type_name } => {
                self.object_count += 1;
                self.emit(IrInstruction::unary(
                    IrOp::New,
                    format!("{} AS obj{}", type_name, self.object_count),
                ));
                Ok(())
            }
            Statement::SuperCall { method } => {
                self.emit(IrInstruction::unary(IrOp::Call, format!("super.{}()", method)));
                Ok(())
            }
            Statement::ThisAccess { member, is_call } => {
                if *is_call
                    && let Some(method) = member
                {
                    self.emit(IrInstruction::unary(IrOp::Call, format!("this.{}()", method)));
                }
                Ok(())
            }
            Statement::Eval { expr } => {
                self.emit(IrInstruction::unary(IrOp::Eval, expr.clone()));
                self.emit(IrInstruction::binary(IrOp::Store, "<eval_result>", "result"));
                Ok(())
            }
            Statement::Feature { lexeme, .. } => {
                self.emit(IrInstruction::unary(IrOp::Annotation, lexeme.clone()));
                Ok(())
            }
        }
    }

    fn lower_define(&mut self, name: &str, type_name: &str) -> Result<(), CompileError> {
        let is_float = FLOAT_TYPES.contains(&type_name);
        let register = self.symbols.allocate(name, is_float)?;
        if is_float {
            self.emit(IrInstruction::binary(IrOp::FloatLoad, register, "0.0"));
        } else {
            self.emit(IrInstruction::binary(IrOp::Load, register, "0"));
        }
        Ok(())
    }

    fn lower_print(&mut self, ident: &str) -> Result<(), CompileError> {
        let is_float = self.symbols.lookup(ident).is_some_and(|s| s.is_float);
        if is_float {
            // The backend choice is fixed at emission time; the other path
            // never appears in the stream.
            let register = self.symbols.allocate(ident, true)?;
            let op = match self.config.float_print {
                FloatPrintBackend::Printf => IrOp::PrintFloatPrintf,
                FloatPrintBackend::Syscall => IrOp::PrintFloatSyscall,
            };
            self.emit(IrInstruction::unary(op, register));
        } else {
            self.emit(IrInstruction::unary(IrOp::Print, ident));
        }
        Ok(())
    }

    fn lower_class(
        &mut self,
        name: &str,
        bases: &[String],
        members: &[Statement],
    ) -> Result<(), CompileError> {
        self.emit(IrInstruction::unary(IrOp::Class, name));
        if !bases.is_empty() {
            self.emit(IrInstruction::unary(IrOp::Inherit, bases.join(", ")));
        }
        for member in members {
            self.lower_member(member, None)?;
        }
        self.emit(IrInstruction::nullary(IrOp::EndClass));
        Ok(())
    }

    fn lower_member(
        &mut self,
        member: &Statement,
        visibility: Option<Visibility>,
    ) -> Result<(), CompileError> {
        match member {
            Statement::Visibility { visibility, inner } => {
                self.lower_member(inner, Some(*visibility))
            }
            Statement::Define { name, type_name } => {
                self.emit(IrInstruction::unary(
                    IrOp::Field,
                    qualified(visibility, &format!("{} : {}", name, type_name)),
                ));
                Ok(())
            }
            Statement::Func { name, body } => {
                self.emit(IrInstruction::unary(
                    IrOp::Method,
                    qualified(visibility, &format!("{}()", name)),
                ));
                for inner in body {
                    if let Statement::Class { name, .. } = inner {
                        return Err(CompileError::NestedClass { name: name.clone() });
                    }
                    self.lower_statement(inner)?;
                }
                Ok(())
            }
            Statement::Class { name, .. } => Err(CompileError::NestedClass { name: name.clone() }),
            // Any other statement in a class body lowers as usual.
            other => self.lower_statement(other),
        }
    }
}

fn qualified(visibility: Option<Visibility>, rest: &str) -> String {
    match visibility {
        Some(vis) => format!("{} {}", vis, rest),
        None => rest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn lower_src(source: &str) -> LoweredIr {
        let program = parse_source(source).expect("source should parse");
        lower(&program, &CompilerConfig::new()).expect("lowering should succeed")
    }

    fn lines(ir: &LoweredIr) -> Vec<String> {
        ir.instructions.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_hello_print_program() {
        let ir = lower_src("define x : int;\nprint x;\n");
        assert_eq!(lines(&ir), vec!["LOAD R1, 0", "PRINT x", "HALT"]);
    }

    #[test]
    fn test_dump_has_header_pair() {
        let dump = lower_src("print x;").dump();
        assert!(dump.starts_with("section .code\nentry main\n"));
        assert!(dump.ends_with("HALT\n"));
    }

    #[test]
    fn test_float_define_uses_float_series() {
        let ir = lower_src("define f : float;\ndefine x : int;\n");
        assert_eq!(
            lines(&ir),
            vec!["FLOAT_LOAD XMM1, 0.0", "LOAD R1, 0", "HALT"]
        );
    }

    #[test]
    fn test_float_print_backend_selection() {
        let program = parse_source("define f : float;\nprint f;\n").unwrap();

        let syscall = lower(
            &program,
            &CompilerConfig::new().with_float_print(FloatPrintBackend::Syscall),
        )
        .unwrap();
        assert!(
            syscall
                .instructions
                .iter()
                .any(|i| i.op == IrOp::PrintFloatSyscall)
        );
        assert!(
            !syscall
                .instructions
                .iter()
                .any(|i| i.op == IrOp::PrintFloatPrintf)
        );

        let printf = lower(
            &program,
            &CompilerConfig::new().with_float_print(FloatPrintBackend::Printf),
        )
        .unwrap();
        assert!(
            printf
                .instructions
                .iter()
                .any(|i| i.op == IrOp::PrintFloatPrintf)
        );
    }

    #[test]
    fn test_multiple_inheritance_sequence() {
        let ir = lower_src("class Dog inherit Animal, Pet { public func speak() {} }");
        assert_eq!(
            lines(&ir),
            vec![
                "CLASS Dog",
                "INHERIT Animal, Pet",
                "METHOD public speak()",
                "ENDCLASS",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_class_fields_and_method_bodies() {
        let ir = lower_src(
            "class Dog { private define breed : String; public func speak() { print x; } }",
        );
        assert_eq!(
            lines(&ir),
            vec![
                "CLASS Dog",
                "FIELD private breed : String",
                "METHOD public speak()",
                "PRINT x",
                "ENDCLASS",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_class_without_bases_has_no_inherit() {
        let ir = lower_src("class Animal {}");
        assert_eq!(lines(&ir), vec!["CLASS Animal", "ENDCLASS", "HALT"]);
    }

    #[test]
    fn test_nested_class_is_rejected() {
        let program = parse_source("class A { class B {} }").unwrap();
        let err = lower(&program, &CompilerConfig::new()).unwrap_err();
        assert!(matches!(err, CompileError::NestedClass { ref name } if name == "B"));

        let program = parse_source("class A { func m() { class C {} } }").unwrap();
        let err = lower(&program, &CompilerConfig::new()).unwrap_err();
        assert!(matches!(err, CompileError::NestedClass { ref name } if name == "C"));
    }

    #[test]
    fn test_new_eval_super_this() {
        let ir = lower_src("new Dog();\nnew Cat();\neval(7);\nsuper.speak();\nthis.fetch();\nthis.name;\n");
        assert_eq!(
            lines(&ir),
            vec![
                "NEW Dog AS obj1",
                "NEW Cat AS obj2",
                "EVAL 7",
                "STORE <eval_result>, result",
                "CALL super.speak()",
                "CALL this.fetch()",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_feature_statement_is_annotation_only() {
        let ir = lower_src("raytracing;\nmorphing;\n");
        assert_eq!(
            lines(&ir),
            vec!["; [FEATURE] raytracing", "; [FEATURE] morphing", "HALT"]
        );
    }

    #[test]
    fn test_func_body_lowers_inline() {
        let ir = lower_src("func main() { define x : int; print x; }");
        assert_eq!(lines(&ir), vec!["LOAD R1, 0", "PRINT x", "HALT"]);
    }

    #[test]
    fn test_emit_api_seals_with_halt() {
        let config = CompilerConfig::new();
        let mut emitter = IrEmitter::new(&config);
        emitter.emit(IrInstruction::binary(IrOp::Load, "R1", "5"));
        emitter.emit(IrInstruction::unary(IrOp::Print, "result"));
        let ir = emitter.finish();
        assert_eq!(
            lines(&ir),
            vec!["LOAD R1, 5", "PRINT result", "HALT"]
        );
    }
}
