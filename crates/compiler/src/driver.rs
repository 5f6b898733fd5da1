//! Stage sequencing
//!
//! The driver is the only component that sequences stages; components never
//! call each other across stage boundaries. A [`Pipeline`] owns the state
//! of one compilation (source text, tokens, tree, IR, macro table) and runs
//! stages in the order requested, computing missing prerequisites at most
//! once. Every compilation starts with fresh tables; nothing is shared
//! across pipelines.

use crate::ast::Program;
use crate::codegen;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::lower::{self, LoweredIr};
use crate::macros::{MacroTable, SharedMacroTable, shared};
use crate::optimizer;
use crate::parser::Parser;
use crate::{bundle, lexer};
use rexion_core::token::Token;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One observable stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Dump the token stream.
    Tokens,
    /// Run the parser (no output on success).
    Parse,
    /// Emit and dump the IR.
    Ir,
    /// Emit the assembly file.
    Asm,
}

/// State accumulated across the stages of one compilation.
#[derive(Debug)]
pub struct Pipeline {
    source_path: PathBuf,
    source: String,
    config: CompilerConfig,
    macro_table: SharedMacroTable,
    tokens: Option<Vec<Token>>,
    program: Option<Program>,
    ir: Option<LoweredIr>,
}

impl Pipeline {
    /// Read the source file and set up fresh per-compilation state.
    pub fn new(source_path: impl Into<PathBuf>, config: CompilerConfig) -> Result<Self, CompileError> {
        let source_path = source_path.into();
        let source =
            fs::read_to_string(&source_path).map_err(|e| CompileError::io(&source_path, e))?;
        Ok(Pipeline {
            source_path,
            source,
            config,
            macro_table: shared(MacroTable::new()),
            tokens: None,
            program: None,
            ir: None,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Replace the macro table with one loaded from `meta_path`.
    pub fn load_macros(&mut self, meta_path: impl Into<PathBuf>) {
        self.macro_table = shared(MacroTable::load(meta_path));
    }

    /// Share an existing macro table with this pipeline (the CLI threads one
    /// table through the standalone macro operations and the compile).
    pub fn set_macro_table(&mut self, table: SharedMacroTable) {
        self.macro_table = table;
    }

    /// Shared handle for the watcher and the macro subcommands.
    pub fn macro_table(&self) -> SharedMacroTable {
        self.macro_table.clone()
    }

    fn ensure_tokens(&mut self) -> &[Token] {
        if self.tokens.is_none() {
            info!("lexing {}", self.source_path.display());
            self.tokens = Some(lexer::lex(&self.source));
        }
        self.tokens.as_deref().unwrap_or_default()
    }

    fn ensure_program(&mut self) -> Result<&Program, CompileError> {
        if self.program.is_none() {
            let tokens = self.ensure_tokens().to_vec();
            info!("parsing {}", self.source_path.display());
            self.program = Some(Parser::new(tokens).parse()?);
        }
        // Populated just above; the expect documents the invariant.
        Ok(self.program.as_ref().expect("program just parsed"))
    }

    fn ensure_ir(&mut self) -> Result<&LoweredIr, CompileError> {
        if self.ir.is_none() {
            self.ensure_program()?;
            let program = self.program.as_ref().expect("program just parsed");
            info!("lowering {}", self.source_path.display());
            let mut ir = lower::lower(program, &self.config)?;
            if self.config.optimize {
                ir.instructions = optimizer::optimize(ir.instructions);
            }
            self.ir = Some(ir);
        }
        Ok(self.ir.as_ref().expect("ir just lowered"))
    }

    /// Run one stage, returning its printable report (empty for stages that
    /// only produce side effects).
    pub fn run_stage(&mut self, stage: Stage) -> Result<String, CompileError> {
        match stage {
            Stage::Tokens => {
                let tokens = self.ensure_tokens();
                Ok(lexer::dump(tokens))
            }
            Stage::Parse => {
                // The tree serialization is deterministic: re-parsing the
                // same tokens reports byte-identical output.
                let program = self.ensure_program()?;
                Ok(program.to_string())
            }
            Stage::Ir => {
                let ir = self.ensure_ir()?;
                let dump = ir.dump();
                Ok(dump
                    .lines()
                    .map(|line| format!("[IR] {}\n", line))
                    .collect())
            }
            Stage::Asm => {
                self.ensure_ir()?;
                let ir = self.ir.as_ref().expect("ir just lowered");
                let asm = codegen::generate(self.config.target, ir, &self.config)?;
                let asm_path = &self.config.asm_path;
                fs::write(asm_path, asm).map_err(|e| CompileError::io(asm_path, e))?;
                Ok(format!("[ASM] {} generated from IR\n", asm_path.display()))
            }
        }
    }

    /// Run the given stages in order.
    pub fn run(&mut self, stages: &[Stage]) -> Result<String, CompileError> {
        let mut report = String::new();
        for stage in stages {
            report.push_str(&self.run_stage(*stage)?);
        }
        Ok(report)
    }

    /// `--complete-macros`: list every macro with its expansion, the trace
    /// view of the loaded table.
    pub fn complete_macros(&self) -> String {
        let guard = match self.macro_table.read() {
            Ok(guard) => guard,
            Err(_) => return String::from("(macro table unavailable)\n"),
        };
        crate::macros::listing(&guard)
    }

    /// `--reload-macros`: explicit reload of the loaded metadata file.
    pub fn reload_macros(&self) {
        crate::macros::reload_shared(&self.macro_table);
    }

    /// `--export-macros <dir>`: write the macro bundle archive.
    pub fn export_macros(&self, destination: &Path) -> Result<PathBuf, CompileError> {
        let guard = self.macro_table.read().map_err(|_| CompileError::Metadata {
            path: PathBuf::new(),
            message: "macro table lock poisoned".to_string(),
        })?;
        bundle::export(&guard, destination)
    }
}
