//! Intrinsic symbol explainer
//!
//! Maps source symbols to their machine-level reading: assembly mnemonic,
//! opcode hex, and opcode bits. With arguments each one is explained in
//! turn; with no arguments the tool enters an interactive prompt loop
//! (empty line or EOF exits). Unknown symbols are reported without failing
//! the process.

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

#[derive(Parser)]
#[command(name = "symbol-explain")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explain Rexion intrinsic symbols", long_about = None)]
struct Cli {
    /// Symbols to explain; interactive prompt when omitted
    symbols: Vec<String>,
}

struct SymbolInfo {
    symbol: &'static str,
    asm: &'static str,
    hex: &'static str,
    bits: &'static str,
}

/// The fixed intrinsic table.
const INTRINSICS: &[SymbolInfo] = &[
    SymbolInfo { symbol: "and", asm: "AND", hex: "0x1D2", bits: "111010010" },
    SymbolInfo { symbol: "or", asm: "OR", hex: "0x1D3", bits: "111010011" },
    SymbolInfo { symbol: "xor", asm: "XOR", hex: "0x1D4", bits: "111010100" },
    SymbolInfo { symbol: "not", asm: "NOT", hex: "0x1D5", bits: "111010101" },
    SymbolInfo { symbol: "nullptr", asm: "XOR reg, reg", hex: "0x1E0", bits: "111100000" },
    SymbolInfo { symbol: "throw", asm: "JMP throw_handler", hex: "0x1E1", bits: "111100001" },
    SymbolInfo { symbol: "if", asm: "CMP + conditional jump", hex: "0x205", bits: "1000000101" },
    SymbolInfo { symbol: "new", asm: "CALL malloc", hex: "0x201", bits: "1000000001" },
    SymbolInfo { symbol: "delete", asm: "CALL free", hex: "0x202", bits: "1000000010" },
    SymbolInfo { symbol: "+", asm: "ADD", hex: "0x01", bits: "00000001" },
    SymbolInfo { symbol: "-", asm: "SUB", hex: "0x29", bits: "00101001" },
    SymbolInfo { symbol: "*", asm: "MUL", hex: "0xF7", bits: "11110111" },
    // Same opcode as MUL, different ModRM bits.
    SymbolInfo { symbol: "/", asm: "DIV", hex: "0xF7", bits: "11110111" },
];

fn explain(symbol: &str) -> String {
    match INTRINSICS.iter().find(|info| info.symbol == symbol) {
        Some(info) => format!(
            "Symbol: {}\nASM: {}\nHex: {}\nBin: {}\n",
            info.symbol, info.asm, info.hex, info.bits
        ),
        None => format!("Unknown symbol: {}\n", symbol),
    }
}

fn main() {
    let cli = Cli::parse();

    if !cli.symbols.is_empty() {
        for symbol in &cli.symbols {
            print!("{}", explain(symbol));
        }
        return;
    }

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("symbol-explain: error: {}", err);
            std::process::exit(1);
        }
    };
    println!("Rexion symbol explainer. Empty line exits.");
    loop {
        match editor.readline("symbol> ") {
            Ok(line) => {
                let symbol = line.trim();
                if symbol.is_empty() {
                    break;
                }
                let _ = editor.add_history_entry(symbol);
                print!("{}", explain(symbol));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("symbol-explain: error: {}", err);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_row_is_explained() {
        for info in INTRINSICS {
            let text = explain(info.symbol);
            assert!(text.contains(info.asm));
            assert!(text.contains(info.hex));
            assert!(text.contains(info.bits));
        }
    }

    #[test]
    fn test_operators_are_known() {
        assert!(explain("+").contains("ADD"));
        assert!(explain("/").contains("DIV"));
    }

    #[test]
    fn test_unknown_symbol_is_reported() {
        assert_eq!(explain("frobnicate"), "Unknown symbol: frobnicate\n");
    }
}
