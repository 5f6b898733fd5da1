//! Peephole IR optimizer
//!
//! Local rewrites over the instruction stream, semantically equivalent to
//! the input. Each sweep runs the passes in a fixed order:
//!
//! 1. redundant-load elimination (two consecutive identical `LOAD`s)
//! 2. add-zero removal (`ADD x, 0` -> `NOP`)
//! 3. self-move removal (`MOV x, x` -> `NOP`)
//! 4. constant fold for add (`LOAD t1, c1 ; LOAD t2, c2 ; ADD t3, ?` with
//!    integer literals and `t3` distinct from `t1` and `t2` collapses to
//!    `LOAD t3, c1+c2`)
//!
//! Sweeps repeat until a full sweep makes no change. Rewrites scan left to
//! right; in ties the leftmost candidate wins. Running the optimizer on its
//! own output changes nothing.

use rexion_core::ir::{IrInstruction, IrOp};

/// Run all passes to fixpoint.
pub fn optimize(mut ir: Vec<IrInstruction>) -> Vec<IrInstruction> {
    loop {
        let mut changed = false;
        changed |= eliminate_redundant_loads(&mut ir);
        changed |= remove_add_zero(&mut ir);
        changed |= remove_self_moves(&mut ir);
        changed |= fold_constant_adds(&mut ir);
        if !changed {
            return ir;
        }
    }
}

/// Two consecutive `LOAD` records with identical `(arg1, arg2)` collapse to
/// one.
fn eliminate_redundant_loads(ir: &mut Vec<IrInstruction>) -> bool {
    let mut changed = false;
    let mut i = 1;
    while i < ir.len() {
        if ir[i].op == IrOp::Load
            && ir[i - 1].op == IrOp::Load
            && ir[i].arg1 == ir[i - 1].arg1
            && ir[i].arg2 == ir[i - 1].arg2
        {
            ir.remove(i);
            changed = true;
        } else {
            i += 1;
        }
    }
    changed
}

/// `ADD x, 0` rewrites to `NOP` with the argument fields cleared.
fn remove_add_zero(ir: &mut [IrInstruction]) -> bool {
    let mut changed = false;
    for instr in ir.iter_mut() {
        if instr.op == IrOp::Add && instr.arg2.as_deref() == Some("0") {
            instr.clear_to_nop();
            changed = true;
        }
    }
    changed
}

/// `MOV x, x` rewrites to `NOP` with the argument fields cleared.
fn remove_self_moves(ir: &mut [IrInstruction]) -> bool {
    let mut changed = false;
    for instr in ir.iter_mut() {
        if instr.op == IrOp::Mov && instr.arg1.is_some() && instr.arg1 == instr.arg2 {
            instr.clear_to_nop();
            changed = true;
        }
    }
    changed
}

fn int_literal(arg: &Option<String>) -> Option<i64> {
    arg.as_deref().and_then(|a| a.parse::<i64>().ok())
}

/// `LOAD t1, c1 ; LOAD t2, c2 ; ADD t3, ?` with integer literals `c1`, `c2`
/// and `t3` not among `{t1, t2}` collapses to `LOAD t3, c1+c2`.
fn fold_constant_adds(ir: &mut Vec<IrInstruction>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i + 2 < ir.len() {
        let fold = ir[i].op == IrOp::Load
            && ir[i + 1].op == IrOp::Load
            && ir[i + 2].op == IrOp::Add
            && ir[i + 2].arg1.is_some()
            && ir[i].arg1 != ir[i + 2].arg1
            && ir[i + 1].arg1 != ir[i + 2].arg1;
        if fold
            && let (Some(c1), Some(c2)) = (int_literal(&ir[i].arg2), int_literal(&ir[i + 1].arg2))
        {
            let dest = ir[i + 2].arg1.clone();
            ir[i] = IrInstruction {
                op: IrOp::Load,
                arg1: dest,
                arg2: Some((c1 + c2).to_string()),
            };
            ir.drain(i + 1..i + 3);
            changed = true;
            // Re-examine from the rewritten record; an earlier LOAD may now
            // form a new window with it.
            i = i.saturating_sub(1);
        } else {
            i += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rexion_core::ir::parse_ir_text;

    fn run(text: &str) -> Vec<String> {
        optimize(parse_ir_text(text).expect("test IR should parse"))
            .iter()
            .map(|i| i.format_line())
            .collect()
    }

    #[test]
    fn test_redundant_load_elimination() {
        assert_eq!(
            run("LOAD R1 5\nLOAD R1 5\nPRINT result _\n"),
            vec!["LOAD R1 5", "PRINT result _"]
        );
    }

    #[test]
    fn test_redundant_load_requires_identical_args() {
        assert_eq!(
            run("LOAD R1 5\nLOAD R1 6\n"),
            vec!["LOAD R1 5", "LOAD R1 6"]
        );
        assert_eq!(
            run("LOAD R1 5\nLOAD R2 5\n"),
            vec!["LOAD R1 5", "LOAD R2 5"]
        );
    }

    #[test]
    fn test_add_zero_becomes_nop() {
        assert_eq!(run("ADD R1 0\n"), vec!["NOP _ _"]);
        assert_eq!(run("ADD R1 1\n"), vec!["ADD R1 1"]);
    }

    #[test]
    fn test_self_move_becomes_nop() {
        assert_eq!(run("MOV R1 R1\n"), vec!["NOP _ _"]);
        assert_eq!(run("MOV R1 R2\n"), vec!["MOV R1 R2"]);
    }

    #[test]
    fn test_constant_fold() {
        // The two source loads are removed; a single LOAD of the sum
        // targeting the ADD destination remains.
        assert_eq!(
            run("LOAD T1 2\nLOAD T2 3\nADD T3 ignored\n"),
            vec!["LOAD T3 5"]
        );
    }

    #[test]
    fn test_constant_fold_requires_distinct_destination() {
        // t3 overlapping a source register blocks the fold (the ADD reads
        // its own destination).
        assert_eq!(
            run("LOAD T1 2\nLOAD T2 3\nADD T1 T2\n"),
            vec!["LOAD T1 2", "LOAD T2 3", "ADD T1 T2"]
        );
    }

    #[test]
    fn test_constant_fold_requires_integer_literals() {
        assert_eq!(
            run("LOAD T1 x\nLOAD T2 3\nADD T3 _\n"),
            vec!["LOAD T1 x", "LOAD T2 3", "ADD T3 _"]
        );
    }

    #[test]
    fn test_fold_value_preserves_sum() {
        assert_eq!(run("LOAD A 40\nLOAD B 2\nADD C _\n"), vec!["LOAD C 42"]);
        assert_eq!(run("LOAD A -5\nLOAD B 3\nADD C _\n"), vec!["LOAD C -2"]);
    }

    #[test]
    fn test_passes_compose_to_fixpoint() {
        // The fold produces a LOAD identical to its left neighbor, which the
        // next sweep's redundant-load pass then removes.
        assert_eq!(
            run("LOAD T3 5\nLOAD T1 2\nLOAD T2 3\nADD T3 ignored\n"),
            vec!["LOAD T3 5"]
        );
    }

    #[test]
    fn test_optimizer_is_idempotent() {
        let input = "LOAD T1 2\nLOAD T2 3\nADD T3 ignored\nMOV R1 R1\nADD R2 0\nLOAD R4 7\nLOAD R4 7\n";
        let once = optimize(parse_ir_text(input).unwrap());
        let twice = optimize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_untouched_ops_pass_through() {
        let input = "CLASS Dog _\nMETHOD speak() _\nENDCLASS _ _\nHALT _ _\n";
        assert_eq!(
            run(input),
            vec!["CLASS Dog _", "METHOD speak() _", "ENDCLASS _ _", "HALT _ _"]
        );
    }
}
