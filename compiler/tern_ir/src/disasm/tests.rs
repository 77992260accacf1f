use super::*;
use crate::code_block::CatchTable;
use crate::pos::SourcePos;
use pretty_assertions::assert_eq;

fn block(ops: Vec<Op>) -> CodeBlock {
    let mut block = CodeBlock::empty(Rc::from("test"));
    block.ops = ops.into_boxed_slice();
    block
}

fn every_op(symbols: &SymbolTable) -> Vec<Op> {
    let mut ops = vec![
        Op::Int(-42),
        Op::Long(1 << 40),
        Op::Float(1.5),
        Op::Double(-0.001),
        Op::Str(Rc::from("tab\there \"quoted\" back\\slash ; not a comment\n")),
        Op::Symbol(symbols.intern("divzero")),
        Op::None,
        Op::Lambda(0),
        Op::WordRef(3),
        Op::NativeRef(4),
        Op::LoadLocal(1),
        Op::StoreLocal(2),
        Op::LoadClosure(0),
        Op::StoreClosure(1),
        Op::LoadGlobal(7),
        Op::StoreGlobal(7),
        Op::LoadConst(2),
        Op::SetConst(2),
        Op::GetProp(0),
        Op::SetProp(0),
        Op::CallWord(9),
        Op::CallNative(1),
        Op::Call,
        Op::Recurse,
        Op::Dup,
        Op::Drop,
        Op::Swap,
        Op::Over,
        Op::Rot,
        Op::Not,
        Op::Neg,
        Op::Jump(0),
        Op::JumpIfFalse(5),
        Op::JumpIfTrue(6),
        Op::IterStart,
        Op::IterLeaveIfDone(40),
        Op::IterValue(2),
        Op::IterEnd,
        Op::NewList,
        Op::ListAppend,
        Op::NewHash,
        Op::HashAdd,
        Op::Try(0),
        Op::EndTry(12),
        Op::Throw,
        Op::Print,
    ];
    ops.extend(BinOp::ALL.into_iter().map(Op::Binary));
    ops.push(Op::End);
    ops
}

#[test]
fn round_trip_reproduces_every_instruction() {
    let symbols = SymbolTable::new();
    let ops = every_op(&symbols);
    let code = block(ops.clone());
    let text = disassemble(&code, &symbols);
    assert_eq!(assemble(&text, &symbols), Ok(ops));
}

#[test]
fn round_trip_ignores_headers_lambdas_and_notes() {
    let symbols = SymbolTable::new();
    let mut inner = block(vec![Op::LoadClosure(0), Op::Print, Op::End]);
    inner.captures = Box::new([CaptureSource::Local(0)]);
    let mut outer = block(vec![Op::Int(1), Op::StoreLocal(0), Op::Lambda(0), Op::End]);
    outer.name = Some(Rc::from("mk"));
    outer.locals = 1;
    outer.closed_locals = 1;
    outer.lambdas = Box::new([Rc::new(inner)]);
    outer.catch_tables = Box::new([CatchTable {
        entries: vec![(CatchKey::Symbol(symbols.intern("oops")), 3), (CatchKey::All, 3)],
    }]);
    outer.positions = vec![SourcePos::new(1, 1); 4].into_boxed_slice();

    let text = disassemble_with(&outer, &symbols, &|op| {
        matches!(op, Op::Lambda(_)).then(|| "closure".to_owned())
    });
    assert!(text.contains("; word mk"));
    assert!(text.contains("  ; lambda 0"));
    assert!(text.contains("; captures local 0"));
    assert!(text.contains("`oops->3 *->3"));
    assert!(text.contains("0002 lambda 0 ; closure ; @1:1"));
    assert_eq!(assemble(&text, &symbols), Ok(outer.ops.to_vec()));
}

#[test]
fn unknown_mnemonic_is_reported() {
    let symbols = SymbolTable::new();
    assert_eq!(
        assemble("0000 frobnicate", &symbols),
        Err(AsmError::UnknownMnemonic {
            line: 1,
            text: "frobnicate".to_owned()
        })
    );
}

#[test]
fn bad_operand_is_reported() {
    let symbols = SymbolTable::new();
    assert_eq!(
        assemble("0000 jmp x", &symbols),
        Err(AsmError::BadOperand {
            line: 1,
            text: "x".to_owned()
        })
    );
    assert!(matches!(
        assemble("0000 dup 3", &symbols),
        Err(AsmError::BadOperand { .. })
    ));
}

#[test]
fn instructions_must_be_in_sequence() {
    let symbols = SymbolTable::new();
    assert_eq!(
        assemble("0000 dup\n0002 drop", &symbols),
        Err(AsmError::OutOfSequence {
            line: 2,
            expected: 1,
            found: 2
        })
    );
}

#[test]
fn escape_handles_control_characters() {
    let text = escape("a\u{1b}b");
    assert_eq!(text, "a\\u{1b}b");
    assert_eq!(
        unescape(&format!("\"{text}\" rest")),
        Some(("a\u{1b}b".to_owned(), " rest"))
    );
}
