//! Textual form of code blocks.
//!
//! Each instruction is one line: a four-digit index, the mnemonic, and an
//! optional operand. Header lines start with `;` and nested lambdas are
//! listed after their parent, indented. [`assemble`] reads back the
//! unindented instruction lines and ignores everything else, so
//! `assemble(disassemble(b))` reproduces `b.ops`.
//!
//! ```text
//! ; word inc params=1 locals=1
//! 0000 ldloc 0
//! 0001 int 1
//! 0002 add
//! 0003 end
//! ```

use std::fmt::Write as _;
use std::rc::Rc;

use crate::code_block::{CaptureSource, CatchKey, CodeBlock};
use crate::op::{BinOp, Op};
use crate::symbols::SymbolTable;

/// Malformed assembly text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AsmError {
    #[error("line {line}: unknown mnemonic `{text}`")]
    UnknownMnemonic { line: usize, text: String },
    #[error("line {line}: bad operand `{text}`")]
    BadOperand { line: usize, text: String },
    #[error("line {line}: expected instruction {expected}, found {found}")]
    OutOfSequence {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Disassemble `block` and its nested lambdas.
pub fn disassemble(block: &CodeBlock, symbols: &SymbolTable) -> String {
    disassemble_with(block, symbols, &|_| None)
}

/// Disassemble, appending `; note` to instructions `annotate` describes
/// (typically the names behind word and global indices).
pub fn disassemble_with(
    block: &CodeBlock,
    symbols: &SymbolTable,
    annotate: &dyn Fn(&Op) -> Option<String>,
) -> String {
    let mut out = String::new();
    write_block(&mut out, block, symbols, annotate, 0, None);
    out
}

fn write_block(
    out: &mut String,
    block: &CodeBlock,
    symbols: &SymbolTable,
    annotate: &dyn Fn(&Op) -> Option<String>,
    depth: usize,
    lambda_index: Option<usize>,
) {
    let indent = "  ".repeat(depth);
    let _ = match lambda_index {
        Some(i) => write!(out, "{indent}; lambda {i}"),
        None => write!(out, "{indent}; word {}", block.display_name()),
    };
    let _ = writeln!(
        out,
        " params={} locals={} source={}",
        block.params, block.locals, block.source
    );
    if block.closed_locals != 0 {
        let _ = writeln!(out, "{indent}; closed {:#b}", block.closed_locals);
    }
    if !block.captures.is_empty() {
        let captures: Vec<String> = block
            .captures
            .iter()
            .map(|c| match c {
                CaptureSource::Local(n) => format!("local {n}"),
                CaptureSource::Outer(n) => format!("outer {n}"),
            })
            .collect();
        let _ = writeln!(out, "{indent}; captures {}", captures.join(", "));
    }
    for (i, table) in block.catch_tables.iter().enumerate() {
        let entries: Vec<String> = table
            .entries
            .iter()
            .map(|(key, target)| match key {
                CatchKey::Symbol(s) => format!("`{}->{target}", symbols.name(*s)),
                CatchKey::All => format!("*->{target}"),
            })
            .collect();
        let _ = writeln!(out, "{indent}; catch {i} {}", entries.join(" "));
    }
    for (ip, op) in block.ops.iter().enumerate() {
        let _ = write!(out, "{indent}{ip:04} ");
        write_op(out, op, symbols);
        if let Some(note) = annotate(op) {
            let _ = write!(out, " ; {note}");
        }
        if let Some(pos) = block.pos_at(ip) {
            let _ = write!(out, " ; @{pos}");
        }
        out.push('\n');
    }
    for (i, lambda) in block.lambdas.iter().enumerate() {
        write_block(out, lambda, symbols, annotate, depth + 1, Some(i));
    }
}

fn write_op(out: &mut String, op: &Op, symbols: &SymbolTable) {
    let _ = match op {
        Op::Int(v) => write!(out, "int {v}"),
        Op::Long(v) => write!(out, "long {v}"),
        Op::Float(v) => write!(out, "float {v:?}"),
        Op::Double(v) => write!(out, "double {v:?}"),
        Op::Str(s) => write!(out, "str \"{}\"", escape(s)),
        Op::Symbol(s) => write!(out, "sym `{}", symbols.name(*s)),
        Op::None => write!(out, "none"),
        Op::Lambda(n) => write!(out, "lambda {n}"),
        Op::WordRef(n) => write!(out, "wordref {n}"),
        Op::NativeRef(n) => write!(out, "nativeref {n}"),
        Op::LoadLocal(n) => write!(out, "ldloc {n}"),
        Op::StoreLocal(n) => write!(out, "stloc {n}"),
        Op::LoadClosure(n) => write!(out, "ldclo {n}"),
        Op::StoreClosure(n) => write!(out, "stclo {n}"),
        Op::LoadGlobal(n) => write!(out, "ldglob {n}"),
        Op::StoreGlobal(n) => write!(out, "stglob {n}"),
        Op::LoadConst(n) => write!(out, "ldconst {n}"),
        Op::SetConst(n) => write!(out, "setconst {n}"),
        Op::GetProp(n) => write!(out, "getprop {n}"),
        Op::SetProp(n) => write!(out, "setprop {n}"),
        Op::CallWord(n) => write!(out, "callw {n}"),
        Op::CallNative(n) => write!(out, "calln {n}"),
        Op::Call => write!(out, "call"),
        Op::Recurse => write!(out, "recurse"),
        Op::Dup => write!(out, "dup"),
        Op::Drop => write!(out, "drop"),
        Op::Swap => write!(out, "swap"),
        Op::Over => write!(out, "over"),
        Op::Rot => write!(out, "rot"),
        Op::Binary(b) => write!(out, "{}", b.mnemonic()),
        Op::Not => write!(out, "not"),
        Op::Neg => write!(out, "neg"),
        Op::Jump(t) => write!(out, "jmp {t}"),
        Op::JumpIfFalse(t) => write!(out, "jf {t}"),
        Op::JumpIfTrue(t) => write!(out, "jt {t}"),
        Op::IterStart => write!(out, "iterstart"),
        Op::IterLeaveIfDone(t) => write!(out, "iterleave {t}"),
        Op::IterValue(d) => write!(out, "iterval {d}"),
        Op::IterEnd => write!(out, "iterend"),
        Op::NewList => write!(out, "newlist"),
        Op::ListAppend => write!(out, "listadd"),
        Op::NewHash => write!(out, "newhash"),
        Op::HashAdd => write!(out, "hashadd"),
        Op::Try(n) => write!(out, "try {n}"),
        Op::EndTry(t) => write!(out, "endtry {t}"),
        Op::Throw => write!(out, "throw"),
        Op::Print => write!(out, "print"),
        Op::End => write!(out, "end"),
    };
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

/// Parse a quoted, escaped string. Returns the contents and the rest of the
/// line after the closing quote.
fn unescape(text: &str) -> Option<(String, &str)> {
    let body = text.strip_prefix('"')?;
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => return Some((out, &body[i + 1..])),
            '\\' => match chars.next()?.1 {
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'u' => {
                    if chars.next()?.1 != '{' {
                        return None;
                    }
                    let mut hex = String::new();
                    loop {
                        match chars.next()?.1 {
                            '}' => break,
                            c => hex.push(c),
                        }
                    }
                    let code = u32::from_str_radix(&hex, 16).ok()?;
                    out.push(char::from_u32(code)?);
                }
                _ => return None,
            },
            c => out.push(c),
        }
    }
    None
}

/// Parse instruction lines back into ops.
pub fn assemble(text: &str, symbols: &SymbolTable) -> Result<Vec<Op>, AsmError> {
    let mut ops = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        let line_no = line_idx + 1;
        if !line.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let (index, rest) = line.split_once(' ').unwrap_or((line, ""));
        let bad = |text: &str| AsmError::BadOperand {
            line: line_no,
            text: text.to_owned(),
        };
        let found: usize = index.parse().map_err(|_| bad(index))?;
        if found != ops.len() {
            return Err(AsmError::OutOfSequence {
                line: line_no,
                expected: ops.len(),
                found,
            });
        }
        let (mnemonic, operand) = rest.split_once(' ').unwrap_or((rest, ""));
        let op = if mnemonic == "str" {
            let (s, _) = unescape(operand).ok_or_else(|| bad(operand))?;
            Op::Str(Rc::from(s))
        } else {
            let operand = operand.split(';').next().unwrap_or("").trim();
            parse_op(mnemonic, operand, symbols).ok_or_else(|| {
                if is_mnemonic(mnemonic) {
                    bad(operand)
                } else {
                    AsmError::UnknownMnemonic {
                        line: line_no,
                        text: mnemonic.to_owned(),
                    }
                }
            })?
        };
        ops.push(op);
    }
    Ok(ops)
}

const MNEMONICS: &[&str] = &[
    "int", "long", "float", "double", "str", "sym", "none", "lambda", "wordref",
    "nativeref", "ldloc", "stloc", "ldclo", "stclo", "ldglob", "stglob", "ldconst",
    "setconst", "getprop", "setprop", "callw", "calln", "call", "recurse", "dup",
    "drop", "swap", "over", "rot", "not", "neg", "jmp", "jf", "jt", "iterstart",
    "iterleave", "iterval", "iterend", "newlist", "listadd", "newhash", "hashadd",
    "try", "endtry", "throw", "print", "end",
];

fn is_mnemonic(text: &str) -> bool {
    MNEMONICS.contains(&text) || BinOp::from_mnemonic(text).is_some()
}

fn parse_op(mnemonic: &str, operand: &str, symbols: &SymbolTable) -> Option<Op> {
    let u32_arg = || operand.parse::<u32>().ok();
    let u16_arg = || operand.parse::<u16>().ok();
    let none = |op: Op| operand.is_empty().then_some(op);
    Some(match mnemonic {
        "int" => Op::Int(operand.parse().ok()?),
        "long" => Op::Long(operand.parse().ok()?),
        "float" => Op::Float(operand.parse().ok()?),
        "double" => Op::Double(operand.parse().ok()?),
        "sym" => Op::Symbol(symbols.intern(operand.strip_prefix('`')?)),
        "none" => none(Op::None)?,
        "lambda" => Op::Lambda(u32_arg()?),
        "wordref" => Op::WordRef(u32_arg()?),
        "nativeref" => Op::NativeRef(u32_arg()?),
        "ldloc" => Op::LoadLocal(u16_arg()?),
        "stloc" => Op::StoreLocal(u16_arg()?),
        "ldclo" => Op::LoadClosure(u16_arg()?),
        "stclo" => Op::StoreClosure(u16_arg()?),
        "ldglob" => Op::LoadGlobal(u32_arg()?),
        "stglob" => Op::StoreGlobal(u32_arg()?),
        "ldconst" => Op::LoadConst(u32_arg()?),
        "setconst" => Op::SetConst(u32_arg()?),
        "getprop" => Op::GetProp(u32_arg()?),
        "setprop" => Op::SetProp(u32_arg()?),
        "callw" => Op::CallWord(u32_arg()?),
        "calln" => Op::CallNative(u32_arg()?),
        "call" => none(Op::Call)?,
        "recurse" => none(Op::Recurse)?,
        "dup" => none(Op::Dup)?,
        "drop" => none(Op::Drop)?,
        "swap" => none(Op::Swap)?,
        "over" => none(Op::Over)?,
        "rot" => none(Op::Rot)?,
        "not" => none(Op::Not)?,
        "neg" => none(Op::Neg)?,
        "jmp" => Op::Jump(u32_arg()?),
        "jf" => Op::JumpIfFalse(u32_arg()?),
        "jt" => Op::JumpIfTrue(u32_arg()?),
        "iterstart" => none(Op::IterStart)?,
        "iterleave" => Op::IterLeaveIfDone(u32_arg()?),
        "iterval" => Op::IterValue(operand.parse().ok()?),
        "iterend" => none(Op::IterEnd)?,
        "newlist" => none(Op::NewList)?,
        "listadd" => none(Op::ListAppend)?,
        "newhash" => none(Op::NewHash)?,
        "hashadd" => none(Op::HashAdd)?,
        "try" => Op::Try(u32_arg()?),
        "endtry" => Op::EndTry(u32_arg()?),
        "throw" => none(Op::Throw)?,
        "print" => none(Op::Print)?,
        "end" => none(Op::End)?,
        other => none(Op::Binary(BinOp::from_mnemonic(other)?))?,
    })
}

#[cfg(test)]
mod tests;
