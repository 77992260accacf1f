#![allow(clippy::unwrap_used, reason = "tests unwrap known-good values")]

use super::context::{MAX_LOCALS, MAX_OPS};
use super::*;
use crate::errors::RuntimeResult;
use crate::interpreter::Runtime;
use pretty_assertions::assert_eq;

/// Compiler plus the tables it resolves against.
struct Harness {
    compiler: Compiler,
    symbols: SymbolTable,
    words: Namespace,
    globals: Namespace,
    consts: Namespace,
    natives: NativeRegistry,
    properties: PropertyRegistry,
}

fn noop(_: &mut Runtime, _: &[Value]) -> RuntimeResult<()> {
    Ok(())
}

impl Harness {
    fn new() -> Self {
        Self::with_bare_words(false)
    }

    fn with_bare_words(bare_words: bool) -> Self {
        let mut natives = NativeRegistry::new();
        natives.register("len", None, Rc::new(noop));
        Harness {
            compiler: Compiler::new(Rc::from("test"), true, bare_words),
            symbols: SymbolTable::new(),
            words: Namespace::new(),
            globals: Namespace::new(),
            consts: Namespace::new(),
            natives,
            properties: PropertyRegistry::new(),
        }
    }

    fn feed(&mut self, line: &str) -> Result<Option<Rc<CodeBlock>>, CompileError> {
        let mut env = CompileEnv {
            symbols: &self.symbols,
            words: &mut self.words,
            globals: &mut self.globals,
            consts: &mut self.consts,
            natives: &self.natives,
            properties: &self.properties,
        };
        self.compiler.feed_line(line, &mut env)
    }

    fn finish(&mut self) -> Result<(), CompileError> {
        let mut env = CompileEnv {
            symbols: &self.symbols,
            words: &mut self.words,
            globals: &mut self.globals,
            consts: &mut self.consts,
            natives: &self.natives,
            properties: &self.properties,
        };
        self.compiler.finish(&mut env)
    }

    /// Ops of the top-level block `line` completes.
    fn ops(&mut self, line: &str) -> Vec<Op> {
        self.feed(line).unwrap().unwrap().ops.to_vec()
    }

    fn error(&mut self, line: &str) -> CompileErrorKind {
        self.feed(line).unwrap_err().kind
    }

    fn word(&self, name: &str) -> Rc<CodeBlock> {
        let idx = self.words.get(name).unwrap();
        match self.words.value(idx) {
            Value::Code(code) => code,
            other => panic!("`{name}` is not code: {other:?}"),
        }
    }
}

#[test]
fn arithmetic_is_postfix() {
    let mut h = Harness::new();
    assert_eq!(
        h.ops("2 3 +"),
        vec![Op::Int(2), Op::Int(3), Op::Binary(BinOp::Add), Op::End]
    );
    assert_eq!(
        h.ops("1 2 <= not"),
        vec![Op::Int(1), Op::Int(2), Op::Binary(BinOp::Le), Op::Not, Op::End]
    );
}

#[test]
fn if_else_then_backpatches() {
    let mut h = Harness::new();
    assert_eq!(
        h.ops("1 if 2 else 3 then"),
        vec![
            Op::Int(1),
            Op::JumpIfFalse(4),
            Op::Int(2),
            Op::Jump(5),
            Op::Int(3),
            Op::End,
        ]
    );
    assert_eq!(
        h.ops("0 if 7 then"),
        vec![Op::Int(0), Op::JumpIfFalse(3), Op::Int(7), Op::End]
    );
}

#[test]
fn iterator_loop_layout() {
    let mut h = Harness::new();
    assert_eq!(
        h.ops("3 times { i . }"),
        vec![
            Op::Int(3),
            Op::IterStart,
            Op::IterLeaveIfDone(6),
            Op::IterValue(0),
            Op::Print,
            Op::Jump(2),
            Op::IterEnd,
            Op::End,
        ]
    );
}

#[test]
fn leave_targets_instruction_after_backward_jump() {
    let mut h = Harness::new();
    assert_eq!(
        h.ops("{ 1 if leave then }"),
        vec![
            Op::Int(1),
            Op::JumpIfFalse(3),
            Op::Jump(4),
            Op::Jump(0),
            Op::End,
        ]
    );
    assert_eq!(
        h.ops("{ 0 ifleave }"),
        vec![Op::Int(0), Op::JumpIfTrue(3), Op::Jump(0), Op::End]
    );
}

#[test]
fn leave_outside_a_loop_is_malformed() {
    let mut h = Harness::new();
    assert_eq!(h.error("leave"), CompileErrorKind::Malformed("leave"));
    assert_eq!(h.error("{ [ leave ] }"), CompileErrorKind::Malformed("leave"));
}

#[test]
fn times_requires_a_block() {
    let mut h = Harness::new();
    assert_eq!(h.error("3 times 4"), CompileErrorKind::Malformed("loop"));
}

#[test]
fn word_with_parameters() {
    let mut h = Harness::new();
    assert!(h.feed(":inc |x:| ?x 1 + ;").unwrap().is_none());
    let inc = h.word("inc");
    assert_eq!(inc.params, 1);
    assert_eq!(inc.locals, 1);
    assert_eq!(inc.name.as_deref(), Some("inc"));
    assert_eq!(
        inc.ops.to_vec(),
        vec![
            Op::LoadLocal(0),
            Op::Int(1),
            Op::Binary(BinOp::Add),
            Op::End
        ]
    );
    assert_eq!(h.ops("5 inc"), vec![Op::Int(5), Op::CallWord(0), Op::End]);
}

#[test]
fn locals_after_colon_are_not_parameters() {
    let mut h = Harness::new();
    h.feed(":f |a, b : t| ?a ?b + !t ?t ;").unwrap();
    let f = h.word("f");
    assert_eq!((f.params, f.locals), (2, 3));
    assert_eq!(f.ops[3], Op::StoreLocal(2));
}

#[test]
fn locals_are_not_visible_outside_their_word() {
    let mut h = Harness::new();
    h.feed(":inc |x:| ?x 1 + ;").unwrap();
    assert_eq!(h.error("?x"), CompileErrorKind::NotFound);
}

#[test]
fn definition_spans_lines() {
    let mut h = Harness::new();
    assert!(h.feed(":sq |x:|").unwrap().is_none());
    assert!(h.compiler.is_open());
    assert!(h.feed("?x ?x * ;").unwrap().is_none());
    assert!(!h.compiler.is_open());
    let sq = h.word("sq");
    assert_eq!(sq.ops.len(), 4);
    assert_eq!(sq.pos_at(0).map(|p| p.line), Some(2));
}

#[test]
fn lambda_captures_enclosing_local() {
    let mut h = Harness::new();
    h.feed(":mk |x:| (?x) ;").unwrap();
    let mk = h.word("mk");
    assert_eq!(mk.ops.to_vec(), vec![Op::Lambda(0), Op::End]);
    assert!(mk.is_local_closed(0));
    let lambda = &mk.lambdas[0];
    assert_eq!(&*lambda.captures, &[CaptureSource::Local(0)]);
    assert_eq!(lambda.ops.to_vec(), vec![Op::LoadClosure(0), Op::End]);
    assert!(lambda.needs_closure());
}

#[test]
fn nested_lambda_promotes_through_every_level() {
    let mut h = Harness::new();
    h.feed(":mk |x:| ((?x 1 + !x)) ;").unwrap();
    let mk = h.word("mk");
    let outer = &mk.lambdas[0];
    assert_eq!(&*outer.captures, &[CaptureSource::Local(0)]);
    let inner = &outer.lambdas[0];
    assert_eq!(&*inner.captures, &[CaptureSource::Outer(0)]);
    assert_eq!(inner.ops[3], Op::StoreClosure(0));
}

#[test]
fn capture_is_cached_by_name() {
    let mut h = Harness::new();
    h.feed(":mk |x, y:| (?x ?y ?x) ;").unwrap();
    let mk = h.word("mk");
    let lambda = &mk.lambdas[0];
    assert_eq!(
        &*lambda.captures,
        &[CaptureSource::Local(0), CaptureSource::Local(1)]
    );
    assert_eq!(lambda.ops[2], Op::LoadClosure(0));
}

#[test]
fn lambda_without_captures_is_plain_code() {
    let mut h = Harness::new();
    let ops = h.ops("(|a:| ?a 2 *)");
    assert_eq!(ops, vec![Op::Lambda(0), Op::End]);
    let block = h.feed("(1)").unwrap().unwrap();
    assert!(!block.lambdas[0].needs_closure());
}

#[test]
fn list_and_hash_literals() {
    let mut h = Harness::new();
    assert_eq!(
        h.ops("[1,2]"),
        vec![
            Op::NewList,
            Op::Int(1),
            Op::ListAppend,
            Op::Int(2),
            Op::ListAppend,
            Op::End
        ]
    );
    assert_eq!(h.ops("[]"), vec![Op::NewList, Op::End]);

    let ops = h.ops("[% `a 1]");
    let a = h.symbols.get("a").unwrap();
    assert_eq!(
        ops,
        vec![
            Op::NewHash,
            Op::Symbol(a),
            Op::Int(1),
            Op::HashAdd,
            Op::End
        ]
    );
}

#[test]
fn try_catch_layout() {
    let mut h = Harness::new();
    let block = h
        .feed("try 1 catch:foo,bar 2 catchall 3 endtry")
        .unwrap()
        .unwrap();
    assert_eq!(
        block.ops.to_vec(),
        vec![
            Op::Try(0),
            Op::Int(1),
            Op::EndTry(6),
            Op::Int(2),
            Op::Jump(6),
            Op::Int(3),
            Op::End,
        ]
    );
    let foo = h.symbols.get("foo").unwrap();
    let bar = h.symbols.get("bar").unwrap();
    assert_eq!(
        block.catch_tables[0].entries,
        vec![
            (CatchKey::Symbol(foo), 3),
            (CatchKey::Symbol(bar), 3),
            (CatchKey::All, 5),
        ]
    );
}

#[test]
fn try_without_handlers() {
    let mut h = Harness::new();
    assert_eq!(
        h.ops("try 1 endtry"),
        vec![Op::Try(0), Op::Int(1), Op::EndTry(3), Op::End]
    );
}

#[test]
fn identifier_resolution_order() {
    let mut h = Harness::new();
    h.feed(":len 1 ;").unwrap();
    // Natives shadow words of the same name.
    assert_eq!(h.ops("len"), vec![Op::CallNative(0), Op::End]);
    h.feed("2 const len").unwrap();
    assert_eq!(h.ops("len"), vec![Op::LoadConst(0), Op::End]);
}

#[test]
fn references_and_symbols() {
    let mut h = Harness::new();
    h.feed(":w 1 ;").unwrap();
    assert_eq!(h.ops("&w &len"), vec![Op::WordRef(0), Op::NativeRef(0), Op::End]);
    let ops = h.ops("`foo");
    assert_eq!(ops, vec![Op::Symbol(h.symbols.get("foo").unwrap()), Op::End]);
    assert_eq!(h.error("&nosuch"), CompileErrorKind::NotFound);
}

#[test]
fn uppercase_globals_are_created_on_demand() {
    let mut h = Harness::new();
    assert_eq!(
        h.ops("5 !Count ?Count"),
        vec![Op::Int(5), Op::StoreGlobal(0), Op::LoadGlobal(0), Op::End]
    );
    assert_eq!(h.error("1 !count"), CompileErrorKind::NotFound);
    h.feed("global count").unwrap();
    assert_eq!(h.ops("?count"), vec![Op::LoadGlobal(1), Op::End]);
}

#[test]
fn bare_words_compile_as_strings() {
    let mut h = Harness::with_bare_words(true);
    assert_eq!(h.ops("hello"), vec![Op::Str(Rc::from("hello")), Op::End]);
    let mut h = Harness::new();
    assert_eq!(h.error("hello"), CompileErrorKind::NotFound);
}

#[test]
fn failed_definition_leaves_word_deferred() {
    let mut h = Harness::new();
    assert_eq!(h.error(":bad nosuch ;"), CompileErrorKind::NotFound);
    let idx = h.words.get("bad").unwrap();
    assert!(h.words.value(idx).is_none());
    assert!(!h.compiler.is_open());
    // The compiler is usable again.
    assert_eq!(h.ops("1"), vec![Op::Int(1), Op::End]);
}

#[test]
fn deferred_word_can_be_called_before_definition() {
    let mut h = Harness::new();
    h.feed("defer later").unwrap();
    h.feed(":now later ;").unwrap();
    assert_eq!(h.word("now").ops[0], Op::CallWord(0));
}

#[test]
fn structure_errors() {
    let mut h = Harness::new();
    assert_eq!(h.error("then"), CompileErrorKind::Malformed("if/else/then"));
    assert_eq!(h.error("}"), CompileErrorKind::Malformed("loop"));
    assert_eq!(h.error(")"), CompileErrorKind::Malformed("lambda"));
    assert_eq!(h.error(";"), CompileErrorKind::Malformed("definition"));
    assert_eq!(h.error(":a :b ;"), CompileErrorKind::NotAtTopLevel);
    assert_eq!(h.error("(global g)"), CompileErrorKind::NotAtTopLevel);
    assert_eq!(h.error("1 |x|"), CompileErrorKind::Malformed("parameter block"));
    assert_eq!(h.error("endtry"), CompileErrorKind::Malformed("try/catch"));
}

#[test]
fn keywords_cannot_name_parameters_or_words() {
    let mut h = Harness::new();
    let err = h.feed(":f |i:| ?i ;").unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::ReservedName);
    assert_eq!(err.token, "i");
    assert!(err.to_string().contains("reserved word"));
    assert_eq!(h.error("(|a, k:| ?a)"), CompileErrorKind::ReservedName);
    assert_eq!(h.error(":if ;"), CompileErrorKind::ReservedName);
    assert_eq!(h.error("&then"), CompileErrorKind::ReservedName);
}

#[test]
fn unterminated_input_is_reported_at_finish() {
    let mut h = Harness::new();
    assert!(h.feed(":foo 1").unwrap().is_none());
    let err = h.finish().unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::Unterminated);
    assert!(!h.compiler.is_open());
    let idx = h.words.get("foo").unwrap();
    assert!(h.words.value(idx).is_none());
}

#[test]
fn too_many_locals() {
    let mut h = Harness::new();
    let params: Vec<String> = (0..=MAX_LOCALS).map(|i| format!("p{i}")).collect();
    let line = format!(":f |{}:| ;", params.join(","));
    assert_eq!(h.error(&line), CompileErrorKind::TooManyLocals);
}

#[test]
fn code_too_long() {
    let mut h = Harness::new();
    let line = "1 ".repeat(MAX_OPS + 1);
    assert_eq!(h.error(&format!(":f {line};")), CompileErrorKind::CodeTooLong);
}

#[test]
fn lexical_errors_carry_position() {
    let mut h = Harness::new();
    let err = h.feed("1 \"open").unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::Lex(_)));
    assert_eq!(err.line, 1);
    assert_eq!(&*err.source_name, "test");
}

#[test]
fn positions_track_lines() {
    let mut h = Harness::new();
    h.feed("1").unwrap();
    let block = h.feed("2 3").unwrap().unwrap();
    assert_eq!(block.positions.len(), block.ops.len());
    assert_eq!(block.pos_at(1).map(|p| p.line), Some(2));
}

#[test]
fn untracked_positions_are_empty() {
    let mut h = Harness::new();
    h.compiler = Compiler::new(Rc::from("test"), false, false);
    let block = h.feed("1 2 +").unwrap().unwrap();
    assert!(block.positions.is_empty());
    assert_eq!(block.pos_at(0), None);
}

#[test]
fn token_ids_match_discriminants() {
    for id in 0..58u16 {
        let tok = Tok::from_id(tern_lexer::TokenId(id)).unwrap();
        assert_eq!(tok.id().0, id);
    }
    assert_eq!(Tok::from_id(tern_lexer::TokenId(58)), None);
}

#[test]
fn none_literal() {
    let mut h = Harness::new();
    assert_eq!(h.ops("none"), vec![Op::None, Op::End]);
}
