//! Single-pass bytecode compiler.
//!
//! Source is fed a line at a time. Tokens are compiled straight into the
//! innermost [`CompileContext`]; word definitions and lambda literals push
//! a new context and freeze it into a [`CodeBlock`] when they close.
//! Control structures leave forward jumps on the context's structure stack
//! and patch them when the closing token arrives.
//!
//! When a line ends with only the top-level context left and nothing open
//! in it, the accumulated top-level code is frozen and handed back to be
//! run.

mod context;
mod tokens;

use std::rc::Rc;

use tern_ir::{BinOp, CaptureSource, CatchKey, CatchTable, CodeBlock, Op, SourcePos, SymbolTable};
use tern_lexer::{TokenKind, Tokenizer};

use crate::errors::{CompileError, CompileErrorKind};
use crate::namespace::Namespace;
use crate::natives::NativeRegistry;
use crate::properties::PropertyRegistry;
use crate::value::Value;

use context::{CompileContext, ContextKind, Structure, VarRef};
use tokens::{token_table, Tok};

type CompileResult<T = ()> = Result<T, CompileErrorKind>;

/// Runtime tables the compiler resolves names against.
pub(crate) struct CompileEnv<'a> {
    pub symbols: &'a SymbolTable,
    pub words: &'a mut Namespace,
    pub globals: &'a mut Namespace,
    pub consts: &'a mut Namespace,
    pub natives: &'a NativeRegistry,
    pub properties: &'a PropertyRegistry,
}

pub(crate) struct Compiler {
    tokenizer: Tokenizer,
    /// `contexts[0]` is the top level.
    contexts: Vec<CompileContext>,
    source_name: Rc<str>,
    /// Line number given to the next fed line.
    line: u32,
    track_positions: bool,
    bare_words: bool,
}

impl Compiler {
    pub fn new(source_name: Rc<str>, track_positions: bool, bare_words: bool) -> Self {
        Compiler {
            tokenizer: Tokenizer::new(token_table()),
            contexts: vec![CompileContext::new(ContextKind::Root)],
            source_name,
            line: 1,
            track_positions,
            bare_words,
        }
    }

    pub fn source_name(&self) -> &Rc<str> {
        &self.source_name
    }

    /// Start numbering lines from 1 under a new source name.
    pub fn set_source(&mut self, name: Rc<str>) {
        self.source_name = name;
        self.line = 1;
    }

    /// True while a definition, lambda or structure is still open.
    pub fn is_open(&self) -> bool {
        self.contexts.len() > 1 || self.contexts.iter().any(CompileContext::is_open)
    }

    /// True when `text` stops inside a string literal that the next line
    /// continues.
    pub fn ends_in_open_string(&self, text: &str) -> bool {
        self.tokenizer.ends_in_open_string(text)
    }

    /// Compile one line. Returns top-level code that is ready to run.
    ///
    /// On error every open context is discarded, words being defined are
    /// left deferred, and the error is returned.
    #[tracing::instrument(level = "trace", skip_all, fields(line = self.line))]
    pub fn feed_line(
        &mut self,
        text: &str,
        env: &mut CompileEnv<'_>,
    ) -> Result<Option<Rc<CodeBlock>>, CompileError> {
        self.tokenizer.reset_at_line(text, self.line);
        let newlines = u32::try_from(text.matches('\n').count()).unwrap_or(0);
        self.line = self.line.saturating_add(1 + newlines);

        loop {
            let kind = self.tokenizer.next();
            if kind == TokenKind::Eof {
                break;
            }
            if let Err(err) = self.compile_token(kind, env) {
                return Err(self.fail(err, env));
            }
        }

        if self.is_open() || self.contexts[0].ops.is_empty() {
            return Ok(None);
        }
        let root = std::mem::replace(&mut self.contexts[0], CompileContext::new(ContextKind::Root));
        let end = self.end_pos();
        Ok(Some(Rc::new(root.freeze(Rc::clone(&self.source_name), end))))
    }

    /// Report a structure left open at the end of the input.
    pub fn finish(&mut self, env: &mut CompileEnv<'_>) -> Result<(), CompileError> {
        if self.is_open() {
            return Err(self.fail(CompileErrorKind::Unterminated, env));
        }
        Ok(())
    }

    /// Discard all open state, leaving words under definition deferred.
    pub fn reset(&mut self, env: &mut CompileEnv<'_>) {
        for ctx in self.contexts.drain(1..) {
            if let ContextKind::Word { index, .. } = ctx.kind {
                env.words.bind_word(index, Value::None);
            }
        }
        self.contexts[0] = CompileContext::new(ContextKind::Root);
        self.tokenizer.clear_error();
    }

    #[cold]
    fn fail(&mut self, kind: CompileErrorKind, env: &mut CompileEnv<'_>) -> CompileError {
        let token = self.tokenizer.text().to_string();
        let err = CompileError {
            kind,
            token,
            source_name: Rc::clone(&self.source_name),
            line: self.tokenizer.line(),
            column: self.tokenizer.column(),
        };
        tracing::debug!(error = %err, "compile error");
        self.reset(env);
        err
    }

    // Emission helpers

    fn ctx(&self) -> &CompileContext {
        let last = self.contexts.len() - 1;
        &self.contexts[last]
    }

    fn ctx_mut(&mut self) -> &mut CompileContext {
        let last = self.contexts.len() - 1;
        &mut self.contexts[last]
    }

    fn pos(&self) -> Option<SourcePos> {
        self.track_positions
            .then(|| SourcePos::new(self.tokenizer.line(), self.tokenizer.column()))
    }

    fn end_pos(&self) -> Option<SourcePos> {
        self.track_positions.then(|| {
            let tok = self.tokenizer.token();
            SourcePos::new(tok.line, tok.column)
        })
    }

    fn emit(&mut self, op: Op) -> CompileResult<usize> {
        let pos = self.pos();
        self.ctx_mut().emit(op, pos)
    }

    // Token reading

    fn lex_error(&self) -> CompileErrorKind {
        self.tokenizer
            .last_error()
            .cloned()
            .map_or(CompileErrorKind::Malformed("token"), CompileErrorKind::Lex)
    }

    /// Read the next token, which must be an identifier.
    fn expect_ident(&mut self, what: &'static str) -> CompileResult<String> {
        match self.tokenizer.next() {
            TokenKind::Ident => Ok(self.tokenizer.as_ident().to_string()),
            TokenKind::Keyword(_) => Err(CompileErrorKind::ReservedName),
            TokenKind::Error => Err(self.lex_error()),
            _ => Err(CompileErrorKind::Malformed(what)),
        }
    }

    fn compile_token(&mut self, kind: TokenKind, env: &mut CompileEnv<'_>) -> CompileResult {
        let tok = match kind {
            TokenKind::Keyword(id) | TokenKind::Special(id) => Tok::from_id(id),
            _ => None,
        };

        let ctx = self.ctx_mut();
        if ctx.pending_iter && tok != Some(Tok::LBrace) {
            return Err(CompileErrorKind::Malformed("loop"));
        }
        let at_start = std::mem::replace(&mut ctx.at_start, false);
        let in_block = !matches!(ctx.kind, ContextKind::Root);

        match kind {
            TokenKind::Eof => Ok(()),
            TokenKind::Error => Err(self.lex_error()),
            TokenKind::Int => self.emit(Op::Int(self.tokenizer.as_int())).map(drop),
            TokenKind::Long => self.emit(Op::Long(self.tokenizer.as_long())).map(drop),
            TokenKind::Float => self.emit(Op::Float(self.tokenizer.as_float())).map(drop),
            TokenKind::Double => self.emit(Op::Double(self.tokenizer.as_double())).map(drop),
            TokenKind::Str => {
                let text: Rc<str> = Rc::from(self.tokenizer.as_str());
                self.emit(Op::Str(text)).map(drop)
            }
            TokenKind::Ident => {
                let name = self.tokenizer.as_ident().to_string();
                self.compile_ident(&name, env)
            }
            TokenKind::Keyword(_) | TokenKind::Special(_) => match tok {
                Some(Tok::Bar) if at_start && in_block => self.compile_params(),
                Some(tok) => self.compile_tok(tok, env),
                None => Err(CompileErrorKind::Malformed("token")),
            },
        }
    }

    fn compile_tok(&mut self, tok: Tok, env: &mut CompileEnv<'_>) -> CompileResult {
        let op = match tok {
            Tok::Colon => return self.begin_word(env),
            Tok::Semi => return self.end_word(env),
            Tok::LParen => {
                self.contexts.push(CompileContext::new(ContextKind::Lambda));
                return Ok(());
            }
            Tok::RParen => return self.end_lambda(),
            Tok::Bar => return Err(CompileErrorKind::Malformed("parameter block")),
            Tok::Query | Tok::Bang => {
                let name = self.expect_ident("variable access")?;
                return self.compile_var(&name, tok == Tok::Bang, env);
            }
            Tok::Amp => {
                let name = self.expect_ident("reference")?;
                if let Some(id) = env.natives.lookup(&name) {
                    Op::NativeRef(id.0)
                } else if let Some(idx) = env.words.get(&name) {
                    Op::WordRef(idx)
                } else {
                    return Err(CompileErrorKind::NotFound);
                }
            }
            Tok::Backtick => {
                let name = match self.tokenizer.next() {
                    TokenKind::Ident | TokenKind::Keyword(_) => self.tokenizer.as_ident().to_string(),
                    TokenKind::Error => return Err(self.lex_error()),
                    _ => return Err(CompileErrorKind::Malformed("symbol")),
                };
                Op::Symbol(env.symbols.intern(&name))
            }
            Tok::At | Tok::Call => Op::Call,
            Tok::Dot => Op::Print,
            Tok::NoneLit => Op::None,
            Tok::Throw => Op::Throw,
            Tok::Recurse => Op::Recurse,
            Tok::Dup => Op::Dup,
            Tok::Drop => Op::Drop,
            Tok::Swap => Op::Swap,
            Tok::Over => Op::Over,
            Tok::Rot => Op::Rot,
            Tok::Not => Op::Not,
            Tok::Neg => Op::Neg,
            Tok::Plus => Op::Binary(BinOp::Add),
            Tok::Minus => Op::Binary(BinOp::Sub),
            Tok::Star => Op::Binary(BinOp::Mul),
            Tok::Slash => Op::Binary(BinOp::Div),
            Tok::Percent => Op::Binary(BinOp::Mod),
            Tok::Eq => Op::Binary(BinOp::Eq),
            Tok::Ne => Op::Binary(BinOp::Ne),
            Tok::Lt => Op::Binary(BinOp::Lt),
            Tok::Gt => Op::Binary(BinOp::Gt),
            Tok::Le => Op::Binary(BinOp::Le),
            Tok::Ge => Op::Binary(BinOp::Ge),
            Tok::And => Op::Binary(BinOp::And),
            Tok::Or => Op::Binary(BinOp::Or),
            Tok::I => Op::IterValue(0),
            Tok::J => Op::IterValue(1),
            Tok::K => Op::IterValue(2),
            Tok::If => {
                let jump = self.emit(Op::JumpIfFalse(0))?;
                self.ctx_mut().structures.push(Structure::If { jump });
                return Ok(());
            }
            Tok::Else => return self.compile_else(),
            Tok::Then => return self.compile_then(),
            Tok::Times | Tok::Each => {
                self.emit(Op::IterStart)?;
                self.ctx_mut().pending_iter = true;
                return Ok(());
            }
            Tok::LBrace => return self.begin_loop(),
            Tok::RBrace => return self.end_loop(),
            Tok::Leave | Tok::IfLeave => return self.compile_leave(tok == Tok::IfLeave),
            Tok::LBracket | Tok::HashOpen => {
                let is_hash = tok == Tok::HashOpen;
                self.emit(if is_hash { Op::NewHash } else { Op::NewList })?;
                let mark = self.ctx().here();
                self.ctx_mut().structures.push(if is_hash {
                    Structure::Hash { mark }
                } else {
                    Structure::List { mark }
                });
                return Ok(());
            }
            Tok::Comma => return self.flush_element(),
            Tok::RBracket => {
                self.flush_element()?;
                self.ctx_mut().structures.pop();
                return Ok(());
            }
            Tok::Try => {
                let table = self.ctx().catch_tables.len();
                let table_id =
                    u32::try_from(table).map_err(|_| CompileErrorKind::CodeTooLong)?;
                self.emit(Op::Try(table_id))?;
                let ctx = self.ctx_mut();
                ctx.catch_tables.push(CatchTable::default());
                ctx.structures.push(Structure::Try {
                    table,
                    exits: Vec::new(),
                    handlers: 0,
                });
                return Ok(());
            }
            Tok::Catch | Tok::CatchAll => return self.compile_catch(tok == Tok::CatchAll, env),
            Tok::EndTry => return self.compile_endtry(),
            Tok::Defer | Tok::Global => {
                if self.contexts.len() > 1 {
                    return Err(CompileErrorKind::NotAtTopLevel);
                }
                let name = self.expect_ident("declaration")?;
                if tok == Tok::Defer {
                    env.words.add(&name);
                } else {
                    env.globals.add(&name);
                }
                return Ok(());
            }
            Tok::Const => {
                let name = self.expect_ident("constant")?;
                Op::SetConst(env.consts.add(&name))
            }
        };
        self.emit(op).map(drop)
    }

    /// Bare identifier: variable, constant, native, word, or bare string.
    fn compile_ident(&mut self, name: &str, env: &mut CompileEnv<'_>) -> CompileResult {
        let level = self.contexts.len() - 1;
        let op = if let Some(var) = self.find_var(level, name)? {
            match var {
                VarRef::Local(n) => Op::LoadLocal(n),
                VarRef::Closure(n) => Op::LoadClosure(n),
            }
        } else if let Some(idx) = env.consts.get(name) {
            Op::LoadConst(idx)
        } else if let Some(id) = env.natives.lookup(name) {
            Op::CallNative(id.0)
        } else if let Some(idx) = env.words.get(name) {
            Op::CallWord(idx)
        } else if self.bare_words {
            Op::Str(Rc::from(name))
        } else {
            return Err(CompileErrorKind::NotFound);
        };
        self.emit(op).map(drop)
    }

    /// `?name` / `!name`: variable, property, then global.
    fn compile_var(&mut self, name: &str, store: bool, env: &mut CompileEnv<'_>) -> CompileResult {
        let level = self.contexts.len() - 1;
        let op = if let Some(var) = self.find_var(level, name)? {
            match (var, store) {
                (VarRef::Local(n), false) => Op::LoadLocal(n),
                (VarRef::Local(n), true) => Op::StoreLocal(n),
                (VarRef::Closure(n), false) => Op::LoadClosure(n),
                (VarRef::Closure(n), true) => Op::StoreClosure(n),
            }
        } else if let Some(idx) = env.properties.lookup(name) {
            if store {
                Op::SetProp(idx)
            } else {
                Op::GetProp(idx)
            }
        } else {
            let idx = match env.globals.get(name) {
                Some(idx) => idx,
                None if name.starts_with(|c: char| c.is_ascii_uppercase()) => env.globals.add(name),
                None => return Err(CompileErrorKind::NotFound),
            };
            if store {
                Op::StoreGlobal(idx)
            } else {
                Op::LoadGlobal(idx)
            }
        };
        self.emit(op).map(drop)
    }

    /// Resolve `name` as seen from context `level`, promoting an enclosing
    /// context's local into a closure slot of every context in between.
    fn find_var(&mut self, level: usize, name: &str) -> CompileResult<Option<VarRef>> {
        let ctx = &self.contexts[level];
        if let Some(n) = ctx.find_local(name) {
            return Ok(Some(VarRef::Local(n)));
        }
        if let Some(n) = ctx.find_capture(name) {
            return Ok(Some(VarRef::Closure(n)));
        }
        if level == 0 || !matches!(ctx.kind, ContextKind::Lambda) {
            return Ok(None);
        }
        let source = match self.find_var(level - 1, name)? {
            None => return Ok(None),
            Some(VarRef::Local(n)) => {
                self.contexts[level - 1].mark_closed(n);
                CaptureSource::Local(n)
            }
            Some(VarRef::Closure(n)) => CaptureSource::Outer(n),
        };
        let slot = self.contexts[level].add_capture(name, source)?;
        Ok(Some(VarRef::Closure(slot)))
    }

    /// `|a, b : c|` at the start of a word or lambda.
    fn compile_params(&mut self) -> CompileResult {
        let mut in_params = true;
        loop {
            let kind = self.tokenizer.next();
            let tok = match kind {
                TokenKind::Special(id) => Tok::from_id(id),
                _ => None,
            };
            match (kind, tok) {
                (TokenKind::Ident, _) => {
                    let name = self.tokenizer.as_ident().to_string();
                    let ctx = self.ctx_mut();
                    if ctx.find_local(&name).is_some() {
                        return Err(CompileErrorKind::Malformed("parameter block"));
                    }
                    ctx.add_local(&name)?;
                    if in_params {
                        ctx.params += 1;
                    }
                }
                (_, Some(Tok::Comma)) => {}
                (_, Some(Tok::Colon)) if in_params => in_params = false,
                (_, Some(Tok::Bar)) => return Ok(()),
                (TokenKind::Keyword(_), _) => return Err(CompileErrorKind::ReservedName),
                (TokenKind::Error, _) => return Err(self.lex_error()),
                _ => return Err(CompileErrorKind::Malformed("parameter block")),
            }
        }
    }

    fn begin_word(&mut self, env: &mut CompileEnv<'_>) -> CompileResult {
        if self.is_open() {
            return Err(CompileErrorKind::NotAtTopLevel);
        }
        let name = self.expect_ident("definition")?;
        let index = env.words.add(&name);
        self.contexts.push(CompileContext::new(ContextKind::Word {
            index,
            name: Rc::from(name.as_str()),
        }));
        Ok(())
    }

    fn end_word(&mut self, env: &mut CompileEnv<'_>) -> CompileResult {
        if self.contexts.len() != 2
            || self.ctx().is_open()
            || !matches!(self.ctx().kind, ContextKind::Word { .. })
        {
            return Err(CompileErrorKind::Malformed("definition"));
        }
        let end = self.pos();
        let Some(ctx) = self.contexts.pop() else {
            return Err(CompileErrorKind::Malformed("definition"));
        };
        let ContextKind::Word { index, .. } = ctx.kind else {
            return Err(CompileErrorKind::Malformed("definition"));
        };
        let block = Rc::new(ctx.freeze(Rc::clone(&self.source_name), end));
        tracing::debug!(
            word = block.display_name(),
            ops = block.ops.len(),
            "defined word"
        );
        env.words.bind_word(index, Value::Code(block));
        Ok(())
    }

    fn end_lambda(&mut self) -> CompileResult {
        if self.contexts.len() < 2
            || self.ctx().is_open()
            || !matches!(self.ctx().kind, ContextKind::Lambda)
        {
            return Err(CompileErrorKind::Malformed("lambda"));
        }
        let end = self.pos();
        let Some(ctx) = self.contexts.pop() else {
            return Err(CompileErrorKind::Malformed("lambda"));
        };
        let block = Rc::new(ctx.freeze(Rc::clone(&self.source_name), end));
        let parent = self.ctx_mut();
        let idx = u32::try_from(parent.lambdas.len()).map_err(|_| CompileErrorKind::CodeTooLong)?;
        parent.lambdas.push(block);
        self.emit(Op::Lambda(idx)).map(drop)
    }

    fn compile_else(&mut self) -> CompileResult {
        let Some(Structure::If { jump: if_jump }) = self.ctx_mut().structures.pop() else {
            return Err(CompileErrorKind::Malformed("if/else/then"));
        };
        let jump = self.emit(Op::Jump(0))?;
        let ctx = self.ctx_mut();
        let here = ctx.here();
        ctx.patch(if_jump, here);
        ctx.structures.push(Structure::Else { jump });
        Ok(())
    }

    fn compile_then(&mut self) -> CompileResult {
        let ctx = self.ctx_mut();
        match ctx.structures.pop() {
            Some(Structure::If { jump } | Structure::Else { jump }) => {
                let here = ctx.here();
                ctx.patch(jump, here);
                Ok(())
            }
            _ => Err(CompileErrorKind::Malformed("if/else/then")),
        }
    }

    fn begin_loop(&mut self) -> CompileResult {
        let iter = std::mem::replace(&mut self.ctx_mut().pending_iter, false);
        let start = self.ctx().here();
        let mut leaves = Vec::new();
        if iter {
            leaves.push(self.emit(Op::IterLeaveIfDone(0))?);
        }
        self.ctx_mut()
            .structures
            .push(Structure::Loop { start, leaves, iter });
        Ok(())
    }

    fn end_loop(&mut self) -> CompileResult {
        let Some(Structure::Loop {
            start,
            leaves,
            iter,
        }) = self.ctx_mut().structures.pop()
        else {
            return Err(CompileErrorKind::Malformed("loop"));
        };
        let start = u32::try_from(start).map_err(|_| CompileErrorKind::CodeTooLong)?;
        self.emit(Op::Jump(start))?;
        let ctx = self.ctx_mut();
        let end = ctx.here();
        for at in leaves {
            ctx.patch(at, end);
        }
        if iter {
            self.emit(Op::IterEnd)?;
        }
        Ok(())
    }

    /// `leave` / `ifleave`: only `if`/`else` may sit between it and the loop.
    fn compile_leave(&mut self, conditional: bool) -> CompileResult {
        let loop_at = self
            .ctx()
            .structures
            .iter()
            .rposition(|s| !matches!(s, Structure::If { .. } | Structure::Else { .. }));
        let Some(loop_at) = loop_at else {
            return Err(CompileErrorKind::Malformed("leave"));
        };
        if !matches!(self.ctx().structures[loop_at], Structure::Loop { .. }) {
            return Err(CompileErrorKind::Malformed("leave"));
        }
        let jump = self.emit(if conditional {
            Op::JumpIfTrue(0)
        } else {
            Op::Jump(0)
        })?;
        if let Structure::Loop { leaves, .. } = &mut self.ctx_mut().structures[loop_at] {
            leaves.push(jump);
        }
        Ok(())
    }

    /// `,` or `]`: append the element compiled since the last mark.
    fn flush_element(&mut self) -> CompileResult {
        let (mark, is_hash) = match self.ctx().structures.last() {
            Some(Structure::List { mark }) => (*mark, false),
            Some(Structure::Hash { mark }) => (*mark, true),
            _ => return Err(CompileErrorKind::Malformed("list")),
        };
        if self.ctx().here() > mark {
            self.emit(if is_hash { Op::HashAdd } else { Op::ListAppend })?;
        }
        let ctx = self.ctx_mut();
        let here = ctx.here();
        if let Some(Structure::List { mark } | Structure::Hash { mark }) = ctx.structures.last_mut() {
            *mark = here;
        }
        Ok(())
    }

    /// `catch:a,b` or `catchall`. The first handler is reached by `EndTry`
    /// falling out of the protected code; later ones by a jump closing the
    /// previous handler.
    fn compile_catch(&mut self, all: bool, env: &mut CompileEnv<'_>) -> CompileResult {
        let (table, handlers) = match self.ctx().structures.last() {
            Some(Structure::Try {
                table, handlers, ..
            }) => (*table, *handlers),
            _ => return Err(CompileErrorKind::Malformed("try/catch")),
        };
        let exit = self.emit(if handlers == 0 {
            Op::EndTry(0)
        } else {
            Op::Jump(0)
        })?;
        let handler = u32::try_from(self.ctx().here()).map_err(|_| CompileErrorKind::CodeTooLong)?;

        let mut keys = Vec::new();
        if all {
            keys.push(CatchKey::All);
        } else {
            match self.tokenizer.next() {
                TokenKind::Special(id) if Tok::from_id(id) == Some(Tok::Colon) => {}
                TokenKind::Error => return Err(self.lex_error()),
                _ => return Err(CompileErrorKind::Malformed("catch")),
            }
            loop {
                let name = self.expect_ident("catch")?;
                keys.push(CatchKey::Symbol(env.symbols.intern(&name)));
                match self.tokenizer.next() {
                    TokenKind::Special(id) if Tok::from_id(id) == Some(Tok::Comma) => {}
                    _ => {
                        self.tokenizer.rewind();
                        break;
                    }
                }
            }
        }

        let ctx = self.ctx_mut();
        if let Some(entries) = ctx.catch_tables.get_mut(table) {
            entries.entries.extend(keys.into_iter().map(|k| (k, handler)));
        }
        if let Some(Structure::Try {
            exits, handlers, ..
        }) = ctx.structures.last_mut()
        {
            exits.push(exit);
            *handlers += 1;
        }
        Ok(())
    }

    fn compile_endtry(&mut self) -> CompileResult {
        let Some(Structure::Try {
            exits, handlers, ..
        }) = self.ctx_mut().structures.pop()
        else {
            return Err(CompileErrorKind::Malformed("try/catch"));
        };
        if handlers == 0 {
            let next = u32::try_from(self.ctx().here() + 1)
                .map_err(|_| CompileErrorKind::CodeTooLong)?;
            self.emit(Op::EndTry(next))?;
            return Ok(());
        }
        let ctx = self.ctx_mut();
        let end = ctx.here();
        for at in exits {
            ctx.patch(at, end);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
