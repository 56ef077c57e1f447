//! Consumed interfaces for the lexer/parser/lowering front end.
//!
//! Lexical analysis, grammar parsing, and AST-to-HIR lowering are out of
//! scope for this crate (see the top-level design notes); this module
//! only names the shape a real front end would plug in as, mirroring the
//! original's `_mesa_glsl_parse_state` / `_mesa_glsl_lexer_ctor` /
//! `_mesa_glsl_parse` / `_mesa_ast_to_hir` call sequence.
//!
//! [`DirectBuilder`] is the adapter this repository's own tests (and the
//! CLI's `--from-ir` debug path) use in place of a real front end: it
//! hands a closure direct access to the arena and expects back a
//! finished [`InstrList`], the same shapes `ast_to_hir` would have
//! produced.

use crate::arena::Arena;
use crate::list::InstrList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// State threaded through lexing, parsing, and lowering.
///
/// A real implementation additionally carries the lexer's buffer state
/// and the parsed AST; both are opaque to this crate, which only reads
/// `error` and `info_log` once parsing finishes.
pub trait ParseState {
    fn stage(&self) -> ShaderStage;
    fn error(&self) -> bool;
    fn info_log(&self) -> &str;
}

/// The lexer/parser/lowering pipeline this crate consumes but does not
/// implement.
pub trait FrontEnd {
    type State: ParseState;

    /// Allocates a fresh parse state bound to `stage`, with `error`
    /// false and an empty `info_log`.
    fn parse_state(&self, stage: ShaderStage) -> Self::State;

    /// Scoped lexer buffer acquisition/release around `parse`; callers
    /// must call `lexer_dtor` even when `parse` sets `error`.
    fn lexer_ctor(&self, state: &mut Self::State, source: &str);
    fn lexer_dtor(&self, state: &mut Self::State);

    /// Populates the state's internal AST and `error`/`info_log`.
    fn parse(&self, state: &mut Self::State);

    /// Lowers the parsed AST into `list`, allocating nodes in `arena`.
    /// Only called when `!state.error()`.
    fn ast_to_hir(&self, state: &Self::State, arena: &mut Arena, list: &mut InstrList);
}

/// A minimal [`ParseState`] with no lexer/AST machinery, used by
/// [`DirectBuilder`].
#[derive(Debug, Clone)]
pub struct BasicParseState {
    pub stage: ShaderStage,
    pub error: bool,
    pub info_log: String,
}

impl ParseState for BasicParseState {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn error(&self) -> bool {
        self.error
    }

    fn info_log(&self) -> &str {
        &self.info_log
    }
}

/// Builds HIR directly, bypassing the (absent) lexer/parser/lowering
/// pipeline. Used by this repository's own test suite and by the CLI's
/// `--from-ir` path, standing in for `ast_to_hir` acting on a real AST.
pub struct DirectBuilder;

impl DirectBuilder {
    pub fn build(
        stage: ShaderStage,
        arena: &mut Arena,
        build: impl FnOnce(&mut Arena) -> InstrList,
    ) -> (BasicParseState, InstrList) {
        let list = build(arena);
        (
            BasicParseState {
                stage,
                error: false,
                info_log: String::new(),
            },
            list,
        )
    }
}
