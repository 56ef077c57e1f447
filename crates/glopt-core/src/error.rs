use crate::type_id::TypeId;
use thiserror::Error;

/// Everything that can go wrong between source text and a validated HIR.
///
/// Lexer/parser/lowering errors are produced by the front-end collaborator
/// (see [`crate::frontend`]); the core itself only ever raises
/// [`CompileError::IRMalformed`], [`CompileError::Unsupported`], and the
/// type-registry variants below.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("lex error at byte {offset}: {message}")]
    LexError { offset: usize, message: String },

    #[error("parse error at byte {offset}: {message}")]
    ParseError { offset: usize, message: String },

    #[error("lowering error: {message}")]
    LowerError { message: String },

    #[error("malformed IR at {path}: {message}")]
    IRMalformed { path: String, message: String },

    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("duplicate type name: {name}")]
    DuplicateTypeName { name: String },

    #[error("type not found: {id}")]
    TypeNotFound { id: TypeId },
}

pub type Result<T> = std::result::Result<T, CompileError>;
