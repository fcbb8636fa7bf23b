//! Unified diagnostic type shared by every pipeline stage.

use std::fmt::Display;

/// Which stage of the pipeline raised an [`MplError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexer,
    Syntax,
    Semantic,
    Runtime,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Lexer => "LEXER",
            Stage::Syntax => "SYNTAX",
            Stage::Semantic => "SEMANTIC",
            Stage::Runtime => "RUNTIME",
        };
        f.write_str(s)
    }
}

/// A single fatal diagnostic, carrying the stage that raised it, a
/// human-readable message, and the source position when one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MplError {
    pub stage: Stage,
    pub message: String,
    pub position: Option<(usize, usize)>,
}

impl MplError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            position: None,
        }
    }

    pub fn at(stage: Stage, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            stage,
            message: message.into(),
            position: Some((line, column)),
        }
    }

    pub fn lexer(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::at(Stage::Lexer, message, line, column)
    }

    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::at(Stage::Syntax, message, line, column)
    }

    pub fn semantic(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::at(Stage::Semantic, message, line, column)
    }

    pub fn semantic_global(message: impl Into<String>) -> Self {
        Self::new(Stage::Semantic, message)
    }

    pub fn runtime(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::at(Stage::Runtime, message, line, column)
    }

    pub fn runtime_global(message: impl Into<String>) -> Self {
        Self::new(Stage::Runtime, message)
    }
}

impl Display for MplError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some((line, col)) => write!(f, "{} at {}:{}: {}", self.stage, line, col, self.message),
            None => write!(f, "{}: {}", self.stage, self.message),
        }
    }
}

impl std::error::Error for MplError {}

pub type MplResult<T> = Result<T, MplError>;
