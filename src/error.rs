//! Error types and diagnostic reporting.
//!
//! Every failure kind is fatal at its first occurrence: the driver renders
//! one diagnostic and exits non-zero.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

use crate::front::token::Span;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("lex error: {message}")]
    Lex { message: String, span: Span },

    #[error("syntax error: {message}")]
    UnexpectedToken { message: String, span: Span },

    #[error("not supported: {message}")]
    Unimplemented { message: String, span: Span },

    #[error("redefinition of '{name}'")]
    Redefinition { name: String, span: Span },

    #[error("invalid type specifiers: {message}")]
    TypeSynthesis { message: String, span: Span },

    #[error("bad declarator: {message}")]
    BadDeclarator { message: String, span: Span },

    #[error("{message}")]
    Semantic { message: String, span: Span },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::Lex { message: message.into(), span }
    }

    pub fn unexpected(message: impl Into<String>, span: Span) -> Self {
        Self::UnexpectedToken { message: message.into(), span }
    }

    pub fn unimplemented(message: impl Into<String>, span: Span) -> Self {
        Self::Unimplemented { message: message.into(), span }
    }

    pub fn redefinition(name: impl Into<String>, span: Span) -> Self {
        Self::Redefinition { name: name.into(), span }
    }

    pub fn type_synthesis(message: impl Into<String>, span: Span) -> Self {
        Self::TypeSynthesis { message: message.into(), span }
    }

    pub fn bad_declarator(message: impl Into<String>, span: Span) -> Self {
        Self::BadDeclarator { message: message.into(), span }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::Semantic { message: message.into(), span }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lex { span, .. }
            | Self::UnexpectedToken { span, .. }
            | Self::Unimplemented { span, .. }
            | Self::Redefinition { span, .. }
            | Self::TypeSynthesis { span, .. }
            | Self::BadDeclarator { span, .. }
            | Self::Semantic { span, .. } => Some(*span),
            Self::Io(_) => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Renders the single fatal diagnostic with its source span.
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report(&self, file_id: usize, error: &CompileError) {
        let diagnostic = match error.span() {
            Some(span) => Diagnostic::error()
                .with_message(error.to_string())
                .with_labels(vec![Label::primary(file_id, span.lo as usize..span.hi as usize)]),
            None => Diagnostic::error().with_message(error.to_string()),
        };
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
