use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueErrorKind {
    /// Caller misuse: bad arguments, wrong runner state, blocked choice.
    Validation,
    /// Dialogue content points at something that does not exist.
    Structure,
    /// Raised by user-supplied handlers or listeners.
    Handler,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DialogueError {
    pub kind: DialogueErrorKind,
    pub code: String,
    pub message: String,
}

impl DialogueError {
    pub fn new(
        kind: DialogueErrorKind,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogueErrorKind::Validation, code, message)
    }

    pub fn structure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogueErrorKind::Structure, code, message)
    }

    pub fn handler(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogueErrorKind::Handler, code, message)
    }

    pub fn is_validation(&self) -> bool {
        self.kind == DialogueErrorKind::Validation
    }

    pub fn is_structure(&self) -> bool {
        self.kind == DialogueErrorKind::Structure
    }
}
