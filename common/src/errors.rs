use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid byte vector length: expected {expected}, got {actual}")]
pub struct InvalidLengthError {
    expected: usize,
    actual: usize,
}

impl InvalidLengthError {
    pub fn new(expected: usize, actual: usize) -> Self {
        Self { expected, actual }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn actual(&self) -> usize {
        self.actual
    }
}
