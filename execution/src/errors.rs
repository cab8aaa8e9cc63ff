use thiserror::Error;

/// Structural failures while decoding an EOF container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EofDecodeError {
    #[error("short input while processing EOF")]
    MissingInput,
    #[error("short body while processing EOF")]
    MissingBodyWithoutData,
    #[error("body size is more than specified in the header")]
    DanglingData,
    #[error("invalid types section data")]
    InvalidTypesSection,
    #[error("invalid types section size")]
    InvalidTypesSectionSize,
    #[error("invalid EOF magic number")]
    InvalidEofMagic,
    #[error("invalid EOF version")]
    InvalidEofVersion,
    #[error("invalid number for types kind")]
    InvalidTypesKind,
    #[error("invalid number for code kind")]
    InvalidCodeKind,
    #[error("invalid terminal code")]
    InvalidTerminalByte,
    #[error("invalid data kind")]
    InvalidDataKind,
    #[error("zero code sections")]
    ZeroCodeSections,
    #[error("too many code sections")]
    TooManyCodeSections,
    #[error("zero container sections")]
    ZeroContainerSections,
    #[error("too many container sections")]
    TooManyContainerSections,
    #[error("zero size section")]
    ZeroSize,
    #[error("mismatch of code and types sizes")]
    MismatchCodeAndTypesSize,
}

/// Failures while assembling an EOF container from its sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EofEncodeError {
    #[error("section of {0} bytes does not fit a 16 bit size")]
    SectionTooLarge(usize),
    #[error("too many code sections")]
    TooManyCodeSections,
    #[error("too many container sections")]
    TooManyContainerSections,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BytecodeDecodeError {
    #[error("invalid bytecode: {0}")]
    InvalidBytecode(#[from] EofDecodeError),
}

/// A failure of the backing state database. The source error is kept so its
/// message reaches the caller unchanged.
#[derive(Debug, Error)]
#[error("database error: {source}")]
pub struct StoreError {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl StoreError {
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient balance for transfer")]
    OutOfFunds,
    #[error("recipient balance overflow")]
    OverflowPayment,
}

#[derive(Debug, Error)]
pub enum EvmError {
    #[error(transparent)]
    Database(#[from] StoreError),
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}
