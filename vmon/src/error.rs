/// What went wrong while parsing a command line.
///
/// The display text is the message printed after `ERROR -- `.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("Wrong syntax:")]
    IllegalInput,
    #[error("Bad first address in range:")]
    RangeBadStart,
    #[error("Bad second address in range:")]
    RangeBadEnd,
    #[error("Bad command:")]
    BadCmd,
    #[error("Checkpoint number expected:")]
    ExpectCheckNum,
    #[error("Unexpected token:")]
    ExpectEndCmd,
    #[error("')' expected:")]
    MissingCloseParen,
    #[error("Compare operation missing an operand:")]
    IncompleteCompareOp,
    #[error("Expecting a filename:")]
    ExpectFilename,
    #[error("Address too large:")]
    AddrTooBig,
    #[error("Immediate argument too large:")]
    ImmTooBig,
    #[error("Expecting a string.")]
    ExpectString,
    #[error("Found an undefined label.")]
    UndefinedLabel,
    #[error("Expecting a device number.")]
    ExpectDeviceNum,
    #[error("Expecting an address.")]
    ExpectAddress,
    #[error("Invalid register.")]
    InvalidRegister,
}

/// A parse failure and the byte offset of the token the parser stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (at {pos})")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub pos: u32,
}

impl ParseError {
    pub fn new(kind: ErrorKind, pos: u32) -> Self {
        Self { kind, pos }
    }
}
