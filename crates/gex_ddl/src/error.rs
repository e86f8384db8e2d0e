//! Error types for reading a description.

use thiserror::Error;

/// Lexical and structural failures raised while the tree is being built.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataError {
    #[error("syntax error")]
    SyntaxError,

    #[error("identifier contains no characters")]
    IdentifierEmpty,

    #[error("identifier contains an illegal character")]
    IdentifierIllegalChar,

    #[error("string literal is invalid")]
    StringInvalid,

    #[error("string literal contains an illegal character")]
    StringIllegalChar,

    #[error("string literal contains an illegal escape sequence")]
    StringIllegalEscape,

    #[error("end of file reached inside a string literal")]
    StringEndOfFile,

    #[error("character literal contains an illegal character")]
    CharIllegalChar,

    #[error("character literal contains an illegal escape sequence")]
    CharIllegalEscape,

    #[error("end of file reached inside a character literal")]
    CharEndOfFile,

    #[error("boolean value is not \"true\", \"false\", \"0\", or \"1\"")]
    BoolInvalid,

    #[error("data type value does not name a primitive type")]
    TypeInvalid,

    #[error("base64 data is invalid")]
    Base64Invalid,

    #[error("integer value lies outside the range of representable values for its type")]
    IntegerOverflow,

    #[error("hexadecimal float value has more bits than its type")]
    FloatOverflow,

    #[error("floating-point value has an invalid format")]
    FloatInvalid,

    #[error("reference uses an invalid syntax")]
    ReferenceInvalid,

    #[error("octal and binary literals are not supported")]
    LiteralUnsupported,

    #[error("structure name is already used in the same scope")]
    StructNameExists,

    #[error("property list contains a syntax error")]
    PropertySyntaxError,

    #[error("property has an invalid type")]
    PropertyInvalidType,

    #[error("primitive data structure contains a syntax error")]
    PrimitiveSyntaxError,

    #[error("primitive data array size is too large or invalid")]
    PrimitiveIllegalArraySize,

    #[error("primitive data has an invalid format")]
    PrimitiveInvalidFormat,

    #[error("primitive subarray has too few elements")]
    PrimitiveArrayUnderSize,

    #[error("primitive subarray has too many elements")]
    PrimitiveArrayOverSize,

    #[error("primitive subarray has an unrecognized state")]
    PrimitiveInvalidState,

    #[error("structure is not allowed at this location")]
    InvalidStructure,
}

/// Semantic failures that any grammar can report while processing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureError {
    #[error("required substructure is missing")]
    MissingSubstructure,

    #[error("too many substructures of one kind")]
    ExtraneousSubstructure,

    #[error("primitive data has the wrong type or size")]
    InvalidDataFormat,

    #[error("reference does not resolve to a structure")]
    BrokenRef,
}

/// Result type for lexer and tree-building operations.
pub type DataResult<T> = Result<T, DataError>;

/// Error returned by [`crate::Description::parse`].
///
/// `E` is the grammar's own processing error.
#[derive(Error, Debug)]
pub enum DescriptionError<E: std::error::Error + 'static> {
    #[error("Syntax error at line {line}: {kind}")]
    Syntax { kind: DataError, line: usize },

    #[error("Error in {structure} at line {line}: {source}")]
    Process {
        #[source]
        source: E,
        structure: String,
        line: usize,
    },
}

impl<E: std::error::Error + 'static> DescriptionError<E> {
    /// 1-based source line of the failure.
    pub fn line(&self) -> usize {
        match self {
            DescriptionError::Syntax { line, .. } | DescriptionError::Process { line, .. } => *line,
        }
    }
}

/// 1-based line number of a byte offset.
pub fn line_of_offset(text: &[u8], offset: usize) -> usize {
    let end = offset.min(text.len());
    text[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
