use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

/// Top-level error taxonomy for the crate.
///
/// Parse errors are recoverable per-compilation-unit; class errors are fatal
/// to the initialization of the offending class only; dispatch errors are
/// recoverable conditions surfaced to a caller's `try`/`catch`.
#[derive(Debug, Clone)]
pub enum MorphoError {
    Parse(ParseError),
    Class(ClassError),
    Linearization(LinearizationError),
    Dispatch(DispatchError),
}

impl fmt::Display for MorphoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Class(e) => write!(f, "{e}"),
            Self::Linearization(e) => write!(f, "{e}"),
            Self::Dispatch(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MorphoError {}

impl From<ParseError> for MorphoError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<ClassError> for MorphoError {
    fn from(e: ClassError) -> Self {
        Self::Class(e)
    }
}

impl From<LinearizationError> for MorphoError {
    fn from(e: LinearizationError) -> Self {
        Self::Linearization(e)
    }
}

impl From<DispatchError> for MorphoError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

/// Stable short tag identifying a parser error, preserved verbatim for
/// compatibility with user-visible diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ErrorId {
    IncompleteExpression,
    MissingParenthesis,
    ExpectExpression,
    MissingSemicolon,
    MissingSemicolonExp,
    MissingSemicolonVar,
    VarExpected,
    BlockTerminatorExpected,
    IfLeftParenMissing,
    IfRightParenMissing,
    WhileLeftParenMissing,
    ForLeftParenMissing,
    ForSemicolonMissing,
    ForRightParenMissing,
    FnNameMissing,
    FnLeftParenMissing,
    FnRightParenMissing,
    FnLeftCurlyMissing,
    CallRightParenMissing,
    ExpectClassName,
    ClassLeftCurlyMissing,
    ClassRightCurlyMissing,
    ExpectDotAfterSuper,
    IncompleteStringInterpolation,
    VarBlankIndex,
    ImportMissingName,
    ImportUnexpectedToken,
    ImportAsSymbol,
    ImportForSymbol,
    ExpectSuper,
    UnrecognizedToken,
    DictSeparator,
    SwitchSeparator,
    DictEntrySeparator,
    ExpectWhile,
    ExpectCatch,
    CatchLeftCurlyMissing,
    OneVariadicParameter,
}

impl ErrorId {
    /// The short tag used in user-visible diagnostics, matching the original
    /// sources' abbreviated identifiers.
    pub fn tag(self) -> &'static str {
        match self {
            Self::IncompleteExpression => "IncExp",
            Self::MissingParenthesis => "MssngParen",
            Self::ExpectExpression => "ExpExpr",
            Self::MissingSemicolon => "MssngSemiVal",
            Self::MissingSemicolonExp => "MssngExpTerm",
            Self::MissingSemicolonVar => "MssngSemiVar",
            Self::VarExpected => "VarExpct",
            Self::BlockTerminatorExpected => "MssngBrc",
            Self::IfLeftParenMissing => "IfMssngLftPrn",
            Self::IfRightParenMissing => "IfMssngRgtPrn",
            Self::WhileLeftParenMissing => "WhlMssngLftPrn",
            Self::ForLeftParenMissing => "ForMssngLftPrn",
            Self::ForSemicolonMissing => "ForMssngSemi",
            Self::ForRightParenMissing => "ForMssngRgtPrn",
            Self::FnNameMissing => "FnNoName",
            Self::FnLeftParenMissing => "FnMssngLftPrn",
            Self::FnRightParenMissing => "FnMssngRgtPrn",
            Self::FnLeftCurlyMissing => "FnMssngLftBrc",
            Self::CallRightParenMissing => "CllMssngRgtPrn",
            Self::ExpectClassName => "ClsNmMssng",
            Self::ClassLeftCurlyMissing => "ClsMssngLftBrc",
            Self::ClassRightCurlyMissing => "ClsMssngRgtBrc",
            Self::ExpectDotAfterSuper => "ExpctDtSpr",
            Self::IncompleteStringInterpolation => "IntrpIncmp",
            Self::VarBlankIndex => "EmptyIndx",
            Self::ImportMissingName => "ImprtMssngNm",
            Self::ImportUnexpectedToken => "ImprtExpctFrAs",
            Self::ImportAsSymbol => "ExpctSymblAftrAs",
            Self::ImportForSymbol => "ExpctSymblAftrFr",
            Self::ExpectSuper => "SprNmMssng",
            Self::UnrecognizedToken => "UnrcgnzdTok",
            Self::DictSeparator => "DctSprtr",
            Self::SwitchSeparator => "SwtchSprtr",
            Self::DictEntrySeparator => "DctEntrySprtr",
            Self::ExpectWhile => "ExpctWhl",
            Self::ExpectCatch => "ExpctCtch",
            Self::CatchLeftCurlyMissing => "ExpctHndlr",
            Self::OneVariadicParameter => "OneVarPr",
        }
    }

    /// The human-readable message paired with this tag.
    pub fn message(self) -> &'static str {
        match self {
            Self::IncompleteExpression => "Incomplete expression.",
            Self::MissingParenthesis => "Expect ')' after expression.",
            Self::ExpectExpression => "Expected expression.",
            Self::MissingSemicolon => "Expect ; after value.",
            Self::MissingSemicolonExp => "Expect expression terminator (; or newline) after expression.",
            Self::MissingSemicolonVar => "Expect ; after variable declaration.",
            Self::VarExpected => "Variable name expected after var.",
            Self::BlockTerminatorExpected => "Expected '}' to finish block.",
            Self::IfLeftParenMissing => "Expected '(' after if.",
            Self::IfRightParenMissing => "Expected ')' after condition.",
            Self::WhileLeftParenMissing => "Expected '(' after while.",
            Self::ForLeftParenMissing => "Expected '(' after for.",
            Self::ForSemicolonMissing => "Expected ';'.",
            Self::ForRightParenMissing => "Expected ')' after for clauses.",
            Self::FnNameMissing => "Expected function or method name.",
            Self::FnLeftParenMissing => "Expect '(' after name.",
            Self::FnRightParenMissing => "Expect ')' after parameters.",
            Self::FnLeftCurlyMissing => "Expect '{' before body.",
            Self::CallRightParenMissing => "Expect ')' after arguments.",
            Self::ExpectClassName => "Expect class name.",
            Self::ClassLeftCurlyMissing => "Expect '{' before class body.",
            Self::ClassRightCurlyMissing => "Expect '}' after class body.",
            Self::ExpectDotAfterSuper => "Expect '.' after 'super'",
            Self::IncompleteStringInterpolation => "Incomplete string after interpolation.",
            Self::VarBlankIndex => "Empty capacity in variable declaration.",
            Self::ImportMissingName => "Import expects a module or file name.",
            Self::ImportUnexpectedToken => "Import expects a module or file name followed by for or as.",
            Self::ImportAsSymbol => "Expect symbol after as in import.",
            Self::ImportForSymbol => "Expect symbol(s) after for in import.",
            Self::ExpectSuper => "Expect superclass name.",
            Self::UnrecognizedToken => "Encountered an unrecognized token.",
            Self::DictSeparator => "Expected a colon separating a key/value pair in dictionary.",
            Self::SwitchSeparator => "Expected a colon after label.",
            Self::DictEntrySeparator => "Expected a comma or '}'.",
            Self::ExpectWhile => "Expected while after loop body.",
            Self::ExpectCatch => "Expected catch after try statement.",
            Self::CatchLeftCurlyMissing => "Expected block of error handlers after catch.",
            Self::OneVariadicParameter => "Functions can have only one variadic parameter.",
        }
    }
}

/// A parse error: an [`ErrorId`] paired with the source position it was
/// raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub id: ErrorId,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}:{}", self.id.message(), self.id.tag(), self.line, self.column)
    }
}

impl std::error::Error for ParseError {}

/// A class/object consistency error: cyclic inheritance, duplicate class
/// name at registration, or a missing parent. Fatal to the initialization
/// of the offending class only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassError {
    DuplicateName(String),
    MissingParent(String),
    Linearization(LinearizationError),
}

impl fmt::Display for ClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "a class named '{name}' is already registered"),
            Self::MissingParent(name) => write!(f, "parent class '{name}' is not registered"),
            Self::Linearization(e) => write!(f, "{e}"),
        }
    }
}

impl From<LinearizationError> for ClassError {
    fn from(e: LinearizationError) -> Self {
        Self::Linearization(e)
    }
}

impl std::error::Error for ClassError {}

/// C3 linearization failure: no good head exists while input lists remain
/// non-empty, or a structural safety limit was exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinearizationError {
    Inconsistent { class: String, parents: Vec<String> },
    InheritanceTooDeep { limit: usize },
    MroTooLong { limit: usize },
    SelfInheritance { class: String },
}

impl fmt::Display for LinearizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inconsistent { class, parents } => write!(
                f,
                "cannot create a consistent method resolution order for '{class}' with parents {}",
                parents.join(", ")
            ),
            Self::InheritanceTooDeep { limit } => {
                write!(f, "inheritance chain too deep (maximum depth {limit})")
            }
            Self::MroTooLong { limit } => write!(f, "linearization exceeds maximum length {limit}"),
            Self::SelfInheritance { class } => write!(f, "class '{class}' cannot inherit from itself"),
        }
    }
}

impl std::error::Error for LinearizationError {}

/// A runtime dispatch miss: method not found after a full linearization
/// scan. Recoverable; callers may surface this as `CLASS_INVK` to user code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    pub class_name: String,
    pub method_name: String,
}

impl DispatchError {
    /// Stable tag a VM surfaces to user-level `try`/`catch`.
    pub const TAG: &'static str = "CLASS_INVK";
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' has no method '{}'", self.class_name, self.method_name)
    }
}

impl std::error::Error for DispatchError {}
