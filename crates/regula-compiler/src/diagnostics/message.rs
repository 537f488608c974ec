use rowan::TextRange;

/// Diagnostic kinds ordered by priority (highest priority first).
///
/// When two diagnostics start at the same position, the higher-priority one
/// suppresses the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Unbalanced delimiters swallow the rest of the pattern
    UnmatchedOpen,
    UnmatchedClose,
    UnterminatedClass,
    UnterminatedConstruct,
    TrailingBackslash,

    // Quantifier misuse
    QuantifierFollowsNothing,
    NestedQuantifier,
    QuantifierTooLarge,

    // Malformed constructs
    UnknownGroupConstruct,
    UnknownModifier,
    ModifierConflict,
    ModifierNotNegatable,
    UnknownVerb,
    VerbArgumentRequired,
    UnknownConditional,
    TooManyBranches,
    DefineWithBranches,
    InvalidGroupName,
    InvalidEscape,
    CodepointTooLarge,
    InvalidRange,
    ReservedPosixSyntax,
    InvalidSetExpression,
    UnknownCharacterName,

    // Well-formed but meaningless
    UnknownPosixClass,
    UnknownProperty,
    InvalidWildcard,
    NonexistentGroup,
    NonexistentName,
    LookbehindUnbounded,
    LookbehindTooLong,

    // Warnings
    ReversedQuantifier,
    NullMatchLoop,
    UselessGreediness,
    PosixOutsideClass,
    AssumedPosixClass,
    FalseRange,
    UnrecognizedEscape,
    UnescapedBrace,
    DeprecatedProperty,
    UselessModifier,
    OctalAmbiguity,
    RedundantEscape,
    EmptyAlternative,
    DuplicateClassMember,
}

impl DiagnosticKind {
    /// Default severity for this kind. Can be overridden by policy.
    pub fn default_severity(&self) -> Severity {
        if *self >= Self::ReversedQuantifier {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    /// Whether this kind suppresses `other` at the same position.
    pub fn suppresses(&self, other: &DiagnosticKind) -> bool {
        self < other
    }

    /// Warnings only reported when strict mode is on.
    pub fn is_strict_only(&self) -> bool {
        matches!(
            self,
            Self::RedundantEscape | Self::EmptyAlternative | Self::DuplicateClassMember
        )
    }

    /// Default hint for this kind, automatically included in diagnostics.
    pub fn default_hint(&self) -> Option<&'static str> {
        match self {
            Self::ReversedQuantifier => Some("write the smaller bound first"),
            Self::PosixOutsideClass => Some("POSIX classes go inside a bracket class, e.g. `[[:alpha:]]`"),
            Self::UnescapedBrace => Some("escape it with a backslash"),
            Self::LookbehindTooLong | Self::LookbehindUnbounded => {
                Some("lookbehind can match at most 255 characters")
            }
            Self::QuantifierTooLarge => Some("bounds must not exceed 65534"),
            Self::ModifierConflict => Some("use at most one of `d`, `u`, `a`, `aa`, `l`"),
            _ => None,
        }
    }

    /// Base message for this diagnostic kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::UnmatchedOpen => "unmatched `(`",
            Self::UnmatchedClose => "unmatched `)`",
            Self::UnterminatedClass => "unmatched `[`",
            Self::UnterminatedConstruct => "unterminated construct",
            Self::TrailingBackslash => "trailing `\\` in pattern",

            Self::QuantifierFollowsNothing => "quantifier follows nothing",
            Self::NestedQuantifier => "nested quantifiers",
            Self::QuantifierTooLarge => "quantifier bound too large",

            Self::UnknownGroupConstruct => "unrecognized group construct",
            Self::UnknownModifier => "unknown inline modifier",
            Self::ModifierConflict => "conflicting charset modifiers",
            Self::ModifierNotNegatable => "modifier may not appear after `-`",
            Self::UnknownVerb => "unknown verb",
            Self::VerbArgumentRequired => "verb requires an argument",
            Self::UnknownConditional => "unknown switch condition",
            Self::TooManyBranches => "switch condition has more than two branches",
            Self::DefineWithBranches => "`(?(DEFINE)...)` does not allow branches",
            Self::InvalidGroupName => "group name must start with a non-digit word character",
            Self::InvalidEscape => "invalid escape sequence",
            Self::CodepointTooLarge => "code point too large",
            Self::InvalidRange => "invalid range in character class",
            Self::ReservedPosixSyntax => "POSIX collating syntax is reserved",
            Self::InvalidSetExpression => "invalid set expression",
            Self::UnknownCharacterName => "unknown character name",

            Self::UnknownPosixClass => "unknown POSIX class",
            Self::UnknownProperty => "unknown property",
            Self::InvalidWildcard => "invalid property wildcard",
            Self::NonexistentGroup => "reference to nonexistent group",
            Self::NonexistentName => "reference to nonexistent named group",
            Self::LookbehindUnbounded => "lookbehind has no upper length bound",
            Self::LookbehindTooLong => "lookbehind longer than 255 characters",

            Self::ReversedQuantifier => "quantifier with minimum above maximum can't match",
            Self::NullMatchLoop => "quantifier on zero-length expression",
            Self::UselessGreediness => "useless greediness modifier",
            Self::PosixOutsideClass => "POSIX syntax belongs inside character classes",
            Self::AssumedPosixClass => "assuming a POSIX class",
            Self::FalseRange => "false range in character class",
            Self::UnrecognizedEscape => "unrecognized escape passed through",
            Self::UnescapedBrace => "unescaped literal `{`",
            Self::DeprecatedProperty => "deprecated property",
            Self::UselessModifier => "useless modifier",
            Self::OctalAmbiguity => "ambiguous group reference read as octal",
            Self::RedundantEscape => "redundant escape",
            Self::EmptyAlternative => "empty alternative",
            Self::DuplicateClassMember => "duplicate member in character class",
        }
    }

    /// Template for custom messages. Contains `{}` placeholder for caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::UnknownPosixClass => "unknown POSIX class `[:{}:]`".to_string(),
            Self::UnknownProperty => "unknown property `{}`".to_string(),
            Self::UnknownVerb => "unknown verb `(*{})`".to_string(),
            Self::NonexistentGroup => "reference to nonexistent group `{}`".to_string(),
            Self::NonexistentName => "reference to nonexistent named group `{}`".to_string(),
            Self::AssumedPosixClass => "assuming `[:{}:]`".to_string(),
            Self::UnrecognizedEscape => "unrecognized escape `\\{}` passed through".to_string(),
            Self::UnescapedBrace => "unescaped literal `{}`".to_string(),
            Self::UselessModifier | Self::UnknownModifier | Self::ModifierNotNegatable => {
                format!("{} `{{}}`", self.fallback_message())
            }

            Self::UnmatchedOpen | Self::UnterminatedClass | Self::UnterminatedConstruct => {
                format!("{}; {{}}", self.fallback_message())
            }

            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub(crate) replacement: String,
    pub(crate) description: String,
}

impl Fix {
    pub fn new(replacement: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) range: TextRange,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) severity: Severity,
    /// The range shown to the user (underlined in output).
    pub(crate) range: TextRange,
    pub(crate) message: String,
    pub(crate) fix: Option<Fix>,
    pub(crate) related: Vec<RelatedInfo>,
    pub(crate) hints: Vec<String>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            range,
            message: message.into(),
            fix: None,
            related: Vec::new(),
            hints: kind.default_hint().map(String::from).into_iter().collect(),
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity,
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        if let Some(fix) = &self.fix {
            write!(f, " (fix: {})", fix.description)?;
        }
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.range.start()),
                u32::from(related.range.end())
            )?;
        }
        for hint in &self.hints {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}
