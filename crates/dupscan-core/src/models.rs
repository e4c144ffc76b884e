//! Shared typed models used across scanning, normalization, and reporting.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 1. Language
// ---------------------------------------------------------------------------

/// Source languages the scanner can produce token streams for.
///
/// `PlainText` is the word/line oriented mode used for natural-language
/// inputs; it is the only case-insensitive member of the set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    CSharp,
    TypeScript,
    Go,
    PlainText,
}

impl Language {
    /// Whether identifiers in this language are case-sensitive.
    ///
    /// Non-identifier tokens are always case-folded during normalization;
    /// identifiers keep their casing only in case-sensitive languages.
    pub fn is_case_sensitive(self) -> bool {
        !matches!(self, Language::PlainText)
    }

    /// Whether the `string` keyword stays a distinct token kind.
    ///
    /// In C# the `string` keyword survives type-keyword normalization as its
    /// own kind; every other language rewrites it together with the rest of
    /// the type keywords.
    pub fn keeps_string_keyword(self) -> bool {
        matches!(self, Language::CSharp)
    }

    /// Detect a language from a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext.to_lowercase().as_str() {
            "java" => Some(Language::Java),
            "cs" => Some(Language::CSharp),
            "ts" | "tsx" => Some(Language::TypeScript),
            "go" => Some(Language::Go),
            "txt" | "md" => Some(Language::PlainText),
            _ => None,
        }
    }

    /// Stable lowercase name, used in cache keys and log messages.
    pub fn name(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::PlainText => "plaintext",
        }
    }
}

// ---------------------------------------------------------------------------
// 2. TokenKind
// ---------------------------------------------------------------------------

/// Lexical classification of a token.
///
/// The set is closed: normalization policy is keyed entirely off this enum,
/// so the scanner must map every lexeme onto one of these kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    /// Natural-language word (PlainText word mode).
    Word,
    /// Language keyword that carries no more specific kind (incl. `this`).
    Keyword,
    /// Generic primitive/type keyword (int, float, bool, char, byte, ...).
    TypeKeyword,
    /// The `string` keyword; kept distinct for the C# carve-out.
    StringType,
    /// public / private / protected / internal / final.
    VisibilityModifier,
    StringLiteral,
    CharLiteral,
    IntegerLiteral,
    FloatLiteral,
    BooleanLiteral,
    Operator,
    /// Member access or scope separator: `.`, `::`, `->`.
    Dot,
    /// Statement terminator (`;`).
    EndOfStatement,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    /// `#`-directive occupying the rest of the line.
    Preprocessor,
    Comment,
    /// Whole-line unit (PlainText line mode); internal whitespace is always
    /// stripped during normalization.
    Line,
    /// Discontinuity marker inserted by the filtering stage, never produced
    /// by the scanner itself.
    Sentinel,
}

impl TokenKind {
    /// One of the six bracket/paren delimiter kinds.
    pub fn is_delimiter(self) -> bool {
        matches!(
            self,
            TokenKind::LeftParen
                | TokenKind::RightParen
                | TokenKind::LeftBrace
                | TokenKind::RightBrace
                | TokenKind::LeftBracket
                | TokenKind::RightBracket
        )
    }

    /// Type keywords subject to the "normalize type keywords" rewrite.
    pub fn is_type_keyword(self) -> bool {
        matches!(self, TokenKind::TypeKeyword | TokenKind::StringType)
    }
}

// ---------------------------------------------------------------------------
// 3. Token
// ---------------------------------------------------------------------------

/// One lexical unit produced by the scanner.
///
/// Tokens are immutable; `origin` identifies the source file, and within one
/// origin tokens are ordered by ascending `offset`. Downstream stages rely
/// on that ordering and never re-sort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset (inclusive) in the source file.
    pub offset: usize,
    /// Byte offset (exclusive) in the source file.
    pub end_offset: usize,
    /// 1-based line number of the first byte of the token.
    pub line_number: usize,
    /// Identity of the source file this token came from.
    pub origin: String,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        offset: usize,
        end_offset: usize,
        line_number: usize,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
            end_offset,
            line_number,
            origin: origin.into(),
        }
    }

    /// A sentinel token carrying only an origin; used by the filtering stage
    /// to mark discontinuities at `offset` without any content.
    pub fn sentinel(origin: impl Into<String>, offset: usize, line_number: usize) -> Self {
        Self {
            kind: TokenKind::Sentinel,
            text: String::new(),
            offset,
            end_offset: offset,
            line_number,
            origin: origin.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Unit
// ---------------------------------------------------------------------------

/// Content-bearing element of the normalized stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentUnit {
    pub normalized_content: String,
    pub original_content: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub line_number: usize,
    pub origin: String,
    pub kind: TokenKind,
    /// Sequential per-file index; resets to 0 whenever the origin changes.
    pub index_in_file: usize,
}

/// Marker for a position where no content unit exists (an ignored run or a
/// file boundary).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentinelUnit {
    pub origin: String,
}

/// Output element of normalization.
///
/// Modeled as a sum type so consumers must handle the sentinel case
/// explicitly; a sentinel must never be matched as equal to anything,
/// including another sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Unit {
    Content(ContentUnit),
    Sentinel(SentinelUnit),
}

impl Unit {
    pub fn origin(&self) -> &str {
        match self {
            Unit::Content(c) => &c.origin,
            Unit::Sentinel(s) => &s.origin,
        }
    }

    pub fn as_content(&self) -> Option<&ContentUnit> {
        match self {
            Unit::Content(c) => Some(c),
            Unit::Sentinel(_) => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Unit::Sentinel(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
