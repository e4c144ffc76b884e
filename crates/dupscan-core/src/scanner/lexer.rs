//! Lexical scanner producing the raw token stream.
//!
//! The normalizer treats this stage as a black box that returns tokens with
//! offset/line metadata. The scanner itself is a direct byte scanner over
//! the curly-brace languages (Java, C#, TypeScript, Go); `PlainText` inputs
//! go through the word or line tokenizers instead. No policy lives here:
//! comments, delimiters and literals are all emitted and classified, and
//! dropping them is entirely the normalizer's decision.

use crate::models::{Language, Token, TokenKind};

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

const JAVA_VISIBILITY: &[&str] = &["public", "private", "protected", "final"];
const CSHARP_VISIBILITY: &[&str] = &["public", "private", "protected", "internal", "sealed"];
const TYPESCRIPT_VISIBILITY: &[&str] = &["public", "private", "protected"];

const JAVA_TYPES: &[&str] = &[
    "byte", "short", "int", "long", "float", "double", "boolean", "char",
];
const CSHARP_TYPES: &[&str] = &[
    "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float", "double",
    "decimal", "bool", "char", "object",
];
const TYPESCRIPT_TYPES: &[&str] = &["number", "boolean", "object", "any"];
const GO_TYPES: &[&str] = &[
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
    "float32", "float64", "bool", "byte", "rune",
];

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "break", "case", "catch", "class", "const", "continue", "default", "do",
    "else", "enum", "extends", "finally", "for", "goto", "if", "implements", "import",
    "instanceof", "interface", "native", "new", "package", "return", "static", "strictfp",
    "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try", "void",
    "volatile", "while",
];
const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "break", "case", "catch", "checked", "class", "const", "continue",
    "default", "delegate", "do", "else", "enum", "event", "explicit", "extern", "finally",
    "fixed", "for", "foreach", "goto", "if", "implicit", "in", "interface", "is", "lock",
    "namespace", "new", "operator", "out", "override", "params", "readonly", "ref", "return",
    "static", "struct", "switch", "this", "throw", "try", "typeof", "unchecked", "unsafe",
    "using", "var", "virtual", "void", "while",
];
const TYPESCRIPT_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "break", "case", "catch", "class", "const", "continue",
    "default", "delete", "do", "else", "enum", "export", "extends", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "namespace", "new",
    "of", "return", "static", "super", "switch", "this", "throw", "try", "type", "typeof",
    "var", "void", "while", "yield",
];
const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

/// Classify an identifier-shaped word against the language's keyword tables.
fn classify_word(language: Language, word: &str) -> TokenKind {
    let (visibility, types, keywords): (&[&str], &[&str], &[&str]) = match language {
        Language::Java => (JAVA_VISIBILITY, JAVA_TYPES, JAVA_KEYWORDS),
        Language::CSharp => (CSHARP_VISIBILITY, CSHARP_TYPES, CSHARP_KEYWORDS),
        Language::TypeScript => (TYPESCRIPT_VISIBILITY, TYPESCRIPT_TYPES, TYPESCRIPT_KEYWORDS),
        Language::Go => (&[], GO_TYPES, GO_KEYWORDS),
        Language::PlainText => return TokenKind::Word,
    };
    if word == "true" || word == "false" {
        return TokenKind::BooleanLiteral;
    }
    // `string` is a keyword in C#, TypeScript and Go; Java spells it as a
    // class name, so it stays an identifier there.
    if word == "string" && language != Language::Java {
        return TokenKind::StringType;
    }
    if visibility.contains(&word) {
        TokenKind::VisibilityModifier
    } else if types.contains(&word) {
        TokenKind::TypeKeyword
    } else if keywords.contains(&word) {
        TokenKind::Keyword
    } else {
        TokenKind::Identifier
    }
}

// ---------------------------------------------------------------------------
// Byte scanner
// ---------------------------------------------------------------------------

/// Cursor state shared by the scanning helpers below.
struct Scanner<'a> {
    bytes: &'a [u8],
    source: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            source,
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// Advance one byte, tracking line numbers.
    fn bump(&mut self) {
        if self.bytes[self.pos] == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn text(&self, start: usize) -> &'a str {
        &self.source[start..self.pos]
    }
}

// Non-ASCII bytes count as identifier bytes: the languages here all allow
// Unicode identifiers, and UTF-8 continuation bytes are non-ASCII, so
// consuming them byte-wise always ends on a char boundary.
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || !b.is_ascii()
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || !b.is_ascii()
}

const OPERATOR_BYTES: &[u8] = b"+-*/%=!<>&|^~?:@";

/// Tokenize source text for one of the curly-brace languages.
///
/// `PlainText` inputs are dispatched to [`tokenize_words`]. The returned
/// tokens are ordered by ascending byte offset; offsets index into `source`.
pub fn tokenize(source: &str, language: Language, origin: &str) -> Vec<Token> {
    if language == Language::PlainText {
        return tokenize_words(source, origin);
    }

    let mut s = Scanner::new(source);
    let mut tokens = Vec::new();

    while let Some(b) = s.peek(0) {
        if b.is_ascii_whitespace() {
            s.bump();
            continue;
        }

        let start = s.pos;
        let line = s.line;

        // Line and block comments.
        if b == b'/' && s.peek(1) == Some(b'/') {
            while s.peek(0).is_some_and(|c| c != b'\n') {
                s.bump();
            }
            tokens.push(Token::new(
                TokenKind::Comment,
                s.text(start),
                start,
                s.pos,
                line,
                origin,
            ));
            continue;
        }
        if b == b'/' && s.peek(1) == Some(b'*') {
            s.bump();
            s.bump();
            while s.peek(0).is_some() {
                if s.peek(0) == Some(b'*') && s.peek(1) == Some(b'/') {
                    s.bump();
                    s.bump();
                    break;
                }
                s.bump();
            }
            tokens.push(Token::new(
                TokenKind::Comment,
                s.text(start),
                start,
                s.pos,
                line,
                origin,
            ));
            continue;
        }

        // Preprocessor directives (C# `#region`, `#if`, ...): rest of line.
        if b == b'#' && language == Language::CSharp {
            while s.peek(0).is_some_and(|c| c != b'\n') {
                s.bump();
            }
            tokens.push(Token::new(
                TokenKind::Preprocessor,
                s.text(start),
                start,
                s.pos,
                line,
                origin,
            ));
            continue;
        }

        // String literals. TypeScript treats single quotes and backticks as
        // string delimiters; Java/C#/Go treat single quotes as char literals.
        if b == b'"'
            || (b == b'`' && matches!(language, Language::TypeScript | Language::Go))
            || (b == b'\'' && language == Language::TypeScript)
        {
            scan_quoted(&mut s, b);
            tokens.push(Token::new(
                TokenKind::StringLiteral,
                s.text(start),
                start,
                s.pos,
                line,
                origin,
            ));
            continue;
        }
        if b == b'\'' {
            scan_quoted(&mut s, b'\'');
            tokens.push(Token::new(
                TokenKind::CharLiteral,
                s.text(start),
                start,
                s.pos,
                line,
                origin,
            ));
            continue;
        }

        // Numbers.
        if b.is_ascii_digit() {
            let kind = scan_number(&mut s);
            tokens.push(Token::new(kind, s.text(start), start, s.pos, line, origin));
            continue;
        }

        // Identifiers and keywords.
        if is_ident_start(b) {
            while s.peek(0).is_some_and(is_ident_continue) {
                s.bump();
            }
            let word = s.text(start);
            tokens.push(Token::new(
                classify_word(language, word),
                word,
                start,
                s.pos,
                line,
                origin,
            ));
            continue;
        }

        // Punctuation with a dedicated kind.
        let kind = match b {
            b';' => Some(TokenKind::EndOfStatement),
            b'(' => Some(TokenKind::LeftParen),
            b')' => Some(TokenKind::RightParen),
            b'{' => Some(TokenKind::LeftBrace),
            b'}' => Some(TokenKind::RightBrace),
            b'[' => Some(TokenKind::LeftBracket),
            b']' => Some(TokenKind::RightBracket),
            b',' => Some(TokenKind::Operator),
            _ => None,
        };
        if let Some(kind) = kind {
            s.bump();
            tokens.push(Token::new(kind, s.text(start), start, s.pos, line, origin));
            continue;
        }

        // Member access / scope separators collapse onto one kind so the
        // fully-qualified-name lookahead works uniformly across languages.
        if b == b'.' {
            s.bump();
            tokens.push(Token::new(TokenKind::Dot, ".", start, s.pos, line, origin));
            continue;
        }
        if b == b':' && s.peek(1) == Some(b':') {
            s.bump();
            s.bump();
            tokens.push(Token::new(TokenKind::Dot, "::", start, s.pos, line, origin));
            continue;
        }

        // Operator runs (==, =>, &&, +=, ...).
        if OPERATOR_BYTES.contains(&b) {
            while s.peek(0).is_some_and(|c| OPERATOR_BYTES.contains(&c)) {
                s.bump();
            }
            tokens.push(Token::new(
                TokenKind::Operator,
                s.text(start),
                start,
                s.pos,
                line,
                origin,
            ));
            continue;
        }

        // Anything else (stray punctuation such as `$` or `\`) becomes a
        // one-char operator so the stream keeps its offset ordering. The
        // whole character is consumed so the slice below stays on a char
        // boundary.
        let width = s.source[s.pos..]
            .chars()
            .next()
            .map_or(1, |c| c.len_utf8());
        for _ in 0..width {
            s.bump();
        }
        tokens.push(Token::new(
            TokenKind::Operator,
            s.text(start),
            start,
            s.pos,
            line,
            origin,
        ));
    }

    tokens
}

/// Consume a quoted literal including the closing quote, honoring `\`
/// escapes. An unterminated literal runs to end of input.
fn scan_quoted(s: &mut Scanner<'_>, quote: u8) {
    s.bump();
    while let Some(c) = s.peek(0) {
        if c == b'\\' && s.peek(1).is_some() {
            s.bump();
            s.bump();
            continue;
        }
        s.bump();
        if c == quote {
            break;
        }
    }
}

/// Consume a numeric literal; returns the float kind when a decimal point or
/// exponent is present.
fn scan_number(s: &mut Scanner<'_>) -> TokenKind {
    let mut is_float = false;
    if s.peek(0) == Some(b'0') && matches!(s.peek(1), Some(b'x') | Some(b'X')) {
        s.bump();
        s.bump();
        while s.peek(0).is_some_and(|c| c.is_ascii_hexdigit()) {
            s.bump();
        }
        return TokenKind::IntegerLiteral;
    }
    while let Some(c) = s.peek(0) {
        if c.is_ascii_digit() || c == b'_' {
            s.bump();
        } else if c == b'.' && s.peek(1).is_some_and(|d| d.is_ascii_digit()) {
            is_float = true;
            s.bump();
        } else if matches!(c, b'e' | b'E')
            && s.peek(1)
                .is_some_and(|d| d.is_ascii_digit() || d == b'+' || d == b'-')
        {
            is_float = true;
            s.bump();
            if matches!(s.peek(0), Some(b'+') | Some(b'-')) {
                s.bump();
            }
        } else if matches!(c, b'f' | b'F' | b'd' | b'D') {
            // Java/C# float suffixes.
            is_float = true;
            s.bump();
            break;
        } else if matches!(c, b'l' | b'L' | b'u' | b'U') {
            s.bump();
            break;
        } else {
            break;
        }
    }
    if is_float {
        TokenKind::FloatLiteral
    } else {
        TokenKind::IntegerLiteral
    }
}

// ---------------------------------------------------------------------------
// PlainText modes
// ---------------------------------------------------------------------------

/// Tokenize text into whitespace-separated `Word` tokens.
pub fn tokenize_words(source: &str, origin: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line = 1usize;
    let mut start: Option<(usize, usize)> = None;

    for (idx, ch) in source.char_indices() {
        if ch.is_whitespace() {
            if let Some((word_start, word_line)) = start.take() {
                tokens.push(Token::new(
                    TokenKind::Word,
                    &source[word_start..idx],
                    word_start,
                    idx,
                    word_line,
                    origin,
                ));
            }
            if ch == '\n' {
                line += 1;
            }
        } else if start.is_none() {
            start = Some((idx, line));
        }
    }
    if let Some((word_start, word_line)) = start {
        tokens.push(Token::new(
            TokenKind::Word,
            &source[word_start..],
            word_start,
            source.len(),
            word_line,
            origin,
        ));
    }
    tokens
}

/// Tokenize text into one `Line` token per non-blank line.
pub fn tokenize_lines(source: &str, origin: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut offset = 0usize;
    for (i, raw) in source.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if !line.trim().is_empty() {
            tokens.push(Token::new(
                TokenKind::Line,
                line,
                offset,
                offset + line.len(),
                i + 1,
                origin,
            ));
        }
        offset += raw.len() + 1;
    }
    tokens
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
