//! Token kinds and source locations (spec §3 Token, SourceLocation).

use lumina_base::Span;

/// A 1-based line/column/byte-offset position, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

/// `{ start, end, sourceFile? }`. Lines and columns are 1-based internally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
    pub source_file: Option<String>,
}

impl SourceLocation {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end, source_file: None }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    pub fn merge(&self, other: &SourceLocation) -> SourceLocation {
        let start = if self.start.offset <= other.start.offset { self.start } else { other.start };
        let end = if self.end.offset >= other.end.offset { self.end } else { other.end };
        SourceLocation { start, end, source_file: self.source_file.clone() }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start.offset, self.end.offset)
    }
}

/// Keyword set recognized only when it forms a full (delimiter-bounded)
/// identifier; see the lexer's longest-match resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Fn, Struct, Enum, Type, Trait, Impl, Let, Mut, Return, If, Else, While,
    For, In, Match, Is, Try, Move, Await, Async, Import, From, As, Pub,
    True, False, SelfLower, SelfUpper,
}

impl Keyword {
    /// All keywords paired with their lexeme, ordered longest-match-safe
    /// (lookup is by exact identifier text, so order does not matter here).
    pub const ALL: &'static [(&'static str, Keyword)] = &[
        ("fn", Keyword::Fn), ("struct", Keyword::Struct), ("enum", Keyword::Enum),
        ("type", Keyword::Type), ("trait", Keyword::Trait), ("impl", Keyword::Impl),
        ("let", Keyword::Let), ("mut", Keyword::Mut), ("return", Keyword::Return),
        ("if", Keyword::If), ("else", Keyword::Else), ("while", Keyword::While),
        ("for", Keyword::For), ("in", Keyword::In), ("match", Keyword::Match),
        ("is", Keyword::Is), ("try", Keyword::Try), ("move", Keyword::Move),
        ("await", Keyword::Await), ("async", Keyword::Async), ("import", Keyword::Import),
        ("from", Keyword::From), ("as", Keyword::As), ("pub", Keyword::Pub),
        ("true", Keyword::True), ("false", Keyword::False),
        ("self", Keyword::SelfLower), ("Self", Keyword::SelfUpper),
    ];

    pub fn lookup(ident: &str) -> Option<Keyword> {
        Self::ALL.iter().find(|(s, _)| *s == ident).map(|(_, k)| *k)
    }

    pub fn lexeme(self) -> &'static str {
        Self::ALL.iter().find(|(_, k)| *k == self).map(|(s, _)| *s).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Plus, Minus, Star, Slash, Percent,
    Eq, EqEq, NotEq, Lt, LtEq, Gt, GtEq,
    AndAnd, OrOr, Not,
    Arrow, FatArrow, Colon, ColonColon, Semicolon, Comma, Dot, DotDot,
    Question, At, Amp, Pipe,
    LParen, RParen, LBrace, RBrace, LBracket, RBracket,
    PlusEq, MinusEq, StarEq, SlashEq,
}

/// The discriminant of a [`Token`], per spec §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    Number,
    Float,
    String,
    RawString,
    /// An interpolated-string literal lexed as one opaque unit; the parser
    /// (not the lexer, per §4.1) splits it into segments/expressions.
    InterpolatedString,
    Operator(OperatorKind),
    Comment,
    Whitespace,
    Newline,
    Eof,
    /// Unmatchable input; carries the offending character as the lexeme.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub end_offset: usize,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(
            Position::new(self.line, self.column, self.offset),
            // column tracking for the end position is approximate (byte count);
            // good enough for span-based diagnostics, which key off offsets.
            Position::new(self.line, self.column + self.lexeme.chars().count(), self.end_offset),
        )
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
