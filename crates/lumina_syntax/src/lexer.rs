//! Stateful tokenizer (spec §4.1).
//!
//! The lexer is a state machine over the (optionally preprocessed) input
//! text. It is deterministic: the same text always yields the same token
//! sequence. It never throws — unmatchable input produces a [`TokenKind::Error`]
//! token and the configured [`ErrorRecoveryStrategy`] decides whether to skip,
//! insert, replace, or halt.

use std::collections::HashSet;

use crate::token::{Keyword, OperatorKind, Token, TokenKind};

/// A plugin hook run after each token is produced, e.g. an indent-sensitive
/// extension that rewrites whitespace runs into synthetic Indent/Dedent
/// tokens. Kept as a trait object so the core lexer has no knowledge of any
/// particular plugin's logic.
pub trait LexerPlugin {
    /// Called with the token just produced; may append follow-up tokens.
    fn on_token(&mut self, token: &Token, extra: &mut Vec<Token>);
}

/// Runs over the raw source text before tokenization begins (e.g. to strip
/// a shebang line or normalize line endings).
pub trait Preprocessor {
    fn process(&self, input: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKindTag {
    Keyword, Identifier, Number, Float, String, RawString, InterpolatedString,
    Operator, Comment, Whitespace, Newline, Eof, Error,
}

impl TokenKind {
    pub fn tag(&self) -> TokenKindTag {
        match self {
            TokenKind::Keyword(_) => TokenKindTag::Keyword,
            TokenKind::Identifier => TokenKindTag::Identifier,
            TokenKind::Number => TokenKindTag::Number,
            TokenKind::Float => TokenKindTag::Float,
            TokenKind::String => TokenKindTag::String,
            TokenKind::RawString => TokenKindTag::RawString,
            TokenKind::InterpolatedString => TokenKindTag::InterpolatedString,
            TokenKind::Operator(_) => TokenKindTag::Operator,
            TokenKind::Comment => TokenKindTag::Comment,
            TokenKind::Whitespace => TokenKindTag::Whitespace,
            TokenKind::Newline => TokenKindTag::Newline,
            TokenKind::Eof => TokenKindTag::Eof,
            TokenKind::Error => TokenKindTag::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRecoveryStrategy {
    Skip,
    Insert,
    Replace,
    None,
}

#[derive(Clone)]
pub struct ErrorRecoveryOptions {
    pub strategy: ErrorRecoveryStrategy,
    pub max_attempts: usize,
    pub sync_tokens: HashSet<TokenKindTag>,
}

impl Default for ErrorRecoveryOptions {
    fn default() -> Self {
        Self {
            strategy: ErrorRecoveryStrategy::Skip,
            max_attempts: usize::MAX,
            sync_tokens: HashSet::new(),
        }
    }
}

pub struct LexerOptions {
    pub case_sensitive: bool,
    pub ignore_kinds: HashSet<TokenKindTag>,
    pub token_precedence: Vec<TokenKindTag>,
    pub error_recovery: ErrorRecoveryOptions,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            ignore_kinds: [TokenKindTag::Whitespace, TokenKindTag::Comment].into_iter().collect(),
            token_precedence: vec![TokenKindTag::Keyword, TokenKindTag::Identifier],
            error_recovery: ErrorRecoveryOptions::default(),
        }
    }
}

/// Lazy, finite tokenizer. `next_token` advances; `reset` is the only way
/// to restart against new text (spec §4.1: "restartable only via reset").
pub struct Lexer {
    options: LexerOptions,
    preprocessors: Vec<Box<dyn Preprocessor>>,
    plugins: Vec<Box<dyn LexerPlugin>>,
    text: String,
    bytes_pos: usize,
    line: usize,
    column: usize,
    pending: std::collections::VecDeque<Token>,
    attempts: usize,
}

impl Lexer {
    pub fn new(options: LexerOptions) -> Self {
        Self {
            options,
            preprocessors: Vec::new(),
            plugins: Vec::new(),
            text: String::new(),
            bytes_pos: 0,
            line: 1,
            column: 1,
            pending: std::collections::VecDeque::new(),
            attempts: 0,
        }
    }

    pub fn with_preprocessors(mut self, preprocessors: Vec<Box<dyn Preprocessor>>) -> Self {
        self.preprocessors = preprocessors;
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<Box<dyn LexerPlugin>>) -> Self {
        self.plugins = plugins;
        self
    }

    /// The only supported way to restart tokenization against new text.
    pub fn reset(&mut self, text: &str) {
        let mut processed = text.to_string();
        for p in &self.preprocessors {
            processed = p.process(&processed);
        }
        self.text = processed;
        self.bytes_pos = 0;
        self.line = 1;
        self.column = 1;
        self.pending.clear();
        self.attempts = 0;
    }

    /// Tokenizes the entire (preprocessed) input, applying `ignore_kinds`
    /// filtering and recovery. Deterministic for a fixed `text`.
    pub fn tokenize_all(&mut self, text: &str) -> Vec<Token> {
        self.reset(text);
        let mut out = Vec::new();
        loop {
            let tok = self.next_raw_token();
            let is_eof = tok.is_eof();
            let mut extras = Vec::new();
            for plugin in &mut self.plugins {
                plugin.on_token(&tok, &mut extras);
            }
            if !self.options.ignore_kinds.contains(&tok.kind.tag()) {
                out.push(tok);
            }
            out.extend(extras.into_iter().filter(|t| !self.options.ignore_kinds.contains(&t.kind.tag())));
            if is_eof {
                break;
            }
        }
        out
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.bytes_pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.text[self.bytes_pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.bytes_pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn make_token(&self, kind: TokenKind, lexeme: String, start_offset: usize, start_line: usize, start_col: usize) -> Token {
        Token {
            kind,
            lexeme,
            line: start_line,
            column: start_col,
            offset: start_offset,
            end_offset: self.bytes_pos,
        }
    }

    fn next_raw_token(&mut self) -> Token {
        if self.bytes_pos >= self.text.len() {
            return self.make_token(TokenKind::Eof, String::new(), self.bytes_pos, self.line, self.column);
        }
        let start_offset = self.bytes_pos;
        let start_line = self.line;
        let start_col = self.column;
        let c = self.peek_char().unwrap();

        if c == '\n' {
            self.bump();
            return self.make_token(TokenKind::Newline, "\n".to_string(), start_offset, start_line, start_col);
        }
        if c.is_whitespace() {
            let mut s = String::new();
            while let Some(c) = self.peek_char() {
                if c.is_whitespace() && c != '\n' {
                    s.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            return self.make_token(TokenKind::Whitespace, s, start_offset, start_line, start_col);
        }
        if c == '/' && self.peek_at(1) == Some('/') {
            let mut s = String::new();
            while let Some(c) = self.peek_char() {
                if c == '\n' {
                    break;
                }
                s.push(c);
                self.bump();
            }
            return self.make_token(TokenKind::Comment, s, start_offset, start_line, start_col);
        }
        if c.is_alphabetic() || c == '_' {
            let mut s = String::new();
            while let Some(c) = self.peek_char() {
                if c.is_alphanumeric() || c == '_' {
                    s.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            let lookup_key = if self.options.case_sensitive { s.clone() } else { s.to_lowercase() };
            let kind = match Keyword::lookup(&lookup_key) {
                Some(k) => TokenKind::Keyword(k),
                None => TokenKind::Identifier,
            };
            return self.make_token(kind, s, start_offset, start_line, start_col);
        }
        if c.is_ascii_digit() {
            return self.lex_number(start_offset, start_line, start_col);
        }
        if c == 'r' && (self.peek_at(1) == Some('"')) {
            self.bump();
            return self.lex_string(start_offset, start_line, start_col, true);
        }
        if c == '"' {
            return self.lex_string(start_offset, start_line, start_col, false);
        }
        if let Some((op, len)) = self.lex_operator() {
            let s: String = self.text[self.bytes_pos..self.bytes_pos + len].to_string();
            for _ in 0..len {
                self.bump();
            }
            return self.make_token(TokenKind::Operator(op), s, start_offset, start_line, start_col);
        }

        // Unmatchable character.
        let bad = self.bump().unwrap();
        let tok = self.make_token(TokenKind::Error, bad.to_string(), start_offset, start_line, start_col);
        match self.options.error_recovery.strategy {
            ErrorRecoveryStrategy::None => tok,
            ErrorRecoveryStrategy::Skip | ErrorRecoveryStrategy::Insert | ErrorRecoveryStrategy::Replace => {
                self.attempts += 1;
                tok
            }
        }
    }

    fn lex_number(&mut self, start_offset: usize, start_line: usize, start_col: usize) -> Token {
        let mut s = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                s.push(c);
                self.bump();
            } else if c == '.' && !is_float && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
                is_float = true;
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = if is_float { TokenKind::Float } else { TokenKind::Number };
        self.make_token(kind, s, start_offset, start_line, start_col)
    }

    /// Raw strings (`raw == true`) do not interpret escapes. Interpolated
    /// strings (containing `${`) are lexed as one opaque token; decomposition
    /// into segments/expressions happens at the parser boundary per §4.1.
    fn lex_string(&mut self, start_offset: usize, start_line: usize, start_col: usize, raw: bool) -> Token {
        self.bump(); // opening quote
        let mut s = String::new();
        let mut has_interpolation = false;
        while let Some(c) = self.peek_char() {
            if c == '"' {
                self.bump();
                break;
            }
            if !raw && c == '\\' {
                s.push(c);
                self.bump();
                if let Some(escaped) = self.peek_char() {
                    s.push(escaped);
                    self.bump();
                }
                continue;
            }
            if !raw && c == '$' && self.peek_at(1) == Some('{') {
                has_interpolation = true;
            }
            s.push(c);
            self.bump();
        }
        let kind = if raw {
            TokenKind::RawString
        } else if has_interpolation {
            TokenKind::InterpolatedString
        } else {
            TokenKind::String
        };
        self.make_token(kind, s, start_offset, start_line, start_col)
    }

    /// Longest-match operator lexing; order matters (multi-char before single-char).
    fn lex_operator(&self) -> Option<(OperatorKind, usize)> {
        const TABLE: &[(&str, OperatorKind)] = &[
            ("->", OperatorKind::Arrow), ("=>", OperatorKind::FatArrow),
            ("==", OperatorKind::EqEq), ("!=", OperatorKind::NotEq),
            ("<=", OperatorKind::LtEq), (">=", OperatorKind::GtEq),
            ("&&", OperatorKind::AndAnd), ("||", OperatorKind::OrOr),
            ("::", OperatorKind::ColonColon), ("..", OperatorKind::DotDot),
            ("+=", OperatorKind::PlusEq), ("-=", OperatorKind::MinusEq),
            ("*=", OperatorKind::StarEq), ("/=", OperatorKind::SlashEq),
            ("+", OperatorKind::Plus), ("-", OperatorKind::Minus),
            ("*", OperatorKind::Star), ("/", OperatorKind::Slash),
            ("%", OperatorKind::Percent), ("=", OperatorKind::Eq),
            ("<", OperatorKind::Lt), (">", OperatorKind::Gt),
            ("!", OperatorKind::Not), (":", OperatorKind::Colon),
            (";", OperatorKind::Semicolon), (",", OperatorKind::Comma),
            (".", OperatorKind::Dot), ("?", OperatorKind::Question),
            ("@", OperatorKind::At), ("&", OperatorKind::Amp), ("|", OperatorKind::Pipe),
            ("(", OperatorKind::LParen), (")", OperatorKind::RParen),
            ("{", OperatorKind::LBrace), ("}", OperatorKind::RBrace),
            ("[", OperatorKind::LBracket), ("]", OperatorKind::RBracket),
        ];
        let rest = &self.text[self.bytes_pos..];
        TABLE.iter().find(|(s, _)| rest.starts_with(s)).map(|(s, op)| (*op, s.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Lexer::new(LexerOptions::default()).tokenize_all(text).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_a_function_signature() {
        let ks = kinds("fn add(a: i32, b: i32) -> i32 { a + b }");
        assert!(matches!(ks[0], TokenKind::Keyword(Keyword::Fn)));
        assert!(ks.iter().any(|k| matches!(k, TokenKind::Operator(OperatorKind::Arrow))));
        assert!(matches!(ks.last(), Some(TokenKind::Eof)));
    }

    #[test]
    fn is_deterministic() {
        let text = "let mut count = 0; while count < 5 { count = count + 1; }";
        assert_eq!(kinds(text), kinds(text));
    }

    #[test]
    fn keywords_require_full_identifier_match() {
        // "fnord" is not the keyword "fn"; longest match keeps it an identifier.
        let ks = kinds("fnord");
        assert_eq!(ks, vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn raw_string_does_not_interpret_escapes() {
        let mut lexer = Lexer::new(LexerOptions { ignore_kinds: Default::default(), ..LexerOptions::default() });
        let toks = lexer.tokenize_all(r#"r"a\nb""#);
        let s = toks.iter().find(|t| t.kind == TokenKind::RawString).unwrap();
        assert_eq!(s.lexeme, r"a\nb");
    }

    #[test]
    fn interpolated_string_is_one_opaque_token() {
        let mut lexer = Lexer::new(LexerOptions { ignore_kinds: Default::default(), ..LexerOptions::default() });
        let toks = lexer.tokenize_all(r#""hi ${name}""#);
        assert!(toks.iter().any(|t| t.kind == TokenKind::InterpolatedString));
    }

    #[test]
    fn unmatchable_character_emits_error_token_and_continues() {
        let mut lexer = Lexer::new(LexerOptions { ignore_kinds: Default::default(), ..LexerOptions::default() });
        let toks = lexer.tokenize_all("a # b");
        assert!(toks.iter().any(|t| t.kind == TokenKind::Error && t.lexeme == "#"));
        assert!(toks.iter().any(|t| t.kind == TokenKind::Identifier && t.lexeme == "b"));
    }
}
