//! Semantic syntax highlighting (spec §4.11), re-keyed off lumina's
//! `TokenKind` but otherwise a direct port of the teacher's delta-line
//! encoding (`encode_tokens`) and legend layout.

use tower_lsp::lsp_types::{SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend};

use lumina_syntax::token::{Keyword, OperatorKind, Token, TokenKind};

use crate::line_index::LineIndex;

pub const TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::KEYWORD,  // 0
    SemanticTokenType::TYPE,     // 1
    SemanticTokenType::FUNCTION, // 2
    SemanticTokenType::VARIABLE, // 3
    SemanticTokenType::STRING,   // 4
    SemanticTokenType::NUMBER,   // 5
    SemanticTokenType::OPERATOR, // 6
    SemanticTokenType::COMMENT,  // 7
];

pub const TOKEN_MODIFIERS: &[SemanticTokenModifier] = &[SemanticTokenModifier::DECLARATION, SemanticTokenModifier::READONLY];

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend { token_types: TOKEN_TYPES.to_vec(), token_modifiers: TOKEN_MODIFIERS.to_vec() }
}

pub fn encode_tokens(tokens: &[Token], line_index: &LineIndex) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for token in tokens {
        let Some(token_type) = classify_token(&token.kind) else { continue };

        let pos = line_index.position(token.offset);
        let length = line_index.utf16_length(token.offset, token.end_offset);
        if length == 0 {
            continue;
        }

        let delta_line = pos.line - prev_line;
        let delta_start = if delta_line == 0 { pos.character - prev_start } else { pos.character };

        result.push(SemanticToken { delta_line, delta_start, length, token_type, token_modifiers_bitset: 0 });

        prev_line = pos.line;
        prev_start = pos.character;
    }

    result
}

/// Maps a lexer token kind to a semantic token type index, or `None` for
/// tokens with no meaningful highlight (whitespace, EOF, lex errors).
fn classify_token(kind: &TokenKind) -> Option<u32> {
    match kind {
        TokenKind::Keyword(Keyword::SelfLower | Keyword::SelfUpper | Keyword::True | Keyword::False) => Some(0),
        TokenKind::Keyword(_) => Some(0),
        TokenKind::Identifier => Some(3),
        TokenKind::Number | TokenKind::Float => Some(5),
        TokenKind::String | TokenKind::RawString | TokenKind::InterpolatedString => Some(4),
        TokenKind::Operator(_) => Some(6),
        TokenKind::Comment => Some(7),
        TokenKind::Whitespace | TokenKind::Newline | TokenKind::Eof | TokenKind::Error => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_syntax::token::Keyword;

    fn tok(kind: TokenKind, lexeme: &str, offset: usize) -> Token {
        let end = offset + lexeme.len();
        Token { kind, lexeme: lexeme.to_string(), line: 1, column: 1, offset, end_offset: end }
    }

    #[test]
    fn keyword_classified_as_keyword() {
        assert_eq!(classify_token(&TokenKind::Keyword(Keyword::Let)), Some(0));
    }

    #[test]
    fn identifier_classified_as_variable() {
        assert_eq!(classify_token(&TokenKind::Identifier), Some(3));
    }

    #[test]
    fn structural_tokens_skipped() {
        assert_eq!(classify_token(&TokenKind::Whitespace), None);
        assert_eq!(classify_token(&TokenKind::Eof), None);
    }

    #[test]
    fn delta_encoding_within_one_line() {
        let line_index = LineIndex::new("let x = 1;");
        let tokens = vec![tok(TokenKind::Keyword(Keyword::Let), "let", 0), tok(TokenKind::Identifier, "x", 4)];
        let encoded = encode_tokens(&tokens, &line_index);
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded[0].delta_line, 0);
        assert_eq!(encoded[0].length, 3);
        assert_eq!(encoded[1].delta_start, 4);
    }

    #[test]
    fn delta_encoding_across_lines_resets_start() {
        let line_index = LineIndex::new("let x\n= 1;");
        let tokens = vec![tok(TokenKind::Keyword(Keyword::Let), "let", 0), tok(TokenKind::Operator(OperatorKind::Eq), "=", 6)];
        let encoded = encode_tokens(&tokens, &line_index);
        assert_eq!(encoded[1].delta_line, 1);
        assert_eq!(encoded[1].delta_start, 0);
    }

    #[test]
    fn zero_length_tokens_skipped() {
        let line_index = LineIndex::new("x");
        let tokens = vec![tok(TokenKind::Eof, "", 1)];
        assert!(encode_tokens(&tokens, &line_index).is_empty());
    }
}
