//! PEG-style grammar compiler (spec §4.2).
//!
//! The compiled grammar drives the `grammar` CLI subcommand (validating and
//! fingerprinting a grammar file) and selects which entry point of the
//! hand-written [`crate::parser::Parser`] a given start rule maps to. It
//! supports a small PEG subset: rule definitions, ordered choice `/`,
//! sequencing, `*`/`+`/`?` repetition, string and character-class literals,
//! and rule references.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpr {
    Literal(String),
    CharClass { ranges: Vec<(char, char)>, negate: bool },
    AnyChar,
    RuleRef(String),
    Sequence(Vec<RuleExpr>),
    Choice(Vec<RuleExpr>),
    Star(Box<RuleExpr>),
    Plus(Box<RuleExpr>),
    Optional(Box<RuleExpr>),
}

/// A location in the *grammar text* (not the compiled language's source),
/// for structured compile failures (spec §4.2: "do not include the target
/// language name").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarCompileError {
    pub location: GrammarLocation,
    pub message: String,
}

impl std::fmt::Display for GrammarCompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.location.line, self.location.column, self.message)
    }
}

impl std::error::Error for GrammarCompileError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeFor {
    Speed,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutput {
    Parser,
    Source,
}

/// Compile options (spec §4.2). Unknown/unused fields are accepted for
/// forward compatibility — nothing in this struct causes compilation to
/// fail if left at its default.
pub struct CompileOptions {
    pub allowed_start_rules: Vec<String>,
    pub cache: bool,
    pub optimize: OptimizeFor,
    pub output: CompileOutput,
    pub trace: bool,
    pub grammar_source: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            allowed_start_rules: Vec::new(),
            cache: true,
            optimize: OptimizeFor::Speed,
            output: CompileOutput::Parser,
            trace: false,
            grammar_source: None,
        }
    }
}

/// A compiled grammar: a table of named rules plus the set of permitted
/// start rules (empty = any rule may be used as a start rule).
#[derive(Debug)]
pub struct CompiledGrammar {
    pub rules: HashMap<String, RuleExpr>,
    pub allowed_start_rules: Vec<String>,
}

impl CompiledGrammar {
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_start_rule_allowed(&self, name: &str) -> bool {
        self.allowed_start_rules.is_empty() || self.allowed_start_rules.iter().any(|r| r == name)
    }
}

pub struct GrammarCompiler;

impl GrammarCompiler {
    /// Compiles grammar text of the form:
    /// ```text
    /// program = statement*
    /// statement = "let" / "return" / identifier
    /// identifier = [a-zA-Z_] [a-zA-Z0-9_]*
    /// ```
    pub fn compile(text: &str, options: &CompileOptions) -> Result<CompiledGrammar, GrammarCompileError> {
        let mut rules = HashMap::new();
        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(eq_pos) = line.find('=') else {
                return Err(GrammarCompileError {
                    location: GrammarLocation { line: line_no + 1, column: 1 },
                    message: format!("expected rule definition `name = expr`, found `{}`", line),
                });
            };
            let name = line[..eq_pos].trim().to_string();
            if name.is_empty() || !name.chars().next().unwrap().is_alphabetic() {
                return Err(GrammarCompileError {
                    location: GrammarLocation { line: line_no + 1, column: 1 },
                    message: format!("invalid rule name `{}`", name),
                });
            }
            let body = line[eq_pos + 1..].trim();
            let expr = Self::parse_choice(body, line_no + 1)?;
            rules.insert(name, expr);
        }
        if rules.is_empty() {
            return Err(GrammarCompileError {
                location: GrammarLocation { line: 1, column: 1 },
                message: "grammar defines no rules".to_string(),
            });
        }
        for start in &options.allowed_start_rules {
            if !rules.contains_key(start) {
                return Err(GrammarCompileError {
                    location: GrammarLocation { line: 1, column: 1 },
                    message: format!("allowedStartRules names unknown rule `{}`", start),
                });
            }
        }
        Ok(CompiledGrammar { rules, allowed_start_rules: options.allowed_start_rules.clone() })
    }

    fn parse_choice(body: &str, line: usize) -> Result<RuleExpr, GrammarCompileError> {
        let alts: Vec<&str> = Self::split_top_level(body, '/');
        let mut exprs = Vec::new();
        for alt in alts {
            exprs.push(Self::parse_sequence(alt.trim(), line)?);
        }
        Ok(if exprs.len() == 1 { exprs.remove(0) } else { RuleExpr::Choice(exprs) })
    }

    fn parse_sequence(body: &str, line: usize) -> Result<RuleExpr, GrammarCompileError> {
        let mut items = Vec::new();
        let mut chars = body.chars().peekable();
        let mut buf = String::new();
        let flush = |buf: &mut String, items: &mut Vec<String>| {
            if !buf.trim().is_empty() {
                items.push(std::mem::take(buf));
            } else {
                buf.clear();
            }
        };
        while let Some(&c) = chars.peek() {
            match c {
                '"' => {
                    flush(&mut buf, &mut items);
                    let mut lit = String::from('"');
                    chars.next();
                    for c in chars.by_ref() {
                        lit.push(c);
                        if c == '"' {
                            break;
                        }
                    }
                    items.push(lit);
                }
                ' ' | '\t' => {
                    flush(&mut buf, &mut items);
                    chars.next();
                }
                _ => {
                    buf.push(c);
                    chars.next();
                }
            }
        }
        flush(&mut buf, &mut items);
        let mut exprs = Vec::new();
        for tok in items {
            exprs.push(Self::parse_atom(tok.trim(), line)?);
        }
        Ok(if exprs.len() == 1 { exprs.remove(0) } else { RuleExpr::Sequence(exprs) })
    }

    fn parse_atom(tok: &str, line: usize) -> Result<RuleExpr, GrammarCompileError> {
        if let Some(stripped) = tok.strip_suffix('*') {
            return Ok(RuleExpr::Star(Box::new(Self::parse_atom(stripped, line)?)));
        }
        if let Some(stripped) = tok.strip_suffix('+') {
            return Ok(RuleExpr::Plus(Box::new(Self::parse_atom(stripped, line)?)));
        }
        if let Some(stripped) = tok.strip_suffix('?') {
            return Ok(RuleExpr::Optional(Box::new(Self::parse_atom(stripped, line)?)));
        }
        if tok.starts_with('"') && tok.ends_with('"') && tok.len() >= 2 {
            return Ok(RuleExpr::Literal(tok[1..tok.len() - 1].to_string()));
        }
        if tok == "." {
            return Ok(RuleExpr::AnyChar);
        }
        if tok.starts_with('[') && tok.ends_with(']') {
            return Self::parse_char_class(&tok[1..tok.len() - 1], line);
        }
        if tok.chars().next().map(|c| c.is_alphabetic() || c == '_').unwrap_or(false) {
            return Ok(RuleExpr::RuleRef(tok.to_string()));
        }
        Err(GrammarCompileError { location: GrammarLocation { line, column: 1 }, message: format!("unrecognized grammar token `{}`", tok) })
    }

    fn parse_char_class(body: &str, line: usize) -> Result<RuleExpr, GrammarCompileError> {
        let (negate, body) = if let Some(rest) = body.strip_prefix('^') { (true, rest) } else { (false, body) };
        let chars: Vec<char> = body.chars().collect();
        let mut ranges = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if i + 2 < chars.len() && chars[i + 1] == '-' {
                ranges.push((chars[i], chars[i + 2]));
                i += 3;
            } else {
                ranges.push((chars[i], chars[i]));
                i += 1;
            }
        }
        if ranges.is_empty() {
            return Err(GrammarCompileError { location: GrammarLocation { line, column: 1 }, message: "empty character class".to_string() });
        }
        Ok(RuleExpr::CharClass { ranges, negate })
    }

    fn split_top_level(s: &str, sep: char) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut depth = 0i32;
        let mut last = 0;
        let bytes: Vec<(usize, char)> = s.char_indices().collect();
        for &(i, c) in &bytes {
            match c {
                '"' => depth += if depth == 0 { 1 } else { -1 },
                _ if c == sep && depth == 0 => {
                    parts.push(&s[last..i]);
                    last = i + c.len_utf8();
                }
                _ => {}
            }
        }
        parts.push(&s[last..]);
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_simple_grammar() {
        let text = "program = statement*\nstatement = \"let\" / \"return\"";
        let grammar = GrammarCompiler::compile(text, &CompileOptions::default()).unwrap();
        assert!(grammar.rules.contains_key("program"));
        assert!(grammar.rules.contains_key("statement"));
    }

    #[test]
    fn reports_structured_location_on_malformed_rule() {
        let err = GrammarCompiler::compile("this is not a rule", &CompileOptions::default()).unwrap_err();
        assert_eq!(err.location.line, 1);
        assert!(!err.message.contains("lumina")); // no target language name
    }

    #[test]
    fn unknown_start_rule_is_rejected() {
        let text = "program = \"x\"";
        let opts = CompileOptions { allowed_start_rules: vec!["nope".to_string()], ..CompileOptions::default() };
        assert!(GrammarCompiler::compile(text, &opts).is_err());
    }

    #[test]
    fn unknown_options_fields_do_not_affect_compile_success() {
        let text = "program = \"x\"";
        let opts = CompileOptions { trace: true, cache: false, ..CompileOptions::default() };
        assert!(GrammarCompiler::compile(text, &opts).is_ok());
    }
}
