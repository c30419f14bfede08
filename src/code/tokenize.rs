use serde::{Deserialize, Serialize};

/// Coarse token classes used for coloring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Plain,
    Keyword,
    String,
    Number,
    Comment,
    Punctuation,
}

/// One lexical span of a line. The texts of a line's tokens concatenate to the line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxToken {
    pub kind: TokenKind,
    pub text: String,
}

impl SyntaxToken {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Splits a line into colorable tokens.
pub trait SyntaxTokenizer: Send + Sync {
    fn tokenize(&self, line: &str, language: &str) -> Vec<SyntaxToken>;
}

/// Returns the whole line as a single plain token.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTokenizer;

impl SyntaxTokenizer for PlainTokenizer {
    fn tokenize(&self, line: &str, _language: &str) -> Vec<SyntaxToken> {
        if line.is_empty() {
            return Vec::new();
        }
        vec![SyntaxToken::new(TokenKind::Plain, line)]
    }
}

/// Small keyword/string/comment/number scanner for common languages.
///
/// Single-line only: block comments and multi-line strings are not tracked across lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordTokenizer;

fn keywords(language: &str) -> &'static [&'static str] {
    match language.to_ascii_lowercase().as_str() {
        "rust" | "rs" => &[
            "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
            "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
            "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
            "trait", "true", "type", "unsafe", "use", "where", "while",
        ],
        "python" | "py" => &[
            "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
            "elif", "else", "except", "False", "finally", "for", "from", "global", "if",
            "import", "in", "is", "lambda", "None", "not", "or", "pass", "raise", "return",
            "True", "try", "while", "with", "yield",
        ],
        "javascript" | "js" | "typescript" | "ts" => &[
            "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
            "else", "export", "extends", "false", "finally", "for", "function", "if", "import",
            "in", "instanceof", "interface", "let", "new", "null", "return", "switch", "this",
            "throw", "true", "try", "type", "typeof", "undefined", "var", "while", "yield",
        ],
        "go" => &[
            "break", "case", "chan", "const", "continue", "default", "defer", "else", "false",
            "for", "func", "go", "if", "import", "interface", "map", "nil", "package", "range",
            "return", "select", "struct", "switch", "true", "type", "var",
        ],
        _ => &[],
    }
}

fn line_comment_prefix(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "python" | "py" | "shell" | "sh" | "bash" | "ruby" | "rb" | "toml" | "yaml" => "#",
        "sql" | "lua" | "haskell" => "--",
        _ => "//",
    }
}

impl SyntaxTokenizer for KeywordTokenizer {
    fn tokenize(&self, line: &str, language: &str) -> Vec<SyntaxToken> {
        let kw = keywords(language);
        let comment = line_comment_prefix(language);
        let mut out: Vec<SyntaxToken> = Vec::new();
        let mut push = |kind: TokenKind, text: &str| {
            if text.is_empty() {
                return;
            }
            if let Some(last) = out.last_mut()
                && last.kind == kind
                && matches!(kind, TokenKind::Plain | TokenKind::Punctuation)
            {
                last.text.push_str(text);
                return;
            }
            out.push(SyntaxToken::new(kind, text));
        };

        let mut rest = line;
        while !rest.is_empty() {
            if rest.starts_with(comment) {
                push(TokenKind::Comment, rest);
                break;
            }

            let Some(c) = rest.chars().next() else {
                break;
            };
            let len = if c == '"' || c == '\'' {
                let body = &rest[c.len_utf8()..];
                let close = find_string_end(body, c);
                let len = c.len_utf8() + close;
                push(TokenKind::String, &rest[..len]);
                len
            } else if c.is_ascii_digit() {
                let len = rest
                    .char_indices()
                    .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '.'))
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                push(TokenKind::Number, &rest[..len]);
                len
            } else if c.is_alphabetic() || c == '_' {
                let len = rest
                    .char_indices()
                    .find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '_'))
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                let word = &rest[..len];
                let kind = if kw.contains(&word) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Plain
                };
                push(kind, word);
                len
            } else if c.is_whitespace() {
                let len = rest
                    .char_indices()
                    .find(|(_, ch)| !ch.is_whitespace())
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                push(TokenKind::Plain, &rest[..len]);
                len
            } else {
                push(TokenKind::Punctuation, &rest[..c.len_utf8()]);
                c.len_utf8()
            };
            rest = &rest[len..];
        }
        out
    }
}

// Byte length of a string body up to and including the closing quote (or the rest of the line).
fn find_string_end(body: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, ch) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == quote {
            return i + ch.len_utf8();
        }
    }
    body.len()
}

#[cfg(test)]
#[path = "../../tests/unit/code/tokenize.rs"]
mod tests;
