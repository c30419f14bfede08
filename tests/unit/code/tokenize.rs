use super::*;

fn joined(tokens: &[SyntaxToken]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

#[test]
fn plain_tokenizer_returns_whole_line() {
    let t = PlainTokenizer.tokenize("let x = 1;", "rust");
    assert_eq!(t, vec![SyntaxToken::new(TokenKind::Plain, "let x = 1;")]);
    assert!(PlainTokenizer.tokenize("", "rust").is_empty());
}

#[test]
fn keyword_tokenizer_classifies_rust_line() {
    let line = r#"    let name = "a \"b\""; // greet 42"#;
    let tokens = KeywordTokenizer.tokenize(line, "rust");
    assert_eq!(joined(&tokens), line);

    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert!(kinds.contains(&TokenKind::Keyword));
    assert!(kinds.contains(&TokenKind::String));
    assert_eq!(tokens.last().unwrap().kind, TokenKind::Comment);
    assert_eq!(tokens.last().unwrap().text, "// greet 42");
}

#[test]
fn keyword_tokenizer_uses_language_comment_prefix() {
    let tokens = KeywordTokenizer.tokenize("x = 3  # note", "python");
    assert_eq!(tokens.last().unwrap().text, "# note");
    assert!(
        tokens
            .iter()
            .any(|t| t.kind == TokenKind::Number && t.text == "3")
    );
}

#[test]
fn unknown_language_has_no_keywords_but_round_trips() {
    let line = "fn main() { return 1; }";
    let tokens = KeywordTokenizer.tokenize(line, "unknown");
    assert_eq!(joined(&tokens), line);
    assert!(tokens.iter().all(|t| t.kind != TokenKind::Keyword));
}

#[test]
fn unterminated_string_runs_to_end_of_line() {
    let tokens = KeywordTokenizer.tokenize("print('oops", "python");
    assert_eq!(tokens.last().unwrap().kind, TokenKind::String);
    assert_eq!(tokens.last().unwrap().text, "'oops");
}
