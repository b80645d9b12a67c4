//! Parser adapter: SQL text -> token stream + rule-kinded parse tree.
//!
//! Grammar validation is delegated to `sqlparser` (SQLite dialect). The tree is a
//! concrete tree laid over the token stream: SELECT cores, parenthesized groups and
//! the literal / boolean / quoted-name leaves that the normalization passes act on.
//! Every node spans an inclusive `[start, stop]` range of token indices.

use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token as SqlToken, TokenWithLocation, Tokenizer};

use super::errors::QueryAstError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    /// Double-quoted identifier (`"name"`).
    QuotedName,
    Literal,
    Placeholder,
    OpenParen,
    CloseParen,
    Punct,
    /// Statement separator `;`.
    Terminator,
    /// Whitespace and comments.
    Trivia,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub index: usize,
    /// Display text. Masking passes overwrite this in place.
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    /// Whether the token contributes to rebuilt canonical text.
    pub fn renders(&self) -> bool {
        !matches!(self.kind, TokenKind::Trivia | TokenKind::Terminator | TokenKind::Eof) && !self.text.trim().is_empty()
    }

    fn is_word(&self, word: &str) -> bool { self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(word) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Root,
    SelectCore,
    /// Parenthesized run, parens included.
    Group,
    LiteralValue,
    /// Bare `TRUE` / `FALSE` / `NULL` keyword expression.
    Expr,
    /// Double-quoted name.
    AnyName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    pub kind: RuleKind,
    pub start: usize,
    pub stop: usize,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    fn new(kind: RuleKind, start: usize, stop: usize, children: Vec<ParseNode>) -> Self { Self { kind, start, stop, children } }

    fn span<'t>(&self, tokens: &'t [Token]) -> &'t [Token] { tokens.get(self.start..=self.stop).unwrap_or(&[]) }

    /// Concatenated text of the significant tokens in the span (no separators).
    pub fn text(&self, tokens: &[Token]) -> String {
        self.span(tokens).iter().filter(|t| t.kind != TokenKind::Trivia).map(|t| t.text.as_str()).collect()
    }

    /// Source text of the span: non-blank tokens joined with single spaces, whitespace collapsed.
    pub fn source_text(&self, tokens: &[Token]) -> String {
        let joined = self.span(tokens)
            .iter()
            .filter(|t| t.kind != TokenKind::Trivia && !t.text.trim().is_empty())
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        joined.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// True when any SELECT core exists anywhere below this node.
    pub fn has_nested_select(&self) -> bool {
        self.children.iter().any(|c| c.kind == RuleKind::SelectCore || c.has_nested_select())
    }
}

#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub tokens: Vec<Token>,
    pub tree: ParseNode,
}

/// Parse a single SQL statement. Each call yields an independent token stream.
pub fn parse(sql: &str) -> Result<ParsedQuery, QueryAstError> {
    let dialect = SQLiteDialect {};
    let statements = Parser::parse_sql(&dialect, sql)?;
    match statements.len() {
        0 => return Err(QueryAstError::Unsupported("empty statement")),
        1 => {}
        _ => return Err(QueryAstError::Unsupported("multi-statement")),
    }
    let located = Tokenizer::new(&dialect, sql).tokenize_with_location()?;
    let tokens = build_token_stream(sql, &located);
    let tree = TreeBuilder { tokens: &tokens, pos: 0 }.build();
    Ok(ParsedQuery { tokens, tree })
}

fn build_token_stream(sql: &str, located: &[TokenWithLocation]) -> Vec<Token> {
    let offsets = token_offsets(sql, located);
    let mut tokens = Vec::with_capacity(located.len() + 1);
    for (index, item) in located.iter().enumerate() {
        let start = offsets[index];
        let end = offsets.get(index + 1).copied().unwrap_or(sql.len()).max(start);
        // verbatim slice keeps quoting and escapes exactly as written
        let text = sql.get(start..end).map(str::to_string).unwrap_or_else(|| item.token.to_string());
        tokens.push(Token { index, text, kind: classify(&item.token) });
    }
    tokens.push(Token { index: tokens.len(), text: String::new(), kind: TokenKind::Eof });
    tokens
}

/// Byte offset of every token start. Mirrors the tokenizer's line/column counting
/// (1-based, one column per char, `\n` starts a new line).
fn token_offsets(sql: &str, located: &[TokenWithLocation]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(located.len());
    let mut chars = sql.char_indices().peekable();
    let (mut line, mut column) = (1u64, 1u64);
    for item in located {
        let target = (item.location.line, item.location.column);
        while (line, column) < target {
            match chars.next() {
                Some((_, '\n')) => { line += 1; column = 1; }
                Some(_) => column += 1,
                None => break,
            }
        }
        offsets.push(chars.peek().map(|(i, _)| *i).unwrap_or(sql.len()));
    }
    offsets
}

fn classify(token: &SqlToken) -> TokenKind {
    match token {
        SqlToken::Whitespace(_) => TokenKind::Trivia,
        SqlToken::SemiColon => TokenKind::Terminator,
        SqlToken::LParen => TokenKind::OpenParen,
        SqlToken::RParen => TokenKind::CloseParen,
        SqlToken::Placeholder(_) => TokenKind::Placeholder,
        SqlToken::Word(w) if w.quote_style == Some('"') => TokenKind::QuotedName,
        SqlToken::Word(_) => TokenKind::Word,
        SqlToken::Number(_, _)
        | SqlToken::SingleQuotedString(_)
        | SqlToken::DoubleQuotedString(_)
        | SqlToken::NationalStringLiteral(_)
        | SqlToken::EscapedStringLiteral(_)
        | SqlToken::HexStringLiteral(_)
        | SqlToken::SingleQuotedByteStringLiteral(_)
        | SqlToken::DollarQuotedString(_) => TokenKind::Literal,
        SqlToken::EOF => TokenKind::Eof,
        _ => TokenKind::Punct,
    }
}

/// Keywords that end a SELECT core at its own nesting depth.
const SELECT_CORE_BOUNDARIES: &[&str] = &["UNION", "INTERSECT", "EXCEPT", "ORDER", "LIMIT"];

/// Keyword literals that stand for a value rather than an expression.
const KEYWORD_LITERALS: &[&str] = &["CURRENT_TIME", "CURRENT_DATE", "CURRENT_TIMESTAMP"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope { Root, Group, Select }

struct TreeBuilder<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self) -> ParseNode {
        let (children, _) = self.items(Scope::Root);
        ParseNode::new(RuleKind::Root, 0, self.tokens.len().saturating_sub(1), children)
    }

    /// Consume tokens until the scope closes. Returns the child nodes and the
    /// index of the last significant token consumed.
    fn items(&mut self, scope: Scope) -> (Vec<ParseNode>, Option<usize>) {
        let tokens = self.tokens;
        let mut children = Vec::new();
        let mut last = None;
        while let Some(token) = tokens.get(self.pos) {
            let index = self.pos;
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Trivia => { self.pos += 1; continue; }
                _ => {}
            }
            if closes(scope, token) { break; }
            match token.kind {
                TokenKind::OpenParen => {
                    self.pos += 1;
                    let (inner, inner_last) = self.items(Scope::Group);
                    let stop = match tokens.get(self.pos) {
                        Some(close) if close.kind == TokenKind::CloseParen => { self.pos += 1; close.index }
                        _ => inner_last.unwrap_or(index),
                    };
                    children.push(ParseNode::new(RuleKind::Group, index, stop, inner));
                    last = Some(stop);
                }
                TokenKind::Word if token.is_word("SELECT") => {
                    self.pos += 1;
                    let (inner, inner_last) = self.items(Scope::Select);
                    let stop = inner_last.unwrap_or(index);
                    children.push(ParseNode::new(RuleKind::SelectCore, index, stop, inner));
                    last = Some(stop);
                }
                TokenKind::Word if ["TRUE", "FALSE", "NULL"].iter().any(|kw| token.is_word(kw)) => {
                    children.push(self.leaf(RuleKind::Expr, index));
                    last = Some(index);
                }
                TokenKind::Word if KEYWORD_LITERALS.iter().any(|kw| token.is_word(kw)) => {
                    children.push(self.leaf(RuleKind::LiteralValue, index));
                    last = Some(index);
                }
                TokenKind::Literal => {
                    children.push(self.leaf(RuleKind::LiteralValue, index));
                    last = Some(index);
                }
                TokenKind::QuotedName => {
                    children.push(self.leaf(RuleKind::AnyName, index));
                    last = Some(index);
                }
                _ => {
                    // plain tokens, plus unbalanced `)` at root level
                    self.pos += 1;
                    last = Some(index);
                }
            }
        }
        (children, last)
    }

    fn leaf(&mut self, kind: RuleKind, index: usize) -> ParseNode {
        self.pos += 1;
        ParseNode::new(kind, index, index, Vec::new())
    }
}

fn closes(scope: Scope, token: &Token) -> bool {
    match scope {
        Scope::Root => false,
        Scope::Group => token.kind == TokenKind::CloseParen,
        Scope::Select => {
            matches!(token.kind, TokenKind::CloseParen | TokenKind::Terminator)
                || SELECT_CORE_BOUNDARIES.iter().any(|kw| token.is_word(kw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selects(node: &ParseNode, out: &mut Vec<(usize, usize)>) {
        if node.kind == RuleKind::SelectCore { out.push((node.start, node.stop)); }
        for c in &node.children { selects(c, out); }
    }

    #[test]
    fn token_text_is_verbatim_source() {
        let sql = "SELECT  name\nFROM users WHERE note = 'it''s'";
        let parsed = parse(sql).expect("parse");
        let rebuilt: String = parsed.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rebuilt, sql);
        assert!(parsed.tokens.iter().any(|t| t.text == "'it''s'" && t.kind == TokenKind::Literal));
        assert_eq!(parsed.tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn token_indices_are_positional() {
        let parsed = parse("SELECT a FROM b").expect("parse");
        for (i, t) in parsed.tokens.iter().enumerate() { assert_eq!(t.index, i); }
    }

    #[test]
    fn select_core_stops_before_order_by() {
        let parsed = parse("SELECT a FROM t WHERE a > 1 ORDER BY a LIMIT 3").expect("parse");
        let mut spans = Vec::new();
        selects(&parsed.tree, &mut spans);
        assert_eq!(spans.len(), 1);
        let core = ParseNode::new(RuleKind::SelectCore, spans[0].0, spans[0].1, Vec::new());
        assert_eq!(core.source_text(&parsed.tokens), "SELECT a FROM t WHERE a > 1");
    }

    #[test]
    fn nested_select_inside_group() {
        let parsed = parse("SELECT * FROM users WHERE city_id IN (SELECT id FROM cities)").expect("parse");
        let outer = &parsed.tree.children[0];
        assert_eq!(outer.kind, RuleKind::SelectCore);
        assert!(outer.has_nested_select());
        let mut spans = Vec::new();
        selects(&parsed.tree, &mut spans);
        assert_eq!(spans.len(), 2);
        let inner = ParseNode::new(RuleKind::SelectCore, spans[1].0, spans[1].1, Vec::new());
        assert_eq!(inner.source_text(&parsed.tokens), "SELECT id FROM cities");
    }

    #[test]
    fn union_yields_two_cores() {
        let parsed = parse("SELECT a FROM t UNION SELECT b FROM u").expect("parse");
        let kinds: Vec<RuleKind> = parsed.tree.children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![RuleKind::SelectCore, RuleKind::SelectCore]);
    }

    #[test]
    fn leaves_are_classified() {
        let parsed = parse("SELECT \"Name\" FROM t WHERE flag = TRUE AND x = 'a' AND y IS NULL").expect("parse");
        let core = &parsed.tree.children[0];
        let kinds: Vec<RuleKind> = core.children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![RuleKind::AnyName, RuleKind::Expr, RuleKind::LiteralValue, RuleKind::Expr]);
    }

    #[test]
    fn current_time_keywords_are_literal_values() {
        let parsed = parse("SELECT a FROM t WHERE d = CURRENT_DATE AND ts < current_timestamp").expect("parse");
        let kinds: Vec<RuleKind> = parsed.tree.children[0].children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![RuleKind::LiteralValue, RuleKind::LiteralValue]);
    }

    #[test]
    fn malformed_sql_is_a_parse_error() {
        assert!(matches!(parse("SELECT FROM WHERE"), Err(QueryAstError::Parse(_))));
    }

    #[test]
    fn multiple_statements_rejected() {
        assert_eq!(parse("SELECT 1; SELECT 2").err(), Some(QueryAstError::Unsupported("multi-statement")));
    }
}
