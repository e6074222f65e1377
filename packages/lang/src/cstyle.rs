//! # C-style adapter
//!
//! A brace-structured C-like language: statements terminated by `;`,
//! `if (...) { ... }` and `while` forms, calls, binary expressions, and
//! `{}` bodies as indents. Parsing is a hand-rolled recursive descent
//! over a logos token stream; the resulting tree is normalized through
//! the generic treewalk tables rather than marked directly.
//!
//! A failed parse is retried a bounded number of times, each attempt
//! quoting the offending token into a backtick atom the grammar accepts;
//! the atom surfaces as an error-colored block whose delimiters the
//! assembler strips back out, so the original text still round-trips.
//! Once retries are exhausted the *first* error is surfaced.

use std::collections::HashMap;
use std::ops::Range;

use logos::Logos;
use tracing::debug;
use trellis_common::{LineIndex, TextSpan};
use trellis_markup::{apply_markup, LanguageHooks};
use trellis_model::Document;

use crate::adapter::{Adapter, ParseOptions};
use crate::emit::MarkupBuilder;
use crate::error::{ErrorPos, ParseError};
use crate::treewalk::{mark_tree, LanguageRules, TreeNode};

const MAX_PARSE_RETRIES: usize = 3;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
enum CTok {
    #[token("if")]
    If,
    #[token("while")]
    While,
    #[token("else")]
    Else,
    #[token("__")]
    Placeholder,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    // backtick atoms exist only as parse-recovery patches
    #[regex(r"`[^`\n]*`")]
    ErrorAtom,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    #[regex(r"==|!=|<=|>=|&&|\|\||[-+*/%<>=!]")]
    Op,
}

pub struct CStyleAdapter {
    /// Known function name -> block color. Known callees are protected
    /// from socketing.
    known_functions: HashMap<String, String>,
}

impl Default for CStyleAdapter {
    fn default() -> Self {
        let mut known = HashMap::new();
        known.insert("printf".to_string(), "command".to_string());
        known.insert("puts".to_string(), "command".to_string());
        known.insert("abs".to_string(), "value".to_string());
        Self {
            known_functions: known,
        }
    }
}

impl CStyleAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(mut self, name: impl Into<String>, color: impl Into<String>) -> Self {
        self.known_functions.insert(name.into(), color.into());
        self
    }

    pub fn rules(&self) -> LanguageRules {
        let mut rules = LanguageRules::new("command");
        rules.skips.insert("program".into());
        rules.indents.insert("blockBody".into());
        rules.parens.insert("parenExpression".into());
        for kind in ["identifier", "number", "string"] {
            rules.socket_tokens.insert(kind.into());
        }
        rules.removals.insert("placeholder".into());
        rules.error_strips.insert("errorAtom".into(), (1, 1));

        for (kind, color) in [
            ("ifStatement", "control"),
            ("whileStatement", "control"),
            ("expressionStatement", "command"),
            ("callExpression", "command"),
            ("binaryExpression", "value"),
            ("parenExpression", "value"),
            ("errorAtom", "error"),
        ] {
            rules.colors_forward.insert(kind.into(), color.into());
        }

        let known = self.known_functions.clone();
        rules.should_socket = Some(Box::new(move |parent, leaf, idx| {
            !(parent == "callExpression" && idx == 0 && known.contains_key(leaf.text()))
        }));

        let known = self.known_functions.clone();
        rules.color_for = Some(Box::new(move |node| {
            if node.kind == "callExpression" {
                node.children
                    .first()
                    .and_then(|callee| known.get(callee.text()).cloned())
            } else {
                None
            }
        }));

        rules.paren_rules.insert(
            ("expressionStatement".into(), "callExpression".into()),
            strip_trailing_semicolon,
        );
        rules.paren_rules.insert(
            ("parenExpression".into(), "binaryExpression".into()),
            wrap_in_parens,
        );
        rules
    }
}

/// Dropping a statement into an expression socket loses its terminator.
fn strip_trailing_semicolon(_leading: &mut String, trailing: &mut String) {
    let trimmed = trailing.trim_end();
    if let Some(stripped) = trimmed.strip_suffix(';') {
        *trailing = stripped.to_string();
    }
}

fn wrap_in_parens(leading: &mut String, trailing: &mut String) {
    leading.insert(0, '(');
    trailing.push(')');
}

// ---- recursive descent ------------------------------------------------

struct Parser<'a> {
    src: &'a str,
    index: &'a LineIndex,
    toks: Vec<(CTok, Range<usize>)>,
    pos: usize,
}

type PResult<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    fn new(src: &'a str, index: &'a LineIndex) -> PResult<Self> {
        let mut toks = Vec::new();
        for (tok, span) in CTok::lexer(src).spanned() {
            match tok {
                Ok(t) => toks.push((t, span)),
                Err(()) => {
                    return Err(ParseError::LexError {
                        pos: ErrorPos::at(index, span.start),
                    })
                }
            }
        }
        Ok(Self {
            src,
            index,
            toks,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<CTok> {
        self.toks.get(self.pos).map(|t| t.0)
    }

    fn slice(&self, range: &Range<usize>) -> &'a str {
        &self.src[range.clone()]
    }

    fn span(&self, range: &Range<usize>) -> TextSpan {
        self.index.span(range.clone())
    }

    fn bump(&mut self) -> PResult<(CTok, Range<usize>)> {
        let tok = self
            .toks
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ParseError::eof("token"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, kind: CTok, what: &str) -> PResult<(CTok, Range<usize>)> {
        match self.toks.get(self.pos) {
            Some(&(t, ref range)) if t == kind => {
                let out = (t, range.clone());
                self.pos += 1;
                Ok(out)
            }
            Some(&(_, ref range)) => Err(ParseError::unexpected(
                self.slice(range),
                ErrorPos::at(self.index, range.start),
            )),
            None => Err(ParseError::eof(what)),
        }
    }

    fn unexpected_here(&self) -> ParseError {
        match self.toks.get(self.pos) {
            Some(&(_, ref range)) => ParseError::unexpected(
                self.slice(range),
                ErrorPos::at(self.index, range.start),
            ),
            None => ParseError::eof("expression"),
        }
    }

    fn leaf(&self, kind: &str, range: &Range<usize>) -> TreeNode {
        TreeNode::leaf(kind, self.span(range), self.slice(range))
    }

    fn program(&mut self) -> PResult<TreeNode> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.statement()?);
        }
        let bounds = TextSpan::new(
            self.index.pos(0),
            self.index.pos(self.src.len()),
        );
        Ok(TreeNode::branch("program", bounds, stmts))
    }

    fn statement(&mut self) -> PResult<TreeNode> {
        match self.peek() {
            Some(CTok::If) => self.conditional("ifStatement", CTok::If),
            Some(CTok::While) => self.conditional("whileStatement", CTok::While),
            _ => {
                let expr = self.expression()?;
                let (_, semi) = self.expect(CTok::Semi, "';'")?;
                let bounds = TextSpan::new(expr.bounds.start, self.span(&semi).end);
                Ok(TreeNode::branch(
                    "expressionStatement",
                    bounds,
                    vec![expr, self.leaf("punct", &semi)],
                ))
            }
        }
    }

    fn conditional(&mut self, kind: &str, keyword: CTok) -> PResult<TreeNode> {
        let (_, kw) = self.expect(keyword, "keyword")?;
        let cond = self.paren_expression()?;
        let body = self.block_body()?;
        let mut children = vec![self.leaf("keyword", &kw), cond, body];
        if self.peek() == Some(CTok::Else) {
            let (_, else_kw) = self.bump()?;
            children.push(self.leaf("keyword", &else_kw));
            let alt = if self.peek() == Some(CTok::If) {
                self.conditional("ifStatement", CTok::If)?
            } else {
                self.block_body()?
            };
            children.push(alt);
        }
        let start = self.span(&kw).start;
        let end = children.last().map(|c| c.bounds.end).unwrap_or(start);
        Ok(TreeNode::branch(kind, TextSpan::new(start, end), children))
    }

    fn block_body(&mut self) -> PResult<TreeNode> {
        let (_, open) = self.expect(CTok::LBrace, "'{'")?;
        let mut children = vec![self.leaf("punct", &open)];
        while self.peek().is_some() && self.peek() != Some(CTok::RBrace) {
            children.push(self.statement()?);
        }
        let (_, close) = self.expect(CTok::RBrace, "'}'")?;
        children.push(self.leaf("punct", &close));
        let bounds = TextSpan::new(self.span(&open).start, self.span(&close).end);
        Ok(TreeNode::branch("blockBody", bounds, children))
    }

    fn expression(&mut self) -> PResult<TreeNode> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<TreeNode> {
        let lhs = self.comparison()?;
        if self.peek_op_in(&["="]) {
            let (_, op) = self.bump()?;
            let rhs = self.assignment()?;
            return Ok(self.binary(lhs, &op, rhs));
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> PResult<TreeNode> {
        let mut lhs = self.additive()?;
        while self.peek_op_in(&["==", "!=", "<", ">", "<=", ">=", "&&", "||"]) {
            let (_, op) = self.bump()?;
            let rhs = self.additive()?;
            lhs = self.binary(lhs, &op, rhs);
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> PResult<TreeNode> {
        let mut lhs = self.multiplicative()?;
        while self.peek_op_in(&["+", "-"]) {
            let (_, op) = self.bump()?;
            let rhs = self.multiplicative()?;
            lhs = self.binary(lhs, &op, rhs);
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> PResult<TreeNode> {
        let mut lhs = self.primary()?;
        while self.peek_op_in(&["*", "/", "%"]) {
            let (_, op) = self.bump()?;
            let rhs = self.primary()?;
            lhs = self.binary(lhs, &op, rhs);
        }
        Ok(lhs)
    }

    fn peek_op_in(&self, ops: &[&str]) -> bool {
        match self.toks.get(self.pos) {
            Some(&(CTok::Op, ref range)) => ops.contains(&self.slice(range)),
            _ => false,
        }
    }

    fn binary(&self, lhs: TreeNode, op: &Range<usize>, rhs: TreeNode) -> TreeNode {
        let bounds = TextSpan::new(lhs.bounds.start, rhs.bounds.end);
        TreeNode::branch(
            "binaryExpression",
            bounds,
            vec![lhs, self.leaf("operator", op), rhs],
        )
    }

    fn primary(&mut self) -> PResult<TreeNode> {
        match self.peek() {
            Some(CTok::Number) => {
                let (_, r) = self.bump()?;
                Ok(self.leaf("number", &r))
            }
            Some(CTok::Str) => {
                let (_, r) = self.bump()?;
                Ok(self.leaf("string", &r))
            }
            Some(CTok::Placeholder) => {
                let (_, r) = self.bump()?;
                Ok(self.leaf("placeholder", &r))
            }
            Some(CTok::ErrorAtom) => {
                let (_, r) = self.bump()?;
                Ok(self.leaf("errorAtom", &r))
            }
            Some(CTok::Ident) => {
                let (_, name) = self.bump()?;
                if self.peek() == Some(CTok::LParen) {
                    self.call(&name)
                } else {
                    Ok(self.leaf("identifier", &name))
                }
            }
            Some(CTok::LParen) => self.paren_expression(),
            _ => Err(self.unexpected_here()),
        }
    }

    fn call(&mut self, name: &Range<usize>) -> PResult<TreeNode> {
        let (_, open) = self.expect(CTok::LParen, "'('")?;
        let mut children = vec![self.leaf("identifier", name), self.leaf("punct", &open)];
        if self.peek() != Some(CTok::RParen) {
            loop {
                children.push(self.expression()?);
                if self.peek() == Some(CTok::Comma) {
                    let (_, comma) = self.bump()?;
                    children.push(self.leaf("punct", &comma));
                } else {
                    break;
                }
            }
        }
        let (_, close) = self.expect(CTok::RParen, "')'")?;
        children.push(self.leaf("punct", &close));
        let bounds = TextSpan::new(self.span(name).start, self.span(&close).end);
        Ok(TreeNode::branch("callExpression", bounds, children))
    }

    fn paren_expression(&mut self) -> PResult<TreeNode> {
        let (_, open) = self.expect(CTok::LParen, "'('")?;
        let inner = self.expression()?;
        let (_, close) = self.expect(CTok::RParen, "')'")?;
        let bounds = TextSpan::new(self.span(&open).start, self.span(&close).end);
        Ok(TreeNode::branch(
            "parenExpression",
            bounds,
            vec![self.leaf("punct", &open), inner, self.leaf("punct", &close)],
        ))
    }
}

fn parse_tree(src: &str, index: &LineIndex) -> PResult<TreeNode> {
    Parser::new(src, index)?.program()
}

/// Quote the offending token into a backtick atom so the next attempt
/// can parse past it. Returns `None` when nothing patchable remains.
fn patch_source(src: &str, err: &ParseError) -> Option<String> {
    let (start, end) = match err {
        ParseError::UnexpectedToken { found, pos } => (pos.offset, pos.offset + found.len()),
        ParseError::LexError { pos } => {
            let len = src[pos.offset..].chars().next()?.len_utf8();
            (pos.offset, pos.offset + len)
        }
        _ => return None,
    };
    let bad = src.get(start..end)?;
    if bad.contains('`') {
        return None;
    }
    Some(format!("{}`{}`{}", &src[..start], bad, &src[end..]))
}

impl LanguageHooks for CStyleAdapter {
    fn is_comment(&self, text: &str) -> bool {
        let trimmed = text.trim_start();
        trimmed.starts_with("//") || trimmed.starts_with("/*")
    }

    fn parse_comment(&self, text: &str) -> Vec<Range<usize>> {
        let trimmed = text.trim_start();
        let ws = text.len() - trimmed.len();
        if let Some(payload) = trimmed.strip_prefix("//") {
            let start = ws + 2 + (payload.len() - payload.trim_start().len());
            if start < text.len() {
                return vec![start..text.len()];
            }
        }
        Vec::new()
    }

    fn block_comment_markers(&self) -> Option<(&str, &str)> {
        Some(("/*", "*/"))
    }

    fn default_selection_range(&self, text: &str) -> Range<usize> {
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            1..text.len() - 1
        } else {
            0..text.len()
        }
    }

    fn fix_string(&self, text: &str) -> String {
        if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
            let inner = &text[1..text.len() - 1];
            format!("\"{}\"", inner.replace('"', "\\\""))
        } else {
            text.to_string()
        }
    }
}

impl Adapter for CStyleAdapter {
    fn name(&self) -> &'static str {
        "cstyle"
    }

    fn parse(&self, text: &str, opts: &ParseOptions) -> Result<Document, ParseError> {
        debug!(adapter = "cstyle", bytes = text.len(), "parse");
        let mut attempt = text.to_string();
        let mut first_err: Option<ParseError> = None;

        for retry in 0..=MAX_PARSE_RETRIES {
            let index = LineIndex::new(&attempt);
            match parse_tree(&attempt, &index) {
                Ok(tree) => {
                    if retry > 0 {
                        debug!(retry, "parse recovered");
                    }
                    let mut builder = MarkupBuilder::new();
                    mark_tree(&self.rules(), &attempt, &tree, &mut builder);
                    let regions = builder.finish();
                    return Ok(apply_markup(
                        &attempt,
                        &regions,
                        self,
                        &opts.assemble_options(),
                    )?);
                }
                Err(err) => {
                    let patched = patch_source(&attempt, &err);
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                    match patched {
                        Some(p) => attempt = p,
                        None => break,
                    }
                }
            }
        }
        Err(first_err.unwrap_or_else(|| ParseError::eof("statement")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Document {
        CStyleAdapter::new()
            .parse(text, &ParseOptions::default())
            .unwrap()
    }

    #[test]
    fn test_statement_round_trip() {
        let text = "printf(\"hi\");";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_if_with_body_round_trip() {
        let text = "if (x > 1) {\n  puts(x);\n}";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        let indents = doc
            .container_ids()
            .filter(|&id| doc.container(id).is_indent())
            .count();
        assert_eq!(indents, 1);
    }

    #[test]
    fn test_else_chain_round_trip() {
        let text = "if (x) {\n  puts(x);\n} else {\n  puts(y);\n}";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_paren_elision_flags_wrapped_block() {
        let text = "(x + 1) * 2;";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        let wrapped = doc
            .container_ids()
            .filter(|&id| {
                doc.container(id)
                    .block()
                    .map_or(false, |b| b.paren_wrapped)
            })
            .count();
        assert_eq!(wrapped, 1);
    }

    #[test]
    fn test_known_callee_not_socketed() {
        let doc = parse("printf(x);");
        // x is socketed; the printf callee is not
        let sockets_with_text: Vec<String> = doc
            .container_ids()
            .filter(|&id| doc.container(id).is_socket())
            .filter_map(|id| doc.container_contents(id))
            .map(|list| doc.stringify_list(list))
            .collect();
        assert!(sockets_with_text.iter().any(|s| s == "x"));
        assert!(!sockets_with_text.iter().any(|s| s == "printf"));
    }

    #[test]
    fn test_line_comment_wrapped() {
        let text = "// setup\nputs(x);";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        let comment_blocks = doc
            .container_ids()
            .filter(|&id| {
                let c = doc.container(id);
                c.block().map_or(false, |b| b.classes.contains("comment"))
            })
            .count();
        assert_eq!(comment_blocks, 1);
    }

    #[test]
    fn test_recovery_surfaces_error_block() {
        // '@' cannot lex; recovery quotes it and strips the quotes back
        // out, leaving the text intact and an error-colored region
        let text = "puts(@);";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        let error_blocks = doc
            .container_ids()
            .filter(|&id| {
                let c = doc.container(id);
                c.block().map_or(false, |b| b.color == "error")
            })
            .count();
        assert!(error_blocks >= 1);
    }

    #[test]
    fn test_unrecoverable_input_surfaces_first_error() {
        let err = CStyleAdapter::new()
            .parse("if (", &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_paren_rewrite_rules() {
        let rules = CStyleAdapter::new().rules();
        let mut leading = String::new();
        let mut trailing = "f(x);".to_string();
        assert!(rules.rewrite_parens(
            "expressionStatement",
            "callExpression",
            &mut leading,
            &mut trailing
        ));
        assert_eq!(trailing, "f(x)");
    }
}
