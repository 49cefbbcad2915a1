//! Recursive-descent parser building the syntax tree directly from tokens.
//! Fail-fast: the first mismatch aborts the parse with a [`ParseError`]
//! pinned to the offending token.

use std::collections::HashSet;

use crate::ast::{ImportDeclaration, Root};
use crate::error::ParseError;
use crate::token::{Category, Location, Token, TokenKind};

mod declarations;
mod expressions;
mod inputs;

/// Deepest expression or input-block nesting accepted before the parse is
/// abandoned; keeps recursion well inside a default thread stack.
const MAX_NESTING: usize = 128;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    /// Token stream with comments removed.
    tokens: Vec<&'a Token>,
    pos: usize,
    filename: String,
    /// Returned once the stream is exhausted, even if it lacked an `Eof`.
    eof: Token,
    /// Names brought in by `import`; calls to them become import calls.
    imported: HashSet<String>,
    /// Current recursion depth, bounded by [`MAX_NESTING`].
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], filename: &str) -> Self {
        let eof_location = tokens.last().map_or(Location::new(1, 1), |t| t.location);
        Parser {
            tokens: tokens.iter().filter(|t| !t.is(TokenKind::Comment)).collect(),
            pos: 0,
            filename: filename.to_owned(),
            eof: Token::new(TokenKind::Eof, "", eof_location),
            imported: HashSet::new(),
            depth: 0,
        }
    }

    fn cur(&self) -> &Token {
        self.tokens.get(self.pos).copied().unwrap_or(&self.eof)
    }

    fn peek(&self) -> TokenKind {
        self.cur().kind
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let t = self.cur().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(&self.filename, self.cur(), msg)
    }

    fn got(&self) -> String {
        self.cur().describe()
    }

    /// Consume a token of the given kind or fail with a message naming it.
    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek() == kind {
            return Ok(self.advance());
        }
        let meta = kind.metadata();
        let name = meta.display.unwrap_or("token");
        let msg = match meta.category {
            Category::Keyword | Category::TypeKeyword => {
                format!("Missing '{}' keyword, but got {}", name, self.got())
            }
            _ => format!("Missing '{}', but got {}", name, self.got()),
        };
        Err(self.err(msg))
    }

    /// Consume a `:name` symbol and return the bare name.
    fn expect_symbol(&mut self) -> Result<String, ParseError> {
        if self.peek() == TokenKind::Symbol {
            return Ok(self.advance().raw);
        }
        let msg = if self.cur().is_word() {
            format!("Missing ':' before symbol, but got {}", self.got())
        } else {
            format!("Expected a symbol like :name, but got {}", self.got())
        };
        Err(self.err(msg))
    }

    /// Enter one level of nesting; pair with [`Parser::ascend`].
    fn descend(&mut self, what: &str) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.err(format!("{} is nested too deeply", what)));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn int_value(&self, token: &Token) -> Result<i64, ParseError> {
        token.raw.replace('_', "").parse::<i64>().map_err(|_| {
            ParseError::new(
                &self.filename,
                token,
                format!("Integer literal {} is out of range", token.raw),
            )
        })
    }

    fn float_value(&self, token: &Token) -> Result<f64, ParseError> {
        token.raw.replace('_', "").parse::<f64>().map_err(|_| {
            ParseError::new(
                &self.filename,
                token,
                format!("Invalid float literal {}", token.raw),
            )
        })
    }

    // -- Schema ---------------------------------------------------

    fn parse_schema(&mut self) -> Result<Root, ParseError> {
        self.expect(TokenKind::Schema)?;
        self.expect(TokenKind::Do)?;

        let mut root = Root::default();
        while self.peek() == TokenKind::Import {
            let import = self.parse_import()?;
            root.imports.push(import);
        }

        root.inputs = self.parse_input_block()?;

        loop {
            match self.peek() {
                TokenKind::Value => root.values.push(self.parse_value(false)?),
                TokenKind::Let => root.values.push(self.parse_value(true)?),
                TokenKind::Trait => root.traits.push(self.parse_trait()?),
                TokenKind::End => break,
                TokenKind::Eof => return Err(self.err("Missing 'end' keyword to close the schema")),
                TokenKind::Input => {
                    return Err(self.err(
                        "Only one input block is allowed and it must come before value and trait declarations",
                    ))
                }
                TokenKind::Import => {
                    return Err(self.err("Imports must come before the input block"))
                }
                _ => {
                    return Err(self.err(format!(
                        "Expected 'value', 'trait', 'let' or 'end', but got {}",
                        self.got()
                    )))
                }
            }
        }
        self.expect(TokenKind::End)?;

        if self.peek() != TokenKind::Eof {
            return Err(self.err(format!(
                "Unexpected {} after the end of the schema",
                self.got()
            )));
        }
        Ok(root)
    }

    // -- Imports --------------------------------------------------

    fn parse_import(&mut self) -> Result<ImportDeclaration, ParseError> {
        let loc = self.advance().location;
        let mut names = vec![self.expect_symbol()?];
        while self.peek() == TokenKind::Comma {
            self.advance();
            if self.peek() == TokenKind::Label {
                break;
            }
            names.push(self.expect_symbol()?);
        }

        if !(self.peek() == TokenKind::Label && self.cur().raw == "from") {
            return Err(self.err(format!(
                "Missing 'from:' module in import, but got {}",
                self.got()
            )));
        }
        self.advance();
        if self.peek() != TokenKind::Constant {
            return Err(self.err(format!(
                "Expected a module path like Shared::Tax after 'from:', but got {}",
                self.got()
            )));
        }
        let module = self.advance().raw;

        self.imported.extend(names.iter().cloned());
        Ok(ImportDeclaration { names, module, loc })
    }
}

/// Parse a token stream produced by [`crate::lexer::tokenize`].
pub fn parse(tokens: &[Token], filename: &str) -> Result<Root, ParseError> {
    let mut p = Parser::new(tokens, filename);
    p.parse_schema()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;
    use crate::lexer;

    pub(super) fn parse_src(src: &str) -> Result<Root, ParseError> {
        let tokens = lexer::tokenize(src, "test.cascade").expect("lex");
        parse(&tokens, "test.cascade")
    }

    pub(super) fn parse_ok(src: &str) -> Root {
        parse_src(src).unwrap_or_else(|e| panic!("parse failed: {}", e))
    }

    pub(super) fn parse_err(src: &str) -> ParseError {
        match parse_src(src) {
            Ok(root) => panic!("expected a parse error, got {:?}", root),
            Err(e) => e,
        }
    }

    /// Expression of a single value declared in an otherwise empty schema.
    pub(super) fn value_expr(expr_src: &str) -> Expression {
        let src = format!("schema do\n  input do\n  end\n  value :v, {}\nend\n", expr_src);
        parse_ok(&src).values.remove(0).expression
    }

    #[test]
    fn minimal_schema() {
        let root = parse_ok("schema do input do end end");
        assert!(root.inputs.is_empty());
        assert!(root.values.is_empty());
        assert!(root.traits.is_empty());
    }

    #[test]
    fn missing_do_after_schema() {
        let err = parse_err("schema input do end end");
        assert_eq!(err.message, "Missing 'do' keyword, but got \"input\"");
        assert_eq!(err.location().column, 8);
    }

    #[test]
    fn missing_final_end() {
        let err = parse_err("schema do input do end value :a, 1");
        assert!(err.message.contains("Missing 'end' keyword"), "{}", err.message);
        assert_eq!(err.token.kind, TokenKind::Eof);
    }

    #[test]
    fn trailing_tokens_after_schema() {
        let err = parse_err("schema do input do end end value");
        assert!(err.message.contains("after the end of the schema"));
    }

    #[test]
    fn comments_are_skipped() {
        let root = parse_ok(
            "# pricing\nschema do # top\n input do\n integer :x # qty\n end\n value :y, input.x # total\nend\n# eof",
        );
        assert_eq!(root.inputs.len(), 1);
        assert_eq!(root.values.len(), 1);
    }

    #[test]
    fn declaration_order_is_preserved() {
        let root = parse_ok(
            "schema do input do end value :b, 1 trait :t, true value :a, 2 let :c, 3 trait :s, false end",
        );
        let values: Vec<_> = root.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(values, ["b", "a", "c"]);
        let traits: Vec<_> = root.traits.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(traits, ["t", "s"]);
        assert!(root.values[2].inline);
        assert!(!root.values[0].inline);
    }

    #[test]
    fn value_before_input_block_is_rejected() {
        let err = parse_err("schema do value :a, 1 input do end end");
        assert!(err.message.contains("Missing 'input' keyword"), "{}", err.message);
    }

    #[test]
    fn second_input_block_is_rejected() {
        let err = parse_err("schema do input do end input do end end");
        assert!(err.message.contains("Only one input block"));
    }

    #[test]
    fn imports_are_collected() {
        let root = parse_ok(
            "schema do\n import :tax, :discount, from: Shared::Pricing\n import :fee, from: Fees\n input do end\nend",
        );
        assert_eq!(root.imports.len(), 2);
        assert_eq!(root.imports[0].names, ["tax", "discount"]);
        assert_eq!(root.imports[0].module, "Shared::Pricing");
        assert_eq!(root.imports[0].loc.line, 2);
        assert_eq!(root.imports[1].module, "Fees");
    }

    #[test]
    fn import_requires_from() {
        let err = parse_err("schema do import :tax input do end end");
        assert!(err.message.contains("from:"), "{}", err.message);
    }

    #[test]
    fn import_after_input_block_is_rejected() {
        let err = parse_err("schema do input do end import :a, from: A end");
        assert!(err.message.contains("before the input block"));
    }

    #[test]
    fn token_slice_without_eof_does_not_panic() {
        let tokens = lexer::tokenize("schema do", "t").unwrap();
        let err = parse(&tokens[..2], "t").unwrap_err();
        assert_eq!(err.token.kind, TokenKind::Eof);
        assert!(parse(&[], "t").is_err());
    }
}
