use super::Parser;
use crate::ast::{Expression, Literal};
use crate::error::ParseError;
use crate::token::{Associativity, TokenKind};

/// Keyword arguments in source order.
type KeywordArgs = Vec<(String, Expression)>;

impl<'a> Parser<'a> {
    // -- Binary operators -----------------------------------------

    pub(super) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary(0)
    }

    /// Precedence climbing over the operator metadata table.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        self.descend("Expression")?;
        let expr = self.parse_binary_operands(min_precedence);
        self.ascend();
        expr
    }

    fn parse_binary_operands(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_postfix()?;
        loop {
            let meta = self.cur().metadata();
            if !meta.is_binary_operator() || meta.precedence < min_precedence {
                break;
            }
            let Some(function) = meta.function else {
                break;
            };
            self.advance();
            let next_min = match meta.associativity {
                Some(Associativity::Right) => meta.precedence,
                _ => meta.precedence + 1,
            };
            let right = self.parse_binary(next_min)?;
            left = Expression::call(function, vec![left, right]);
        }
        // The lexer folds `-1` into a literal, so `a-1` arrives as two operands.
        let tok = self.cur();
        if matches!(tok.kind, TokenKind::Integer | TokenKind::Float) && tok.raw.starts_with('-') {
            return Err(self.err(format!(
                "Unexpected {} after an expression; put a space after '-' to subtract (as in a - 1)",
                self.got()
            )));
        }
        Ok(left)
    }

    /// A primary followed by any number of `[index]` suffixes.
    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;
        while self.peek() == TokenKind::LBracket {
            self.advance();
            let index = self.parse_expression()?;
            self.expect(TokenKind::RBracket)?;
            expr = Expression::call("at", vec![expr, index]);
        }
        Ok(expr)
    }

    // -- Primaries ------------------------------------------------

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let tok = self.cur().clone();
        match tok.kind {
            TokenKind::Integer => {
                self.advance();
                Ok(Expression::int(self.int_value(&tok)?))
            }
            TokenKind::Float => {
                self.advance();
                Ok(Expression::float(self.float_value(&tok)?))
            }
            TokenKind::String => {
                self.advance();
                Ok(Expression::string(tok.raw))
            }
            TokenKind::Boolean => {
                self.advance();
                Ok(Expression::boolean(tok.raw == "true"))
            }
            TokenKind::Symbol => {
                self.advance();
                Ok(Expression::symbol(tok.raw))
            }
            // Literal negatives were folded by the lexer; this is `-expr`.
            TokenKind::Subtract => {
                self.advance();
                self.descend("Expression")?;
                let operand = self.parse_postfix();
                self.ascend();
                Ok(Expression::call("subtract", vec![Expression::int(0), operand?]))
            }
            TokenKind::Input => self.parse_input_reference(),
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::Fn => self.parse_fn_call(),
            TokenKind::IndexType if self.peek_at(1) == TokenKind::LParen => {
                self.advance();
                self.advance();
                let name = self.expect_symbol()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expression::IndexReference { name })
            }
            TokenKind::Constant => {
                if tok.raw == "Float::INFINITY" {
                    self.advance();
                    Ok(Expression::float(f64::INFINITY))
                } else {
                    Err(self.err(format!("Unknown constant {}", tok.raw)))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),
            _ => Err(self.err(format!("Expected an expression, but got {}", self.got()))),
        }
    }

    /// `input.a` or `input.a.b.c`.
    fn parse_input_reference(&mut self) -> Result<Expression, ParseError> {
        self.advance();
        if self.peek() != TokenKind::Dot {
            return Err(self.err(format!(
                "Missing '.' after 'input' (as in input.field), but got {}",
                self.got()
            )));
        }
        let mut path = Vec::new();
        while self.peek() == TokenKind::Dot {
            self.advance();
            if !self.cur().is_word() {
                return Err(self.err(format!(
                    "Expected a field name after '.', but got {}",
                    self.got()
                )));
            }
            path.push(self.advance().raw);
        }
        if path.len() == 1 {
            let name = path.remove(0);
            Ok(Expression::InputReference { name })
        } else {
            Ok(Expression::InputElementReference { path })
        }
    }

    /// Bare name, `ref(:name)`, an imported call, or an ordinary call.
    fn parse_identifier(&mut self) -> Result<Expression, ParseError> {
        let name = self.advance().raw;
        if self.peek() != TokenKind::LParen {
            return Ok(Expression::DeclarationReference { name });
        }
        self.advance();

        if name == "ref" {
            let target = self.expect_symbol()?;
            self.expect(TokenKind::RParen)?;
            return Ok(Expression::DeclarationReference { name: target });
        }

        if self.imported.contains(&name) {
            let args = self.parse_keyword_arguments(&name)?;
            return Ok(Expression::ImportCall { name, args });
        }

        let (args, opts) = self.parse_arguments()?;
        Ok(Expression::Call {
            function: name,
            args,
            opts,
        })
    }

    /// `fn(:name, args..., key: value...)`
    fn parse_fn_call(&mut self) -> Result<Expression, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let function = self.expect_symbol()?;
        let (args, opts) = if self.peek() == TokenKind::Comma {
            self.advance();
            self.parse_arguments()?
        } else {
            self.expect(TokenKind::RParen)?;
            (Vec::new(), Vec::new())
        };
        Ok(Expression::Call {
            function,
            args,
            opts,
        })
    }

    // -- Argument lists -------------------------------------------

    /// Arguments up to and including `)`. Positional arguments come first.
    fn parse_arguments(&mut self) -> Result<(Vec<Expression>, KeywordArgs), ParseError> {
        let mut args = Vec::new();
        let mut opts: KeywordArgs = Vec::new();
        while self.peek() != TokenKind::RParen {
            if self.peek() == TokenKind::Label {
                let (key, value) = self.parse_keyword_argument(&opts)?;
                opts.push((key, value));
            } else if !opts.is_empty() {
                return Err(self.err(format!(
                    "Positional arguments must come before keyword arguments, but got {}",
                    self.got()
                )));
            } else {
                args.push(self.parse_expression()?);
            }
            if self.peek() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok((args, opts))
    }

    /// Keyword-only arguments of an imported function, up to `)`.
    fn parse_keyword_arguments(&mut self, function: &str) -> Result<KeywordArgs, ParseError> {
        let mut args: KeywordArgs = Vec::new();
        while self.peek() != TokenKind::RParen {
            if self.peek() != TokenKind::Label {
                return Err(self.err(format!(
                    "Imported function '{}' takes keyword arguments only (like name: value), but got {}",
                    function,
                    self.got()
                )));
            }
            let (key, value) = self.parse_keyword_argument(&args)?;
            args.push((key, value));
            if self.peek() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_keyword_argument(
        &mut self,
        seen: &KeywordArgs,
    ) -> Result<(String, Expression), ParseError> {
        if seen.iter().any(|(k, _)| *k == self.cur().raw) {
            return Err(self.err(format!("Duplicate keyword argument '{}:'", self.cur().raw)));
        }
        let key = self.advance().raw;
        let value = self.parse_expression()?;
        Ok((key, value))
    }

    // -- Collection literals --------------------------------------

    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        self.advance();
        let mut elements = Vec::new();
        while self.peek() != TokenKind::RBracket {
            elements.push(self.parse_expression()?);
            if self.peek() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expression::Array { elements })
    }

    /// `{ key: v, "k" => v, :k => v }`. Each pair picks its own key style.
    fn parse_hash_literal(&mut self) -> Result<Expression, ParseError> {
        self.advance();
        let mut pairs = Vec::new();
        while self.peek() != TokenKind::RBrace {
            let tok = self.cur().clone();
            let key = match tok.kind {
                TokenKind::Label => {
                    self.advance();
                    Expression::symbol(tok.raw)
                }
                TokenKind::String | TokenKind::Symbol => {
                    self.advance();
                    if self.peek() != TokenKind::Arrow {
                        return Err(self.err(format!(
                            "Missing '=>' after hash key {}, but got {}",
                            tok.describe(),
                            self.got()
                        )));
                    }
                    self.advance();
                    let value = if tok.kind == TokenKind::String {
                        Literal::String(tok.raw)
                    } else {
                        Literal::Symbol(tok.raw)
                    };
                    Expression::literal(value)
                }
                _ => {
                    return Err(self.err(format!(
                        "Expected a hash key (key:, \"key\" => or :key =>), but got {}",
                        self.got()
                    )))
                }
            };
            let value = self.parse_expression()?;
            pairs.push((key, value));
            if self.peek() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expression::Hash { pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_err, parse_ok, value_expr};
    use super::*;

    fn call(f: &str, args: Vec<Expression>) -> Expression {
        Expression::call(f, args)
    }

    #[test]
    fn exponent_binds_tighter_than_multiply() {
        assert_eq!(
            value_expr("2 * 3 ** 4"),
            call(
                "multiply",
                vec![
                    Expression::int(2),
                    call("power", vec![Expression::int(3), Expression::int(4)])
                ]
            )
        );
    }

    #[test]
    fn exponent_is_right_associative() {
        assert_eq!(
            value_expr("2 ** 3 ** 2"),
            call(
                "power",
                vec![
                    Expression::int(2),
                    call("power", vec![Expression::int(3), Expression::int(2)])
                ]
            )
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            value_expr("10 - 4 - 3"),
            call(
                "subtract",
                vec![
                    call("subtract", vec![Expression::int(10), Expression::int(4)]),
                    Expression::int(3)
                ]
            )
        );
    }

    #[test]
    fn full_precedence_ladder() {
        // a or b and c == d + e * f
        let expr = value_expr("a or b and c == d + e * f");
        let expected = call(
            "or",
            vec![
                Expression::decl("a"),
                call(
                    "and",
                    vec![
                        Expression::decl("b"),
                        call(
                            "==",
                            vec![
                                Expression::decl("c"),
                                call(
                                    "add",
                                    vec![
                                        Expression::decl("d"),
                                        call(
                                            "multiply",
                                            vec![Expression::decl("e"), Expression::decl("f")]
                                        )
                                    ]
                                )
                            ]
                        )
                    ]
                )
            ],
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            value_expr("(1 + 2) * 3"),
            call(
                "multiply",
                vec![
                    call("add", vec![Expression::int(1), Expression::int(2)]),
                    Expression::int(3)
                ]
            )
        );
    }

    #[test]
    fn negative_literals_are_not_wrapped() {
        let root = parse_ok("schema do input do end value :a, -1 value :b, -2.5 end");
        assert_eq!(root.values[0].expression, Expression::int(-1));
        assert_eq!(root.values[1].expression, Expression::float(-2.5));
    }

    #[test]
    fn unary_minus_on_expression_desugars_to_subtract() {
        assert_eq!(
            value_expr("-input.x"),
            call("subtract", vec![Expression::int(0), Expression::input("x")])
        );
        assert_eq!(
            value_expr("- 5"),
            call("subtract", vec![Expression::int(0), Expression::int(5)])
        );
    }

    #[test]
    fn underscore_separators_are_stripped() {
        assert_eq!(value_expr("1_000_000"), Expression::int(1_000_000));
    }

    #[test]
    fn input_paths() {
        assert_eq!(value_expr("input.a"), Expression::input("a"));
        assert_eq!(
            value_expr("input.a.b.c"),
            Expression::InputElementReference {
                path: vec!["a".into(), "b".into(), "c".into()]
            }
        );
        // keywords are fine as field names
        assert_eq!(value_expr("input.value"), Expression::input("value"));
    }

    #[test]
    fn input_without_dot_is_rejected() {
        let err = parse_err("schema do input do end value :a, input end");
        assert!(err.message.contains("Missing '.' after 'input'"));
    }

    #[test]
    fn chained_indexing() {
        assert_eq!(
            value_expr("a[0][1]"),
            call(
                "at",
                vec![
                    call("at", vec![Expression::decl("a"), Expression::int(0)]),
                    Expression::int(1)
                ]
            )
        );
    }

    #[test]
    fn indexing_after_parens_and_calls() {
        assert_eq!(
            value_expr("(x + 5)[0]"),
            call(
                "at",
                vec![
                    call("add", vec![Expression::decl("x"), Expression::int(5)]),
                    Expression::int(0)
                ]
            )
        );
        assert_eq!(
            value_expr("fn(:f, x)[0]"),
            call(
                "at",
                vec![call("f", vec![Expression::decl("x")]), Expression::int(0)]
            )
        );
    }

    #[test]
    fn indexing_binds_tighter_than_operators() {
        assert_eq!(
            value_expr("a[0] * 2"),
            call(
                "multiply",
                vec![
                    call("at", vec![Expression::decl("a"), Expression::int(0)]),
                    Expression::int(2)
                ]
            )
        );
    }

    #[test]
    fn fn_call_with_options() {
        assert_eq!(
            value_expr("fn(:round, input.x, -5, digits: 2)"),
            Expression::Call {
                function: "round".into(),
                args: vec![Expression::input("x"), Expression::int(-5)],
                opts: vec![("digits".into(), Expression::int(2))],
            }
        );
        assert_eq!(value_expr("fn(:now)"), call("now", vec![]));
    }

    #[test]
    fn positional_after_keyword_is_rejected() {
        let err = parse_err("schema do input do end value :a, fn(:f, k: 1, 2) end");
        assert!(err.message.contains("Positional arguments must come before keyword"));
        assert_eq!(err.token.raw, "2");
    }

    #[test]
    fn duplicate_keyword_is_rejected() {
        let err = parse_err("schema do input do end value :a, fn(:f, k: 1, k: 2) end");
        assert!(err.message.contains("Duplicate keyword argument 'k:'"));
    }

    #[test]
    fn bare_calls_and_references() {
        assert_eq!(
            value_expr("sum(input.items.price)"),
            call(
                "sum",
                vec![Expression::InputElementReference {
                    path: vec!["items".into(), "price".into()]
                }]
            )
        );
        assert_eq!(value_expr("ref(:total)"), Expression::decl("total"));
        assert_eq!(value_expr("total"), Expression::decl("total"));
        assert_eq!(
            value_expr("index(:i)"),
            Expression::IndexReference { name: "i".into() }
        );
    }

    #[test]
    fn imported_names_become_import_calls() {
        let root = parse_ok(
            "schema do import :tax, from: Shared::Tax input do float :price end value :t, tax(amount: input.price, rate: 0.2) end",
        );
        assert_eq!(
            root.values[0].expression,
            Expression::ImportCall {
                name: "tax".into(),
                args: vec![
                    ("amount".into(), Expression::input("price")),
                    ("rate".into(), Expression::float(0.2)),
                ]
            }
        );
    }

    #[test]
    fn import_calls_reject_positional_arguments() {
        let err = parse_err(
            "schema do import :tax, from: T input do end value :t, tax(1) end",
        );
        assert!(err.message.contains("keyword arguments only"));
    }

    #[test]
    fn array_and_hash_literals() {
        assert_eq!(
            value_expr("[1, \"two\", :three,]"),
            Expression::Array {
                elements: vec![
                    Expression::int(1),
                    Expression::string("two"),
                    Expression::symbol("three")
                ]
            }
        );
        assert_eq!(
            value_expr("{ name: \"x\", \"k\" => 1, :s => true }"),
            Expression::Hash {
                pairs: vec![
                    (Expression::symbol("name"), Expression::string("x")),
                    (Expression::string("k"), Expression::int(1)),
                    (Expression::symbol("s"), Expression::boolean(true)),
                ]
            }
        );
    }

    #[test]
    fn string_hash_key_needs_arrow() {
        let err = parse_err("schema do input do end value :a, { \"k\" 1 } end");
        assert!(err.message.contains("Missing '=>'"), "{}", err.message);
    }

    #[test]
    fn string_concatenation_stays_a_call() {
        assert_eq!(
            value_expr("\"a\" + \"b\""),
            call("add", vec![Expression::string("a"), Expression::string("b")])
        );
    }

    #[test]
    fn infinity_constant() {
        assert_eq!(value_expr("Float::INFINITY"), Expression::float(f64::INFINITY));
        let err = parse_err("schema do input do end value :a, Foo::BAR end");
        assert!(err.message.contains("Unknown constant Foo::BAR"));
    }

    #[test]
    fn missing_operand() {
        let err = parse_err("schema do input do end value :a, 1 + end");
        assert!(err.message.contains("Expected an expression"));
        assert_eq!(err.token.kind, TokenKind::End);
    }

    #[test]
    fn unspaced_subtraction_names_the_fix() {
        let err = parse_err("schema do input do integer :a end value :d, input.a-1 end");
        assert_eq!(
            err.message,
            "Unexpected \"-1\" after an expression; put a space after '-' to subtract (as in a - 1)"
        );
        assert_eq!(err.token.raw, "-1");
        assert_eq!(
            value_expr("input.a - 1"),
            call("subtract", vec![Expression::input("a"), Expression::int(1)])
        );
    }

    #[test]
    fn deep_parentheses_are_an_error() {
        let depth = 10_000;
        let src = format!(
            "schema do input do end value :x, {}1{} end",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let err = parse_err(&src);
        assert_eq!(err.message, "Expression is nested too deeply");
        assert_eq!(err.token.kind, TokenKind::LParen);
    }

    #[test]
    fn deep_unary_minus_and_exponent_chains_are_errors() {
        let err = parse_err(&format!(
            "schema do input do end value :x, {}1 end",
            "- ".repeat(10_000)
        ));
        assert!(err.message.contains("nested too deeply"));

        let chain = vec!["2"; 10_000].join(" ** ");
        let err = parse_err(&format!("schema do input do end value :x, {} end", chain));
        assert!(err.message.contains("nested too deeply"));

        let err = parse_err(&format!(
            "schema do input do end value :x, {}{} end",
            "[".repeat(10_000),
            "]".repeat(10_000)
        ));
        assert!(err.message.contains("nested too deeply"));
    }

    #[test]
    fn moderate_nesting_is_accepted() {
        let expr = value_expr(&format!("{}1{}", "(".repeat(100), ")".repeat(100)));
        assert_eq!(expr, Expression::int(1));
    }

    #[test]
    fn capitalized_path_segments() {
        assert_eq!(
            value_expr("input.Address.City"),
            Expression::InputElementReference {
                path: vec!["Address".into(), "City".into()]
            }
        );
    }

    #[test]
    fn adjacent_negative_literal_is_not_subtraction() {
        // `x -5` lexes as `x` followed by the literal -5.
        let err = parse_err("schema do input do end value :a, x -5 end");
        assert_eq!(err.token.raw, "-5");
    }
}
