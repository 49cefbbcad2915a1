use super::Parser;
use crate::ast::{AccessMode, Domain, InputDeclaration, InputType, Literal, Number, PrimitiveType};
use crate::error::ParseError;
use crate::token::TokenKind;

/// Block a declaration list is nested in.
#[derive(Clone, Copy, PartialEq)]
enum Parent<'n> {
    Root,
    Array(&'n str),
    Hash,
}

/// How a direct child of an array declares itself.
#[derive(Clone, Copy, PartialEq)]
enum ChildStyle {
    Element,
    Field,
}

fn primitive_type(kind: TokenKind) -> Option<PrimitiveType> {
    let p = match kind {
        TokenKind::IntegerType => PrimitiveType::Integer,
        TokenKind::FloatType => PrimitiveType::Float,
        TokenKind::DecimalType => PrimitiveType::Decimal,
        TokenKind::StringType => PrimitiveType::String,
        TokenKind::BooleanType => PrimitiveType::Boolean,
        TokenKind::SymbolType => PrimitiveType::Symbol,
        TokenKind::AnyType => PrimitiveType::Any,
        _ => return None,
    };
    Some(p)
}

impl<'a> Parser<'a> {
    // -- Input block ----------------------------------------------

    pub(super) fn parse_input_block(&mut self) -> Result<Vec<InputDeclaration>, ParseError> {
        self.expect(TokenKind::Input)?;
        self.expect(TokenKind::Do)?;
        let inputs = self.parse_input_body(Parent::Root)?;
        self.expect(TokenKind::End)?;
        tracing::trace!(count = inputs.len(), "parsed input block");
        Ok(inputs)
    }

    fn parse_input_body(&mut self, parent: Parent<'_>) -> Result<Vec<InputDeclaration>, ParseError> {
        let mut decls = Vec::new();
        let mut style: Option<ChildStyle> = None;

        while !matches!(self.peek(), TokenKind::End | TokenKind::Eof) {
            if let Parent::Array(name) = parent {
                let this = match self.peek() {
                    TokenKind::ElementType => Some(ChildStyle::Element),
                    TokenKind::IndexType => None,
                    _ => Some(ChildStyle::Field),
                };
                match (style, this) {
                    (Some(seen), Some(this)) if seen != this => {
                        return Err(self.err(format!(
                            "Array :{} mixes 'element' declarations with named field declarations; use one style",
                            name
                        )));
                    }
                    (None, Some(this)) => style = Some(this),
                    _ => {}
                }
            }
            decls.push(self.parse_input_decl(parent)?);
        }
        Ok(decls)
    }

    fn parse_input_decl(&mut self, parent: Parent<'_>) -> Result<InputDeclaration, ParseError> {
        let loc = self.cur().location;
        let kind = self.peek();
        let in_array = matches!(parent, Parent::Array(_));

        let (name, type_) = match kind {
            TokenKind::ArrayType | TokenKind::HashType => {
                self.advance();
                let name = self.expect_symbol()?;
                let type_ = if kind == TokenKind::ArrayType {
                    InputType::Array
                } else {
                    InputType::Hash
                };
                (name, type_)
            }
            TokenKind::ElementType => {
                if !in_array {
                    return Err(self.err("'element' declarations are only allowed inside an array"));
                }
                self.advance();
                let inner = self.parse_element_type()?;
                self.expect(TokenKind::Comma)?;
                let name = self.expect_symbol()?;
                (name, InputType::Element(Box::new(inner)))
            }
            TokenKind::IndexType => {
                if !in_array {
                    return Err(self.err("'index' declarations are only allowed inside an array"));
                }
                self.advance();
                let name = self.expect_symbol()?;
                (name, InputType::Index)
            }
            _ => match primitive_type(kind) {
                Some(p) => {
                    self.advance();
                    (self.expect_symbol()?, InputType::Primitive(p))
                }
                None => {
                    return Err(self.err(format!(
                        "Expected an input type (integer, float, decimal, string, boolean, symbol, any, array, hash), but got {}",
                        self.got()
                    )))
                }
            },
        };

        let mut decl = InputDeclaration {
            name,
            type_,
            domain: None,
            children: Vec::new(),
            access_mode: None,
            index: None,
            loc,
        };
        self.parse_input_options(&mut decl)?;

        if self.peek() == TokenKind::Do {
            if !decl.type_.is_container() {
                return Err(self.err(format!(
                    "Only array and hash inputs can have nested declarations, but :{} is not one",
                    decl.name
                )));
            }
            self.advance();
            let nested = if decl.type_.is_array() {
                Parent::Array(&decl.name)
            } else {
                Parent::Hash
            };
            self.descend("Input declaration")?;
            let children = self.parse_input_body(nested);
            self.ascend();
            let children = children?;
            self.expect(TokenKind::End)?;
            decl.children = children;
        }

        if decl.type_.is_array() {
            let element_style = decl
                .children
                .iter()
                .any(|c| matches!(c.type_, InputType::Element(_)));
            decl.access_mode = Some(if element_style {
                AccessMode::Element
            } else {
                AccessMode::Field
            });
        }

        tracing::trace!(name = %decl.name, "parsed input declaration");
        Ok(decl)
    }

    /// The `:type` of `element :type, :name`.
    fn parse_element_type(&mut self) -> Result<InputType, ParseError> {
        let tok = self.cur().clone();
        let name = self.expect_symbol()?;
        match name.as_str() {
            "array" => Ok(InputType::Array),
            "hash" => Ok(InputType::Hash),
            other => PrimitiveType::from_name(other)
                .map(InputType::Primitive)
                .ok_or_else(|| {
                    ParseError::new(
                        &self.filename,
                        &tok,
                        format!("Unknown element type :{}", other),
                    )
                }),
        }
    }

    /// `, domain: ...` and `, index: :name` after a declaration header.
    fn parse_input_options(&mut self, decl: &mut InputDeclaration) -> Result<(), ParseError> {
        while self.peek() == TokenKind::Comma {
            self.advance();
            if self.peek() != TokenKind::Label {
                return Err(self.err(format!(
                    "Expected an option like domain: or index:, but got {}",
                    self.got()
                )));
            }
            let label = self.advance();
            match label.raw.as_str() {
                "domain" => decl.domain = Some(self.parse_domain()?),
                "index" if decl.type_.is_array() => decl.index = Some(self.expect_symbol()?),
                "index" => {
                    return Err(ParseError::new(
                        &self.filename,
                        &label,
                        "The index: option is only allowed on arrays",
                    ))
                }
                other => {
                    return Err(ParseError::new(
                        &self.filename,
                        &label,
                        format!("Unknown input option '{}:'", other),
                    ))
                }
            }
        }
        Ok(())
    }

    // -- Domains --------------------------------------------------

    fn parse_domain(&mut self) -> Result<Domain, ParseError> {
        if self.peek() == TokenKind::LBracket {
            self.advance();
            let mut values = Vec::new();
            while self.peek() != TokenKind::RBracket {
                values.push(self.parse_domain_literal()?);
                if self.peek() == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(TokenKind::RBracket)?;
            return Ok(Domain::Values { values });
        }

        let min_tok = self.cur().clone();
        let min = self.parse_range_bound()?;
        let exclusive = match self.peek() {
            TokenKind::DotDot => false,
            TokenKind::DotDotDot => true,
            _ => {
                return Err(self.err(format!(
                    "Expected '..' or '...' in domain range, but got {}",
                    self.got()
                )))
            }
        };
        self.advance();
        let max = self.parse_range_bound()?;

        let same_kind = matches!(
            (min, max),
            (Number::Int(_), Number::Int(_)) | (Number::Float(_), Number::Float(_))
        );
        let infinite = |n: Number| matches!(n, Number::Float(f) if f.is_infinite());
        if !same_kind && !infinite(min) && !infinite(max) {
            return Err(ParseError::new(
                &self.filename,
                &min_tok,
                "Domain range endpoints must both be integers or both be floats",
            ));
        }
        Ok(Domain::Range {
            min,
            max,
            exclusive,
        })
    }

    fn parse_range_bound(&mut self) -> Result<Number, ParseError> {
        let negate = self.peek() == TokenKind::Subtract && self.peek_at(1) == TokenKind::Constant;
        if negate {
            self.advance();
        }
        let tok = self.cur().clone();
        let n = match tok.kind {
            TokenKind::Integer if !negate => Number::Int(self.int_value(&tok)?),
            TokenKind::Float if !negate => Number::Float(self.float_value(&tok)?),
            TokenKind::Constant if tok.raw == "Float::INFINITY" => {
                Number::Float(if negate { f64::NEG_INFINITY } else { f64::INFINITY })
            }
            _ => {
                return Err(self.err(format!(
                    "Expected a number in domain range, but got {}",
                    self.got()
                )))
            }
        };
        self.advance();
        Ok(n)
    }

    fn parse_domain_literal(&mut self) -> Result<Literal, ParseError> {
        let tok = self.cur().clone();
        let lit = match tok.kind {
            TokenKind::Integer => Literal::Integer(self.int_value(&tok)?),
            TokenKind::Float => Literal::Float(self.float_value(&tok)?),
            TokenKind::String => Literal::String(tok.raw.clone()),
            TokenKind::Symbol => Literal::Symbol(tok.raw.clone()),
            TokenKind::Boolean => Literal::Boolean(tok.raw == "true"),
            _ => {
                return Err(self.err(format!(
                    "Domain values must be literals, but got {}",
                    self.got()
                )))
            }
        };
        self.advance();
        Ok(lit)
    }
}
