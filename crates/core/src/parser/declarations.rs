use super::Parser;
use crate::ast::{CaseExpression, Expression, Literal, TraitDeclaration, ValueDeclaration};
use crate::error::ParseError;
use crate::token::TokenKind;

/// Synthetic call every `on` condition list folds into.
pub const CASCADE_AND: &str = "cascade_and";

impl<'a> Parser<'a> {
    // -- Values and traits ----------------------------------------

    /// `value :name, expr`, `value :name do ... end`, or the same with
    /// `let`, which marks the value as inlinable.
    pub(super) fn parse_value(&mut self, inline: bool) -> Result<ValueDeclaration, ParseError> {
        let loc = self.advance().location;
        let name = self.expect_symbol()?;
        let expression = match self.peek() {
            TokenKind::Comma => {
                self.advance();
                self.parse_expression()?
            }
            TokenKind::Do => self.parse_cascade()?,
            _ if self.cur().metadata().starts_expression => {
                return Err(self.err(format!(
                    "Missing ',' after :{}, but got {}",
                    name,
                    self.got()
                )))
            }
            _ => {
                return Err(self.err(format!(
                    "Expected ',' and an expression or a 'do' block after :{}, but got {}",
                    name,
                    self.got()
                )))
            }
        };
        tracing::trace!(name = %name, inline, "parsed value declaration");
        Ok(ValueDeclaration {
            name,
            expression,
            inline,
            loc,
        })
    }

    pub(super) fn parse_trait(&mut self) -> Result<TraitDeclaration, ParseError> {
        let loc = self.advance().location;
        let name = self.expect_symbol()?;
        self.expect(TokenKind::Comma)?;
        let expression = self.parse_expression()?;
        tracing::trace!(name = %name, "parsed trait declaration");
        Ok(TraitDeclaration {
            name,
            expression,
            loc,
        })
    }

    // -- Cascades -------------------------------------------------

    fn parse_cascade(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::Do)?;
        let mut cases = Vec::new();
        loop {
            match self.peek() {
                TokenKind::On => cases.push(self.parse_on_case()?),
                TokenKind::Base => {
                    self.advance();
                    let result = self.parse_expression()?;
                    cases.push(CaseExpression {
                        condition: Expression::boolean(true),
                        result,
                    });
                }
                TokenKind::End => break,
                _ => {
                    return Err(self.err(format!(
                        "Expected 'on', 'base' or 'end' in cascade, but got {}",
                        self.got()
                    )))
                }
            }
        }
        self.expect(TokenKind::End)?;
        Ok(Expression::Cascade { cases })
    }

    /// `on cond, ..., result`: every expression but the last is a condition.
    fn parse_on_case(&mut self) -> Result<CaseExpression, ParseError> {
        self.advance();
        let mut exprs = vec![self.parse_expression()?];
        while self.peek() == TokenKind::Comma {
            self.advance();
            exprs.push(self.parse_expression()?);
        }
        let result = match exprs.pop() {
            Some(result) if !exprs.is_empty() => result,
            _ => {
                return Err(self.err(format!(
                    "Missing ',' and a result after the 'on' condition, but got {}",
                    self.got()
                )))
            }
        };
        let conditions = exprs.into_iter().map(condition_reference).collect();
        Ok(CaseExpression {
            condition: Expression::call(CASCADE_AND, conditions),
            result,
        })
    }
}

/// `on :adult, ...` names the trait `adult`.
fn condition_reference(expr: Expression) -> Expression {
    match expr {
        Expression::Literal {
            value: Literal::Symbol(name),
        } => Expression::DeclarationReference { name },
        other => other,
    }
}
