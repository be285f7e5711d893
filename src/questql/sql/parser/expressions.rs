/*!
Expression and predicate parsing.

A recursive-descent parser over lexer tokens for the fragments that are
evaluated per row: projection items, ORDER BY keys, window arguments, WHERE /
HAVING / ON predicates.

Supported predicate grammar:

```text
condition := and_cond (OR and_cond)*
and_cond  := not_cond (AND not_cond)*
not_cond  := NOT not_cond | primary
primary   := EXISTS '(' subquery ')'
           | '(' condition ')'
           | expr IS [NOT] NULL
           | expr [NOT] IN '(' [expr {, expr}] ')'
           | expr [NOT] LIKE expr
           | expr [NOT] BETWEEN expr AND expr
           | expr op expr
           | expr
```

Value expressions are literals, column references, `*`, `t.*`, aggregate calls,
scalar function calls, CASE and window calls. There is no arithmetic.
*/

use super::lexer::{Lexer, Token, TokenType};
use crate::questql::sql::ast::{
    AggregateCall, AggregateTarget, CompareOp, Condition, Expr, WindowSpec,
    is_aggregate_function,
};
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::types::FieldValue;

/// Parser over one fragment.
///
/// Window calls found while parsing are appended to `windows` and referenced
/// by index from [`Expr::Window`].
pub struct ExpressionParser<'s, 'w> {
    pub(super) source: &'s str,
    pub(super) tokens: Vec<Token>,
    pub(super) pos: usize,
    pub(super) windows: &'w mut Vec<WindowSpec>,
}

impl<'s, 'w> ExpressionParser<'s, 'w> {
    pub fn new(source: &'s str, windows: &'w mut Vec<WindowSpec>) -> SqlResult<Self> {
        Ok(Self {
            source,
            tokens: Lexer::new(source).tokenize()?,
            pos: 0,
            windows,
        })
    }

    /// Parses `text` as exactly one value expression.
    pub fn parse_expression(text: &str, windows: &mut Vec<WindowSpec>) -> SqlResult<Expr> {
        let mut parser = ExpressionParser::new(text, windows)?;
        let expr = parser.parse_expr()?;
        parser.expect_end()?;
        Ok(expr)
    }

    /// Parses `text` as exactly one predicate. Window calls are rejected.
    pub fn parse_condition(text: &str) -> SqlResult<Condition> {
        let mut windows = Vec::new();
        let mut parser = ExpressionParser::new(text, &mut windows)?;
        let condition = parser.parse_or()?;
        parser.expect_end()?;
        if !windows.is_empty() {
            return Err(SqlError::parse_error(
                "Window functions are not allowed in predicates",
                None,
            ));
        }
        Ok(condition)
    }

    pub(super) fn current(&self) -> &Token {
        // tokens always end with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(super) fn peek_type(&self, ahead: usize) -> TokenType {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| t.token_type)
            .unwrap_or(TokenType::Eof)
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(super) fn at_keyword(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    pub(super) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn expect_keyword(&mut self, keyword: &str) -> SqlResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("Expected {}", keyword)))
        }
    }

    pub(super) fn expect(&mut self, token_type: TokenType) -> SqlResult<Token> {
        if self.current().token_type == token_type {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("Expected {:?}", token_type)))
        }
    }

    fn expect_end(&mut self) -> SqlResult<()> {
        while self.current().token_type == TokenType::Semicolon {
            self.advance();
        }
        if self.current().token_type == TokenType::Eof {
            Ok(())
        } else {
            Err(self.unexpected("Unexpected trailing input"))
        }
    }

    pub(super) fn unexpected(&self, message: &str) -> SqlError {
        let token = self.current();
        let found = if token.token_type == TokenType::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", token.value)
        };
        SqlError::parse_error(format!("{}, found {}", message, found), Some(token.position))
    }

    // ---- predicates -------------------------------------------------------

    pub fn parse_or(&mut self) -> SqlResult<Condition> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("OR") {
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> SqlResult<Condition> {
        let mut left = self.parse_not()?;
        while self.eat_keyword("AND") {
            let right = self.parse_not()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> SqlResult<Condition> {
        if self.at_keyword("NOT") && !self.tokens[self.pos + 1].is_keyword("EXISTS") {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Condition::Not(Box::new(inner)));
        }
        self.parse_primary_condition()
    }

    fn parse_primary_condition(&mut self) -> SqlResult<Condition> {
        let negated_exists = self.at_keyword("NOT") && self.tokens[self.pos + 1].is_keyword("EXISTS");
        if negated_exists || self.at_keyword("EXISTS") {
            if negated_exists {
                self.advance();
            }
            self.advance();
            let subquery = self.parenthesized_source()?;
            return Ok(Condition::Exists {
                subquery,
                negated: negated_exists,
            });
        }

        if self.current().token_type == TokenType::LeftParen {
            let saved = self.pos;
            self.advance();
            if let Ok(inner) = self.parse_or() {
                if self.current().token_type == TokenType::RightParen {
                    self.advance();
                    return Ok(inner);
                }
            }
            self.pos = saved;
        }

        let expr = self.parse_expr()?;
        self.parse_predicate_suffix(expr)
    }

    fn parse_predicate_suffix(&mut self, expr: Expr) -> SqlResult<Condition> {
        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            self.expect_keyword("NULL")?;
            return Ok(Condition::IsNull { expr, negated });
        }

        let negated = if self.at_keyword("NOT")
            && (self.tokens[self.pos + 1].is_keyword("IN")
                || self.tokens[self.pos + 1].is_keyword("LIKE")
                || self.tokens[self.pos + 1].is_keyword("BETWEEN"))
        {
            self.advance();
            true
        } else {
            false
        };

        if self.eat_keyword("IN") {
            self.expect(TokenType::LeftParen)?;
            if self.at_keyword("SELECT") {
                return Err(self.unexpected("Subquery must be resolved before evaluation"));
            }
            let mut values = Vec::new();
            if self.current().token_type != TokenType::RightParen {
                loop {
                    values.push(self.parse_expr()?);
                    if self.current().token_type == TokenType::Comma {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.expect(TokenType::RightParen)?;
            return Ok(Condition::InList {
                expr,
                values,
                negated,
            });
        }

        if self.eat_keyword("LIKE") {
            let pattern = self.parse_expr()?;
            return Ok(Condition::Like {
                expr,
                pattern,
                negated,
            });
        }

        if self.eat_keyword("BETWEEN") {
            let low = self.parse_expr()?;
            self.expect_keyword("AND")?;
            let high = self.parse_expr()?;
            return Ok(Condition::Between {
                expr,
                low,
                high,
                negated,
            });
        }

        if negated {
            return Err(self.unexpected("Expected IN, LIKE or BETWEEN after NOT"));
        }

        let op = match self.current().token_type {
            TokenType::Equal => Some(CompareOp::Eq),
            TokenType::NotEqual => Some(CompareOp::NotEq),
            TokenType::LessThan => Some(CompareOp::Lt),
            TokenType::LessThanOrEqual => Some(CompareOp::LtEq),
            TokenType::GreaterThan => Some(CompareOp::Gt),
            TokenType::GreaterThanOrEqual => Some(CompareOp::GtEq),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                if self.current().token_type == TokenType::LeftParen
                    && self.tokens[self.pos + 1].is_keyword("SELECT")
                {
                    return Err(self.unexpected("Subquery must be resolved before evaluation"));
                }
                let right = self.parse_expr()?;
                Ok(Condition::Compare {
                    left: expr,
                    op,
                    right,
                })
            }
            None => Ok(Condition::Truthy(expr)),
        }
    }

    /// Consumes `( ... )` and returns the source text between the parens.
    pub(super) fn parenthesized_source(&mut self) -> SqlResult<String> {
        let open = self.expect(TokenType::LeftParen)?;
        let mut depth = 1usize;
        loop {
            let token = self.advance();
            match token.token_type {
                TokenType::LeftParen => depth += 1,
                TokenType::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.source[open.end..token.position].trim().to_string());
                    }
                }
                TokenType::Eof => {
                    return Err(SqlError::parse_error(
                        "Unbalanced parentheses",
                        Some(open.position),
                    ));
                }
                _ => {}
            }
        }
    }

    // ---- value expressions -----------------------------------------------

    pub fn parse_expr(&mut self) -> SqlResult<Expr> {
        let token = self.current().clone();
        match token.token_type {
            TokenType::Number => {
                self.advance();
                Ok(Expr::Literal(parse_number(&token.value, false)?))
            }
            TokenType::Minus if self.peek_type(1) == TokenType::Number => {
                self.advance();
                let number = self.advance();
                Ok(Expr::Literal(parse_number(&number.value, true)?))
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::Literal(FieldValue::String(token.value)))
            }
            TokenType::Asterisk => {
                self.advance();
                Ok(Expr::Wildcard)
            }
            TokenType::LeftParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenType::RightParen)?;
                Ok(inner)
            }
            TokenType::Identifier => self.parse_identifier_expr(),
            _ => Err(self.unexpected("Expected expression")),
        }
    }

    fn parse_identifier_expr(&mut self) -> SqlResult<Expr> {
        let token = self.advance();
        let upper = token.value.to_uppercase();

        match upper.as_str() {
            "NULL" => return Ok(Expr::Literal(FieldValue::Null)),
            "TRUE" => return Ok(Expr::Literal(FieldValue::Boolean(true))),
            "FALSE" => return Ok(Expr::Literal(FieldValue::Boolean(false))),
            "CASE" => return self.parse_case(),
            _ => {}
        }

        if let Some(qualifier) = token.value.strip_suffix(".*") {
            return Ok(Expr::QualifiedWildcard(qualifier.to_string()));
        }

        if self.current().token_type != TokenType::LeftParen {
            return Ok(Expr::Column(token.value));
        }

        if is_aggregate_function(&upper) {
            let call = self.parse_aggregate_call(upper)?;
            if self.at_keyword("OVER") {
                return self.parse_window_call(call.function.clone(), aggregate_argument(&call));
            }
            return Ok(Expr::Aggregate(call));
        }

        let args = self.parse_call_arguments()?;
        if self.at_keyword("OVER") {
            return self.parse_window_call(upper, args.into_iter().next());
        }
        Ok(Expr::Function { name: upper, args })
    }

    fn parse_call_arguments(&mut self) -> SqlResult<Vec<Expr>> {
        self.expect(TokenType::LeftParen)?;
        let mut args = Vec::new();
        if self.current().token_type != TokenType::RightParen {
            loop {
                args.push(self.parse_expr()?);
                if self.current().token_type == TokenType::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RightParen)?;
        Ok(args)
    }

    /// `FUNC([DISTINCT] arg)`; the argument is kept as written.
    fn parse_aggregate_call(&mut self, function: String) -> SqlResult<AggregateCall> {
        self.expect(TokenType::LeftParen)?;
        let distinct = self.eat_keyword("DISTINCT");
        let start = self.current().position;
        let mut end = start;
        let mut depth = 0usize;
        loop {
            let token = self.current().clone();
            match token.token_type {
                TokenType::LeftParen => depth += 1,
                TokenType::RightParen if depth == 0 => break,
                TokenType::RightParen => depth -= 1,
                TokenType::Eof => return Err(self.unexpected("Unclosed aggregate call")),
                _ => {}
            }
            end = token.end;
            self.advance();
        }
        self.expect(TokenType::RightParen)?;

        let argument = self.source[start..end].trim().to_string();
        if argument.is_empty() {
            return Err(SqlError::parse_error(
                format!("{} requires an argument", function),
                Some(start),
            ));
        }
        let target = if argument == "*" {
            AggregateTarget::Rows
        } else if function == "COUNT" && argument == "1" && !distinct {
            AggregateTarget::Rows
        } else {
            AggregateTarget::Column(argument.clone())
        };
        if target == AggregateTarget::Rows && function != "COUNT" {
            return Err(SqlError::parse_error(
                format!("{}(*) is only valid for COUNT", function),
                Some(start),
            ));
        }
        Ok(AggregateCall {
            function,
            target,
            distinct,
            argument,
        })
    }

    /// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`
    fn parse_case(&mut self) -> SqlResult<Expr> {
        let operand = if self.at_keyword("WHEN") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let mut branches = Vec::new();
        while self.eat_keyword("WHEN") {
            let condition = match &operand {
                Some(op) => Condition::Compare {
                    left: op.clone(),
                    op: CompareOp::Eq,
                    right: self.parse_expr()?,
                },
                None => self.parse_or()?,
            };
            self.expect_keyword("THEN")?;
            let result = self.parse_expr()?;
            branches.push((condition, result));
        }
        if branches.is_empty() {
            return Err(self.unexpected("CASE requires at least one WHEN"));
        }
        let else_result = if self.eat_keyword("ELSE") {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_keyword("END")?;
        Ok(Expr::Case {
            branches,
            else_result,
        })
    }
}

fn aggregate_argument(call: &AggregateCall) -> Option<Expr> {
    match &call.target {
        AggregateTarget::Rows => None,
        AggregateTarget::Column(name) => Some(Expr::Column(name.clone())),
    }
}

fn parse_number(text: &str, negative: bool) -> SqlResult<FieldValue> {
    let signed = if negative {
        format!("-{}", text)
    } else {
        text.to_string()
    };
    if !text.contains('.') {
        if let Ok(i) = signed.parse::<i64>() {
            return Ok(FieldValue::Integer(i));
        }
    }
    signed
        .parse::<f64>()
        .map(FieldValue::Float)
        .map_err(|_| SqlError::parse_error(format!("Invalid number '{}'", signed), None))
}
