/*!
Window function parsing.

Parses the `OVER (...)` clause that follows a ranking or aggregate call:

```text
OVER ( [PARTITION BY expr {, expr}] [ORDER BY expr [ASC|DESC] {, ...}] )
```

Frame clauses (`ROWS BETWEEN ...`) are skipped: aggregate windows are always
running when ordered and whole-partition otherwise.
*/

use super::expressions::ExpressionParser;
use super::lexer::TokenType;
use crate::questql::sql::ast::{Expr, OrderDirection, WindowOrder, WindowSpec};
use crate::questql::sql::error::{SqlError, SqlResult};

/// Functions allowed in front of OVER.
pub const WINDOW_FUNCTIONS: &[&str] = &["ROW_NUMBER", "RANK", "SUM", "COUNT", "AVG", "MIN", "MAX"];

impl ExpressionParser<'_, '_> {
    /// Parses `OVER (...)` for `function` and registers the window.
    pub(super) fn parse_window_call(
        &mut self,
        function: String,
        argument: Option<Expr>,
    ) -> SqlResult<Expr> {
        if !WINDOW_FUNCTIONS.contains(&function.as_str()) {
            return Err(SqlError::parse_error(
                format!("'{}' is not a supported window function", function),
                Some(self.current().position),
            ));
        }
        self.expect_keyword("OVER")?;
        self.expect(TokenType::LeftParen)?;

        let mut partition_by = Vec::new();
        if self.eat_keyword("PARTITION") {
            self.expect_keyword("BY")?;
            loop {
                partition_by.push(self.parse_expr()?);
                if self.current().token_type == TokenType::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let mut order_by = Vec::new();
        if self.eat_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                let expr = self.parse_expr()?;
                let direction = if self.eat_keyword("DESC") {
                    OrderDirection::Desc
                } else {
                    self.eat_keyword("ASC");
                    OrderDirection::Asc
                };
                order_by.push(WindowOrder { expr, direction });
                if self.current().token_type == TokenType::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if self.at_keyword("ROWS") || self.at_keyword("RANGE") {
            log::debug!("Ignoring window frame clause for {}", function);
            let mut depth = 0usize;
            loop {
                match self.current().token_type {
                    TokenType::LeftParen => depth += 1,
                    TokenType::RightParen if depth == 0 => break,
                    TokenType::RightParen => depth -= 1,
                    TokenType::Eof => break,
                    _ => {}
                }
                self.advance();
            }
        }

        self.expect(TokenType::RightParen)?;

        let argument = if matches!(function.as_str(), "ROW_NUMBER" | "RANK") {
            None
        } else {
            argument
        };
        self.windows.push(WindowSpec {
            function,
            argument,
            partition_by,
            order_by,
        });
        Ok(Expr::Window(self.windows.len() - 1))
    }
}
