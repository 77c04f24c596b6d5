//! Literal expression parser
//!
//! A recursive descent parser for the infix text produced by the resolver:
//! numbers, `+ - * /` and parentheses. There is no unary minus; the resolver
//! writes negative values as `(0-x)`.

use crate::ast::{BinaryOperator, Expr};
use crate::error::{FormulaError, FormulaResult};
use std::fmt;

/// Deepest parenthesis nesting accepted
pub const MAX_NESTING: usize = 64;

/// Parse a literal expression into an AST
///
/// # Example
/// ```rust
/// use calcgraph_formula::parse_expression;
///
/// let ast = parse_expression("1 + 2").unwrap();
/// let ast = parse_expression("(0-4.5) * 2").unwrap();
/// assert!(parse_expression("-1").is_err());
/// ```
pub fn parse_expression(input: &str) -> FormulaResult<Expr> {
    let tokens = Scanner::new(input).scan_all()?;
    if tokens.is_empty() {
        return Err(FormulaError::EmptyExpression);
    }
    check_balance(&tokens)?;

    let mut parser = ExpressionParser { tokens, pos: 0 };
    let expr = parser.parse_additive()?;

    // Make sure we consumed all input
    if let Some(extra) = parser.peek() {
        return Err(extra.unexpected());
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
        }
    }
}

/// Token with its character position in the input
#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    token: Token,
    position: usize,
}

impl Spanned {
    fn unexpected(&self) -> FormulaError {
        FormulaError::UnexpectedToken {
            token: self.token.to_string(),
            position: self.position,
        }
    }
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    input: &'a str,
    /// Character (not byte) index of the next char
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            input,
            position: 0,
        }
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if next.is_some() {
            self.position += 1;
        }
        next
    }

    fn scan_all(mut self) -> FormulaResult<Vec<Spanned>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.scan_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn scan_token(&mut self) -> FormulaResult<Option<Spanned>> {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.advance();
        }

        let position = self.position;
        let Some(&(start, c)) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '0'..='9' | '.' => return self.scan_number(start, position).map(Some),
            other => {
                return Err(FormulaError::UnexpectedCharacter {
                    ch: other,
                    position,
                })
            }
        };
        self.advance();
        Ok(Some(Spanned { token, position }))
    }

    fn scan_number(&mut self, start: usize, position: usize) -> FormulaResult<Spanned> {
        let mut end = start;
        while let Some(&(idx, c)) = self.chars.peek() {
            if !(c.is_ascii_digit() || c == '.') {
                break;
            }
            end = idx + c.len_utf8();
            self.advance();
        }

        let text = &self.input[start..end];
        let value = text
            .parse::<f64>()
            .map_err(|_| FormulaError::InvalidNumber(text.to_string()))?;

        Ok(Spanned {
            token: Token::Number(value),
            position,
        })
    }
}

fn check_balance(tokens: &[Spanned]) -> FormulaResult<()> {
    let mut depth: usize = 0;
    for spanned in tokens {
        match spanned.token {
            Token::LeftParen => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(FormulaError::NestingTooDeep {
                        limit: MAX_NESTING,
                        position: spanned.position,
                    });
                }
            }
            Token::RightParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(FormulaError::UnbalancedParentheses)?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(FormulaError::UnbalancedParentheses)
    }
}

/// Expression parser over a scanned token list
struct ExpressionParser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl ExpressionParser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // === Expression parsing ===

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Subtract,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_primary()?;

        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Star) => BinaryOperator::Multiply,
                Some(Token::Slash) => BinaryOperator::Divide,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        let spanned = self.next().ok_or(FormulaError::UnexpectedEnd)?;
        match spanned.token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::LeftParen => {
                let expr = self.parse_additive()?;
                match self.next() {
                    Some(Spanned {
                        token: Token::RightParen,
                        ..
                    }) => Ok(expr),
                    Some(other) => Err(other.unexpected()),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            _ => Err(spanned.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> Expr {
        Expr::Number(n)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_expression("42").unwrap(), num(42.0));
        assert_eq!(parse_expression(" 3.14 ").unwrap(), num(3.14));
        assert_eq!(parse_expression(".5").unwrap(), num(0.5));
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expression("2+3*4").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOperator::Add,
                num(2.0),
                Expr::binary(BinaryOperator::Multiply, num(3.0), num(4.0))
            )
        );
        assert_eq!(expr.to_string(), "(2 + (3 * 4))");
    }

    #[test]
    fn test_parse_left_associative() {
        assert_eq!(
            parse_expression("8-3-1").unwrap().to_string(),
            "((8 - 3) - 1)"
        );
        assert_eq!(
            parse_expression("8/4/2").unwrap().to_string(),
            "((8 / 4) / 2)"
        );
    }

    #[test]
    fn test_parse_parentheses() {
        assert_eq!(
            parse_expression("(2+3)*4").unwrap().to_string(),
            "((2 + 3) * 4)"
        );
        assert_eq!(
            parse_expression("(0-5)").unwrap().to_string(),
            "(0 - 5)"
        );
    }

    #[test]
    fn test_parse_nesting_limit() {
        let at_limit = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse_expression(&at_limit).unwrap(), num(1.0));

        let deep = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(
            parse_expression(&deep),
            Err(FormulaError::NestingTooDeep {
                limit: MAX_NESTING,
                position: MAX_NESTING
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_expression("   "), Err(FormulaError::EmptyExpression));
        assert_eq!(
            parse_expression("(1+2"),
            Err(FormulaError::UnbalancedParentheses)
        );
        assert_eq!(
            parse_expression("1+2)"),
            Err(FormulaError::UnbalancedParentheses)
        );
        assert_eq!(
            parse_expression("1 + x"),
            Err(FormulaError::UnexpectedCharacter {
                ch: 'x',
                position: 4
            })
        );
        assert_eq!(
            parse_expression("1.2.3"),
            Err(FormulaError::InvalidNumber("1.2.3".into()))
        );
        assert_eq!(parse_expression("1+"), Err(FormulaError::UnexpectedEnd));
        assert_eq!(
            parse_expression("-1"),
            Err(FormulaError::UnexpectedToken {
                token: "-".into(),
                position: 0
            })
        );
        assert_eq!(
            parse_expression("()"),
            Err(FormulaError::UnexpectedToken {
                token: ")".into(),
                position: 1
            })
        );
        assert_eq!(
            parse_expression("1 2"),
            Err(FormulaError::UnexpectedToken {
                token: "2".into(),
                position: 2
            })
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            parse_expression("2 $ 3").unwrap_err().to_string(),
            "unexpected character '$' at position 2"
        );
        assert_eq!(
            parse_expression("2 * * 3").unwrap_err().to_string(),
            "unexpected token '*' at position 4"
        );
    }
}
