//! Recursive-descent parser for the `when` grammar (spec §4.3).

use crate::model::NodeId;

use super::WhenExpr;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
#[error("{0}")]
pub struct ParseError(pub String);

/// Parse a `when` expression. Pure and total: either returns an AST or a
/// [`ParseError`] describing what was expected. Anything outside the
/// grammar in spec §4.3 is rejected rather than guessed at (spec §9 open
/// question: "reject any expression outside it").
pub fn parse_when(input: &str) -> Result<WhenExpr, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError(format!(
            "unexpected trailing input at token {}: {:?}",
            parser.pos,
            &parser.tokens[parser.pos..]
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    And,
    Or,
    Not,
    True,
    False,
    LParen,
    RParen,
    Ident(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Ident(word),
                });
            }
            other => return Err(ParseError(format!("unexpected character `{other}`"))),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    // or_expr := and_expr ( "or" and_expr )*
    fn parse_or(&mut self) -> Result<WhenExpr, ParseError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = WhenExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // and_expr := unary ( "and" unary )*
    fn parse_and(&mut self) -> Result<WhenExpr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = WhenExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // unary := "not" unary | atom
    fn parse_unary(&mut self) -> Result<WhenExpr, ParseError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(WhenExpr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    // atom := "true" | "false" | "ctx." IDENT | IDENT ".up" | IDENT ".down" | "(" expr ")"
    fn parse_atom(&mut self) -> Result<WhenExpr, ParseError> {
        match self.advance().cloned() {
            Some(Token::True) => Ok(WhenExpr::Literal(true)),
            Some(Token::False) => Ok(WhenExpr::Literal(false)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ParseError("expected closing `)`".to_string())),
                }
            }
            Some(Token::Ident(word)) => parse_dotted_atom(&word),
            other => Err(ParseError(format!("unexpected token: {other:?}"))),
        }
    }
}

fn parse_dotted_atom(word: &str) -> Result<WhenExpr, ParseError> {
    if let Some(flag) = word.strip_prefix("ctx.") {
        if flag.is_empty() {
            return Err(ParseError("`ctx.` requires a flag name".to_string()));
        }
        return Ok(WhenExpr::Context(flag.to_string()));
    }
    if let Some(node) = word.strip_suffix(".up") {
        if node.is_empty() {
            return Err(ParseError("`.up` requires a node id".to_string()));
        }
        return Ok(WhenExpr::SeedDirection {
            node: NodeId::new(node),
            up: true,
        });
    }
    if let Some(node) = word.strip_suffix(".down") {
        if node.is_empty() {
            return Err(ParseError("`.down` requires a node id".to_string()));
        }
        return Ok(WhenExpr::SeedDirection {
            node: NodeId::new(node),
            up: false,
        });
    }
    Err(ParseError(format!(
        "`{word}` is not `ctx.<flag>`, `<node>.up`/`.down`, or a literal"
    )))
}
