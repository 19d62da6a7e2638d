use crate::ast::{CompareOp, Node, StringSet};
use crate::error::SelectorError;
use crate::tokenizer::{Token, tokenize};

/// Compile selector text into an expression tree. Empty text yields [`Node::All`].
pub fn parse_expression(input: &str) -> Result<Node, SelectorError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };

    if parser.peek() == &Token::Eof {
        return Ok(Node::All);
    }

    // "||" binds loosest, so start there.
    let node = parser.or_expression()?;
    if parser.peek() != &Token::Eof {
        let rest: Vec<String> = parser.tokens[parser.pos..]
            .iter()
            .filter(|t| **t != Token::Eof)
            .map(Token::to_string)
            .collect();
        return Err(SelectorError::TrailingContent(rest.join(" ")));
    }
    Ok(node)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // tokenize() always terminates the stream with Eof and the cursor never
    // moves past it, so indexing at `pos` cannot go out of bounds.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn or_expression(&mut self) -> Result<Node, SelectorError> {
        let mut operands = vec![self.and_expression()?];
        while self.peek() == &Token::Or {
            self.advance();
            operands.push(self.and_expression()?);
        }
        Ok(collapse(operands, Node::Or))
    }

    fn and_expression(&mut self) -> Result<Node, SelectorError> {
        let mut operands = vec![self.operand()?];
        while self.peek() == &Token::And {
            self.advance();
            operands.push(self.operand()?);
        }
        Ok(collapse(operands, Node::And))
    }

    fn operand(&mut self) -> Result<Node, SelectorError> {
        let mut negated = false;
        while self.peek() == &Token::Not {
            negated = !negated;
            self.advance();
        }

        let node = match self.advance() {
            Token::Has(label) => Node::Has(label),
            Token::All => Node::All,
            Token::Global => Node::Global,
            Token::Label(label) => self.label_predicate(label)?,
            Token::LParen => {
                let inner = self.or_expression()?;
                if self.advance() != Token::RParen {
                    return Err(SelectorError::UnclosedParen);
                }
                inner
            }
            Token::Eof => return Err(SelectorError::UnexpectedEnd),
            other => return Err(SelectorError::UnexpectedToken(other.to_string())),
        };

        Ok(if negated {
            Node::Not(Box::new(node))
        } else {
            node
        })
    }

    fn label_predicate(&mut self, label: String) -> Result<Node, SelectorError> {
        let op = match self.advance() {
            Token::Eq => CompareOp::Eq,
            Token::Ne => CompareOp::Ne,
            Token::Contains => CompareOp::Contains,
            Token::StartsWith => CompareOp::StartsWith,
            Token::EndsWith => CompareOp::EndsWith,
            Token::In => {
                let values = self.set_literal(&label)?;
                return Ok(Node::In { label, values });
            }
            Token::NotIn => {
                let values = self.set_literal(&label)?;
                return Ok(Node::NotIn { label, values });
            }
            Token::Eof => return Err(SelectorError::UnexpectedEnd),
            other => {
                return Err(SelectorError::ExpectedComparison {
                    label,
                    found: other.to_string(),
                });
            }
        };

        match self.advance() {
            Token::StringLiteral(value) => Ok(Node::Compare { label, op, value }),
            Token::Eof => Err(SelectorError::UnexpectedEnd),
            other => Err(SelectorError::ExpectedString {
                label,
                found: other.to_string(),
            }),
        }
    }

    /// `{ literal (, literal)* }` after `in` / `not in`. An empty set is accepted.
    fn set_literal(&mut self, label: &str) -> Result<StringSet, SelectorError> {
        if self.advance() != Token::LBrace {
            return Err(SelectorError::ExpectedSet {
                label: label.to_string(),
            });
        }

        let mut values = Vec::new();
        while let Token::StringLiteral(value) = self.peek() {
            values.push(value.clone());
            self.advance();
            if self.peek() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        if self.advance() != Token::RBrace {
            return Err(SelectorError::UnclosedSet {
                label: label.to_string(),
            });
        }
        Ok(StringSet::from_values(values))
    }
}

fn collapse(mut operands: Vec<Node>, join: fn(Vec<Node>) -> Node) -> Node {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        join(operands)
    }
}
