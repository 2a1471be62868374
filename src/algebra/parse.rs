use crate::algebra::{BinaryOperation, Expression, Operand};
use std::ops::Range;
use thiserror::Error;

/// Parse an [`Expression`] tree from some text.
///
/// Parsing happens in four passes:
///
/// 1. Tokenizing, where a `-` directly in front of a number is treated as
///    part of that number whenever an operand is expected (e.g. `2 * -3`)
/// 2. Inserting the `*` implied by juxtaposition (`3x`, `2(x + 1)`, `)(`)
/// 3. Converting the infix token stream to postfix with the shunting-yard
///    algorithm
/// 4. Building the tree from the postfix tokens
pub fn parse(s: &str) -> Result<Expression, ParseError> {
    if s.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let tokens = Tokens::new(s).collect::<Result<Vec<_>, _>>()?;
    let tokens = insert_implicit_multiplication(tokens);
    let postfix = to_postfix(tokens)?;

    build_tree(postfix)
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Equation cannot be empty")]
    EmptyInput,
    #[error("Invalid character '{character}' at index {index}")]
    InvalidCharacter { character: char, index: usize },
    #[error("Mismatched parentheses at index {index}")]
    MismatchedParentheses { index: usize },
    #[error("Missing operands for operator {operator} at index {index}")]
    MissingOperands { operator: BinaryOperation, index: usize },
    #[error("Malformed expression")]
    MalformedExpression,
}

/// Does a token of this kind end an operand?
fn closes_operand(kind: TokenKind) -> bool {
    match kind {
        TokenKind::Number | TokenKind::Identifier | TokenKind::CloseParen => {
            true
        },
        _ => false,
    }
}

/// Can a token of this kind start an operand?
fn opens_operand(kind: TokenKind) -> bool {
    match kind {
        TokenKind::Number | TokenKind::Identifier | TokenKind::OpenParen => {
            true
        },
        _ => false,
    }
}

fn insert_implicit_multiplication(tokens: Vec<Token<'_>>) -> Vec<Token<'_>> {
    let mut output: Vec<Token<'_>> = Vec::with_capacity(tokens.len());

    for token in tokens {
        if let Some(previous) = output.last() {
            if closes_operand(previous.kind) && opens_operand(token.kind) {
                let position = previous.span.end;
                output.push(Token {
                    text: "*",
                    span: position..position,
                    kind: TokenKind::Operator(BinaryOperation::Times),
                });
            }
        }

        output.push(token);
    }

    output
}

/// Dijkstra's shunting-yard algorithm.
fn to_postfix(tokens: Vec<Token<'_>>) -> Result<Vec<Token<'_>>, ParseError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token<'_>> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::Number | TokenKind::Identifier => output.push(token),
            TokenKind::OpenParen => stack.push(token),
            TokenKind::CloseParen => loop {
                match stack.pop() {
                    Some(top) if top.kind == TokenKind::OpenParen => break,
                    Some(top) => output.push(top),
                    None => {
                        return Err(ParseError::MismatchedParentheses {
                            index: token.span.start,
                        })
                    },
                }
            },
            TokenKind::Operator(op) => {
                while let Some(top) = stack.last() {
                    let should_pop = match top.kind {
                        TokenKind::Operator(top_op) => {
                            top_op.precedence() > op.precedence()
                                || (top_op.precedence() == op.precedence()
                                    && !op.is_right_associative())
                        },
                        _ => false,
                    };

                    if !should_pop {
                        break;
                    }
                    output.extend(stack.pop());
                }

                stack.push(token);
            },
        }
    }

    while let Some(top) = stack.pop() {
        match top.kind {
            TokenKind::Operator(_) => output.push(top),
            _ => {
                return Err(ParseError::MismatchedParentheses {
                    index: top.span.start,
                })
            },
        }
    }

    Ok(output)
}

fn build_tree(postfix: Vec<Token<'_>>) -> Result<Expression, ParseError> {
    let mut operands: Vec<Expression> = Vec::new();

    for token in postfix {
        match token.kind {
            TokenKind::Number => {
                // the tokenizer only produces valid f64 literals
                let value = token
                    .text
                    .parse()
                    .map_err(|_| ParseError::MalformedExpression)?;

                operands.push(Expression::Operand(Operand::Constant {
                    value,
                    text: token.text.into(),
                }));
            },
            TokenKind::Identifier => {
                operands.push(Expression::parameter(token.text))
            },
            TokenKind::Operator(op) => {
                // the right operand is on top of the stack
                match (operands.pop(), operands.pop()) {
                    (Some(right), Some(left)) => {
                        operands.push(Expression::binary(left, op, right))
                    },
                    _ => {
                        return Err(ParseError::MissingOperands {
                            operator: op,
                            index: token.span.start,
                        })
                    },
                }
            },
            TokenKind::OpenParen | TokenKind::CloseParen => {
                return Err(ParseError::MismatchedParentheses {
                    index: token.span.start,
                })
            },
        }
    }

    match (operands.pop(), operands.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(ParseError::MalformedExpression),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tokens<'a> {
    src: &'a str,
    cursor: usize,
    previous: Option<TokenKind>,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Tokens {
            src,
            cursor: 0,
            previous: None,
        }
    }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    /// Is there a number literal starting `offset` bytes past the cursor?
    fn number_starts_at(&self, offset: usize) -> bool {
        let mut chars = self.rest()[offset..].chars();

        match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => chars.next().map_or(false, |c| c.is_ascii_digit()),
            _ => false,
        }
    }

    /// A `-` belongs to the number after it when we're expecting an operand
    /// rather than an operator.
    fn expecting_operand(&self) -> bool {
        match self.previous {
            None
            | Some(TokenKind::Operator(_))
            | Some(TokenKind::OpenParen) => true,
            _ => false,
        }
    }

    fn chomp(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        let start = self.cursor;
        self.advance()?;
        let end = self.cursor;

        Some(Token::from_text(self.src, start..end, kind))
    }

    fn take_while<P>(&mut self, mut predicate: P) -> Range<usize>
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        start..self.cursor
    }

    fn chomp_number(&mut self) -> Token<'a> {
        let start = self.cursor;

        if self.peek() == Some('-') {
            self.advance();
        }
        self.take_while(|c| c.is_ascii_digit());

        if self.peek() == Some('.') {
            // skip past the decimal
            self.advance();
            self.take_while(|c| c.is_ascii_digit());
        }

        let end = self.cursor;

        Token::from_text(self.src, start..end, TokenKind::Number)
    }

    fn chomp_identifier(&mut self) -> Token<'a> {
        let mut seen_first_character = false;

        let span = self.take_while(|c| {
            if seen_first_character {
                c.is_alphanumeric()
            } else {
                seen_first_character = true;
                c.is_alphabetic()
            }
        });

        Token::from_text(self.src, span, TokenKind::Identifier)
    }

    fn next_token(&mut self) -> Option<Result<Token<'a>, ParseError>> {
        loop {
            let token = match self.peek()? {
                space if space.is_whitespace() => {
                    self.advance();
                    continue;
                },
                '-' if self.expecting_operand() && self.number_starts_at(1) => {
                    self.chomp_number()
                },
                '.' if self.number_starts_at(0) => self.chomp_number(),
                '0'..='9' => self.chomp_number(),
                '(' => self.chomp(TokenKind::OpenParen)?,
                ')' => self.chomp(TokenKind::CloseParen)?,
                '+' => self.chomp(TokenKind::Operator(BinaryOperation::Plus))?,
                '-' => {
                    self.chomp(TokenKind::Operator(BinaryOperation::Minus))?
                },
                '*' => {
                    self.chomp(TokenKind::Operator(BinaryOperation::Times))?
                },
                '/' => {
                    self.chomp(TokenKind::Operator(BinaryOperation::Divide))?
                },
                '^' => {
                    self.chomp(TokenKind::Operator(BinaryOperation::Power))?
                },
                letter if letter.is_alphabetic() => self.chomp_identifier(),
                other => {
                    return Some(Err(ParseError::InvalidCharacter {
                        character: other,
                        index: self.cursor,
                    }))
                },
            };

            return Some(Ok(token));
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let got = self.next_token();

        if let Some(Ok(token)) = &got {
            self.previous = Some(token.kind);
        }

        got
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token<'a> {
    text: &'a str,
    span: Range<usize>,
    kind: TokenKind,
}

impl<'a> Token<'a> {
    fn from_text(
        original_source: &'a str,
        span: Range<usize>,
        kind: TokenKind,
    ) -> Self {
        Token {
            text: &original_source[span.clone()],
            span,
            kind,
        }
    }
}

/// The kinds of token that can appear in an [`Expression`]'s text form.
#[derive(Debug, Copy, Clone, PartialEq)]
enum TokenKind {
    Identifier,
    Number,
    OpenParen,
    CloseParen,
    Operator(BinaryOperation),
}
