use std::str::FromStr;

use thiserror::Error;

use crate::{Symbol, Tree};

/// An error resulting from parsing a [`Tree`] or a [`Pattern`](crate::Pattern).
///
/// Positions are byte offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A character that cannot start any token.
    #[error("unexpected character {found:?} at {pos}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Where it was found.
        pos: usize,
    },
    /// A string literal without its closing quote.
    #[error("unterminated string starting at {pos}")]
    UnterminatedString {
        /// Where the string started.
        pos: usize,
    },
    /// A token that does not fit the grammar here.
    #[error("expected {expected} at {pos}, found {found:?}")]
    UnexpectedToken {
        /// What the parser was looking for.
        expected: &'static str,
        /// The source text of the token it found.
        found: String,
        /// Where it was found.
        pos: usize,
    },
    /// The input ended in the middle of an expression.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Num(f64),
    Str(String),
    Symbol(char),
}

impl Token {
    fn src(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Num(n) => n.to_string(),
            Token::Str(s) => format!("\"{}\"", s),
            Token::Symbol(c) => c.to_string(),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>> {
    let mut tokens = vec![];
    let mut chars = src.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    None => return Err(ParseError::UnterminatedString { pos }),
                    Some((_, '"')) => break,
                    Some((_, '\\')) => match chars.next() {
                        Some((_, escaped)) => value.push(escaped),
                        None => return Err(ParseError::UnterminatedString { pos }),
                    },
                    Some((_, c)) => value.push(c),
                }
            }
            tokens.push((Token::Str(value), pos));
        } else if c.is_ascii_digit() {
            let mut digits = String::new();
            let mut seen_dot = false;
            while let Some(&(_, c)) = chars.peek() {
                match c {
                    '_' => {}
                    '.' if !seen_dot => {
                        seen_dot = true;
                        digits.push(c);
                    }
                    c if c.is_ascii_digit() => digits.push(c),
                    _ => break,
                }
                chars.next();
            }
            let value = digits
                .parse()
                .map_err(|_| ParseError::UnexpectedChar { found: '.', pos })?;
            tokens.push((Token::Num(value), pos));
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((Token::Ident(ident), pos));
        } else if "+-*/^(),".contains(c) {
            chars.next();
            tokens.push((Token::Symbol(c), pos));
        } else {
            return Err(ParseError::UnexpectedChar { found: c, pos });
        }
    }

    Ok(tokens)
}

/// Recursive descent over the token stream.
///
/// ```text
/// sum     := product (("+" | "-") product)*
/// product := power (("*" | "/") power)*
/// power   := prefix ("^" power)?
/// prefix  := "-" number | "-" prefix | value
/// value   := number | string | bool | ident | ident "(" args ")" | "(" sum ")"
/// ```
///
/// `+ - * /` associate to the left, `^` to the right, and negation binds
/// tighter than `^`.
struct Parser {
    tokens: Vec<(Token, usize)>,
    index: usize,
}

impl Parser {
    fn peek_symbol(&self) -> Option<char> {
        match self.tokens.get(self.index) {
            Some((Token::Symbol(c), _)) => Some(*c),
            _ => None,
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<(Token, usize)> {
        let token = self
            .tokens
            .get(self.index)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd { expected })?;
        self.index += 1;
        Ok(token)
    }

    fn expect_symbol(&mut self, symbol: char, expected: &'static str) -> Result<()> {
        match self.next(expected)? {
            (Token::Symbol(c), _) if c == symbol => Ok(()),
            (token, pos) => Err(ParseError::UnexpectedToken {
                expected,
                found: token.src(),
                pos,
            }),
        }
    }

    fn sum(&mut self) -> Result<Tree> {
        let mut tree = self.product()?;
        while let Some(op @ ('+' | '-')) = self.peek_symbol() {
            self.index += 1;
            let right = self.product()?;
            tree = Tree::binary(Symbol::from(op.to_string()), tree, right);
        }
        Ok(tree)
    }

    fn product(&mut self) -> Result<Tree> {
        let mut tree = self.power()?;
        while let Some(op @ ('*' | '/')) = self.peek_symbol() {
            self.index += 1;
            let right = self.power()?;
            tree = Tree::binary(Symbol::from(op.to_string()), tree, right);
        }
        Ok(tree)
    }

    fn power(&mut self) -> Result<Tree> {
        let base = self.prefix()?;
        if self.peek_symbol() == Some('^') {
            self.index += 1;
            let exponent = self.power()?;
            return Ok(Tree::binary("^", base, exponent));
        }
        Ok(base)
    }

    fn prefix(&mut self) -> Result<Tree> {
        if self.peek_symbol() == Some('-') {
            self.index += 1;
            // a sign directly on a number is part of the literal
            if let Some((Token::Num(n), _)) = self.tokens.get(self.index) {
                let n = *n;
                self.index += 1;
                return Ok(Tree::num(-n));
            }
            return Ok(Tree::neg(self.prefix()?));
        }
        self.value()
    }

    fn value(&mut self) -> Result<Tree> {
        match self.next("a value")? {
            (Token::Num(n), _) => Ok(Tree::num(n)),
            (Token::Str(s), _) => Ok(Tree::string(&s)),
            (Token::Ident(name), _) if name == "true" || name == "false" => {
                Ok(Tree::boolean(name == "true"))
            }
            (Token::Ident(name), _) => {
                if self.peek_symbol() != Some('(') {
                    return Ok(Tree::var(name));
                }
                self.index += 1;
                let mut args = vec![];
                if self.peek_symbol() == Some(')') {
                    self.index += 1;
                    return Ok(Tree::call(name, args));
                }
                loop {
                    args.push(self.sum()?);
                    match self.next("',' or ')'")? {
                        (Token::Symbol(','), _) => continue,
                        (Token::Symbol(')'), _) => break,
                        (token, pos) => {
                            return Err(ParseError::UnexpectedToken {
                                expected: "',' or ')'",
                                found: token.src(),
                                pos,
                            })
                        }
                    }
                }
                Ok(Tree::call(name, args))
            }
            (Token::Symbol('('), _) => {
                let tree = self.sum()?;
                self.expect_symbol(')', "')'")?;
                Ok(tree)
            }
            (token, pos) => Err(ParseError::UnexpectedToken {
                expected: "a value",
                found: token.src(),
                pos,
            }),
        }
    }
}

impl FromStr for Tree {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser {
            tokens: tokenize(s)?,
            index: 0,
        };
        let tree = parser.sum()?;
        match parser.tokens.get(parser.index) {
            None => Ok(tree),
            Some((token, pos)) => Err(ParseError::UnexpectedToken {
                expected: "end of input",
                found: token.src(),
                pos: *pos,
            }),
        }
    }
}
