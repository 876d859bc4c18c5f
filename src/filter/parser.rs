//! Search expression parser
//!
//! # Grammar
//!
//! ```text
//! expr    := operand (("and" | "or") operand)*
//! operand := "(" expr ")" | word+
//! ```
//!
//! `and` and `or` are case-insensitive keywords with equal precedence,
//! applied left to right: `a or b and c` means `(a or b) and c`. Adjacent
//! words form a single term, so `foo bar` searches for the text "foo bar".
//!
//! # Examples
//!
//! ```text
//! coding
//! coding and review
//! (meeting or call) and weekly
//! ```

use thiserror::Error;

/// Parsed search expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchExpr {
    Leaf(String),
    And(Box<SearchExpr>, Box<SearchExpr>),
    Or(Box<SearchExpr>, Box<SearchExpr>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty search expression")]
    Empty,
    #[error("Missing search term after '{0}'")]
    MissingOperand(String),
    #[error("Unexpected '{0}' in search expression")]
    Unexpected(String),
    #[error("Unbalanced parentheses in search expression")]
    Unbalanced,
    #[error("Empty parentheses in search expression")]
    EmptyGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    And,
    Or,
    Open,
    Close,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Word(word) => word.clone(),
            Token::And => "AND".to_string(),
            Token::Or => "OR".to_string(),
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
        }
    }
}

fn push_word(word: &mut String, tokens: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }
    let token = match word.to_lowercase().as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        _ => Token::Word(word.clone()),
    };
    tokens.push(token);
    word.clear();
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in input.chars() {
        match c {
            '(' => {
                push_word(&mut word, &mut tokens);
                tokens.push(Token::Open);
            }
            ')' => {
                push_word(&mut word, &mut tokens);
                tokens.push(Token::Close);
            }
            c if c.is_whitespace() => push_word(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    push_word(&mut word, &mut tokens);

    tokens
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_expr(&mut self) -> Result<SearchExpr, ParseError> {
        let mut left = self.parse_operand(None)?;

        loop {
            match self.peek() {
                Some(Token::And) | Some(Token::Or) => {
                    let op = self.next().ok_or(ParseError::Empty)?;
                    let right = self.parse_operand(Some(&op))?;
                    left = match op {
                        Token::And => SearchExpr::And(Box::new(left), Box::new(right)),
                        _ => SearchExpr::Or(Box::new(left), Box::new(right)),
                    };
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_operand(&mut self, after: Option<&Token>) -> Result<SearchExpr, ParseError> {
        match self.peek().cloned() {
            None => Err(match after {
                Some(op) => ParseError::MissingOperand(op.text()),
                None => ParseError::Empty,
            }),
            Some(Token::Open) => {
                self.next();
                if self.peek() == Some(&Token::Close) {
                    return Err(ParseError::EmptyGroup);
                }
                let inner = self.parse_expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(ParseError::Unbalanced),
                }
            }
            Some(Token::Word(_)) => {
                let mut words = Vec::new();
                while let Some(Token::Word(word)) = self.peek() {
                    words.push(word.clone());
                    self.pos += 1;
                }
                Ok(SearchExpr::Leaf(words.join(" ")))
            }
            Some(Token::Close) if after.is_none() => Err(ParseError::Unbalanced),
            Some(token) => Err(match after {
                Some(op) => ParseError::MissingOperand(op.text()),
                None => ParseError::Unexpected(token.text()),
            }),
        }
    }
}

/// Parse a search expression
pub fn parse_search(input: &str) -> Result<SearchExpr, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(input),
        pos: 0,
    };
    let expr = parser.parse_expr()?;

    match parser.peek() {
        None => Ok(expr),
        Some(Token::Close) => Err(ParseError::Unbalanced),
        Some(token) => Err(ParseError::Unexpected(token.text())),
    }
}
