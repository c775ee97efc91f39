use log::trace;

use crate::{
    ast::{LiteralValue, Token, TokenKind},
    error::ExprError,
    options::ParseOptions,
};

const PUNCTUATION: &[char] = &['(', ')', '[', ']', '{', '}', ',', ';', ':', '.', '?'];
const OPERATORS_3: &[&str] = &["===", "!=="];
const OPERATORS_2: &[&str] = &["==", "!=", "<=", ">=", "&&", "||"];
const OPERATORS_1: &[char] = &['+', '-', '*', '/', '%', '!', '=', '<', '>', '|'];

pub struct Lexer<'a> {
    source: &'a str,
    input: Vec<char>,
    position: usize,
    is_identifier_start: fn(char) -> bool,
    is_identifier_continue: fn(char) -> bool,
}

/// Tokenizes `source` with the default options.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    Lexer::new(source).tokenize()
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_options(source, &ParseOptions::default())
    }

    pub fn with_options(source: &'a str, options: &ParseOptions) -> Self {
        Lexer {
            source,
            input: source.chars().collect(),
            position: 0,
            is_identifier_start: options.identifier_start_fn(),
            is_identifier_continue: options.identifier_continue_fn(),
        }
    }

    /// Consumes the lexer and returns every token in source order.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        trace!("lexed {} tokens from [{}]", tokens.len(), self.source);
        Ok(tokens)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn slice(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn error(&self, message: impl Into<String>, index: usize) -> ExprError {
        ExprError::lexical(message, index, self.source)
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        self.advance();
        while let Some(ch) = self.current_char() {
            if (self.is_identifier_continue)(ch) {
                self.advance();
            } else {
                break;
            }
        }
        Token::new(self.slice(start), start, TokenKind::Identifier)
    }

    fn read_string(&mut self, quote: char) -> Result<Token, ExprError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(Token::new(
                        self.slice(start),
                        start,
                        TokenKind::Constant(LiteralValue::String(result)),
                    ));
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('f') => result.push('\u{000C}'),
                        Some('r') => result.push('\r'),
                        Some('t') => result.push('\t'),
                        Some('v') => result.push('\u{000B}'),
                        Some('u') => {
                            let hex: String =
                                self.input.iter().skip(self.position + 1).take(4).collect();
                            let decoded = (hex.len() == 4)
                                .then(|| u32::from_str_radix(&hex, 16).ok())
                                .flatten()
                                .and_then(char::from_u32);
                            match decoded {
                                Some(decoded) => result.push(decoded),
                                None => {
                                    return Err(self.error(
                                        format!("Invalid unicode escape [\\u{}]", hex),
                                        self.position - 1,
                                    ));
                                }
                            }
                            self.position += 4;
                        }
                        // Any other escaped character stands for itself
                        Some(other) => result.push(other),
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("Unterminated quote", start))
    }

    /// A `.` after digits belongs to the number unless it starts a member
    /// access such as `1.toString`.
    fn dot_continues_number(&self) -> bool {
        match self.peek_char(1) {
            None => true,
            Some(c) if c.is_ascii_digit() => true,
            Some('e' | 'E') => self
                .peek_char(2)
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-'),
            Some(c) => !(self.is_identifier_start)(c),
        }
    }

    fn read_number(&mut self) -> Result<Token, ExprError> {
        let start = self.position;
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !is_float && self.dot_continues_number() {
                is_float = true;
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            match (self.peek_char(1), self.peek_char(2)) {
                (Some(d), _) if d.is_ascii_digit() => {
                    is_float = true;
                    self.advance();
                }
                (Some('+' | '-'), Some(d)) if d.is_ascii_digit() => {
                    is_float = true;
                    self.advance();
                    self.advance();
                }
                _ => return Err(self.error("Invalid exponent", self.position)),
            }
            while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.slice(start);
        let integer = if is_float {
            None
        } else {
            text.parse::<i64>().ok()
        };
        let value = match integer {
            Some(n) => LiteralValue::Integer(n),
            None => match text.parse::<f64>() {
                Ok(n) => LiteralValue::Float(n),
                Err(_) => return Err(self.error(format!("Invalid number [{}]", text), start)),
            },
        };

        Ok(Token::new(text, start, TokenKind::Constant(value)))
    }

    fn read_operator(&mut self) -> Result<Token, ExprError> {
        let start = self.position;
        let ahead = |n: usize| -> String { self.input.iter().skip(start).take(n).collect() };

        let three = ahead(3);
        let two = ahead(2);
        let length = if OPERATORS_3.contains(&three.as_str()) {
            3
        } else if OPERATORS_2.contains(&two.as_str()) {
            2
        } else if self.current_char().is_some_and(|c| OPERATORS_1.contains(&c)) {
            1
        } else {
            let ch = self.current_char().unwrap_or_default();
            return Err(self.error(format!("Unexpected next character '{}'", ch), start));
        };

        self.position += length;
        Ok(Token::new(self.slice(start), start, TokenKind::Operator))
    }

    /// Returns the next token, or `None` at the end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, ExprError> {
        self.skip_whitespace();

        let token = match self.current_char() {
            None => return Ok(None),
            Some(quote @ ('"' | '\'')) => self.read_string(quote)?,
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some('.') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()?
            }
            Some(ch) if PUNCTUATION.contains(&ch) => {
                let start = self.position;
                self.advance();
                Token::new(ch.to_string(), start, TokenKind::Operator)
            }
            Some(ch) if (self.is_identifier_start)(ch) => self.read_identifier(),
            Some(_) => self.read_operator()?,
        };

        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.text)
            .collect()
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(texts("a===b"), vec!["a", "===", "b"]);
        assert_eq!(texts("a!==b"), vec!["a", "!==", "b"]);
        assert_eq!(texts("a==b"), vec!["a", "==", "b"]);
        assert_eq!(texts("a=b"), vec!["a", "=", "b"]);
        assert_eq!(texts("a||b|c"), vec!["a", "||", "b", "|", "c"]);
    }

    #[test]
    fn test_token_index() {
        let tokens = tokenize("  foo + 'x'").unwrap();
        let indexes: Vec<usize> = tokens.iter().map(|t| t.index).collect();
        assert_eq!(indexes, vec![2, 6, 8]);
    }
}
