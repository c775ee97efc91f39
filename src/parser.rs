use crate::{
    ast::{BinaryOp, LiteralValue, LogicalOp, Node, Property, Token, TokenKind, UnaryOp},
    error::ExprError,
    lexer::Lexer,
    options::ParseOptions,
};

/// Recursive-descent parser over a token list.
///
/// Each precedence level has its own `parse_*` method, from the loosest
/// binding (`parse_filter_chain`) down to `parse_primary`. The cursor is
/// owned by the parser and only moves forward; the first error ends parsing.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
    options: &'a ParseOptions,
}

/// Lexes and parses `source` with the default options.
///
/// # Examples
///
/// ```
/// use bindexpr::{parser::parse, Node};
///
/// let ast = parse("a.b").unwrap();
/// assert_eq!(ast.statements().len(), 1);
/// assert!(matches!(ast.statements()[0], Node::MemberExpression { computed: false, .. }));
/// ```
pub fn parse(source: &str) -> Result<Node, ExprError> {
    parse_with_options(source, &ParseOptions::default())
}

pub fn parse_with_options(source: &str, options: &ParseOptions) -> Result<Node, ExprError> {
    let tokens = Lexer::with_options(source, options).tokenize()?;
    Parser::new(source, tokens, options).parse_program()
}

impl<'a> Parser<'a> {
    /// `source` is only used to render error messages.
    pub fn new(source: &'a str, tokens: Vec<Token>, options: &'a ParseOptions) -> Self {
        Parser {
            source,
            tokens,
            position: 0,
            options,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Like `peek`, but running out of tokens is an error.
    fn peek_token(&self) -> Result<&Token, ExprError> {
        self.peek()
            .ok_or_else(|| ExprError::unexpected_end(self.source))
    }

    /// Returns which of `expected` the current token is, without consuming it.
    fn check(&self, expected: &[&'static str]) -> Option<&'static str> {
        let token = self.peek()?;
        expected.iter().copied().find(|text| token.is(text))
    }

    /// Consumes the current token if it is one of `expected`.
    fn expect(&mut self, expected: &[&'static str]) -> Option<&'static str> {
        let found = self.check(expected)?;
        self.position += 1;
        Some(found)
    }

    /// Consumes `expected` or fails.
    fn consume(&mut self, expected: &'static str) -> Result<(), ExprError> {
        let token = self.peek_token()?;
        if !token.is(expected) {
            return Err(ExprError::syntax(
                token,
                format!("is unexpected, expecting [{}]", expected),
                self.source,
            ));
        }
        self.position += 1;
        Ok(())
    }

    /// Consumes whatever token comes next.
    fn next_token(&mut self) -> Result<Token, ExprError> {
        let token = self.peek_token()?.clone();
        self.position += 1;
        Ok(token)
    }

    /// Parses the whole token list into a `Program`.
    pub fn parse_program(&mut self) -> Result<Node, ExprError> {
        let mut body = vec![];

        loop {
            if self.peek().is_some() && self.check(&["}", ")", ";", "]"]).is_none() {
                body.push(Node::statement(self.parse_filter_chain()?));
            }
            if self.expect(&[";"]).is_none() {
                break;
            }
        }

        if let Some(token) = self.peek() {
            return Err(ExprError::syntax(token, "is an unexpected token", self.source));
        }

        Ok(Node::program(body))
    }

    fn parse_filter_chain(&mut self) -> Result<Node, ExprError> {
        let mut left = self.parse_assignment()?;
        while self.expect(&["|"]).is_some() {
            left = self.parse_filter(left)?;
        }
        Ok(left)
    }

    /// `name:arg:arg` after a pipe; the piped value becomes the first argument.
    fn parse_filter(&mut self, base: Node) -> Result<Node, ExprError> {
        let callee = self.parse_identifier()?;
        let mut arguments = vec![base];
        while self.expect(&[":"]).is_some() {
            arguments.push(self.parse_assignment()?);
        }
        Ok(Node::call(callee, arguments, true))
    }

    fn parse_assignment(&mut self) -> Result<Node, ExprError> {
        let result = self.parse_ternary()?;

        if self.expect(&["="]).is_some() {
            if !result.is_assignable() {
                return Err(ExprError::non_assignable(self.source));
            }
            // Right-associative: a = b = c is a = (b = c)
            let right = self.parse_assignment()?;
            return Ok(Node::assignment(result, right));
        }
        Ok(result)
    }

    fn parse_ternary(&mut self) -> Result<Node, ExprError> {
        let test = self.parse_logical_or()?;

        if self.expect(&["?"]).is_some() {
            let alternate = self.parse_assignment()?;
            self.consume(":")?;
            let consequent = self.parse_assignment()?;
            return Ok(Node::conditional(test, alternate, consequent));
        }
        Ok(test)
    }

    fn parse_logical_or(&mut self) -> Result<Node, ExprError> {
        let mut left = self.parse_logical_and()?;

        while self.expect(&["||"]).is_some() {
            let right = self.parse_logical_and()?;
            left = Node::logical(LogicalOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Node, ExprError> {
        let mut left = self.parse_equality()?;

        while self.expect(&["&&"]).is_some() {
            let right = self.parse_equality()?;
            left = Node::logical(LogicalOp::And, left, right);
        }
        Ok(left)
    }

    /// One left-associative binary level: `next (op next)*`.
    fn parse_binary_level(
        &mut self,
        operators: &[&'static str],
        next: fn(&mut Self) -> Result<Node, ExprError>,
    ) -> Result<Node, ExprError> {
        let mut left = next(self)?;

        while let Some(op) = self.expect(operators).and_then(BinaryOp::from_symbol) {
            let right = next(self)?;
            left = Node::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Node, ExprError> {
        self.parse_binary_level(&["==", "!=", "===", "!=="], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> Result<Node, ExprError> {
        self.parse_binary_level(&["<", ">", "<=", ">="], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Node, ExprError> {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ExprError> {
        self.parse_binary_level(&["*", "/", "%"], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> Result<Node, ExprError> {
        match self.expect(&["+", "-", "!"]).and_then(UnaryOp::from_symbol) {
            // Right-associative: !-x is !(-x)
            Some(op) => Ok(Node::unary(op, self.parse_unary()?)),
            None => self.parse_primary(),
        }
    }

    /// Parse primary expressions (atoms) and the postfix call/member chain
    /// that follows them.
    fn parse_primary(&mut self) -> Result<Node, ExprError> {
        let mut primary = if self.expect(&["("]).is_some() {
            let expr = self.parse_filter_chain()?;
            self.consume(")")?;
            expr
        } else if self.expect(&["["]).is_some() {
            self.parse_array_literal()?
        } else if self.expect(&["{"]).is_some() {
            self.parse_object_literal()?
        } else {
            let token = self.next_token()?;
            match &token.kind {
                TokenKind::Identifier => match token.text.as_str() {
                    "this" => Node::ThisExpression,
                    "$locals" => Node::LocalsExpression,
                    name => match self.options.literal(name) {
                        Some(value) => Node::Literal {
                            value: value.clone(),
                        },
                        None => Node::identifier(name),
                    },
                },
                TokenKind::Constant(value) => Node::Literal {
                    value: value.clone(),
                },
                TokenKind::Operator => {
                    return Err(ExprError::syntax(
                        &token,
                        "not a primary expression",
                        self.source,
                    ));
                }
            }
        };

        // Calls and member accesses share one precedence level and apply
        // left to right.
        while let Some(next) = self.expect(&["(", "[", "."]) {
            primary = match next {
                "(" => {
                    let arguments = self.parse_arguments()?;
                    self.consume(")")?;
                    Node::call(primary, arguments, false)
                }
                "[" => {
                    let property = self.parse_assignment()?;
                    self.consume("]")?;
                    Node::member(primary, property, true)
                }
                _ => {
                    // After a dot every identifier is a plain property name,
                    // keywords included.
                    let property = self.parse_identifier()?;
                    Node::member(primary, property, false)
                }
            };
        }

        Ok(primary)
    }

    fn parse_identifier(&mut self) -> Result<Node, ExprError> {
        let token = self.next_token()?;
        if !token.is_identifier() {
            return Err(ExprError::syntax(
                &token,
                "is not a valid identifier",
                self.source,
            ));
        }
        Ok(Node::identifier(token.text))
    }

    fn parse_constant(&mut self) -> Result<Node, ExprError> {
        let token = self.next_token()?;
        let value = token.value().cloned().unwrap_or(LiteralValue::Undefined);
        Ok(Node::Literal { value })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>, ExprError> {
        let mut arguments = vec![];

        if !self.peek_token()?.is(")") {
            loop {
                arguments.push(self.parse_filter_chain()?);
                if self.expect(&[","]).is_none() {
                    break;
                }
            }
        }
        Ok(arguments)
    }

    fn parse_array_literal(&mut self) -> Result<Node, ExprError> {
        let mut elements = vec![];

        if !self.peek_token()?.is("]") {
            loop {
                // Trailing comma
                if self.check(&["]"]).is_some() {
                    break;
                }
                elements.push(self.parse_assignment()?);
                if self.expect(&[","]).is_none() {
                    break;
                }
            }
        }

        self.consume("]")?;
        Ok(Node::ArrayExpression { elements })
    }

    fn parse_object_literal(&mut self) -> Result<Node, ExprError> {
        let mut properties = vec![];

        if !self.peek_token()?.is("}") {
            loop {
                // Trailing comma
                if self.check(&["}"]).is_some() {
                    break;
                }
                properties.push(self.parse_property()?);
                if self.expect(&[","]).is_none() {
                    break;
                }
            }
        }

        self.consume("}")?;
        Ok(Node::ObjectExpression { properties })
    }

    fn parse_property(&mut self) -> Result<Property, ExprError> {
        let token = self.peek_token()?;

        if token.is_constant() {
            let key = self.parse_constant()?;
            self.consume(":")?;
            let value = self.parse_assignment()?;
            Ok(Property::new(key, value, false))
        } else if token.is_identifier() {
            let key = self.parse_identifier()?;
            if self.expect(&[":"]).is_some() {
                let value = self.parse_assignment()?;
                Ok(Property::new(key, value, false))
            } else {
                // Shorthand: {x} is {x: x}
                Ok(Property::new(key.clone(), key, false))
            }
        } else if token.is("[") {
            self.position += 1;
            let key = self.parse_assignment()?;
            self.consume("]")?;
            self.consume(":")?;
            let value = self.parse_assignment()?;
            Ok(Property::new(key, value, true))
        } else {
            Err(ExprError::syntax(token, "invalid key", self.source))
        }
    }
}
