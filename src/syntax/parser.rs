use super::tokenizer::{Token, TokenKind, Tokenizer};
use super::*;
use log::trace;

type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug)]
pub struct Parser<'t> {
    /// The filename, uri of a source code.
    source_name: String,
    tokenizer: Tokenizer<'t>,
}

impl<'t> Parser<'t> {
    pub fn new<S: AsRef<str>>(tokenizer: Tokenizer<'t>, source_name: S) -> Self {
        Self {
            tokenizer,
            source_name: source_name.as_ref().to_string(),
        }
    }

    pub fn source_name(&self) -> &str {
        self.source_name.as_str()
    }

    pub fn parse_string<S: AsRef<str> + ?Sized>(src: &S) -> ParseResult<Program> {
        let tokenizer = Tokenizer::from_string(src);
        let mut parser = Parser::new(tokenizer, "-");

        parser.parse()
    }

    pub fn parse(&mut self) -> ParseResult<Program> {
        let mut body = vec![];

        while !self.match_token(TokenKind::Eos)? {
            body.push(self.parse_stmt()?);
        }

        Ok(Program { body })
    }

    fn parse_stmt(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_stmt");

        let node = match self.peek_kind()? {
            TokenKind::If => return self.parse_if_stmt(),
            TokenKind::Char('{') => return self.parse_block(),
            _ => self.parse_expr()?,
        };

        // The statement terminator is optional.
        self.expect_token(TokenKind::Char(';'))?;

        Ok(node)
    }

    fn parse_block(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_block");
        self.consume(TokenKind::Char('{'), "`{`")?;

        let mut body = vec![];

        loop {
            match self.peek_kind()? {
                TokenKind::Char('}') => break,
                TokenKind::Eos => {
                    let token = self.next_token()?;
                    return Err(ParseError::mismatch_token(&token, "`}`"));
                }
                _ => body.push(self.parse_stmt()?),
            }
        }

        self.consume(TokenKind::Char('}'), "`}`")?;

        Ok(Node::Block(body))
    }

    fn parse_if_stmt(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_if_stmt");
        self.consume(TokenKind::If, "`if`")?;
        self.consume(TokenKind::Char('('), "`(`")?;

        let condition = self.parse_expr()?;

        self.consume(TokenKind::Char(')'), "`)`")?;

        let then_branch = self.parse_block()?;
        let else_branch = if self.expect_token(TokenKind::Else)?.is_some() {
            let branch = if self.match_token(TokenKind::If)? {
                self.parse_if_stmt()?
            } else {
                self.parse_block()?
            };
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Node::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn parse_expr(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_expr");
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_assignment");

        let lhs = self.parse_conditional()?;

        if self.expect_token(TokenKind::Char('='))?.is_none() {
            return Ok(lhs);
        }

        // assignment is right associative.
        let value = self.parse_assignment()?;

        match lhs {
            Node::Identifier(name) => Ok(Node::Assignment {
                name,
                value: Box::new(value),
            }),
            _ => Err(ParseError {
                position: self.tokenizer.current_position(),
                kind: ParseErrorKind::InvalidAssignmentTarget,
            }),
        }
    }

    fn parse_conditional(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_conditional");

        let condition = self.parse_logical_or()?;

        if self.expect_token(TokenKind::Char('?'))?.is_none() {
            return Ok(condition);
        }

        let then_value = self.parse_expr()?;
        self.consume(TokenKind::Char(':'), "`:`")?;
        let else_value = self.parse_expr()?;

        Ok(Node::Conditional {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        })
    }

    fn parse_logical_or(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_logical_or");
        self._parse_binary_op(
            Parser::parse_logical_and,
            &[(TokenKind::Or, BinaryOperator::Or)],
        )
    }

    fn parse_logical_and(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_logical_and");
        self._parse_binary_op(
            Parser::parse_rel_op1,
            &[(TokenKind::And, BinaryOperator::And)],
        )
    }

    fn parse_rel_op1(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_rel_op1");
        self._parse_binary_op(
            Parser::parse_rel_op2,
            &[
                (TokenKind::Eq, BinaryOperator::Eq),
                (TokenKind::Ne, BinaryOperator::Ne),
            ],
        )
    }

    fn parse_rel_op2(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_rel_op2");
        self._parse_binary_op(
            Parser::parse_binary_op1,
            &[
                (TokenKind::Le, BinaryOperator::Le),
                (TokenKind::Ge, BinaryOperator::Ge),
                (TokenKind::Char('<'), BinaryOperator::Lt),
                (TokenKind::Char('>'), BinaryOperator::Gt),
            ],
        )
    }

    fn parse_binary_op1(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_binary_op1");
        self._parse_binary_op(
            Parser::parse_binary_op2,
            &[
                (TokenKind::Char('+'), BinaryOperator::Add),
                (TokenKind::Char('-'), BinaryOperator::Sub),
            ],
        )
    }

    fn parse_binary_op2(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_binary_op2");
        self._parse_binary_op(
            Parser::parse_unary_op,
            &[
                (TokenKind::Char('*'), BinaryOperator::Mul),
                (TokenKind::Char('/'), BinaryOperator::Div),
                (TokenKind::Char('%'), BinaryOperator::Rem),
            ],
        )
    }

    fn parse_unary_op(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_unary_op");

        let operator = match self.peek_kind()? {
            TokenKind::Char('-') => UnaryOperator::Minus,
            TokenKind::Char('!') => UnaryOperator::Not,
            _ => return self.parse_primary(),
        };

        // unary operators are right associative.
        self.next_token()?;
        let operand = self.parse_unary_op()?;

        Ok(Node::Unary {
            operator,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> ParseResult<Node> {
        self.debug_trace("parse_primary");

        let token = self.next_token()?;
        let node = match token.kind {
            TokenKind::Integer(_) => {
                Node::Literal(Literal::new(LiteralKind::Integer, token.text()))
            }
            TokenKind::Decimal(_) => {
                Node::Literal(Literal::new(LiteralKind::Decimal, token.text()))
            }
            TokenKind::String(_) => Node::Literal(Literal::new(LiteralKind::String, token.text())),
            TokenKind::Boolean(_) => {
                Node::Literal(Literal::new(LiteralKind::Boolean, token.text()))
            }
            TokenKind::Null => Node::Literal(Literal::new(LiteralKind::Null, token.text())),
            TokenKind::QualifiedName { namespace, name } => {
                self.consume(TokenKind::Char('('), "`(` after a qualified name")?;
                self.read_call(Some(namespace), name)?
            }
            TokenKind::Identifier(name) => {
                if self.expect_token(TokenKind::Char('('))?.is_some() {
                    self.read_call(None, name)?
                } else {
                    Node::Identifier(name)
                }
            }
            TokenKind::Char('(') => {
                let expr = self.parse_expr()?;
                self.consume(TokenKind::Char(')'), "`)`")?;
                expr
            }
            _ => return Err(ParseError::mismatch_token(&token, "expression")),
        };

        Ok(node)
    }

    // The opening paren has already been consumed.
    fn read_call(&mut self, namespace: Option<String>, name: String) -> ParseResult<Node> {
        self.debug_trace("read_call");

        let mut arguments = vec![];

        loop {
            if self.expect_token(TokenKind::Char(')'))?.is_some() {
                break;
            }

            arguments.push(self.read_argument()?);

            if self.expect_token(TokenKind::Char(','))?.is_none() {
                self.consume(TokenKind::Char(')'), "`,` or `)`")?;
                break;
            }
        }

        Ok(Node::Call(CallExpression {
            namespace,
            name,
            arguments,
        }))
    }

    fn read_argument(&mut self) -> ParseResult<Argument> {
        self.debug_trace("read_argument");

        let value = self.parse_expr()?;

        // `name: value`
        if let Node::Identifier(ref name) = value {
            if self.expect_token(TokenKind::Char(':'))?.is_some() {
                return Ok(Argument {
                    name: Some(name.clone()),
                    value: self.parse_expr()?,
                });
            }
        }

        Ok(Argument { name: None, value })
    }

    fn _parse_binary_op(
        &mut self,
        next_parser: fn(&mut Parser<'t>) -> ParseResult<Node>,
        operators: &[(TokenKind, BinaryOperator)],
    ) -> ParseResult<Node> {
        let mut lhs = next_parser(self)?;

        loop {
            let kind = self.peek_kind()?;
            let operator = match operators.iter().find(|(op, _)| op == kind) {
                Some((_, operator)) => *operator,
                None => break,
            };

            self.next_token()?;
            let rhs = next_parser(self)?;

            lhs = Node::Binary {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    // --- Helpers
    fn peek_kind(&mut self) -> ParseResult<&TokenKind> {
        self.tokenizer.peek_kind().map_err(|err| err.clone().into())
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        Ok(self.tokenizer.next_token()?)
    }

    fn match_token(&mut self, kind: TokenKind) -> ParseResult<bool> {
        Ok(*self.peek_kind()? == kind)
    }

    fn expect_token(&mut self, kind: TokenKind) -> ParseResult<Option<Token>> {
        if self.match_token(kind)? {
            Ok(Some(self.next_token()?))
        } else {
            Ok(None)
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if let Some(token) = self.expect_token(kind)? {
            return Ok(token);
        }

        let token = self.next_token()?;
        Err(ParseError::mismatch_token(&token, expected))
    }

    fn debug_trace(&self, name: &str) {
        trace!(
            "[{}] {} position: {}",
            name,
            self.source_name,
            self.tokenizer.current_position()
        );
    }
}
