use super::{lex, ExprError, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Factorial,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

/// The built-in functions an expression may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Abs,
    Ln,
    Log,
    Exp,
    Floor,
    Ceil,
    Round,
    Min,
    Max,
    Pow,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            "ln" => Function::Ln,
            "log" => Function::Log,
            "exp" => Function::Exp,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "round" => Function::Round,
            "min" => Function::Min,
            "max" => Function::Max,
            "pow" => Function::Pow,
            _ => return None,
        };

        Some(function)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::Ln => "ln",
            Function::Log => "log",
            Function::Exp => "exp",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Round => "round",
            Function::Min => "min",
            Function::Max => "max",
            Function::Pow => "pow",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Min | Function::Max | Function::Pow => 2,
            _ => 1,
        }
    }
}

/// A parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number(f64),
    Variable(String),
    Unary(UnaryOp, Box<Ast>),
    Binary(BinaryOp, Box<Ast>, Box<Ast>),
    Call(Function, Vec<Ast>),
}

/// Recursive descent parser over the lexed tokens.
///
/// Grammar, loosest to tightest binding:
///   expression := term (('+' | '-') term)*
///   term       := unary (('*' | '/') unary)*
///   unary      := '-' unary | power
///   power      := postfix ('^' unary)?
///   postfix    := primary ('!' | '%')*
///   primary    := number | ident | ident '(' args ')' | '(' expression ')'
///
/// '^' is right associative, and binds tighter than unary minus so that
/// -2^2 evaluates to -4.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn parse(input: &str) -> Result<Ast, ExprError> {
        let tokens = lex(input)?;

        let mut parser = Self {
            tokens,
            position: 0,
        };

        let ast = parser.expression()?;

        match parser.peek() {
            Some(token) => Err(ExprError::UnexpectedToken(token.describe())),
            None => Ok(ast),
        }
    }

    fn expression(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => break,
            };

            self.advance();
            let rhs = self.term()?;
            lhs = Ast::Binary(op, lhs.into(), rhs.into());
        }

        Ok(lhs)
    }

    fn term(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => break,
            };

            self.advance();
            let rhs = self.unary()?;
            lhs = Ast::Binary(op, lhs.into(), rhs.into());
        }

        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Ast, ExprError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let inner = self.unary()?;

            return Ok(Ast::Unary(UnaryOp::Negate, inner.into()));
        }

        self.power()
    }

    fn power(&mut self) -> Result<Ast, ExprError> {
        let base = self.postfix()?;

        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.unary()?;

            return Ok(Ast::Binary(BinaryOp::Power, base.into(), exponent.into()));
        }

        Ok(base)
    }

    fn postfix(&mut self) -> Result<Ast, ExprError> {
        let mut inner = self.primary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Bang) => UnaryOp::Factorial,
                Some(Token::Percent) => UnaryOp::Percent,
                _ => break,
            };

            self.advance();
            inner = Ast::Unary(op, inner.into());
        }

        Ok(inner)
    }

    fn primary(&mut self) -> Result<Ast, ExprError> {
        let token = self.peek().cloned().ok_or(ExprError::UnexpectedEnd)?;

        match token {
            Token::Number(value) => {
                self.advance();
                Ok(Ast::Number(value))
            }
            Token::OpenParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(Token::CloseParen)?;

                Ok(inner)
            }
            Token::Ident(name) => {
                self.advance();

                if !matches!(self.peek(), Some(Token::OpenParen)) {
                    return Ok(Ast::Variable(name));
                }

                let function = Function::from_name(&name)
                    .ok_or_else(|| ExprError::UnknownFunction(name.clone()))?;

                self.advance();
                let args = self.arguments()?;

                if args.len() != function.arity() {
                    return Err(ExprError::WrongArity {
                        name: function.name(),
                        expected: function.arity(),
                        got: args.len(),
                    });
                }

                Ok(Ast::Call(function, args))
            }
            other => Err(ExprError::UnexpectedToken(other.describe())),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Ast>, ExprError> {
        let mut args = vec![self.expression()?];

        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            args.push(self.expression()?);
        }

        self.expect(Token::CloseParen)?;
        Ok(args)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        match self.peek() {
            Some(token) if *token == expected => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(ExprError::UnexpectedToken(token.describe())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_precedence() {
        let ast = Parser::parse("1 + 2 * 3").unwrap();

        assert_eq!(
            ast,
            Ast::Binary(
                BinaryOp::Add,
                Ast::Number(1.).into(),
                Ast::Binary(BinaryOp::Multiply, Ast::Number(2.).into(), Ast::Number(3.).into())
                    .into(),
            )
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let ast = Parser::parse("2 ^ 3 ^ 2").unwrap();

        assert_eq!(
            ast,
            Ast::Binary(
                BinaryOp::Power,
                Ast::Number(2.).into(),
                Ast::Binary(BinaryOp::Power, Ast::Number(3.).into(), Ast::Number(2.).into())
                    .into(),
            )
        );
    }

    #[test]
    fn test_rejects_trailing_tokens() {
        assert_eq!(
            Parser::parse("1 2"),
            Err(ExprError::UnexpectedToken("number 2".to_string()))
        );
    }

    #[test]
    fn test_rejects_unknown_functions() {
        assert_eq!(
            Parser::parse("frobnicate(1)"),
            Err(ExprError::UnknownFunction("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_checks_arity() {
        assert_eq!(
            Parser::parse("min(1)"),
            Err(ExprError::WrongArity {
                name: "min",
                expected: 2,
                got: 1,
            })
        );
    }

    #[test]
    fn test_unclosed_paren() {
        assert_eq!(Parser::parse("(1 + 2"), Err(ExprError::UnexpectedEnd));
    }
}
