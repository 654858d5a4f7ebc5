use crate::ast::{
    ArrayAccess, ArrayLiteral, Assignment, BinaryOp, BinaryOperator, Expression,
    ExpressionStatement, For, FunctionCall, FunctionDefinition, If, Literal, Print, Program,
    Return, Statement, TryCatch, UnaryOp, UnaryOperator, Variable, While,
};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::token::{Position, Token, TokenKind};

/// How deeply blocks and expressions may nest before parsing gives up.
pub const MAX_NESTING: usize = 128;

/// Parses a whole program from source text.
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(source)?.parse_program()
}

/// Recursive descent over the lexer's token stream.
///
/// `current` is the one token of lookahead the grammar needs. A second token
/// is pulled into `peeked` only to tell `name = ...` apart from an expression
/// statement that starts with a name.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Parser<'a>> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            peeked: None,
            depth: 0,
        })
    }

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.statement()?);
        }
        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Statement> {
        if let TokenKind::Identifier(_) = self.current.kind {
            if self.peek()?.kind == TokenKind::Equal {
                let assignment = self.assignment()?;
                self.consume(TokenKind::Semicolon)?;
                return Ok(Statement::Assignment(assignment));
            }
        }
        match self.current.kind {
            TokenKind::Let => {
                let assignment = self.assignment()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Statement::Assignment(assignment))
            }
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Function => self.function_definition(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Print => self.print_statement(),
            TokenKind::Try => self.try_statement(),
            _ => {
                let expression = self.expression()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Statement::Expression(ExpressionStatement { expression }))
            }
        }
    }

    /// `let name = expr` or `name = expr`, without the terminating ';'.
    fn assignment(&mut self) -> Result<Assignment> {
        let declaration = self.next_if(TokenKind::Let)?;
        let position = self.current.position;
        let name = self.identifier()?;
        self.consume(TokenKind::Equal)?;
        let value = self.expression()?;
        Ok(Assignment {
            name,
            value,
            declaration,
            position,
        })
    }

    fn if_statement(&mut self) -> Result<Statement> {
        let position = self.consume(TokenKind::If)?.position;
        let condition = self.parenthesized()?;
        let then_branch = self.block()?;
        let else_branch = if self.next_if(TokenKind::Else)? {
            self.block()?
        } else {
            Vec::new()
        };
        Ok(Statement::If(If {
            condition,
            then_branch,
            else_branch,
            position,
        }))
    }

    fn while_statement(&mut self) -> Result<Statement> {
        let position = self.consume(TokenKind::While)?.position;
        let condition = self.parenthesized()?;
        let body = self.block()?;
        Ok(Statement::While(While {
            condition,
            body,
            position,
        }))
    }

    fn for_statement(&mut self) -> Result<Statement> {
        let position = self.consume(TokenKind::For)?.position;
        self.consume(TokenKind::LeftParen)?;
        let initializer = self.assignment()?;
        self.consume(TokenKind::Semicolon)?;
        let condition = self.expression()?;
        self.consume(TokenKind::Semicolon)?;
        if self.current.kind == TokenKind::Let {
            return Err(self.error("assignment"));
        }
        let increment = self.assignment()?;
        self.consume(TokenKind::RightParen)?;
        let body = self.block()?;
        Ok(Statement::For(For {
            initializer,
            condition,
            increment,
            body,
            position,
        }))
    }

    fn function_definition(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Function)?;
        let name = self.identifier()?;
        self.consume(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if self.current.kind != TokenKind::RightParen {
            params.push(self.identifier()?);
            while self.next_if(TokenKind::Comma)? {
                params.push(self.identifier()?);
            }
        }
        self.consume(TokenKind::RightParen)?;
        let body = self.block()?;
        Ok(Statement::FunctionDefinition(FunctionDefinition {
            name,
            params,
            body,
        }))
    }

    fn return_statement(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Return)?;
        let value = if self.current.kind == TokenKind::Semicolon {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Return(Return { value }))
    }

    fn print_statement(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Print)?;
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Print(Print { value }))
    }

    fn try_statement(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Try)?;
        let try_block = self.block()?;
        self.consume(TokenKind::Catch)?;
        let catch_block = self.block()?;
        Ok(Statement::TryCatch(TryCatch {
            try_block,
            catch_block,
        }))
    }

    fn block(&mut self) -> Result<Vec<Statement>> {
        self.nested(Self::block_body)
    }

    fn block_body(&mut self) -> Result<Vec<Statement>> {
        self.consume(TokenKind::LeftBrace)?;
        let mut statements = Vec::new();
        while self.current.kind != TokenKind::RightBrace {
            if self.is_at_end() {
                return Err(self.error(&TokenKind::RightBrace.to_string()));
            }
            statements.push(self.statement()?);
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(statements)
    }

    fn parenthesized(&mut self) -> Result<Expression> {
        self.consume(TokenKind::LeftParen)?;
        let expression = self.expression()?;
        self.consume(TokenKind::RightParen)?;
        Ok(expression)
    }

    pub fn expression(&mut self) -> Result<Expression> {
        self.nested(Self::or)
    }

    fn or(&mut self) -> Result<Expression> {
        self.binary_level(Self::and, |kind| match kind {
            TokenKind::OrOr => Some(BinaryOperator::Or),
            _ => None,
        })
    }

    fn and(&mut self) -> Result<Expression> {
        self.binary_level(Self::equality, |kind| match kind {
            TokenKind::AndAnd => Some(BinaryOperator::And),
            _ => None,
        })
    }

    fn equality(&mut self) -> Result<Expression> {
        self.binary_level(Self::comparison, |kind| match kind {
            TokenKind::EqualEqual => Some(BinaryOperator::Equal),
            TokenKind::BangEqual => Some(BinaryOperator::NotEqual),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Expression> {
        self.binary_level(Self::additive, |kind| match kind {
            TokenKind::Less => Some(BinaryOperator::Less),
            TokenKind::LessEqual => Some(BinaryOperator::LessEqual),
            TokenKind::Greater => Some(BinaryOperator::Greater),
            TokenKind::GreaterEqual => Some(BinaryOperator::GreaterEqual),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<Expression> {
        self.binary_level(Self::multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOperator::Add),
            TokenKind::Minus => Some(BinaryOperator::Subtract),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Result<Expression> {
        self.binary_level(Self::unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOperator::Multiply),
            TokenKind::Slash => Some(BinaryOperator::Divide),
            TokenKind::Percent => Some(BinaryOperator::Modulo),
            _ => None,
        })
    }

    /// One left-associative precedence level: `operand (op operand)*`.
    fn binary_level(
        &mut self,
        operand: fn(&mut Parser<'a>) -> Result<Expression>,
        operator_for: fn(&TokenKind) -> Option<BinaryOperator>,
    ) -> Result<Expression> {
        let mut expr = operand(self)?;
        while let Some(operator) = operator_for(&self.current.kind) {
            let position = self.advance()?.position;
            let right = operand(self)?;
            expr = Expression::Binary(BinaryOp {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                position,
            });
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expression> {
        let operator = match self.current.kind {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Bang => UnaryOperator::Not,
            _ => return self.primary(),
        };
        let position = self.advance()?.position;
        let operand = self.nested(Self::unary)?;
        Ok(Expression::Unary(UnaryOp {
            operator,
            operand: Box::new(operand),
            position,
        }))
    }

    fn primary(&mut self) -> Result<Expression> {
        match &self.current.kind {
            TokenKind::Number(x) => {
                let x = *x;
                self.advance()?;
                Ok(Expression::Literal(Literal::Number(x)))
            }
            TokenKind::Text(x) => {
                let x = x.clone();
                self.advance()?;
                Ok(Expression::Literal(Literal::Text(x)))
            }
            TokenKind::Identifier(_) => {
                let position = self.current.position;
                let name = self.identifier()?;
                match self.current.kind {
                    TokenKind::LeftParen => self.call(name, position),
                    TokenKind::LeftBracket => self.array_access(name, position),
                    _ => Ok(Expression::Variable(Variable { name, position })),
                }
            }
            TokenKind::LeftParen => self.parenthesized(),
            TokenKind::LeftBracket => self.array_literal(),
            _ => Err(self.error("expression")),
        }
    }

    fn call(&mut self, name: String, position: Position) -> Result<Expression> {
        self.consume(TokenKind::LeftParen)?;
        let arguments = self.comma_separated(TokenKind::RightParen)?;
        Ok(Expression::Call(FunctionCall {
            name,
            arguments,
            position,
        }))
    }

    fn array_access(&mut self, name: String, position: Position) -> Result<Expression> {
        self.consume(TokenKind::LeftBracket)?;
        let index = self.expression()?;
        self.consume(TokenKind::RightBracket)?;
        Ok(Expression::ArrayAccess(ArrayAccess {
            name,
            index: Box::new(index),
            position,
        }))
    }

    fn array_literal(&mut self) -> Result<Expression> {
        self.consume(TokenKind::LeftBracket)?;
        let elements = self.comma_separated(TokenKind::RightBracket)?;
        Ok(Expression::Array(ArrayLiteral { elements }))
    }

    /// `(expr (',' expr)*)? close`, with the opening delimiter already consumed.
    fn comma_separated(&mut self, close: TokenKind) -> Result<Vec<Expression>> {
        let mut items = Vec::new();
        if self.current.kind != close {
            items.push(self.expression()?);
            while self.next_if(TokenKind::Comma)? {
                items.push(self.expression()?);
            }
        }
        self.consume(close)?;
        Ok(items)
    }

    fn identifier(&mut self) -> Result<String> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn consume(&mut self, expected: TokenKind) -> Result<Token> {
        if self.current.kind.same_class(&expected) {
            self.advance()
        } else {
            Err(self.error(&expected.to_string()))
        }
    }

    fn next_if(&mut self, expected: TokenKind) -> Result<bool> {
        if self.current.kind.same_class(&expected) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Moves to the next token and returns the one just passed.
    fn advance(&mut self) -> Result<Token> {
        let next = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn peek(&mut self) -> Result<&Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.get_or_insert(token))
    }

    /// Runs `rule` one level deeper, failing once `MAX_NESTING` is reached.
    fn nested<T>(&mut self, rule: fn(&mut Parser<'a>) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(Error::TooDeeplyNested {
                limit: MAX_NESTING,
                position: self.current.position,
            });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::EOF
    }

    fn error(&self, expected: &str) -> Error {
        Error::Syntax {
            expected: expected.to_string(),
            found: self.current.describe(),
            position: self.current.position,
        }
    }
}

#[cfg(test)]
mod parser_tests {
    use super::{parse, MAX_NESTING};
    use crate::ast::{BinaryOperator, Expression, Literal, Statement};
    use crate::error::{Error, ErrorKind};
    use crate::token::Position;
    use pretty_assertions::assert_eq;

    fn only_statement(source: &str) -> Statement {
        let mut program = parse(source).unwrap();
        assert_eq!(program.statements.len(), 1);
        program.statements.remove(0)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let statement = only_statement("let x = 5 + 3 * 2;");
        let assignment = match statement {
            Statement::Assignment(a) => a,
            other => panic!("expected assignment, got {:?}", other),
        };
        assert_eq!(assignment.name, "x");
        assert!(assignment.declaration);
        match assignment.value {
            Expression::Binary(add) => {
                assert_eq!(add.operator, BinaryOperator::Add);
                assert_eq!(*add.left, Expression::Literal(Literal::Number(5.0)));
                match *add.right {
                    Expression::Binary(mul) => assert_eq!(mul.operator, BinaryOperator::Multiply),
                    other => panic!("expected multiplication, got {:?}", other),
                }
            }
            other => panic!("expected addition, got {:?}", other),
        }
    }

    #[test]
    fn subtraction_is_left_associative() {
        let statement = only_statement("10 - 4 - 3;");
        let expression = match statement {
            Statement::Expression(e) => e.expression,
            other => panic!("expected expression statement, got {:?}", other),
        };
        match expression {
            Expression::Binary(outer) => {
                assert_eq!(outer.operator, BinaryOperator::Subtract);
                assert_eq!(*outer.right, Expression::Literal(Literal::Number(3.0)));
                assert!(matches!(*outer.left, Expression::Binary(_)));
            }
            other => panic!("expected subtraction, got {:?}", other),
        }
    }

    #[test]
    fn logical_or_is_loosest() {
        let statement = only_statement("a && b || c == d;");
        match statement {
            Statement::Expression(e) => match e.expression {
                Expression::Binary(or) => {
                    assert_eq!(or.operator, BinaryOperator::Or);
                    assert!(matches!(*or.left, Expression::Binary(ref l) if l.operator == BinaryOperator::And));
                    assert!(matches!(*or.right, Expression::Binary(ref r) if r.operator == BinaryOperator::Equal));
                }
                other => panic!("expected '||', got {:?}", other),
            },
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn if_with_else() {
        let statement = only_statement("if (x < 5) { print(x); } else { print(0); }");
        match statement {
            Statement::If(node) => {
                assert!(matches!(node.condition, Expression::Binary(ref c) if c.operator == BinaryOperator::Less));
                assert_eq!(node.then_branch.len(), 1);
                assert_eq!(node.else_branch.len(), 1);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn for_loop_clauses() {
        let statement = only_statement("for (let i = 0; i < 3; i = i + 1) { print(i); }");
        match statement {
            Statement::For(node) => {
                assert_eq!(node.initializer.name, "i");
                assert!(node.initializer.declaration);
                assert_eq!(node.increment.name, "i");
                assert!(!node.increment.declaration);
                assert_eq!(node.body.len(), 1);
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn function_definition_and_call() {
        let program = parse("function add(a, b) { return a + b; } add(2, 3);").unwrap();
        match &program.statements[0] {
            Statement::FunctionDefinition(def) => {
                assert_eq!(def.name, "add");
                assert_eq!(def.params, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(def.body.len(), 1);
            }
            other => panic!("expected function, got {:?}", other),
        }
        match &program.statements[1] {
            Statement::Expression(e) => match &e.expression {
                Expression::Call(call) => {
                    assert_eq!(call.name, "add");
                    assert_eq!(call.arguments.len(), 2);
                }
                other => panic!("expected call, got {:?}", other),
            },
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn array_access_consumes_closing_bracket() {
        let program = parse("let y = xs[1 + 1]; print(y);").unwrap();
        assert_eq!(program.statements.len(), 2);
        match &program.statements[0] {
            Statement::Assignment(a) => match &a.value {
                Expression::ArrayAccess(access) => {
                    assert_eq!(access.name, "xs");
                    assert!(matches!(*access.index, Expression::Binary(_)));
                }
                other => panic!("expected array access, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn try_requires_catch() {
        let err = parse("try { let x = 1; } print(x);").unwrap_err();
        assert_eq!(
            err,
            Error::Syntax {
                expected: "'catch'".to_string(),
                found: "'print'".to_string(),
                position: Position::new(1, 20),
            }
        );
    }

    #[test]
    fn missing_semicolon_names_expected_and_found() {
        let err = parse("let x = 5\nprint(x);").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
        assert_eq!(
            err.to_string(),
            "[line 2, column 1] SyntaxError: Expected ';', found 'print'."
        );
    }

    #[test]
    fn unclosed_block_reports_end_of_input() {
        let err = parse("while (x) { print(x);").unwrap_err();
        match err {
            Error::Syntax {
                expected, found, ..
            } => {
                assert_eq!(expected, "'}'");
                assert_eq!(found, "end of input");
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn lex_errors_surface_through_the_parser() {
        let err = parse("let x = 1 $ 2;").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LexError);
    }

    #[test]
    fn return_without_value() {
        match only_statement("return;") {
            Statement::Return(r) => assert_eq!(r.value, None),
            other => panic!("expected return, got {:?}", other),
        }
    }

    #[test]
    fn nesting_is_capped() {
        let depth = MAX_NESTING + 10;
        let source = format!("print({}1{});", "(".repeat(depth), ")".repeat(depth));
        let err = parse(&source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
        match err {
            Error::TooDeeplyNested { limit, .. } => assert_eq!(limit, MAX_NESTING),
            other => panic!("expected nesting error, got {:?}", other),
        }

        let source = format!("let x = {}1;", "-".repeat(depth));
        assert_eq!(parse(&source).unwrap_err().kind(), ErrorKind::SyntaxError);

        let source = format!("{}{}", "if (1 < 2) {".repeat(depth), "}".repeat(depth));
        assert_eq!(parse(&source).unwrap_err().kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn moderate_nesting_parses() {
        let source = format!("print({}1{});", "(".repeat(40), ")".repeat(40));
        parse(&source).unwrap();
    }
}
