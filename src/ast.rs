//! The syntax tree and the visitor interfaces that consume it.
//!
//! Nodes own their children outright and are never mutated once the parser
//! has built them. Anything that walks the tree (the interpreter, the
//! printer) does so through [`StatementVisitor`] and [`ExpressionVisitor`],
//! which have one method per node kind. `accept` is the only place that
//! matches on the node kind.

use crate::token::Position;
use strum_macros::Display;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment(Assignment),
    If(If),
    While(While),
    For(For),
    FunctionDefinition(FunctionDefinition),
    Return(Return),
    Print(Print),
    TryCatch(TryCatch),
    Expression(ExpressionStatement),
}

/// `let name = value;` or `name = value;`; both bind in the active scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expression,
    pub declaration: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expression,
    pub then_branch: Vec<Statement>,
    pub else_branch: Vec<Statement>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub initializer: Assignment,
    pub condition: Expression,
    pub increment: Assignment,
    pub body: Vec<Statement>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Print {
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryCatch {
    pub try_block: Vec<Statement>,
    pub catch_block: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Literal(Literal),
    Variable(Variable),
    Call(FunctionCall),
    ArrayAccess(ArrayAccess),
    Array(ArrayLiteral),
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOperator {
    #[strum(serialize = "+")] Add,
    #[strum(serialize = "-")] Subtract,
    #[strum(serialize = "*")] Multiply,
    #[strum(serialize = "/")] Divide,
    #[strum(serialize = "%")] Modulo,
    #[strum(serialize = "==")] Equal,
    #[strum(serialize = "!=")] NotEqual,
    #[strum(serialize = "<")] Less,
    #[strum(serialize = "<=")] LessEqual,
    #[strum(serialize = ">")] Greater,
    #[strum(serialize = ">=")] GreaterEqual,
    #[strum(serialize = "&&")] And,
    #[strum(serialize = "||")] Or,
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UnaryOperator {
    #[strum(serialize = "-")] Negate,
    #[strum(serialize = "!")] Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Box<Expression>,
    pub operator: BinaryOperator,
    pub right: Box<Expression>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Vec<Expression>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccess {
    pub name: String,
    pub index: Box<Expression>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub elements: Vec<Expression>,
}

pub trait StatementVisitor {
    type Output;

    fn visit_program(&mut self, program: &Program) -> Self::Output;
    fn visit_assignment(&mut self, assignment: &Assignment) -> Self::Output;
    fn visit_if(&mut self, node: &If) -> Self::Output;
    fn visit_while(&mut self, node: &While) -> Self::Output;
    fn visit_for(&mut self, node: &For) -> Self::Output;
    fn visit_function_definition(&mut self, definition: &FunctionDefinition) -> Self::Output;
    fn visit_return(&mut self, node: &Return) -> Self::Output;
    fn visit_print(&mut self, node: &Print) -> Self::Output;
    fn visit_try_catch(&mut self, node: &TryCatch) -> Self::Output;
    fn visit_expression_statement(&mut self, node: &ExpressionStatement) -> Self::Output;
}

pub trait ExpressionVisitor {
    type Output;

    fn visit_binary_op(&mut self, node: &BinaryOp) -> Self::Output;
    fn visit_unary_op(&mut self, node: &UnaryOp) -> Self::Output;
    fn visit_literal(&mut self, literal: &Literal) -> Self::Output;
    fn visit_variable(&mut self, variable: &Variable) -> Self::Output;
    fn visit_function_call(&mut self, call: &FunctionCall) -> Self::Output;
    fn visit_array_access(&mut self, access: &ArrayAccess) -> Self::Output;
    fn visit_array_literal(&mut self, array: &ArrayLiteral) -> Self::Output;
}

impl Program {
    pub fn accept<V: StatementVisitor>(&self, v: &mut V) -> V::Output {
        v.visit_program(self)
    }
}

impl Statement {
    pub fn accept<V: StatementVisitor>(&self, v: &mut V) -> V::Output {
        match self {
            Statement::Assignment(x) => v.visit_assignment(x),
            Statement::If(x) => v.visit_if(x),
            Statement::While(x) => v.visit_while(x),
            Statement::For(x) => v.visit_for(x),
            Statement::FunctionDefinition(x) => v.visit_function_definition(x),
            Statement::Return(x) => v.visit_return(x),
            Statement::Print(x) => v.visit_print(x),
            Statement::TryCatch(x) => v.visit_try_catch(x),
            Statement::Expression(x) => v.visit_expression_statement(x),
        }
    }
}

impl Expression {
    pub fn accept<V: ExpressionVisitor>(&self, v: &mut V) -> V::Output {
        match self {
            Expression::Binary(x) => v.visit_binary_op(x),
            Expression::Unary(x) => v.visit_unary_op(x),
            Expression::Literal(x) => v.visit_literal(x),
            Expression::Variable(x) => v.visit_variable(x),
            Expression::Call(x) => v.visit_function_call(x),
            Expression::ArrayAccess(x) => v.visit_array_access(x),
            Expression::Array(x) => v.visit_array_literal(x),
        }
    }
}

#[cfg(test)]
mod ast_tests {
    use super::*;

    /// Counts nodes by kind, to check that `accept` routes each kind to its own method.
    #[derive(Default)]
    struct NodeCounter {
        binaries: usize,
        literals: usize,
        variables: usize,
        prints: usize,
    }

    impl ExpressionVisitor for NodeCounter {
        type Output = ();

        fn visit_binary_op(&mut self, node: &BinaryOp) {
            self.binaries += 1;
            node.left.accept(self);
            node.right.accept(self);
        }
        fn visit_unary_op(&mut self, node: &UnaryOp) {
            node.operand.accept(self);
        }
        fn visit_literal(&mut self, _: &Literal) {
            self.literals += 1;
        }
        fn visit_variable(&mut self, _: &Variable) {
            self.variables += 1;
        }
        fn visit_function_call(&mut self, call: &FunctionCall) {
            call.arguments.iter().for_each(|a| a.accept(self));
        }
        fn visit_array_access(&mut self, access: &ArrayAccess) {
            access.index.accept(self);
        }
        fn visit_array_literal(&mut self, array: &ArrayLiteral) {
            array.elements.iter().for_each(|e| e.accept(self));
        }
    }

    impl StatementVisitor for NodeCounter {
        type Output = ();

        fn visit_program(&mut self, program: &Program) {
            program.statements.iter().for_each(|s| s.accept(self));
        }
        fn visit_assignment(&mut self, assignment: &Assignment) {
            assignment.value.accept(self);
        }
        fn visit_if(&mut self, _: &If) {}
        fn visit_while(&mut self, _: &While) {}
        fn visit_for(&mut self, _: &For) {}
        fn visit_function_definition(&mut self, _: &FunctionDefinition) {}
        fn visit_return(&mut self, _: &Return) {}
        fn visit_print(&mut self, node: &Print) {
            self.prints += 1;
            node.value.accept(self);
        }
        fn visit_try_catch(&mut self, _: &TryCatch) {}
        fn visit_expression_statement(&mut self, node: &ExpressionStatement) {
            node.expression.accept(self);
        }
    }

    #[test]
    fn accept_dispatches_per_node_kind() {
        let position = Position::new(1, 1);
        let program = Program {
            statements: vec![
                Statement::Assignment(Assignment {
                    name: "x".to_string(),
                    value: Expression::Binary(BinaryOp {
                        left: Box::new(Expression::Literal(Literal::Number(1.0))),
                        operator: BinaryOperator::Add,
                        right: Box::new(Expression::Literal(Literal::Number(2.0))),
                        position,
                    }),
                    declaration: true,
                    position,
                }),
                Statement::Print(Print {
                    value: Expression::Variable(Variable {
                        name: "x".to_string(),
                        position,
                    }),
                }),
            ],
        };
        let mut counter = NodeCounter::default();
        program.accept(&mut counter);
        assert_eq!(counter.binaries, 1);
        assert_eq!(counter.literals, 2);
        assert_eq!(counter.variables, 1);
        assert_eq!(counter.prints, 1);
    }

    #[test]
    fn operators_display_as_source() {
        assert_eq!(BinaryOperator::LessEqual.to_string(), "<=");
        assert_eq!(BinaryOperator::Or.to_string(), "||");
        assert_eq!(UnaryOperator::Not.to_string(), "!");
    }
}
