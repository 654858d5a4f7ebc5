use crate::ast::{
    ArrayAccess, ArrayLiteral, Assignment, BinaryOp, BinaryOperator, Expression,
    ExpressionStatement, ExpressionVisitor, For, FunctionCall, FunctionDefinition, If, Literal,
    Print, Program, Return, Statement, StatementVisitor, TryCatch, UnaryOp, UnaryOperator,
    Variable, While,
};
use crate::callable::Function;
use crate::environment::{Environment, Scope};
use crate::error::{Error, Result};
use crate::parser;
use crate::printer::AstPrinter;
use crate::token::Position;
use crate::value::Value;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// How a statement finished, when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Where `print` sends its lines, and where trace mode reports statements.
pub trait Output {
    fn print_line(&mut self, line: String);

    fn trace_line(&mut self, line: String) {
        eprintln!("{}", line);
    }
}

pub struct Stdout;

impl Output for Stdout {
    fn print_line(&mut self, line: String) {
        println!("{}", line);
    }
}

impl Output for Vec<String> {
    fn print_line(&mut self, line: String) {
        self.push(line);
    }
}

pub struct Interpreter<O: Output = Stdout> {
    environment: Environment,
    output: O,
    trace_execution: bool,
    result: Option<Value>,
}

/// A call frame that is popped when dropped, so every way out of a call
/// (return, fall-through, error) restores the caller's frame.
pub struct CallFrame<'i, O: Output> {
    interpreter: &'i mut Interpreter<O>,
}

impl<'i, O: Output> Deref for CallFrame<'i, O> {
    type Target = Interpreter<O>;

    fn deref(&self) -> &Interpreter<O> {
        self.interpreter
    }
}

impl<'i, O: Output> DerefMut for CallFrame<'i, O> {
    fn deref_mut(&mut self) -> &mut Interpreter<O> {
        self.interpreter
    }
}

impl<'i, O: Output> Drop for CallFrame<'i, O> {
    fn drop(&mut self) {
        self.interpreter.environment.pop_frame();
    }
}

impl Interpreter<Stdout> {
    pub fn new() -> Interpreter<Stdout> {
        Interpreter::with_output(Stdout)
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl<O: Output> Interpreter<O> {
    pub fn with_output(output: O) -> Interpreter<O> {
        Interpreter {
            environment: Environment::new(),
            output,
            trace_execution: false,
            result: None,
        }
    }

    /// Reports each statement through `Output::trace_line` before it runs.
    pub fn set_trace(&mut self, trace_execution: bool) {
        self.trace_execution = trace_execution;
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.environment.global(name)
    }

    /// Parses and runs `source` against this interpreter's globals.
    pub fn run(&mut self, source: &str) -> Result<Option<Value>> {
        let program = parser::parse(source)?;
        self.execute_program(&program)
    }

    /// Runs a program and returns its result value: the value of a top-level
    /// `return`, else that of the last top-level expression statement.
    pub fn execute_program(&mut self, program: &Program) -> Result<Option<Value>> {
        self.result = None;
        match program.accept(self)? {
            Flow::Return(value) => Ok(Some(value)),
            Flow::Normal => Ok(self.result.take()),
        }
    }

    pub fn execute(&mut self, stmt: &Statement) -> Result<Flow> {
        if self.trace_execution {
            let rendered = AstPrinter::new().statement(stmt);
            let line = format!(
                "[depth {}] {}",
                self.environment.depth(),
                rendered.lines().next().unwrap_or_default()
            );
            self.output.trace_line(line);
        }
        stmt.accept(self)
    }

    /// Runs statements in order, stopping early on a `return`.
    pub fn execute_block(&mut self, statements: &[Statement]) -> Result<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    pub fn evaluate(&mut self, expr: &Expression) -> Result<Value> {
        expr.accept(self)
    }

    pub(crate) fn enter_frame(&mut self, locals: Scope) -> CallFrame<'_, O> {
        self.environment.push_frame(locals);
        CallFrame { interpreter: self }
    }

    fn condition(&mut self, expr: &Expression, position: Position) -> Result<bool> {
        match self.evaluate(expr)? {
            Value::Boolean(x) => Ok(x),
            other => Err(Error::type_error(
                format!("Condition must be a boolean, found {}.", other.type_name()),
                position,
            )),
        }
    }

    fn function(&self, name: &str, position: Position) -> Result<Rc<Function>> {
        match self.environment.global(name) {
            Some(Value::Function(function)) => Ok(Rc::clone(function)),
            Some(other) => Err(Error::type_error(
                format!("'{}' is a {}, not a function.", name, other.type_name()),
                position,
            )),
            None => Err(Error::UndefinedFunction {
                name: name.to_string(),
                position,
            }),
        }
    }
}

impl<O: Output> StatementVisitor for Interpreter<O> {
    type Output = Result<Flow>;

    fn visit_program(&mut self, program: &Program) -> Result<Flow> {
        self.execute_block(&program.statements)
    }

    fn visit_assignment(&mut self, assignment: &Assignment) -> Result<Flow> {
        let value = self.evaluate(&assignment.value)?;
        self.environment.define(&assignment.name, value);
        Ok(Flow::Normal)
    }

    fn visit_if(&mut self, node: &If) -> Result<Flow> {
        if self.condition(&node.condition, node.position)? {
            self.execute_block(&node.then_branch)
        } else {
            self.execute_block(&node.else_branch)
        }
    }

    fn visit_while(&mut self, node: &While) -> Result<Flow> {
        while self.condition(&node.condition, node.position)? {
            if let Flow::Return(value) = self.execute_block(&node.body)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_for(&mut self, node: &For) -> Result<Flow> {
        self.visit_assignment(&node.initializer)?;
        while self.condition(&node.condition, node.position)? {
            if let Flow::Return(value) = self.execute_block(&node.body)? {
                return Ok(Flow::Return(value));
            }
            self.visit_assignment(&node.increment)?;
        }
        Ok(Flow::Normal)
    }

    fn visit_function_definition(&mut self, definition: &FunctionDefinition) -> Result<Flow> {
        let function = Function::from(definition);
        self.environment
            .define_global(&definition.name, Value::Function(Rc::new(function)));
        Ok(Flow::Normal)
    }

    fn visit_return(&mut self, node: &Return) -> Result<Flow> {
        let value = match &node.value {
            Some(expr) => self.evaluate(expr)?,
            None => Value::None,
        };
        Ok(Flow::Return(value))
    }

    fn visit_print(&mut self, node: &Print) -> Result<Flow> {
        let value = self.evaluate(&node.value)?;
        self.output.print_line(value.to_string());
        Ok(Flow::Normal)
    }

    fn visit_try_catch(&mut self, node: &TryCatch) -> Result<Flow> {
        match self.execute_block(&node.try_block) {
            Ok(flow) => Ok(flow),
            Err(_) => self.execute_block(&node.catch_block),
        }
    }

    fn visit_expression_statement(&mut self, node: &ExpressionStatement) -> Result<Flow> {
        let value = self.evaluate(&node.expression)?;
        if self.environment.depth() == 0 {
            self.result = Some(value);
        }
        Ok(Flow::Normal)
    }
}

impl<O: Output> ExpressionVisitor for Interpreter<O> {
    type Output = Result<Value>;

    fn visit_binary_op(&mut self, node: &BinaryOp) -> Result<Value> {
        match node.operator {
            BinaryOperator::And | BinaryOperator::Or => {
                let left = boolean_operand(node.operator, self.evaluate(&node.left)?, node.position)?;
                // The left side alone decides `false && _` and `true || _`.
                if left == (node.operator == BinaryOperator::Or) {
                    return Ok(Value::Boolean(left));
                }
                let right =
                    boolean_operand(node.operator, self.evaluate(&node.right)?, node.position)?;
                Ok(Value::Boolean(right))
            }
            operator => {
                let left = self.evaluate(&node.left)?;
                let right = self.evaluate(&node.right)?;
                apply_binary(operator, left, right, node.position)
            }
        }
    }

    fn visit_unary_op(&mut self, node: &UnaryOp) -> Result<Value> {
        let operand = self.evaluate(&node.operand)?;
        match (node.operator, operand) {
            (UnaryOperator::Negate, Value::Number(x)) => Ok(Value::Number(-x)),
            (UnaryOperator::Not, Value::Boolean(x)) => Ok(Value::Boolean(!x)),
            (operator, other) => Err(Error::type_error(
                format!(
                    "Unsupported operand type for '{}': {}.",
                    operator,
                    other.type_name()
                ),
                node.position,
            )),
        }
    }

    fn visit_literal(&mut self, literal: &Literal) -> Result<Value> {
        Ok(match literal {
            Literal::Number(x) => Value::Number(*x),
            Literal::Text(x) => Value::Text(x.clone()),
        })
    }

    fn visit_variable(&mut self, variable: &Variable) -> Result<Value> {
        self.environment.get(&variable.name, variable.position)
    }

    fn visit_function_call(&mut self, call: &FunctionCall) -> Result<Value> {
        let function = self.function(&call.name, call.position)?;
        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.evaluate(argument))
            .collect::<Result<Vec<Value>>>()?;
        function.call(self, arguments, call.position)
    }

    fn visit_array_access(&mut self, access: &ArrayAccess) -> Result<Value> {
        let index = self.evaluate(&access.index)?;
        let elements = match self.environment.get(&access.name, access.position)? {
            Value::Array(elements) => elements,
            other => {
                return Err(Error::type_error(
                    format!(
                        "'{}' is a {}, not an array.",
                        access.name,
                        other.type_name()
                    ),
                    access.position,
                ))
            }
        };
        let index = match index {
            Value::Number(x) if x.fract() == 0.0 => x,
            other => {
                return Err(Error::type_error(
                    format!("Array index must be a whole number, found {}.", other),
                    access.position,
                ))
            }
        };
        let out_of_bounds = || Error::IndexOutOfBounds {
            name: access.name.clone(),
            index,
            length: elements.len(),
            position: access.position,
        };
        if index < 0.0 || index >= elements.len() as f64 {
            return Err(out_of_bounds());
        }
        elements
            .get(index as usize)
            .cloned()
            .ok_or_else(out_of_bounds)
    }

    fn visit_array_literal(&mut self, array: &ArrayLiteral) -> Result<Value> {
        let elements = array
            .elements
            .iter()
            .map(|element| self.evaluate(element))
            .collect::<Result<Vec<Value>>>()?;
        Ok(Value::Array(elements))
    }
}

fn boolean_operand(operator: BinaryOperator, value: Value, position: Position) -> Result<bool> {
    match value {
        Value::Boolean(x) => Ok(x),
        other => Err(Error::type_error(
            format!(
                "Operands of '{}' must be booleans, found {}.",
                operator,
                other.type_name()
            ),
            position,
        )),
    }
}

fn apply_binary(
    operator: BinaryOperator,
    left: Value,
    right: Value,
    position: Position,
) -> Result<Value> {
    match operator {
        BinaryOperator::Equal => return Ok(Value::Boolean(left.equals(&right))),
        BinaryOperator::NotEqual => return Ok(Value::Boolean(!left.equals(&right))),
        _ => {}
    }
    match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => {
            let (l, r) = (*l, *r);
            match operator {
                BinaryOperator::Add => Ok(Value::Number(l + r)),
                BinaryOperator::Subtract => Ok(Value::Number(l - r)),
                BinaryOperator::Multiply => Ok(Value::Number(l * r)),
                BinaryOperator::Divide | BinaryOperator::Modulo if r == 0.0 => {
                    Err(Error::DivisionByZero {
                        operator: operator.to_string(),
                        position,
                    })
                }
                BinaryOperator::Divide => Ok(Value::Number(l / r)),
                BinaryOperator::Modulo => Ok(Value::Number(l % r)),
                BinaryOperator::Less => Ok(Value::Boolean(l < r)),
                BinaryOperator::LessEqual => Ok(Value::Boolean(l <= r)),
                BinaryOperator::Greater => Ok(Value::Boolean(l > r)),
                BinaryOperator::GreaterEqual => Ok(Value::Boolean(l >= r)),
                _ => Err(unsupported(operator, &left, &right, position)),
            }
        }
        (Value::Text(l), Value::Text(r)) => match operator {
            BinaryOperator::Less => Ok(Value::Boolean(l < r)),
            BinaryOperator::LessEqual => Ok(Value::Boolean(l <= r)),
            BinaryOperator::Greater => Ok(Value::Boolean(l > r)),
            BinaryOperator::GreaterEqual => Ok(Value::Boolean(l >= r)),
            _ => Err(unsupported(operator, &left, &right, position)),
        },
        _ => Err(unsupported(operator, &left, &right, position)),
    }
}

fn unsupported(operator: BinaryOperator, left: &Value, right: &Value, position: Position) -> Error {
    Error::type_error(
        format!(
            "Unsupported operand types for '{}': {} and {}.",
            operator,
            left.type_name(),
            right.type_name()
        ),
        position,
    )
}
