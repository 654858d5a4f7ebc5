use crate::ast::{FunctionDefinition, Statement};
use crate::environment::Scope;
use crate::error::{Error, Result};
use crate::interpreter::{Flow, Interpreter, Output};
use crate::token::Position;
use crate::value::Value;
use std::fmt;

/// A user-defined function, as stored in the global scope.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

impl From<&FunctionDefinition> for Function {
    fn from(definition: &FunctionDefinition) -> Function {
        Function {
            name: definition.name.clone(),
            params: definition.params.clone(),
            body: definition.body.clone(),
        }
    }
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Runs the body in a fresh frame holding the parameters.
    ///
    /// The frame is popped however the body finishes, including on error.
    pub fn call<O: Output>(
        &self,
        interpreter: &mut Interpreter<O>,
        arguments: Vec<Value>,
        position: Position,
    ) -> Result<Value> {
        if arguments.len() != self.arity() {
            return Err(Error::type_error(
                format!(
                    "'{}' takes {} argument(s) but {} were given.",
                    self.name,
                    self.arity(),
                    arguments.len()
                ),
                position,
            ));
        }
        let locals: Scope = self.params.iter().cloned().zip(arguments).collect();
        let mut frame = interpreter.enter_frame(locals);
        match frame.execute_block(&self.body)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
        }
    }
}
