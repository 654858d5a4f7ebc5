pub mod ast;
pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;
pub mod value;

pub use error::{Error, ErrorKind};
pub use interpreter::Interpreter;
pub use value::Value;

/// Everything one run of a program produced.
#[derive(Debug)]
pub struct Outcome {
    /// One entry per executed `print`, in order.
    pub output: Vec<String>,
    pub result: Option<Value>,
    /// The failure that stopped the run, if any. Output printed before it is kept.
    pub error: Option<Error>,
}

/// Lexes, parses and runs `source` in a fresh interpreter, capturing its output.
///
/// Nesting of blocks, parentheses and unary operators is capped at
/// [`parser::MAX_NESTING`] and reported as a SyntaxError. Runaway recursion
/// in the program itself is not caught and exhausts the host stack.
pub fn interpret(source: &str) -> Outcome {
    let mut interpreter = Interpreter::with_output(Vec::<String>::new());
    let (result, error) = match interpreter.run(source) {
        Ok(result) => (result, None),
        Err(err) => (None, Some(err)),
    };
    Outcome {
        output: interpreter.into_output(),
        result,
        error,
    }
}
