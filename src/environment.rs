use crate::error::{Error, Result};
use crate::token::Position;
use crate::value::Value;
use std::collections::BTreeMap;

pub type Scope = BTreeMap<String, Value>;

/// The global scope plus a stack of call frames.
///
/// Only the innermost frame is ever visible: a function body sees its own
/// locals and the globals, never the locals of whoever called it.
#[derive(Debug, Default)]
pub struct Environment {
    globals: Scope,
    frames: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    pub fn push_frame(&mut self, frame: Scope) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Scope> {
        self.frames.pop()
    }

    /// Number of active calls.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Binds in the active frame, or globally when no call is active.
    pub fn define(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => frame.insert(name.to_string(), value),
            None => self.globals.insert(name.to_string(), value),
        };
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames
            .last()
            .and_then(|frame| frame.get(name))
            .or_else(|| self.globals.get(name))
    }

    pub fn get(&self, name: &str, position: Position) -> Result<Value> {
        self.lookup(name)
            .cloned()
            .ok_or_else(|| Error::UndefinedVariable {
                name: name.to_string(),
                position,
            })
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }
}
