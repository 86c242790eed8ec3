use crate::object::Object;
use crate::{Error, Result};

/// Operand stack the interpreter feeds from the lexer.
///
/// Every entry keeps the byte position the object was read at.
#[derive(Debug, Default)]
pub struct OperandStack {
    items: Vec<(usize, Object)>,
}

impl OperandStack {
    pub fn new() -> OperandStack {
        OperandStack::default()
    }

    pub fn push(&mut self, pos: usize, object: Object) {
        self.items.push((pos, object));
    }

    /// Pop exactly `n` objects, returned in push order.
    ///
    /// The stack is left untouched when fewer than `n` objects are available.
    pub fn pop(&mut self, n: usize, keyword: &'static str) -> Result<Vec<(usize, Object)>> {
        if self.items.len() < n {
            return Err(Error::malformed(
                keyword,
                format!("expected {} operands, found {}", n, self.items.len()),
            ));
        }
        let at = self.items.len() - n;
        Ok(self.items.split_off(at))
    }

    /// Take every object on the stack, in push order.
    pub fn popall(&mut self) -> Vec<(usize, Object)> {
        std::mem::take(&mut self.items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
