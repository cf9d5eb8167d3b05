//! Environments: a chain of shared, mutable binding frames.
//!
//! A frame is an association list searched newest-first, so a rebinding
//! shadows an older one, and a child frame shadows its parent. Frames are
//! shared through `Gc` handles: `define` inserts into the current frame in
//! place, which makes the new binding visible to every closure that
//! captured that frame, while `child` starts a fresh frame whose bindings
//! never leak outward. Closures pin their captured chain for their own
//! lifetime, and the chain can participate in cycles (a frame holding a
//! closure that captured it), which is why the collector owns the frames.

use gc::{Finalize, Gc, GcCell, Trace};

use crate::RuntimeError;
use crate::value::Value;

#[derive(Clone, Trace, Finalize)]
pub struct Environment(Gc<GcCell<Frame>>);

#[derive(Trace, Finalize)]
struct Frame {
    bindings: Vec<Binding>,
    parent: Option<Environment>,
}

#[derive(Trace, Finalize)]
struct Binding {
    name: String,
    value: Value,
}

impl Environment {
    /// A fresh, empty global frame.
    pub fn new() -> Environment {
        Environment(Gc::new(GcCell::new(Frame {
            bindings: Vec::new(),
            parent: None,
        })))
    }

    /// A new empty frame chained in front of `self`. Non-destructive for
    /// the parent: bindings added to the child are invisible outside it.
    pub fn child(&self) -> Environment {
        Environment(Gc::new(GcCell::new(Frame {
            bindings: Vec::new(),
            parent: Some(self.clone()),
        })))
    }

    /// Bind `name` in the current frame, in place. An existing binding in
    /// this frame is overwritten; bindings in parent frames are shadowed.
    pub fn define(&self, name: &str, value: Value) {
        let mut frame = self.0.borrow_mut();
        if let Some(binding) = frame.bindings.iter_mut().rev().find(|b| b.name == name) {
            binding.value = value;
        } else {
            frame.bindings.push(Binding {
                name: name.to_owned(),
                value,
            });
        }
    }

    /// Look `name` up along the chain, newest binding first.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut cur = self.clone();
        loop {
            let parent = {
                let frame = cur.0.borrow();
                if let Some(binding) = frame.bindings.iter().rev().find(|b| b.name == name) {
                    return Some(binding.value.clone());
                }
                frame.parent.clone()
            };
            cur = parent?;
        }
    }

    /// Overwrite the nearest binding of `name`; `UnboundName` if the chain
    /// has none.
    pub fn set(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut cur = self.clone();
        loop {
            let parent = {
                let mut frame = cur.0.borrow_mut();
                if let Some(binding) = frame.bindings.iter_mut().rev().find(|b| b.name == name) {
                    binding.value = value;
                    return Ok(());
                }
                frame.parent.clone()
            };
            match parent {
                Some(env) => cur = env,
                None => return Err(RuntimeError::UnboundName(name.to_owned())),
            }
        }
    }

    /// Name-only membership query, used by the parser to decide whether a
    /// head symbol still has its reserved or primitive meaning.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for Environment {
    fn default() -> Environment {
        Environment::new()
    }
}

impl std::fmt::Debug for Environment {
    // Frames reach closures which reach frames; keep Debug opaque instead
    // of walking a possibly cyclic graph.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#<environment>")
    }
}
