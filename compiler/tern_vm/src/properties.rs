//! Properties: named get/set hooks reached through `?name` and `!name`.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::errors::RuntimeResult;
use crate::interpreter::Runtime;
use crate::value::{Numeric, Value};

pub trait Property {
    fn get(&self, rt: &mut Runtime) -> RuntimeResult<Value>;
    fn set(&self, rt: &mut Runtime, value: Value) -> RuntimeResult<()>;
}

#[derive(Default)]
pub struct PropertyRegistry {
    props: Vec<(Rc<str>, Rc<dyn Property>)>,
    index: FxHashMap<Rc<str>, u32>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace `name`, keeping the index of a replaced one.
    pub fn register(&mut self, name: &str, prop: Rc<dyn Property>) -> u32 {
        if let Some(&idx) = self.index.get(name) {
            self.props[idx as usize].1 = prop;
            return idx;
        }
        let idx = u32::try_from(self.props.len())
            .unwrap_or_else(|_| crate::fatal("property index space exhausted"));
        let name: Rc<str> = Rc::from(name);
        self.index.insert(Rc::clone(&name), idx);
        self.props.push((name, prop));
        idx
    }

    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    pub fn get(&self, idx: u32) -> Option<Rc<dyn Property>> {
        self.props.get(idx as usize).map(|(_, p)| Rc::clone(p))
    }

    pub fn name(&self, idx: u32) -> &str {
        self.props.get(idx as usize).map_or("", |(n, _)| n)
    }
}

/// `autogc`: run the cycle collector every N instructions; 0 or less
/// disables it.
pub struct AutoGc;

impl Property for AutoGc {
    fn get(&self, rt: &mut Runtime) -> RuntimeResult<Value> {
        Ok(i32::try_from(rt.autogc()).map_or_else(|_| Value::Long(rt.autogc()), Value::Int))
    }

    fn set(&self, rt: &mut Runtime, value: Value) -> RuntimeResult<()> {
        rt.set_autogc(value.to_long()?);
        Ok(())
    }
}
