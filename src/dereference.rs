//! `$ref` dereferencing.
//!
//! The pipeline only depends on the [`Dereference`] contract. [`LocalDereferencer`] resolves
//! the local JSON pointers (`#/definitions/...`) a self-contained schema uses: every
//! reference is replaced by a deep copy of its (recursively dereferenced) target.

use crate::error::DereferenceError;
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Turns a `$ref`-bearing schema into a fully resolved tree.
pub trait Dereference {
    fn dereference(&self, schema: Value) -> Result<Value, DereferenceError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDereferencer;

impl Dereference for LocalDereferencer {
    fn dereference(&self, schema: Value) -> Result<Value, DereferenceError> {
        let mut resolution = Resolution {
            root: &schema,
            resolving_stack: Vec::new(),
            resolved: HashMap::new(),
        };
        resolution.resolve_value(&schema)
    }
}

struct Resolution<'a> {
    root: &'a Value,
    // References currently being expanded, to detect cycles
    resolving_stack: Vec<String>,
    // Fully expanded targets, by reference
    resolved: HashMap<String, Value>,
}

impl<'a> Resolution<'a> {
    fn resolve_value(&mut self, value: &Value) -> Result<Value, DereferenceError> {
        match value {
            Value::Object(members) => {
                if let Some(Value::String(reference)) = members.get("$ref") {
                    let mut target = self.resolve_reference(reference)?;
                    // Keywords next to a `$ref` are merged over the target (local keys win)
                    if let Value::Object(target_members) = &mut target {
                        for (key, member) in members {
                            if key != "$ref" {
                                target_members.insert(key.clone(), self.resolve_value(member)?);
                            }
                        }
                    }
                    return Ok(target);
                }
                let mut resolved = Map::new();
                for (key, member) in members {
                    resolved.insert(key.clone(), self.resolve_value(member)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(elements) => elements
                .iter()
                .map(|element| self.resolve_value(element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_reference(&mut self, reference: &str) -> Result<Value, DereferenceError> {
        if let Some(resolved) = self.resolved.get(reference) {
            return Ok(resolved.clone());
        }

        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| DereferenceError::External {
                reference: reference.to_string(),
            })?;

        if self.resolving_stack.iter().any(|r| r == reference) {
            let mut chain = self.resolving_stack.clone();
            chain.push(reference.to_string());
            return Err(DereferenceError::Circular {
                chain: chain.join(" -> "),
            });
        }

        let root = self.root;
        let target = root
            .pointer(pointer)
            .ok_or_else(|| DereferenceError::Unresolved {
                reference: reference.to_string(),
            })?;

        self.resolving_stack.push(reference.to_string());
        let resolved = self.resolve_value(target)?;
        self.resolving_stack.pop();

        debug!("Dereferenced '{reference}'");
        self.resolved.insert(reference.to_string(), resolved.clone());
        Ok(resolved)
    }
}
