//! Declared callable signatures and argument binding.
//!
//! A [`Signature`] lists a callable's parameter names in declaration
//! order, each optionally carrying a default. [`Signature::bind`] maps one
//! invocation's [`CallArgs`] onto the declared parameters, producing the
//! ordered name→value [`Params`] map that goes on the wire — including
//! defaults the caller did not pass, exactly as the callable will see
//! them.

use serde_json::Value;

use oplink_events::Params;

use crate::args::CallArgs;
use crate::errors::{BindError, RESERVED_SESSION_KEY};

/// One declared parameter.
#[derive(Clone, Debug)]
struct ParamSpec {
    name: String,
    default: Option<Value>,
}

/// A callable's identifying name and ordered parameter list.
#[derive(Clone, Debug)]
pub struct Signature {
    name: String,
    params: Vec<ParamSpec>,
}

impl Signature {
    /// Start a signature for the callable with the given identifying name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Declare a required parameter (no default).
    #[must_use]
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Declare a parameter with a default value.
    #[must_use]
    pub fn param_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    /// The callable's identifying name (the default `action_type`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Bind one invocation's arguments against this signature.
    ///
    /// Positional values fill parameters in declaration order, keywords
    /// fill by name, unfilled parameters take their defaults. The result
    /// preserves declaration order regardless of how values were passed.
    /// The reserved `session` key is rejected — routing goes through
    /// [`CallArgs::session`](crate::CallArgs::session), never the
    /// parameter map.
    pub fn bind(&self, args: &CallArgs) -> Result<Params, BindError> {
        let positional = args.positional();
        if positional.len() > self.params.len() {
            return Err(BindError::TooManyPositional {
                callable: self.name.clone(),
                declared: self.params.len(),
                given: positional.len(),
            });
        }

        let mut bound: Vec<Option<Value>> = vec![None; self.params.len()];
        for (slot, value) in bound.iter_mut().zip(positional.iter()) {
            *slot = Some(value.clone());
        }

        for (name, value) in args.keyword() {
            if name == RESERVED_SESSION_KEY {
                return Err(BindError::ReservedName);
            }
            let index = self
                .params
                .iter()
                .position(|p| p.name == *name)
                .ok_or_else(|| BindError::UnknownParameter {
                    callable: self.name.clone(),
                    name: name.clone(),
                })?;
            if bound[index].is_some() {
                return Err(BindError::DuplicateValue {
                    callable: self.name.clone(),
                    name: name.clone(),
                });
            }
            bound[index] = Some(value.clone());
        }

        let mut params = Params::new();
        for (spec, value) in self.params.iter().zip(bound) {
            let value = match value.or_else(|| spec.default.clone()) {
                Some(v) => v,
                None => {
                    return Err(BindError::MissingParameter {
                        callable: self.name.clone(),
                        name: spec.name.clone(),
                    });
                }
            };
            let _ = params.insert(spec.name.clone(), value);
        }
        Ok(params)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
