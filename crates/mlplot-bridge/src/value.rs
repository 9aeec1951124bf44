use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::object::ObjectError;

pub use serde_json::Value;

/// Keyword arguments of a create or invoke request.
pub type Kwargs = serde_json::Map<String, Value>;

/// Stable handle of a registry entry.
///
/// Indices are handed out in creation order starting at 0 and are never
/// reused by the registry that issued them, so a handle cached by a worker
/// either resolves to its own entry or to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectIndex(pub u64);

impl ObjectIndex {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positional and keyword arguments passed across the bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            args: args.into_iter().collect(),
            kwargs: Kwargs::new(),
        }
    }

    pub fn with_arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Looks up a parameter by keyword first, then by position.
    pub fn param<T: DeserializeOwned>(
        &self,
        position: usize,
        name: &str,
    ) -> Result<Option<T>, ObjectError> {
        let value = self.kwargs.get(name).or_else(|| self.args.get(position));
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(name, value.clone()).map(Some),
        }
    }

    pub fn require<T: DeserializeOwned>(
        &self,
        position: usize,
        name: &str,
    ) -> Result<T, ObjectError> {
        self.param(position, name)?
            .ok_or_else(|| ObjectError::InvalidArgument {
                name: name.to_string(),
                reason: "missing required argument".to_string(),
            })
    }

    /// All positional arguments decoded as one type.
    pub fn rest<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, ObjectError> {
        self.args
            .iter()
            .map(|value| decode(name, value.clone()))
            .collect()
    }
}

/// Required parameter, by keyword or position.
pub fn arg<T: DeserializeOwned>(
    args: &CallArgs,
    position: usize,
    name: &str,
) -> Result<T, ObjectError> {
    args.require(position, name)
}

pub fn opt_kwarg<T: DeserializeOwned>(
    kwargs: &Kwargs,
    name: &str,
) -> Result<Option<T>, ObjectError> {
    match kwargs.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode(name, value.clone()).map(Some),
    }
}

pub fn decode<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, ObjectError> {
    serde_json::from_value(value).map_err(|err| ObjectError::InvalidArgument {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

pub fn encode<T: Serialize>(name: &str, value: &T) -> Result<Value, ObjectError> {
    serde_json::to_value(value).map_err(|err| ObjectError::Failed(format!("encode {name}: {err}")))
}
