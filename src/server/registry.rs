//! Path-keyed handler registry.
//!
//! The registry is built once at startup from an explicit list of handlers and
//! is read-only afterwards.

use crate::error::HandlerError;
use crate::host::model::HostModel;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Decoded request arguments, keyed by parameter name.
pub type Arguments = Map<String, Value>;

/// Whether a handler only reads host state or changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
    Mutate,
}

/// Static description of one handler.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerInfo {
    /// Exact request path, e.g. `/segments`.
    pub path: &'static str,
    pub access: Access,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub description: &'static str,
}

/// One request operation. Argument validation is the handler's job.
pub trait Handler: Send + Sync {
    fn info(&self) -> &'static HandlerInfo;

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler path registered twice: {0}")]
    DuplicatePath(&'static str),
}

pub struct HandlerRegistry {
    handlers: Vec<Box<dyn Handler>>,
    by_path: HashMap<&'static str, usize>,
}

impl HandlerRegistry {
    /// Build the registry, rejecting duplicate paths.
    pub fn new(handlers: Vec<Box<dyn Handler>>) -> Result<Self, RegistryError> {
        let mut by_path = HashMap::with_capacity(handlers.len());
        for (idx, handler) in handlers.iter().enumerate() {
            let path = handler.info().path;
            if by_path.insert(path, idx).is_some() {
                return Err(RegistryError::DuplicatePath(path));
            }
        }
        Ok(Self { handlers, by_path })
    }

    pub fn get(&self, path: &str) -> Option<&dyn Handler> {
        self.by_path.get(path).map(|&idx| self.handlers[idx].as_ref())
    }

    /// Handler descriptions in registration order.
    pub fn infos(&self) -> impl Iterator<Item = &'static HandlerInfo> + '_ {
        self.handlers.iter().map(|h| h.info())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
