//! Request decoding, handler dispatch and the response envelope.

use crate::error::HandlerError;
use crate::host::model::HostModel;
use crate::server::registry::{Arguments, HandlerRegistry};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error};

/// Body of every request: an object of named scalar arguments.
pub struct RequestEnvelope;

impl RequestEnvelope {
    /// Decode a request body. An empty body is an empty argument map.
    pub fn decode(body: &[u8]) -> Result<Arguments, HandlerError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Arguments::new());
        }
        let args = match serde_json::from_slice::<Value>(body)? {
            Value::Object(args) => args,
            other => {
                return Err(HandlerError::InvalidParams(format!(
                    "request body must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };
        if let Some((name, value)) = args
            .iter()
            .find(|(_, v)| matches!(v, Value::Array(_) | Value::Object(_)))
        {
            return Err(HandlerError::InvalidParams(format!(
                "argument '{name}' must be a scalar, got {}",
                json_kind(value)
            )));
        }
        Ok(args)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `{"data": ..., "error": ...}`; `error` is omitted on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn ok(data: Value) -> Self {
        Self { data, error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: Value::Null,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<Value, String> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }
}

/// Status plus envelope for one handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub status: StatusCode,
    pub envelope: ResponseEnvelope,
}

impl DispatchOutcome {
    pub fn ok(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: ResponseEnvelope::ok(data),
        }
    }

    pub fn from_error(err: &HandlerError) -> Self {
        Self {
            status: err.status(),
            envelope: ResponseEnvelope::error(err.to_string()),
        }
    }
}

impl From<HandlerError> for DispatchOutcome {
    fn from(err: HandlerError) -> Self {
        Self::from_error(&err)
    }
}

pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Route one request. Every path produces an outcome; failures never
    /// escape this call.
    pub fn dispatch(&self, host: &mut dyn HostModel, path: &str, body: &[u8]) -> DispatchOutcome {
        let Some(handler) = self.registry.get(path) else {
            debug!(path = %path, "No handler for path");
            return HandlerError::UnknownPath(path.to_string()).into();
        };
        let args = match RequestEnvelope::decode(body) {
            Ok(args) => args,
            Err(e) => return e.into(),
        };

        match catch_unwind(AssertUnwindSafe(|| handler.run(host, args))) {
            Ok(Ok(data)) => DispatchOutcome::ok(data),
            Ok(Err(e)) => e.into(),
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(path = %path, panic = %msg, "Handler panicked");
                HandlerError::Host(format!("handler panicked: {msg}")).into()
            }
        }
    }
}
