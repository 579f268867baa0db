//! Typed arguments for each route.
//!
//! Unknown argument names are rejected, matching a handler invoked with
//! parameters it does not declare.

use crate::error::HandlerError;
use crate::host::handlers::parse_address_str;
use crate::server::registry::Arguments;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Bind decoded arguments to a request struct.
pub fn bind<T: DeserializeOwned>(args: Arguments) -> Result<T, HandlerError> {
    Ok(serde_json::from_value(Value::Object(args))?)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyParams {}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentRequest {
    pub document_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProceduresRequest {
    pub document_name: String,
    /// Limit the listing to one segment.
    #[serde(default)]
    pub segment_name: Option<String>,
}

/// An address given as a JSON integer or as a string (`0x1000`, `4096`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AddressArg {
    Int(u64),
    Text(String),
}

impl AddressArg {
    pub fn resolve(&self) -> Result<u64, HandlerError> {
        match self {
            AddressArg::Int(addr) => Ok(*addr),
            AddressArg::Text(s) => parse_address_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcedureRequest {
    pub document_name: String,
    #[serde(default)]
    pub procedure_address: Option<AddressArg>,
}

impl ProcedureRequest {
    /// The requested address; absent or zero counts as not given.
    pub fn address(&self) -> Result<u64, HandlerError> {
        match &self.procedure_address {
            None => Err(HandlerError::MissingAddress),
            Some(arg) => match arg.resolve()? {
                0 => Err(HandlerError::MissingAddress),
                addr => Ok(addr),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn binds_named_arguments() {
        let req: ProceduresRequest =
            bind(args(json!({"document_name": "a.hop", "segment_name": "__TEXT"}))).unwrap();
        assert_eq!(req.document_name, "a.hop");
        assert_eq!(req.segment_name.as_deref(), Some("__TEXT"));
    }

    #[test]
    fn rejects_unknown_and_missing_arguments() {
        assert!(bind::<DocumentRequest>(args(json!({}))).is_err());
        assert!(bind::<DocumentRequest>(args(json!({"document_name": "a", "x": 1}))).is_err());
        assert!(bind::<EmptyParams>(args(json!({"document_name": "a"}))).is_err());
        assert!(bind::<EmptyParams>(Arguments::new()).is_ok());
    }

    #[test]
    fn procedure_address_forms() {
        let req: ProcedureRequest =
            bind(args(json!({"document_name": "a", "procedure_address": 4352}))).unwrap();
        assert_eq!(req.address().unwrap(), 0x1100);
        let req: ProcedureRequest =
            bind(args(json!({"document_name": "a", "procedure_address": "0x1100"}))).unwrap();
        assert_eq!(req.address().unwrap(), 0x1100);
    }

    #[test]
    fn zero_or_absent_address_is_missing() {
        let req: ProcedureRequest = bind(args(json!({"document_name": "a"}))).unwrap();
        assert!(matches!(req.address(), Err(HandlerError::MissingAddress)));
        let req: ProcedureRequest =
            bind(args(json!({"document_name": "a", "procedure_address": 0}))).unwrap();
        assert!(matches!(req.address(), Err(HandlerError::MissingAddress)));
        let req: ProcedureRequest =
            bind(args(json!({"document_name": "a", "procedure_address": "main"}))).unwrap();
        assert!(matches!(req.address(), Err(HandlerError::InvalidAddress(_))));
    }
}
