//! Handler bodies organized by domain.
//!
//! Each function takes the host model plus explicit arguments; there is no
//! notion of a "current" document.

pub mod disasm;
pub mod documents;
pub mod procedures;
pub mod segments;
pub mod strings;

use crate::error::HandlerError;
use crate::host::model::{Address, DocumentId, HostModel, ProcedureId, SegmentId};

/// Parse an address string supporting hex (0x), binary (0b), octal (0o), and decimal.
pub(crate) fn parse_address_str(s: &str) -> Result<u64, HandlerError> {
    let s = s.trim();
    let invalid = || HandlerError::InvalidAddress(s.to_string());
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|_| invalid())
    } else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2).map_err(|_| invalid())
    } else if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        u64::from_str_radix(oct, 8).map_err(|_| invalid())
    } else {
        s.parse::<u64>().map_err(|_| invalid())
    }
}

/// Find the open document whose display name is exactly `name`.
pub(crate) fn document_named(host: &dyn HostModel, name: &str) -> Result<DocumentId, HandlerError> {
    host.documents()
        .into_iter()
        .find(|doc| host.document_name(*doc).as_deref() == Some(name))
        .ok_or_else(|| HandlerError::DocumentNotFound(name.to_string()))
}

/// Procedures are addressed absolutely but the host only resolves them per
/// segment, so every segment is asked in turn.
pub(crate) fn find_procedure(
    host: &dyn HostModel,
    doc: DocumentId,
    addr: Address,
) -> Result<(SegmentId, ProcedureId), HandlerError> {
    host.segments(doc)
        .into_iter()
        .find_map(|seg| host.procedure_at(seg, addr).map(|proc| (seg, proc)))
        .ok_or(HandlerError::ProcedureNotFound(addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::snapshot::fixtures::demo_host;

    #[test]
    fn parses_address_radixes() {
        assert_eq!(parse_address_str("0x1f").unwrap(), 31);
        assert_eq!(parse_address_str(" 42 ").unwrap(), 42);
        assert_eq!(parse_address_str("0b101").unwrap(), 5);
        assert_eq!(parse_address_str("0o17").unwrap(), 15);
        assert!(matches!(
            parse_address_str("0xzz"),
            Err(HandlerError::InvalidAddress(_))
        ));
    }

    #[test]
    fn document_lookup_is_by_exact_name() {
        let host = demo_host();
        assert_eq!(document_named(&host, "demo.hop").unwrap(), DocumentId(0));
        assert!(matches!(
            document_named(&host, "demo"),
            Err(HandlerError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn procedure_search_spans_segments() {
        let host = demo_host();
        let (seg, proc) = find_procedure(&host, DocumentId(0), 0x1104).unwrap();
        assert_eq!(host.segment_name(seg).as_deref(), Some("__TEXT"));
        assert_eq!(proc.entry, 0x1100);
        assert!(matches!(
            find_procedure(&host, DocumentId(0), 0x2010),
            Err(HandlerError::ProcedureNotFound(0x2010))
        ));
    }
}
