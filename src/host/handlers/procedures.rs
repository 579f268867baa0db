//! Named-address listing.

use crate::error::HandlerError;
use crate::host::handlers::document_named;
use crate::host::model::HostModel;
use crate::host::types::ProcedureLabel;

/// List `{label, address}` for every named address, optionally limited to one
/// segment. Labels are demangled when the host knows a demangled form.
pub fn handle_procedures(
    host: &dyn HostModel,
    document_name: &str,
    segment_name: Option<&str>,
) -> Result<Vec<ProcedureLabel>, HandlerError> {
    let doc = document_named(host, document_name)?;

    let segments = match segment_name {
        Some(name) => vec![host
            .segment_by_name(doc, name)
            .ok_or_else(|| HandlerError::SegmentNotFound(name.to_string()))?],
        None => host.segments(doc),
    };

    let mut labels = Vec::new();
    for seg in segments {
        for address in host.named_addresses(seg) {
            let label = host
                .demangled_name_at(seg, address)
                .or_else(|| host.name_at(seg, address))
                .unwrap_or_else(|| format!("sub_{:x}", address));
            labels.push(ProcedureLabel { label, address });
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::snapshot::fixtures::demo_host;

    #[test]
    fn lists_all_segments_with_demangling() {
        let host = demo_host();
        let labels = handle_procedures(&host, "demo.hop", None).unwrap();
        assert_eq!(
            labels,
            vec![
                ProcedureLabel {
                    label: "_main".into(),
                    address: 0x1100
                },
                ProcedureLabel {
                    label: "foo::bar()".into(),
                    address: 0x1200
                },
                ProcedureLabel {
                    label: "_counter".into(),
                    address: 0x2010
                },
            ]
        );
    }

    #[test]
    fn filters_by_segment() {
        let host = demo_host();
        let labels = handle_procedures(&host, "demo.hop", Some("__DATA")).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].address, 0x2010);
        assert!(matches!(
            handle_procedures(&host, "demo.hop", Some("__LINKEDIT")),
            Err(HandlerError::SegmentNotFound(_))
        ));
    }
}
