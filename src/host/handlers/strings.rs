//! C-string section scanning.

use crate::error::HandlerError;
use crate::host::handlers::document_named;
use crate::host::model::HostModel;

/// Section holding NUL-terminated literals in Mach-O images.
pub const CSTRING_SECTION: &str = "__cstring";

/// Walk `__cstring` object by object from its start address.
///
/// Each object's length includes its terminator, which is dropped before the
/// bytes are decoded and trimmed. The cursor always advances by at least one
/// byte and reads never extend past the end of the section.
pub fn handle_strings(
    host: &dyn HostModel,
    document_name: &str,
) -> Result<Vec<String>, HandlerError> {
    let doc = document_named(host, document_name)?;
    let section = host
        .section_by_name(doc, CSTRING_SECTION)
        .ok_or_else(|| HandlerError::SectionNotFound(CSTRING_SECTION.to_string()))?;
    let seg = host.segment_at(doc, section.start).ok_or_else(|| {
        HandlerError::SegmentNotFound(format!("segment containing {:#x}", section.start))
    })?;

    let end = section.end();
    let mut cursor = section.start;
    let mut strings = Vec::new();
    while cursor < end {
        let object_len = host.object_length(seg, cursor);
        let read_len = object_len.saturating_sub(1).min(end - cursor);
        let bytes = host.read_bytes(seg, cursor, read_len).unwrap_or_default();
        strings.push(decode_trimmed(&bytes));
        cursor = cursor.saturating_add(object_len.max(1));
    }
    Ok(strings)
}

fn decode_trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}
