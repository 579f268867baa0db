//! Segment-related handlers.

use crate::error::HandlerError;
use crate::host::handlers::document_named;
use crate::host::model::HostModel;

pub fn handle_segments(
    host: &dyn HostModel,
    document_name: &str,
) -> Result<Vec<String>, HandlerError> {
    let doc = document_named(host, document_name)?;
    Ok(host
        .segments(doc)
        .into_iter()
        .filter_map(|seg| host.segment_name(seg))
        .collect())
}
