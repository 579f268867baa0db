//! Document-level handlers.

use crate::error::HandlerError;
use crate::host::handlers::document_named;
use crate::host::model::HostModel;
use crate::host::types::AnalysisState;

pub fn handle_documents(host: &dyn HostModel) -> Result<Vec<String>, HandlerError> {
    Ok(host
        .documents()
        .into_iter()
        .filter_map(|doc| host.document_name(doc))
        .collect())
}

pub fn handle_analysis(
    host: &dyn HostModel,
    document_name: &str,
) -> Result<AnalysisState, HandlerError> {
    let doc = document_named(host, document_name)?;
    Ok(AnalysisState {
        active: host.background_analysis_active(doc),
    })
}

/// Path of the file the document was opened from; `None` while the host has
/// not recorded one yet.
pub fn handle_filepath(
    host: &dyn HostModel,
    document_name: &str,
) -> Result<Option<String>, HandlerError> {
    let doc = document_named(host, document_name)?;
    Ok(host.executable_path(doc))
}

pub fn handle_terminate(host: &mut dyn HostModel) -> Result<usize, HandlerError> {
    host.terminate_host()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::snapshot::fixtures::demo_host;

    #[test]
    fn lists_open_documents() {
        let host = demo_host();
        assert_eq!(
            handle_documents(&host).unwrap(),
            vec!["demo.hop".to_string(), "Untitled 2".to_string()]
        );
    }

    #[test]
    fn reports_analysis_and_path() {
        let host = demo_host();
        assert!(!handle_analysis(&host, "demo.hop").unwrap().active);
        assert!(handle_analysis(&host, "Untitled 2").unwrap().active);
        assert_eq!(
            handle_filepath(&host, "demo.hop").unwrap().as_deref(),
            Some("/tmp/demo")
        );
        assert_eq!(handle_filepath(&host, "Untitled 2").unwrap(), None);
        assert!(handle_filepath(&host, "missing.hop").is_err());
    }

    #[test]
    fn terminate_clears_documents() {
        let mut host = demo_host();
        handle_terminate(&mut host).unwrap();
        assert!(handle_documents(&host).unwrap().is_empty());
    }
}
