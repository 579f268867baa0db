//! The routes served by the proxy.

use crate::error::HandlerError;
use crate::host::handlers::{disasm, documents, procedures, segments, strings};
use crate::host::model::HostModel;
use crate::server::registry::{
    Access, Arguments, Handler, HandlerInfo, HandlerRegistry, RegistryError,
};
use crate::server::requests::{
    bind, DocumentRequest, EmptyParams, ProcedureRequest, ProceduresRequest,
};
use serde_json::Value;

/// Declare a unit handler with its static description.
macro_rules! route {
    ($ty:ident, $info:ident, $path:literal, $access:ident, [$($req:literal),*], [$($opt:literal),*], $desc:literal) => {
        pub struct $ty;

        static $info: HandlerInfo = HandlerInfo {
            path: $path,
            access: Access::$access,
            required: &[$($req),*],
            optional: &[$($opt),*],
            description: $desc,
        };
    };
}

route!(SegmentsRoute, SEGMENTS, "/segments", Read, ["document_name"], [], "Segment names of a document");
route!(
    ProceduresRoute,
    PROCEDURES,
    "/procedures",
    Read,
    ["document_name"],
    ["segment_name"],
    "Named addresses as {label, address}, demangled where possible"
);
route!(StringsRoute, STRINGS, "/strings", Read, ["document_name"], [], "C strings from the __cstring section");
route!(
    DecompileRoute,
    DECOMPILE,
    "/decompile",
    Read,
    ["document_name", "procedure_address"],
    [],
    "Pseudocode of the procedure at an address"
);
route!(
    DisassembleRoute,
    DISASSEMBLE,
    "/disassemble",
    Read,
    ["document_name", "procedure_address"],
    [],
    "Disassembly of every basic block of a procedure"
);
route!(DocumentsRoute, DOCUMENTS, "/documents", Read, [], [], "Names of all open documents");
route!(AnalysisRoute, ANALYSIS, "/analysis", Read, ["document_name"], [], "Whether background analysis is running");
route!(FilepathRoute, FILEPATH, "/filepath", Read, ["document_name"], [], "Path of the file a document was opened from");
route!(TerminateRoute, TERMINATE, "/terminate", Mutate, [], [], "Kill every host process");

fn to_data<T: serde::Serialize>(value: T) -> Result<Value, HandlerError> {
    Ok(serde_json::to_value(value)?)
}

impl Handler for SegmentsRoute {
    fn info(&self) -> &'static HandlerInfo {
        &SEGMENTS
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let req: DocumentRequest = bind(args)?;
        to_data(segments::handle_segments(host, &req.document_name)?)
    }
}

impl Handler for ProceduresRoute {
    fn info(&self) -> &'static HandlerInfo {
        &PROCEDURES
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let req: ProceduresRequest = bind(args)?;
        to_data(procedures::handle_procedures(
            host,
            &req.document_name,
            req.segment_name.as_deref(),
        )?)
    }
}

impl Handler for StringsRoute {
    fn info(&self) -> &'static HandlerInfo {
        &STRINGS
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let req: DocumentRequest = bind(args)?;
        to_data(strings::handle_strings(host, &req.document_name)?)
    }
}

impl Handler for DecompileRoute {
    fn info(&self) -> &'static HandlerInfo {
        &DECOMPILE
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let req: ProcedureRequest = bind(args)?;
        let addr = req.address()?;
        to_data(disasm::handle_decompile(host, &req.document_name, addr)?)
    }
}

impl Handler for DisassembleRoute {
    fn info(&self) -> &'static HandlerInfo {
        &DISASSEMBLE
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let req: ProcedureRequest = bind(args)?;
        let addr = req.address()?;
        to_data(disasm::handle_disassemble(host, &req.document_name, addr)?)
    }
}

impl Handler for DocumentsRoute {
    fn info(&self) -> &'static HandlerInfo {
        &DOCUMENTS
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let _: EmptyParams = bind(args)?;
        to_data(documents::handle_documents(host)?)
    }
}

impl Handler for AnalysisRoute {
    fn info(&self) -> &'static HandlerInfo {
        &ANALYSIS
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let req: DocumentRequest = bind(args)?;
        to_data(documents::handle_analysis(host, &req.document_name)?)
    }
}

impl Handler for FilepathRoute {
    fn info(&self) -> &'static HandlerInfo {
        &FILEPATH
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let req: DocumentRequest = bind(args)?;
        to_data(documents::handle_filepath(host, &req.document_name)?)
    }
}

impl Handler for TerminateRoute {
    fn info(&self) -> &'static HandlerInfo {
        &TERMINATE
    }

    fn run(&self, host: &mut dyn HostModel, args: Arguments) -> Result<Value, HandlerError> {
        let _: EmptyParams = bind(args)?;
        to_data(documents::handle_terminate(host)?)
    }
}

/// Every route, in catalogue order.
pub fn default_registry() -> Result<HandlerRegistry, RegistryError> {
    HandlerRegistry::new(vec![
        Box::new(SegmentsRoute),
        Box::new(ProceduresRoute),
        Box::new(StringsRoute),
        Box::new(DecompileRoute),
        Box::new(DisassembleRoute),
        Box::new(DocumentsRoute),
        Box::new(AnalysisRoute),
        Box::new(FilepathRoute),
        Box::new(TerminateRoute),
    ])
}
