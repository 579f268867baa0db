//! Discovery of the host's control port.
//!
//! The host picks its control port at startup and only reports it when a second
//! bare instance is started, which prints the marker line and exits.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU16;
use std::sync::OnceLock;

/// Default port the proxy listener binds when run standalone.
pub const DEFAULT_PROXY_PORT: u16 = 52349;

/// A known, non-zero control port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlPort(NonZeroU16);

impl ControlPort {
    pub fn new(port: u16) -> Option<Self> {
        NonZeroU16::new(port).map(Self)
    }

    pub fn get(self) -> u16 {
        self.0.get()
    }
}

impl fmt::Display for ControlPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ControlPort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.get())
    }
}

fn port_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"already running on port:\s*(\d+)").expect("port marker regex is valid")
    })
}

/// Extract the announced port from captured host output.
pub fn discover_port(output: &str) -> Option<ControlPort> {
    let caps = port_marker().captures(output)?;
    let port = caps.get(1)?.as_str().parse::<u16>().ok()?;
    ControlPort::new(port)
}
