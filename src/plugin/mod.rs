//! Host-facing plugin surface: call descriptors, constants, fixed replies.
//!
//! The dispatching context itself is [`crate::GeomReader`].

pub mod data_block;

use serde::{Deserialize, Serialize};

use crate::request::NameValueList;

pub use data_block::{DataBlock, ReturnData};

/// Version reported by `version`.
pub const PLUGIN_VERSION: i32 = 1;

/// Interface versions above this are refused.
pub const MAX_INTERFACE_VERSION: u32 = 1;

/// Function run when the host names none.
pub const DEFAULT_METHOD: &str = "help";

/// Set `GEOM_READER_BUILD_DATE` at compile time to stamp builds.
pub const BUILD_DATE: &str = match option_env!("GEOM_READER_BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

pub const HELP_TEXT: &str = "\ngeom_reader: read geometry data by dotted path\n\n\
get(host=, port=, source=, signal=, key=[, element=][, custom_passive])\n\
    key            dotted path to a leaf attribute, e.g. p1.rectangle.centreR\n\
    custom_passive decode passive-structure geometry for element `element`;\n\
                   the last key segment is one of centreR, centreZ, dR, dZ,\n\
                   shapeAngle1, shapeAngle2 or geometry_type (2 rectangle, 3 oblique)\n\n\
help, version, builddate, defaultmethod, maxinterfaceversion, init, reset\n";

/// The named functions a host may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Init,
    Reset,
    Help,
    Version,
    BuildDate,
    DefaultMethod,
    MaxInterfaceVersion,
    Get,
}

impl Function {
    /// Case-insensitive match; `initialise` is an alias of `init`.
    pub fn parse(name: &str) -> Option<Self> {
        let f = match name.to_ascii_lowercase().as_str() {
            "init" | "initialise" => Function::Init,
            "reset" => Function::Reset,
            "help" => Function::Help,
            "version" => Function::Version,
            "builddate" => Function::BuildDate,
            "defaultmethod" => Function::DefaultMethod,
            "maxinterfaceversion" => Function::MaxInterfaceVersion,
            "get" => Function::Get,
            _ => return None,
        };
        Some(f)
    }
}

/// One inbound call from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCall {
    pub function: String,
    pub interface_version: u32,
    /// Host asks for state to be dropped.
    pub housekeeping: bool,
    pub args: NameValueList,
}

impl PluginCall {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            interface_version: MAX_INTERFACE_VERSION,
            housekeeping: false,
            args: NameValueList::new(),
        }
    }

    /// Parse `get(host=localhost, port=56565, ...)`. Without parentheses
    /// the whole string is the function name.
    pub fn parse(call: &str) -> Self {
        let call = call.trim();
        match call.split_once('(') {
            Some((function, rest)) => {
                let args = rest.trim_end().strip_suffix(')').unwrap_or(rest);
                Self::new(function.trim()).with_args(NameValueList::parse(args))
            }
            None => Self::new(call),
        }
    }

    pub fn with_args(mut self, args: NameValueList) -> Self {
        self.args = args;
        self
    }

    pub fn with_interface_version(mut self, version: u32) -> Self {
        self.interface_version = version;
        self
    }

    pub fn housekeeping(mut self) -> Self {
        self.housekeeping = true;
        self
    }
}
