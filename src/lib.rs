//! # geom-reader-rs — Dotted-Path Geometry Lookup
//!
//! Reads values out of hierarchical geometry trees fetched from a remote
//! data source, and decodes passive-structure (coil/plate) elements into
//! concrete shape parameters.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `TreeSource` is the contract between the reader and whatever fetches trees
//! 2. **Borrowed views**: `TreeNode` and `Leaf` point into the fetched tree, nothing is copied until the result
//! 3. **Resolution is pure**: path walking, extraction and geometry decoding do no I/O
//! 4. **Typed requests**: host flags and sentinels become a `Request` once, at the entry point
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geom_reader::{GeomReader, PluginCall, Value};
//!
//! # async fn example() -> geom_reader::Result<()> {
//! let mut reader = GeomReader::open_memory();
//! reader.source().insert_json("/magnetics/pfcoil/d1_upper", 45272, r#"{
//!     "name": "root",
//!     "children": [{"name": "p1", "atomics": [
//!         {"name": "centreR", "type": "float", "data": [10.0]},
//!         {"name": "centreZ", "type": "float", "data": [5.0]},
//!         {"name": "dR", "type": "float", "data": [2.0]},
//!         {"name": "dZ", "type": "float", "data": [4.0]},
//!         {"name": "shapeAngle1", "type": "float", "data": [30.0]},
//!         {"name": "shapeAngle2", "type": "float", "data": [60.0]}
//!     ]}]
//! }"#)?;
//!
//! let call = PluginCall::parse(
//!     "get(host=localhost, port=56565, source=45272, \
//!      signal=/magnetics/pfcoil/d1_upper, key=p1.centreR, element=0, custom_passive)",
//! );
//! let block = reader.handle(&call).await?;
//! if let Some(Value::Float(r)) = block.value() {
//!     println!("corner R = {r}");
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod resolve;
pub mod extract;
pub mod geometry;
pub mod request;
pub mod source;
pub mod plugin;

use tracing::{debug, info, warn};

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Tree, TreeNode, NodeId, NodeSpec,
    Atomic, AtomicData, AtomicDescriptor, ElementType, Value,
};

// ============================================================================
// Re-exports: Resolution, extraction, geometry
// ============================================================================

pub use resolve::{resolve, split_path, tree_check, unwrap_data_wrappers, Resolved, PathSegments};
pub use extract::{extract, Leaf};
pub use geometry::{classify, decode, ElementGeometry, GeometryKind, ShapeField};

// ============================================================================
// Re-exports: Requests, sources, plugin surface
// ============================================================================

pub use request::{FetchQuery, GetParams, NameValueList, Request, ServerConfig};
pub use source::{FetchResult, FetchStatus, MemorySource, Payload, TreeSource};
pub use plugin::{DataBlock, Function, PluginCall, ReturnData};

// ============================================================================
// Core pipeline
// ============================================================================

/// Run a request against an already-fetched tree.
///
/// Peels the `data` wrappers, walks the path, then either reads the leaf
/// attribute or decodes the passive-structure field it names.
pub fn lookup(tree: &Tree, request: &Request) -> Result<Value> {
    let root = unwrap_data_wrappers(tree.root());
    let resolved = resolve(root, request.path())?;
    match request {
        Request::GenericLookup { .. } => Ok(extract(resolved.node, resolved.leaf)?.to_value()),
        Request::PassiveGeometryLookup { element_index, .. } => {
            decode(resolved.node, *element_index, resolved.leaf)
        }
    }
}

// ============================================================================
// Top-level reader handle
// ============================================================================

/// The caller-owned plugin context. A `GeomReader` wraps a tree source and
/// dispatches host calls.
pub struct GeomReader<S: TreeSource> {
    source: S,
    initialised: bool,
}

impl<S: TreeSource> GeomReader<S> {
    /// Create a reader over the given source. Not yet initialised.
    pub fn with_source(source: S) -> Self {
        Self { source, initialised: false }
    }

    /// (Re)initialise: drops any state, then marks the reader ready.
    pub fn init(&mut self) {
        self.reset();
        self.initialised = true;
        debug!("reader initialised");
    }

    /// Drop state. A no-op before `init`.
    pub fn reset(&mut self) {
        if !self.initialised {
            return;
        }
        self.initialised = false;
        debug!("reader reset");
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Access the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Dispatch one host call.
    pub async fn handle(&mut self, call: &PluginCall) -> Result<DataBlock> {
        if call.interface_version > plugin::MAX_INTERFACE_VERSION {
            return Err(Error::UnsupportedInterfaceVersion {
                requested: call.interface_version,
                max: plugin::MAX_INTERFACE_VERSION,
            });
        }

        let function = Function::parse(&call.function);
        if call.housekeeping || function == Some(Function::Reset) {
            self.reset();
            return Ok(DataBlock::empty());
        }

        if !self.initialised || function == Some(Function::Init) {
            self.init();
        }

        let result = match function {
            Some(Function::Init | Function::Reset) => Ok(DataBlock::empty()),
            Some(Function::Help) => Ok(self.help()),
            Some(Function::Version) => Ok(self.version()),
            Some(Function::BuildDate) => Ok(self.build_date()),
            Some(Function::DefaultMethod) => Ok(self.default_method()),
            Some(Function::MaxInterfaceVersion) => Ok(self.max_interface_version()),
            Some(Function::Get) => match GetParams::from_name_values(&call.args) {
                Ok(params) => self.get(&params).await,
                Err(e) => Err(e),
            },
            None => Err(Error::UnknownFunction(call.function.clone())),
        };

        if let Err(e) = &result {
            warn!(function = %call.function, kind = ?e.kind(), error = %e, "plugin call failed");
        }
        result
    }

    /// Fetch the tree named by `params` and look up its key.
    #[tracing::instrument(skip(self, params), fields(signal = %params.signal, key = %params.key))]
    pub async fn get(&self, params: &GetParams) -> Result<DataBlock> {
        let request = params.to_request()?;

        self.source.connect(&params.server()).await?;
        let query = params.fetch_query();
        let tree = self.source.fetch(&query).await?.into_tree()?;
        info!(source = %query.source, nodes = tree.len(), "fetched geometry tree");

        let value = lookup(&tree, &request)?;
        let description = match &request {
            Request::GenericLookup { .. } => params.key.clone(),
            Request::PassiveGeometryLookup { element_index, .. } => {
                format!("{} [element {element_index}]", params.key)
            }
        };
        Ok(DataBlock::from_value(value, description))
    }

    pub fn help(&self) -> DataBlock {
        DataBlock::text(plugin::HELP_TEXT, "geom_reader: help = description of this plugin")
    }

    pub fn version(&self) -> DataBlock {
        DataBlock::from_value(Value::Int(plugin::PLUGIN_VERSION), "Plugin version number")
    }

    pub fn build_date(&self) -> DataBlock {
        DataBlock::text(plugin::BUILD_DATE, "Plugin build date")
    }

    pub fn default_method(&self) -> DataBlock {
        DataBlock::text(plugin::DEFAULT_METHOD, "Plugin default method")
    }

    pub fn max_interface_version(&self) -> DataBlock {
        let max = i32::try_from(plugin::MAX_INTERFACE_VERSION).unwrap_or(i32::MAX);
        DataBlock::from_value(Value::Int(max), "Maximum Interface Version")
    }
}

/// Reader over pre-registered in-memory trees, for testing and embedding.
impl GeomReader<MemorySource> {
    pub fn open_memory() -> Self {
        Self::with_source(MemorySource::new())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Failure category, for hosts that report errors as codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyPath,
    PathSegmentNotFound,
    AttributeNotFound,
    UnsupportedType,
    IndexOutOfRange,
    MissingAngleData,
    FieldNotSupportedInMode,
    UpstreamFetchFailed,
    UpstreamShapeMismatch,
    MissingParameter,
    InvalidParameter,
    UnknownFunction,
    UnsupportedInterfaceVersion,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Empty lookup path")]
    EmptyPath,

    #[error("Path segment '{segment}' not found, available children: {available:?}")]
    PathSegmentNotFound { segment: String, available: Vec<String> },

    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("Unsupported element type: {0}")]
    UnsupportedType(String),

    #[error("Element index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Missing tilt angle data: {0}")]
    MissingAngleData(String),

    #[error("Field '{field}' not supported for {mode} geometry")]
    FieldNotSupportedInMode { field: String, mode: GeometryKind },

    #[error("Upstream fetch failed ({code}): {message}")]
    UpstreamFetchFailed { code: i32, message: String },

    #[error("Upstream data has unexpected shape: {0}")]
    UpstreamShapeMismatch(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid value '{value}' for parameter {name}")]
    InvalidParameter { name: String, value: String },

    #[error("Unknown function requested: {0}")]
    UnknownFunction(String),

    #[error("Plugin interface version {requested} unknown to this plugin (max {max})")]
    UnsupportedInterfaceVersion { requested: u32, max: u32 },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyPath => ErrorKind::EmptyPath,
            Error::PathSegmentNotFound { .. } => ErrorKind::PathSegmentNotFound,
            Error::AttributeNotFound(_) => ErrorKind::AttributeNotFound,
            Error::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Error::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Error::MissingAngleData(_) => ErrorKind::MissingAngleData,
            Error::FieldNotSupportedInMode { .. } => ErrorKind::FieldNotSupportedInMode,
            Error::UpstreamFetchFailed { .. } => ErrorKind::UpstreamFetchFailed,
            Error::UpstreamShapeMismatch(_) => ErrorKind::UpstreamShapeMismatch,
            Error::MissingParameter(_) => ErrorKind::MissingParameter,
            Error::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Error::UnknownFunction(_) => ErrorKind::UnknownFunction,
            Error::UnsupportedInterfaceVersion { .. } => ErrorKind::UnsupportedInterfaceVersion,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
