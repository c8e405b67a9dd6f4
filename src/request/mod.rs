//! Request descriptors — from host name/value parameters to a typed lookup.
//!
//! The host hands over loosely typed `name=value` pairs. They are checked
//! once here and turned into a [`Request`]; nothing further down the call
//! chain looks at flags or sentinel values.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolve::{PathSegments, split_path};
use crate::{Error, Result};

/// Element value meaning "not supplied".
pub const ELEMENT_NOT_SUPPLIED: i64 = 999;

// ============================================================================
// NameValueList
// ============================================================================

/// Ordered `name=value` pairs as supplied by the host.
///
/// Lookup is case-insensitive on the name; the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValueList {
    pairs: Vec<(String, String)>,
}

impl NameValueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `host=localhost, port=56565, custom_passive`.
    ///
    /// A bare name is stored with an empty value. Surrounding double quotes
    /// on values are dropped.
    pub fn parse(args: &str) -> Self {
        let pairs = args
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| match item.split_once('=') {
                Some((name, value)) => (name.trim().to_owned(), unquote(value.trim()).to_owned()),
                None => (item.to_owned(), String::new()),
            })
            .collect();
        Self { pairs }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.pairs.push((name.into(), value.to_string()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn find_required_str(&self, name: &str) -> Result<&str> {
        self.find(name).ok_or_else(|| Error::MissingParameter(name.to_owned()))
    }

    pub fn find_int(&self, name: &str) -> Result<Option<i64>> {
        self.find(name)
            .map(|v| {
                v.parse::<i64>().map_err(|_| Error::InvalidParameter {
                    name: name.to_owned(),
                    value: v.to_owned(),
                })
            })
            .transpose()
    }

    pub fn find_required_int(&self, name: &str) -> Result<i64> {
        self.find_int(name)?.ok_or_else(|| Error::MissingParameter(name.to_owned()))
    }

    /// A flag is set when the name is present, whatever its value.
    pub fn has_flag(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

impl<N: Into<String>, V: ToString> FromIterator<(N, V)> for NameValueList {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self { pairs: iter.into_iter().map(|(n, v)| (n.into(), v.to_string())).collect() }
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

// ============================================================================
// Request
// ============================================================================

/// What a `get` call asks for, resolved once at the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Walk `path` and read the leaf attribute it names.
    GenericLookup { path: PathSegments },
    /// Walk to a passive-structure element node and decode a shape field.
    PassiveGeometryLookup { path: PathSegments, element_index: usize },
}

impl Request {
    pub fn path(&self) -> &[String] {
        match self {
            Request::GenericLookup { path } | Request::PassiveGeometryLookup { path, .. } => path,
        }
    }
}

/// Where the tree fetch goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Identifies one fetched tree: a signal name and a source (shot) number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchQuery {
    /// Lower-cased signal path, e.g. `/magnetics/pfcoil/d1_upper`.
    pub signal: String,
    /// Decimal source identifier.
    pub source: String,
}

impl FetchQuery {
    pub fn new(signal: &str, source: i64) -> Self {
        Self { signal: signal.to_lowercase(), source: source.to_string() }
    }
}

/// Parameters of a `get` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParams {
    pub host: String,
    pub port: u16,
    pub source: i64,
    pub signal: String,
    pub key: String,
    /// `None` when the host sent nothing or the 999 sentinel.
    pub element: Option<usize>,
    pub custom_passive: bool,
}

impl GetParams {
    pub fn from_name_values(args: &NameValueList) -> Result<Self> {
        let port = args.find_required_int("port")?;
        let port = u16::try_from(port).map_err(|_| Error::InvalidParameter {
            name: "port".into(),
            value: port.to_string(),
        })?;

        let element = match args.find_int("element")? {
            None | Some(ELEMENT_NOT_SUPPLIED) => None,
            Some(e) => Some(usize::try_from(e).map_err(|_| Error::InvalidParameter {
                name: "element".into(),
                value: e.to_string(),
            })?),
        };

        let params = Self {
            host: args.find_required_str("host")?.to_owned(),
            port,
            source: args.find_required_int("source")?,
            signal: args.find_required_str("signal")?.to_owned(),
            key: args.find_required_str("key")?.to_owned(),
            element,
            custom_passive: args.has_flag("custom_passive"),
        };
        debug!(?params, "parsed get parameters");
        Ok(params)
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig { host: self.host.clone(), port: self.port }
    }

    pub fn fetch_query(&self) -> FetchQuery {
        FetchQuery::new(&self.signal, self.source)
    }

    /// Build the typed request. Geometry mode needs an element index.
    pub fn to_request(&self) -> Result<Request> {
        let path = split_path(&self.key)?;
        if !self.custom_passive {
            return Ok(Request::GenericLookup { path });
        }
        let element_index = self.element.ok_or_else(|| Error::InvalidParameter {
            name: "element".into(),
            value: ELEMENT_NOT_SUPPLIED.to_string(),
        })?;
        Ok(Request::PassiveGeometryLookup { path, element_index })
    }
}
