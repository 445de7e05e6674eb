//! Registration of custom formats with a host editing environment.
//!
//! A host looks formats up by name and calls their Loader when a record is opened and their
//! Saver when it is persisted. Nothing is registered implicitly; bootstrap code builds a
//! [`FormatRegistry`] and calls [`register_stac_format`] (or [`FormatRegistry::register`]).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{StacFormatError, StacFormatResult};
use crate::format::{StacFormatOptions, StacJsonFormat};
use crate::record::Record;

/// The serialization a host uses underneath a custom format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SerializationKind {
    #[default]
    #[serde(rename = "json")]
    Json,

    #[serde(rename = "yaml")]
    Yaml,

    #[serde(rename = "toml")]
    Toml,

    /// Markdown with a metadata header.
    #[serde(rename = "frontmatter")]
    Frontmatter,
}

impl SerializationKind {
    /// The lowercase name hosts use for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Frontmatter => "frontmatter",
        }
    }
}

impl fmt::Display for SerializationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializationKind {
    type Err = StacFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "frontmatter" => Ok(Self::Frontmatter),
            other => Err(StacFormatError::UnknownSerializationKind(other.to_string())),
        }
    }
}

/// A Loader/Saver pair a host can register under a name.
pub trait CustomFormat: Send + Sync {
    /// Decodes stored text into the editor form.
    fn from_file(&self, text: &str) -> StacFormatResult<Record>;

    /// Encodes an edited record into stored text.
    fn to_file(&self, record: &Record) -> String;
}

struct Registration {
    kind: SerializationKind,
    format: Arc<dyn CustomFormat>,
}

/// Named custom formats known to a host.
#[derive(Default)]
pub struct FormatRegistry {
    formats: HashMap<String, Registration>,
}

impl FormatRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `format` under `name`.
    ///
    /// Names are unique; registering the same name twice is an error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: SerializationKind,
        format: Arc<dyn CustomFormat>,
    ) -> StacFormatResult<()> {
        let name = name.into();
        if self.formats.contains_key(&name) {
            return Err(StacFormatError::DuplicateFormat(name));
        }
        debug!("Registered custom format {name} ({kind})");
        self.formats.insert(name, Registration { kind, format });
        Ok(())
    }

    /// The format registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CustomFormat>> {
        self.formats
            .get(name)
            .map(|registration| registration.format.clone())
    }

    /// The serialization kind `name` was registered with.
    pub fn kind(&self, name: &str) -> Option<SerializationKind> {
        self.formats.get(name).map(|registration| registration.kind)
    }

    /// Returns `true` if a format is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// The number of registered formats.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Runs the Loader of the format registered under `name`.
    pub fn from_file(&self, name: &str, text: &str) -> StacFormatResult<Record> {
        self.lookup(name)?.from_file(text)
    }

    /// Runs the Saver of the format registered under `name`.
    pub fn to_file(&self, name: &str, record: &Record) -> StacFormatResult<String> {
        Ok(self.lookup(name)?.to_file(record))
    }

    fn lookup(&self, name: &str) -> StacFormatResult<&dyn CustomFormat> {
        self.formats
            .get(name)
            .map(|registration| registration.format.as_ref())
            .ok_or_else(|| StacFormatError::UnknownFormat(name.to_string()))
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.formats.keys().collect();
        names.sort();
        f.debug_struct("FormatRegistry")
            .field("formats", &names)
            .finish()
    }
}

/// Registers a [`StacJsonFormat`] built from `options` under `options.name`.
///
/// ```
/// use stac_format::{register_stac_format, FormatRegistry, StacFormatOptions};
///
/// let mut registry = FormatRegistry::new();
/// register_stac_format(&mut registry, StacFormatOptions::default())?;
/// let record = registry.from_file("stac-json", r#"{"type":"Feature","geometry":{}}"#)?;
/// assert_eq!(record.as_value()["geometry"], "{}");
/// # Ok::<(), stac_format::StacFormatError>(())
/// ```
pub fn register_stac_format(
    registry: &mut FormatRegistry,
    options: StacFormatOptions,
) -> StacFormatResult<()> {
    let name = options.name.clone();
    let kind = options.extension;
    let format = StacJsonFormat::try_new(options)?;
    registry.register(name, kind, Arc::new(format))
}
