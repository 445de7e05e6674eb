//! The STAC JSON custom format: the Loader ([`load`]) and Saver ([`save`]) pair.
//!
//! Storage keeps a STAC Item's `geometry` as a GeoJSON object, as the STAC specification
//! requires. The CMS map widget only edits geometry given as a string. [`StacJsonFormat`]
//! toggles between the two encodings at the file boundary:
//!
//! - [`from_file`](StacJsonFormat::from_file): geometry object → string, for editing.
//! - [`to_file`](StacJsonFormat::to_file): geometry string → object, for storage.
//!
//! ```
//! use stac_format::{load, save, Record};
//!
//! let record = load(r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]}}"#)?;
//! assert_eq!(
//!     record.as_value()["geometry"],
//!     r#"{"type":"Point","coordinates":[1,2]}"#
//! );
//!
//! let text = save(&record);
//! let stored = Record::from_text(&text)?;
//! assert_eq!(stored.as_value()["geometry"]["coordinates"][1], 2);
//! # Ok::<(), stac_format::StacFormatError>(())
//! ```

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::error::{StacFormatError, StacFormatResult};
use crate::record::Record;
use crate::registry::{CustomFormat, SerializationKind};

const MAX_INDENT: usize = 10;

/// Options for a [`StacJsonFormat`].
///
/// Every field has a default, so a partial object (or none at all) can be deserialized from host
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StacFormatOptions {
    /// Name the format is registered under.
    pub name: String,

    /// Underlying serialization the host reads and writes.
    pub extension: SerializationKind,

    /// Discriminator value identifying records whose geometry is converted.
    pub feature_type: String,

    /// Field holding the dual-encoded geometry.
    pub geometry_field: String,

    /// Spaces per indentation level in saved text. Zero writes compact text.
    pub indent: usize,
}

impl Default for StacFormatOptions {
    fn default() -> Self {
        Self {
            name: "stac-json".to_string(),
            extension: SerializationKind::Json,
            feature_type: "Feature".to_string(),
            geometry_field: "geometry".to_string(),
            indent: 2,
        }
    }
}

impl StacFormatOptions {
    /// Checks that the options describe a usable format.
    pub fn validate(&self) -> StacFormatResult<()> {
        if self.name.is_empty() {
            return Err(StacFormatError::InvalidOptions(
                "name must not be empty".to_string(),
            ));
        }
        if self.feature_type.is_empty() {
            return Err(StacFormatError::InvalidOptions(
                "featureType must not be empty".to_string(),
            ));
        }
        if self.geometry_field.is_empty() {
            return Err(StacFormatError::InvalidOptions(
                "geometryField must not be empty".to_string(),
            ));
        }
        if self.indent > MAX_INDENT {
            return Err(StacFormatError::InvalidOptions(format!(
                "indent must be at most {MAX_INDENT}, got {}",
                self.indent
            )));
        }
        Ok(())
    }
}

/// What a single conversion step did to a record's geometry.
#[derive(Debug)]
pub enum GeometryConversion {
    /// Not a feature, no geometry, or already in the target encoding.
    Unchanged,

    /// Structured geometry was serialized for the editor.
    ToText,

    /// Textual geometry was parsed for storage.
    ToStructured,

    /// Textual geometry could not be parsed and was kept as text.
    Failed(StacFormatError),
}

impl GeometryConversion {
    /// Returns `true` unless the geometry was left as it was.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::ToText | Self::ToStructured)
    }
}

/// A STAC Item custom format with a fixed set of [`StacFormatOptions`].
#[derive(Debug, Clone, Default)]
pub struct StacJsonFormat {
    options: StacFormatOptions,
}

impl StacJsonFormat {
    /// Creates a new format, validating `options`.
    pub fn try_new(options: StacFormatOptions) -> StacFormatResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// The options this format was built with.
    pub fn options(&self) -> &StacFormatOptions {
        &self.options
    }

    /// Converts structured geometry on `record` to text, in place.
    pub fn edit_geometry(&self, record: &mut Record) -> GeometryConversion {
        if !record.is_feature(&self.options.feature_type) {
            return GeometryConversion::Unchanged;
        }
        let field = self.options.geometry_field.as_str();
        match record.geometry(field) {
            Some(geometry) if geometry.is_structured() => {
                record.set_geometry(field, geometry.into_textual());
                GeometryConversion::ToText
            }
            _ => GeometryConversion::Unchanged,
        }
    }

    /// Converts textual geometry on `record` back to a structured value, in place.
    ///
    /// A parse failure leaves the text on the record and is reported as
    /// [`GeometryConversion::Failed`].
    pub fn store_geometry(&self, record: &mut Record) -> GeometryConversion {
        if !record.is_feature(&self.options.feature_type) {
            return GeometryConversion::Unchanged;
        }
        let field = self.options.geometry_field.as_str();
        match record.geometry(field) {
            Some(geometry) if geometry.is_textual() => match geometry.to_structured() {
                Ok(structured) => {
                    record.set_geometry(field, structured);
                    GeometryConversion::ToStructured
                }
                Err(err) => GeometryConversion::Failed(err),
            },
            _ => GeometryConversion::Unchanged,
        }
    }

    /// Decodes stored record text into the editor form.
    ///
    /// Malformed record text is the only error.
    pub fn from_file(&self, text: &str) -> StacFormatResult<Record> {
        let mut record = Record::from_text(text)?;
        if let GeometryConversion::ToText = self.edit_geometry(&mut record) {
            info!(
                "[{}] Converted {} object -> string for map widget",
                self.options.name, self.options.geometry_field
            );
        }
        Ok(record)
    }

    /// Encodes an edited record into storage text.
    ///
    /// Works on a copy of `record`. If textual geometry cannot be parsed the failure is logged
    /// and the record is stored with the geometry left as text.
    pub fn to_file(&self, record: &Record) -> String {
        let mut output = record.clone();
        match self.store_geometry(&mut output) {
            GeometryConversion::ToStructured => info!(
                "[{}] Converted {} string -> object for STAC compliance",
                self.options.name, self.options.geometry_field
            ),
            GeometryConversion::Failed(err) => error!(
                "[{}] Keeping {} as string: {err}",
                self.options.name, self.options.geometry_field
            ),
            GeometryConversion::Unchanged | GeometryConversion::ToText => {}
        }
        output.to_text(self.options.indent)
    }
}

impl CustomFormat for StacJsonFormat {
    fn from_file(&self, text: &str) -> StacFormatResult<Record> {
        StacJsonFormat::from_file(self, text)
    }

    fn to_file(&self, record: &Record) -> String {
        StacJsonFormat::to_file(self, record)
    }
}

/// Loads stored record text into the editor form using the default options.
pub fn load(text: &str) -> StacFormatResult<Record> {
    StacJsonFormat::default().from_file(text)
}

/// Saves an edited record into storage text using the default options.
pub fn save(record: &Record) -> String {
    StacJsonFormat::default().to_file(record)
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::sync::Once;

    use log::{Level, LevelFilter, Log, Metadata};
    use serde_json::{json, Value};

    use super::*;
    use crate::geometry::Geometry;

    thread_local! {
        static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    /// Keeps log records per test thread, so parallel tests do not see each other's output.
    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            CAPTURED.with(|captured| {
                captured
                    .borrow_mut()
                    .push((record.level(), record.args().to_string()))
            });
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<(Level, String)>) {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            log::set_logger(&LOGGER).unwrap();
            log::set_max_level(LevelFilter::Trace);
        });
        CAPTURED.with(|captured| captured.borrow_mut().clear());
        let out = f();
        (out, CAPTURED.with(|captured| captured.take()))
    }

    const POINT_ITEM: &str = r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]}}"#;

    fn decode(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    /// `{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]}}` through load and save.
    #[test]
    fn point_round_trip() {
        let record = load(POINT_ITEM).unwrap();
        assert_eq!(
            record.as_value()["geometry"],
            json!(r#"{"type":"Point","coordinates":[1,2]}"#)
        );

        let text = save(&record);
        assert_eq!(decode(&text), decode(POINT_ITEM));
    }

    #[test]
    fn load_malformed_text_fails() {
        let err = load(r#"{"type":"Feature","#).unwrap_err();
        assert!(matches!(err, StacFormatError::Decode(_)));
    }

    #[test]
    fn non_feature_round_trip_is_identity() {
        let inputs = [
            r#"{"type":"Collection","geometry":{"type":"Point","coordinates":[1,2]}}"#,
            r#"{"type":"Catalog","geometry":"{\"type\":\"Point\"}"}"#,
            r#"{"geometry":{"type":"Point","coordinates":[1,2]}}"#,
            r#"[{"type":"Feature","geometry":{}}]"#,
            "null",
        ];
        for input in inputs {
            let text = save(&load(input).unwrap());
            assert_eq!(decode(&text), decode(input), "{input}");
        }
    }

    #[test]
    fn load_already_textual_geometry_is_unchanged() {
        let input = r#"{"type":"Feature","geometry":"{\"type\":\"Point\",\"coordinates\":[1,2]}"}"#;
        let format = StacJsonFormat::default();

        let mut record = Record::from_text(input).unwrap();
        assert!(!format.edit_geometry(&mut record).is_applied());

        let loaded = format.from_file(input).unwrap();
        assert_eq!(
            loaded.as_value()["geometry"],
            json!(r#"{"type":"Point","coordinates":[1,2]}"#)
        );
    }

    #[test]
    fn load_without_geometry() {
        for input in [
            r#"{"type":"Feature"}"#,
            r#"{"type":"Feature","geometry":null}"#,
        ] {
            let record = load(input).unwrap();
            assert_eq!(record.as_value(), &decode(input));
        }
    }

    #[test]
    fn save_parses_textual_geometry() {
        let record = Record::new(json!({
            "type": "Feature",
            "id": "item-1",
            "geometry": r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#,
        }));
        let stored = decode(&save(&record));
        assert_eq!(
            stored["geometry"],
            json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]})
        );
        assert_eq!(stored["id"], json!("item-1"));
    }

    #[test]
    fn save_keeps_malformed_geometry_text() {
        let record = Record::new(json!({"type": "Feature", "geometry": "not json"}));
        let format = StacJsonFormat::default();

        let mut copy = record.clone();
        assert!(matches!(
            format.store_geometry(&mut copy),
            GeometryConversion::Failed(StacFormatError::GeometryDecode(_))
        ));

        let stored = decode(&format.to_file(&record));
        assert_eq!(stored["geometry"], json!("not json"));
    }

    #[test]
    fn save_does_not_mutate_caller_record() {
        let record = Record::new(json!({"type": "Feature", "geometry": "{\"type\":\"Point\"}"}));
        let _ = save(&record);
        assert_eq!(
            record.geometry("geometry"),
            Some(Geometry::Textual("{\"type\":\"Point\"}".to_string()))
        );
    }

    #[test]
    fn save_structured_geometry_untouched() {
        let record = Record::new(json!({"type": "Feature", "geometry": {"type": "Point"}}));
        let format = StacJsonFormat::default();
        let mut copy = record.clone();
        assert!(!format.store_geometry(&mut copy).is_applied());
        assert_eq!(decode(&format.to_file(&record)), record.into_value());
    }

    #[test]
    fn save_is_indented() {
        let record = Record::new(json!({"type": "Feature", "geometry": "{\"type\":\"Point\"}"}));
        let expected = "{\n  \"type\": \"Feature\",\n  \"geometry\": {\n    \"type\": \"Point\"\n  }\n}";
        assert_eq!(save(&record), expected);
    }

    #[test]
    fn custom_options() {
        let options = StacFormatOptions {
            feature_type: "Item".to_string(),
            geometry_field: "footprint".to_string(),
            indent: 0,
            ..Default::default()
        };
        let format = StacJsonFormat::try_new(options).unwrap();

        let record = format
            .from_file(r#"{"type":"Item","footprint":{"type":"Point"},"geometry":{"a":1}}"#)
            .unwrap();
        assert_eq!(record.as_value()["footprint"], json!(r#"{"type":"Point"}"#));
        assert_eq!(record.as_value()["geometry"], json!({"a": 1}));

        assert_eq!(
            format.to_file(&record),
            r#"{"type":"Item","footprint":{"type":"Point"},"geometry":{"a":1}}"#
        );
    }

    #[test]
    fn options_from_partial_config() {
        let options: StacFormatOptions = serde_json::from_str(r#"{"indent":4}"#).unwrap();
        assert_eq!(options.indent, 4);
        assert_eq!(options.name, "stac-json");
        assert_eq!(options.extension, SerializationKind::Json);

        let options: StacFormatOptions =
            serde_json::from_str(r#"{"geometryField":"geom","extension":"frontmatter"}"#).unwrap();
        assert_eq!(options.geometry_field, "geom");
        assert_eq!(options.extension, SerializationKind::Frontmatter);
    }

    #[test]
    fn invalid_options() {
        let bad = [
            StacFormatOptions {
                name: String::new(),
                ..Default::default()
            },
            StacFormatOptions {
                feature_type: String::new(),
                ..Default::default()
            },
            StacFormatOptions {
                geometry_field: String::new(),
                ..Default::default()
            },
            StacFormatOptions {
                indent: 11,
                ..Default::default()
            },
        ];
        for options in bad {
            assert!(matches!(
                StacJsonFormat::try_new(options),
                Err(StacFormatError::InvalidOptions(_))
            ));
        }
    }

    #[test]
    fn load_logs_once_per_conversion() {
        let (record, logs) = capture_logs(|| load(POINT_ITEM).unwrap());
        assert!(record.geometry("geometry").unwrap().is_textual());
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].0, Level::Info);
        assert!(logs[0].1.contains("object -> string"));
    }

    #[test]
    fn load_textual_geometry_logs_nothing() {
        let input = r#"{"type":"Feature","geometry":"{\"type\":\"Point\"}"}"#;
        let (_, logs) = capture_logs(|| load(input).unwrap());
        assert!(logs.is_empty(), "{logs:?}");
    }

    #[test]
    fn save_logs_conversion() {
        let record = Record::new(json!({"type": "Feature", "geometry": "{\"type\":\"Point\"}"}));
        let (_, logs) = capture_logs(|| save(&record));
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].0, Level::Info);
        assert!(logs[0].1.contains("string -> object"));
    }

    #[test]
    fn save_logs_parse_failure_with_detail() {
        let record = Record::new(json!({"type": "Feature", "geometry": "{"}));
        let (text, logs) = capture_logs(|| save(&record));
        assert_eq!(decode(&text)["geometry"], json!("{"));
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].0, Level::Error);
        assert!(logs[0].1.contains("EOF while parsing"), "{}", logs[0].1);
    }
}
