use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};

use crate::error::{StacFormatError, StacFormatResult};
use crate::geometry::Geometry;

/// The field whose value selects which conversion rules apply.
pub const DISCRIMINATOR_FIELD: &str = "type";

/// One editable record, decoded from record text.
///
/// A record is normally a JSON object, but any valid JSON decodes; values that are not objects
/// never match a feature discriminator and pass through conversions untouched. Key order of the
/// decoded text is preserved when the record is encoded again.
///
/// Cloning a record produces a fully independent deep copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    /// Creates a new [`Record`] from an already decoded value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Decodes record text.
    ///
    /// ```
    /// use stac_format::Record;
    ///
    /// let record = Record::from_text(r#"{"type":"Feature","geometry":null}"#)?;
    /// assert!(record.is_feature("Feature"));
    /// assert!(Record::from_text("{").is_err());
    /// # Ok::<(), stac_format::StacFormatError>(())
    /// ```
    pub fn from_text(text: &str) -> StacFormatResult<Self> {
        serde_json::from_str(text)
            .map(Self)
            .map_err(StacFormatError::Decode)
    }

    /// Encodes the record, indenting nested values by `indent` spaces.
    ///
    /// An indent of zero produces compact text on a single line.
    pub fn to_text(&self, indent: usize) -> String {
        if indent == 0 {
            return self.0.to_string();
        }
        let indent = " ".repeat(indent);
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = Serializer::with_formatter(Vec::new(), formatter);
        // Writing a `Value` into memory has no failure path.
        self.0
            .serialize(&mut serializer)
            .expect("serializing a JSON value into memory cannot fail");
        String::from_utf8(serializer.into_inner()).expect("serde_json emits valid UTF-8")
    }

    /// The value of the `type` field, if it is a string.
    pub fn discriminator(&self) -> Option<&str> {
        self.0.get(DISCRIMINATOR_FIELD).and_then(Value::as_str)
    }

    /// Returns `true` if the discriminator equals `marker`.
    pub fn is_feature(&self, marker: &str) -> bool {
        self.discriminator() == Some(marker)
    }

    /// The current encoding of `field`.
    ///
    /// Returns `None` when the field is missing or holds something that is not a convertible
    /// geometry (see [`Geometry::try_from`]).
    pub fn geometry(&self, field: &str) -> Option<Geometry> {
        self.0
            .get(field)
            .cloned()
            .and_then(|value| Geometry::try_from(value).ok())
    }

    /// Replaces `field` with `geometry`, keeping the field's position among the record's keys.
    ///
    /// Has no effect on records that are not JSON objects.
    pub fn set_geometry(&mut self, field: &str, geometry: Geometry) {
        if let Value::Object(map) = &mut self.0 {
            map.insert(field.to_string(), geometry.into_value());
        }
    }

    /// Access the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the record, returning the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        value.0
    }
}
