use serde_json::Value;

use crate::error::{StacFormatError, StacFormatResult};

/// The two physical encodings of a record's geometry.
///
/// Storage keeps a GeoJSON geometry object ([`Geometry::Structured`]); the CMS map widget edits
/// the same object serialized to a string ([`Geometry::Textual`]). The inner GeoJSON schema is
/// never interpreted here, only the outer encoding is toggled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Geometry {
    /// A parsed JSON value, normally a GeoJSON geometry object.
    Structured(Value),

    /// The same value serialized as compact JSON text.
    Textual(String),
}

impl Geometry {
    /// Returns `true` for [`Geometry::Structured`].
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Returns `true` for [`Geometry::Textual`].
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Textual(_))
    }

    /// Serializes a structured geometry to compact JSON text.
    ///
    /// This cannot fail. A geometry that is already textual is returned unchanged.
    ///
    /// ```
    /// use serde_json::json;
    /// use stac_format::Geometry;
    ///
    /// let geometry = Geometry::Structured(json!({"type": "Point", "coordinates": [1, 2]}));
    /// assert_eq!(
    ///     geometry.into_textual(),
    ///     Geometry::Textual(r#"{"type":"Point","coordinates":[1,2]}"#.to_string())
    /// );
    /// ```
    pub fn into_textual(self) -> Self {
        match self {
            Self::Structured(value) => Self::Textual(value.to_string()),
            textual => textual,
        }
    }

    /// Parses a textual geometry back into a structured value.
    ///
    /// Any syntactically valid JSON is accepted. On failure `self` is left untouched so the
    /// caller still holds the original text.
    pub fn to_structured(&self) -> StacFormatResult<Self> {
        match self {
            Self::Textual(text) => serde_json::from_str(text)
                .map(Self::Structured)
                .map_err(StacFormatError::GeometryDecode),
            Self::Structured(value) => Ok(Self::Structured(value.clone())),
        }
    }

    /// Converts back into the raw JSON value stored on a record.
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(value) => value,
            Self::Textual(text) => Value::String(text),
        }
    }
}

impl TryFrom<Value> for Geometry {
    type Error = Value;

    /// Classifies a raw field value by its shape.
    ///
    /// Objects and arrays are structured, non-empty strings are textual. Everything else
    /// (`null`, booleans, numbers, `""`) is not a convertible geometry and is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(_) | Value::Array(_) => Ok(Self::Structured(value)),
            Value::String(text) if !text.is_empty() => Ok(Self::Textual(text)),
            other => Err(other),
        }
    }
}
