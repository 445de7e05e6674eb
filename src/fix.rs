//! Repair of items that were stored in the editor form.
//!
//! Items written before the custom format was in place may carry a stringified geometry and
//! empty strings for optional fields the editor left blank. [`fix_item`] rewrites such an item
//! into its storage form. Unlike [`save`](crate::save), a geometry that cannot be parsed is
//! reported as an error rather than kept.

use std::fmt;

use log::{debug, info};
use serde_json::Value;

use crate::error::StacFormatResult;
use crate::format::StacFormatOptions;
use crate::record::Record;

/// One kind of repair applied to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    /// Stringified geometry parsed into an object.
    Geometry,

    /// Entries holding an empty string removed.
    EmptyFields,
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry => f.write_str("geometry"),
            Self::EmptyFields => f.write_str("empty fields"),
        }
    }
}

/// The result of [`fix_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// The record is not a feature and was not inspected.
    Skipped,

    /// Nothing needed repair.
    AlreadyValid,

    /// The repaired item, as text ending in a newline.
    Fixed { fixes: Vec<Fix>, text: String },
}

/// Recursively removes object entries whose value is an empty string.
///
/// Arrays are walked, but their items are never removed.
///
/// ```
/// use serde_json::json;
/// use stac_format::remove_empty_strings;
///
/// let cleaned = remove_empty_strings(json!({"title": "", "keywords": ["", "a"]}));
/// assert_eq!(cleaned, json!({"keywords": ["", "a"]}));
/// ```
pub fn remove_empty_strings(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| v.as_str() != Some(""))
                .map(|(k, v)| (k, remove_empty_strings(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(remove_empty_strings).collect()),
        other => other,
    }
}

/// Repairs one item with the default options.
pub fn fix_item(text: &str) -> StacFormatResult<FixOutcome> {
    fix_item_with_options(text, &StacFormatOptions::default())
}

/// Repairs one item, using the feature type, geometry field and indent from `options`.
pub fn fix_item_with_options(
    text: &str,
    options: &StacFormatOptions,
) -> StacFormatResult<FixOutcome> {
    let mut record = Record::from_text(text)?;
    if !record.is_feature(&options.feature_type) {
        debug!("Skipping record: type is not {}", options.feature_type);
        return Ok(FixOutcome::Skipped);
    }

    let mut fixes = vec![];

    if let Some(geometry) = record.geometry(&options.geometry_field) {
        if geometry.is_textual() {
            let structured = geometry.to_structured()?;
            record.set_geometry(&options.geometry_field, structured);
            fixes.push(Fix::Geometry);
        }
    }

    let value = record.into_value();
    let cleaned = remove_empty_strings(value.clone());
    // Map equality ignores key order.
    let record = if cleaned != value {
        fixes.push(Fix::EmptyFields);
        Record::new(cleaned)
    } else {
        Record::new(value)
    };

    if fixes.is_empty() {
        return Ok(FixOutcome::AlreadyValid);
    }

    let fixes_list: Vec<_> = fixes.iter().map(Fix::to_string).collect();
    info!("Fixed item: {}", fixes_list.join(", "));

    let mut text = record.to_text(options.indent);
    text.push('\n');
    Ok(FixOutcome::Fixed { fixes, text })
}
