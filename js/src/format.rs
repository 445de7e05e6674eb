use std::rc::Rc;

use js_sys::{Object, Reflect};
use serde::Serialize;
use serde_json::{Number, Value};
use serde_wasm_bindgen::Serializer;
use stac_format::{FixOutcome, Record, StacFormatOptions, StacJsonFormat};
use wasm_bindgen::prelude::*;

use crate::error::{to_js_value, WasmResult};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = CMS, js_name = registerCustomFormat)]
    fn register_custom_format(name: &str, extension: &str, methods: &Object)
        -> Result<(), JsValue>;
}

/// `Number.MAX_SAFE_INTEGER`.
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

fn is_unsafe_integer(number: &Number) -> bool {
    if let Some(i) = number.as_i64() {
        i.unsigned_abs() > MAX_SAFE_INTEGER
    } else if let Some(u) = number.as_u64() {
        u > MAX_SAFE_INTEGER
    } else {
        false
    }
}

/// Rounds integers beyond the safe range to the nearest double, the same value `JSON.parse`
/// would give.
fn to_js_numbers(value: Value) -> Value {
    match value {
        Value::Number(number) if is_unsafe_integer(&number) => number
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(items.into_iter().map(to_js_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, to_js_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}

fn record_to_js(record: Record) -> WasmResult<JsValue> {
    let value = to_js_numbers(record.into_value());
    // Plain objects rather than `Map`s, so the CMS can read fields directly.
    Ok(value.serialize(&Serializer::json_compatible())?)
}

fn record_from_js(data: JsValue) -> WasmResult<Record> {
    Ok(serde_wasm_bindgen::from_value(data)?)
}

fn parse_options(options: JsValue) -> WasmResult<StacFormatOptions> {
    if options.is_undefined() || options.is_null() {
        Ok(StacFormatOptions::default())
    } else {
        Ok(serde_wasm_bindgen::from_value(options)?)
    }
}

/// Parse a stored STAC Item into the object the CMS editor works on.
///
/// A geometry object on a `Feature` is replaced by its JSON string, which is what the map widget
/// expects.
///
/// @param text Raw JSON file content
/// @returns The parsed record with `geometry` as a string
#[wasm_bindgen(js_name = fromFile)]
pub fn from_file(text: &str) -> WasmResult<JsValue> {
    let record = StacJsonFormat::default().from_file(text)?;
    record_to_js(record)
}

/// Format an edited STAC Item for storage.
///
/// A geometry string on a `Feature` is parsed back into an object. If the string is not valid
/// JSON the error is logged to the console and the geometry is written as a string. The input
/// object is never modified.
///
/// @param data Entry data from the CMS
/// @returns JSON text indented by two spaces
#[wasm_bindgen(js_name = toFile)]
pub fn to_file(data: JsValue) -> WasmResult<String> {
    let record = record_from_js(data)?;
    Ok(StacJsonFormat::default().to_file(&record))
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum FixReport {
    Skipped,
    AlreadyValid,
    Fixed { fixes: Vec<String>, text: String },
}

impl From<FixOutcome> for FixReport {
    fn from(value: FixOutcome) -> Self {
        match value {
            FixOutcome::Skipped => Self::Skipped,
            FixOutcome::AlreadyValid => Self::AlreadyValid,
            FixOutcome::Fixed { fixes, text } => Self::Fixed {
                fixes: fixes.iter().map(ToString::to_string).collect(),
                text,
            },
        }
    }
}

/// Repair a STAC Item stored with a stringified geometry or empty optional fields.
///
/// Example:
///
/// ```js
/// const report = fixItem(text);
/// if (report.status === "fixed") {
///   await writeFile(path, report.text);
/// }
/// ```
///
/// @param text Raw JSON file content
/// @returns `{ status: "skipped" | "alreadyValid" }` or `{ status: "fixed", fixes, text }`
#[wasm_bindgen(js_name = fixItem)]
pub fn fix_item(text: &str) -> WasmResult<JsValue> {
    let report = FixReport::from(stac_format::fix_item(text)?);
    Ok(report.serialize(&Serializer::json_compatible())?)
}

/// Register the STAC JSON format with the CMS.
///
/// Call this from the page's bootstrap code, after the CMS script has loaded.
///
/// Example:
///
/// ```js
/// import init, { registerStacFormat } from "stac-format-wasm";
///
/// await init();
/// registerStacFormat({ name: "stac-json", extension: "json" });
/// ```
///
/// @param options Optional `{ name, extension, featureType, geometryField, indent }`
#[wasm_bindgen(js_name = registerStacFormat)]
pub fn register_stac_format(options: JsValue) -> Result<(), JsValue> {
    let options = parse_options(options).map_err(JsValue::from)?;
    let name = options.name.clone();
    let extension = options.extension;
    let format = Rc::new(StacJsonFormat::try_new(options).map_err(to_js_value)?);

    let loader = format.clone();
    let from_file = Closure::<dyn Fn(String) -> Result<JsValue, JsValue>>::new(
        move |text: String| {
            let record = loader.from_file(&text).map_err(to_js_value)?;
            record_to_js(record).map_err(JsValue::from)
        },
    );

    let saver = format;
    let to_file = Closure::<dyn Fn(JsValue) -> Result<String, JsValue>>::new(
        move |data: JsValue| {
            let record = record_from_js(data).map_err(JsValue::from)?;
            Ok(saver.to_file(&record))
        },
    );

    let methods = Object::new();
    Reflect::set(&methods, &"fromFile".into(), from_file.as_ref())?;
    Reflect::set(&methods, &"toFile".into(), to_file.as_ref())?;
    register_custom_format(&name, extension.as_str(), &methods)?;

    // The CMS keeps calling these for the lifetime of the page.
    from_file.forget();
    to_file.forget();

    log::info!("Registered custom STAC JSON format handler as {name}");
    Ok(())
}
