use folio_core::{AnnotationRecord, ConvertOptions, MatchReport};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderOptions {
    text_name: Option<String>,
    column_class: Option<String>,
    annotatable: Option<String>,
    check_keys: Option<bool>,
    sanitize: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderResult {
    html: String,
    report: MatchReport,
}

/// Converts a tag-mapped document, pairing its annotatable spans with the
/// JSON record list in `records_json` (an empty string means no records).
#[wasm_bindgen]
pub fn convert_html(source: &str, records_json: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let records: Vec<AnnotationRecord> = if records_json.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(records_json).map_err(|err| JsValue::from_str(&err.to_string()))?
    };
    let options = options_from_js(options)?;
    let conversion = folio_core::convert(source, &records, &options)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;

    let result = RenderResult {
        html: conversion.html,
        report: conversion.report,
    };
    serde_wasm_bindgen::to_value(&result).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Reads a FLEx interlinear export and returns its records as JSON.
#[wasm_bindgen]
pub fn import_flex_json(source: &str) -> Result<String, JsValue> {
    let records =
        folio_core::import_flex(source).map_err(|err| JsValue::from_str(&err.to_string()))?;
    serde_json::to_string(&records).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Renders the table of contents of a tag-mapped document.
#[wasm_bindgen]
pub fn outline_html(source: &str, options: JsValue) -> Result<String, JsValue> {
    let options = options_from_js(options)?;
    folio_core::outline(source, &options).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn options_from_js(value: JsValue) -> Result<ConvertOptions, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(ConvertOptions::default());
    }
    let parsed: RenderOptions =
        serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let mut out = ConvertOptions::default();
    if let Some(text_name) = parsed.text_name {
        out.pagination.text_name = text_name;
    }
    if let Some(column_class) = parsed.column_class {
        out.pagination.column_class = column_class;
    }
    if let Some(annotatable) = parsed.annotatable {
        out.recognizer.annotatable = Some(annotatable);
    }
    if let Some(check_keys) = parsed.check_keys {
        out.annotation.check_keys = check_keys;
    }
    if let Some(sanitize) = parsed.sanitize {
        out.serialize.sanitize_payloads = sanitize;
    }
    Ok(out)
}
