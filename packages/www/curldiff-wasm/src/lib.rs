use curldiff::web::{
    compare_records as core_compare_records, diff_bodies as core_diff_bodies,
    parse_curl as core_parse_curl, WebError,
};
use curldiff::workbench::TestRecord;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn parse_curl(command: &str) -> Result<JsValue, JsValue> {
    convert_result(core_parse_curl(command))
}

#[wasm_bindgen]
pub fn diff_bodies(previous: &str, current: &str) -> Result<JsValue, JsValue> {
    convert_result(Ok(core_diff_bodies(previous, current)))
}

#[wasm_bindgen]
pub fn compare_records(records: JsValue, mode: Option<String>) -> Result<JsValue, JsValue> {
    let records: Vec<TestRecord> = from_value(records)
        .map_err(|err| JsValue::from_str(&format!("Invalid records: {err}")))?;

    convert_result(core_compare_records(&records, mode.as_deref()))
}

fn convert_result<T: Serialize>(result: Result<T, WebError>) -> Result<JsValue, JsValue> {
    match result {
        Ok(value) => to_value(&value)
            .map_err(|err| JsValue::from_str(&format!("Serialization error: {err}"))),
        Err(err) => Err(JsValue::from_str(&err.to_string())),
    }
}
