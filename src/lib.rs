#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
use pyo3::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod ast;
pub mod assembler;
pub mod continuity;
pub mod error;
pub mod parser;
pub mod tags;
pub mod types;

pub use assembler::{ExtractOptions, Extractor};
pub use continuity::{find_existing_snippet_id, RandomIdSource, SnippetIdSource};
pub use error::{DinkError, Diagnostic, Severity};
pub use types::{
    ActionLine, Beat, BeatCommon, Block, DialogueLine, Extraction, NonDialogueLine, Origin, Scene,
    Snippet,
};

/// Extracts scenes and non-dialogue lines from Ink source text.
///
/// When `previous` holds an earlier extraction of the same file, snippets whose
/// beats mostly carry over keep their old ids.
pub fn extract(text: &str, source_path: &str, previous: Option<&[Scene]>) -> Extraction {
    Extractor::default().extract_text(text, source_path, previous)
}

pub fn extract_with_options(
    text: &str,
    source_path: &str,
    previous: Option<&[Scene]>,
    options: ExtractOptions,
) -> Result<Extraction, DinkError> {
    options.validate()?;
    Ok(Extractor::new(options).extract_text(text, source_path, previous))
}

pub fn extraction_to_json(extraction: &Extraction) -> Result<String, DinkError> {
    Ok(serde_json::to_string_pretty(extraction)?)
}

/// Reads the `scenes` array of a JSON extraction, or a bare array of scenes.
pub fn scenes_from_json(json: &str) -> Result<Vec<Scene>, DinkError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let scenes = match value {
        serde_json::Value::Object(mut obj) => obj
            .remove("scenes")
            .unwrap_or(serde_json::Value::Array(Vec::new())),
        other => other,
    };
    Ok(serde_json::from_value(scenes)?)
}

pub fn extract_json(
    text: &str,
    source_path: &str,
    previous_json: Option<&str>,
) -> Result<String, DinkError> {
    extract_json_with_options(text, source_path, previous_json, ExtractOptions::default())
}

pub fn extract_json_with_options(
    text: &str,
    source_path: &str,
    previous_json: Option<&str>,
    options: ExtractOptions,
) -> Result<String, DinkError> {
    let previous = previous_json.map(scenes_from_json).transpose()?;
    let extraction = extract_with_options(text, source_path, previous.as_deref(), options)?;
    extraction_to_json(&extraction)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
#[pyo3(signature = (text, source_path, previous_json=None))]
fn extract_text(text: String, source_path: String, previous_json: Option<String>) -> PyResult<String> {
    extract_json(&text, &source_path, previous_json.as_deref())
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn extract_text_wasm(text: &str, source_path: &str) -> Result<String, JsValue> {
    extract_json(text, source_path, None).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn extract_text_with_options_wasm(
    text: &str,
    source_path: &str,
    previous_json: Option<String>,
    options_json: &str,
) -> Result<String, JsValue> {
    let options = ExtractOptions::from_json(options_json)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    extract_json_with_options(text, source_path, previous_json.as_deref(), options)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pymodule]
fn dink_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(extract_text, m)?)?;
    Ok(())
}
