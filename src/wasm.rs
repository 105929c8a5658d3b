use crate::lookup::LookupData;
use wasm_bindgen::prelude::*;

fn parse_lookup(lookup_json: &str) -> Result<LookupData, JsValue> {
    if lookup_json.trim().is_empty() {
        return Ok(LookupData::default());
    }
    serde_json::from_str(lookup_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn generate_source(workspace_json: &str) -> Result<String, JsValue> {
    crate::generate_source(workspace_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn block_definitions(lookup_json: &str) -> Result<String, JsValue> {
    let lookup = parse_lookup(lookup_json)?;
    Ok(crate::blocks::definitions_json(&lookup).to_string())
}

/// `[[label, value], ...]` for a `vn_show` block bound to `variable_id`.
#[wasm_bindgen]
pub fn sprite_choices(workspace_json: &str, variable_id: &str, lookup_json: &str) -> Result<String, JsValue> {
    let lookup = parse_lookup(lookup_json)?;
    let workspace = crate::serialization::parse_workspace(workspace_json)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let choices = crate::blocks::sprite_choices_for(&workspace, variable_id, &lookup);
    serde_json::to_string(&choices).map_err(|e| JsValue::from_str(&e.to_string()))
}
