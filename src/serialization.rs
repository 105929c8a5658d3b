//! Blockly workspace serialization (`Blockly.serialization.workspaces`).

use crate::ast::{BlockNode, FieldValue, TopBlock, Variable, VariableTable, Workspace};
use crate::blocks::{BlockKind, FieldKind};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

pub const LANGUAGE_VERSION: i64 = 0;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Invalid workspace JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Workspace root must be an object.")]
    NotAnObject,
    #[error("Invalid workspace: '{0}' has the wrong shape.")]
    Shape(&'static str),
    #[error("Block '{id}' is invalid: {message}")]
    InvalidBlock { id: String, message: String },
}

pub fn parse_workspace(json: &str) -> Result<Workspace, WorkspaceError> {
    let root: Value = serde_json::from_str(json)?;
    workspace_from_value(&root)
}

pub fn workspace_from_value(root: &Value) -> Result<Workspace, WorkspaceError> {
    let root = root.as_object().ok_or(WorkspaceError::NotAnObject)?;

    let variables = match root.get("variables") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value::<Vec<Variable>>(value.clone())
            .map_err(|_| WorkspaceError::Shape("variables"))?,
    };

    let mut ids = IdAllocator::default();
    let mut top_blocks = Vec::new();
    if let Some(blocks) = root.get("blocks") {
        let list = blocks
            .get("blocks")
            .and_then(Value::as_array)
            .ok_or(WorkspaceError::Shape("blocks.blocks"))?;
        for block in list {
            let x = block.get("x").and_then(Value::as_f64).unwrap_or(0.0).round() as i64;
            let y = block.get("y").and_then(Value::as_f64).unwrap_or(0.0).round() as i64;
            top_blocks.push(TopBlock {
                x,
                y,
                blocks: parse_chain(block, &mut ids)?,
            });
        }
    }

    Ok(Workspace {
        top_blocks,
        variables: VariableTable::new(variables),
    })
}

pub fn workspace_to_json(workspace: &Workspace) -> Value {
    let blocks = workspace
        .top_blocks
        .iter()
        .filter_map(|top| {
            let mut head = chain_to_json(&top.blocks)?;
            if let Some(obj) = head.as_object_mut() {
                obj.insert("x".to_string(), json!(top.x));
                obj.insert("y".to_string(), json!(top.y));
            }
            Some(head)
        })
        .collect::<Vec<_>>();
    let mut root = Map::new();
    root.insert(
        "blocks".to_string(),
        json!({ "languageVersion": LANGUAGE_VERSION, "blocks": blocks }),
    );
    if !workspace.variables.is_empty() {
        let variables = workspace
            .variables
            .iter()
            .map(|v| json!({ "name": v.name, "id": v.id, "type": v.var_type }))
            .collect::<Vec<_>>();
        root.insert("variables".to_string(), Value::Array(variables));
    }
    Value::Object(root)
}

#[derive(Default)]
struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    fn id_for(&mut self, block: &Value) -> String {
        match block.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                self.next += 1;
                format!("block_{}", self.next)
            }
        }
    }
}

/// Flattens a block and its `next` chain into an ordered sequence.
fn parse_chain(first: &Value, ids: &mut IdAllocator) -> Result<Vec<BlockNode>, WorkspaceError> {
    let mut out = Vec::new();
    let mut current = Some(first);
    while let Some(block) = current {
        out.push(parse_block(block, ids)?);
        current = block.get("next").and_then(|n| n.get("block"));
    }
    Ok(out)
}

fn parse_block(block: &Value, ids: &mut IdAllocator) -> Result<BlockNode, WorkspaceError> {
    let id = ids.id_for(block);
    let kind = block
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| WorkspaceError::InvalidBlock {
            id: id.clone(),
            message: "missing 'type'".to_string(),
        })?;
    let definition = BlockKind::from_type_name(kind).map(BlockKind::definition);

    let mut fields = BTreeMap::new();
    if let Some(raw_fields) = block.get("fields") {
        let raw_fields = raw_fields.as_object().ok_or_else(|| WorkspaceError::InvalidBlock {
            id: id.clone(),
            message: "'fields' must be an object".to_string(),
        })?;
        for (name, value) in raw_fields {
            let spec = definition.as_ref().and_then(|d| d.field(name)).map(|f| &f.kind);
            fields.insert(name.clone(), classify_field(spec, value));
        }
    }

    let mut children = BTreeMap::new();
    if let Some(inputs) = block.get("inputs").and_then(Value::as_object) {
        for (slot, input) in inputs {
            let Some(child) = input.get("block") else {
                continue;
            };
            children.insert(slot.clone(), parse_chain(child, ids)?);
        }
    }

    Ok(BlockNode {
        id,
        kind: kind.to_string(),
        fields,
        children,
    })
}

fn classify_field(spec: Option<&FieldKind>, value: &Value) -> FieldValue {
    match value {
        Value::Object(obj) => match obj.get("id").and_then(Value::as_str) {
            Some(id) => FieldValue::Variable { id: id.to_string() },
            None => FieldValue::Json(value.to_string()),
        },
        Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => match spec {
            Some(FieldKind::Dropdown { .. }) => FieldValue::Choice(s.clone()),
            Some(FieldKind::Placement { .. }) => FieldValue::Json(s.clone()),
            _ => FieldValue::Text(s.clone()),
        },
        Value::Bool(b) => FieldValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Null => FieldValue::Text(String::new()),
        Value::Array(_) => FieldValue::Json(value.to_string()),
    }
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) | FieldValue::Choice(s) | FieldValue::Json(s) => json!(s),
        FieldValue::Number(n) => json!(n),
        FieldValue::Variable { id } => json!({ "id": id }),
    }
}

fn block_to_json(node: &BlockNode) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), json!(node.kind));
    obj.insert("id".to_string(), json!(node.id));
    if !node.fields.is_empty() {
        let fields = node
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), field_to_json(value)))
            .collect::<Map<_, _>>();
        obj.insert("fields".to_string(), Value::Object(fields));
    }
    let inputs = node
        .children
        .iter()
        .filter_map(|(slot, chain)| {
            chain_to_json(chain).map(|block| (slot.clone(), json!({ "block": block })))
        })
        .collect::<Map<_, _>>();
    if !inputs.is_empty() {
        obj.insert("inputs".to_string(), Value::Object(inputs));
    }
    Value::Object(obj)
}

fn chain_to_json(chain: &[BlockNode]) -> Option<Value> {
    let mut next: Option<Value> = None;
    for node in chain.iter().rev() {
        let mut value = block_to_json(node);
        if let (Some(obj), Some(n)) = (value.as_object_mut(), next.take()) {
            obj.insert("next".to_string(), json!({ "block": n }));
        }
        next = Some(value);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "blocks": {
        "languageVersion": 0,
        "blocks": [
          {
            "type": "vn_conditional", "id": "c1", "x": 40, "y": 120.6,
            "fields": {"SCOPE": "Global", "VAR_NAME": "moni_aff", "OPERATOR": "MoreThan", "VALUE": "5"},
            "inputs": {
              "ACTIONS": {
                "block": {
                  "type": "vn_say", "id": "s1",
                  "fields": {"CHAR_VAR": {"id": "v1"}, "DIALOGUE": "Hi"},
                  "next": {"block": {"type": "vn_idle_chats", "id": "i1"}}
                }
              }
            },
            "next": {"block": {"type": "vn_finish"}}
          }
        ]
      },
      "variables": [{"name": "monika", "id": "v1", "type": "Character"}]
    }"#;

    #[test]
    fn parses_blockly_serialization() {
        let ws = parse_workspace(SAMPLE).unwrap();
        assert_eq!(ws.top_blocks.len(), 1);
        let top = &ws.top_blocks[0];
        assert_eq!((top.x, top.y), (40, 121));
        assert_eq!(top.blocks.len(), 2);
        assert_eq!(top.blocks[1].id, "block_1");

        let cond = &top.blocks[0];
        assert_eq!(cond.field("SCOPE"), Some(&FieldValue::Choice("Global".to_string())));
        assert_eq!(cond.field("VALUE"), Some(&FieldValue::Text("5".to_string())));
        let actions = cond.slot("ACTIONS");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].field("CHAR_VAR").and_then(FieldValue::variable_id), Some("v1"));
        assert_eq!(ws.variables.name_of("v1"), Some("monika"));
    }

    #[test]
    fn serialization_round_trips() {
        let ws = parse_workspace(SAMPLE).unwrap();
        let again = workspace_from_value(&workspace_to_json(&ws)).unwrap();
        assert_eq!(again, ws);
    }

    #[test]
    fn empty_workspace_is_accepted() {
        let ws = parse_workspace("{}").unwrap();
        assert!(ws.top_blocks.is_empty());
        let json = workspace_to_json(&ws);
        assert_eq!(json["blocks"]["blocks"], json!([]));
        assert!(json.get("variables").is_none());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(parse_workspace("[]"), Err(WorkspaceError::NotAnObject)));
        assert!(matches!(parse_workspace("{"), Err(WorkspaceError::Json(_))));
        let missing_type = r#"{"blocks": {"blocks": [{"id": "a"}]}}"#;
        let err = parse_workspace(missing_type).unwrap_err();
        assert_eq!(err.to_string(), "Block 'a' is invalid: missing 'type'");
    }
}
