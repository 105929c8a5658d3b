use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The value stored in one block field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Choice(String),
    Number(f64),
    /// Structured data kept as JSON text, the way the editor stores it.
    Json(String),
    Variable { id: String },
}

impl FieldValue {
    /// Text-like view of the value. Variable references have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) | FieldValue::Json(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Variable { .. } => None,
        }
    }

    pub fn variable_id(&self) -> Option<&str> {
        match self {
            FieldValue::Variable { id } => Some(id),
            _ => None,
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One visual instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub id: String,
    /// Block type name as registered in the editor (e.g. `vn_say`).
    pub kind: String,
    pub fields: BTreeMap<String, FieldValue>,
    /// Named statement slots, each an ordered sequence.
    pub children: BTreeMap<String, Vec<BlockNode>>,
}

impl BlockNode {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            fields: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn with_text(self, name: &str, value: &str) -> Self {
        self.with_field(name, FieldValue::Text(value.to_string()))
    }

    pub fn with_choice(self, name: &str, value: &str) -> Self {
        self.with_field(name, FieldValue::Choice(value.to_string()))
    }

    pub fn with_variable(self, name: &str, id: &str) -> Self {
        self.with_field(name, FieldValue::Variable { id: id.to_string() })
    }

    pub fn with_children(mut self, slot: &str, children: Vec<BlockNode>) -> Self {
        self.children.insert(slot.to_string(), children);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Field text, or an empty string when missing.
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
    }

    pub fn slot(&self, name: &str) -> &[BlockNode] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A top-level stack of blocks with its canvas position.
#[derive(Debug, Clone, PartialEq)]
pub struct TopBlock {
    pub x: i64,
    pub y: i64,
    pub blocks: Vec<BlockNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: String,
}

/// Workspace-scoped variables, looked up by stable id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    variables: Vec<Variable>,
}

impl VariableTable {
    pub fn new(variables: Vec<Variable>) -> Self {
        Self { variables }
    }

    pub fn get(&self, id: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id == id)
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.get(id).map(|v| v.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workspace {
    pub top_blocks: Vec<TopBlock>,
    pub variables: VariableTable,
}

/// Sprite placement on the layout grid, stored as a JSON field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(rename = "wR")]
    pub grid_width: u32,
    #[serde(rename = "hR")]
    pub grid_height: u32,
    #[serde(rename = "wF")]
    pub frame_width: u32,
    #[serde(rename = "hF")]
    pub frame_height: u32,
    pub col: u32,
    pub row: u32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            grid_width: 16,
            grid_height: 9,
            frame_width: 4,
            frame_height: 8,
            col: 7,
            row: 1,
        }
    }
}

impl Placement {
    pub fn from_field(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    pub fn to_field(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Normalises a drag from `start` to `current` (both `(col, row)`, 1-based)
    /// into a selection on the existing grid.
    pub fn select(self, start: (u32, u32), current: (u32, u32)) -> Self {
        Self {
            col: start.0.min(current.0),
            row: start.1.min(current.1),
            frame_width: start.0.abs_diff(current.0) + 1,
            frame_height: start.1.abs_diff(current.1) + 1,
            ..self
        }
    }

    /// Grid cells are 1-based and the frame must fit inside the grid.
    pub fn is_valid(&self) -> bool {
        self.grid_width > 0
            && self.grid_height > 0
            && self.col >= 1
            && self.row >= 1
            && self.frame_width >= 1
            && self.frame_height >= 1
            && fits(self.col, self.frame_width, self.grid_width)
            && fits(self.row, self.frame_height, self.grid_height)
    }
}

/// Whether a span starting at 1-based `start` ends inside `limit`.
fn fits(start: u32, span: u32, limit: u32) -> bool {
    start
        .checked_add(span)
        .is_some_and(|end| end - 1 <= limit)
}
