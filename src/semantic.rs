use crate::ast::{BlockNode, FieldValue, VariableTable, Workspace};
use crate::blocks::{can_connect, BlockDefinition, BlockKind, Connection, FieldKind};
use crate::lookup::{LookupData, ERROR_SENTINEL};
use crate::sanitize::strip_label;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Inputs that may legitimately stay blank.
const OPTIONAL_FIELDS: &[&str] = &[
    "TEXT1", "LABEL1", "TEXT2", "LABEL2", "TEXT3", "LABEL3", "TEXT4", "LABEL4", "VALUE", "DIALOGUE",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticWarning {
    pub block_id: String,
    pub message: String,
}

impl Display for SemanticWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "block '{}': {}", self.block_id, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SemanticReport {
    pub warnings: Vec<SemanticWarning>,
}

impl SemanticReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Checks a workspace for problems the editor would normally prevent.
/// Findings never stop generation; they only explain degraded output.
pub fn analyze(workspace: &Workspace) -> SemanticReport {
    let mut analyzer = Analyzer {
        variables: &workspace.variables,
        labels: HashMap::new(),
        report: SemanticReport::default(),
    };
    for top in &workspace.top_blocks {
        analyzer.visit_sequence(&top.blocks, Connection::Any, "top level");
    }
    analyzer.report
}

/// Flags `define_character` blocks naming ids the library does not know.
pub fn check_roster(workspace: &Workspace, lookup: &LookupData) -> SemanticReport {
    fn visit(blocks: &[BlockNode], lookup: &LookupData, report: &mut SemanticReport) {
        for block in blocks {
            if block.kind == BlockKind::DefineCharacter.type_name() {
                let id = block.text("CHAR_ID");
                let known = lookup.characters.iter().any(|(_, known)| *known == id);
                if !id.is_empty() && id != ERROR_SENTINEL && !known {
                    report.warnings.push(SemanticWarning {
                        block_id: block.id.clone(),
                        message: format!("character '{}' is not in the library", id),
                    });
                }
            }
            for children in block.children.values() {
                visit(children, lookup, report);
            }
        }
    }
    let mut report = SemanticReport::default();
    for top in &workspace.top_blocks {
        visit(&top.blocks, lookup, &mut report);
    }
    report
}

struct Analyzer<'a> {
    variables: &'a VariableTable,
    /// Label name -> id of the first block that declared it.
    labels: HashMap<String, String>,
    report: SemanticReport,
}

impl Analyzer<'_> {
    fn warn(&mut self, block: &BlockNode, message: String) {
        self.report.warnings.push(SemanticWarning {
            block_id: block.id.clone(),
            message,
        });
    }

    fn visit_sequence(&mut self, blocks: &[BlockNode], check: Connection, place: &str) {
        for block in blocks {
            self.visit_block(block, check, place);
        }
    }

    fn visit_block(&mut self, block: &BlockNode, check: Connection, place: &str) {
        let Some(kind) = BlockKind::from_type_name(&block.kind) else {
            self.warn(block, format!("unknown block type '{}'", block.kind));
            for (slot, children) in &block.children {
                self.visit_sequence(children, Connection::Any, slot);
            }
            return;
        };
        if !can_connect(check, kind) {
            self.warn(block, format!("'{}' cannot be placed at {}", block.kind, place));
        }
        let definition = kind.definition();
        self.check_fields(block, &definition);
        self.check_label(block, kind);

        for (slot, children) in &block.children {
            match definition.slot_check(slot) {
                Some(slot_check) => {
                    let place = format!("'{}' of '{}'", slot, block.kind);
                    self.visit_sequence(children, slot_check, &place);
                }
                None => {
                    self.warn(block, format!("'{}' has no slot named '{}'", block.kind, slot));
                }
            }
        }
    }

    fn check_fields(&mut self, block: &BlockNode, definition: &BlockDefinition) {
        for spec in definition.fields() {
            let value = block.field(spec.name);
            match (&spec.kind, value) {
                (FieldKind::Variable { var_type, .. }, Some(FieldValue::Variable { id })) => {
                    match self.variables.get(id) {
                        None => {
                            let message = format!("{} refers to missing variable '{}'", spec.name, id);
                            self.warn(block, message);
                        }
                        Some(var) if !var.var_type.is_empty() && var.var_type != *var_type => {
                            let message = format!(
                                "{} refers to '{}' of type '{}', expected '{}'",
                                spec.name, var.name, var.var_type, var_type
                            );
                            self.warn(block, message);
                        }
                        Some(_) => {}
                    }
                }
                (FieldKind::Dropdown { .. }, Some(value)) => {
                    if value.as_text().as_deref() == Some(ERROR_SENTINEL) {
                        self.warn(block, format!("{} has no valid choice", spec.name));
                    }
                }
                (FieldKind::Placement { .. }, Some(value)) => {
                    let valid = value
                        .as_text()
                        .and_then(|text| crate::ast::Placement::from_field(&text))
                        .map(|p| p.is_valid())
                        .unwrap_or(false);
                    if !valid {
                        self.warn(block, format!("{} is not a valid placement", spec.name));
                    }
                }
                _ => {}
            }
            let blank = match value {
                Some(FieldValue::Variable { .. }) => false,
                Some(v) => v.as_text().unwrap_or_default().trim().is_empty(),
                None => true,
            };
            if blank && !OPTIONAL_FIELDS.contains(&spec.name) {
                self.warn(block, format!("{} is blank", spec.name));
            }
        }
    }

    fn check_label(&mut self, block: &BlockNode, kind: BlockKind) {
        let field = match kind {
            BlockKind::Label => "LABEL_NAME",
            BlockKind::SceneSetup => "SCENE_NAME",
            _ => return,
        };
        let name = strip_label(&block.text(field));
        if name.is_empty() {
            return;
        }
        if let Some(first) = self.labels.get(&name).cloned() {
            let message = format!("label '{}' is already declared by block '{}'", name, first);
            self.warn(block, message);
        } else {
            self.labels.insert(name, block.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{TopBlock, Variable};

    fn workspace(blocks: Vec<BlockNode>) -> Workspace {
        Workspace {
            top_blocks: vec![TopBlock { x: 0, y: 0, blocks }],
            variables: VariableTable::new(vec![
                Variable {
                    id: "v1".to_string(),
                    name: "m".to_string(),
                    var_type: "Character".to_string(),
                },
                Variable {
                    id: "v2".to_string(),
                    name: "i".to_string(),
                    var_type: String::new(),
                },
                Variable {
                    id: "v3".to_string(),
                    name: "count".to_string(),
                    var_type: "Number".to_string(),
                },
            ]),
        }
    }

    fn messages(ws: &Workspace) -> Vec<String> {
        analyze(ws).warnings.into_iter().map(|w| w.message).collect()
    }

    #[test]
    fn out_of_range_placement_is_reported() {
        let custom = BlockNode::new("c", "vn_show_custom")
            .with_variable("CHAR_VAR", "v1")
            .with_text("SPRITE_NAME", "happy")
            .with_field(
                "PLACEMENT_DATA",
                FieldValue::Json(
                    r#"{"wR":16,"hR":9,"wF":4,"hF":8,"col":4294967295,"row":1}"#.to_string(),
                ),
            );
        assert_eq!(
            messages(&workspace(vec![custom])),
            vec!["PLACEMENT_DATA is not a valid placement".to_string()]
        );
    }

    #[test]
    fn clean_workspace_has_no_warnings() {
        let say = BlockNode::new("s", "vn_say")
            .with_variable("CHAR_VAR", "v1")
            .with_text("DIALOGUE", "Hi");
        let untyped = BlockNode::new("r", "vn_remove").with_variable("CHAR_VAR", "v2");
        assert!(analyze(&workspace(vec![say, untyped])).is_clean());
    }

    #[test]
    fn options_outside_menus_are_flagged() {
        let option = || {
            BlockNode::new("o", "vn_choice_option")
                .with_text("TEXT", "Yes")
                .with_text("LABEL", "yes")
        };
        let loose = messages(&workspace(vec![option()]));
        assert_eq!(loose, vec!["'vn_choice_option' cannot be placed at top level"]);

        let menu = BlockNode::new("m", "vn_choice_menu").with_children("OPTIONS", vec![option()]);
        assert!(messages(&workspace(vec![menu])).is_empty());

        let wrong = BlockNode::new("m", "vn_choice_menu").with_children(
            "OPTIONS",
            vec![BlockNode::new("f", "vn_finish")],
        );
        assert_eq!(
            messages(&workspace(vec![wrong])),
            vec!["'vn_finish' cannot be placed at 'OPTIONS' of 'vn_choice_menu'"]
        );
    }

    #[test]
    fn variable_problems() {
        let missing = BlockNode::new("s", "vn_say").with_variable("CHAR_VAR", "nope");
        let wrong_type = BlockNode::new("r", "vn_remove").with_variable("CHAR_VAR", "v3");
        let found = messages(&workspace(vec![missing, wrong_type]));
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("missing variable 'nope'"));
        assert!(found[1].contains("expected 'Character'"));
    }

    #[test]
    fn sentinels_blanks_and_duplicates() {
        let define = BlockNode::new("d", "define_character")
            .with_text("VAR_NAME", "m")
            .with_choice("CHAR_ID", "error");
        let blank_jump = BlockNode::new("j", "vn_jump").with_text("LABEL_NAME", "  ");
        let first = BlockNode::new("l1", "vn_label").with_text("LABEL_NAME", "start");
        let second = BlockNode::new("l2", "vn_label").with_text("LABEL_NAME", "start");
        let report = analyze(&workspace(vec![define, blank_jump, first, second]));
        let found = report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(
            found,
            vec![
                "block 'd': CHAR_ID has no valid choice",
                "block 'j': LABEL_NAME is blank",
                "block 'l2': label 'start' is already declared by block 'l1'",
            ]
        );
    }

    #[test]
    fn roster_check_flags_unknown_characters() {
        let define = |id: &str, char_id: &str| {
            BlockNode::new(id, "define_character")
                .with_text("VAR_NAME", "m")
                .with_choice("CHAR_ID", char_id)
        };
        let lookup = LookupData {
            characters: vec![("Monika".to_string(), "monika".to_string())],
            ..LookupData::default()
        };
        let ws = workspace(vec![define("a", "monika"), define("b", "yuri")]);
        let report = check_roster(&ws, &lookup);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].block_id, "b");
    }

    #[test]
    fn unknown_blocks_are_reported_and_descended() {
        let unknown = BlockNode::new("u", "controls_if")
            .with_children("DO0", vec![BlockNode::new("x", "mystery")]);
        assert_eq!(
            messages(&workspace(vec![unknown])),
            vec!["unknown block type 'controls_if'", "unknown block type 'mystery'"]
        );
    }
}
