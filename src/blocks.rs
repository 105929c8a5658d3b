//! Catalog of block kinds understood by the editor and the generator.

use crate::ast::{FieldValue, Placement, Workspace};
use crate::lookup::{ChoiceOption, LookupData, ERROR_SENTINEL};
use crate::sanitize::sanitize_identifier;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Connection check tag shared by choice options and the menu slot.
pub const OPTION_CHECK: &str = "VN_OPTION";
pub const CHARACTER_VAR_TYPE: &str = "Character";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    DefineCharacter,
    SceneSetup,
    Label,
    Jump,
    Next,
    Finish,
    Say,
    Speak,
    SoundEffect,
    Show,
    ShowCustom,
    ShowFull,
    Remove,
    RemoveSprite,
    SetVariable,
    ModifyVariable,
    Choice,
    ChoiceMenu,
    ChoiceOption,
    Conditional,
    ConditionalTime,
    IdleChats,
    UnlockDialogue,
}

impl BlockKind {
    pub const ALL: [BlockKind; 23] = [
        BlockKind::DefineCharacter,
        BlockKind::SceneSetup,
        BlockKind::Label,
        BlockKind::Jump,
        BlockKind::Next,
        BlockKind::Finish,
        BlockKind::Say,
        BlockKind::Speak,
        BlockKind::SoundEffect,
        BlockKind::Show,
        BlockKind::ShowCustom,
        BlockKind::ShowFull,
        BlockKind::Remove,
        BlockKind::RemoveSprite,
        BlockKind::SetVariable,
        BlockKind::ModifyVariable,
        BlockKind::Choice,
        BlockKind::ChoiceMenu,
        BlockKind::ChoiceOption,
        BlockKind::Conditional,
        BlockKind::ConditionalTime,
        BlockKind::IdleChats,
        BlockKind::UnlockDialogue,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            BlockKind::DefineCharacter => "define_character",
            BlockKind::SceneSetup => "vn_scene_setup",
            BlockKind::Label => "vn_label",
            BlockKind::Jump => "vn_jump",
            BlockKind::Next => "vn_next",
            BlockKind::Finish => "vn_finish",
            BlockKind::Say => "vn_say",
            BlockKind::Speak => "vn_speak",
            BlockKind::SoundEffect => "vn_sound_effect",
            BlockKind::Show => "vn_show",
            BlockKind::ShowCustom => "vn_show_custom",
            BlockKind::ShowFull => "vn_show_full",
            BlockKind::Remove => "vn_remove",
            BlockKind::RemoveSprite => "vn_remove_sprite",
            BlockKind::SetVariable => "vn_set_variable",
            BlockKind::ModifyVariable => "vn_modify_variable",
            BlockKind::Choice => "vn_choice",
            BlockKind::ChoiceMenu => "vn_choice_menu",
            BlockKind::ChoiceOption => "vn_choice_option",
            BlockKind::Conditional => "vn_conditional",
            BlockKind::ConditionalTime => "vn_conditional_time",
            BlockKind::IdleChats => "vn_idle_chats",
            BlockKind::UnlockDialogue => "vn_unlock_dialogue",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }

    pub fn schema(self) -> BlockSchema {
        match self {
            BlockKind::DefineCharacter => BlockSchema::Dynamic(define_character),
            BlockKind::Show => BlockSchema::Dynamic(show),
            BlockKind::SceneSetup => BlockSchema::Static(scene_setup),
            BlockKind::Label => BlockSchema::Static(label),
            BlockKind::Jump => BlockSchema::Static(jump),
            BlockKind::Next => BlockSchema::Static(next),
            BlockKind::Finish => BlockSchema::Static(finish),
            BlockKind::Say => BlockSchema::Static(say),
            BlockKind::Speak => BlockSchema::Static(speak),
            BlockKind::SoundEffect => BlockSchema::Static(sound_effect),
            BlockKind::ShowCustom => BlockSchema::Static(show_custom),
            BlockKind::ShowFull => BlockSchema::Static(show_full),
            BlockKind::Remove => BlockSchema::Static(remove),
            BlockKind::RemoveSprite => BlockSchema::Static(remove_sprite),
            BlockKind::SetVariable => BlockSchema::Static(set_variable),
            BlockKind::ModifyVariable => BlockSchema::Static(modify_variable),
            BlockKind::Choice => BlockSchema::Static(choice),
            BlockKind::ChoiceMenu => BlockSchema::Static(choice_menu),
            BlockKind::ChoiceOption => BlockSchema::Static(choice_option),
            BlockKind::Conditional => BlockSchema::Static(conditional),
            BlockKind::ConditionalTime => BlockSchema::Static(conditional_time),
            BlockKind::IdleChats => BlockSchema::Static(idle_chats),
            BlockKind::UnlockDialogue => BlockSchema::Static(unlock_dialogue),
        }
    }

    /// Definition with no lookup data; dynamic dropdowns hold the sentinel.
    pub fn definition(self) -> BlockDefinition {
        self.schema().build(&LookupData::default())
    }
}

/// A block kind is described either once, or by a factory over lookup data.
#[derive(Debug, Clone, Copy)]
pub enum BlockSchema {
    Static(fn() -> BlockDefinition),
    Dynamic(fn(&LookupData) -> BlockDefinition),
}

impl BlockSchema {
    pub fn build(&self, lookup: &LookupData) -> BlockDefinition {
        match self {
            BlockSchema::Static(make) => make(),
            BlockSchema::Dynamic(make) => make(lookup),
        }
    }
}

/// Every definition, in toolbox order.
pub fn definitions(lookup: &LookupData) -> Vec<BlockDefinition> {
    BlockKind::ALL
        .into_iter()
        .map(|kind| kind.schema().build(lookup))
        .collect()
}

/// Blockly JSON array for `defineBlocksWithJsonArray`.
pub fn definitions_json(lookup: &LookupData) -> Value {
    Value::Array(definitions(lookup).iter().map(BlockDefinition::to_json).collect())
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Input { default: String },
    /// Multi-line dialogue text edited in a modal.
    Dialogue { default: String },
    Dropdown { options: Vec<ChoiceOption> },
    Variable { var_type: &'static str, default: &'static str },
    Placement { default: Placement },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    None,
    Any,
    Check(&'static str),
}

impl Connection {
    fn to_json(self) -> Option<Value> {
        match self {
            Connection::None => None,
            Connection::Any => Some(Value::Null),
            Connection::Check(tag) => Some(Value::String(tag.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Field(FieldSpec),
    Statement { name: &'static str, check: Connection },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub message: &'static str,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockDefinition {
    pub kind: BlockKind,
    pub rows: Vec<Row>,
    pub previous: Connection,
    pub next: Connection,
    pub colour: u16,
    pub tooltip: &'static str,
}

impl BlockDefinition {
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.rows.iter().flat_map(|row| {
            row.args.iter().filter_map(|arg| match arg {
                Arg::Field(spec) => Some(spec),
                Arg::Statement { .. } => None,
            })
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.name == name)
    }

    /// `(slot name, check)` for every statement input.
    pub fn slots(&self) -> impl Iterator<Item = (&'static str, Connection)> + '_ {
        self.rows.iter().flat_map(|row| {
            row.args.iter().filter_map(|arg| match arg {
                Arg::Statement { name, check } => Some((*name, *check)),
                Arg::Field(_) => None,
            })
        })
    }

    pub fn slot_check(&self, name: &str) -> Option<Connection> {
        self.slots().find(|(slot, _)| *slot == name).map(|(_, c)| c)
    }

    /// Default field values of a freshly created block.
    pub fn default_fields(&self) -> BTreeMap<String, FieldValue> {
        let mut out = BTreeMap::new();
        for spec in self.fields() {
            let value = match &spec.kind {
                FieldKind::Input { default } | FieldKind::Dialogue { default } => {
                    FieldValue::Text(default.clone())
                }
                FieldKind::Dropdown { options } => FieldValue::Choice(
                    options.first().map(|(_, v)| v.clone()).unwrap_or_default(),
                ),
                // Variable fields need a workspace variable; left unset.
                FieldKind::Variable { .. } => continue,
                FieldKind::Placement { default } => FieldValue::Json(default.to_field()),
            };
            out.insert(spec.name.to_string(), value);
        }
        out
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!(self.kind.type_name()));
        for (index, row) in self.rows.iter().enumerate() {
            obj.insert(format!("message{}", index), json!(row.message));
            if !row.args.is_empty() {
                let args = row.args.iter().map(arg_json).collect::<Vec<_>>();
                obj.insert(format!("args{}", index), Value::Array(args));
            }
        }
        if let Some(prev) = self.previous.to_json() {
            obj.insert("previousStatement".to_string(), prev);
        }
        if let Some(next) = self.next.to_json() {
            obj.insert("nextStatement".to_string(), next);
        }
        obj.insert("colour".to_string(), json!(self.colour));
        obj.insert("tooltip".to_string(), json!(self.tooltip));
        obj.insert("helpUrl".to_string(), json!(""));
        Value::Object(obj)
    }
}

fn arg_json(arg: &Arg) -> Value {
    match arg {
        Arg::Statement { name, check } => {
            let mut obj = json!({ "type": "input_statement", "name": name });
            if let Connection::Check(tag) = check {
                obj["check"] = json!(tag);
            }
            obj
        }
        Arg::Field(spec) => match &spec.kind {
            FieldKind::Input { default } => {
                json!({ "type": "field_input", "name": spec.name, "text": default })
            }
            FieldKind::Dialogue { default } => {
                json!({ "type": "field_cute_modal", "name": spec.name, "text": default })
            }
            FieldKind::Dropdown { options } => {
                let options = options
                    .iter()
                    .map(|(label, value)| json!([label, value]))
                    .collect::<Vec<_>>();
                json!({ "type": "field_dropdown", "name": spec.name, "options": options })
            }
            FieldKind::Variable { var_type, default } => json!({
                "type": "field_variable",
                "name": spec.name,
                "variable": default,
                "variableTypes": [var_type],
                "defaultType": var_type,
            }),
            FieldKind::Placement { default } => json!({
                "type": "field_placement_modal",
                "name": spec.name,
                "value": default.to_field(),
            }),
        },
    }
}

/// Whether a block of `kind` may sit in a slot (or stack) with `check`.
pub fn can_connect(check: Connection, kind: BlockKind) -> bool {
    let previous = kind.definition().previous;
    match (check, previous) {
        (Connection::None, _) | (_, Connection::None) => false,
        (Connection::Any, Connection::Any) => true,
        (Connection::Any, Connection::Check(_)) | (Connection::Check(_), Connection::Any) => false,
        (Connection::Check(slot), Connection::Check(block)) => slot == block,
    }
}

/// Maps each character variable name declared by `define_character` blocks
/// to its library id.
pub fn character_bindings(workspace: &Workspace) -> BTreeMap<String, String> {
    fn visit(blocks: &[crate::ast::BlockNode], out: &mut BTreeMap<String, String>) {
        for block in blocks {
            if block.kind == BlockKind::DefineCharacter.type_name() {
                let id = block.text("CHAR_ID");
                if !id.is_empty() && id != ERROR_SENTINEL {
                    out.insert(sanitize_identifier(&block.text("VAR_NAME")), id);
                }
            }
            for children in block.children.values() {
                visit(children, out);
            }
        }
    }
    let mut out = BTreeMap::new();
    for top in &workspace.top_blocks {
        visit(&top.blocks, &mut out);
    }
    out
}

/// Sprite choices for a `vn_show` block whose character variable is `variable_id`.
pub fn sprite_choices_for(
    workspace: &Workspace,
    variable_id: &str,
    lookup: &LookupData,
) -> Vec<ChoiceOption> {
    let character_id = workspace
        .variables
        .name_of(variable_id)
        .map(sanitize_identifier)
        .and_then(|name| character_bindings(workspace).remove(&name));
    match character_id {
        Some(id) => lookup.sprite_options(&id),
        None => lookup.sprite_options(""),
    }
}

fn input(name: &'static str, default: &str) -> Arg {
    Arg::Field(FieldSpec {
        name,
        kind: FieldKind::Input {
            default: default.to_string(),
        },
    })
}

fn dropdown(name: &'static str, options: &[(&str, &str)]) -> Arg {
    dropdown_owned(
        name,
        options
            .iter()
            .map(|(l, v)| (l.to_string(), v.to_string()))
            .collect(),
    )
}

fn dropdown_owned(name: &'static str, options: Vec<ChoiceOption>) -> Arg {
    Arg::Field(FieldSpec {
        name,
        kind: FieldKind::Dropdown { options },
    })
}

fn character_var(name: &'static str) -> Arg {
    Arg::Field(FieldSpec {
        name,
        kind: FieldKind::Variable {
            var_type: CHARACTER_VAR_TYPE,
            default: "m",
        },
    })
}

fn dialogue(name: &'static str, default: &str) -> Arg {
    Arg::Field(FieldSpec {
        name,
        kind: FieldKind::Dialogue {
            default: default.to_string(),
        },
    })
}

fn statements(name: &'static str) -> Arg {
    Arg::Statement {
        name,
        check: Connection::Any,
    }
}

fn row(message: &'static str, args: Vec<Arg>) -> Row {
    Row { message, args }
}

fn statement_block(
    kind: BlockKind,
    colour: u16,
    tooltip: &'static str,
    rows: Vec<Row>,
) -> BlockDefinition {
    BlockDefinition {
        kind,
        rows,
        previous: Connection::Any,
        next: Connection::Any,
        colour,
        tooltip,
    }
}

const SCOPES: &[(&str, &str)] = &[("global", "Global"), ("local", "Var")];
const POSITIONS: &[(&str, &str)] = &[
    ("center", "show"),
    ("left", "show_left"),
    ("right", "show_right"),
];

fn define_character(lookup: &LookupData) -> BlockDefinition {
    statement_block(
        BlockKind::DefineCharacter,
        230,
        "Creates a variable to represent a character from your library.",
        vec![row(
            "define character %1 = %2",
            vec![
                input("VAR_NAME", "m"),
                dropdown_owned("CHAR_ID", lookup.character_options()),
            ],
        )],
    )
}

fn scene_setup() -> BlockDefinition {
    statement_block(
        BlockKind::SceneSetup,
        45,
        "Defines a scene with a unique label. Other blocks inside will be executed as part of this scene.",
        vec![
            row("scene: %1", vec![input("SCENE_NAME", "start")]),
            row("%1", vec![statements("STATEMENTS")]),
        ],
    )
}

fn label() -> BlockDefinition {
    statement_block(
        BlockKind::Label,
        45,
        "Creates a named location in the script that you can jump to.",
        vec![row("label: %1", vec![input("LABEL_NAME", "start")])],
    )
}

fn jump() -> BlockDefinition {
    statement_block(
        BlockKind::Jump,
        45,
        "Immediately jumps the story to the specified label.",
        vec![row("jump to label: %1", vec![input("LABEL_NAME", "start")])],
    )
}

fn next() -> BlockDefinition {
    statement_block(
        BlockKind::Next,
        45,
        "Creates a checkpoint or autosave.",
        vec![row("next: %1", vec![input("LABEL_NAME", "start")])],
    )
}

fn finish() -> BlockDefinition {
    statement_block(
        BlockKind::Finish,
        45,
        "Quits the current conversation.",
        vec![row("finish story", vec![])],
    )
}

fn say() -> BlockDefinition {
    statement_block(
        BlockKind::Say,
        210,
        "Displays text in the dialogue box.",
        vec![row(
            "character %1 says %2",
            vec![character_var("CHAR_VAR"), dialogue("DIALOGUE", "Hello there!")],
        )],
    )
}

fn speak() -> BlockDefinition {
    statement_block(
        BlockKind::Speak,
        210,
        "Displays dialogue and plays a voice audio file at the same time.",
        vec![row(
            "character %1 speaks %2 with voice %3",
            vec![
                character_var("CHAR_VAR"),
                dialogue("DIALOGUE", "Hello there!"),
                input("VOICE_FILE", "monika_happy.ogg"),
            ],
        )],
    )
}

fn sound_effect() -> BlockDefinition {
    statement_block(
        BlockKind::SoundEffect,
        210,
        "Plays a sound effect. Does not loop.",
        vec![row(
            "play sound effect %1",
            vec![input("SOUND_FILE", "door_creak.ogg")],
        )],
    )
}

fn show(lookup: &LookupData) -> BlockDefinition {
    let mut sprites = Vec::new();
    for (_, id) in &lookup.characters {
        for option in lookup.sprite_options(id) {
            if option.1 != ERROR_SENTINEL && !sprites.contains(&option) {
                sprites.push(option);
            }
        }
    }
    if sprites.is_empty() {
        sprites = lookup.sprite_options("");
    }
    statement_block(
        BlockKind::Show,
        160,
        "Shows a character's sprite on the screen at the center, left, or right position.",
        vec![row(
            "show character %1 with sprite %2 at %3",
            vec![
                character_var("CHAR_VAR"),
                dropdown_owned("SPRITE_NAME", sprites),
                dropdown("POSITION", POSITIONS),
            ],
        )],
    )
}

fn show_custom() -> BlockDefinition {
    statement_block(
        BlockKind::ShowCustom,
        160,
        "Shows a sprite with custom scaling and position, configured via an interactive editor.",
        vec![row(
            "show custom %1 sprite %2 %3",
            vec![
                character_var("CHAR_VAR"),
                input("SPRITE_NAME", "happy"),
                Arg::Field(FieldSpec {
                    name: "PLACEMENT_DATA",
                    kind: FieldKind::Placement {
                        default: Placement::default(),
                    },
                }),
            ],
        )],
    )
}

fn show_full() -> BlockDefinition {
    statement_block(
        BlockKind::ShowFull,
        160,
        "Shows a fullscreen image from the 'images' folder (e.g., a background).",
        vec![row(
            "show fullscreen image %1",
            vec![input("IMAGE_NAME", "bg_forest.png")],
        )],
    )
}

fn remove() -> BlockDefinition {
    statement_block(
        BlockKind::Remove,
        160,
        "Hides a character's sprite from the screen.",
        vec![row("remove character %1", vec![character_var("CHAR_VAR")])],
    )
}

fn remove_sprite() -> BlockDefinition {
    statement_block(
        BlockKind::RemoveSprite,
        160,
        "Hides any sprite from the screen using its string name/tag.",
        vec![row(
            "remove sprite named %1",
            vec![input("SPRITE_NAME", "my_cg_image")],
        )],
    )
}

fn set_variable() -> BlockDefinition {
    statement_block(
        BlockKind::SetVariable,
        30,
        "Sets a variable to a value. Can be a number (e.g., 50), text (e.g., \"happy\"), or boolean (e.g., True).",
        vec![row(
            "set %1 variable %2 to %3",
            vec![
                dropdown("SCOPE", SCOPES),
                input("VAR_NAME", "moni_aff"),
                input("VALUE", "0"),
            ],
        )],
    )
}

fn modify_variable() -> BlockDefinition {
    statement_block(
        BlockKind::ModifyVariable,
        30,
        "Sets, adds to, or subtracts from a local or global variable.",
        vec![row(
            "%1 %2 variable %3 to %4",
            vec![
                dropdown(
                    "OPERATION",
                    &[("set", "mod"), ("add", "add"), ("subtract", "sub")],
                ),
                dropdown("SCOPE", SCOPES),
                input("VAR_NAME", "moni_aff"),
                input("VALUE", "5"),
            ],
        )],
    )
}

fn choice() -> BlockDefinition {
    statement_block(
        BlockKind::Choice,
        260,
        "Presents up to 4 choices to the player. Each choice must have text and a target label.",
        vec![
            row("Show Choices", vec![]),
            row(
                "1: %1 goes to label %2",
                vec![input("TEXT1", "You are Monika"), input("LABEL1", "knows_monika")],
            ),
            row(
                "2: %1 goes to label %2",
                vec![
                    input("TEXT2", "You are Moni from MAS"),
                    input("LABEL2", "really_knows_monika"),
                ],
            ),
            row(
                "3: %1 goes to label %2",
                vec![
                    input("TEXT3", "I don't know you"),
                    input("LABEL3", "do_not_know_monika"),
                ],
            ),
            row(
                "4: %1 goes to label %2",
                vec![input("TEXT4", ""), input("LABEL4", "")],
            ),
        ],
    )
}

fn choice_menu() -> BlockDefinition {
    statement_block(
        BlockKind::ChoiceMenu,
        260,
        "Presents every option stacked inside to the player.",
        vec![
            row("Show Choices", vec![]),
            row(
                "%1",
                vec![Arg::Statement {
                    name: "OPTIONS",
                    check: Connection::Check(OPTION_CHECK),
                }],
            ),
        ],
    )
}

fn choice_option() -> BlockDefinition {
    BlockDefinition {
        kind: BlockKind::ChoiceOption,
        rows: vec![row(
            "Option: %1 Jump to: %2",
            vec![input("TEXT", "Yes, I agree"), input("LABEL", "label_yes")],
        )],
        previous: Connection::Check(OPTION_CHECK),
        next: Connection::Check(OPTION_CHECK),
        colour: 230,
        tooltip: "A single choice option.",
    }
}

fn conditional() -> BlockDefinition {
    statement_block(
        BlockKind::Conditional,
        195,
        "Runs the blocks inside only if the condition is true.",
        vec![
            row(
                "if %1 variable %2 %3 %4",
                vec![
                    dropdown("SCOPE", &[("global", "Global"), ("local", "")]),
                    input("VAR_NAME", "moni_aff"),
                    dropdown(
                        "OPERATOR",
                        &[
                            ("is equal to", "Same"),
                            ("is not equal to", "NotSame"),
                            ("is greater than", "MoreThan"),
                            ("is less than", "LessThan"),
                        ],
                    ),
                    input("VALUE", "5"),
                ],
            ),
            row("then do: %1", vec![statements("ACTIONS")]),
        ],
    )
}

fn conditional_time() -> BlockDefinition {
    statement_block(
        BlockKind::ConditionalTime,
        195,
        "Runs the blocks inside only if it is currently day or night.",
        vec![
            row(
                "if it is %1",
                vec![dropdown("TIME", &[("day", "Day"), ("night", "Night")])],
            ),
            row("then do: %1", vec![statements("ACTIONS")]),
        ],
    )
}

fn idle_chats() -> BlockDefinition {
    statement_block(
        BlockKind::IdleChats,
        345,
        "Starts the system for showing random idle chats.",
        vec![row("trigger idle chats", vec![])],
    )
}

fn unlock_dialogue() -> BlockDefinition {
    statement_block(
        BlockKind::UnlockDialogue,
        345,
        "Unlocks one or more dialogue events, separated by commas.",
        vec![row(
            "unlock dialogue events: %1",
            vec![input("EVENTS_LIST", "event_1, event_2")],
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BlockNode, TopBlock, Variable, VariableTable};

    #[test]
    fn every_kind_round_trips_its_type_name() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_type_name(kind.type_name()), Some(kind));
            assert_eq!(kind.definition().kind, kind);
        }
        assert_eq!(BlockKind::from_type_name("story_setup"), None);
    }

    #[test]
    fn dynamic_character_dropdown_uses_roster_or_sentinel() {
        let empty = BlockKind::DefineCharacter.definition();
        let Some(FieldKind::Dropdown { options }) = empty.field("CHAR_ID").map(|f| &f.kind) else {
            panic!("CHAR_ID should be a dropdown");
        };
        assert_eq!(options[0].1, ERROR_SENTINEL);

        let lookup = LookupData {
            characters: vec![("Monika".to_string(), "monika".to_string())],
            ..LookupData::default()
        };
        let json = BlockKind::DefineCharacter.schema().build(&lookup).to_json();
        assert_eq!(json["args0"][1]["options"][0], json!(["Monika", "monika"]));
        assert_eq!(json["previousStatement"], Value::Null);
    }

    #[test]
    fn choice_options_only_stack_inside_menus() {
        let menu = BlockKind::ChoiceMenu.definition();
        let options_check = menu.slot_check("OPTIONS").unwrap();
        assert!(can_connect(options_check, BlockKind::ChoiceOption));
        assert!(!can_connect(options_check, BlockKind::Say));
        assert!(!can_connect(Connection::Any, BlockKind::ChoiceOption));
        assert!(can_connect(Connection::Any, BlockKind::Conditional));

        let json = menu.to_json();
        assert_eq!(json["args1"][0]["check"], json!(OPTION_CHECK));
    }

    #[test]
    fn definitions_json_lists_every_kind() {
        let json = definitions_json(&LookupData::default());
        assert_eq!(json.as_array().unwrap().len(), BlockKind::ALL.len());
        let say = &json[6];
        assert_eq!(say["type"], json!("vn_say"));
        assert_eq!(say["args0"][0]["variableTypes"], json!(["Character"]));
        assert_eq!(say["args0"][1]["type"], json!("field_cute_modal"));
    }

    #[test]
    fn defaults_cover_non_variable_fields() {
        let fields = BlockKind::ShowCustom.definition().default_fields();
        assert!(!fields.contains_key("CHAR_VAR"));
        assert_eq!(fields["SPRITE_NAME"], FieldValue::Text("happy".to_string()));
        assert!(matches!(fields["PLACEMENT_DATA"], FieldValue::Json(_)));
    }

    #[test]
    fn sprite_choices_follow_the_bound_character() {
        let workspace = Workspace {
            top_blocks: vec![TopBlock {
                x: 0,
                y: 0,
                blocks: vec![BlockNode::new("d1", "define_character")
                    .with_text("VAR_NAME", "M")
                    .with_choice("CHAR_ID", "monika")],
            }],
            variables: VariableTable::new(vec![Variable {
                id: "v1".to_string(),
                name: "m".to_string(),
                var_type: CHARACTER_VAR_TYPE.to_string(),
            }]),
        };
        let mut lookup = LookupData::default();
        lookup
            .sprites
            .insert("monika".to_string(), vec!["happy.png".to_string()]);
        assert_eq!(
            sprite_choices_for(&workspace, "v1", &lookup),
            vec![("happy".to_string(), "happy.png".to_string())]
        );
        assert_eq!(sprite_choices_for(&workspace, "nope", &lookup)[0].1, ERROR_SENTINEL);
    }
}
