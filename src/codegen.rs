use crate::ast::{BlockNode, FieldValue, Placement, TopBlock, VariableTable, Workspace};
use crate::blocks::BlockKind;
use crate::context::{indent, GenContext};
use crate::lookup::ERROR_SENTINEL;
use crate::parser::{parse_literal, parse_string_literal, Literal};
use crate::sanitize::{quote_literal, quote_literal_with, render_value, sanitize_identifier, strip_label, Quote};

const NESTED_MARKER: &str = "nested=True";
const CHOICE_SLOTS: usize = 4;

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Name bound to a container's action list at the top level.
    pub actions_variable: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            actions_variable: "actions_list".to_string(),
        }
    }
}

/// One emitted statement or aggregate element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Code(String),
    /// Inert diagnostic, rendered as `# text`.
    Comment(String),
}

impl Stmt {
    fn render(&self) -> String {
        match self {
            Stmt::Code(code) => code.clone(),
            Stmt::Comment(text) => format!("# {}", text.replace(['\n', '\r'], " ")),
        }
    }
}

/// Output of one rule. Empty fragments contribute nothing, not even a blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub stmts: Vec<Stmt>,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self {
            stmts: vec![Stmt::Code(code.into())],
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            stmts: vec![Stmt::Comment(text.into())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn has_code(&self) -> bool {
        self.stmts.iter().any(|s| matches!(s, Stmt::Code(_)))
    }

    pub fn append(&mut self, other: Fragment) {
        self.stmts.extend(other.stmts);
    }

    /// Top-level rendering: one statement per line, each `\n` terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for stmt in &self.stmts {
            out.push_str(&stmt.render());
            out.push('\n');
        }
        out
    }
}

/// Renders `items` as a bracketed literal. A lone code element stays inline;
/// anything else goes one element per line at `depth`, closing one level out.
/// Commas separate code elements only, and never trail.
pub fn assemble_aggregate(open: &str, close: &str, items: &[Stmt], depth: usize) -> String {
    match items {
        [] => return format!("{}{}", open, close),
        [Stmt::Code(only)] => return format!("{}{}{}", open, only, close),
        _ => {}
    }
    let padding = indent(depth);
    let mut remaining = items.iter().filter(|s| matches!(s, Stmt::Code(_))).count();
    let mut out = format!("{}\n", open);
    for item in items {
        out.push_str(&padding);
        out.push_str(&item.render());
        if let Stmt::Code(_) = item {
            remaining -= 1;
            if remaining > 0 {
                out.push(',');
            }
        }
        out.push('\n');
    }
    out.push_str(&indent(depth.saturating_sub(1)));
    out.push_str(close);
    out
}

pub fn generate_workspace(workspace: &Workspace) -> String {
    generate_workspace_with_options(workspace, &CodegenOptions::default())
}

pub fn generate_workspace_with_options(workspace: &Workspace, options: &CodegenOptions) -> String {
    let builder = ScriptBuilder::new(&workspace.variables, options);
    let mut stacks = workspace.top_blocks.iter().collect::<Vec<_>>();
    stacks.sort_by(|a, b| stack_sort_key(a).cmp(&stack_sort_key(b)));
    let mut out = String::new();
    for stack in stacks {
        let fragment = builder.generate_sequence(&stack.blocks, GenContext::top_level());
        out.push_str(&fragment.render());
    }
    out
}

fn stack_sort_key(stack: &TopBlock) -> (i64, i64, String) {
    let id = stack.blocks.first().map(|b| b.id.clone()).unwrap_or_default();
    (stack.y, stack.x, id)
}

/// Walks block trees and applies one generation rule per block kind.
pub struct ScriptBuilder<'a> {
    variables: &'a VariableTable,
    options: &'a CodegenOptions,
}

impl<'a> ScriptBuilder<'a> {
    pub fn new(variables: &'a VariableTable, options: &'a CodegenOptions) -> Self {
        Self { variables, options }
    }

    pub fn generate_sequence(&self, nodes: &[BlockNode], ctx: GenContext) -> Fragment {
        let mut out = Fragment::empty();
        for node in nodes {
            out.append(self.generate_block(node, ctx));
        }
        out
    }

    pub fn generate_block(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        let Some(kind) = BlockKind::from_type_name(&node.kind) else {
            tracing::debug!("unsupported block '{}' ({})", node.kind, node.id);
            return Fragment::comment(format!("unsupported block: {}", node.kind));
        };
        match kind {
            BlockKind::DefineCharacter => self.emit_define_character(node, ctx),
            BlockKind::SceneSetup => self.emit_scene(node, ctx),
            BlockKind::Label => self.emit_label_call(node, ctx, "label"),
            BlockKind::Jump => self.emit_label_call(node, ctx, "jumpTo"),
            BlockKind::Next => self.emit_label_call(node, ctx, "next"),
            BlockKind::Finish => call(ctx, "finish", Vec::new()),
            BlockKind::Say => self.emit_say(node, ctx),
            BlockKind::Speak => self.emit_speak(node, ctx),
            BlockKind::SoundEffect => emit_single_text_call(node, ctx, "SOUND_FILE", "voice_effect"),
            BlockKind::Show => self.emit_show(node, ctx),
            BlockKind::ShowCustom => self.emit_show_custom(node, ctx),
            BlockKind::ShowFull => emit_show_full(node, ctx),
            BlockKind::Remove => match self.character_ref(node) {
                Ok(character) => call(ctx, "remove", vec![character]),
                Err(reason) => Fragment::comment(reason),
            },
            BlockKind::RemoveSprite => emit_single_text_call(node, ctx, "SPRITE_NAME", "remove"),
            BlockKind::SetVariable => emit_set_variable(node, ctx),
            BlockKind::ModifyVariable => emit_modify_variable(node, ctx),
            BlockKind::Choice => emit_choice(inline_choice_entries(node), ctx),
            BlockKind::ChoiceMenu => emit_choice(menu_choice_entries(node), ctx),
            // Only meaningful inside a menu, which reads it directly.
            BlockKind::ChoiceOption => Fragment::empty(),
            BlockKind::Conditional => self.emit_conditional(node, ctx),
            BlockKind::ConditionalTime => self.emit_conditional_time(node, ctx),
            BlockKind::IdleChats => call(ctx, "idle_chats", Vec::new()),
            BlockKind::UnlockDialogue => emit_unlock_dialogue(node, ctx),
        }
    }

    /// Resolves a character field to an identifier, or the reason it can't be.
    fn character_ref(&self, node: &BlockNode) -> Result<String, String> {
        match node.field("CHAR_VAR") {
            Some(FieldValue::Variable { id }) => match self.variables.name_of(id) {
                Some(name) => Ok(sanitize_identifier(name)),
                None => Err(format!("{}: character variable '{}' no longer exists", node.kind, id)),
            },
            Some(value) => {
                let text = value.as_text().unwrap_or_default();
                let text = text.trim();
                if text.is_empty() || text == ERROR_SENTINEL {
                    Err(format!("{}: no character selected", node.kind))
                } else {
                    Ok(sanitize_identifier(text))
                }
            }
            None => Err(format!("{}: no character selected", node.kind)),
        }
    }

    fn emit_define_character(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        let var_name = sanitize_identifier(node.text("VAR_NAME").trim());
        let char_id = node.text("CHAR_ID");
        if ctx.nested {
            return Fragment::comment(format!(
                "define_character '{}' has no effect inside a conditional",
                var_name
            ));
        }
        if char_id.is_empty() || char_id == ERROR_SENTINEL {
            tracing::debug!("define_character {} has no character id", node.id);
            return Fragment::comment("could not define character: no character available");
        }
        Fragment::code(format!(
            "{} = Character.from_id({})",
            var_name,
            quote_literal(&char_id)
        ))
    }

    fn emit_scene(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        let body = self.generate_sequence(node.slot("STATEMENTS"), ctx);
        if body.is_empty() {
            return Fragment::empty();
        }
        let name = strip_label(&node.text("SCENE_NAME"));
        let mut out = if name.is_empty() {
            Fragment::comment("scene without a label")
        } else {
            call(ctx, "label", vec![quote_literal(&name)])
        };
        out.append(body);
        out.append(call(ctx, "finish", Vec::new()));
        out
    }

    fn emit_label_call(&self, node: &BlockNode, ctx: GenContext, function: &str) -> Fragment {
        let name = strip_label(&node.text("LABEL_NAME"));
        if name.is_empty() {
            return Fragment::empty();
        }
        call(ctx, function, vec![quote_literal(&name)])
    }

    fn emit_say(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        match self.character_ref(node) {
            Ok(character) => call(
                ctx,
                "say",
                vec![character, quote_literal(&node.text("DIALOGUE"))],
            ),
            Err(reason) => Fragment::comment(reason),
        }
    }

    fn emit_speak(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        match self.character_ref(node) {
            Ok(character) => call(
                ctx,
                "speak",
                vec![
                    character,
                    quote_literal(&node.text("DIALOGUE")),
                    format!("voice={}", quote_literal(node.text("VOICE_FILE").trim())),
                ],
            ),
            Err(reason) => Fragment::comment(reason),
        }
    }

    fn emit_show(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        let sprite = node.text("SPRITE_NAME");
        if sprite.is_empty() || sprite == ERROR_SENTINEL {
            return Fragment::comment("vn_show: no sprite available");
        }
        let function = match node.text("POSITION").as_str() {
            "show_left" => "show_left",
            "show_right" => "show_right",
            _ => "show",
        };
        match self.character_ref(node) {
            Ok(character) => call(ctx, function, vec![character, quote_literal(&sprite)]),
            Err(reason) => Fragment::comment(reason),
        }
    }

    fn emit_show_custom(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        let character = match self.character_ref(node) {
            Ok(character) => character,
            Err(reason) => return Fragment::comment(reason),
        };
        let Some(placement) = Placement::from_field(&node.text("PLACEMENT_DATA")) else {
            tracing::debug!("vn_show_custom {} has unreadable placement data", node.id);
            return Fragment::comment("vn_show_custom: invalid placement data");
        };
        let mut args = vec![character, quote_literal(&node.text("SPRITE_NAME"))];
        args.extend(placement_args(&placement));
        call(ctx, "show_custom", args)
    }

    fn emit_conditional(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        let scope = match node.text("SCOPE").as_str() {
            "Global" => "Global",
            "" | "Var" => "",
            other => return Fragment::comment(format!("vn_conditional: unknown scope '{}'", other)),
        };
        let operator = node.text("OPERATOR");
        if !matches!(operator.as_str(), "Same" | "NotSame" | "MoreThan" | "LessThan") {
            return Fragment::comment(format!("vn_conditional: unknown operator '{}'", operator));
        }
        let var_name = node.text("VAR_NAME");
        let var_name = var_name.trim();
        if var_name.is_empty() {
            return Fragment::comment("vn_conditional: variable name is blank");
        }
        self.emit_container(
            node,
            ctx,
            &format!("cond{}{}", operator, scope),
            vec![quote_literal(var_name), render_value(&node.text("VALUE"))],
        )
    }

    fn emit_conditional_time(&self, node: &BlockNode, ctx: GenContext) -> Fragment {
        let time = node.text("TIME");
        if !matches!(time.as_str(), "Day" | "Night") {
            return Fragment::comment(format!("vn_conditional_time: unknown time '{}'", time));
        }
        self.emit_container(node, ctx, &format!("cond{}", time), Vec::new())
    }

    fn emit_container(
        &self,
        node: &BlockNode,
        ctx: GenContext,
        function: &str,
        mut args: Vec<String>,
    ) -> Fragment {
        let (body, aggregate) = ctx.with_nested(true, |inner| {
            let body = self.generate_sequence(node.slot("ACTIONS"), inner);
            let aggregate = assemble_aggregate("[", "]", &body.stmts, inner.depth);
            (body, aggregate)
        });
        if body.is_empty() {
            return Fragment::empty();
        }
        if !body.has_code() {
            // Keep the diagnostics, drop the call that would run nothing.
            return body;
        }
        if ctx.nested {
            args.push(format!("actions={}", aggregate));
            args.push(NESTED_MARKER.to_string());
            return Fragment::code(format!("vn.{}({})", function, args.join(", ")));
        }
        let var = &self.options.actions_variable;
        args.push(format!("actions={}", var));
        Fragment {
            stmts: vec![
                Stmt::Code(format!("{} = {}", var, aggregate)),
                Stmt::Code(format!("vn.{}({})", function, args.join(", "))),
            ],
        }
    }
}

fn call(ctx: GenContext, function: &str, mut args: Vec<String>) -> Fragment {
    if ctx.nested {
        args.push(NESTED_MARKER.to_string());
    }
    Fragment::code(format!("vn.{}({})", function, args.join(", ")))
}

fn emit_single_text_call(node: &BlockNode, ctx: GenContext, field: &str, function: &str) -> Fragment {
    let text = node.text(field);
    let text = text.trim();
    if text.is_empty() {
        return Fragment::empty();
    }
    call(ctx, function, vec![quote_literal(text)])
}

fn emit_show_full(node: &BlockNode, ctx: GenContext) -> Fragment {
    let image = node.text("IMAGE_NAME");
    let image = image.trim();
    if image.is_empty() {
        return Fragment::empty();
    }
    let fullscreen = Placement {
        grid_width: 16,
        grid_height: 9,
        frame_width: 16,
        frame_height: 9,
        col: 1,
        row: 1,
    };
    let mut args = vec![quote_literal("images"), quote_literal(image)];
    args.extend(placement_args(&fullscreen));
    call(ctx, "show_custom", args)
}

fn placement_args(p: &Placement) -> Vec<String> {
    [p.grid_width, p.grid_height, p.frame_width, p.frame_height, p.col, p.row]
        .iter()
        .map(u32::to_string)
        .collect()
}

fn variable_scope(node: &BlockNode) -> Option<&'static str> {
    match node.text("SCOPE").as_str() {
        "Global" => Some("Global"),
        "Var" => Some("Var"),
        _ => None,
    }
}

fn emit_set_variable(node: &BlockNode, ctx: GenContext) -> Fragment {
    let Some(scope) = variable_scope(node) else {
        return Fragment::comment(format!("vn_set_variable: unknown scope '{}'", node.text("SCOPE")));
    };
    let var_name = node.text("VAR_NAME");
    if var_name.trim().is_empty() {
        return Fragment::empty();
    }
    call(
        ctx,
        &format!("set{}", scope),
        vec![quote_literal(var_name.trim()), render_value(&node.text("VALUE"))],
    )
}

fn emit_modify_variable(node: &BlockNode, ctx: GenContext) -> Fragment {
    let Some(scope) = variable_scope(node) else {
        return Fragment::comment(format!(
            "vn_modify_variable: unknown scope '{}'",
            node.text("SCOPE")
        ));
    };
    let operation = node.text("OPERATION");
    if !matches!(operation.as_str(), "mod" | "add" | "sub") {
        return Fragment::comment(format!("vn_modify_variable: unknown operation '{}'", operation));
    }
    let var_name = node.text("VAR_NAME");
    if var_name.trim().is_empty() {
        return Fragment::empty();
    }
    call(
        ctx,
        &format!("{}Var{}", operation, scope),
        vec![quote_literal(var_name.trim()), render_value(&node.text("VALUE"))],
    )
}

fn inline_choice_entries(node: &BlockNode) -> Vec<(String, String)> {
    (1..=CHOICE_SLOTS)
        .map(|i| (node.text(&format!("LABEL{}", i)), node.text(&format!("TEXT{}", i))))
        .collect()
}

fn menu_choice_entries(node: &BlockNode) -> Vec<(String, String)> {
    node.slot("OPTIONS")
        .iter()
        .filter(|option| {
            let is_option = option.kind == BlockKind::ChoiceOption.type_name();
            if !is_option {
                tracing::debug!("skipping '{}' inside choice menu {}", option.kind, node.id);
            }
            is_option
        })
        .map(|option| (option.text("LABEL"), option.text("TEXT")))
        .collect()
}

/// `entries` are `(label, text)`; blank halves drop the entry.
fn emit_choice(entries: Vec<(String, String)>, ctx: GenContext) -> Fragment {
    let items = entries
        .into_iter()
        .filter(|(label, text)| !label.trim().is_empty() && !text.trim().is_empty())
        .map(|(label, text)| {
            Stmt::Code(format!("{}: {}", quote_literal(label.trim()), quote_literal(&text)))
        })
        .collect::<Vec<_>>();
    if items.is_empty() {
        return Fragment::empty();
    }
    let mapping = assemble_aggregate("{", "}", &items, ctx.depth + 1);
    call(ctx, "choice", vec![mapping])
}

fn emit_unlock_dialogue(node: &BlockNode, ctx: GenContext) -> Fragment {
    let events = parse_event_list(&node.text("EVENTS_LIST"));
    if events.is_empty() {
        return Fragment::empty();
    }
    let items = events
        .iter()
        .map(|e| quote_literal_with(e, Quote::Single))
        .collect::<Vec<_>>();
    call(ctx, "unlock_dialogue", vec![format!("[{}]", items.join(", "))])
}

/// Accepts a list literal (`['a', 'b']`) or a comma separated list; blanks drop.
pub fn parse_event_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(Literal::List(items)) = parse_literal(trimmed) {
            return items
                .into_iter()
                .filter_map(|item| match item {
                    Literal::Str(s) | Literal::Name(s) | Literal::Number(s) => Some(s),
                    _ => None,
                })
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
    trimmed
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|piece| {
            let piece = piece.trim();
            parse_string_literal(piece)
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| piece.to_string())
        })
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Variable;

    fn table() -> VariableTable {
        VariableTable::new(vec![Variable {
            id: "v1".to_string(),
            name: "monika".to_string(),
            var_type: "Character".to_string(),
        }])
    }

    fn emit(node: &BlockNode) -> String {
        let variables = table();
        let options = CodegenOptions::default();
        ScriptBuilder::new(&variables, &options)
            .generate_block(node, GenContext::top_level())
            .render()
    }

    fn say(id: &str, text: &str) -> BlockNode {
        BlockNode::new(id, "vn_say")
            .with_variable("CHAR_VAR", "v1")
            .with_field("DIALOGUE", FieldValue::Text(text.to_string()))
    }

    #[test]
    fn aggregate_shapes() {
        assert_eq!(assemble_aggregate("[", "]", &[], 1), "[]");
        assert_eq!(
            assemble_aggregate("[", "]", &[Stmt::Code("a".into())], 1),
            "[a]"
        );
        let items = [
            Stmt::Code("a".into()),
            Stmt::Comment("skipped".into()),
            Stmt::Code("b".into()),
            Stmt::Comment("tail".into()),
        ];
        assert_eq!(
            assemble_aggregate("[", "]", &items, 2),
            "[\n        a,\n        # skipped\n        b\n        # tail\n    ]"
        );
    }

    #[test]
    fn say_resolves_variable_names() {
        assert_eq!(emit(&say("s", "Hello there!")), "vn.say(monika, \"Hello there!\")\n");
        let missing = BlockNode::new("s", "vn_say").with_variable("CHAR_VAR", "gone");
        assert!(emit(&missing).starts_with("# vn_say: character variable 'gone'"));
    }

    #[test]
    fn free_text_characters_are_sanitized() {
        let node = BlockNode::new("r", "vn_remove").with_text("CHAR_VAR", "Sayori Chan");
        assert_eq!(emit(&node), "vn.remove(sayori_chan)\n");
    }

    #[test]
    fn empty_conditional_emits_nothing() {
        let node = BlockNode::new("c", "vn_conditional")
            .with_choice("SCOPE", "Global")
            .with_text("VAR_NAME", "moni_aff")
            .with_choice("OPERATOR", "Same")
            .with_text("VALUE", "5");
        assert_eq!(emit(&node), "");
        assert_eq!(emit(&node.with_children("ACTIONS", Vec::new())), "");
    }

    #[test]
    fn nested_conditional_is_one_inline_call() {
        let inner = BlockNode::new("t", "vn_conditional_time")
            .with_choice("TIME", "Night")
            .with_children("ACTIONS", vec![say("a", "Late!"), BlockNode::new("i", "vn_idle_chats")]);
        let outer = BlockNode::new("c", "vn_conditional")
            .with_choice("SCOPE", "")
            .with_text("VAR_NAME", "met")
            .with_choice("OPERATOR", "NotSame")
            .with_text("VALUE", "True")
            .with_children("ACTIONS", vec![inner]);
        assert_eq!(
            emit(&outer),
            "actions_list = [vn.condNight(actions=[\n        vn.say(monika, \"Late!\", nested=True),\n        vn.idle_chats(nested=True)\n    ], nested=True)]\nvn.condNotSame(\"met\", True, actions=actions_list)\n"
        );
    }

    #[test]
    fn container_with_only_diagnostics_keeps_them() {
        let node = BlockNode::new("t", "vn_conditional_time")
            .with_choice("TIME", "Day")
            .with_children("ACTIONS", vec![BlockNode::new("x", "mystery")]);
        assert_eq!(emit(&node), "# unsupported block: mystery\n");
    }

    #[test]
    fn define_character_inside_condition_is_inert() {
        let define = BlockNode::new("d", "define_character")
            .with_text("VAR_NAME", "m")
            .with_choice("CHAR_ID", "monika");
        assert_eq!(emit(&define), "m = Character.from_id(\"monika\")\n");
        let node = BlockNode::new("t", "vn_conditional_time")
            .with_choice("TIME", "Day")
            .with_children("ACTIONS", vec![define, say("s", "Hi")]);
        assert_eq!(
            emit(&node),
            "actions_list = [\n    # define_character 'm' has no effect inside a conditional\n    vn.say(monika, \"Hi\", nested=True)\n]\nvn.condDay(actions=actions_list)\n"
        );
        let broken = BlockNode::new("d", "define_character")
            .with_text("VAR_NAME", "m")
            .with_choice("CHAR_ID", "error");
        assert!(emit(&broken).starts_with("# could not define character"));
    }

    #[test]
    fn choice_filters_blank_entries() {
        let mut node = BlockNode::new("c", "vn_choice");
        for i in 1..=4 {
            node = node
                .with_text(&format!("TEXT{}", i), "")
                .with_text(&format!("LABEL{}", i), "somewhere");
        }
        assert_eq!(emit(&node), "");
        let one = node.clone().with_text("TEXT2", "Stay");
        assert_eq!(emit(&one), "vn.choice({\"somewhere\": \"Stay\"})\n");
        let two = one.with_text("TEXT4", "Leave").with_text("LABEL4", "exit");
        assert_eq!(
            emit(&two),
            "vn.choice({\n    \"somewhere\": \"Stay\",\n    \"exit\": \"Leave\"\n})\n"
        );
    }

    #[test]
    fn choice_menu_reads_option_blocks() {
        let option = |id: &str, text: &str, label: &str| {
            BlockNode::new(id, "vn_choice_option")
                .with_text("TEXT", text)
                .with_text("LABEL", label)
        };
        let menu = BlockNode::new("m", "vn_choice_menu").with_children(
            "OPTIONS",
            vec![option("a", "Yes", "label_yes"), option("b", "", "label_no")],
        );
        assert_eq!(emit(&menu), "vn.choice({\"label_yes\": \"Yes\"})\n");
        assert_eq!(emit(&option("a", "Yes", "label_yes")), "");
        assert_eq!(emit(&BlockNode::new("m", "vn_choice_menu")), "");
    }

    #[test]
    fn scene_wraps_body_with_label_and_finish() {
        let scene = BlockNode::new("s", "vn_scene_setup")
            .with_text("SCENE_NAME", "the start!")
            .with_children("STATEMENTS", vec![say("a", "Welcome")]);
        assert_eq!(
            emit(&scene),
            "vn.label(\"thestart\")\nvn.say(monika, \"Welcome\")\nvn.finish()\n"
        );
        let empty = BlockNode::new("s", "vn_scene_setup").with_text("SCENE_NAME", "start");
        assert_eq!(emit(&empty), "");
    }

    #[test]
    fn variable_calls_pick_names_from_dropdowns() {
        let set = BlockNode::new("v", "vn_set_variable")
            .with_choice("SCOPE", "Var")
            .with_text("VAR_NAME", "mood")
            .with_text("VALUE", "happy");
        assert_eq!(emit(&set), "vn.setVar(\"mood\", \"happy\")\n");
        let padded = set.clone().with_choice("SCOPE", "Global").with_text("VALUE", "007");
        assert_eq!(emit(&padded), "vn.setGlobal(\"mood\", \"007\")\n");
        let modify = BlockNode::new("v", "vn_modify_variable")
            .with_choice("OPERATION", "sub")
            .with_choice("SCOPE", "Global")
            .with_text("VAR_NAME", "moni_aff")
            .with_text("VALUE", "2");
        assert_eq!(emit(&modify), "vn.subVarGlobal(\"moni_aff\", 2)\n");
    }

    #[test]
    fn sprite_calls() {
        let show = BlockNode::new("s", "vn_show")
            .with_variable("CHAR_VAR", "v1")
            .with_choice("SPRITE_NAME", "happy.png")
            .with_choice("POSITION", "show_left");
        assert_eq!(emit(&show), "vn.show_left(monika, \"happy.png\")\n");
        let broken = show.clone().with_choice("SPRITE_NAME", "error");
        assert_eq!(emit(&broken), "# vn_show: no sprite available\n");

        let custom = BlockNode::new("c", "vn_show_custom")
            .with_variable("CHAR_VAR", "v1")
            .with_text("SPRITE_NAME", "happy")
            .with_field("PLACEMENT_DATA", FieldValue::Json(Placement::default().to_field()));
        assert_eq!(emit(&custom), "vn.show_custom(monika, \"happy\", 16, 9, 4, 8, 7, 1)\n");
        let bad = custom.with_field("PLACEMENT_DATA", FieldValue::Json("{".to_string()));
        assert_eq!(emit(&bad), "# vn_show_custom: invalid placement data\n");

        let full = BlockNode::new("f", "vn_show_full").with_text("IMAGE_NAME", "bg.png");
        assert_eq!(
            emit(&full),
            "vn.show_custom(\"images\", \"bg.png\", 16, 9, 16, 9, 1, 1)\n"
        );
    }

    #[test]
    fn event_lists_accept_literals_and_plain_text() {
        assert_eq!(parse_event_list("event_1, , event_2"), vec!["event_1", "event_2"]);
        assert_eq!(parse_event_list("['a', \"b\", '']"), vec!["a", "b"]);
        assert_eq!(parse_event_list("'a', 'b'"), vec!["a", "b"]);
        assert!(parse_event_list(" , ").is_empty());
    }

    #[test]
    fn unknown_blocks_become_comments() {
        assert_eq!(emit(&BlockNode::new("x", "math_number")), "# unsupported block: math_number\n");
    }
}
