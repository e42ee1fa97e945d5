//! Mermaid diagram builder
//!
//! Turns a structured description (nodes and edges, participants and
//! messages, ...) into normalized Mermaid source. Pure string work.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static NON_WORD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid regex"));

/// Diagram family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Flowchart,
    Sequence,
    State,
    Class,
}

/// Flowchart direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum Direction {
    #[default]
    TB,
    TD,
    BT,
    LR,
    RL,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::TB => "TB",
            Self::TD => "TD",
            Self::BT => "BT",
            Self::LR => "LR",
            Self::RL => "RL",
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub shape: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub arrow: Option<String>,
}

/// Sequence participant, state, or any other labelled element
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Labelled {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SequenceMessage {
    pub from: String,
    pub to: String,
    pub label: String,
    #[serde(default)]
    pub arrow: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClassDef {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Full diagram description, as accepted by the `renderMermaid` tool
#[derive(Clone, Debug, Deserialize)]
pub struct Diagram {
    pub template: Template,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub participants: Vec<Labelled>,
    #[serde(default)]
    pub messages: Vec<SequenceMessage>,
    #[serde(default)]
    pub states: Vec<Labelled>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
}

/// Slugify a label into a Mermaid id, or use `fallback` when nothing is left
pub fn to_id(label: &str, fallback: &str) -> String {
    let slug = NON_WORD_RUN.replace_all(label.trim(), "_");
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug.into_owned()
    }
}

/// Make a label safe inside double quotes on one line
pub fn to_label(label: &str) -> String {
    label.replace('"', "\\\"").replace('\n', " ")
}

fn explicit_id(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.is_empty())
}

/// Declared id for a label, else the slugified raw endpoint
fn endpoint(ids: &HashMap<&str, String>, raw: &str) -> String {
    ids.get(raw).cloned().unwrap_or_else(|| to_id(raw, raw))
}

fn render_node(id: &str, label: &str, shape: Option<&str>) -> String {
    let text = format!("\"{}\"", to_label(label));
    match shape {
        Some("round") => format!("{id}({text})"),
        Some("stadium") => format!("{id}([{text}])"),
        Some("subroutine") => format!("{id}[[{text}]]"),
        Some("circle") => format!("{id}(({text}))"),
        Some("diamond") => format!("{id}{{{text}}}"),
        _ => format!("{id}[{text}]"),
    }
}

fn render_flowchart(diagram: &Diagram, lines: &mut Vec<String>) {
    lines.push(format!("flowchart {}", diagram.direction.unwrap_or_default().as_str()));

    let mut ids: HashMap<&str, String> = HashMap::new();
    for (i, node) in diagram.nodes.iter().enumerate() {
        let id = explicit_id(node.id.as_deref())
            .map_or_else(|| to_id(&node.label, &format!("N{}", i + 1)), String::from);
        lines.push(format!("  {}", render_node(&id, &node.label, node.shape.as_deref())));
        ids.insert(node.label.as_str(), id);
    }

    for edge in &diagram.edges {
        let from = endpoint(&ids, &edge.from);
        let to = endpoint(&ids, &edge.to);
        let arrow = edge.arrow.as_deref().filter(|a| !a.is_empty()).unwrap_or("-->");
        let label = edge
            .label
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(|l| format!("-- \"{}\" ", to_label(l)))
            .unwrap_or_default();
        lines.push(format!("  {from} {label}{arrow} {to}"));
    }
}

fn render_sequence(diagram: &Diagram, lines: &mut Vec<String>) {
    lines.push("sequenceDiagram".into());

    let mut ids: HashMap<&str, String> = HashMap::new();
    for (i, p) in diagram.participants.iter().enumerate() {
        let id = explicit_id(p.id.as_deref()).map_or_else(|| to_id(&p.label, &format!("P{}", i + 1)), String::from);
        lines.push(format!("  participant {id} as \"{}\"", to_label(&p.label)));
        ids.insert(p.label.as_str(), id);
    }

    for m in &diagram.messages {
        let arrow = m.arrow.as_deref().filter(|a| !a.is_empty()).unwrap_or("->>");
        lines.push(format!(
            "  {}{arrow}{}: {}",
            endpoint(&ids, &m.from),
            endpoint(&ids, &m.to),
            to_label(&m.label)
        ));
    }
}

fn render_state(diagram: &Diagram, lines: &mut Vec<String>) {
    lines.push("stateDiagram-v2".into());

    let mut ids: HashMap<&str, String> = HashMap::new();
    for (i, s) in diagram.states.iter().enumerate() {
        let id = explicit_id(s.id.as_deref()).map_or_else(|| to_id(&s.label, &format!("S{}", i + 1)), String::from);
        lines.push(format!("  state \"{}\" as {id}", to_label(&s.label)));
        ids.insert(s.label.as_str(), id);
    }

    for t in &diagram.transitions {
        let label = t
            .label
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(|l| format!(" : {}", to_label(l)))
            .unwrap_or_default();
        lines.push(format!("  {} --> {}{label}", endpoint(&ids, &t.from), endpoint(&ids, &t.to)));
    }
}

fn render_class(diagram: &Diagram, lines: &mut Vec<String>) {
    lines.push("classDiagram".into());

    for (i, c) in diagram.classes.iter().enumerate() {
        let id = explicit_id(c.id.as_deref()).map_or_else(|| to_id(&c.label, &format!("C{}", i + 1)), String::from);
        lines.push(format!("  class {id} {{"));
        lines.extend(c.fields.iter().map(|f| format!("    {f}")));
        lines.extend(c.methods.iter().map(|m| format!("    {m}()")));
        lines.push("  }".into());
        if !c.label.is_empty() && c.label != id {
            lines.push(format!("  {id} : {}", to_label(&c.label)));
        }
    }
}

/// Mermaid source, with the title as a leading `%%` comment
pub fn render(diagram: &Diagram) -> String {
    let mut lines = Vec::new();
    match diagram.template {
        Template::Flowchart => render_flowchart(diagram, &mut lines),
        Template::Sequence => render_sequence(diagram, &mut lines),
        Template::State => render_state(diagram, &mut lines),
        Template::Class => render_class(diagram, &mut lines),
    }

    let mut out = String::new();
    if let Some(title) = diagram.title.as_deref().filter(|t| !t.is_empty()) {
        out.push_str(&format!("%% {}\n", to_label(title)));
    }
    out.push_str(&lines.join("\n"));
    out
}

/// [`render`] wrapped in a fenced `mermaid` code block
pub fn render_block(diagram: &Diagram) -> String {
    format!("```mermaid\n{}\n```", render(diagram))
}
