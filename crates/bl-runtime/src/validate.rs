use std::collections::BTreeSet;

use bl_core::{is_reserved_key, DialogueDefinition, NodeDefinition};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl ValidationIssue {
    fn new(code: &str, message: impl Into<String>, node_id: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            node_id: node_id.map(ToString::to_string),
        }
    }
}

/// Result of a static check. `valid` is false whenever `errors` is non-empty;
/// warnings never affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn error_codes(&self) -> Vec<&str> {
        self.errors.iter().map(|issue| issue.code.as_str()).collect()
    }

    pub fn warning_codes(&self) -> Vec<&str> {
        self.warnings.iter().map(|issue| issue.code.as_str()).collect()
    }
}

pub fn validate_dialogue(dialogue: &DialogueDefinition) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for node_id in dialogue.nodes.keys() {
        if is_reserved_key(node_id) {
            errors.push(ValidationIssue::new(
                "DIALOGUE_NODE_RESERVED",
                format!("Node id \"{}\" is reserved.", node_id),
                Some(node_id),
            ));
        }
    }

    let start_known = if is_reserved_key(&dialogue.start_node) {
        errors.push(ValidationIssue::new(
            "DIALOGUE_START_RESERVED",
            format!("Start node \"{}\" is a reserved id.", dialogue.start_node),
            None,
        ));
        false
    } else if dialogue.node(&dialogue.start_node).is_none() {
        errors.push(ValidationIssue::new(
            "DIALOGUE_START_MISSING",
            format!(
                "Start node \"{}\" does not exist in dialogue \"{}\".",
                dialogue.start_node, dialogue.id
            ),
            None,
        ));
        false
    } else {
        true
    };

    for (node_id, node) in &dialogue.nodes {
        if let Some(next) = &node.next {
            if !has_target(dialogue, next) {
                errors.push(ValidationIssue::new(
                    "DIALOGUE_NEXT_MISSING",
                    format!("Node \"{}\" advances to missing node \"{}\".", node_id, next),
                    Some(node_id),
                ));
            }
            if !node.choices.is_empty() {
                warnings.push(ValidationIssue::new(
                    "DIALOGUE_NEXT_IGNORED",
                    format!(
                        "Node \"{}\" has choices, so its next \"{}\" is never followed.",
                        node_id, next
                    ),
                    Some(node_id),
                ));
            }
        }

        for (index, choice) in node.choices.iter().enumerate() {
            if !has_target(dialogue, &choice.next) {
                errors.push(ValidationIssue::new(
                    "DIALOGUE_CHOICE_TARGET_MISSING",
                    format!(
                        "Choice {} of node \"{}\" targets missing node \"{}\".",
                        index, node_id, choice.next
                    ),
                    Some(node_id),
                ));
            }
        }

        if node.is_end && (node.next.is_some() || !node.choices.is_empty()) {
            warnings.push(ValidationIssue::new(
                "DIALOGUE_END_HAS_EDGES",
                format!("End node \"{}\" declares outgoing edges.", node_id),
                Some(node_id),
            ));
        }
    }

    if start_known {
        let reachable = collect_reachable_nodes(dialogue);
        for node_id in dialogue.nodes.keys() {
            if !reachable.contains(node_id.as_str()) {
                errors.push(ValidationIssue::new(
                    "DIALOGUE_NODE_UNREACHABLE",
                    format!(
                        "Node \"{}\" cannot be reached from start node \"{}\".",
                        node_id, dialogue.start_node
                    ),
                    Some(node_id),
                ));
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn has_target(dialogue: &DialogueDefinition, node_id: &str) -> bool {
    !is_reserved_key(node_id) && dialogue.node(node_id).is_some()
}

fn outgoing_edges(node: &NodeDefinition) -> impl Iterator<Item = &str> {
    node.choices
        .iter()
        .map(|choice| choice.next.as_str())
        .chain(node.next.as_deref())
}

fn collect_reachable_nodes(dialogue: &DialogueDefinition) -> BTreeSet<&str> {
    let mut visited = BTreeSet::new();
    let mut stack = vec![dialogue.start_node.as_str()];

    while let Some(node_id) = stack.pop() {
        if !visited.insert(node_id) {
            continue;
        }
        if let Some(node) = dialogue.node(node_id) {
            for target in outgoing_edges(node) {
                stack.push(target);
            }
        }
    }

    visited
}
