use bl_core::DialogueView;

use crate::{BoundaryEvent, BoundaryResult};

pub(crate) fn boundary_from_view(view: &DialogueView) -> BoundaryResult {
    let event = if view.is_ended {
        BoundaryEvent::End
    } else if view.available_choices.is_empty() {
        BoundaryEvent::Stop
    } else {
        BoundaryEvent::Choices
    };
    let current = view.current_node.as_ref();

    BoundaryResult {
        event,
        node_id: current.map(|node| node.id.clone()),
        speaker: current
            .and_then(|node| node.speaker.as_ref())
            .map(|speaker| speaker.name.clone()),
        text: current.map(|node| node.text.clone()),
        choices: view
            .available_choices
            .iter()
            .enumerate()
            .map(|(index, choice)| (index, choice.text.clone()))
            .collect(),
    }
}

pub(crate) fn boundary_lines(boundary: &BoundaryResult, state_out: Option<&str>) -> Vec<String> {
    let mut lines = vec!["RESULT:OK".to_string()];
    lines.push(
        match boundary.event {
            BoundaryEvent::Choices => "EVENT:CHOICES",
            BoundaryEvent::Stop => "EVENT:STOP",
            BoundaryEvent::End => "EVENT:END",
        }
        .to_string(),
    );

    if let Some(node_id) = &boundary.node_id {
        lines.push(format!("NODE:{}", node_id));
    }
    if let Some(speaker) = &boundary.speaker {
        lines.push(format!("SPEAKER_JSON:{}", json_string(speaker)));
    }
    if let Some(text) = &boundary.text {
        lines.push(format!("TEXT_JSON:{}", json_string(text)));
    }
    for (index, text) in &boundary.choices {
        lines.push(format!("CHOICE:{}|{}", index, json_string(text)));
    }
    lines.push(format!("STATE_OUT:{}", state_out.unwrap_or("NONE")));
    lines
}

pub(crate) fn emit_boundary(boundary: &BoundaryResult, state_out: Option<&str>) {
    for line in boundary_lines(boundary, state_out) {
        println!("{}", line);
    }
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::to_string(value).expect("string json")
}
