use super::entry::requested_node;
use super::*;

impl DialogueRunner {
    /// Undoes the last recorded transition. Conversation flags are restored
    /// to exactly what they were before it; game flags are left alone and no
    /// actions run. Does nothing when there is no history.
    pub async fn back(&mut self) -> Result<DialogueView, DialogueError> {
        let dialogue = self.loaded_dialogue("back")?;
        let Some(entry) = self.history.pop() else {
            debug!(dialogue = %dialogue.id, "back() with empty history");
            return self.view();
        };

        debug!(dialogue = %dialogue.id, node = %entry.node_id, "stepping back");
        self.conversation_flags.replace_all(entry.conversation_flags);
        let rendered = self.render_node(&entry.node_id, &entry.node).await;
        self.ended = entry.node.is_end;
        self.current = Some(rendered.clone());
        self.events
            .dispatch(&DialogueEvent::NodeEntered { node: rendered })?;
        self.view()
    }

    /// Moves straight to `node_id`, recording the current node in history.
    /// Node actions and auto-advance are skipped.
    pub async fn jump_to(&mut self, node_id: &str) -> Result<DialogueView, DialogueError> {
        let dialogue = self.loaded_dialogue("jump_to")?;
        let target = requested_node(&dialogue, node_id)?.clone();

        if let Some(current) = self.current.clone() {
            let flags_before = self.conversation_flags.read_all();
            self.events.dispatch(&DialogueEvent::NodeExited {
                node_id: current.id.clone(),
            })?;
            self.history.push(HistoryEntry {
                node_id: current.id,
                node: current.node,
                choice_index: None,
                choice: None,
                timestamp: now_millis(),
                conversation_flags: flags_before,
            });
        }

        debug!(dialogue = %dialogue.id, node = %node_id, "jumping to node");
        let rendered = self.render_node(node_id, &target).await;
        self.ended = target.is_end;
        self.current = Some(rendered.clone());
        self.events
            .dispatch(&DialogueEvent::NodeEntered { node: rendered })?;
        self.view()
    }
}
