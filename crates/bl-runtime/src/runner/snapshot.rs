use super::entry::requested_node;
use super::*;

impl DialogueRunner {
    /// Captures position, history and conversation flags. Game flags belong
    /// to the host and are never included.
    pub fn serialize(&self) -> Result<SerializedState, DialogueError> {
        let dialogue = self.loaded_dialogue("serialize")?;
        let Some(current) = &self.current else {
            return Err(DialogueError::validation(
                "RUNNER_IDLE",
                "serialize() requires a current node.",
            ));
        };

        Ok(SerializedState {
            dialogue_id: dialogue.id.clone(),
            current_node_id: current.id.clone(),
            history: self.history.clone(),
            conversation_flags: self.conversation_flags.read_all(),
        })
    }

    /// Restores a state captured by [`serialize`](Self::serialize) onto the
    /// loaded dialogue. Everything is checked before anything is replaced,
    /// including that every history entry names a node of this dialogue.
    pub async fn deserialize(
        &mut self,
        state: SerializedState,
    ) -> Result<DialogueView, DialogueError> {
        let dialogue = self.loaded_dialogue("deserialize")?;
        if state.dialogue_id != dialogue.id {
            warn!(
                loaded = %dialogue.id,
                saved = %state.dialogue_id,
                "restoring state saved from a different dialogue"
            );
        }

        let node = requested_node(&dialogue, &state.current_node_id)?.clone();
        for entry in &state.history {
            if is_reserved_key(&entry.node_id) {
                return Err(DialogueError::validation(
                    "RUNNER_STATE_NODE_RESERVED",
                    format!("History entry node id \"{}\" is reserved.", entry.node_id),
                ));
            }
            if dialogue.node(&entry.node_id).is_none() {
                return Err(DialogueError::validation(
                    "RUNNER_STATE_NODE_UNKNOWN",
                    format!(
                        "History entry node \"{}\" does not exist in dialogue \"{}\".",
                        entry.node_id, dialogue.id
                    ),
                ));
            }
            check_flag_keys(&entry.conversation_flags)?;
        }
        check_flag_keys(&state.conversation_flags)?;

        debug!(
            dialogue = %dialogue.id,
            node = %state.current_node_id,
            history = state.history.len(),
            "restoring state"
        );
        self.history = state.history;
        self.conversation_flags.replace_all(state.conversation_flags);
        let rendered = self.render_node(&state.current_node_id, &node).await;
        self.ended = node.is_end;
        self.current = Some(rendered.clone());
        self.events
            .dispatch(&DialogueEvent::NodeEntered { node: rendered })?;
        self.view()
    }

    /// Loads `dialogue` and restores `state` onto it in one step, without
    /// entering the start node. A state rejected by validation leaves the
    /// previous dialogue loaded.
    pub async fn resume(
        &mut self,
        dialogue: impl Into<Arc<DialogueDefinition>>,
        state: SerializedState,
    ) -> Result<DialogueView, DialogueError> {
        let dialogue = dialogue.into();
        super::lifecycle::check_dialogue_ids(&dialogue)?;

        let previous = self.dialogue.replace(dialogue);
        let result = self.deserialize(state).await;
        if matches!(&result, Err(error) if error.is_validation()) {
            self.dialogue = previous;
        }
        result
    }
}

fn check_flag_keys(flags: &FlagMap) -> Result<(), DialogueError> {
    match flags.keys().find(|key| is_reserved_key(key)) {
        Some(key) => Err(DialogueError::validation(
            "RUNNER_STATE_FLAG_RESERVED",
            format!("Conversation flag key \"{}\" is reserved.", key),
        )),
        None => Ok(()),
    }
}
