use super::*;

impl DialogueRunner {
    /// Enters `node_id` and follows `next` links until the runner reaches a
    /// node that needs input, ends the dialogue, or has nowhere to go.
    ///
    /// Hops taken along the way are not recorded in history.
    pub(super) async fn enter_node(&mut self, node_id: &str) -> Result<(), DialogueError> {
        let dialogue = self.loaded_dialogue("enter")?;
        let mut node_id = node_id.to_string();
        let mut hops = 0usize;

        loop {
            let node = lookup_node(&dialogue, &node_id)?.clone();
            self.ended = false;
            let rendered = self.render_node(&node_id, &node).await;
            self.current = Some(rendered.clone());
            debug!(dialogue = %dialogue.id, node = %node_id, "entered node");

            execute_actions(&node.actions, &self.action_scope(&dialogue.id, &node_id)).await?;
            self.events
                .dispatch(&DialogueEvent::NodeEntered { node: rendered })?;

            if node.is_end {
                self.ended = true;
                debug!(dialogue = %dialogue.id, node = %node_id, "dialogue ended");
                self.events.dispatch(&DialogueEvent::DialogueEnded {
                    dialogue_id: dialogue.id.clone(),
                    node_id: node_id.clone(),
                })?;
                return Ok(());
            }
            if !node.choices.is_empty() {
                return Ok(());
            }
            let Some(next) = node.next else {
                debug!(dialogue = %dialogue.id, node = %node_id, "node has no exits");
                return Ok(());
            };

            hops += 1;
            if let Some(limit) = self.max_auto_advance {
                if hops > limit {
                    return Err(DialogueError::structure(
                        "RUNNER_AUTO_ADVANCE_LIMIT",
                        format!(
                            "Auto-advance exceeded {} hops at node \"{}\".",
                            limit, node_id
                        ),
                    ));
                }
            }
            self.events.dispatch(&DialogueEvent::NodeExited {
                node_id: node_id.clone(),
            })?;
            node_id = next;
        }
    }

    /// Resolves the speaker and text of `node` against the current flags.
    pub(super) async fn render_node(&self, node_id: &str, node: &NodeDefinition) -> CurrentNode {
        let speaker = node
            .speaker
            .as_ref()
            .and_then(|speaker_id| self.speakers.get(speaker_id))
            .cloned();

        let template = match (&node.text_key, &self.i18n) {
            (Some(key), Some(i18n)) => {
                let mut params = BTreeMap::new();
                params.insert(
                    SPEAKER_TOKEN.to_string(),
                    speaker
                        .as_ref()
                        .map(|speaker| speaker.name.clone())
                        .unwrap_or_default(),
                );
                i18n.t(key, &params)
            }
            _ => node.text.clone(),
        };

        let context = InterpolationContext {
            node_id: node_id.to_string(),
            node: node.clone(),
            speaker: speaker.clone(),
            game_flags: self.game_flags.read_all(),
            conversation_flags: self.conversation_flags.read_all(),
        };
        let text = interpolate(&template, &context, &self.interpolation_functions).await;

        CurrentNode {
            id: node_id.to_string(),
            text,
            speaker,
            node: node.clone(),
        }
    }

    pub(super) fn action_scope<'a>(
        &'a self,
        dialogue_id: &'a str,
        node_id: &'a str,
    ) -> ActionScope<'a> {
        ActionScope {
            dialogue_id,
            node_id,
            game_flags: &self.game_flags,
            conversation_flags: &self.conversation_flags,
            handlers: &self.action_handlers,
            events: &self.events,
        }
    }
}

/// Looks up a node reached by following content. Missing targets are
/// structural faults of the dialogue, not caller errors.
pub(super) fn lookup_node<'d>(
    dialogue: &'d DialogueDefinition,
    node_id: &str,
) -> Result<&'d NodeDefinition, DialogueError> {
    if is_reserved_key(node_id) {
        return Err(DialogueError::structure(
            "DIALOGUE_NODE_NOT_FOUND",
            format!("Node id \"{}\" is reserved.", node_id),
        ));
    }
    dialogue.node(node_id).ok_or_else(|| {
        DialogueError::structure(
            "DIALOGUE_NODE_NOT_FOUND",
            format!(
                "Node \"{}\" does not exist in dialogue \"{}\".",
                node_id, dialogue.id
            ),
        )
    })
}

/// Looks up a node named by the caller.
pub(super) fn requested_node<'d>(
    dialogue: &'d DialogueDefinition,
    node_id: &str,
) -> Result<&'d NodeDefinition, DialogueError> {
    if is_reserved_key(node_id) {
        return Err(DialogueError::validation(
            "RUNNER_NODE_RESERVED",
            format!("Node id \"{}\" is reserved.", node_id),
        ));
    }
    dialogue.node(node_id).ok_or_else(|| {
        DialogueError::validation(
            "RUNNER_NODE_UNKNOWN",
            format!(
                "Node \"{}\" does not exist in dialogue \"{}\".",
                node_id, dialogue.id
            ),
        )
    })
}
