use super::*;

impl DialogueRunner {
    /// Lists the current node's choices in authored order.
    ///
    /// Empty while idle or after the dialogue has ended. Each returned view
    /// carries the choice's raw position as `id`, which `choose_choice`
    /// accepts regardless of the query used here.
    pub fn get_choices(&self, query: ChoiceQuery<'_>) -> Result<Vec<ChoiceView>, DialogueError> {
        let Some(current) = &self.current else {
            return Ok(Vec::new());
        };
        if self.ended {
            return Ok(Vec::new());
        }

        let mut views = Vec::new();
        for (index, choice) in current.node.choices.iter().enumerate() {
            if let Some(filter) = query.filter {
                if !filter(choice) {
                    continue;
                }
            }
            let reason = self.choice_status(&current.id, index, choice)?;
            let include = match reason {
                None => true,
                Some(UnavailableReason::Disabled) => query.include_disabled,
                Some(UnavailableReason::ConditionFailed) => query.include_unavailable,
            };
            if include {
                views.push(ChoiceView {
                    id: index,
                    text: self.choice_text(choice),
                    next: choice.next.clone(),
                    available: reason.is_none(),
                    reason,
                    tags: choice.tags.clone(),
                });
            }
        }
        Ok(views)
    }

    /// Selects by position in the default [`get_choices`](Self::get_choices)
    /// list, recomputed now. Conditions are evaluated once; the picked
    /// choice is not checked a second time.
    pub async fn choose(&mut self, index: usize) -> Result<DialogueView, DialogueError> {
        self.ensure_active("choose")?;
        let offered = self.get_choices(ChoiceQuery::default())?;
        let Some(id) = offered.get(index).map(|choice| choice.id) else {
            return Err(DialogueError::validation(
                "RUNNER_CHOICE_INDEX",
                format!(
                    "Choice index {} is out of range; {} choice(s) available.",
                    index,
                    offered.len()
                ),
            ));
        };
        let (current, choice) = self.current_choice(id, "choose")?;
        self.select_choice(current, id, choice).await
    }

    /// Selects by stable id, the choice's position in the node's unfiltered
    /// list. Availability is re-checked before anything changes.
    pub async fn choose_choice(&mut self, id: usize) -> Result<DialogueView, DialogueError> {
        self.ensure_active("choose_choice")?;
        let (current, choice) = self.current_choice(id, "choose_choice")?;

        match self.choice_status(&current.id, id, &choice)? {
            Some(UnavailableReason::Disabled) => {
                return Err(DialogueError::validation(
                    "RUNNER_CHOICE_DISABLED",
                    format!("Choice {} of node \"{}\" is disabled.", id, current.id),
                ));
            }
            Some(UnavailableReason::ConditionFailed) => {
                return Err(DialogueError::validation(
                    "RUNNER_CHOICE_UNAVAILABLE",
                    format!(
                        "Choice {} of node \"{}\" does not meet its condition.",
                        id, current.id
                    ),
                ));
            }
            None => {}
        }
        self.select_choice(current, id, choice).await
    }

    fn current_choice(
        &self,
        id: usize,
        operation: &str,
    ) -> Result<(CurrentNode, ChoiceDefinition), DialogueError> {
        let Some(current) = self.current.clone() else {
            return Err(DialogueError::validation(
                "RUNNER_IDLE",
                format!("{}() requires a current node.", operation),
            ));
        };
        let Some(choice) = current.node.choices.get(id).cloned() else {
            return Err(DialogueError::validation(
                "RUNNER_CHOICE_NOT_FOUND",
                format!("Node \"{}\" has no choice with id {}.", current.id, id),
            ));
        };
        Ok((current, choice))
    }

    /// Takes an already-available choice: target check, choice actions,
    /// events, history, then entry into the target.
    async fn select_choice(
        &mut self,
        current: CurrentNode,
        id: usize,
        choice: ChoiceDefinition,
    ) -> Result<DialogueView, DialogueError> {
        let dialogue = self.loaded_dialogue("choose")?;
        if is_reserved_key(&choice.next) {
            return Err(DialogueError::validation(
                "RUNNER_NODE_RESERVED",
                format!("Choice target \"{}\" is a reserved id.", choice.next),
            ));
        }
        super::entry::lookup_node(&dialogue, &choice.next)?;

        debug!(dialogue = %dialogue.id, node = %current.id, choice = id, target = %choice.next, "choice selected");
        let flags_before = self.conversation_flags.read_all();
        execute_actions(&choice.actions, &self.action_scope(&dialogue.id, &current.id)).await?;
        self.events.dispatch(&DialogueEvent::ChoiceSelected {
            node_id: current.id.clone(),
            choice_index: id,
            choice: choice.clone(),
        })?;
        self.events.dispatch(&DialogueEvent::NodeExited {
            node_id: current.id.clone(),
        })?;

        self.history.push(HistoryEntry {
            node_id: current.id,
            node: current.node,
            choice_index: Some(id),
            choice: Some(choice.clone()),
            timestamp: now_millis(),
            conversation_flags: flags_before,
        });
        self.enter_node(&choice.next).await?;
        self.view()
    }

    fn choice_status(
        &self,
        node_id: &str,
        index: usize,
        choice: &ChoiceDefinition,
    ) -> Result<Option<UnavailableReason>, DialogueError> {
        if choice.disabled {
            return Ok(Some(UnavailableReason::Disabled));
        }
        let Some(condition) = &choice.condition else {
            return Ok(None);
        };

        let scopes = FlagScopes::new(self.game_flags.as_ref(), self.conversation_flags.as_ref());
        let result = evaluate(condition, &scopes);
        self.events.dispatch(&DialogueEvent::ConditionEvaluated {
            node_id: node_id.to_string(),
            choice_index: index,
            condition: condition.clone(),
            result,
        })?;
        Ok((!result).then_some(UnavailableReason::ConditionFailed))
    }

    fn choice_text(&self, choice: &ChoiceDefinition) -> String {
        match (&choice.text_key, &self.i18n) {
            (Some(key), Some(i18n)) => i18n.t(key, &BTreeMap::new()),
            _ => choice.text.clone(),
        }
    }
}
