use super::*;

impl DialogueRunner {
    pub fn new(options: RunnerOptions) -> Result<Self, DialogueError> {
        for name in options.action_handlers.keys() {
            if name.trim().is_empty() {
                return Err(DialogueError::validation(
                    "RUNNER_HANDLER_NAME_INVALID",
                    "Action handler names must not be empty.",
                ));
            }
            if is_reserved_key(name) {
                return Err(DialogueError::validation(
                    "RUNNER_HANDLER_NAME_RESERVED",
                    format!("Action handler name \"{}\" is reserved.", name),
                ));
            }
        }

        for name in options.interpolation_functions.keys() {
            if name.trim().is_empty() {
                return Err(DialogueError::validation(
                    "RUNNER_FUNCTION_NAME_INVALID",
                    "Interpolation function names must not be empty.",
                ));
            }
            if name == SPEAKER_TOKEN || is_reserved_key(name) {
                return Err(DialogueError::validation(
                    "RUNNER_FUNCTION_NAME_RESERVED",
                    format!("Interpolation function name \"{}\" is reserved.", name),
                ));
            }
        }

        let mut events = EventDispatcher::new(options.listener_errors);
        for (kind, listener) in options.listeners {
            events.on(kind, listener);
        }

        Ok(Self {
            game_flags: options
                .game_flags
                .unwrap_or_else(|| Arc::new(MemoryFlagStore::new())),
            conversation_flags: Arc::new(MemoryFlagStore::new()),
            speakers: options.speakers,
            action_handlers: options.action_handlers,
            interpolation_functions: options.interpolation_functions,
            i18n: options.i18n,
            events,
            max_auto_advance: options.max_auto_advance,
            dialogue: None,
            current: None,
            history: Vec::new(),
            ended: false,
        })
    }

    /// Loads `dialogue` and enters its start node. Any previous traversal,
    /// its history and its conversation flags are discarded.
    pub async fn start(
        &mut self,
        dialogue: impl Into<Arc<DialogueDefinition>>,
    ) -> Result<DialogueView, DialogueError> {
        let dialogue = dialogue.into();
        check_dialogue_ids(&dialogue)?;

        debug!(dialogue = %dialogue.id, start = %dialogue.start_node, "starting dialogue");
        self.dialogue = Some(Arc::clone(&dialogue));
        self.current = None;
        self.history.clear();
        self.conversation_flags.clear();
        self.ended = false;

        self.events.dispatch(&DialogueEvent::DialogueStarted {
            dialogue_id: dialogue.id.clone(),
        })?;
        self.enter_node(&dialogue.start_node).await?;
        self.view()
    }

    /// Re-enters the start node of the loaded dialogue with empty history.
    /// `DialogueStarted` fires again once the start node has been entered.
    pub async fn restart(&mut self, options: RestartOptions) -> Result<DialogueView, DialogueError> {
        let dialogue = self.loaded_dialogue("restart")?;

        debug!(
            dialogue = %dialogue.id,
            preserve_flags = options.preserve_conversation_flags,
            "restarting dialogue"
        );
        self.history.clear();
        if !options.preserve_conversation_flags {
            self.conversation_flags.clear();
        }
        self.ended = false;

        self.enter_node(&dialogue.start_node).await?;
        self.events.dispatch(&DialogueEvent::DialogueStarted {
            dialogue_id: dialogue.id.clone(),
        })?;
        self.view()
    }

    pub fn state(&self) -> RunnerState {
        match (&self.dialogue, self.ended) {
            (None, _) => RunnerState::Idle,
            (Some(_), false) => RunnerState::Active,
            (Some(_), true) => RunnerState::Ended,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn get_current_node(&self) -> Option<&CurrentNode> {
        self.current.as_ref()
    }

    pub fn dialogue(&self) -> Option<&Arc<DialogueDefinition>> {
        self.dialogue.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn game_flags(&self) -> &Arc<dyn FlagStore> {
        &self.game_flags
    }

    pub fn get_conversation_flags(&self) -> FlagMap {
        self.conversation_flags.read_all()
    }

    pub fn clear_conversation_flags(&self) {
        self.conversation_flags.clear();
    }

    pub fn on(&mut self, kind: EventKind, listener: EventListener) -> ListenerId {
        self.events.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// The current node plus its default choice list.
    pub fn view(&self) -> Result<DialogueView, DialogueError> {
        Ok(DialogueView {
            current_node: self.current.clone(),
            available_choices: self.get_choices(ChoiceQuery::default())?,
            is_ended: self.ended,
        })
    }

    pub(super) fn loaded_dialogue(
        &self,
        operation: &str,
    ) -> Result<Arc<DialogueDefinition>, DialogueError> {
        self.dialogue.clone().ok_or_else(|| {
            DialogueError::validation(
                "RUNNER_IDLE",
                format!("{}() requires a started dialogue.", operation),
            )
        })
    }

    pub(super) fn ensure_active(&self, operation: &str) -> Result<(), DialogueError> {
        match self.state() {
            RunnerState::Idle => Err(DialogueError::validation(
                "RUNNER_IDLE",
                format!("{}() requires a started dialogue.", operation),
            )),
            RunnerState::Ended => Err(DialogueError::validation(
                "RUNNER_ENDED",
                format!("{}() is not allowed after the dialogue has ended.", operation),
            )),
            RunnerState::Active => Ok(()),
        }
    }
}

pub(super) fn check_dialogue_ids(dialogue: &DialogueDefinition) -> Result<(), DialogueError> {
    if let Some(node_id) = dialogue.nodes.keys().find(|key| is_reserved_key(key)) {
        return Err(DialogueError::validation(
            "DIALOGUE_NODE_RESERVED",
            format!("Node id \"{}\" is reserved.", node_id),
        ));
    }
    if is_reserved_key(&dialogue.start_node) {
        return Err(DialogueError::validation(
            "DIALOGUE_START_RESERVED",
            format!("Start node \"{}\" is a reserved id.", dialogue.start_node),
        ));
    }
    if dialogue.node(&dialogue.start_node).is_none() {
        return Err(DialogueError::structure(
            "DIALOGUE_START_NOT_FOUND",
            format!(
                "Start node \"{}\" does not exist in dialogue \"{}\".",
                dialogue.start_node, dialogue.id
            ),
        ));
    }
    Ok(())
}
