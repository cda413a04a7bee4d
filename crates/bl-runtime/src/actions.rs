use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use bl_core::{
    Action, ActionOutcome, DialogueError, FlagScopes, FlagStore, MemoryFlagStore,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::events::{DialogueEvent, EventDispatcher};

/// What a callback action receives. Both stores are live handles.
#[derive(Clone)]
pub struct ActionContext {
    pub dialogue_id: String,
    pub node_id: String,
    pub args: Option<serde_json::Value>,
    pub game_flags: Arc<dyn FlagStore>,
    pub conversation_flags: Arc<MemoryFlagStore>,
}

pub type ActionHandler = Arc<
    dyn Fn(ActionContext) -> BoxFuture<'static, Result<serde_json::Value, DialogueError>>
        + Send
        + Sync,
>;

/// Wraps an async closure as an [`ActionHandler`].
pub fn action_handler<F, Fut>(handler: F) -> ActionHandler
where
    F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<serde_json::Value, DialogueError>> + Send + 'static,
{
    Arc::new(move |context| handler(context).boxed())
}

/// Borrowed view of everything an action sequence touches.
pub struct ActionScope<'a> {
    pub dialogue_id: &'a str,
    pub node_id: &'a str,
    pub game_flags: &'a Arc<dyn FlagStore>,
    pub conversation_flags: &'a Arc<MemoryFlagStore>,
    pub handlers: &'a BTreeMap<String, ActionHandler>,
    pub events: &'a EventDispatcher,
}

/// Runs `actions` one after another, awaiting each before the next starts.
///
/// The first failing action stops the sequence; the ones before it stay
/// applied.
pub async fn execute_actions(
    actions: &[Action],
    scope: &ActionScope<'_>,
) -> Result<(), DialogueError> {
    for action in actions {
        debug!(
            dialogue = scope.dialogue_id,
            node = scope.node_id,
            action = action.kind_name(),
            "executing action"
        );
        let outcome = execute_action(action, scope).await?;
        scope.events.dispatch(&DialogueEvent::ActionExecuted {
            node_id: scope.node_id.to_string(),
            action: action.clone(),
            outcome,
        })?;
    }
    Ok(())
}

async fn execute_action(
    action: &Action,
    scope: &ActionScope<'_>,
) -> Result<ActionOutcome, DialogueError> {
    let flags = FlagScopes::new(
        scope.game_flags.as_ref(),
        scope.conversation_flags.as_ref(),
    );
    match action {
        Action::Set { flag, value } => {
            let (store, key) = flags.resolve(flag);
            store.set(key, value.clone());
            Ok(ActionOutcome::Set {
                value: value.clone(),
            })
        }
        Action::Increment { flag, value } => {
            let (store, key) = flags.resolve(flag);
            Ok(ActionOutcome::Counter {
                value: store.increment(key, value.unwrap_or(1.0)),
            })
        }
        Action::Decrement { flag, value } => {
            let (store, key) = flags.resolve(flag);
            Ok(ActionOutcome::Counter {
                value: store.decrement(key, value.unwrap_or(1.0)),
            })
        }
        Action::Clear { flag } => {
            let (store, key) = flags.resolve(flag);
            Ok(ActionOutcome::Cleared {
                existed: store.delete(key),
            })
        }
        Action::Callback { handler, args } => {
            let callback = scope.handlers.get(handler).cloned().ok_or_else(|| {
                DialogueError::validation(
                    "ACTION_HANDLER_MISSING",
                    format!("Action handler \"{}\" is not registered.", handler),
                )
            })?;
            let context = ActionContext {
                dialogue_id: scope.dialogue_id.to_string(),
                node_id: scope.node_id.to_string(),
                args: args.clone(),
                game_flags: Arc::clone(scope.game_flags),
                conversation_flags: Arc::clone(scope.conversation_flags),
            };
            let value = callback(context).await?;
            Ok(ActionOutcome::Callback { value })
        }
    }
}
