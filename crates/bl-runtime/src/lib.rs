mod actions;
mod condition;
mod events;
mod interpolate;
mod runner;
mod validate;

pub use actions::{action_handler, execute_actions, ActionContext, ActionHandler, ActionScope};
pub use condition::evaluate;
pub use events::{DialogueEvent, EventDispatcher, EventKind, EventListener, ListenerId};
pub use interpolate::{
    interpolate, interpolation_function, I18nAdapter, InterpolationContext,
    InterpolationFunction, SPEAKER_TOKEN,
};
pub use runner::{ChoiceQuery, DialogueRunner, RestartOptions, RunnerOptions, RunnerState};
pub use validate::{validate_dialogue, ValidationIssue, ValidationReport};
