use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::flags::FlagMap;
use crate::types::Speaker;

pub const DEFAULT_MAX_AUTO_ADVANCE: usize = 10_000;

/// How the runner reacts when an event listener returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerErrorPolicy {
    /// Log the failure and keep dispatching to the remaining listeners.
    #[default]
    Isolate,
    /// Stop dispatching and fail the operation that emitted the event.
    Abort,
}

/// File-level runner settings, usually read from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Ceiling on consecutive auto-advance hops. `0` removes the ceiling.
    pub max_auto_advance: usize,
    pub listener_errors: ListenerErrorPolicy,
    pub speakers: BTreeMap<String, Speaker>,
    pub game_flags: FlagMap,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_auto_advance: DEFAULT_MAX_AUTO_ADVANCE,
            listener_errors: ListenerErrorPolicy::default(),
            speakers: BTreeMap::new(),
            game_flags: FlagMap::new(),
        }
    }
}

impl RunnerConfig {
    pub fn auto_advance_limit(&self) -> Option<usize> {
        match self.max_auto_advance {
            0 => None,
            limit => Some(limit),
        }
    }
}
