pub mod config;
pub mod error;
pub mod flags;
pub mod reserved;
pub mod types;
pub mod value;

pub use config::{ListenerErrorPolicy, RunnerConfig, DEFAULT_MAX_AUTO_ADVANCE};
pub use error::{DialogueError, DialogueErrorKind};
pub use flags::{FlagMap, FlagScope, FlagScopes, FlagStore, MemoryFlagStore, CONVERSATION_PREFIX};
pub use reserved::{is_reserved_key, RESERVED_KEYS};
pub use types::*;
pub use value::*;
