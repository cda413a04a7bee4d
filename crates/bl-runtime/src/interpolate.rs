use std::collections::BTreeMap;
use std::future::Future;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

use bl_core::{DialogueError, FlagMap, FlagScope, FlagValue, NodeDefinition, Speaker};
use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use tracing::{debug, warn};

/// Token that always expands to the current speaker's display name.
pub const SPEAKER_TOKEN: &str = "speaker";

/// Read-only view handed to interpolation functions. Flag maps are snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationContext {
    pub node_id: String,
    pub node: NodeDefinition,
    pub speaker: Option<Speaker>,
    pub game_flags: FlagMap,
    pub conversation_flags: FlagMap,
}

impl InterpolationContext {
    pub fn flag(&self, flag_ref: &str) -> Option<&FlagValue> {
        match FlagScope::parse(flag_ref) {
            (FlagScope::Conversation, key) => self.conversation_flags.get(key),
            (FlagScope::Game, key) => self.game_flags.get(key),
        }
    }
}

pub type InterpolationFunction = Arc<
    dyn Fn(InterpolationContext) -> BoxFuture<'static, Result<String, DialogueError>>
        + Send
        + Sync,
>;

pub fn interpolation_function<F, Fut>(function: F) -> InterpolationFunction
where
    F: Fn(InterpolationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, DialogueError>> + Send + 'static,
{
    Arc::new(move |context| function(context).boxed())
}

/// Localization hook. Only `t` is consumed.
pub trait I18nAdapter: Send + Sync {
    fn t(&self, key: &str, params: &BTreeMap<String, String>) -> String;
}

/// Expands every `{{token}}` in `template`.
///
/// Tokens resolve in order: `speaker`, then a registered function, then a
/// scoped flag reference. Anything unresolved becomes an empty string.
pub async fn interpolate(
    template: &str,
    context: &InterpolationContext,
    functions: &BTreeMap<String, InterpolationFunction>,
) -> String {
    let tokens = token_regex()
        .captures_iter(template)
        .filter_map(|captures| {
            let full = captures.get(0)?;
            let token = captures.get(1)?;
            Some((full.range(), token.as_str().trim().to_string()))
        })
        .collect::<Vec<(Range<usize>, String)>>();

    if tokens.is_empty() {
        return template.to_string();
    }

    let mut output = String::with_capacity(template.len());
    let mut last_index = 0usize;
    for (range, token) in tokens {
        output.push_str(&template[last_index..range.start]);
        output.push_str(&resolve_token(&token, context, functions).await);
        last_index = range.end;
    }
    output.push_str(&template[last_index..]);
    output
}

async fn resolve_token(
    token: &str,
    context: &InterpolationContext,
    functions: &BTreeMap<String, InterpolationFunction>,
) -> String {
    if token == SPEAKER_TOKEN {
        return context
            .speaker
            .as_ref()
            .map(|speaker| speaker.name.clone())
            .unwrap_or_default();
    }

    if let Some(function) = functions.get(token) {
        return match function(context.clone()).await {
            Ok(text) => text,
            Err(error) => {
                warn!(token, node = %context.node_id, error = %error, "interpolation function failed");
                String::new()
            }
        };
    }

    match context.flag(token) {
        Some(value) => value.to_string(),
        None => {
            debug!(token, node = %context.node_id, "interpolation token did not resolve");
            String::new()
        }
    }
}

fn token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("token regex"))
}
