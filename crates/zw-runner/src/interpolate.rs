//! `{{token}}` substitution in display text.
//!
//! Each occurrence is resolved on its own, left to right, by the first
//! match of:
//!
//! 1. a custom function registered under the token,
//! 2. `speaker`, when the node has a resolvable speaker,
//! 3. a flag lookup of the token as a raw flag name (`{{conv:mood}}`).
//!
//! Unresolved tokens render as the empty string.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use zw_core::{FlagValue, Node};

use crate::flags::FlagScopes;
use crate::speaker::Speaker;

/// Token name that renders the current speaker's display name.
pub const SPEAKER_TOKEN: &str = "speaker";

fn token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*([^{}\s][^{}]*?)\s*\}\}").expect("token regex must compile")
    })
}

/// Everything a template can see while being rendered.
#[derive(Clone, Copy)]
pub struct InterpolationContext<'a> {
    /// Id of the node being rendered.
    pub node_id: &'a str,
    /// The node being rendered.
    pub node: &'a Node,
    /// The node's speaker, if it has one and it is registered.
    pub speaker: Option<&'a Speaker>,
    /// Both flag stores.
    pub flags: FlagScopes<'a>,
}

/// A named template function, e.g. `{{playerName}}`.
#[async_trait]
pub trait InterpolationFn: Send + Sync {
    /// Produce the replacement. `None` and falsy values render as "".
    async fn call(&self, ctx: &InterpolationContext<'_>) -> Option<FlagValue>;
}

struct FnTemplate<F>(F);

#[async_trait]
impl<F> InterpolationFn for FnTemplate<F>
where
    F: Fn(&InterpolationContext<'_>) -> Option<FlagValue> + Send + Sync,
{
    async fn call(&self, ctx: &InterpolationContext<'_>) -> Option<FlagValue> {
        (self.0)(ctx)
    }
}

/// Template functions keyed by token name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn InterpolationFn>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asynchronous function.
    pub fn register(&mut self, name: impl Into<String>, function: impl InterpolationFn + 'static) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Register a synchronous closure.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&InterpolationContext<'_>) -> Option<FlagValue> + Send + Sync + 'static,
    {
        self.register(name, FnTemplate(f));
    }

    /// Builder form of [`Self::register_fn`].
    pub fn with_fn<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&InterpolationContext<'_>) -> Option<FlagValue> + Send + Sync + 'static,
    {
        self.register_fn(name, f);
        self
    }

    /// Look up a function.
    pub fn get(&self, name: &str) -> Option<Arc<dyn InterpolationFn>> {
        self.functions.get(name).cloned()
    }
}

/// Maps translation keys to localized text.
pub trait Translator: Send + Sync {
    /// Whether `text` is a key this translator knows.
    fn has_key(&self, text: &str) -> bool;

    /// Localize `text`. The context serves as the parameter set.
    fn translate(&self, text: &str, ctx: &InterpolationContext<'_>) -> String;
}

/// Renders node text.
#[derive(Clone, Copy)]
pub struct Interpolator<'a> {
    functions: &'a FunctionRegistry,
    translator: Option<&'a dyn Translator>,
}

impl<'a> Interpolator<'a> {
    /// Create an interpolator.
    pub fn new(functions: &'a FunctionRegistry, translator: Option<&'a dyn Translator>) -> Self {
        Self {
            functions,
            translator,
        }
    }

    /// Translate `text` if it is a known key, then substitute every token.
    pub async fn interpolate(&self, text: &str, ctx: &InterpolationContext<'_>) -> String {
        let source: Cow<'_, str> = match self.translator {
            Some(t) if t.has_key(text) => Cow::Owned(t.translate(text, ctx)),
            _ => Cow::Borrowed(text),
        };

        // Spans are collected up front so no regex state lives across an await.
        let tokens: Vec<(usize, usize, String)> = token_regex()
            .captures_iter(&source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let token = caps.get(1)?;
                Some((whole.start(), whole.end(), token.as_str().to_string()))
            })
            .collect();

        let mut out = String::with_capacity(source.len());
        let mut last = 0;
        for (start, end, token) in tokens {
            out.push_str(&source[last..start]);
            out.push_str(&self.resolve_token(&token, ctx).await);
            last = end;
        }
        out.push_str(&source[last..]);
        out
    }

    async fn resolve_token(&self, token: &str, ctx: &InterpolationContext<'_>) -> String {
        if let Some(function) = self.functions.get(token) {
            return match function.call(ctx).await {
                Some(value) if value.is_truthy() => value.to_string(),
                _ => String::new(),
            };
        }

        if let Some(speaker) = ctx.speaker.filter(|_| token == SPEAKER_TOKEN) {
            return speaker.name.clone();
        }

        ctx.flags
            .get(token)
            .map(|value| value.to_string())
            .unwrap_or_default()
    }
}
