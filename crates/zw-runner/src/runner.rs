//! The dialogue state machine.

use std::sync::Arc;

use tracing::debug;
use zw_core::{Choice, DialogueGraph, FlagMap, FlagStore, MemoryFlagStore, Node};

use crate::config::RunnerConfig;
use crate::error::{DialogueError, DialogueResult};
use crate::evaluate::evaluate;
use crate::execute::ActionExecutor;
use crate::flags::FlagScopes;
use crate::history::{HistoryEntry, SAVE_VERSION, SerializedState};
use crate::interpolate::{InterpolationContext, Interpolator};
use crate::observer::DialogueObserver;
use crate::view::{ChoiceOptions, ChoiceView, NodeView, RestartOptions, Step};

/// State restored when a navigation call fails.
struct Checkpoint {
    graph: Option<Arc<DialogueGraph>>,
    current: Option<String>,
    view: Option<NodeView>,
    history: HistoryMark,
    ephemeral: FlagMap,
}

enum HistoryMark {
    Len(usize),
    Full(Vec<HistoryEntry>),
}

/// Plays a dialogue graph.
///
/// A runner holds at most one session. Navigation calls take `&mut self`,
/// so a call must complete before the next one starts. Queries never
/// change state.
pub struct DialogueRunner {
    config: RunnerConfig,
    ephemeral: MemoryFlagStore,
    graph: Option<Arc<DialogueGraph>>,
    current: Option<String>,
    view: Option<NodeView>,
    history: Vec<HistoryEntry>,
}

impl DialogueRunner {
    /// Create a runner with no session.
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            ephemeral: MemoryFlagStore::new(),
            graph: None,
            current: None,
            view: None,
            history: Vec::new(),
        }
    }

    // -- navigation --

    /// Start a session at the graph's start node.
    ///
    /// Conversation flags and history are reset. Entry actions run, then
    /// pass-through nodes are followed until the session settles.
    pub async fn start(&mut self, graph: impl Into<Arc<DialogueGraph>>) -> DialogueResult<Step> {
        let graph = graph.into();
        ensure_start_node(&graph)?;
        let checkpoint = self.checkpoint_all();
        if let Err(e) = self.begin(graph.clone(), true).await {
            return Err(self.rollback(checkpoint, e));
        }
        self.announce_end(&graph);
        Ok(self.commit())
    }

    /// Start the bound graph over from its start node.
    ///
    /// Persistent flags are never touched.
    pub async fn restart(&mut self, options: RestartOptions) -> DialogueResult<Step> {
        let graph = self.graph.clone().ok_or(DialogueError::NoActiveSession)?;
        ensure_start_node(&graph)?;
        debug!(dialogue = %graph.id, ?options, "restarting dialogue");

        let preserve = options.preserve_conversation_flags;
        let checkpoint = self.checkpoint_all();
        if let Err(e) = self.begin(graph.clone(), !preserve).await {
            return Err(self.rollback(checkpoint, e));
        }
        if !preserve {
            self.ephemeral.clear();
            self.view = self.render_current().await;
        }
        self.announce_end(&graph);
        Ok(self.commit())
    }

    /// Select a choice by its index in the current node's declared list.
    pub async fn choose(&mut self, index: usize) -> DialogueResult<Step> {
        let (graph, current) = self.session()?;
        let node = graph
            .node(&current)
            .ok_or_else(|| DialogueError::UnknownNode(current.clone()))?;
        if node.is_ended() {
            return Err(DialogueError::DialogueEnded);
        }
        if node.choices.is_empty() {
            return Err(DialogueError::NoChoices(current));
        }
        let choice = node
            .choices
            .get(index)
            .ok_or(DialogueError::ChoiceOutOfRange {
                index,
                count: node.choices.len(),
            })?;
        if choice.disabled {
            return Err(DialogueError::ChoiceDisabled(index));
        }
        let flags = self.flags();
        if choice
            .conditions
            .as_ref()
            .is_some_and(|condition| !evaluate(condition, flags, &self.config.observers))
        {
            return Err(DialogueError::ConditionNotMet(index));
        }

        let checkpoint = self.checkpoint();
        if let Err(e) = self.take_choice(&graph, &current, node, index, choice).await {
            return Err(self.rollback(checkpoint, e));
        }
        self.announce_end(&graph);
        Ok(self.commit())
    }

    /// Undo the most recent step.
    ///
    /// Restores the recorded node and conversation flags without running any
    /// actions. Pass-through hops are undone together with the step that led
    /// into them, so the session lands on a node the player can act on (or on
    /// the oldest recorded node). Returns `false` when there is nothing to undo.
    pub async fn back(&mut self) -> bool {
        let Some(graph) = self.graph.clone() else {
            return false;
        };
        let Some(mut entry) = self.history.pop() else {
            return false;
        };
        while entry.choice_index.is_none() && entry.node.is_pass_through() {
            let Some(earlier) = self.history.pop() else {
                break;
            };
            entry = earlier;
        }
        debug!(node = %entry.node_id, "stepping back");

        self.ephemeral.replace(entry.ephemeral_flags);
        let node = graph.node(&entry.node_id).unwrap_or(&entry.node);
        self.view = Some(self.render(&entry.node_id, node).await);
        self.config.observers.node_entered(&entry.node_id, node);
        self.current = Some(entry.node_id);
        true
    }

    /// Move straight to `node_id`, bypassing choices and actions.
    pub async fn jump_to(&mut self, node_id: &str) -> DialogueResult<Step> {
        let (graph, current) = self.session()?;
        let target = graph
            .node(node_id)
            .ok_or_else(|| DialogueError::UnknownNode(node_id.to_string()))?;
        debug!(from = %current, to = node_id, "jumping");

        if let Some(node) = graph.node(&current) {
            self.config.observers.node_exited(&current, node);
            self.history.push(HistoryEntry::leaving(
                current,
                node.clone(),
                self.ephemeral.all(),
            ));
        }
        self.current = Some(node_id.to_string());
        self.view = Some(self.render(node_id, target).await);
        self.config.observers.node_entered(node_id, target);
        Ok(self.commit())
    }

    /// Snapshot the session.
    pub fn serialize(&self) -> DialogueResult<SerializedState> {
        let (graph, current) = self.session()?;
        Ok(SerializedState {
            version: SAVE_VERSION,
            dialogue_id: graph.id.clone(),
            current_node_id: current,
            history: self.history.iter().map(HistoryEntry::to_serialized).collect(),
            ephemeral_flags: self.ephemeral.all(),
        })
    }

    /// Restore a snapshot into the started session without replaying it.
    pub async fn deserialize(&mut self, state: SerializedState) -> DialogueResult<Step> {
        let graph = self.graph.clone().ok_or(DialogueError::NoActiveSession)?;
        if !state.is_compatible() {
            return Err(DialogueError::IncompatibleSave(state.version));
        }
        if state.dialogue_id != graph.id {
            return Err(DialogueError::DialogueMismatch {
                expected: graph.id.clone(),
                found: state.dialogue_id,
            });
        }
        let node = graph
            .node(&state.current_node_id)
            .ok_or_else(|| DialogueError::UnknownNode(state.current_node_id.clone()))?;
        let history = state
            .history
            .into_iter()
            .map(|entry| {
                let node = graph
                    .node(&entry.node_id)
                    .ok_or_else(|| DialogueError::UnknownNode(entry.node_id.clone()))?;
                let choice = entry
                    .choice_index
                    .map(|index| {
                        node.choices
                            .get(index)
                            .cloned()
                            .ok_or_else(|| DialogueError::UnknownChoice {
                                node: entry.node_id.clone(),
                                index,
                            })
                    })
                    .transpose()?;
                Ok(HistoryEntry {
                    node: node.clone(),
                    choice,
                    node_id: entry.node_id,
                    choice_index: entry.choice_index,
                    timestamp: entry.timestamp,
                    ephemeral_flags: entry.ephemeral_flags,
                })
            })
            .collect::<DialogueResult<Vec<_>>>()?;
        debug!(
            dialogue = %graph.id,
            node = %state.current_node_id,
            history = history.len(),
            "restoring session"
        );

        self.history = history;
        self.ephemeral.replace(state.ephemeral_flags);
        self.view = Some(self.render(&state.current_node_id, node).await);
        self.config.observers.node_entered(&state.current_node_id, node);
        self.current = Some(state.current_node_id);
        Ok(self.commit())
    }

    // -- queries --

    /// Choices available at the current node.
    pub fn choices(&self) -> Vec<ChoiceView> {
        self.choices_with(&ChoiceOptions::default())
    }

    /// Choices at the current node, filtered and annotated per `options`.
    pub fn choices_with(&self, options: &ChoiceOptions<'_>) -> Vec<ChoiceView> {
        let Some(node) = self.node() else {
            return Vec::new();
        };
        node.choices
            .iter()
            .enumerate()
            .filter(|&(_, choice)| options.filter.is_none_or(|accept| accept(choice)))
            .filter_map(|(index, choice)| {
                let (available, reason) = self.availability(choice);
                (available || options.include_unavailable).then(|| ChoiceView {
                    index,
                    text: choice.text.clone(),
                    target_node_id: choice.target_node_id.clone(),
                    tags: choice.tags.clone(),
                    available,
                    reason,
                    disabled_text: choice.disabled_text.clone(),
                })
            })
            .collect()
    }

    /// Whether the current node is an end. `false` before `start`.
    pub fn is_ended(&self) -> bool {
        self.node().is_some_and(Node::is_ended)
    }

    /// The rendered current node, or `None` if it is explicitly terminal.
    pub fn current_node(&self) -> Option<&NodeView> {
        self.view.as_ref().filter(|view| !view.is_terminal)
    }

    /// Id of the current node.
    pub fn current_node_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Whether a session has been started.
    pub fn is_started(&self) -> bool {
        self.graph.is_some()
    }

    /// The bound graph.
    pub fn graph(&self) -> Option<&DialogueGraph> {
        self.graph.as_deref()
    }

    /// Recorded steps, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// A copy of the conversation (`conv:`) flags.
    pub fn conversation_flags(&self) -> FlagMap {
        self.ephemeral.all()
    }

    /// A copy of the persistent flags.
    pub fn persistent_flags(&self) -> FlagMap {
        self.config.flags.all()
    }

    // -- internals --

    async fn begin(&mut self, graph: Arc<DialogueGraph>, reset_flags: bool) -> DialogueResult<()> {
        if reset_flags {
            self.ephemeral.clear();
        }
        self.history.clear();
        self.graph = Some(graph.clone());
        let start_id = graph.start_node_id.as_str();
        let node = ensure_start_node(&graph)?;
        self.current = Some(start_id.to_string());
        debug!(dialogue = %graph.id, node = start_id, "dialogue started");

        self.executor().execute_all(&node.actions).await?;
        self.view = Some(self.render(start_id, node).await);
        self.config.observers.dialogue_started(&graph.id, start_id);
        self.config.observers.node_entered(start_id, node);
        self.settle(&graph).await
    }

    async fn take_choice(
        &mut self,
        graph: &DialogueGraph,
        current: &str,
        node: &Node,
        index: usize,
        choice: &Choice,
    ) -> DialogueResult<()> {
        let observers = &self.config.observers;
        observers.choice_selected(index, choice);
        observers.node_exited(current, node);
        self.history.push(
            HistoryEntry::leaving(current, node.clone(), self.ephemeral.all())
                .with_choice(index, choice.clone()),
        );

        self.executor().execute_all(&choice.actions).await?;
        let target_id = choice.target_node_id.as_str();
        let target = graph
            .node(target_id)
            .ok_or_else(|| DialogueError::MissingTarget {
                from: current.to_string(),
                target: target_id.to_string(),
            })?;
        debug!(from = current, to = target_id, choice = index, "choice taken");

        self.current = Some(target_id.to_string());
        self.executor().execute_all(&target.actions).await?;
        self.view = Some(self.render(target_id, target).await);
        self.config.observers.node_entered(target_id, target);
        self.settle(graph).await
    }

    /// Follow pass-through nodes, then refresh the view.
    async fn settle(&mut self, graph: &DialogueGraph) -> DialogueResult<()> {
        loop {
            let Some(current) = self.current.clone() else {
                return Ok(());
            };
            let Some(node) = graph.node(&current) else {
                return Err(DialogueError::UnknownNode(current));
            };
            let Some(next_id) = node.next.as_deref().filter(|_| node.is_pass_through()) else {
                break;
            };
            let next = graph
                .node(next_id)
                .ok_or_else(|| DialogueError::MissingTarget {
                    from: current.clone(),
                    target: next_id.to_string(),
                })?;
            debug!(from = %current, to = next_id, "auto-advancing");

            self.config.observers.node_exited(&current, node);
            self.history
                .push(HistoryEntry::leaving(current, node.clone(), self.ephemeral.all()));
            self.current = Some(next_id.to_string());
            self.executor().execute_all(&next.actions).await?;
            self.config.observers.node_entered(next_id, next);
        }

        self.view = self.render_current().await;
        Ok(())
    }

    /// Notify observers if the settled session sits on an end node.
    fn announce_end(&self, graph: &DialogueGraph) {
        let ended = self
            .current
            .as_deref()
            .filter(|id| graph.node(id).is_some_and(Node::is_ended));
        if let Some(current) = ended {
            debug!(dialogue = %graph.id, node = current, "dialogue ended");
            self.config.observers.dialogue_ended(&graph.id, current);
        }
    }

    fn session(&self) -> DialogueResult<(Arc<DialogueGraph>, String)> {
        match (&self.graph, &self.current) {
            (Some(graph), Some(current)) => Ok((graph.clone(), current.clone())),
            _ => Err(DialogueError::NoActiveSession),
        }
    }

    fn node(&self) -> Option<&Node> {
        let graph = self.graph.as_deref()?;
        graph.node(self.current.as_deref()?)
    }

    fn flags(&self) -> FlagScopes<'_> {
        FlagScopes::new(self.config.flags.as_ref(), &self.ephemeral)
    }

    fn executor(&self) -> ActionExecutor<'_> {
        ActionExecutor::new(self.flags(), &self.config.handlers, &self.config.observers)
    }

    fn availability(&self, choice: &Choice) -> (bool, Option<String>) {
        if choice.disabled {
            return (false, None);
        }
        match &choice.conditions {
            Some(condition) if !evaluate(condition, self.flags(), &self.config.observers) => {
                (false, Some(format!("condition not met: {condition}")))
            }
            _ => (true, None),
        }
    }

    async fn render(&self, node_id: &str, node: &Node) -> NodeView {
        let speaker = node
            .speaker_id
            .as_deref()
            .and_then(|id| self.config.speakers.get(id));
        let ctx = InterpolationContext {
            node_id,
            node,
            speaker,
            flags: self.flags(),
        };
        let text = Interpolator::new(&self.config.functions, self.config.translator.as_deref())
            .interpolate(&node.text, &ctx)
            .await;
        NodeView {
            id: node_id.to_string(),
            text,
            speaker_id: node.speaker_id.clone(),
            speaker_name: speaker.map(|s| s.name.clone()),
            tags: node.tags.clone(),
            is_terminal: node.is_terminal,
        }
    }

    async fn render_current(&self) -> Option<NodeView> {
        let id = self.current.as_deref()?;
        let node = self.node()?;
        Some(self.render(id, node).await)
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            graph: self.graph.clone(),
            current: self.current.clone(),
            view: self.view.clone(),
            history: HistoryMark::Len(self.history.len()),
            ephemeral: self.ephemeral.all(),
        }
    }

    fn checkpoint_all(&mut self) -> Checkpoint {
        Checkpoint {
            history: HistoryMark::Full(std::mem::take(&mut self.history)),
            ..self.checkpoint()
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint, error: DialogueError) -> DialogueError {
        debug!(%error, "navigation failed; rolling back");
        self.graph = checkpoint.graph;
        self.current = checkpoint.current;
        self.view = checkpoint.view;
        match checkpoint.history {
            HistoryMark::Len(len) => self.history.truncate(len),
            HistoryMark::Full(history) => self.history = history,
        }
        self.ephemeral.replace(checkpoint.ephemeral);
        error
    }

    /// Apply the history cap and describe the settled session.
    fn commit(&mut self) -> Step {
        let max = self.config.max_history;
        if max > 0 && self.history.len() > max {
            let excess = self.history.len() - max;
            self.history.drain(..excess);
        }
        Step {
            view: self.current_node().cloned(),
            choices: self.choices(),
            ended: self.is_ended(),
        }
    }
}

fn ensure_start_node(graph: &DialogueGraph) -> DialogueResult<&Node> {
    graph
        .start_node()
        .ok_or_else(|| DialogueError::MissingStartNode {
            dialogue: graph.id.clone(),
            node: graph.start_node_id.clone(),
        })
}
