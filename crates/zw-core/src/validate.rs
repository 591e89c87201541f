//! Advisory structural checks for dialogue graphs.
//!
//! Nothing here is enforced at runtime; a graph with issues can still be
//! played until it reaches a dangling reference.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use strsim::jaro_winkler;

use crate::graph::DialogueGraph;

/// Minimum similarity for a "did you mean" suggestion (0.0-1.0).
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Playback will fail if this is reached.
    Error,
    /// Suspicious content that still plays.
    Warning,
}

/// A problem found in a dialogue graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The node where the issue was found.
    pub node: String,
    /// A human-readable description of the issue.
    pub message: String,
    /// Error or warning.
    pub severity: Severity,
}

impl ValidationIssue {
    fn error(node: &str, message: String) -> Self {
        Self {
            node: node.to_string(),
            message,
            severity: Severity::Error,
        }
    }

    fn warning(node: &str, message: String) -> Self {
        Self {
            node: node.to_string(),
            message,
            severity: Severity::Warning,
        }
    }

    /// Whether this issue is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: {}: {}", self.node, self.message)
    }
}

/// Check a graph for dangling references, unreachable nodes, ignored
/// successors, and pass-through cycles.
///
/// Issues are ordered by node id.
pub fn validate_graph(graph: &DialogueGraph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !graph.contains(&graph.start_node_id) {
        issues.push(ValidationIssue::error(
            &graph.start_node_id,
            missing_message("start node", &graph.start_node_id, graph),
        ));
    }

    for (id, node) in &graph.nodes {
        for (index, choice) in node.choices.iter().enumerate() {
            if !graph.contains(&choice.target_node_id) {
                issues.push(ValidationIssue::error(
                    id,
                    missing_message(
                        &format!("choice {index} target"),
                        &choice.target_node_id,
                        graph,
                    ),
                ));
            }
        }

        if let Some(next) = &node.next {
            if !graph.contains(next) {
                issues.push(ValidationIssue::error(
                    id,
                    missing_message("next target", next, graph),
                ));
            }
            if !node.choices.is_empty() {
                issues.push(ValidationIssue::warning(
                    id,
                    "declares both choices and next; next is ignored".to_string(),
                ));
            }
        }
    }

    let reachable = reachable_nodes(graph);
    for id in graph.nodes.keys() {
        if !reachable.contains(id.as_str()) {
            issues.push(ValidationIssue::warning(
                id,
                "unreachable from the start node".to_string(),
            ));
        }
    }

    for cycle in pass_through_cycles(graph) {
        issues.push(ValidationIssue::warning(
            &cycle[0],
            format!("pass-through cycle never stops: {}", cycle.join(" -> ")),
        ));
    }

    issues.sort_by(|a, b| a.node.cmp(&b.node));
    issues
}

fn missing_message(what: &str, target: &str, graph: &DialogueGraph) -> String {
    match suggest_node(graph, target) {
        Some(similar) => format!("{what} \"{target}\" does not exist (did you mean \"{similar}\"?)"),
        None => format!("{what} \"{target}\" does not exist"),
    }
}

/// The existing node id most similar to `target`, if any is close enough.
pub fn suggest_node<'a>(graph: &'a DialogueGraph, target: &str) -> Option<&'a str> {
    graph
        .nodes
        .keys()
        .map(|id| (id.as_str(), jaro_winkler(target, id)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(id, _)| id)
}

/// Node ids reachable from the start node, following choices and, for
/// nodes without choices, `next`.
fn reachable_nodes(graph: &DialogueGraph) -> BTreeSet<&str> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    if let Some((id, _)) = graph.nodes.get_key_value(&graph.start_node_id) {
        queue.push_back(id.as_str());
    }

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let Some(node) = graph.node(id) else {
            continue;
        };
        let successors: Vec<&String> = if node.choices.is_empty() {
            node.next.iter().collect()
        } else {
            node.choices.iter().map(|c| &c.target_node_id).collect()
        };
        for target in successors {
            if let Some((key, _)) = graph.nodes.get_key_value(target) {
                queue.push_back(key.as_str());
            }
        }
    }

    seen
}

/// Cycles made only of pass-through nodes, each reported once, starting
/// from its smallest node id.
fn pass_through_cycles(graph: &DialogueGraph) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();

    for start in graph.nodes.keys() {
        let mut path: Vec<&str> = Vec::new();
        let mut current = start.as_str();

        while let Some(node) = graph.node(current).filter(|n| n.is_pass_through()) {
            if let Some(pos) = path.iter().position(|id| *id == current) {
                let cycle = &path[pos..];
                if cycle.iter().min() == Some(&start.as_str()) {
                    let mut ids: Vec<String> = cycle.iter().map(|s| s.to_string()).collect();
                    ids.push(start.clone());
                    cycles.push(ids);
                }
                break;
            }
            path.push(current);
            match &node.next {
                Some(next) => current = next,
                None => break,
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Choice, Node};

    fn clean_graph() -> DialogueGraph {
        DialogueGraph::new("tavern", "greet")
            .with_node(
                "greet",
                Node::new("Welcome!")
                    .with_choice(Choice::new("Rumors?", "rumors"))
                    .with_choice(Choice::new("Bye", "bye")),
            )
            .with_node("rumors", Node::new("Strange lights...").with_next("bye"))
            .with_node("bye", Node::new("Safe travels.").terminal())
    }

    #[test]
    fn clean_graph_has_no_issues() {
        assert!(validate_graph(&clean_graph()).is_empty());
    }

    #[test]
    fn missing_start_node() {
        let mut graph = clean_graph();
        graph.start_node_id = "nowhere".to_string();
        let issues = validate_graph(&graph);
        assert!(issues.iter().any(|i| i.is_error() && i.node == "nowhere"));
    }

    #[test]
    fn dangling_choice_target_suggests_similar_node() {
        let graph = clean_graph().with_node(
            "greet",
            Node::new("Welcome!").with_choice(Choice::new("Rumors?", "rumours")),
        );
        let issues = validate_graph(&graph);
        let issue = issues.iter().find(|i| i.is_error()).unwrap();
        assert_eq!(issue.node, "greet");
        assert!(issue.message.contains("did you mean \"rumors\""));
    }

    #[test]
    fn unreachable_node_is_a_warning() {
        let graph = clean_graph().with_node("secret", Node::new("Hidden."));
        let issues = validate_graph(&graph);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].node, "secret");
    }

    #[test]
    fn next_ignored_when_choices_exist() {
        let graph = clean_graph().with_node(
            "greet",
            Node::new("Welcome!")
                .with_choice(Choice::new("Rumors?", "rumors"))
                .with_choice(Choice::new("Bye", "bye"))
                .with_next("bye"),
        );
        let issues = validate_graph(&graph);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("next is ignored"));
    }

    #[test]
    fn pass_through_cycle_reported_once() {
        let graph = DialogueGraph::new("loop", "a")
            .with_node("a", Node::new("A").with_next("b"))
            .with_node("b", Node::new("B").with_next("c"))
            .with_node("c", Node::new("C").with_next("b"));
        let issues = validate_graph(&graph);
        let cycles: Vec<_> = issues
            .iter()
            .filter(|i| i.message.starts_with("pass-through cycle"))
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].node, "b");
    }

    #[test]
    fn rendered_report() {
        let graph = DialogueGraph::new("broken", "start")
            .with_node("start", Node::new("Hi").with_next("middle"))
            .with_node("middle", Node::new("...").with_next("ending"))
            .with_node("orphan", Node::new("Nobody comes here."));
        let report: Vec<String> = validate_graph(&graph).iter().map(|i| i.to_string()).collect();
        insta::assert_snapshot!(
            report.join("\n"),
            @r#"
        error: middle: next target "ending" does not exist
        warning: orphan: unreachable from the start node
        "#
        );
    }
}
