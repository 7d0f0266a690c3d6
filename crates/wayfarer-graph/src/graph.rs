use crate::definition::ChatbotDefinition;
use crate::error::{GraphError, GraphResult};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// A point in the dialogue graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    id: String,
    text: String,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Prompt shown to the user at this node.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A labeled transition out of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    from_id: String,
    text: String,
    to_id: String,
}

impl Edge {
    pub fn from_id(&self) -> &str {
        &self.from_id
    }

    /// Label of the choice, shown to the user and echoed back by the model.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn to_id(&self) -> &str {
        &self.to_id
    }
}

/// Immutable chatbot graph.
///
/// Node order and per-node edge order follow the definition and are stable
/// for the lifetime of the graph.
#[derive(Debug, Clone)]
pub struct ChatbotGraph {
    name: String,
    root: usize,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<Edge>>,
}

impl ChatbotGraph {
    pub fn builder(name: impl Into<String>) -> GraphBuilder {
        GraphBuilder::new(name)
    }

    /// Builds a graph from its serialized definition.
    pub fn from_definition(definition: ChatbotDefinition) -> GraphResult<Self> {
        let mut builder = GraphBuilder::new(definition.name);
        if let Some(root) = definition.root_section_id {
            builder = builder.root(root);
        }
        for section in &definition.sections {
            builder = builder.node(section.id.clone(), section.text.clone());
        }
        for section in definition.sections {
            for choice in section.choices {
                builder = builder.edge(section.id.clone(), choice.text, choice.next_section_id);
            }
        }
        builder.build()
    }

    pub fn from_json_str(json: &str) -> GraphResult<Self> {
        Self::from_definition(serde_json::from_str(json)?)
    }

    /// Loads a chatbot definition file.
    pub fn parse_from_file(path: &Path) -> GraphResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let graph = Self::from_json_str(&contents)?;
        debug!(
            path = %path.display(),
            name = %graph.name,
            nodes = graph.nodes.len(),
            "Loaded chatbot graph"
        );
        Ok(graph)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Outgoing edges of `node`, in definition order.
    pub fn edges_of(&self, node: &Node) -> &[Edge] {
        match self.index.get(node.id()) {
            Some(&i) => &self.edges[i],
            None => &[],
        }
    }

    /// All nodes, in definition order.
    pub fn vertices(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First outgoing edge of `node` whose label equals `label`.
    ///
    /// Duplicate labels on one node resolve to the earliest edge.
    pub fn find_edge(&self, node: &Node, label: &str) -> Option<&Edge> {
        self.edges_of(node).iter().find(|edge| edge.text == label)
    }
}

/// Incremental construction of a [`ChatbotGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    name: String,
    root: Option<String>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    #[must_use]
    pub fn node(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.nodes.push(Node { id: id.into(), text: text.into() });
        self
    }

    #[must_use]
    pub fn edge(
        mut self,
        from: impl Into<String>,
        label: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.edges.push(Edge { from_id: from.into(), text: label.into(), to_id: to.into() });
        self
    }

    /// Sets the entry node. Defaults to the first node added.
    #[must_use]
    pub fn root(mut self, id: impl Into<String>) -> Self {
        self.root = Some(id.into());
        self
    }

    pub fn build(self) -> GraphResult<ChatbotGraph> {
        if self.nodes.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut index = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let root = match self.root {
            Some(id) => *index.get(&id).ok_or(GraphError::RootNotFound(id))?,
            None => 0,
        };

        let mut edges: Vec<Vec<Edge>> = vec![Vec::new(); self.nodes.len()];
        for edge in self.edges {
            let from = *index
                .get(&edge.from_id)
                .ok_or_else(|| GraphError::UnknownSource(edge.from_id.clone()))?;
            if !index.contains_key(&edge.to_id) {
                return Err(GraphError::DanglingEdge {
                    from: edge.from_id,
                    label: edge.text,
                    to: edge.to_id,
                });
            }
            edges[from].push(edge);
        }

        for (node, out) in self.nodes.iter().zip(&edges) {
            let mut seen = HashSet::new();
            for edge in out {
                if !seen.insert(edge.text.as_str()) {
                    warn!(
                        node_id = %node.id,
                        label = %edge.text,
                        "Duplicate choice label; the first matching choice wins"
                    );
                }
            }
        }

        Ok(ChatbotGraph { name: self.name, root, nodes: self.nodes, index, edges })
    }
}
