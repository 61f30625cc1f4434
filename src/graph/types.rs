use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::LineageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Table,
    View,
    Metric,
    Dataset,
    Dashboard,
    Model,
    External,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Table => "TABLE",
            NodeType::View => "VIEW",
            NodeType::Metric => "METRIC",
            NodeType::Dataset => "DATASET",
            NodeType::Dashboard => "DASHBOARD",
            NodeType::Model => "MODEL",
            NodeType::External => "EXTERNAL",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TABLE" => Ok(NodeType::Table),
            "VIEW" => Ok(NodeType::View),
            "METRIC" => Ok(NodeType::Metric),
            "DATASET" => Ok(NodeType::Dataset),
            "DASHBOARD" => Ok(NodeType::Dashboard),
            "MODEL" => Ok(NodeType::Model),
            "EXTERNAL" => Ok(NodeType::External),
            other => Err(LineageError::invalid_input(format!(
                "unknown node type {other}"
            ))),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    #[default]
    Derives,
    Transforms,
    Aggregates,
    Copies,
    References,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Derives => "DERIVES",
            EdgeType::Transforms => "TRANSFORMS",
            EdgeType::Aggregates => "AGGREGATES",
            EdgeType::Copies => "COPIES",
            EdgeType::References => "REFERENCES",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DERIVES" => Ok(EdgeType::Derives),
            "TRANSFORMS" => Ok(EdgeType::Transforms),
            "AGGREGATES" => Ok(EdgeType::Aggregates),
            "COPIES" => Ok(EdgeType::Copies),
            "REFERENCES" => Ok(EdgeType::References),
            other => Err(LineageError::invalid_input(format!(
                "unknown edge type {other}"
            ))),
        }
    }
}

/// A data asset tracked in the lineage graph, keyed by its fully-qualified name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub name: String,
    pub node_type: NodeType,
    pub owner: Option<String>,
    pub team: Option<String>,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            node_type,
            owner: None,
            team: None,
            description: None,
            tags: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }
}

pub type EdgeKey = (String, String, EdgeType);

/// Directed "source feeds target" relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn key(&self) -> EdgeKey {
        (self.source.clone(), self.target.clone(), self.edge_type)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

pub fn validate_node(node: &Node) -> Result<(), LineageError> {
    if node.name.trim().is_empty() {
        return Err(LineageError::invalid_input("node name must be set"));
    }
    if node.tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(LineageError::invalid_input("node tags must not be blank"));
    }
    Ok(())
}

pub fn validate_edge(edge: &Edge) -> Result<(), LineageError> {
    if edge.source.trim().is_empty() || edge.target.trim().is_empty() {
        return Err(LineageError::invalid_input(
            "edge endpoints must be named",
        ));
    }
    Ok(())
}

pub fn row_to_node(row: &rusqlite::Row<'_>) -> Result<Node, rusqlite::Error> {
    let node_type: String = row.get(1)?;
    let tags: String = row.get(5)?;
    Ok(Node {
        name: row.get(0)?,
        node_type: parse_column(1, &node_type)?,
        owner: row.get(2)?,
        team: row.get(3)?,
        description: row.get(4)?,
        tags: serde_json::from_str(&tags).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn row_to_edge(row: &rusqlite::Row<'_>) -> Result<Edge, rusqlite::Error> {
    let edge_type: String = row.get(2)?;
    Ok(Edge {
        source: row.get(0)?,
        target: row.get(1)?,
        edge_type: parse_column(2, &edge_type)?,
        created_at: row.get(3)?,
        deleted_at: row.get(4)?,
    })
}

fn parse_column<T>(idx: usize, raw: &str) -> Result<T, rusqlite::Error>
where
    T: FromStr<Err = LineageError>,
{
    raw.parse().map_err(|e: LineageError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
