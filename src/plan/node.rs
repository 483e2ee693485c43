//! Winning-plan tree as returned by the database planner
//!
//! The planner nests children either under `inputStage` (single child) or
//! `inputStages` (multiple children). Both shapes are normalized at parse
//! time into one ordered `children` sequence: `inputStages` first, then
//! `inputStage` appended at the end.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Planner stage tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Full collection scan
    CollectionScan,
    /// In-memory sort without index support
    Sort,
    /// Index scan
    IndexScan,
    /// Document fetch by record id
    Fetch,
    /// Result limit
    Limit,
    /// Result skip
    Skip,
    /// Projection (any of the planner's projection variants)
    Projection(String),
    /// Sort key generation (child of an in-memory sort)
    SortKeyGenerator,
    /// Primary key lookup fast path
    IdHack,
    /// Count answered from an index
    CountScan,
    /// Planner proved the result empty
    Eof,
    /// Any tag this crate does not interpret
    Other(String),
}

impl Stage {
    /// Parses a planner stage tag
    pub fn parse(tag: &str) -> Self {
        match tag {
            "COLLSCAN" => Stage::CollectionScan,
            "SORT" => Stage::Sort,
            "IXSCAN" => Stage::IndexScan,
            "FETCH" => Stage::Fetch,
            "LIMIT" => Stage::Limit,
            "SKIP" => Stage::Skip,
            "SORT_KEY_GENERATOR" => Stage::SortKeyGenerator,
            "IDHACK" => Stage::IdHack,
            "COUNT_SCAN" => Stage::CountScan,
            "EOF" => Stage::Eof,
            t if t.starts_with("PROJECTION") => Stage::Projection(t.to_string()),
            t => Stage::Other(t.to_string()),
        }
    }

    /// Returns the planner tag verbatim
    pub fn as_str(&self) -> &str {
        match self {
            Stage::CollectionScan => "COLLSCAN",
            Stage::Sort => "SORT",
            Stage::IndexScan => "IXSCAN",
            Stage::Fetch => "FETCH",
            Stage::Limit => "LIMIT",
            Stage::Skip => "SKIP",
            Stage::SortKeyGenerator => "SORT_KEY_GENERATOR",
            Stage::IdHack => "IDHACK",
            Stage::CountScan => "COUNT_SCAN",
            Stage::Eof => "EOF",
            Stage::Projection(tag) | Stage::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a winning plan. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanNode {
    stage: Stage,
    filter: Option<Value>,
    sort_pattern: Option<Value>,
    children: Vec<PlanNode>,
    details: Map<String, Value>,
}

impl PlanNode {
    /// Creates a leaf node
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            filter: None,
            sort_pattern: None,
            children: Vec::new(),
            details: Map::new(),
        }
    }

    /// Sets the scan filter
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the sort pattern
    pub fn with_sort_pattern(mut self, pattern: Value) -> Self {
        self.sort_pattern = Some(pattern);
        self
    }

    /// Appends a child stage
    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    /// Adds an uninterpreted planner field
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Parses a plan node from planner JSON
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn filter(&self) -> Option<&Value> {
        self.filter.as_ref()
    }

    pub fn sort_pattern(&self) -> Option<&Value> {
        self.sort_pattern.as_ref()
    }

    /// Child stages in evaluation order
    pub fn children(&self) -> &[PlanNode] {
        &self.children
    }

    /// Planner fields not interpreted by the guard (e.g. `indexName`)
    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    /// Nodes in pre-order, paired with their depth
    pub fn walk(&self) -> Vec<(usize, &PlanNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

/// Wire shape of a planner node
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlanNode {
    stage: String,
    #[serde(default)]
    filter: Option<Value>,
    #[serde(default)]
    sort_pattern: Option<Value>,
    #[serde(default)]
    input_stage: Option<Box<RawPlanNode>>,
    #[serde(default)]
    input_stages: Vec<RawPlanNode>,
    #[serde(flatten)]
    details: Map<String, Value>,
}

impl From<RawPlanNode> for PlanNode {
    fn from(raw: RawPlanNode) -> Self {
        let mut children: Vec<PlanNode> = raw.input_stages.into_iter().map(Into::into).collect();
        if let Some(single) = raw.input_stage {
            children.push((*single).into());
        }

        Self {
            stage: Stage::parse(&raw.stage),
            filter: raw.filter,
            sort_pattern: raw.sort_pattern,
            children,
            details: raw.details,
        }
    }
}

impl<'de> Deserialize<'de> for PlanNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawPlanNode::deserialize(deserializer).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_tags_round_trip() {
        for tag in ["COLLSCAN", "SORT", "IXSCAN", "FETCH", "LIMIT", "EOF", "IDHACK"] {
            assert_eq!(Stage::parse(tag).as_str(), tag);
        }
        assert_eq!(
            Stage::parse("PROJECTION_SIMPLE"),
            Stage::Projection("PROJECTION_SIMPLE".into())
        );
        assert_eq!(Stage::parse("SHARD_MERGE"), Stage::Other("SHARD_MERGE".into()));
    }

    #[test]
    fn test_single_child_shape_is_normalized() {
        let node = PlanNode::from_value(json!({
            "stage": "FETCH",
            "inputStage": { "stage": "IXSCAN", "indexName": "key1_1" }
        }))
        .unwrap();

        assert_eq!(node.stage(), &Stage::Fetch);
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].stage(), &Stage::IndexScan);
        assert_eq!(node.children()[0].details()["indexName"], "key1_1");
    }

    #[test]
    fn test_single_child_appended_after_multi_child() {
        let node = PlanNode::from_value(json!({
            "stage": "OR",
            "inputStages": [{ "stage": "IXSCAN" }, { "stage": "FETCH" }],
            "inputStage": { "stage": "COLLSCAN", "filter": { "a": 1 } }
        }))
        .unwrap();

        let stages: Vec<&str> = node.children().iter().map(|c| c.stage().as_str()).collect();
        assert_eq!(stages, vec!["IXSCAN", "FETCH", "COLLSCAN"]);
    }

    #[test]
    fn test_leaf_has_empty_children() {
        let node = PlanNode::from_value(json!({ "stage": "EOF" })).unwrap();
        assert!(node.children().is_empty());
        assert!(node.filter().is_none());
    }

    #[test]
    fn test_missing_stage_is_rejected() {
        assert!(PlanNode::from_value(json!({ "inputStages": [] })).is_err());
    }

    #[test]
    fn test_walk_is_pre_order() {
        let tree = PlanNode::new(Stage::Limit)
            .with_child(
                PlanNode::new(Stage::Fetch).with_child(PlanNode::new(Stage::IndexScan)),
            )
            .with_child(PlanNode::new(Stage::Eof));

        let visited: Vec<(usize, &str)> = tree
            .walk()
            .into_iter()
            .map(|(depth, n)| (depth, n.stage().as_str()))
            .collect();
        assert_eq!(
            visited,
            vec![(0, "LIMIT"), (1, "FETCH"), (2, "IXSCAN"), (1, "EOF")]
        );
    }
}
