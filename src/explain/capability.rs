//! Explain capability: a derived sibling model that runs queries in
//! explain mode

use std::sync::Arc;

use serde_json::{Map, Value};

use super::errors::{ExecutionError, ExecutionResult};
use super::store::ExplainStore;
use crate::observability::{log_event, Event};
use crate::plan::PlanNode;
use crate::query::{ModelDescriptor, ModelIdentity, QueryDescriptor, SchemaDefinition};

/// Sibling model bound to the same collection as its source, registered
/// under `<prefix><identity>`
pub struct ExplainCapability {
    name: String,
    source: ModelIdentity,
    schema: SchemaDefinition,
    store: Arc<dyn ExplainStore>,
}

impl std::fmt::Debug for ExplainCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplainCapability")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

impl ExplainCapability {
    /// Clones the model's schema and registers the sibling with the store
    pub async fn build(
        model: &ModelDescriptor,
        prefix: &str,
        store: Arc<dyn ExplainStore>,
    ) -> ExecutionResult<Self> {
        let name = format!("{}{}", prefix, model.identity);
        let schema = model.schema.derive_for_explain();

        let reused = if store.has_model(&name).await? {
            true
        } else {
            match store.register_model(&name, &schema).await {
                Ok(()) => false,
                // Lost a registration race against another guard on the same store
                Err(err @ ExecutionError::Registration { .. }) => {
                    if store.has_model(&name).await? {
                        true
                    } else {
                        return Err(err);
                    }
                }
                Err(err) => return Err(err),
            }
        };

        log_event(
            Event::ExplainCapabilityBuilt,
            &[
                ("model", model.identity.as_str()),
                ("explain_model", name.as_str()),
                ("reused", if reused { "true" } else { "false" }),
            ],
        );

        Ok(Self {
            name,
            source: model.identity.clone(),
            schema,
            store,
        })
    }

    /// Registered name of the sibling model
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ModelIdentity {
        &self.source
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// Re-runs the query in explain mode and returns the winning plan
    pub async fn explain(&self, query: &QueryDescriptor) -> ExecutionResult<PlanNode> {
        let mut options = Map::new();
        options.insert("explain".to_string(), Value::Bool(true));
        options.extend(query.options.clone());

        let records = self
            .store
            .explain_find(&self.name, &query.conditions, &options)
            .await?;

        winning_plan(records)
    }
}

/// Extracts the first record's winning plan.
///
/// Accepts the server shape (`queryPlanner.winningPlan`) and the flattened
/// shape (`winningPlan`). Slot-based engine output nests the classic tree
/// under `winningPlan.queryPlan`.
pub fn winning_plan(records: Vec<Value>) -> ExecutionResult<PlanNode> {
    let mut record = records
        .into_iter()
        .next()
        .ok_or(ExecutionError::NoPlanRecords)?;

    let pointer = if record.get("queryPlanner").is_some() {
        "/queryPlanner/winningPlan"
    } else {
        "/winningPlan"
    };
    let plan = record
        .pointer_mut(pointer)
        .map(Value::take)
        .ok_or(ExecutionError::MissingWinningPlan)?;

    let plan = match plan {
        Value::Object(mut map) if !map.contains_key("stage") && map.contains_key("queryPlan") => {
            map.remove("queryPlan").unwrap_or(Value::Null)
        }
        other => other,
    };

    Ok(PlanNode::from_value(plan)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Stage;
    use serde_json::json;

    #[test]
    fn test_server_shape() {
        let plan = winning_plan(vec![json!({
            "queryPlanner": { "winningPlan": { "stage": "IXSCAN" }, "rejectedPlans": [] }
        })])
        .unwrap();
        assert_eq!(plan.stage(), &Stage::IndexScan);
    }

    #[test]
    fn test_flattened_shape_uses_first_record() {
        let plan = winning_plan(vec![
            json!({ "winningPlan": { "stage": "SORT", "sortPattern": { "a": 1 } } }),
            json!({ "winningPlan": { "stage": "IXSCAN" } }),
        ])
        .unwrap();
        assert_eq!(plan.stage(), &Stage::Sort);
    }

    #[test]
    fn test_slot_based_plan_unwrapped() {
        let plan = winning_plan(vec![json!({
            "queryPlanner": {
                "winningPlan": {
                    "queryPlan": { "stage": "COLLSCAN", "filter": {} },
                    "slotBasedPlan": { "slots": "..." }
                }
            }
        })])
        .unwrap();
        assert_eq!(plan.stage(), &Stage::CollectionScan);
    }

    #[test]
    fn test_empty_records() {
        assert_eq!(winning_plan(vec![]).unwrap_err(), ExecutionError::NoPlanRecords);
    }

    #[test]
    fn test_missing_winning_plan() {
        let err = winning_plan(vec![json!({ "queryPlanner": {} })]).unwrap_err();
        assert_eq!(err, ExecutionError::MissingWinningPlan);
    }

    #[test]
    fn test_malformed_plan_is_execution_error() {
        let err = winning_plan(vec![json!({ "winningPlan": { "inputStages": 3 } })]).unwrap_err();
        assert!(matches!(err, ExecutionError::MalformedPlan(_)));
    }
}
