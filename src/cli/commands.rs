//! CLI command implementations
//!
//! Commands are offline: they classify explain output captured elsewhere,
//! or evaluate the interception rules for a query against a config file.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::GuardConfig;
use crate::explain::winning_plan;
use crate::guard::requires_check;
use crate::observability::{log_event, Event};
use crate::plan::{classify, PlanNode, PlanReport};
use crate::query::QueryDescriptor;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_json, write_json, write_text};

/// Main entry point for CLI
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Classify { plan } => classify_plan(&plan),
        Command::Report { plan } => report(&plan),
        Command::Check { config, query } => check(config.as_deref(), &query),
    }
}

/// Classify explain output and print a JSON verdict.
///
/// A rejected plan prints its verdict and then fails the command.
pub fn classify_plan(path: &Path) -> CliResult<()> {
    let plan = plan_from_input(read_json(path)?)?;
    let verdict = verdict(&plan);
    write_json(&verdict)?;

    match classify(&plan) {
        Ok(()) => Ok(()),
        Err(err) => Err(CliError::plan_rejected(err.to_string())),
    }
}

/// Print the textual plan report
pub fn report(path: &Path) -> CliResult<()> {
    let plan = plan_from_input(read_json(path)?)?;
    write_text(&PlanReport::from_plan(&plan).to_string())
}

/// Print whether a query would be intercepted under the given config
pub fn check(config_path: Option<&Path>, query_path: &Path) -> CliResult<()> {
    let config = match config_path {
        Some(path) => {
            let config = GuardConfig::load(path)?;
            log_event(
                Event::ConfigLoaded,
                &[("path", path.display().to_string().as_str())],
            );
            config
        }
        None => GuardConfig::default(),
    };

    let query: QueryDescriptor = serde_json::from_value(read_json(query_path)?)?;
    write_json(&check_result(&config, &query))
}

/// Interception decision for one query
pub fn check_result(config: &GuardConfig, query: &QueryDescriptor) -> Value {
    let guarded = config.guards(query.operation);
    let needs_check = requires_check(query, &config.primary_key);

    json!({
        "model": query.model.as_str(),
        "operation": query.operation.as_str(),
        "guarded_operation": guarded,
        "requires_check": needs_check,
        "intercept": guarded && needs_check,
        "replay": query.replay_hint(),
    })
}

/// JSON verdict for a plan
pub fn verdict(plan: &PlanNode) -> Value {
    match classify(plan) {
        Ok(()) => json!({
            "accepted": true,
            "stage": plan.stage().as_str(),
        }),
        Err(err) => json!({
            "accepted": false,
            "stage": plan.stage().as_str(),
            "kind": err.kind(),
            "code": err.code(),
            "rejected_stage": err.stage_name(),
            "message": err.to_string(),
        }),
    }
}

/// Accepts a list of explain records, a single record, or a bare plan node
pub fn plan_from_input(input: Value) -> CliResult<PlanNode> {
    match input {
        Value::Array(records) => Ok(winning_plan(records)?),
        Value::Object(_) if input.get("stage").is_some() => Ok(PlanNode::from_value(input)?),
        Value::Object(_) => Ok(winning_plan(vec![input])?),
        _ => Err(CliError::invalid_input(
            "Expected explain records, an explain record or a plan object",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use crate::query::QueryOperation;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_json(value: &Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    #[test]
    fn test_plan_from_record_list() {
        let plan = plan_from_input(json!([
            { "queryPlanner": { "winningPlan": { "stage": "COLLSCAN" } } }
        ]))
        .unwrap();
        assert_eq!(plan.stage().as_str(), "COLLSCAN");
    }

    #[test]
    fn test_plan_from_single_record_and_bare_plan() {
        let record = plan_from_input(json!({ "winningPlan": { "stage": "IXSCAN" } })).unwrap();
        assert_eq!(record.stage().as_str(), "IXSCAN");

        let bare = plan_from_input(json!({ "stage": "FETCH" })).unwrap();
        assert_eq!(bare.stage().as_str(), "FETCH");
    }

    #[test]
    fn test_plan_from_invalid_input() {
        let err = plan_from_input(json!("COLLSCAN")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidInput);

        let err = plan_from_input(json!([])).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidInput);
    }

    #[test]
    fn test_verdict_rejected() {
        let plan = PlanNode::from_value(json!({
            "stage": "FETCH",
            "inputStage": { "stage": "SORT", "sortPattern": { "key3": -1 } }
        }))
        .unwrap();

        let v = verdict(&plan);
        assert_eq!(v["accepted"], false);
        assert_eq!(v["rejected_stage"], "SORT");
        assert_eq!(v["kind"], "ExplainError");
        assert_eq!(v["message"], r#"Abnormal stage [SORT]. SortPattern is {"key3":-1}"#);
    }

    #[test]
    fn test_classify_command_fails_on_rejection() {
        let file = temp_json(&json!({ "stage": "COLLSCAN", "filter": { "a": 1 } }));
        let err = classify_plan(file.path()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::PlanRejected);

        let file = temp_json(&json!({ "stage": "IXSCAN" }));
        assert!(classify_plan(file.path()).is_ok());
    }

    #[test]
    fn test_check_result() {
        let config = GuardConfig::default();

        let trivial = QueryDescriptor::new("users", QueryOperation::FindOne)
            .with_condition("_id", json!(1));
        let result = check_result(&config, &trivial);
        assert_eq!(result["intercept"], false);
        assert_eq!(result["guarded_operation"], true);

        let filtered = QueryDescriptor::new("users", QueryOperation::Find)
            .with_condition("email", json!("a@b.c"));
        let result = check_result(&config, &filtered);
        assert_eq!(result["intercept"], true);
        assert_eq!(result["replay"], r#"users.find({"email":"a@b.c"}, {})"#);

        let result = check_result(&GuardConfig::disabled(), &filtered);
        assert_eq!(result["intercept"], false);
        assert_eq!(result["requires_check"], true);
    }

    #[test]
    fn test_check_command_with_missing_config() {
        let query = temp_json(&json!({ "model": "users", "operation": "find" }));
        let err = check(Some(Path::new("/nonexistent/guard.json")), query.path()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
