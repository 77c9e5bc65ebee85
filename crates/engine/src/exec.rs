//! Command execution: argument assembly, placeholder substitution,
//! pagination-token extraction, and the hand-off to the parsing engine.

use std::time::Instant;

use commandeer_types::{Command, ParsedOutput, is_placeholder};
use indexmap::IndexMap;
use serde_json::Value;

use crate::{parse, process::CommandRunner};

/// The external program every catalog command is routed through.
pub const PROGRAM: &str = "aws";

/// Selected-item bindings: placeholder key to the text the user selected
/// from a prior result row.
pub type Bindings = IndexMap<String, String>;

/// The outcome of one command execution.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Raw combined output of the external program.
    pub raw: String,
    /// Normalized tabular result.
    pub parsed: ParsedOutput,
    /// Cursor for the page after this one; empty = no further pages.
    pub next_token: String,
}

/// Runs one catalog command for `resource` under `profile`.
///
/// The declared argument list is never mutated: substitution happens on a
/// per-invocation copy, so the catalog stays reusable across repeated
/// invocations with different bindings. `extra_args` carries synthesized
/// query parameters; `cursor` (when non-empty, on a paginated command)
/// appends the declared cursor flag.
pub fn execute(
    runner: &dyn CommandRunner,
    command: &Command,
    resource: &str,
    profile: &str,
    bindings: &Bindings,
    extra_args: &[String],
    cursor: &str,
) -> Execution {
    let args = build_args(command, resource, profile, bindings, extra_args, cursor);
    tracing::debug!(command = %command.name, "running: {} {}", PROGRAM, args.join(" "));

    let started = Instant::now();
    let raw = runner.run(PROGRAM, &args);
    tracing::debug!(command = %command.name, elapsed_ms = started.elapsed().as_millis() as u64, "execution finished");

    let next_token = extract_next_token(&raw, command);
    let parsed = parse::parse(command, &raw);
    Execution { raw, parsed, next_token }
}

fn build_args(command: &Command, resource: &str, profile: &str, bindings: &Bindings, extra_args: &[String], cursor: &str) -> Vec<String> {
    let mut args = vec![
        resource.to_string(),
        command.name.clone(),
        "--profile".to_string(),
        profile.to_string(),
    ];
    for argument in &command.arguments {
        if is_placeholder(argument) {
            // Unknown placeholders resolve to empty, never to the literal token.
            args.push(bindings.get(argument).cloned().unwrap_or_default());
        } else {
            args.push(argument.clone());
        }
    }
    args.extend_from_slice(extra_args);

    if !cursor.is_empty()
        && let Some(pagination) = command.pagination.as_ref().filter(|p| p.enabled)
        && !pagination.next_token_param.is_empty()
    {
        args.push(pagination.next_token_param.clone());
        args.push(cursor.to_string());
    }
    args
}

/// Extracts the next-page cursor from raw output via the command's declared
/// JSON path. A string token is used verbatim; a composite token is
/// re-serialized to compact text; absence, null, or undecodable output
/// yields the empty token ("no further pages").
pub fn extract_next_token(raw: &str, command: &Command) -> String {
    let Some(pagination) = command.pagination.as_ref().filter(|p| p.enabled) else {
        return String::new();
    };
    if pagination.next_token_json_path.is_empty() {
        // Token-less pagination, e.g. a queue receive that pages by consuming.
        return String::new();
    }

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(command = %command.name, error = %err, "cannot decode output for cursor extraction");
            return String::new();
        }
    };
    match value.get(&pagination.next_token_json_path) {
        Some(Value::String(token)) => token.clone(),
        Some(Value::Null) | None => String::new(),
        Some(composite) => serde_json::to_string(composite).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commandeer_types::{Pagination, ParseKind, ParseSpec};
    use std::sync::Mutex;

    fn paginated_command() -> Command {
        Command {
            name: "scan".into(),
            resource_name: "table".into(),
            arguments: vec!["--table-name".into(), "$TABLE".into(), "--max-items".into(), "25".into()],
            parse: ParseSpec {
                kind: ParseKind::Object,
                attribute_name: "Items".into(),
            },
            pagination: Some(Pagination {
                enabled: true,
                next_token_param: "--starting-token".into(),
                next_token_json_path: "NextToken".into(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn placeholders_substitute_from_bindings() {
        let command = paginated_command();
        let mut bindings = Bindings::new();
        bindings.insert("$TABLE".into(), "orders".into());

        let captured: Mutex<Vec<String>> = Mutex::new(vec![]);
        let runner = |_: &str, args: &[String]| {
            *captured.lock().unwrap() = args.to_vec();
            "{}".to_string()
        };
        execute(&runner, &command, "dynamodb", "dev", &bindings, &[], "");

        let args = captured.lock().unwrap().clone();
        assert_eq!(
            args,
            vec!["dynamodb", "scan", "--profile", "dev", "--table-name", "orders", "--max-items", "25"]
        );
    }

    #[test]
    fn unbound_placeholder_becomes_empty_string() {
        let command = paginated_command();
        let captured: Mutex<Vec<String>> = Mutex::new(vec![]);
        let runner = |_: &str, args: &[String]| {
            *captured.lock().unwrap() = args.to_vec();
            "{}".to_string()
        };
        execute(&runner, &command, "dynamodb", "dev", &Bindings::new(), &[], "");

        let args = captured.lock().unwrap().clone();
        assert_eq!(args[5], "");
        assert!(!args.contains(&"$TABLE".to_string()));
    }

    #[test]
    fn declared_arguments_survive_execution() {
        let command = paginated_command();
        let mut bindings = Bindings::new();
        bindings.insert("$TABLE".into(), "orders".into());
        let runner = |_: &str, _: &[String]| "{}".to_string();
        execute(&runner, &command, "dynamodb", "dev", &bindings, &[], "");
        assert_eq!(command.arguments[1], "$TABLE");
    }

    #[test]
    fn cursor_appends_declared_flag() {
        let command = paginated_command();
        let captured: Mutex<Vec<String>> = Mutex::new(vec![]);
        let runner = |_: &str, args: &[String]| {
            *captured.lock().unwrap() = args.to_vec();
            "{}".to_string()
        };
        execute(&runner, &command, "dynamodb", "dev", &Bindings::new(), &[], "tok123");

        let args = captured.lock().unwrap().clone();
        assert_eq!(args[args.len() - 2..], ["--starting-token".to_string(), "tok123".to_string()]);
    }

    #[test]
    fn string_token_is_used_verbatim() {
        let command = paginated_command();
        let token = extract_next_token(r#"{"Items": [], "NextToken": "abc"}"#, &command);
        assert_eq!(token, "abc");
    }

    #[test]
    fn composite_token_is_reserialized() {
        let mut command = paginated_command();
        command.pagination.as_mut().unwrap().next_token_json_path = "LastEvaluatedKey".into();
        let token = extract_next_token(r#"{"Items": [], "LastEvaluatedKey": {"id": {"S": "42"}}}"#, &command);
        assert_eq!(token, r#"{"id":{"S":"42"}}"#);
    }

    #[test]
    fn missing_or_null_token_is_empty() {
        let command = paginated_command();
        assert_eq!(extract_next_token(r#"{"Items": []}"#, &command), "");
        assert_eq!(extract_next_token(r#"{"Items": [], "NextToken": null}"#, &command), "");
        assert_eq!(extract_next_token("not json", &command), "");
    }
}
