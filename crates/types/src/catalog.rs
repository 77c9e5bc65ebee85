//! Declarative catalog model.
//!
//! A catalog is a set of resources, each owning an ordered list of commands.
//! The structures here deserialize directly from the YAML files a user drops
//! into the configuration directory; field names keep the catalog format's
//! spelling via serde renames.

use serde::{Deserialize, Serialize};

/// A named category of commands, the top-level catalog entry.
///
/// Constructed once at load time and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    /// Command auto-run when the resource is entered, if any.
    #[serde(default, rename = "defaultCommand", skip_serializing_if = "Option::is_none")]
    pub default_command: Option<String>,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Resource {
    /// Looks up a command by name, preserving catalog order semantics.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// The names of all commands, in catalog order.
    pub fn command_names(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.name.clone()).collect()
    }

    /// Every command declaring `depends_on` the given command, in catalog order.
    pub fn dependents_of(&self, command_name: &str) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| c.depends_on.as_deref() == Some(command_name))
            .collect()
    }
}

/// One declarative external invocation recipe: an argument template plus
/// output-parsing, dependency, and pagination metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    /// Logical name of the thing a row of this command's output represents;
    /// uppercased to form the placeholder key dependent commands substitute.
    #[serde(default, rename = "resourceName")]
    pub resource_name: String,
    /// Command chained to automatically when a row of this command is selected.
    #[serde(default, rename = "defaultCommand", skip_serializing_if = "Option::is_none")]
    pub default_command: Option<String>,
    /// Name of the command this one is a drill-down of; `None` = independent.
    #[serde(default, rename = "depends_on", skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub view: ViewKind,
    #[serde(default)]
    pub parse: ParseSpec,
    /// Prompt the user for key values before executing (query-style commands).
    #[serde(default, rename = "requiresKeyInput")]
    pub requires_key_input: bool,
    /// Row payloads are kept for tree inspection.
    #[serde(default, rename = "showJsonViewer")]
    pub show_json_viewer: bool,
    /// Never reuse a cached result when navigating back to this command.
    #[serde(default, rename = "rerunOnBack")]
    pub rerun_on_back: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl Command {
    /// True when the command declares usable pagination.
    pub fn is_paginated(&self) -> bool {
        self.pagination.as_ref().is_some_and(|p| p.enabled)
    }
}

/// How a command's raw output is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    #[default]
    #[serde(rename = "tableView")]
    Table,
}

/// Output-parsing descriptor: which attribute of the structured output to
/// read and how to shape it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseSpec {
    #[serde(default, rename = "type")]
    pub kind: ParseKind,
    #[serde(default, rename = "attributeName")]
    pub attribute_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseKind {
    /// Collection of objects; field names become columns.
    #[default]
    Object,
    /// Collection of scalars; single-column rows.
    List,
    /// Index/key discovery over a table schema description.
    Keys,
}

/// Cursor-based pagination descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub enabled: bool,
    /// Argument flag carrying the cursor, e.g. `--starting-token`.
    #[serde(default, rename = "nextTokenParam")]
    pub next_token_param: String,
    /// Top-level attribute holding the next cursor, e.g. `NextToken`.
    #[serde(default, rename = "nextTokenJsonPath")]
    pub next_token_json_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET_YAML: &str = r#"
name: s3
defaultCommand: list-buckets
commands:
  - name: list-buckets
    resourceName: bucket
    view: tableView
    parse:
      type: object
      attributeName: Buckets
  - name: list-objects
    resourceName: object
    depends_on: list-buckets
    arguments: ["--bucket", "$BUCKET"]
    view: tableView
    parse:
      type: object
      attributeName: Contents
    pagination:
      enabled: true
      nextTokenParam: "--starting-token"
      nextTokenJsonPath: NextToken
  - name: get-bucket-policy
    resourceName: bucket
    depends_on: list-buckets
    view: tableView
    parse:
      type: object
      attributeName: Policy
"#;

    #[test]
    fn resource_deserializes_from_catalog_yaml() {
        let resource: Resource = serde_yaml::from_str(BUCKET_YAML).expect("parse resource yaml");
        assert_eq!(resource.name, "s3");
        assert_eq!(resource.default_command.as_deref(), Some("list-buckets"));
        assert_eq!(resource.commands.len(), 3);

        let objects = resource.command("list-objects").expect("command exists");
        assert_eq!(objects.depends_on.as_deref(), Some("list-buckets"));
        assert!(objects.is_paginated());
        assert_eq!(objects.pagination.as_ref().unwrap().next_token_param, "--starting-token");
        assert_eq!(objects.parse.kind, ParseKind::Object);
    }

    #[test]
    fn dependents_preserve_catalog_order() {
        let resource: Resource = serde_yaml::from_str(BUCKET_YAML).expect("parse resource yaml");
        let dependents = resource.dependents_of("list-buckets");
        let names: Vec<&str> = dependents.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["list-objects", "get-bucket-policy"]);
    }

    #[test]
    fn unknown_command_lookup_is_none() {
        let resource: Resource = serde_yaml::from_str(BUCKET_YAML).expect("parse resource yaml");
        assert!(resource.command("does-not-exist").is_none());
    }
}
