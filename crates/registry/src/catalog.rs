use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

use commandeer_types::{Command, Resource};
use indexmap::IndexMap;

use crate::RegistryError;

const CATALOG_EXTENSION: &str = "yaml";

/// The immutable in-memory catalog: resources keyed by name, iterated in
/// sorted-name order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: IndexMap<String, Resource>,
}

impl Catalog {
    /// Loads every `.yaml` file in `dir`, one resource per file.
    ///
    /// Files are parsed on worker threads and collected over a rendezvous
    /// channel; a file that fails to read or decode is logged and skipped,
    /// as is a resource whose dependency declarations are malformed. An
    /// empty result is an error: the dashboard has nothing to show.
    pub fn load(dir: &Path) -> Result<Self, RegistryError> {
        let entries = std::fs::read_dir(dir).map_err(|source| RegistryError::ConfigDirUnreadable {
            dir: dir.to_path_buf(),
            source,
        })?;

        let files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == CATALOG_EXTENSION))
            .collect();

        let (sender, receiver) = mpsc::channel::<Option<Resource>>();
        thread::scope(|scope| {
            for file in &files {
                let sender = sender.clone();
                scope.spawn(move || {
                    let _ = sender.send(parse_catalog_file(file));
                });
            }
        });
        drop(sender);

        let mut resources = IndexMap::new();
        for resource in receiver.into_iter().flatten() {
            if let Err(defect) = validate_resource(&resource) {
                tracing::error!(resource = %resource.name, %defect, "skipping resource with malformed dependency declarations");
                continue;
            }
            tracing::debug!(resource = %resource.name, commands = resource.commands.len(), "loaded resource");
            resources.insert(resource.name.clone(), resource);
        }
        resources.sort_keys();

        if resources.is_empty() {
            return Err(RegistryError::EmptyCatalog { dir: dir.to_path_buf() });
        }
        tracing::debug!(count = resources.len(), "catalog ready");
        Ok(Self { resources })
    }

    /// Builds a catalog from already-constructed resources. Used by tests
    /// and by callers that assemble resources programmatically.
    pub fn from_resources(list: Vec<Resource>) -> Self {
        let mut resources: IndexMap<String, Resource> = list.into_iter().map(|r| (r.name.clone(), r)).collect();
        resources.sort_keys();
        Self { resources }
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource names in sorted order.
    pub fn resource_names(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    pub fn resource(&self, name: &str) -> Result<&Resource, RegistryError> {
        self.resources.get(name).ok_or_else(|| RegistryError::ResourceNotFound { name: name.to_string() })
    }

    /// Looks up a command within a resource; absence is a recoverable
    /// `CommandNotFound`, fatal only to the triggering operation.
    pub fn command(&self, resource: &str, name: &str) -> Result<&Command, RegistryError> {
        self.resource(resource)?
            .command(name)
            .ok_or_else(|| RegistryError::CommandNotFound {
                resource: resource.to_string(),
                name: name.to_string(),
            })
    }
}

/// Default location of catalog files: `./configurations` when present,
/// otherwise `<user config dir>/commandeer/configurations`.
pub fn default_config_dir() -> PathBuf {
    let local = PathBuf::from("./configurations");
    if local.is_dir() {
        return local;
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("commandeer")
        .join("configurations")
}

fn parse_catalog_file(path: &Path) -> Option<Resource> {
    tracing::debug!(file = %path.display(), "loading catalog file");
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::error!(file = %path.display(), error = %err, "cannot read catalog file");
            return None;
        }
    };
    match serde_yaml::from_str::<Resource>(&content) {
        Ok(resource) => Some(resource),
        Err(err) => {
            tracing::error!(file = %path.display(), error = %err, "cannot decode catalog file");
            None
        }
    }
}

/// Checks that every `depends_on` and `defaultCommand` edge names a command
/// in the same resource and that no chain of those edges forms a cycle.
fn validate_resource(resource: &Resource) -> Result<(), String> {
    for command in &resource.commands {
        for target in [command.depends_on.as_deref(), command.default_command.as_deref()].into_iter().flatten() {
            if resource.command(target).is_none() {
                return Err(format!("command '{}' references unknown command '{}'", command.name, target));
            }
        }
        walk_chain(resource, command, |c| c.depends_on.as_deref())?;
        walk_chain(resource, command, |c| c.default_command.as_deref())?;
    }
    if let Some(default) = resource.default_command.as_deref()
        && resource.command(default).is_none()
    {
        return Err(format!("default command '{default}' does not exist"));
    }
    Ok(())
}

fn walk_chain<'a>(resource: &'a Resource, start: &'a Command, next: impl Fn(&'a Command) -> Option<&'a str>) -> Result<(), String> {
    let mut visited = HashSet::new();
    let mut current = start;
    visited.insert(current.name.as_str());
    while let Some(target) = next(current) {
        if !visited.insert(target) {
            return Err(format!("cycle through command '{target}'"));
        }
        match resource.command(target) {
            Some(command) => current = command,
            None => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).expect("create catalog file");
        file.write_all(content.as_bytes()).expect("write catalog file");
    }

    const S3_YAML: &str = r#"
name: s3
commands:
  - name: list-buckets
    resourceName: bucket
    parse:
      type: object
      attributeName: Buckets
"#;

    const SQS_YAML: &str = r#"
name: sqs
commands:
  - name: list-queues
    resourceName: queue
    parse:
      type: list
      attributeName: QueueUrls
"#;

    #[test]
    fn loads_every_yaml_file_in_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "s3.yaml", S3_YAML);
        write_file(dir.path(), "sqs.yaml", SQS_YAML);
        write_file(dir.path(), "notes.txt", "not a catalog");

        let catalog = Catalog::load(dir.path()).expect("load catalog");
        assert_eq!(catalog.resource_names(), vec!["s3".to_string(), "sqs".to_string()]);
        assert!(catalog.command("sqs", "list-queues").is_ok());
    }

    #[test]
    fn malformed_file_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "s3.yaml", S3_YAML);
        write_file(dir.path(), "broken.yaml", "name: [unclosed");

        let catalog = Catalog::load(dir.path()).expect("load catalog");
        assert_eq!(catalog.resource_names(), vec!["s3".to_string()]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Catalog::load(dir.path()).expect_err("empty catalog should fail");
        assert!(matches!(err, RegistryError::EmptyCatalog { .. }));
    }

    #[test]
    fn command_lookup_failure_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "s3.yaml", S3_YAML);
        let catalog = Catalog::load(dir.path()).expect("load catalog");

        let err = catalog.command("s3", "nope").expect_err("lookup should fail");
        assert!(matches!(err, RegistryError::CommandNotFound { .. }));
        let err = catalog.resource("kinesis").expect_err("lookup should fail");
        assert!(matches!(err, RegistryError::ResourceNotFound { .. }));
    }

    #[test]
    fn dependency_cycle_drops_resource() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "s3.yaml", S3_YAML);
        write_file(
            dir.path(),
            "loop.yaml",
            r#"
name: loop
commands:
  - name: a
    depends_on: b
    parse:
      type: object
      attributeName: X
  - name: b
    depends_on: a
    parse:
      type: object
      attributeName: X
"#,
        );

        let catalog = Catalog::load(dir.path()).expect("load catalog");
        assert_eq!(catalog.resource_names(), vec!["s3".to_string()]);
    }

    #[test]
    fn unknown_dependency_target_drops_resource() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "s3.yaml", S3_YAML);
        write_file(
            dir.path(),
            "dangling.yaml",
            r#"
name: dangling
commands:
  - name: child
    depends_on: missing-parent
    parse:
      type: object
      attributeName: X
"#,
        );

        let catalog = Catalog::load(dir.path()).expect("load catalog");
        assert_eq!(catalog.resource_names(), vec!["s3".to_string()]);
    }
}
