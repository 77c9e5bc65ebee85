//! Workflow tool definitions and handlers.

pub mod common;
pub mod execution;
pub mod history;
pub mod inputs;
pub mod manifest;
pub mod orchestration;
pub mod types;

pub use execution::{preview_rendered, run_with_task_capability_guard, step_plan};
pub use history::purge_workflow_history;
pub use inputs::{preview_inputs, resolve_inputs};
pub use manifest::{
    delete_workflow, export_workflow, get_workflow, import_workflow, list_workflows, rename_workflow, save_workflow, validate_workflow,
};
pub use orchestration::{author_and_run, repair_and_rerun};
