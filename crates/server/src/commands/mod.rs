//! CLI command handlers for the monsync application.

mod check_config;
mod plan;
mod run;

pub(crate) use check_config::handle_check_config_command;
pub(crate) use plan::handle_plan_command;
pub(crate) use run::handle_run_command;
