//! Target system clients.

pub mod grafana;
pub mod install;
pub mod traits;
pub mod zabbix;

pub use grafana::{dashboard_uid, GrafanaClient};
pub use install::ScriptInstaller;
pub use traits::{ApplyOutcome, ArtifactTarget};
pub use zabbix::ZabbixClient;

#[cfg(test)]
pub use traits::MockArtifactTarget;
