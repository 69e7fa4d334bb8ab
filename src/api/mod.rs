//! Wire schemas shared by the page server, the fetchers, the stores and the CLI.

pub mod output;
pub mod projects;
pub mod realtime;

pub use output::{ConfigInitOutput, MarkOutput, PageOutput, ServingOutput, StatusOutput};
pub use projects::{Project, ProjectsResponse};
pub use realtime::{Ingested, StoreRecord, StoreSnapshot, ingest_snapshot};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
