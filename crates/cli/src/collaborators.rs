//! Demo collaborator implementations.
//!
//! The core forwards completed workouts and profile payloads to these
//! collaborators without interpreting them; real deployments supply their
//! own `WorkoutStore`/`ProfileStore` implementations.

use std::path::PathBuf;

use chrono::Utc;
use contracts::{ContractError, ProfileStore, WorkoutStore, WorkoutSummary};
use tracing::{debug, info};

/// Writes each completed workout as a timestamped JSON file
pub struct JsonWorkoutStore {
    output_dir: PathBuf,
}

impl JsonWorkoutStore {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

impl WorkoutStore for JsonWorkoutStore {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn store_workout(&mut self, summary: &WorkoutSummary) -> Result<(), ContractError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                ContractError::store_write(
                    "json_file",
                    format!("create {}: {}", self.output_dir.display(), e),
                )
            })?;

        let filename = format!("workout_{}.json", Utc::now().format("%Y%m%d_%H%M%S%3f"));
        let path = self.output_dir.join(filename);

        let body = serde_json::to_vec_pretty(summary).map_err(|e| {
            ContractError::store_write("json_file", format!("serialize summary: {}", e))
        })?;

        tokio::fs::write(&path, body).await.map_err(|e| {
            ContractError::store_write("json_file", format!("write {}: {}", path.display(), e))
        })?;

        info!(
            path = %path.display(),
            total_calories = summary.total_calories,
            "Workout summary written"
        );
        Ok(())
    }
}

/// Logs synced profile fields without persisting them
#[derive(Default)]
pub struct LoggingProfileStore;

impl ProfileStore for LoggingProfileStore {
    fn name(&self) -> &str {
        "logging"
    }

    async fn apply_profile(
        &mut self,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), ContractError> {
        for (key, value) in fields {
            debug!(field = %key, value = %value, "Profile field synced");
        }
        info!(fields = fields.len(), "Profile sync applied");
        Ok(())
    }
}
