//! Collaborator traits - external storage/profile seams
//!
//! The core forwards completed workouts and profile payloads to these
//! collaborators; it never interprets their contents.

use crate::{ContractError, WorkoutSummary};

/// Workout storage collaborator
#[trait_variant::make(WorkoutStore: Send)]
pub trait LocalWorkoutStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist a completed workout summary
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn store_workout(&mut self, summary: &WorkoutSummary) -> Result<(), ContractError>;
}

/// User-profile collaborator
#[trait_variant::make(ProfileStore: Send)]
pub trait LocalProfileStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Apply synced profile fields
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn apply_profile(
        &mut self,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), ContractError>;
}
