// Payments page application state
// Plain serializable data; the page renders it, storage persists it

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentsState {
    pub rewards_enabled: bool,
    pub pending_contributions: Vec<PendingContribution>,
}

/// A contribution queued by the host until the publisher verifies
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PendingContribution {
    pub publisher_key: String,
    pub percentage: f64,
    pub verified: bool,
    pub excluded: i32,
    pub name: String,
    pub favicon_url: String,
    pub url: String,
    pub provider: String,
    pub amount: f64,
    pub added_date: u32,
    pub viewing_id: String,
    pub category: i32,
}

impl PaymentsState {
    /// Normalisation applied on every load and save
    pub fn clean(mut self) -> Self {
        self.pending_contributions
            .retain(|contribution| !contribution.publisher_key.is_empty());
        self
    }
}
