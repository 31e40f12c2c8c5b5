//! Generation settings passed to the reasoning capability.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Settings controlling a reasoning call.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub seed: Option<u64>,
    pub user: Option<String>,
}
