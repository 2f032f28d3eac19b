use std::sync::Arc;

use crate::{entitlement::EntitlementGate, services::orchestrator::RecommendationOrchestrator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RecommendationOrchestrator>,
    pub gate: Arc<EntitlementGate>,
}
