/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - gate: gateway trust check, storage: StorageService
 * - Clone 前提で持つ (内部は Arc)
 * - Everything here is built once at startup and never mutated afterwards
 */
use std::sync::Arc;

use crate::services::{auth::GatewayGate, storage::StorageService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<GatewayGate>,
    pub storage: Arc<StorageService>,
}

impl AppState {
    pub fn new(gate: Arc<GatewayGate>, storage: Arc<StorageService>) -> Self {
        Self { gate, storage }
    }
}
