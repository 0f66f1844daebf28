use std::sync::Arc;

use crate::application::services::CallBatchService;
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub call_batch_service: Arc<CallBatchService>,
    pub settings: Settings,
}
