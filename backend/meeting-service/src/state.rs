use crate::services::MeetingService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub meetings: Arc<MeetingService>,
}

impl AppState {
    pub fn new(meetings: MeetingService) -> Self {
        Self {
            meetings: Arc::new(meetings),
        }
    }
}
