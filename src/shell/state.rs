use crate::adapters::in_memory::recorded_alerts::RecordedAlerts;
use crate::application::dispatch::StoreDispatcher;
use crate::core::ports::Authenticator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<StoreDispatcher>,
    pub authenticator: Arc<dyn Authenticator>,
    pub alerts: Arc<RecordedAlerts>,
}
