// Composition root.
//
// Responsibilities
// - Read config from environment.
// - Instantiate the authenticator, the alert sink and the guarded remote file service.
// - Start on a detached cache and swap in a session cache on every login.

pub mod config;
pub mod graphql;
pub mod http;
pub mod state;

use crate::adapters::auth::static_token_authenticator::StaticTokenAuthenticator;
use crate::adapters::detached_remote_files::DetachedRemoteFiles;
use crate::adapters::directory::directory_remote_files::DirectoryRemoteFiles;
use crate::adapters::in_memory::recorded_alerts::RecordedAlerts;
use crate::adapters::permission_guard::PermissionGuard;
use crate::application::dispatch::{StoreAction, StoreDispatcher};
use crate::application::sync_cache::SyncCache;
use crate::core::ports::{Authenticator, RemoteFileService};
use crate::shell::config::AppConfig;
use crate::shell::state::AppState;
use std::sync::Arc;
use tracing::info;

pub fn compose(config: &AppConfig) -> AppState {
    let authenticator: Arc<dyn Authenticator> = Arc::new(StaticTokenAuthenticator::new(
        config.user_name.clone(),
        config.access_token.clone(),
    ));
    let alerts = Arc::new(RecordedAlerts::new());
    let remote: Arc<dyn RemoteFileService> = Arc::new(PermissionGuard::new(
        DirectoryRemoteFiles::new(config.data_dir.clone(), authenticator.clone()),
        authenticator.clone(),
        alerts.clone(),
    ));
    let dispatcher = Arc::new(StoreDispatcher::new(SyncCache::new(Arc::new(
        DetachedRemoteFiles,
    ))));
    wire_session(&dispatcher, authenticator.as_ref(), remote);
    AppState {
        dispatcher,
        authenticator,
        alerts,
    }
}

/// Login swaps in a fresh cache over `remote`, logout clears the active one.
pub fn wire_session(
    dispatcher: &Arc<StoreDispatcher>,
    authenticator: &dyn Authenticator,
    remote: Arc<dyn RemoteFileService>,
) {
    let dispatcher = Arc::downgrade(dispatcher);
    authenticator.on_login_state_changed(Box::new(move |logged_in| {
        let Some(dispatcher) = dispatcher.upgrade() else {
            return;
        };
        if logged_in {
            info!("session started, attaching remote tally documents");
            dispatcher.dispatch(StoreAction::NewStore(SyncCache::new(remote.clone())));
        } else {
            info!("session ended, clearing tally cache");
            dispatcher.dispatch(StoreAction::Clear);
        }
    }));
}
