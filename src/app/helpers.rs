//! Contains helper functions to reduce boilerplate code in other `app` modules.

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::{AppState, SharedState};
use super::view_model::generate_ui_state;
use crate::core::CoreError;

/// Locks the `AppState`, performs a mutation, and then sends a `StateUpdate`
/// event to the UI.
pub async fn with_state_and_notify<F, P: EventProxy>(state: &SharedState, proxy: &P, update_fn: F)
where
    F: FnOnce(&mut AppState),
{
    let mut state_guard = state.lock().await;
    update_fn(&mut state_guard);
    notify_state(&state_guard, proxy);
}

/// Sends the current view of `state` to the UI.
pub fn notify_state<P: EventProxy>(state: &AppState, proxy: &P) {
    let ui_state = generate_ui_state(state);
    proxy.send_event(UserEvent::StateUpdate(Box::new(ui_state)));
}

/// Logs `error` at a level matching its category and forwards it to the UI.
pub fn notify_error<P: EventProxy>(proxy: &P, error: &CoreError) {
    if error.is_contract_violation() {
        tracing::error!("{}", error);
    } else {
        match error {
            CoreError::Persistence { .. } | CoreError::Submission { .. } => {
                tracing::warn!("{}", error_chain(error))
            }
            _ => tracing::info!("Rejected: {}", error),
        }
    }
    proxy.send_event(UserEvent::ShowError {
        kind: error.kind(),
        message: error.to_string(),
    });
}

/// The error followed by its sources, joined with `: `.
fn error_chain(error: &CoreError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
