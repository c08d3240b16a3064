use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::state::AppState;
use crate::error::AppError;
use crate::domain::models::notification::NotificationStatus;

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const BATCH_SIZE: i32 = 10;

pub async fn start_notification_dispatcher(state: Arc<AppState>) {
    info!("Starting notification dispatcher...");

    match recover_interrupted_dispatches(&state).await {
        Ok(0) => {}
        Ok(n) => warn!("Requeued {} notifications interrupted mid-dispatch", n),
        Err(e) => error!("Failed to requeue interrupted notifications: {:?}", e),
    }

    loop {
        if let Err(e) = dispatch_due_notifications(&state).await {
            error!("Failed to dispatch notifications: {:?}", e);
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Requeues work a previous process left in `sending`. Only safe before this process starts dispatching.
pub async fn recover_interrupted_dispatches(state: &AppState) -> Result<u64, AppError> {
    state.notification_repo.requeue_interrupted(Utc::now()).await
}

/// Claims every notification that is due and delivers it. Returns how many were processed.
pub async fn dispatch_due_notifications(state: &AppState) -> Result<usize, AppError> {
    let due = state.notification_repo.claim_due(Utc::now(), BATCH_SIZE).await?;
    let count = due.len();

    for notification in due {
        let span = info_span!(
            "notification_dispatch",
            notification_id = %notification.id,
            channel = notification.channel.as_str(),
        );

        async {
            info!("Dispatching notification");
            match state.notification_service.dispatch(&notification).await {
                Ok(status) => info!("Notification finished as {}", status.as_str()),
                Err(e) => {
                    error!("Dispatch failed: {}", e);
                    if let Err(mark_err) = state.notification_repo.finish(&notification.id, NotificationStatus::Failed, None).await {
                        warn!("Failed to mark notification as failed: {:?}", mark_err);
                    }
                }
            }
        }
            .instrument(span)
            .await;
    }

    Ok(count)
}
