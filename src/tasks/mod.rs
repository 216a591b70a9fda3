//! Background jobs started once at boot.

use crate::config::SchedulerConfig;
use crate::services::PostDispatcher;
use std::time::Duration;

/// Detaches the recurring dispatcher sweep. A failed sweep is logged and
/// the loop keeps going.
pub fn spawn_all(dispatcher: PostDispatcher, scheduler: &SchedulerConfig) {
    if !scheduler.enabled {
        log::info!("In-process post scheduler disabled; relying on /cron/auto-post");
        return;
    }

    let interval = Duration::from_secs(scheduler.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = dispatcher.run_sweep().await {
                log::error!("Scheduled post sweep failed: {e:?}");
            }
        }
    });
}
