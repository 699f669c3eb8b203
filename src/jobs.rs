//! Periodic cleanup sweeps, each on its own interval.

use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{config::SweepSchedule, error::AppResult, services::cleanup_service, state::AppState};

pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
        tracing::info!("cleanup sweeps stopped");
    }
}

fn every<F, Fut>(name: &'static str, period: Duration, state: AppState, sweep: F) -> JoinHandle<()>
where
    F: Fn(AppState, DateTime<Utc>) -> Fut + Send + 'static,
    Fut: Future<Output = AppResult<u64>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            match sweep(state.clone(), Utc::now()).await {
                Ok(count) if count > 0 => tracing::info!(sweep = name, count, "sweep finished"),
                Ok(_) => tracing::debug!(sweep = name, "sweep found nothing"),
                Err(err) => tracing::error!(sweep = name, error = %err, "sweep failed"),
            }
        }
    })
}

pub fn spawn(state: AppState, schedule: &SweepSchedule) -> Scheduler {
    let handles = vec![
        every("stale_orders", schedule.stale_orders, state.clone(), |s, now| async move {
            cleanup_service::cancel_stale_orders(&s, now).await
        }),
        every("stale_bookings", schedule.stale_bookings, state.clone(), |s, now| async move {
            cleanup_service::cancel_stale_bookings(&s, now).await
        }),
        every("purge_bookings", schedule.purge_bookings, state.clone(), |s, now| async move {
            cleanup_service::purge_canceled_bookings(&s, now).await
        }),
        every("purge_orders", schedule.purge_orders, state, |s, now| async move {
            cleanup_service::purge_canceled_orders(&s, now).await
        }),
    ];
    tracing::info!(?schedule, "cleanup sweeps started");
    Scheduler { handles }
}
