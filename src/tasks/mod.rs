//! Background scheduled tasks for the application.
//!
//! This module centralizes the recurring jobs: sweeping resolved but unscored
//! outcomes, and returning forfeited locks whose cooldown has elapsed.
//! Call `spawn_all` once during startup to launch them.

use crate::config::TasksConfig;
use crate::services::{ReplenishmentService, ScoringService};

/// Spawn all background tasks.
///
/// Notes
/// - Both jobs are idempotent as implemented in their services.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(
    config: TasksConfig,
    scoring_service: ScoringService,
    replenishment_service: ReplenishmentService,
) {
    // 未计分结果扫描（可配置关闭，改为人工触发）
    if config.auto_process_outcomes {
        let svc = scoring_service.clone();
        let interval = config.outcome_sweep_secs;
        tokio::spawn(async move {
            loop {
                match svc.process_pending_outcomes(false).await {
                    Ok(summary) if summary.events_scored > 0 || !summary.errors.is_empty() => {
                        log::info!(
                            "Outcome sweep: {} scored, {} errors",
                            summary.events_scored,
                            summary.errors.len()
                        );
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to process pending outcomes: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
            }
        });
    }

    // 冷却期满的没收锁归还
    {
        let svc = replenishment_service.clone();
        let interval = config.replenish_sweep_secs;
        tokio::spawn(async move {
            loop {
                match svc.run_replenishment().await {
                    Ok(summary) if summary.records_applied > 0 => {
                        log::info!(
                            "Replenishment sweep: {} locks returned",
                            summary.records_applied
                        );
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to run lock replenishment: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
            }
        });
    }
}
