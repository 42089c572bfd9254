//! # Watch Loop
//!
//! Watches `FivetranConnector` resources and hands the events that pass the
//! [`TriggerGate`](crate::runtime::trigger::TriggerGate) to the reconciler.

use crate::controller::reconciler::{
    reconcile, ReconcileOutcome, Reconciler, ReconcilerError, TriggerSource,
};
use crate::controller::server::ServerState;
use crate::crd::FivetranConnector;
use crate::observability;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use crate::runtime::trigger::{resource_key, TriggerGate};
use futures::StreamExt;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::{controller::Action, watcher, Controller};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Run the controller watch loop until shutdown
///
/// The watch is restarted when its stream ends for any reason other than a
/// shutdown signal.
pub async fn run_watch_loop(
    connectors: Api<FivetranConnector>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        shutdown_state.set_ready(false);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    let restart_delay = reconciler.config.watch_restart_delay_after_end_duration();

    loop {
        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        info!("Starting FivetranConnector watch loop");
        Controller::new(connectors.clone(), watcher::Config::default().any_semantic())
            .shutdown_on_signal()
            .run(reconcile_resource, handle_reconciliation_error, reconciler.clone())
            .filter_map(|event| async move {
                match event {
                    Ok(_) => {
                        debug!("watch.event.success");
                        Some(())
                    }
                    Err(e) => {
                        handle_watch_stream_error(&e);
                        None
                    }
                }
            })
            .for_each(|()| futures::future::ready(()))
            .instrument(watch_span)
            .await;

        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("Fivetran operator stopped gracefully");
    Ok(())
}

async fn reconcile_resource(
    obj: Arc<FivetranConnector>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let Some(trigger) = ctx.triggers.should_reconcile(&obj) else {
        debug!(
            resource.name = name.as_str(),
            resource.namespace = namespace.as_str(),
            resource.generation = obj.metadata.generation.unwrap_or(0),
            "Skipping event, nothing to reconcile"
        );
        return Ok(Action::await_change());
    };

    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.reconcile",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.generation = obj.metadata.generation.unwrap_or(0),
        trigger = trigger.as_str()
    );

    async move {
        info!("Reconciling FivetranConnector {}/{} (trigger: {})", namespace, name, trigger.as_str());
        observability::metrics::increment_reconciliations(trigger.as_str());
        let start = Instant::now();

        let result = reconcile(&ctx, &namespace, &name).await;
        observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        let outcome = result?;
        debug!(outcome = ?outcome, "Reconciliation finished");
        let key = resource_key(&obj);
        if trigger == TriggerSource::Deletion && outcome == ReconcileOutcome::Done {
            ctx.triggers.forget(&key);
        }
        Ok(action_for(&ctx.triggers, &key, outcome))
    }
    .instrument(span)
    .await
}

/// Map an outcome to the controller action, remembering requeues as retries
pub fn action_for(triggers: &TriggerGate, key: &str, outcome: ReconcileOutcome) -> Action {
    match outcome {
        ReconcileOutcome::NoOp | ReconcileOutcome::Done => Action::await_change(),
        ReconcileOutcome::RequeueAfter(delay) => {
            triggers.schedule_retry(key, delay);
            Action::requeue(delay)
        }
    }
}
