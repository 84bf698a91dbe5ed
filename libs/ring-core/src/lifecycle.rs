//! Timer-driven maintenance of a node.
//!
//! Three independent loops drive `stabilize`, `fix_fingers` and
//! `check_predecessor`. Each loop sleeps for its configured period, runs
//! one tick, and only then schedules the next sleep, so ticks of the same
//! kind never overlap. Failures inside a tick are logged and absorbed;
//! the loops always continue.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::client::Client;
use crate::config::MaintenancePeriods;
use crate::node::Node;
use crate::service::{NodeService, ServiceError};

const JOIN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Handle over the maintenance tasks of one node.
///
/// Dropping the handle shuts the loops down as well; keep it alive for as
/// long as the node should maintain itself.
pub struct Lifecycle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Lifecycle {
    /// Start the three maintenance loops for `service`.
    ///
    /// Starting a node twice is a no-op: the second call returns an inert
    /// handle and the original loops keep running.
    pub fn spawn<C>(service: Arc<NodeService<C>>, periods: MaintenancePeriods) -> Self
    where
        C: Client + 'static,
    {
        let (shutdown, _) = watch::channel(false);
        if !service.mark_maintenance_started() {
            log::debug!("maintenance already running for {}", service.id());
            return Self {
                shutdown,
                tasks: Vec::new(),
            };
        }

        let mut tasks = Vec::with_capacity(3);

        let svc = service.clone();
        let mut rx = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = time::sleep(periods.stabilize) => {}
                    _ = rx.changed() => break,
                }
                if let Err(err) = svc.stabilize().await {
                    log::warn!("stabilize tick failed: {}", err);
                }
                log::trace!("{}", svc.status());
            }
        }));

        let svc = service.clone();
        let mut rx = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = time::sleep(periods.fix_fingers) => {}
                    _ = rx.changed() => break,
                }
                svc.fix_fingers().await;
            }
        }));

        let svc = service;
        let mut rx = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = time::sleep(periods.check_predecessor) => {}
                    _ = rx.changed() => break,
                }
                if let Err(err) = svc.check_predecessor().await {
                    log::warn!("check-predecessor tick failed: {}", err);
                }
            }
        }));

        Self { shutdown, tasks }
    }

    /// Whether this handle owns running maintenance tasks.
    pub fn is_active(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Stop the loops. Pending timers are cancelled; a tick that already
    /// started runs to completion before its loop exits.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Join an existing ring through `bootstrap_addr`, retrying a few times
/// while the bootstrap node comes up.
pub async fn join_ring<C>(
    service: &NodeService<C>,
    bootstrap_addr: SocketAddr,
    max_retries: u32,
) -> Result<(), ServiceError>
where
    C: Client,
{
    let peer = Node::new(bootstrap_addr, service.space());
    let mut attempt = 0;
    loop {
        match service.join(peer.clone()).await {
            Ok(()) => return Ok(()),
            Err(err) if attempt < max_retries => {
                attempt += 1;
                log::warn!("join attempt {} failed: {}, retrying", attempt, err);
                time::sleep(JOIN_RETRY_DELAY).await;
            }
            Err(err) => return Err(err),
        }
    }
}
