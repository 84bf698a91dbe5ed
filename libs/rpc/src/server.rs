use std::net::SocketAddr;
use std::sync::Arc;

use futures::{future, StreamExt};
use tarpc::context::Context;
use tarpc::server::{self, Channel};
use tarpc::tokio_serde::formats::Bincode;

use meshring_core::{join_ring, Lifecycle, NodeConfig, NodeId, NodeService, ServiceError, Value};

use crate::client::RingClient;
use crate::{Fault, RingRpc, WireNode};

const MAX_CONNECTIONS: usize = 256;
const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;
const JOIN_RETRIES: u32 = 5;

/// One inbound channel's view of the node.
#[derive(Clone)]
struct RingRpcServer {
    node: Arc<NodeService<RingClient>>,
}

#[tarpc::server]
impl RingRpc for RingRpcServer {
    async fn find_successor(self, _: Context, id: u64) -> WireNode {
        self.node.find_successor(NodeId(id)).await.into()
    }

    async fn successor(self, _: Context) -> WireNode {
        self.node.successor().into()
    }

    async fn successor_list(self, _: Context) -> Vec<WireNode> {
        self.node
            .successor_list()
            .into_iter()
            .map(WireNode::from)
            .collect()
    }

    async fn predecessor(self, _: Context) -> Option<WireNode> {
        self.node.predecessor().map(WireNode::from)
    }

    async fn notify(self, _: Context, node: WireNode) {
        self.node.notify(node.into());
    }

    async fn ping(self, _: Context) {}

    async fn storage_value(self, _: Context, key: String) -> Result<Value, Fault> {
        self.node.storage_value(&key).map_err(|err| match err {
            ServiceError::KeyNotFound(_) => Fault::NotFound,
            other => Fault::Internal(other.to_string()),
        })
    }

    async fn store_value(self, _: Context, key: String, value: Value) {
        self.node.store_value(key, value);
    }
}

/// A running ring node: joins its ring when asked to, keeps itself
/// stabilized and serves the wire protocol.
pub struct Server {
    addr: SocketAddr,
    node: Arc<NodeService<RingClient>>,
    _maintenance: Lifecycle,
}

impl Server {
    /// Build the node, join the ring behind `ring` when given, and start
    /// the maintenance loops.
    pub async fn new(addr: SocketAddr, config: NodeConfig, ring: Option<SocketAddr>) -> Self {
        let periods = config.periods;
        let node = Arc::new(NodeService::new(addr, config));
        log::info!("node {} listening on {}", node.id(), addr);

        if let Some(bootstrap) = ring {
            if let Err(err) = join_ring(node.as_ref(), bootstrap, JOIN_RETRIES).await {
                log::error!("could not join ring via {}: {}", bootstrap, err);
            }
        }
        let maintenance = Lifecycle::spawn(node.clone(), periods);

        Self {
            addr,
            node,
            _maintenance: maintenance,
        }
    }

    pub fn node(&self) -> Arc<NodeService<RingClient>> {
        self.node.clone()
    }

    /// Accept loop; serves until the future is dropped.
    pub async fn run(&self) -> std::io::Result<()> {
        let mut listener = tarpc::serde_transport::tcp::listen(&self.addr, Bincode::default).await?;
        listener.config_mut().max_frame_length(MAX_FRAME_LENGTH);
        listener
            .filter_map(|conn| future::ready(conn.ok()))
            .map(server::BaseChannel::with_defaults)
            .map(|channel| {
                let server = RingRpcServer {
                    node: self.node.clone(),
                };
                channel.execute(server.serve())
            })
            .buffer_unordered(MAX_CONNECTIONS)
            .for_each(|_| async {})
            .await;
        Ok(())
    }
}
