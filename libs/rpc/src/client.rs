use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tarpc::client::RpcError;
use tarpc::context;
use tarpc::tokio_serde::formats::Bincode;
use tokio::sync::Mutex;
use tokio::time;

use meshring_core::{Client, ClientError, Node, NodeId, Value};

use crate::{Fault, RingRpcClient};

/// How long a peer gets to accept a connection or answer a request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Core-facing client for one remote node.
///
/// Connects lazily: `init` never fails, the first call pays for the dial.
/// A disconnect drops the cached connection so the next call redials.
pub struct RingClient {
    addr: SocketAddr,
    connection: Mutex<Option<RingRpcClient>>,
}

impl RingClient {
    async fn connected(&self) -> Result<RingRpcClient, ClientError> {
        let mut slot = self.connection.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let transport = time::timeout(
            REQUEST_TIMEOUT,
            tarpc::serde_transport::tcp::connect(self.addr, Bincode::default),
        )
        .await
        .map_err(|_| ClientError::Timeout)?
        .map_err(|err| ClientError::ConnectionFailed(err.to_string()))?;

        let client = RingRpcClient::new(tarpc::client::Config::default(), transport).spawn();
        log::debug!("connected to {}", self.addr);
        slot.replace(client.clone());
        Ok(client)
    }

    async fn call<T, F>(&self, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, RpcError>>,
    {
        match time::timeout(REQUEST_TIMEOUT, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                self.disconnect().await;
                Err(match err {
                    RpcError::DeadlineExceeded => ClientError::Timeout,
                    other => ClientError::ConnectionFailed(other.to_string()),
                })
            }
            Err(_) => {
                self.disconnect().await;
                Err(ClientError::Timeout)
            }
        }
    }

    async fn disconnect(&self) {
        self.connection.lock().await.take();
    }
}

impl From<Fault> for ClientError {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::NotFound => ClientError::NotFound,
            Fault::Internal(message) => ClientError::Unexpected(message),
        }
    }
}

#[async_trait]
impl Client for RingClient {
    async fn init(addr: SocketAddr) -> Self {
        log::debug!("initializing client for {}", addr);
        Self {
            addr,
            connection: Mutex::new(None),
        }
    }

    async fn find_successor(&self, id: NodeId) -> Result<Node, ClientError> {
        let client = self.connected().await?;
        let node = self
            .call(client.find_successor(context::current(), id.0))
            .await?;
        Ok(node.into())
    }

    async fn successor(&self) -> Result<Node, ClientError> {
        let client = self.connected().await?;
        let node = self.call(client.successor(context::current())).await?;
        Ok(node.into())
    }

    async fn successor_list(&self) -> Result<Vec<Node>, ClientError> {
        let client = self.connected().await?;
        let nodes = self.call(client.successor_list(context::current())).await?;
        Ok(nodes.into_iter().map(Node::from).collect())
    }

    async fn predecessor(&self) -> Result<Option<Node>, ClientError> {
        let client = self.connected().await?;
        let node = self.call(client.predecessor(context::current())).await?;
        Ok(node.map(Node::from))
    }

    async fn notify(&self, node: Node) -> Result<(), ClientError> {
        let client = self.connected().await?;
        self.call(client.notify(context::current(), node.into()))
            .await
    }

    async fn ping(&self) -> Result<(), ClientError> {
        let client = self.connected().await?;
        self.call(client.ping(context::current())).await
    }

    async fn storage_value(&self, key: String) -> Result<Value, ClientError> {
        let client = self.connected().await?;
        let value = self
            .call(client.storage_value(context::current(), key))
            .await?;
        value.map_err(ClientError::from)
    }

    async fn store_value(&self, key: String, value: Value) -> Result<(), ClientError> {
        let client = self.connected().await?;
        self.call(client.store_value(context::current(), key, value))
            .await
    }
}
