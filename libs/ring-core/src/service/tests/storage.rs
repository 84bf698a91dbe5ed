use std::net::SocketAddr;

use mockall::predicate;

use crate::client::MockClient;
use crate::service::tests::{self, get_lock, MTX};
use crate::{NodeId, NodeService, ServiceError};

#[test]
fn values_round_trip_locally() {
    let service = tests::service(8);

    service.store_value("color".to_string(), b"teal".to_vec());

    assert_eq!(service.storage_value("color").unwrap(), b"teal".to_vec());
}

#[test]
fn missing_keys_are_reported() {
    let service = tests::service(8);

    assert!(matches!(
        service.storage_value("nope"),
        Err(ServiceError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn a_singleton_serves_every_key_itself() {
    let _m = get_lock(&MTX);

    let service = tests::service(8);

    service
        .put("color".to_string(), b"teal".to_vec())
        .await
        .unwrap();

    assert_eq!(service.lookup("color").await.unwrap(), b"teal".to_vec());
    assert!(matches!(
        service.lookup("shape").await,
        Err(ServiceError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn keys_are_routed_to_the_responsible_node() {
    let _m = get_lock(&MTX);
    let ctx = MockClient::init_context();

    let key = "routing-example";
    let key_id = tests::config().space().hash_key(key.as_bytes());
    let owner_port = 42000 + key_id.0 as u16;

    ctx.expect().returning(move |addr: SocketAddr| {
        let mut client = MockClient::new();
        if addr.port() == owner_port {
            client
                .expect_store_value()
                .with(predicate::eq(key.to_string()), predicate::eq(b"remote".to_vec()))
                .times(1)
                .returning(|_, _| Ok(()));
            client
                .expect_storage_value()
                .with(predicate::eq(key.to_string()))
                .times(1)
                .returning(|_| Ok(b"remote".to_vec()));
        }
        client
    });

    // Place ourselves across the ring from the key; its owner is then the
    // successor and both operations go over the wire.
    let my_id = key_id.0.wrapping_add(128) & 0xff;
    let service: NodeService<MockClient> =
        NodeService::with_id(NodeId(my_id), tests::addr(1), tests::config());
    service.store().set_successor(tests::node(key_id.0 as u16));

    service
        .put(key.to_string(), b"remote".to_vec())
        .await
        .unwrap();

    assert_eq!(service.lookup(key).await.unwrap(), b"remote".to_vec());
    assert!(service.storage_value(key).is_err());
}
