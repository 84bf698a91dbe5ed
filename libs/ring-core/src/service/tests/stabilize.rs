use std::net::SocketAddr;

use mockall::predicate;

use crate::client::{ClientError, MockClient};
use crate::service::tests::{self, get_lock, MTX};
use crate::NodeId;

#[tokio::test]
async fn adopts_the_closer_predecessor_of_the_successor() {
    let _m = get_lock(&MTX);
    let ctx = MockClient::init_context();

    ctx.expect().returning(|addr: SocketAddr| {
        let mut client = MockClient::new();
        match addr.port() {
            42016 => {
                client
                    .expect_predecessor()
                    .times(1)
                    .returning(|| Ok(Some(tests::node(12))));
            }
            42012 => {
                client
                    .expect_notify()
                    .with(predicate::eq(tests::node(8)))
                    .times(1)
                    .returning(|_| Ok(()));
                client
                    .expect_successor_list()
                    .times(1)
                    .returning(|| Ok(vec![tests::node(16)]));
            }
            _ => {}
        }
        client
    });
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));

    service.stabilize().await.unwrap();

    assert_eq!(service.successor().id, NodeId(12));
    let ids: Vec<NodeId> = service.successor_list().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![NodeId(12), NodeId(16)]);
}

#[tokio::test]
async fn keeps_the_successor_when_its_predecessor_is_not_closer() {
    let _m = get_lock(&MTX);
    let ctx = MockClient::init_context();

    ctx.expect().returning(|addr: SocketAddr| {
        let mut client = MockClient::new();
        if addr.port() == 42016 {
            client
                .expect_predecessor()
                .times(1)
                .returning(|| Ok(Some(tests::node(20))));
            client
                .expect_notify()
                .with(predicate::eq(tests::node(8)))
                .times(1)
                .returning(|_| Ok(()));
            client
                .expect_successor_list()
                .times(1)
                .returning(|| Ok(vec![tests::node(20), tests::node(24)]));
        }
        client
    });
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));

    service.stabilize().await.unwrap();

    assert_eq!(service.successor().id, NodeId(16));
    let ids: Vec<NodeId> = service.successor_list().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![NodeId(16), NodeId(20), NodeId(24)]);
}

#[tokio::test]
async fn singleton_has_nothing_to_reconcile() {
    let _m = get_lock(&MTX);
    let ctx = MockClient::init_context();
    ctx.expect().never();

    let service = tests::service(8);

    service.stabilize().await.unwrap();

    assert_eq!(service.successor().id, NodeId(8));
    assert!(service.predecessor().is_none());
}

#[tokio::test]
async fn unreachable_successor_is_demoted() {
    let _m = get_lock(&MTX);
    let ctx = MockClient::init_context();

    ctx.expect().returning(|addr: SocketAddr| {
        let mut client = MockClient::new();
        if addr.port() == 42016 {
            client
                .expect_predecessor()
                .times(1)
                .returning(|| Err(ClientError::ConnectionFailed("refused".to_string())));
        }
        client
    });
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));
    service
        .store()
        .merge_successor_list(vec![tests::node(16), tests::node(24)]);

    service.stabilize().await.unwrap();

    assert_eq!(service.successor().id, NodeId(24));
    let ids: Vec<NodeId> = service.successor_list().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![NodeId(24)]);
}

#[tokio::test]
async fn successor_that_dies_after_adoption_is_demoted() {
    let _m = get_lock(&MTX);
    let ctx = MockClient::init_context();

    ctx.expect().returning(|addr: SocketAddr| {
        let mut client = MockClient::new();
        match addr.port() {
            42016 => {
                client
                    .expect_predecessor()
                    .times(1)
                    .returning(|| Ok(Some(tests::node(12))));
            }
            42012 => {
                client
                    .expect_notify()
                    .times(1)
                    .returning(|_| Err(ClientError::Timeout));
            }
            _ => {}
        }
        client
    });
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));

    service.stabilize().await.unwrap();

    assert_eq!(service.successor().id, NodeId(16));
    let ids: Vec<NodeId> = service.successor_list().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![NodeId(16)]);
}

#[tokio::test]
async fn merged_successor_list_is_capped() {
    let _m = get_lock(&MTX);
    let ctx = MockClient::init_context();

    ctx.expect().returning(|addr: SocketAddr| {
        let mut client = MockClient::new();
        if addr.port() == 42016 {
            client.expect_predecessor().times(1).returning(|| Ok(None));
            client.expect_notify().times(1).returning(|_| Ok(()));
            client.expect_successor_list().times(1).returning(|| {
                Ok(vec![
                    tests::node(17),
                    tests::node(18),
                    tests::node(19),
                    tests::node(20),
                ])
            });
        }
        client
    });
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));

    service.stabilize().await.unwrap();

    let ids: Vec<NodeId> = service.successor_list().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![NodeId(16), NodeId(17), NodeId(18)]);
}
