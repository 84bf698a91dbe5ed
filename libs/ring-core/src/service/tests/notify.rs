use crate::service::tests;
use crate::NodeId;

#[test]
fn first_candidate_becomes_predecessor() {
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));

    service.notify(tests::node(5));

    assert_eq!(service.predecessor().unwrap().id, NodeId(5));
    assert_eq!(service.successor().id, NodeId(16));
}

#[test]
fn closer_candidate_replaces_the_predecessor() {
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));
    service.store().set_predecessor(tests::node(2));

    service.notify(tests::node(5));

    assert_eq!(service.predecessor().unwrap().id, NodeId(5));
}

#[test]
fn farther_candidate_is_ignored() {
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));
    service.store().set_predecessor(tests::node(5));

    service.notify(tests::node(2));

    assert_eq!(service.predecessor().unwrap().id, NodeId(5));
}

#[test]
fn candidate_across_the_wrap_is_accepted() {
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));
    service.store().set_predecessor(tests::node(250));

    service.notify(tests::node(3));

    assert_eq!(service.predecessor().unwrap().id, NodeId(3));
}

#[test]
fn an_isolated_node_adopts_the_candidate_as_successor() {
    let service = tests::service(10);

    service.notify(tests::node(40));

    assert_eq!(service.successor().id, NodeId(40));
    assert_eq!(service.predecessor().unwrap().id, NodeId(40));
}

#[test]
fn notify_is_idempotent() {
    let service = tests::service(8);
    service.store().set_successor(tests::node(16));

    service.notify(tests::node(5));
    let predecessor = service.predecessor();
    let successor = service.successor();
    let successors = service.successor_list();

    service.notify(tests::node(5));

    assert_eq!(service.predecessor(), predecessor);
    assert_eq!(service.successor(), successor);
    assert_eq!(service.successor_list(), successors);
}

#[test]
fn self_notification_changes_nothing() {
    let service = tests::service(8);

    service.notify(tests::node(8));

    assert!(service.predecessor().is_none());
    assert_eq!(service.successor().id, NodeId(8));
}
