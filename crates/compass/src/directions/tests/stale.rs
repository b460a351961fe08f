use super::*;
use crate::directions::DirectionsState;
use crate::map::adapter::OverlayKind;

#[test]
fn test_superseded_response_is_dropped() {
    let (mut ctrl, log) = controller();
    let mut map = mounted_map();
    let library = poi("Main Library");
    let cafeteria = poi("University Cafeteria");

    let first = ctrl.begin(&library, Some(USER), &mut map).unwrap();
    let second = ctrl.begin(&cafeteria, Some(USER), &mut map).unwrap();
    assert!(second.seq > first.seq);

    // The second answer arrives first, then the first one limps in.
    assert!(ctrl
        .complete(second.seq, Ok(sample_route(cafeteria.coordinates)), &mut map)
        .is_some());
    assert!(ctrl
        .complete(first.seq, Err(RoutingError::NoRoute), &mut map)
        .is_none());

    assert_eq!(ctrl.state().destination().unwrap().id, "4");
    assert_eq!(map.overlay().unwrap().kind, OverlayKind::Route);
    assert!(!spoken(&log).iter().any(|s| s.contains("Main Library")));
}

#[test]
fn test_response_after_clear_is_dropped() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let library = poi("Main Library");

    let ticket = ctrl.begin(&library, Some(USER), &mut map).unwrap();
    ctrl.clear(&mut map);

    assert!(ctrl
        .complete(ticket.seq, Ok(sample_route(library.coordinates)), &mut map)
        .is_none());
    assert_eq!(ctrl.state(), &DirectionsState::Idle);
    assert!(map.overlay().is_none());
}

#[test]
fn test_duplicate_response_is_dropped() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let library = poi("Main Library");

    let ticket = ctrl.begin(&library, Some(USER), &mut map).unwrap();
    assert!(ctrl
        .complete(ticket.seq, Ok(sample_route(library.coordinates)), &mut map)
        .is_some());
    assert!(ctrl
        .complete(ticket.seq, Err(RoutingError::NoRoute), &mut map)
        .is_none());
    assert!(matches!(ctrl.state(), DirectionsState::RouteFound { .. }));
}
