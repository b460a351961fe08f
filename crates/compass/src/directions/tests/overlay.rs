use super::*;
use crate::filter::PoiFilter;
use crate::map::adapter::OverlayKind;

#[test]
fn test_route_overlay_style_and_fit() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let sports = poi("Sports Complex");
    let router = FakeRouter::ok(sample_route(sports.coordinates));

    ctrl.request(&router, &sports, Some(USER), &mut map)
        .unwrap();

    let overlay = map.overlay().unwrap();
    assert_eq!(overlay.kind, OverlayKind::Route);
    assert_eq!(overlay.path.len(), 3);
    assert_eq!(overlay.style.dash, None);

    let view = *map.view().unwrap();
    for c in &overlay.path {
        let [x, y] = view.to_screen(*c);
        assert!((0.0..=800.0).contains(&x) && (0.0..=600.0).contains(&y));
    }
}

#[test]
fn test_fallback_is_one_dashed_segment_fit_to_endpoints() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let sports = poi("Sports Complex");
    let router = FakeRouter::failing(RoutingError::NoRoute);

    ctrl.request(&router, &sports, Some(USER), &mut map)
        .unwrap();

    let overlay = map.overlay().unwrap();
    assert_eq!(overlay.kind, OverlayKind::DirectLine);
    assert_eq!(overlay.path, vec![USER, sports.coordinates]);
    assert_eq!(overlay.style.dash, Some([10.0, 10.0]));
    assert_eq!(overlay.style.weight, 6.0);

    let view = *map.view().unwrap();
    for c in &overlay.path {
        let [x, y] = view.to_screen(*c);
        assert!((20.0..=780.0).contains(&x), "x = {x}");
        assert!((20.0..=580.0).contains(&y), "y = {y}");
    }
}

#[test]
fn test_consecutive_requests_leave_one_overlay() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let library = poi("Main Library");
    let cafeteria = poi("University Cafeteria");

    ctrl.request(&FakeRouter::ok(sample_route(library.coordinates)), &library, Some(USER), &mut map)
        .unwrap();
    ctrl.request(&FakeRouter::failing(RoutingError::NoRoute), &cafeteria, Some(USER), &mut map)
        .unwrap();

    let overlay = map.overlay().unwrap();
    assert_eq!(overlay.kind, OverlayKind::DirectLine);
    assert_eq!(overlay.path[1], cafeteria.coordinates);
}

#[test]
fn test_begin_removes_previous_overlay_immediately() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let library = poi("Main Library");
    ctrl.request(&FakeRouter::ok(sample_route(library.coordinates)), &library, Some(USER), &mut map)
        .unwrap();
    assert!(map.overlay().is_some());

    ctrl.begin(&poi("Medical Center"), Some(USER), &mut map)
        .unwrap();

    assert!(map.overlay().is_none());
}

#[test]
fn test_destination_pin_shown_when_poi_is_filtered_out() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let pois = seed_pois();
    let essential = PoiFilter {
        essential_only: true,
        ..PoiFilter::default()
    };
    map.show_markers(&essential.apply(&pois));
    let sports = poi("Sports Complex");
    assert!(!map.markers().iter().any(|m| m.poi_id == sports.id));

    ctrl.request(&FakeRouter::ok(sample_route(sports.coordinates)), &sports, Some(USER), &mut map)
        .unwrap();

    let pin = map.destination().unwrap();
    assert_eq!(pin.position, sports.coordinates);
    assert_eq!(pin.name, "Sports Complex");
}

#[test]
fn test_destination_pin_kept_on_direct_line_fallback() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let medical = poi("Medical Center");
    let router = FakeRouter::failing(RoutingError::NoRoute);

    ctrl.request(&router, &medical, Some(USER), &mut map)
        .unwrap();

    assert_eq!(map.overlay().unwrap().kind, OverlayKind::DirectLine);
    assert_eq!(map.destination().unwrap().position, medical.coordinates);
}

#[test]
fn test_destination_pin_follows_requests_and_clear() {
    let (mut ctrl, _) = controller();
    let mut map = mounted_map();
    let library = poi("Main Library");
    let cafeteria = poi("University Cafeteria");

    ctrl.request(&FakeRouter::ok(sample_route(library.coordinates)), &library, Some(USER), &mut map)
        .unwrap();
    ctrl.begin(&cafeteria, Some(USER), &mut map).unwrap();
    assert_eq!(map.destination().unwrap().name, "University Cafeteria");

    ctrl.clear(&mut map);
    assert!(map.destination().is_none());
    assert!(map.overlay().is_none());
}
