use std::{cell::RefCell, rc::Rc};

use super::*;

fn record(info: &mut LayoutInfo) -> Rc<RefCell<Vec<LayoutInfoChanged>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    info.subscribe(move |e| sink.borrow_mut().push(*e));
    log
}

fn min_le_max(info: &LayoutInfo) -> bool {
    Axis::ALL.iter().all(|&axis| {
        match (info.min_size().get(axis), info.max_size().get(axis)) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    })
}

#[test]
fn defaults_are_unfixed() {
    let info = LayoutInfo::new();
    assert!(info.layout_size().is_unfixed());
    assert!(info.min_size().is_unfixed());
    assert!(info.max_size().is_unfixed());
    assert!(!info.ignore_layout_group());
    assert_eq!(info.size_grow_in_group(), 0.0);
    assert_eq!(info.order_in_group(), 0);
}

#[test]
fn ceiling_below_floor_wins() {
    let mut info = LayoutInfo::new();
    info.set_min_size(Bound3::fixed(Vec3::splat(20.0)));
    info.set_layout_size(Bound3::new(Some(40.0), None, None));
    let size = info.get_layout_size(Vec3::splat(50.0));
    assert_eq!(size, Vec3::new(40.0, 50.0, 50.0));

    info.set_layout_size(Bound3::new(Some(10.0), None, None));
    assert_eq!(info.get_layout_size(Vec3::splat(5.0)), Vec3::new(10.0, 20.0, 20.0));
}

#[test]
fn floor_raises_small_natural_size() {
    let mut info = LayoutInfo::new();
    info.set_min_size(Bound3::new(Some(30.0), None, Some(1.0)));
    assert_eq!(
        info.get_layout_size(Vec3::new(10.0, 10.0, 10.0)),
        Vec3::new(30.0, 10.0, 10.0)
    );
}

#[test]
fn negative_layout_size_resets_axis() {
    let mut info = LayoutInfo::new();
    info.set_layout_size(Bound3::fixed(Vec3::splat(40.0)));
    info.set_layout_size(Bound3::new(Some(-3.0), Some(40.0), Some(40.0)));
    assert_eq!(info.layout_size(), Bound3::new(None, Some(40.0), Some(40.0)));
}

#[test]
fn min_max_orders_bounds_with_one_notification() {
    let mut info = LayoutInfo::new();
    let log = record(&mut info);
    info.set_min_max_size(
        Bound3::fixed(Vec3::new(50.0, 5.0, 5.0)),
        Bound3::fixed(Vec3::new(30.0, 10.0, 10.0)),
    );
    assert_eq!(info.min_size(), Bound3::fixed(Vec3::new(30.0, 5.0, 5.0)));
    assert_eq!(info.max_size(), Bound3::fixed(Vec3::new(50.0, 10.0, 10.0)));

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert!(log[0].changed.contains(LayoutInfoFields::MIN_SIZE | LayoutInfoFields::MAX_SIZE));
    assert_eq!(log[0].old, LayoutInfoSnapshot::default());
}

#[test]
fn non_positive_max_means_unset() {
    let mut info = LayoutInfo::new();
    info.set_min_max_size(
        Bound3::fixed(Vec3::splat(50.0)),
        Bound3::new(Some(0.0), None, Some(-2.0)),
    );
    assert_eq!(info.min_size(), Bound3::fixed(Vec3::splat(50.0)));
    assert!(info.max_size().is_unfixed());
}

#[test]
fn individual_setters_keep_ordering() {
    let mut info = LayoutInfo::new();
    info.set_max_size(Bound3::fixed(Vec3::splat(10.0)));
    info.set_min_size(Bound3::fixed(Vec3::splat(25.0)));
    assert!(min_le_max(&info));
    assert_eq!(info.min_size(), Bound3::fixed(Vec3::splat(10.0)));
    assert_eq!(info.max_size(), Bound3::fixed(Vec3::splat(25.0)));

    info.set_max_size(Bound3::fixed(Vec3::splat(3.0)));
    assert!(min_le_max(&info));

    info.set_max_size(Bound3::UNFIXED);
    info.set_min_size(Bound3::new(Some(7.0), Some(-1.0), None));
    assert!(min_le_max(&info));
    assert_eq!(info.min_size(), Bound3::new(Some(7.0), None, None));
}

#[test]
fn ordering_holds_over_mutation_sequences() {
    let mut info = LayoutInfo::new();
    let values = [-4.0, 0.0, 1.0, 12.5, 3.0, 40.0, 0.5];
    for (i, &a) in values.iter().enumerate() {
        let b = values[(i * 3 + 1) % values.len()];
        info.set_min_size(Bound3::fixed(Vec3::new(a, b, a)));
        assert!(min_le_max(&info));
        info.set_max_size(Bound3::fixed(Vec3::new(b, a, b)));
        assert!(min_le_max(&info));
        info.set_min_max_size(
            Bound3::fixed(Vec3::splat(b)),
            Bound3::fixed(Vec3::splat(a)),
        );
        assert!(min_le_max(&info));
    }
}

#[test]
fn setters_ignore_noise_below_epsilon() {
    let mut info = LayoutInfo::new();
    info.set_layout_size(Bound3::fixed(Vec3::splat(10.0)));
    let log = record(&mut info);
    info.set_layout_size(Bound3::fixed(Vec3::splat(10.00004)));
    info.set_size_grow_in_group(0.00001);
    info.set_order_in_group(0);
    assert!(log.borrow().is_empty());

    info.set_order_in_group(2);
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].changed, LayoutInfoFields::ORDER_IN_GROUP);
}

#[test]
fn assign_copies_everything_once() {
    let source = LayoutInfoSnapshot {
        layout_size: Bound3::new(Some(1.0), None, None),
        min_size: Bound3::new(None, Some(2.0), None),
        max_size: Bound3::new(None, Some(4.0), None),
        ignore_layout_group: true,
        size_grow_in_group: 2.0,
        order_in_group: -1,
    };
    let mut info = LayoutInfo::new();
    let log = record(&mut info);
    info.assign(&source);
    assert_eq!(info.snapshot(), source);
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].changed, LayoutInfoFields::all());

    info.assign(&source);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn negative_grow_clamps_to_zero() {
    let mut info = LayoutInfo::new();
    info.set_size_grow_in_group(3.0);
    info.set_size_grow_in_group(-1.0);
    assert_eq!(info.size_grow_in_group(), 0.0);
}

#[test]
fn assign_applies_setter_rules() {
    let mut info = LayoutInfo::new();
    let log = record(&mut info);
    info.assign(&LayoutInfoSnapshot {
        layout_size: Bound3::fixed(Vec3::splat(-5.0)),
        min_size: Bound3::new(Some(30.0), Some(-2.0), None),
        max_size: Bound3::new(Some(10.0), None, Some(0.0)),
        size_grow_in_group: -1.0,
        ..LayoutInfoSnapshot::default()
    });

    assert!(info.layout_size().is_unfixed());
    assert_eq!(info.min_size(), Bound3::new(Some(10.0), None, None));
    assert_eq!(info.max_size(), Bound3::new(Some(30.0), None, None));
    assert_eq!(info.size_grow_in_group(), 0.0);
    assert!(min_le_max(&info));
    assert_eq!(info.get_layout_size(Vec3::splat(50.0)), Vec3::splat(50.0));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn from_snapshot_normalizes() {
    let info = LayoutInfo::from_snapshot(LayoutInfoSnapshot {
        layout_size: Bound3::new(Some(-1.0), Some(8.0), None),
        min_size: Bound3::fixed(Vec3::splat(30.0)),
        max_size: Bound3::fixed(Vec3::splat(10.0)),
        ..LayoutInfoSnapshot::default()
    });
    assert_eq!(info.layout_size(), Bound3::new(None, Some(8.0), None));
    assert!(min_le_max(&info));
}
