use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::geometry::target::AnchorMode;

fn parent_with_size(tree: &mut TargetTree, size: Vec3) -> TargetId {
    tree.insert_with(
        None,
        TargetGeometry {
            local_size: size,
            ..TargetGeometry::default()
        },
    )
    .unwrap()
}

fn events(tree: &mut TargetTree, id: TargetId) -> Rc<RefCell<Vec<TargetEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    tree.subscribe(id, move |e| sink.borrow_mut().push(*e))
        .unwrap();
    log
}

#[test]
fn root_has_zero_anchor_area() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::splat(100.0));
    assert_eq!(tree.anchor_area_size(root).unwrap(), Vec3::ZERO);
    assert_eq!(tree.parent_local_size(root).unwrap(), Vec3::ZERO);
}

#[test]
fn anchor_area_scales_with_parent() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::new(200.0, 100.0, 10.0));
    let child = tree
        .insert_with(
            Some(root),
            TargetGeometry {
                anchor_min: Vec3::new(0.0, 0.25, 0.5),
                anchor_max: Vec3::new(1.0, 0.75, 0.5),
                ..TargetGeometry::default()
            },
        )
        .unwrap();
    assert_eq!(
        tree.anchor_area_size(child).unwrap(),
        Vec3::new(200.0, 50.0, 0.0)
    );
    let (min, max) = tree.anchor_area_min_max_pos(child).unwrap();
    assert_eq!(min, Vec3::new(-100.0, -25.0, 0.0));
    assert_eq!(max, Vec3::new(100.0, 25.0, 0.0));
}

#[test]
fn anchor_params_produce_size_and_offset() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::new(100.0, 100.0, 0.0));
    let child = tree.insert(Some(root)).unwrap();
    tree.update_local_size_with_anchor_param(
        child,
        Vec3::new(0.0, 0.0, 0.5),
        Vec3::new(1.0, 1.0, 0.5),
        Vec3::new(-10.0, -5.0, 0.0),
        Vec3::new(-20.0, 0.0, 0.0),
    )
    .unwrap();
    let t = tree.get(child).unwrap();
    assert!(t.local_size().nearly_eq(Vec3::new(70.0, 95.0, 0.0)));
    assert!(t.offset().nearly_eq(Vec3::new(-5.0, 2.5, 0.0)));
    assert!(t.local_pos().nearly_eq(Vec3::new(-5.0, 2.5, 0.0)));
    assert_eq!(t.anchor_mode(), AnchorMode::Area);

    let (omin, omax) = tree.anchor_offset_min_max(child).unwrap();
    assert!(omin.nearly_eq(Vec3::new(-10.0, -5.0, 0.0)));
    assert!(omax.nearly_eq(Vec3::new(-20.0, 0.0, 0.0)));
}

#[test]
fn anchor_offsets_round_trip_through_update() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::new(80.0, 60.0, 20.0));
    let child = tree
        .insert_with(
            Some(root),
            TargetGeometry {
                local_size: Vec3::new(30.0, 10.0, 4.0),
                anchor_min: Vec3::new(0.2, 0.5, 0.0),
                anchor_max: Vec3::new(0.6, 0.5, 1.0),
                offset: Vec3::new(3.0, -2.0, 1.0),
                ..TargetGeometry::default()
            },
        )
        .unwrap();
    let before = tree.get(child).unwrap().geometry();
    let (omin, omax) = tree.anchor_offset_min_max(child).unwrap();
    tree.update_local_size_with_anchor_param(
        child,
        before.anchor_min,
        before.anchor_max,
        omin,
        omax,
    )
    .unwrap();
    assert!(tree.get(child).unwrap().geometry().nearly_eq(&before));
}

#[test]
fn local_pos_follows_anchor_center() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::new(100.0, 50.0, 0.0));
    let child = tree
        .insert_with(
            Some(root),
            TargetGeometry {
                local_size: Vec3::splat(10.0),
                anchor_min: Vec3::new(1.0, 0.0, 0.5),
                anchor_max: Vec3::new(1.0, 0.0, 0.5),
                offset: Vec3::new(-5.0, 5.0, 0.0),
                ..TargetGeometry::default()
            },
        )
        .unwrap();
    let t = tree.get(child).unwrap();
    assert_eq!(t.local_pos(), Vec3::new(45.0, -20.0, 0.0));
    assert_eq!(t.anchor_mode(), AnchorMode::Point);
    let rect = t.local_rect();
    assert_eq!((rect.x0, rect.y0, rect.x1, rect.y1), (40.0, -25.0, 50.0, -15.0));

    tree.set_local_pos(child, Vec3::new(0.0, 0.0, 0.0)).unwrap();
    assert_eq!(
        tree.get(child).unwrap().offset(),
        Vec3::new(-50.0, 25.0, 0.0)
    );
}

#[test]
fn sizes_never_go_negative() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::splat(10.0));
    let child = tree.insert(Some(root)).unwrap();
    let offsets = [-30.0, -5.0, 0.0, 2.5, 40.0];
    for &a in &offsets {
        for &b in &offsets {
            tree.update_local_size_with_anchor_param(
                child,
                Vec3::new(0.0, 0.5, 0.25),
                Vec3::new(1.0, 0.5, 0.75),
                Vec3::splat(a),
                Vec3::splat(b),
            )
            .unwrap();
            let t = tree.get(child).unwrap();
            assert!(t.local_size().is_non_negative());
            let (lo, hi) = t.local_area_min_max_pos();
            assert!(lo.x <= hi.x && lo.y <= hi.y && lo.z <= hi.z);

            tree.update_local_size_with_size_and_anchor_param(
                child,
                Vec3::new(a, b, a - b),
                Vec3::HALF,
                Vec3::HALF,
                Vec3::ZERO,
            )
            .unwrap();
            assert!(tree.get(child).unwrap().local_size().is_non_negative());
        }
    }
}

#[test]
fn bulk_update_notifies_once() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::splat(100.0));
    let child = tree.insert(Some(root)).unwrap();
    let log = events(&mut tree, child);

    tree.update_local_size_with_size_and_anchor_param(
        child,
        Vec3::new(10.0, 20.0, 30.0),
        Vec3::ZERO,
        Vec3::ONE,
        Vec3::new(1.0, 2.0, 3.0),
    )
    .unwrap();
    assert_eq!(log.borrow().len(), 1);
    assert!(matches!(
        log.borrow()[0],
        TargetEvent::GeometryChanged { old } if old == TargetGeometry::default()
    ));

    tree.update_local_size_with_size_and_anchor_param(
        child,
        Vec3::new(10.00001, 20.0, 30.0),
        Vec3::ZERO,
        Vec3::ONE,
        Vec3::new(1.0, 2.0, 3.0),
    )
    .unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn inverted_anchors_are_swapped() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::splat(100.0));
    let child = tree.insert(Some(root)).unwrap();
    tree.update_local_size_with_size_and_anchor_param(
        child,
        Vec3::splat(5.0),
        Vec3::new(0.8, 0.0, 0.5),
        Vec3::new(0.2, 1.0, 0.5),
        Vec3::ZERO,
    )
    .unwrap();
    let t = tree.get(child).unwrap();
    assert_eq!(t.anchor_min(), Vec3::new(0.2, 0.0, 0.5));
    assert_eq!(t.anchor_max(), Vec3::new(0.8, 1.0, 0.5));
}

#[test]
fn anchor_mode_uses_epsilon() {
    let mut tree = TargetTree::new();
    let id = tree
        .insert_with(
            None,
            TargetGeometry {
                anchor_min: Vec3::splat(0.5),
                anchor_max: Vec3::splat(0.50005),
                ..TargetGeometry::default()
            },
        )
        .unwrap();
    assert_eq!(tree.get(id).unwrap().anchor_mode(), AnchorMode::Point);

    tree.update_local_size_with_size_and_anchor_param(
        id,
        Vec3::ZERO,
        Vec3::splat(0.5),
        Vec3::new(0.51, 0.5, 0.5),
        Vec3::ZERO,
    )
    .unwrap();
    assert_eq!(tree.get(id).unwrap().anchor_mode(), AnchorMode::Area);
}

#[test]
fn parent_resize_does_not_touch_children() {
    let mut tree = TargetTree::new();
    let root = parent_with_size(&mut tree, Vec3::splat(100.0));
    let child = tree
        .insert_with(
            Some(root),
            TargetGeometry {
                local_size: Vec3::splat(10.0),
                ..TargetGeometry::default()
            },
        )
        .unwrap();
    let log = events(&mut tree, child);
    let before = tree.get(child).unwrap().geometry();
    tree.set_local_size(root, Vec3::splat(300.0)).unwrap();
    assert_eq!(tree.get(child).unwrap().geometry(), before);
    assert!(log.borrow().is_empty());
}

#[test]
fn remove_drops_subtree_and_invalidates_ids() {
    let mut tree = TargetTree::new();
    let root = tree.insert(None).unwrap();
    let a = tree.insert(Some(root)).unwrap();
    let b = tree.insert(Some(a)).unwrap();
    let root_log = events(&mut tree, root);
    let b_log = events(&mut tree, b);

    assert_eq!(tree.remove(a).unwrap(), 2);
    assert_eq!(tree.len(), 1);
    assert!(!tree.contains(a));
    assert!(!tree.contains(b));
    assert!(tree.children(root).unwrap().is_empty());
    assert_eq!(*root_log.borrow(), vec![TargetEvent::ChildrenChanged]);
    assert_eq!(*b_log.borrow(), vec![TargetEvent::Removed]);

    let reused = tree.insert(Some(root)).unwrap();
    assert_ne!(reused, a);
    assert!(matches!(tree.get(a), Err(LayoutError::UnknownTarget(id)) if id == a));
}

#[test]
fn set_parent_rejects_cycles() {
    let mut tree = TargetTree::new();
    let root = tree.insert(None).unwrap();
    let child = tree.insert(Some(root)).unwrap();
    let grandchild = tree.insert(Some(child)).unwrap();
    assert!(tree.set_parent(root, Some(grandchild)).is_err());
    assert!(tree.set_parent(child, Some(child)).is_err());

    tree.set_parent(grandchild, Some(root)).unwrap();
    assert_eq!(tree.children(root).unwrap(), &[child, grandchild]);
    assert_eq!(tree.parent(grandchild).unwrap(), Some(root));

    tree.set_parent(child, None).unwrap();
    assert_eq!(tree.roots(), vec![root, child]);
}

#[test]
fn depth_counts_ancestors() {
    let mut tree = TargetTree::new();
    let a = tree.insert(None).unwrap();
    let b = tree.insert(Some(a)).unwrap();
    let c = tree.insert(Some(b)).unwrap();
    assert_eq!(tree.depth(a).unwrap(), 0);
    assert_eq!(tree.depth(c).unwrap(), 2);
    tree.set_parent(c, None).unwrap();
    assert_eq!(tree.depth(c).unwrap(), 0);
}
