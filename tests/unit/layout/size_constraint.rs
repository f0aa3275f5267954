use super::*;
use crate::{foundation::core::Bound3, geometry::target::TargetGeometry};

fn sized(tree: &mut TargetTree, size: Vec3) -> TargetId {
    tree.insert_with(
        None,
        TargetGeometry {
            local_size: size,
            ..TargetGeometry::default()
        },
    )
    .unwrap()
}

#[test]
fn applies_floor_and_ceiling() {
    let mut tree = TargetTree::new();
    let t = sized(&mut tree, Vec3::splat(50.0));
    let info = tree.info_mut(t).unwrap();
    info.set_min_size(Bound3::fixed(Vec3::splat(20.0)));
    info.set_layout_size(Bound3::new(Some(40.0), None, None));

    let mut layout = SizeConstraintLayout::new(&mut tree, t).unwrap();
    assert_eq!(
        layout.operation_target_flags(),
        OperationTargetFlags::SELF_LOCAL_AREA
    );
    layout.update_unit_size(&mut tree).unwrap();
    assert_eq!(layout.resolved_size(), Some(Vec3::new(40.0, 50.0, 50.0)));
    layout.update_layout(&mut tree).unwrap();
    assert_eq!(tree.get(t).unwrap().local_size(), Vec3::new(40.0, 50.0, 50.0));
    assert!(!layout.do_changed());
}

#[test]
fn keeps_anchors_and_offset() {
    let mut tree = TargetTree::new();
    let t = tree
        .insert_with(
            None,
            TargetGeometry {
                local_size: Vec3::splat(5.0),
                anchor_min: Vec3::new(0.1, 0.2, 0.3),
                anchor_max: Vec3::new(0.4, 0.5, 0.6),
                offset: Vec3::new(1.0, 2.0, 3.0),
                ..TargetGeometry::default()
            },
        )
        .unwrap();
    tree.info_mut(t)
        .unwrap()
        .set_min_size(Bound3::fixed(Vec3::splat(8.0)));
    let mut layout = SizeConstraintLayout::new(&mut tree, t).unwrap();
    layout.force_update_layout(&mut tree).unwrap();
    let g = tree.get(t).unwrap().geometry();
    assert_eq!(g.local_size, Vec3::splat(8.0));
    assert_eq!(g.anchor_min, Vec3::new(0.1, 0.2, 0.3));
    assert_eq!(g.offset, Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn validate_flags_ceiling_below_floor() {
    let mut tree = TargetTree::new();
    let t = sized(&mut tree, Vec3::splat(50.0));
    let layout = SizeConstraintLayout::new(&mut tree, t).unwrap();
    assert!(layout.validate(&tree).is_ok());

    let info = tree.info_mut(t).unwrap();
    info.set_min_size(Bound3::fixed(Vec3::splat(20.0)));
    info.set_layout_size(Bound3::new(None, Some(10.0), None));
    assert!(matches!(
        layout.validate(&tree),
        Err(LayoutError::Validation(msg)) if msg.contains("Y")
    ));
}

#[test]
fn unbound_layout_reports_validation_error() {
    let mut tree = TargetTree::new();
    let t = sized(&mut tree, Vec3::ONE);
    let mut layout = SizeConstraintLayout::new(&mut tree, t).unwrap();
    layout.dispose(&mut tree);
    assert!(layout.update_layout(&mut tree).is_err());
}
