use crate::geometry::{SkeletonClipper, Triangulator};

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 0.001,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

#[test]
fn triangulator_splits_rectangle_into_two_triangles() {
    let triangulator = Triangulator::default();

    let polygon = vec![0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0];
    let triangles = triangulator.triangulate(&polygon);
    assert_eq!(triangles, vec![3, 0, 1, 3, 1, 2]);

    let polys = triangulator.decompose(&polygon, &triangles);
    assert_eq!(polys.len(), 1);
    let poly0 = &polys[0];
    assert_eq!(poly0.len(), 8);
    let expected = [0.0, 100.0, 0.0, 0.0, 100.0, 0.0, 100.0, 100.0];
    for (actual, expected) in poly0.iter().copied().zip(expected) {
        assert_approx(actual, expected);
    }
}

#[test]
fn triangulator_handles_concave_polygon() {
    let triangulator = Triangulator::default();

    // An L shape: six points, four triangles.
    let polygon = vec![0.0, 0.0, 20.0, 0.0, 20.0, 10.0, 10.0, 10.0, 10.0, 20.0, 0.0, 20.0];
    let triangles = triangulator.triangulate(&polygon);
    assert_eq!(triangles.len(), 12);
    assert!(triangles.iter().all(|&i| i < 6));

    let polys = triangulator.decompose(&polygon, &triangles);
    assert!(polys.len() >= 2);
    assert!(polys.iter().all(|p| p.len() >= 6 && p.len() % 2 == 0));
}

#[test]
fn clipper_cuts_triangle_with_band() {
    let mut clipper = SkeletonClipper::default();

    let clip_polygon = vec![0.0, 50.0, 100.0, 50.0, 100.0, 70.0, 0.0, 70.0];
    assert!(clipper.clip_start(&clip_polygon, None));
    assert!(clipper.is_clipping());

    let vertices = vec![0.0, 0.0, 100.0, 0.0, 50.0, 150.0];
    let indices: Vec<u16> = vec![0, 1, 2];

    let (clipped_vertices, clipped_indices) = clipper.clip_triangles(&vertices, &indices);

    let expected_vertices = vec![
        83.333328, 50.0, 76.666664, 70.0, 23.333334, 70.0, 16.666672, 50.0,
    ];
    assert_eq!(clipped_vertices.len(), expected_vertices.len());
    for (actual, expected) in clipped_vertices.iter().copied().zip(expected_vertices) {
        assert_approx(actual, expected);
    }
    assert_eq!(clipped_indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn clipper_keeps_inside_triangle_and_drops_outside_one() {
    let mut clipper = SkeletonClipper::default();
    clipper.clip_start(&[0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0], None);

    let inside = [10.0, 10.0, 20.0, 10.0, 10.0, 20.0];
    let (vertices, triangles) = clipper.clip_triangles(&inside, &[0, 1, 2]);
    assert_eq!(vertices, inside.to_vec());
    assert_eq!(triangles, vec![0, 1, 2]);

    let outside = [200.0, 200.0, 210.0, 200.0, 200.0, 210.0];
    let (vertices, triangles) = clipper.clip_triangles(&outside, &[0, 1, 2]);
    assert!(vertices.is_empty());
    assert!(triangles.is_empty());
}

#[test]
fn clipping_ends_at_its_end_slot_only() {
    let mut clipper = SkeletonClipper::default();
    let square = [0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0];
    assert!(clipper.clip_start(&square, Some(3)));
    assert!(!clipper.clip_start(&square, Some(5)));

    clipper.clip_end_slot(2);
    assert!(clipper.is_clipping());
    clipper.clip_end_slot(3);
    assert!(!clipper.is_clipping());

    assert!(!clipper.clip_start(&[0.0, 0.0, 1.0, 1.0], None));
}

#[test]
fn clipped_triangle_indices_wrap_past_u16() {
    let mut clipper = SkeletonClipper::default();
    clipper.clip_start(&[0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0], None);

    let inside = [10.0, 10.0, 20.0, 10.0, 10.0, 20.0];
    let triangles: Vec<u16> = [0, 1, 2].repeat(21_846);
    let (vertices, clipped) = clipper.clip_triangles(&inside, &triangles);
    assert_eq!(vertices.len(), 21_846 * 6);
    assert_eq!(clipped[..3], [0, 1, 2]);
    assert_eq!(clipped[clipped.len() - 3..], [65_535, 0, 1]);
}
