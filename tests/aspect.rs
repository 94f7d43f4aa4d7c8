use flowmap_distortion::{compute_fit, ContainerSize, FitScale, FitVector};

fn approx_eq2(a: (f64, f64), b: (f64, f64), eps: f64) -> bool {
    (a.0 - b.0).abs() < eps && (a.1 - b.1).abs() < eps
}

fn scale(w: f64, h: f64, aspect: f64) -> (f64, f64) {
    let fit = compute_fit(w, h, aspect).expect("valid geometry");
    (fit.scale_x, fit.scale_y)
}

#[test]
fn square_image_in_square_container_is_identity() {
    assert_eq!(scale(300.0, 300.0, 1.0), (1.0, 1.0));
}

#[test]
fn wide_container_crops_vertically() {
    // 100x100 image in a 200x100 container.
    assert_eq!(scale(200.0, 100.0, 100.0 / 100.0), (1.0, 0.5));
}

#[test]
fn tall_container_crops_horizontally() {
    assert_eq!(scale(100.0, 200.0, 1.0), (0.5, 1.0));
}

#[test]
fn matching_aspect_takes_second_branch() {
    // h/w == image aspect: the `else` branch yields (w/h * aspect, 1) = (1, 1).
    assert_eq!(scale(200.0, 100.0, 0.5), (1.0, 1.0));
    assert!(approx_eq2(scale(200.0, 100.0, 0.5 + 1e-9), (1.0, 1.0), 1e-6));
    assert!(approx_eq2(scale(200.0, 100.0, 0.5 - 1e-9), (1.0, 1.0), 1e-6));
}

#[test]
fn visible_region_keeps_container_aspect() {
    // The shader samples `scale` of the texture on each axis; in image pixels
    // that window must have the container's proportions, i.e. no stretching.
    let images = [(1920.0, 1080.0), (1080.0, 1920.0), (800.0, 800.0)];
    let containers = [(1280.0, 720.0), (375.0, 812.0), (640.0, 640.0), (1000.0, 333.0)];

    for &(iw, ih) in &images {
        for &(cw, ch) in &containers {
            let (sx, sy) = scale(cw, ch, ih / iw);
            assert!(sx <= 1.0 + 1e-12 && sy <= 1.0 + 1e-12, "image must cover: {sx} {sy}");
            assert!(sx == 1.0 || sy == 1.0, "one axis is always fully used");
            let visible = (sx * iw) / (sy * ih);
            assert!((visible - cw / ch).abs() < 1e-9, "image={iw}x{ih} container={cw}x{ch}");
        }
    }
}

#[test]
fn degenerate_geometry_has_no_fit() {
    assert_eq!(compute_fit(0.0, 100.0, 1.0), None);
    assert_eq!(compute_fit(100.0, 0.0, 1.0), None);
    assert_eq!(compute_fit(-5.0, 100.0, 1.0), None);
    assert_eq!(compute_fit(f64::NAN, 100.0, 1.0), None);
    assert_eq!(compute_fit(100.0, 100.0, 0.0), None);
    assert!(ContainerSize::new(0.0, 10.0).is_degenerate());
    assert!(!ContainerSize::new(0.5, 10.0).is_degenerate());
}

#[test]
fn fit_vector_packs_buffer_size_then_scale() {
    let fit = FitVector::new(
        640,
        360,
        FitScale {
            scale_x: 1.0,
            scale_y: 0.25,
        },
    );
    assert_eq!(fit.as_uniform(), [640.0, 360.0, 1.0, 0.25]);
}
