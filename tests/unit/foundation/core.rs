use super::*;

#[test]
fn fps_validation_and_period() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    let fps = Fps::default();
    assert_eq!(fps.as_f64(), 30.0);
    let ms = fps.frame_period().as_secs_f64() * 1000.0;
    assert!((ms - 33.333).abs() < 0.01);
}

#[test]
fn canvas_defaults_to_720p_and_validates() {
    let c = Canvas::default();
    assert_eq!((c.width, c.height), (1280, 720));
    assert!(c.validate().is_ok());
    assert_eq!(c.rgba_len(), 1280 * 720 * 4);

    assert!(Canvas { width: 0, height: 2 }.validate().is_err());
    assert!(Canvas { width: 11, height: 10 }.validate().is_err());
    assert!(
        Canvas {
            width: 70_000,
            height: 10
        }
        .validate()
        .is_err()
    );
}

#[test]
fn premultiply_rounds_half_alpha() {
    let c = Rgba8Premul::from_straight_rgba(255, 0, 0, 128);
    assert_eq!(c, Rgba8Premul { r: 128, g: 0, b: 0, a: 128 });
    assert_eq!(Rgba8Premul::opaque(1, 2, 3).to_array(), [1, 2, 3, 255]);
}
