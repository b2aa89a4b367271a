use super::*;

fn state(openness: f32, subtitle: Option<&str>) -> AnimationState {
    AnimationState {
        frame: crate::foundation::core::FrameIndex(0),
        elapsed_ms: 0,
        mouth_openness: openness,
        active_subtitle: subtitle.map(str::to_string),
    }
}

fn small() -> Canvas {
    Canvas {
        width: 320,
        height: 180,
    }
}

#[test]
fn mouth_height_interpolates_between_closed_and_open() {
    assert_eq!(AvatarLayout::mouth_height(0.0), 2.0);
    assert_eq!(AvatarLayout::mouth_height(1.0), 16.0);
    assert_eq!(AvatarLayout::mouth_height(0.5), 9.0);
    assert_eq!(AvatarLayout::mouth_height(7.0), 16.0);
    assert_eq!(AvatarLayout::mouth_height(-1.0), 2.0);
    assert_eq!(AvatarLayout::mouth_height(f32::NAN), 2.0);
}

#[test]
fn layout_follows_canvas_proportions() {
    let l = AvatarLayout::new(Canvas::default());
    assert!((l.center_x - 704.0).abs() < 1e-9);
    assert!((l.center_y - 374.4).abs() < 1e-9);
    assert!((l.head_radius - 82.8).abs() < 1e-9);
    assert!((l.subtitle_box.y0 - 630.0).abs() < 1e-9);
    assert!((l.subtitle_box.width() - 1152.0).abs() < 1e-9);
    assert!((l.subtitle_box.height() - 54.0).abs() < 1e-9);

    let m = l.mouth_rect(1.0);
    assert!((m.height() - 16.0).abs() < 1e-9);
    assert!((m.center().y - (l.center_y + 22.0)).abs() < 1e-9);
}

#[test]
fn rounded_clamps_radius() {
    let r = rounded(Rect::new(0.0, 0.0, 36.0, 2.0), 8.0);
    assert!((r.radii().top_left - 1.0).abs() < 1e-9);
}

#[test]
fn render_produces_full_opaque_frame() {
    let mut r = SceneRenderer::new(small(), "T", "t", None).unwrap();
    assert!(!r.has_font());
    let f = r.render(&state(0.0, None)).unwrap();
    assert_eq!(f.width, 320);
    assert_eq!(f.height, 180);
    assert_eq!(f.data.len(), 320 * 180 * 4);
    assert!(f.premultiplied);

    let top_left = f.pixel(0, 0).unwrap();
    assert_eq!(top_left[3], 255);
    assert!(top_left[0] >= 0xe0 && top_left[2] >= 0xf0);
}

#[test]
fn open_mouth_paints_more_mouth_pixels() {
    let canvas = Canvas {
        width: 640,
        height: 360,
    };
    let mut r = SceneRenderer::new(canvas, "T", "t", None).unwrap();
    let l = *r.layout();
    let x = l.center_x.round() as u32;
    let y = (l.center_y + 22.0 - 6.0).round() as u32;

    let closed = r.render(&state(0.0, None)).unwrap();
    let open = r.render(&state(1.0, None)).unwrap();
    let mouth = [MOUTH.r, MOUTH.g, MOUTH.b, MOUTH.a];
    assert_eq!(open.pixel(x, y).unwrap(), mouth);
    assert_ne!(closed.pixel(x, y).unwrap(), mouth);
}

#[test]
fn subtitle_box_darkens_background() {
    let mut r = SceneRenderer::new(small(), "T", "t", None).unwrap();
    let f = r.render(&state(0.0, Some("Hallo"))).unwrap();
    let b = r.layout().subtitle_box;
    let inside = f.pixel((b.x0 + 20.0) as u32, (b.y0 + 5.0) as u32).unwrap();
    let above = f.pixel((b.x0 + 20.0) as u32, (b.y0 - 5.0) as u32).unwrap();
    assert!(inside[0] < 100);
    assert!(above[0] > 200);
}

#[test]
fn renderer_rejects_odd_canvas_and_empty_font() {
    let odd = Canvas {
        width: 321,
        height: 180,
    };
    assert!(SceneRenderer::new(odd, "T", "t", None).is_err());
    assert!(SceneRenderer::new(small(), "T", "t", Some(Vec::new())).is_err());
}
