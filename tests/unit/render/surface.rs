use super::*;

#[test]
fn stream_sees_latest_frame_only() {
    let (publisher, stream) = surface_feed();
    assert!(stream.latest().is_none());

    let c = Canvas { width: 2, height: 2 };
    let mut a = FrameRGBA::blank(c);
    a.data[0] = 1;
    let mut b = FrameRGBA::blank(c);
    b.data[0] = 2;
    publisher.publish(a);
    publisher.publish(b);

    assert_eq!(stream.latest().map(|f| f.data[0]), Some(2));
    assert_eq!(publisher.stream().latest().map(|f| f.data[0]), Some(2));
}

#[test]
fn pixel_lookup_is_bounds_checked() {
    let mut f = FrameRGBA::blank(Canvas { width: 2, height: 2 });
    f.data[12..16].copy_from_slice(&[9, 8, 7, 255]);
    assert_eq!(f.pixel(1, 1), Some([9, 8, 7, 255]));
    assert_eq!(f.pixel(2, 0), None);
}

#[test]
fn save_png_writes_a_file() {
    let dir = std::env::temp_dir().join(format!("smartwelcome-png-{}", std::process::id()));
    let path = dir.join("frame.png");
    let f = FrameRGBA::blank(Canvas { width: 4, height: 4 });
    f.save_png(&path).unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
    std::fs::remove_dir_all(dir).unwrap();
}
