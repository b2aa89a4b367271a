use super::*;
use crate::audio::envelope::envelope_channel;
use crate::foundation::core::Canvas;
use crate::render::surface::surface_feed;
use crate::session::handle::CancelSource;

fn hallo_welt() -> Arc<Timeline> {
    Arc::new(Timeline::estimate("Hallo Welt"))
}

#[test]
fn active_word_drives_triangular_mouth() {
    let tl = hallo_welt();
    let w = tl.words()[0].clone();
    let mut clock = AnimationClock::new(tl);

    let mid = ((w.start_ms + w.end_ms) / 2.0) as u64;
    let s = clock.advance(mid, None);
    assert!(s.mouth_openness > 0.95);
    assert_eq!(s.active_subtitle.as_deref(), Some("Hallo"));
    assert_eq!(s.subtitle_text(), "Hallo");

    let s = clock.advance(0, None);
    assert_eq!(s.mouth_openness, 0.0);
}

#[test]
fn mouth_decays_monotonically_between_words() {
    let tl = hallo_welt();
    let w = tl.words()[0].clone();
    let mut clock = AnimationClock::new(tl.clone());
    clock.advance(((w.start_ms + w.end_ms) / 2.0) as u64, None);

    let after = tl.end_ms().unwrap() as u64 + 100;
    let mut prev = f32::INFINITY;
    for i in 0..30 {
        let s = clock.advance(after + i * 33, None);
        assert!(s.active_subtitle.is_none());
        assert_eq!(s.subtitle_text(), SUBTITLE_PLACEHOLDER);
        assert!(s.mouth_openness <= prev);
        assert!(s.mouth_openness >= 0.0);
        prev = s.mouth_openness;
    }
    assert!(prev < 0.01);
}

#[test]
fn live_envelope_overrides_estimate_but_subtitles_stay_estimated() {
    let mut clock = AnimationClock::new(hallo_welt());
    let s = clock.advance(0, Some(0.42));
    assert_eq!(s.mouth_openness, 0.42);
    assert_eq!(s.active_subtitle.as_deref(), Some("Hallo"));

    let s = clock.advance(100_000, Some(3.0));
    assert_eq!(s.mouth_openness, 1.0);
    assert!(s.active_subtitle.is_none());
}

#[test]
fn frames_are_numbered_sequentially() {
    let mut clock = AnimationClock::new(Arc::new(Timeline::default()));
    for i in 0..5 {
        assert_eq!(clock.advance(i * 10, None).frame, FrameIndex(i));
    }
}

#[tokio::test(start_paused = true)]
async fn epoch_measures_from_restart() {
    let epoch = ClockEpoch::new();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(epoch.elapsed_ms(), 250);
    epoch.restart();
    assert_eq!(epoch.elapsed_ms(), 0);
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(epoch.elapsed_ms(), 40);
}

#[tokio::test(start_paused = true)]
async fn frame_loop_publishes_until_cancelled() {
    let canvas = Canvas {
        width: 64,
        height: 36,
    };
    let renderer = SceneRenderer::new(canvas, "T", "t", None).unwrap();
    let (writer, reader) = envelope_channel();
    let (publisher, stream) = surface_feed();
    let (state_tx, state_rx) = watch::channel(AnimationState::default());
    let frame_loop = FrameLoop::new(
        AnimationClock::new(hallo_welt()),
        renderer,
        reader,
        publisher,
        Arc::new(state_tx),
        Fps::new(10, 1).unwrap(),
    );

    writer.publish(0.5);
    let cancel = CancelSource::new();
    let task = tokio::spawn(frame_loop.run(ClockEpoch::new(), cancel.token()));

    tokio::time::sleep(Duration::from_millis(350)).await;
    let st = state_rx.borrow().clone();
    assert!(st.frame.0 >= 3);
    assert_eq!(st.mouth_openness, 0.5);
    assert_eq!(stream.latest().unwrap().width, 64);

    cancel.cancel();
    task.await.unwrap();
    let frozen = state_rx.borrow().frame;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(state_rx.borrow().frame, frozen);
}
