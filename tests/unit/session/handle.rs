use super::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

#[test]
fn tokens_observe_cancel_and_drop() {
    let src = CancelSource::new();
    let tok = src.token();
    assert!(!tok.is_cancelled());
    src.cancel();
    assert!(tok.is_cancelled());

    let src = CancelSource::new();
    let tok = src.token();
    drop(src);
    assert!(tok.is_cancelled());
}

#[test]
fn child_follows_parent_but_not_vice_versa() {
    let parent = CancelSource::new();
    let child = parent.token().child();
    let child_tok = child.token();

    child.cancel();
    assert!(child_tok.is_cancelled());
    assert!(!parent.is_cancelled());

    let child2 = parent.token().child();
    let tok2 = child2.token();
    parent.cancel();
    assert!(tok2.is_cancelled());
    assert!(child2.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn cancelled_future_resolves_through_parent() {
    let parent = CancelSource::new();
    let child = parent.token().child();
    let tok = child.token();
    let waiter = tokio::spawn(async move { tok.cancelled().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());
    parent.cancel();
    waiter.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_tasks_to_observe_cancellation() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let mut session = SessionHandle::new();
    let token = session.token();
    let t = Arc::clone(&ticks);
    session.spawn("ticker", async move {
        let mut iv = tokio::time::interval(Duration::from_millis(10));
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = iv.tick() => { t.fetch_add(1, Ordering::SeqCst); }
            }
        }
    });
    tokio::time::sleep(Duration::from_millis(55)).await;
    assert_eq!(session.running_tasks(), 1);
    session.shutdown().await;
    let after = ticks.load(Ordering::SeqCst);
    assert!(after >= 5);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), after);
}

#[test]
fn session_ids_are_unique() {
    let a = SessionHandle::new();
    let b = SessionHandle::new();
    assert_ne!(a.id(), b.id());
}
