use crate::utils::*;
use huddle_core::{AppEvent, UserId};

fn toggles(link: &MockLink) -> Vec<bool> {
    link.sent()
        .into_iter()
        .filter_map(|m| match m.event {
            AppEvent::MicToggle { mic } => Some(mic),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_mic_swaps_track_on_live_sessions() {
    init_tracing();

    let fixture = HostFixture::start().await;
    let (_p1, link1) = fixture.connect().await;

    fixture
        .host
        .handle_my_media_stream(Some(audio_track()))
        .unwrap();
    assert!(wait_until(WAIT_TIMEOUT_MS, || toggles(&link1) == vec![true]).await);
    assert_eq!(link1.audio(), vec![true]);

    fixture.host.handle_my_media_stream(None).unwrap();
    assert!(wait_until(WAIT_TIMEOUT_MS, || toggles(&link1) == vec![true, false]).await);
    assert_eq!(link1.audio(), vec![true, false]);

    let me = fixture.host.me();
    assert!(!fixture.host.view().borrow().player(&me).unwrap().mic);
}

#[tokio::test]
async fn test_late_joiner_gets_the_track_before_answering() {
    init_tracing();

    let fixture = HostFixture::start().await;
    fixture
        .host
        .handle_my_media_stream(Some(audio_track()))
        .unwrap();

    let me = fixture.host.me();
    let view = fixture.host.view();
    assert!(wait_until(WAIT_TIMEOUT_MS, || view.borrow().player(&me).unwrap().mic).await);

    let link = fixture.negotiate(UserId::new()).await;
    assert_eq!(link.audio(), vec![true]);
}
