use huddle_core::{JoinRejection, JoinRequest, NEW_USER_EVENT};
use reqwest::{Method, StatusCode};
use std::time::{Duration, Instant};

use crate::utils::{SseReader, TestServer, init_tracing};

#[tokio::test]
async fn test_host_rejection_conflicts() {
    init_tracing();

    let server = TestServer::start().await;
    let host = server.register().await;
    let player = server.register().await;

    let response = server
        .request(Method::GET, "/api/game/host", &host.id)
        .send()
        .await
        .unwrap();
    let mut stream = SseReader::new(response);
    let room = stream
        .next_frame_within(Duration::from_secs(5))
        .await
        .room_state();

    let started = Instant::now();
    let join = tokio::spawn({
        let request = server
            .request(Method::POST, "/api/game/rooms", &player.id)
            .json(&JoinRequest {
                room_id: room.id,
                sdp: "OFFER".into(),
            });
        async move { request.send().await }
    });

    let notification = stream.next_frame_within(Duration::from_secs(5)).await;
    assert_eq!(notification.event.as_deref(), Some(NEW_USER_EVENT));

    let rejected = server
        .request(Method::POST, "/api/game/host/reject", &host.id)
        .json(&JoinRejection {
            player_id: player.id,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::NO_CONTENT);

    let joined = join.await.unwrap().expect("Join request failed");
    assert_eq!(joined.status(), StatusCode::CONFLICT);
    // Well inside the five second join bound.
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_reject_requires_host() {
    init_tracing();

    let server = TestServer::start().await;
    let intruder = server.register().await;
    let player = server.register().await;

    let rejected = server
        .request(Method::POST, "/api/game/host/reject", &intruder.id)
        .json(&JoinRejection {
            player_id: player.id,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
}
