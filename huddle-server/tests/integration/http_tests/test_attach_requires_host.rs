use huddle_core::{HostAnswer, MembershipChange};
use reqwest::{Method, StatusCode};
use std::time::Duration;

use crate::utils::{SseReader, TestServer, init_tracing};

#[tokio::test]
async fn test_attach_requires_host() {
    init_tracing();

    let server = TestServer::start().await;
    let host = server.register().await;
    let intruder = server.register().await;
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

    let attach = server
        .request(Method::PUT, "/api/game/host", &intruder.id)
        .json(&MembershipChange {
            room_id: room.id,
            player_id: player.id,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(attach.status(), StatusCode::UNAUTHORIZED);

    let answer = server
        .request(Method::POST, "/api/game/host", &intruder.id)
        .json(&HostAnswer {
            player_id: player.id,
            sdp: "FORGED".into(),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(answer.status(), StatusCode::UNAUTHORIZED);
}
