use huddle_core::JoinRequest;
use reqwest::{Method, StatusCode};
use std::time::Duration;

use crate::utils::{SseReader, TestServer, init_tracing};

#[tokio::test]
async fn test_join_times_out_without_answer() {
    init_tracing();

    let server = TestServer::with_join_timeout(Duration::from_millis(300)).await;
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

    let joined = server
        .request(Method::POST, "/api/game/rooms", &player.id)
        .json(&JoinRequest {
            room_id: room.id,
            sdp: "OFFER".into(),
        })
        .send()
        .await
        .unwrap();

    assert_eq!(joined.status(), StatusCode::GATEWAY_TIMEOUT);
}
