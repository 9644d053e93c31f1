use huddle_core::{MembershipChange, SeekRoom, UserRecord};
use reqwest::{Method, StatusCode};
use std::time::Duration;

use crate::utils::{SseReader, TestServer, init_tracing};

#[tokio::test]
async fn test_open_rooms_count_members() {
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

    let change = MembershipChange {
        room_id: room.id,
        player_id: player.id,
    };
    let attached: UserRecord = server
        .request(Method::PUT, "/api/game/host", &host.id)
        .json(&change)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(attached.room_id, Some(room.id));

    let rooms: Vec<SeekRoom> = server
        .request(Method::GET, "/api/game/rooms", &player.id)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_id, room.id);
    assert_eq!(rooms[0].member_count, 2);

    let detached = server
        .request(Method::DELETE, "/api/game/host", &host.id)
        .json(&change)
        .send()
        .await
        .unwrap();
    assert_eq!(detached.status(), StatusCode::OK);
    let record: UserRecord = detached.json().await.unwrap();
    assert_eq!(record.room_id, None);
}
