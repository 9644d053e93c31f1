use huddle_core::{ProfileUpdate, UserRecord};
use reqwest::{Method, StatusCode};

use crate::utils::{TestServer, init_tracing};

#[tokio::test]
async fn test_profile_update() {
    init_tracing();

    let server = TestServer::start().await;
    let user = server.register().await;
    assert_eq!(user.name, UserRecord::GUEST_NAME);
    assert_eq!(user.color, UserRecord::GUEST_COLOR);

    let updated: UserRecord = server
        .request(Method::PUT, "/api/user", &user.id)
        .json(&ProfileUpdate {
            name: Some("Ada".into()),
            color: Some("#336699".into()),
            user_id: None,
        })
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.name, "Ada");
    assert_eq!(updated.color, "#336699");

    let empty = server
        .request(Method::PUT, "/api/user", &user.id)
        .json(&ProfileUpdate::default())
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}
