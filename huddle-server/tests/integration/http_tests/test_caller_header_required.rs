use huddle_core::USER_HEADER;
use reqwest::{Method, StatusCode};

use crate::utils::{TestServer, init_tracing};

#[tokio::test]
async fn test_caller_header_required() {
    init_tracing();

    let server = TestServer::start().await;

    let missing = server
        .anonymous(Method::GET, "/api/user")
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let malformed = server
        .anonymous(Method::GET, "/api/user")
        .header(USER_HEADER, "not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let user = server.register().await;
    let me = server
        .request(Method::GET, "/api/user", &user.id)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
}
