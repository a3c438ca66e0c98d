use super::support::spawn_server;

#[tokio::test]
async fn healthz_endpoint_returns_ok() {
    let server = spawn_server().await;

    let response = reqwest::get(format!("http://{}/healthz", server.addr))
        .await
        .expect("healthz endpoint should respond");

    assert!(response.status().is_success());
    let body = response.text().await.expect("healthz body should be readable");
    assert_eq!(body, "ok");

    server.stop().await;
}
