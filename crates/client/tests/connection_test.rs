//! Connection behaviour through the public API: routing, decorators and mocks.

use {
    pretty_assertions::assert_eq,
    restmap_client::{testing::MockConnection, *},
    serde_json::json,
    std::sync::Arc,
};

fn params(value: serde_json::Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn shared_mock_records_requests_through_arc() -> anyhow::Result<()> {
    let mock = Arc::new(
        MockConnection::new()
            .with_route("users.search", "/users")
            .respond("users.search", 200, json!({"data": [{"id": "1"}]})),
    );
    let connection: Arc<dyn Connection> = mock.clone();

    let response = connection
        .get("users.search", &params(json!({"filter": {"email": "a@example.com"}})))
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.json()?, json!({"data": [{"id": "1"}]}));
    mock.assert_route_called("users.search", json!({"filter": {"email": "a@example.com"}}));
    assert_eq!(
        connection.route("users.search", &params(json!({"filter": {"email": "a@example.com"}})))?,
        "http://mock.test/users?filter[email]=a%40example.com"
    );
    Ok(())
}

#[tokio::test]
async fn transport_failures_are_not_retried() -> anyhow::Result<()> {
    let mock = MockConnection::new().fail("users.search", "connection refused");
    let logged = LoggingConnection::new(mock);

    let err = logged
        .get("users.search", &Params::new())
        .await
        .expect_err("transport failure should surface");

    assert!(err.is_transport());
    assert_eq!(logged.inner().request_count(), 1);
    assert_eq!(logged.entries().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn write_methods_carry_bodies() -> anyhow::Result<()> {
    let mock = MockConnection::new().respond("users.create", 201, json!({"id": "9"}));

    let response = mock
        .post("users.create", &Params::new(), &json!({"email": "new@example.com"}))
        .await?;

    assert_eq!(response.status(), 201);
    let recorded = mock.requests_for("users.create");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, Method::Post);
    assert_eq!(recorded[0].body, Some(json!({"email": "new@example.com"})));
    Ok(())
}
