mod common;

use {
    anyhow::Result,
    pretty_assertions::assert_eq,
    restmap_orm::prelude::*,
    serde_json::json,
};

#[tokio::test]
async fn embedded_belongs_to_costs_no_request() -> Result<()> {
    common::init_tracing();
    let mock = Arc::new(common::mock().respond(
        "users.search",
        200,
        json!({"data": [
            {"id": "1", "account_id": "10", "account": {"id": "10", "name": "Acme"}},
            {"id": "2", "account_id": "11", "account": {"id": "11", "name": "Globex"}}
        ]}),
    ));
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["account"]).fetch().await?;

    assert_eq!(mock.request_count(), 1);
    mock.assert_route_called("users.search", json!({"include": "account"}));
    let names: Vec<_> = users
        .iter()
        .map(|u| u.one("account").and_then(|a| a.get("name")).and_then(|n| n.as_str()))
        .collect();
    assert_eq!(names, vec![Some("Acme"), Some("Globex")]);
    Ok(())
}

#[tokio::test]
async fn belongs_to_batches_distinct_identifiers_into_one_request() -> Result<()> {
    let mock = Arc::new(
        common::mock()
            .respond(
                "users.search",
                200,
                json!({"data": [
                    {"id": "1", "account_id": "10"},
                    {"id": "2", "account_id": "11"},
                    {"id": "3", "account_id": "10"}
                ]}),
            )
            .respond(
                "accounts.search",
                200,
                json!({"data": [{"id": "10", "name": "Acme"}, {"id": "11", "name": "Globex"}]}),
            ),
    );
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["account"]).fetch().await?;

    assert_eq!(mock.request_count(), 2);
    assert_eq!(mock.requests_for("accounts.search").len(), 1);
    mock.assert_route_called("accounts.search", json!({"filter": {"id": "10,11"}}));

    let accounts: Vec<_> = users
        .iter()
        .map(|u| u.one("account").and_then(Entity::id_string))
        .collect();
    assert_eq!(
        accounts,
        vec![Some("10".to_string()), Some("11".to_string()), Some("10".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn single_identifier_uses_view_route() -> Result<()> {
    let mock = Arc::new(
        common::mock()
            .respond("users.search", 200, json!({"data": [{"id": "1", "account_id": "10"}]}))
            .respond_when(
                "accounts.view",
                json!({"id": "10"}),
                200,
                json!({"data": {"id": "10", "name": "Acme"}}),
            ),
    );
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["account"]).fetch().await?;

    mock.assert_route_called("accounts.view", json!({"id": "10"}));
    assert!(mock.requests_for("accounts.search").is_empty());
    let account = users[0].one("account").expect("account resolved");
    assert_eq!(account.get("name").and_then(|n| n.as_str()), Some("Acme"));
    assert!(account.exists());
    Ok(())
}

#[tokio::test]
async fn related_model_without_search_route_is_looked_up_per_identifier() -> Result<()> {
    let mock = Arc::new(
        common::mock()
            .respond(
                "accounts.search",
                200,
                json!({"data": [
                    {"id": "10", "plan_id": "p1"},
                    {"id": "11", "plan_id": "p2"},
                    {"id": "12", "plan_id": "p1"}
                ]}),
            )
            .respond_when("plans.view", json!({"id": "p1"}), 200, json!({"id": "p1", "seats": 5}))
            .respond_when("plans.view", json!({"id": "p2"}), 200, json!({"id": "p2", "seats": 50})),
    );
    let manager = common::manager(mock.clone());

    let accounts = manager.query("Account")?.include(["plan"]).fetch().await?;

    assert_eq!(mock.requests_for("plans.view").len(), 2);
    let seats: Vec<_> = accounts
        .iter()
        .map(|a| a.one("plan").and_then(|p| p.get("seats")).and_then(|s| s.as_i64()))
        .collect();
    assert_eq!(seats, vec![Some(5), Some(50), Some(5)]);
    Ok(())
}

#[tokio::test]
async fn unmatched_belongs_to_is_null_by_default() -> Result<()> {
    let mock = Arc::new(
        common::mock().respond("users.search", 200, json!([{"id": "1", "account_id": "99"}])),
    );
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["account"]).fetch().await?;

    assert!(users[0].is_loaded("account"));
    assert!(users[0].one("account").is_none());
    assert_eq!(mock.requests_for("accounts.view").len(), 1);
    Ok(())
}

#[tokio::test]
async fn unmatched_belongs_to_can_yield_a_new_instance() -> Result<()> {
    let mock = Arc::new(
        common::mock().respond("users.search", 200, json!([{"id": "1", "sponsor_id": "99"}])),
    );
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["sponsor"]).fetch().await?;

    let sponsor = users[0].one("sponsor").expect("placeholder sponsor");
    assert_eq!(sponsor.model(), "Account");
    assert!(!sponsor.exists());
    assert!(sponsor.raw().is_empty());
    Ok(())
}

#[tokio::test]
async fn embedded_has_many_indexes_last_duplicate_wins() -> Result<()> {
    let mock = Arc::new(common::mock().respond(
        "users.search",
        200,
        json!({"data": [{"id": "1", "posts": [
            {"id": "p1", "title": "first"},
            {"id": "p2", "title": "other"},
            {"id": "p1", "title": "second"}
        ]}]}),
    ));
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["posts"]).fetch().await?;

    assert_eq!(mock.request_count(), 1);
    let posts = users[0].many("posts").expect("posts resolved");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts.keys().collect::<Vec<_>>(), vec![Some("p1"), Some("p2")]);
    assert_eq!(
        posts.get("p1").and_then(|p| p.get("title")).and_then(|t| t.as_str()),
        Some("second")
    );
    Ok(())
}

#[tokio::test]
async fn lazy_has_many_refetches_parent_with_include() -> Result<()> {
    let mock = Arc::new(
        common::mock()
            .respond("users.search", 200, json!({"data": [{"id": "1", "name": "Ann"}]}))
            .respond_when(
                "users.view",
                json!({"id": "1"}),
                200,
                json!({"data": {"id": "1", "posts": [{"id": "p1", "title": "Hello"}]}}),
            ),
    );
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["posts"]).fetch().await?;

    assert_eq!(mock.request_count(), 2);
    mock.assert_route_called("users.view", json!({"id": "1", "include": "posts"}));
    let posts = users[0].many("posts").expect("posts resolved");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts.first().and_then(Entity::id_string), Some("p1".to_string()));
    Ok(())
}

#[tokio::test]
async fn non_lazy_has_many_without_data_is_empty() -> Result<()> {
    let mock = Arc::new(common::mock().respond("users.search", 200, json!([{"id": "1"}])));
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["drafts"]).fetch().await?;

    assert_eq!(mock.request_count(), 1);
    assert!(users[0].many("drafts").is_some_and(Collection::is_empty));
    Ok(())
}

#[tokio::test]
async fn nested_includes_resolve_on_children() -> Result<()> {
    let mock = Arc::new(
        common::mock()
            .respond(
                "users.search",
                200,
                json!([{"id": "1", "account": {"id": "10", "plan_id": "gold"}}]),
            )
            .respond_when(
                "plans.view",
                json!({"id": "gold"}),
                200,
                json!({"id": "gold", "seats": 25}),
            ),
    );
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["account.plan"]).fetch().await?;

    assert_eq!(mock.request_count(), 2);
    let plan = users[0]
        .one("account")
        .and_then(|a| a.one("plan"))
        .expect("plan resolved through account");
    assert_eq!(plan.get("seats").and_then(|s| s.as_i64()), Some(25));
    Ok(())
}

#[tokio::test]
async fn nested_include_is_forwarded_to_related_request() -> Result<()> {
    let mock = Arc::new(
        common::mock()
            .respond("users.search", 200, json!([{"id": "1", "account_id": "10"}]))
            .respond(
                "accounts.view",
                200,
                json!({"id": "10", "plan": {"id": "gold", "seats": 25}}),
            ),
    );
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["account.plan"]).fetch().await?;

    mock.assert_route_called("accounts.view", json!({"id": "10", "include": "plan"}));
    assert!(mock.requests_for("plans.view").is_empty());
    assert!(users[0].one("account").and_then(|a| a.one("plan")).is_some());
    Ok(())
}

#[tokio::test]
async fn loading_twice_sends_one_request() -> Result<()> {
    let mock = Arc::new(
        common::mock()
            .respond_when("users.view", json!({"id": "1"}), 200, json!({"id": "1", "account_id": "10"}))
            .respond("accounts.view", 200, json!({"id": "10"})),
    );
    let manager = common::manager(mock.clone());

    let mut user = manager.locator("User")?.find_or_fail("1").await?;
    assert!(!user.is_loaded("account"));

    let first = user.load("account", &manager).await?;
    assert!(first.as_one().is_some());
    user.load("account", &manager).await?;

    assert_eq!(mock.requests_for("accounts.view").len(), 1);
    Ok(())
}

#[tokio::test]
async fn loading_an_undeclared_relationship_fails() -> Result<()> {
    let mock = Arc::new(common::mock().respond("users.view", 200, json!({"id": "1"})));
    let manager = common::manager(mock.clone());

    let mut user = manager.locator("User")?.find_or_fail("1").await?;
    let err = user.load("friends", &manager).await.unwrap_err();

    assert!(matches!(err, OrmError::UnknownRelationship { ref relationship, .. } if relationship == "friends"));
    assert_eq!(mock.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_include_is_skipped() -> Result<()> {
    let mock = Arc::new(common::mock().respond("users.search", 200, json!([{"id": "1"}])));
    let manager = common::manager(mock.clone());

    let users = manager.query("User")?.include(["friends"]).fetch().await?;

    assert_eq!(users.len(), 1);
    assert!(!users[0].is_loaded("friends"));
    assert_eq!(mock.request_count(), 1);
    Ok(())
}

#[test]
fn belongs_to_a_value_object_is_rejected_at_build() {
    let mock = Arc::new(common::mock());
    let err = Manager::builder()
        .connection(mock)
        .model(
            ModelSchema::model("User")
                .route("search", "users.search")
                .belongs_to("address", BelongsTo::new("Address")),
        )
        .model(ModelSchema::value_object("Address"))
        .build()
        .unwrap_err();

    match err {
        OrmError::RelationshipConfiguration {
            model,
            relationship,
            related,
            ..
        } => {
            assert_eq!(model, "User");
            assert_eq!(relationship, "address");
            assert_eq!(related, "Address");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn has_many_on_a_value_object_is_rejected_at_build() {
    let err = Manager::builder()
        .connection(Arc::new(common::mock()))
        .model(ModelSchema::model("Post").route("search", "posts.search"))
        .model(ModelSchema::value_object("Address").has_many("posts", HasMany::new("Post")))
        .build()
        .unwrap_err();

    assert!(matches!(err, OrmError::RelationshipConfiguration { .. }));
}
