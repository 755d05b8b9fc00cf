#![allow(dead_code)]

use {
    restmap_client::testing::MockConnection,
    restmap_orm::prelude::*,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn mock() -> MockConnection {
    MockConnection::new()
        .with_route("users.search", "/users")
        .with_route("users.view", "/users/{id}")
        .with_route("users.create", "/users")
        .with_route("users.update", "/users/{id}")
        .with_route("users.destroy", "/users/{id}")
        .with_route("accounts.search", "/accounts")
        .with_route("accounts.view", "/accounts/{id}")
        .with_route("plans.view", "/plans/{id}")
        .with_route("posts.search", "/posts")
}

pub fn user_schema() -> ModelSchema {
    ModelSchema::model("User")
        .route("search", "users.search")
        .route("view", "users.view")
        .route("create", "users.create")
        .route("update", "users.update")
        .route("destroy", "users.destroy")
        .cast("created", Cast::DateTime)
        .cast("status", Cast::enumeration(["ACTIVE", "DISABLED"]))
        .cast("address", Cast::ValueObject("Address".into()))
        .belongs_to("account", BelongsTo::new("Account"))
        .belongs_to(
            "sponsor",
            BelongsTo::new("Account").null_on_not_found(false),
        )
        .has_many("posts", HasMany::new("Post").index_by("id"))
        .has_many("drafts", HasMany::new("Post").lazy(false))
        .build()
}

pub fn manager(connection: Arc<MockConnection>) -> Manager {
    Manager::builder()
        .connection(connection)
        .model(user_schema())
        .model(
            ModelSchema::model("Account")
                .route("search", "accounts.search")
                .route("view", "accounts.view")
                .belongs_to("plan", BelongsTo::new("Plan")),
        )
        .model(ModelSchema::model("Plan").route("view", "plans.view"))
        .model(ModelSchema::model("Post").route("search", "posts.search"))
        .model(ModelSchema::value_object("Address"))
        .build()
        .expect("fixture manager should be valid")
}
