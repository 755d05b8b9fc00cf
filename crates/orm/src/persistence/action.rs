use {
    crate::{
        error::{OrmError, OrmResult},
        model::{ModelSchema, CREATE_ROUTE, DESTROY_ROUTE, UPDATE_ROUTE},
    },
    derive_getters::Getters,
    itertools::Itertools,
    restmap_client::{value_to_param, Method, Params},
    serde_json::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Update,
    Destroy,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Destroy => "destroy",
        }
    }

    fn default_method(&self) -> Method {
        match self {
            ActionKind::Create => Method::Post,
            ActionKind::Update => Method::Put,
            ActionKind::Destroy => Method::Delete,
        }
    }

    fn route_operation(&self) -> &'static str {
        match self {
            ActionKind::Create => CREATE_ROUTE,
            ActionKind::Update => UPDATE_ROUTE,
            ActionKind::Destroy => DESTROY_ROUTE,
        }
    }
}

/// A write against the remote API: which model, which route, which
/// properties.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ApiAction {
    kind: ActionKind,
    model: String,
    /// Route name; when unset the model's route for this kind is used
    route: Option<String>,
    route_params: Params,
    properties: Params,
    method: Method,
}

pub struct CreateAction;
pub struct UpdateAction;
pub struct DestroyAction;

impl CreateAction {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(model: impl Into<String>) -> ApiAction {
        ApiAction::new(ActionKind::Create, model)
    }
}

impl UpdateAction {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(model: impl Into<String>) -> ApiAction {
        ApiAction::new(ActionKind::Update, model)
    }
}

impl DestroyAction {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(model: impl Into<String>) -> ApiAction {
        ApiAction::new(ActionKind::Destroy, model)
    }
}

fn object(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

impl ApiAction {
    pub fn new(kind: ActionKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            route: None,
            route_params: Params::new(),
            properties: Params::new(),
            method: kind.default_method(),
        }
    }

    /// Merge the members of a JSON object into the properties.
    pub fn with(mut self, properties: Value) -> Self {
        self.properties.extend(object(properties));
        self
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Send to route `name` with `params` (a JSON object) filling its
    /// placeholders.
    pub fn on_route(mut self, name: impl Into<String>, params: Value) -> Self {
        self.route = Some(name.into());
        self.route_params = object(params);
        self
    }

    /// Route parameters for the model's default route.
    pub fn with_params(mut self, params: Value) -> Self {
        self.route_params.extend(object(params));
        self
    }

    pub fn using(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Fill an unset route from `schema`.
    pub(crate) fn resolved(mut self, schema: &ModelSchema) -> Self {
        if self.route.is_none() {
            self.route = schema
                .routes()
                .get(self.kind.route_operation())
                .cloned();
        }
        self
    }

    /// Route parameter values, for error messages.
    pub fn identifier(&self) -> String {
        if self.route_params.is_empty() {
            return "(new)".to_string();
        }
        self.route_params.values().map(value_to_param).join(":")
    }

    /// Every failed precondition, not just the first.
    pub fn validate(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if self.route.as_deref().map_or(true, |r| r.trim().is_empty()) {
            failures.push("route must not be blank".to_string());
        }
        if matches!(self.kind, ActionKind::Update | ActionKind::Destroy) && self.route_params.is_empty() {
            failures.push(format!("route parameters are required to {}", self.kind.as_str()));
        }
        if matches!(self.kind, ActionKind::Create | ActionKind::Update) && self.properties.is_empty() {
            failures.push(format!("properties are required to {}", self.kind.as_str()));
        }
        failures
    }

    pub fn is_valid(&self) -> OrmResult<()> {
        let failures = self.validate();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(OrmError::InvalidAction {
                class: self.model.clone(),
                failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn collects_every_failure() {
        let action = UpdateAction::new("User").on_route(" ", Value::Null);
        assert_eq!(
            action.validate(),
            vec![
                "route must not be blank".to_string(),
                "route parameters are required to update".to_string(),
                "properties are required to update".to_string(),
            ]
        );
        assert!(matches!(action.is_valid(), Err(OrmError::InvalidAction { .. })));
    }

    #[test]
    fn destroy_needs_no_properties() {
        let action = DestroyAction::new("User").on_route("users.destroy", json!({"id": "7"}));
        assert!(action.is_valid().is_ok());
        assert_eq!(action.method(), &Method::Delete);
        assert_eq!(action.identifier(), "7");
    }

    #[test]
    fn route_defaults_from_schema() {
        let schema = ModelSchema::model("User").route("create", "users.create").build();
        let action = CreateAction::new("User")
            .set("email", "a@example.com")
            .resolved(&schema);
        assert_eq!(action.route().as_deref(), Some("users.create"));
        assert_eq!(action.identifier(), "(new)");
        assert!(action.is_valid().is_ok());
    }
}
