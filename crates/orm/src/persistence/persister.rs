use {
    super::{ActionKind, ApiAction},
    crate::{
        error::{OrmError, OrmResult},
        manager::Manager,
        model::{Entity, ModelSchema},
    },
    restmap_client::{ApiResponse, Connection},
    serde_json::Value,
    std::sync::Arc,
    tracing::{error, info, instrument},
};

const CREATED: &[u16] = &[201, 200];
const OK: &[u16] = &[200];
const NO_CONTENT: &[u16] = &[204];

/// Sends [`ApiAction`]s: `create` (POST), `update` (PUT), `destroy`
/// (DELETE). Each action is validated before anything is sent.
#[derive(Debug, Clone, Copy)]
pub struct ActionPersister<'m> {
    manager: &'m Manager,
}

impl<'m> ActionPersister<'m> {
    pub fn new(manager: &'m Manager) -> Self {
        Self { manager }
    }

    /// Expects 201 or 200. The returned record is hydrated; an empty body
    /// hydrates the sent properties instead.
    #[instrument(name = "restmap.persister.create", skip(self, action), fields(model = %action.model()), err)]
    pub async fn create(&self, action: ApiAction) -> OrmResult<Entity> {
        let (schema, action, response) = self.execute(action, ActionKind::Create, CREATED).await?;
        self.hydrate(&schema, &action, &response, CREATED)
    }

    /// Expects 200 and hydrates the returned record.
    #[instrument(name = "restmap.persister.update", skip(self, action), fields(model = %action.model()), err)]
    pub async fn update(&self, action: ApiAction) -> OrmResult<Entity> {
        let (schema, action, response) = self.execute(action, ActionKind::Update, OK).await?;
        self.hydrate(&schema, &action, &response, OK)
    }

    /// Expects 204.
    #[instrument(name = "restmap.persister.destroy", skip(self, action), fields(model = %action.model()), err)]
    pub async fn destroy(&self, action: ApiAction) -> OrmResult<bool> {
        self.execute(action, ActionKind::Destroy, NO_CONTENT).await?;
        Ok(true)
    }

    async fn execute(
        &self,
        action: ApiAction,
        expected_kind: ActionKind,
        accepted: &[u16],
    ) -> OrmResult<(Arc<ModelSchema>, ApiAction, ApiResponse)> {
        if action.kind() != &expected_kind {
            return Err(OrmError::InvalidAction {
                class: action.model().clone(),
                failures: vec![format!(
                    "a {} action cannot be used to {}",
                    action.kind().as_str(),
                    expected_kind.as_str()
                )],
            });
        }

        let schema = self.manager.model(action.model())?.clone();
        let action = action.resolved(&schema);
        action.is_valid()?;

        let route = action.route().clone().unwrap_or_default();
        let connection = self.manager.connection_for(&schema)?;
        let body = match action.kind() {
            ActionKind::Destroy => None,
            _ => Some(Value::Object(action.properties().clone())),
        };

        let response = connection
            .send(*action.method(), &route, action.route_params(), body.as_ref())
            .await
            .map_err(|source| {
                error!(
                    class = %schema.name(),
                    route = %route,
                    "{} failed: {}",
                    action.kind().as_str(),
                    source
                );
                OrmError::Transport {
                    class: schema.name().clone(),
                    route: route.clone(),
                    source,
                }
            })?;

        if !response.has_status(accepted) {
            error!(
                class = %schema.name(),
                route = %route,
                "{} of {} answered {}: {}",
                action.kind().as_str(),
                action.identifier(),
                response.status(),
                response.body()
            );
            return Err(OrmError::ActionFailed {
                class: schema.name().clone(),
                action: action.kind().as_str(),
                id: action.identifier(),
                status: response.status(),
            });
        }

        info!(
            "{} {} {} -> {}",
            action.kind().as_str(),
            schema.name(),
            action.identifier(),
            response.status()
        );
        Ok((schema, action, response))
    }

    fn hydrate(
        &self,
        schema: &Arc<ModelSchema>,
        action: &ApiAction,
        response: &ApiResponse,
        accepted: &[u16],
    ) -> OrmResult<Entity> {
        let records = schema
            .decoder()
            .decode(response, accepted)
            .map_err(|source| OrmError::Decode {
                class: schema.name().clone(),
                source,
            })?;
        let record = match records.into_iter().next() {
            Some(record) => record,
            None => action.properties().clone(),
        };
        self.manager.mapper().hydrate(schema, record)
    }
}
