//! Named route templates and URL construction for REST endpoints

use {
    crate::{ClientError, Params},
    itertools::Itertools,
    serde_json::Value,
    std::collections::HashMap,
    url::Url,
};

/// Render a parameter value the way it travels in a URL: strings verbatim,
/// numbers and booleans via `to_string`, sequences comma-joined and null as
/// the empty string.
pub fn value_to_param(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_to_param).join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Encode parameters as a query string. Nested objects use bracket notation
/// (`filter[email]=...`), sequences are comma-joined and null values dropped.
pub fn encode_query(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", encode_key(&key), urlencoding::encode(&value)))
        .join("&")
}

fn flatten(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                flatten(format!("{prefix}[{key}]"), nested, out);
            }
        }
        other => out.push((prefix, value_to_param(other))),
    }
}

fn encode_key(key: &str) -> String {
    urlencoding::encode(key)
        .replace("%5B", "[")
        .replace("%5D", "]")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed path template such as `/users/{id}/posts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|c| open + c) else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            segments.push(Segment::Placeholder(rest[open + 1..close].trim().to_string()));
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Self {
            raw: template.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute placeholders from `params`, returning the path and the
    /// parameters that were not consumed by the template.
    fn expand(&self, route: &str, params: &Params) -> Result<(String, Params), ClientError> {
        let mut remaining = params.clone();
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(name) => {
                    let value = remaining
                        .remove(name)
                        .filter(|v| !v.is_null())
                        .ok_or_else(|| ClientError::MissingRouteParameter {
                            route: route.to_string(),
                            param: name.clone(),
                        })?;
                    path.push_str(&urlencoding::encode(&value_to_param(&value)));
                }
            }
        }
        Ok((path, remaining))
    }
}

/// Maps route names (`users.view`) to path templates (`/users/{id}`) below a
/// base URL.
#[derive(Debug, Clone)]
pub struct ApiRouter {
    base: Url,
    routes: HashMap<String, RouteTemplate>,
}

impl ApiRouter {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            routes: HashMap::new(),
        }
    }

    /// Parse `base` and create an empty router.
    pub fn parse(base: &str) -> Result<Self, ClientError> {
        let url = Url::parse(base).map_err(|source| ClientError::InvalidUrl {
            url: base.to_string(),
            source,
        })?;
        Ok(Self::new(url))
    }

    pub fn route(mut self, name: impl Into<String>, template: &str) -> Self {
        self.add(name, template);
        self
    }

    pub fn routes<N, T, I>(mut self, routes: I) -> Self
    where
        N: Into<String>,
        T: AsRef<str>,
        I: IntoIterator<Item = (N, T)>,
    {
        for (name, template) in routes {
            self.add(name, template.as_ref());
        }
        self
    }

    pub fn add(&mut self, name: impl Into<String>, template: &str) {
        self.routes.insert(name.into(), RouteTemplate::parse(template));
    }

    /// Copy every route of `other` into this router, replacing same-named ones.
    pub fn extend_from(&mut self, other: &ApiRouter) {
        self.routes
            .extend(other.routes.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn has(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    pub fn template(&self, name: &str) -> Result<&RouteTemplate, ClientError> {
        self.routes
            .get(name)
            .ok_or_else(|| ClientError::UnknownRoute(name.to_string()))
    }

    /// Expand the named route into a path plus the leftover parameters.
    pub fn path(&self, name: &str, params: &Params) -> Result<(String, Params), ClientError> {
        self.template(name)?.expand(name, params)
    }

    /// Full URL for a named route. Parameters not used by the path template
    /// become the query string.
    pub fn url(&self, name: &str, params: &Params) -> Result<String, ClientError> {
        let (path, remaining) = self.path(name, params)?;
        let mut url = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let query = encode_query(&remaining);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    fn router() -> ApiRouter {
        ApiRouter::parse("https://api.example.com/v1/")
            .unwrap()
            .route("users.search", "/users")
            .route("users.view", "/users/{id}")
    }

    #[test]
    fn expands_placeholders_from_params() {
        let url = router()
            .url("users.view", &params(json!({"id": 7})))
            .unwrap();
        assert_eq!(url, "https://api.example.com/v1/users/7");
    }

    #[test]
    fn leftover_params_become_bracketed_query() {
        let url = router()
            .url(
                "users.search",
                &params(json!({
                    "filter": {"email": "a@example.com", "id": ["1", "2"]},
                    "page": {"number": "2", "size": "10"},
                    "skip": null
                })),
            )
            .unwrap();
        assert_eq!(
            url,
            "https://api.example.com/v1/users?filter[email]=a%40example.com&filter[id]=1%2C2&page[number]=2&page[size]=10"
        );
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let err = router().url("users.view", &Params::new()).unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingRouteParameter { ref param, .. } if param == "id"
        ));
    }

    #[test]
    fn unknown_route_is_an_error() {
        let err = router().url("posts.search", &Params::new()).unwrap_err();
        assert!(matches!(err, ClientError::UnknownRoute(ref name) if name == "posts.search"));
    }

    #[test]
    fn template_lists_placeholders() {
        let template = RouteTemplate::parse("/orgs/{org}/users/{ id }");
        assert_eq!(template.placeholders().collect::<Vec<_>>(), vec!["org", "id"]);
    }

    #[test]
    fn renders_param_values() {
        assert_eq!(value_to_param(&json!(["a", 1, true])), "a,1,true");
        assert_eq!(value_to_param(&Value::Null), "");
    }
}
