use {
    super::{
        common::{self, PageWire},
        EncodedQuery, EncoderOptions, QueryEncoder,
    },
    crate::{error::EncodingError, query::QueryState},
    serde_json::Value,
};

const NAME: &str = "simple";

/// Flat `field=op:value` parameters with `page`/`per_page` pagination and an
/// `order` sort key. Every operator is supported.
#[derive(Debug, Clone, Default)]
pub struct SimpleEncoder {
    options: EncoderOptions,
}

impl SimpleEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }
}

impl QueryEncoder for SimpleEncoder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn encode(&self, state: &QueryState) -> Result<EncodedQuery, EncodingError> {
        let mut out = EncodedQuery::new();
        common::merge_filters(NAME, state.filters(), &mut out, &|expr| {
            Ok(Value::String(expr.to_query_string()))
        })?;

        if let Some(include) = common::include_value(state.includes(), &self.options) {
            common::put_control(NAME, &mut out, "include", include)?;
        }
        if let Some(order) = common::sort_value(state.sort()) {
            common::put_control(NAME, &mut out, "order", order)?;
        }

        match state.pagination().map(|p| common::page_form(NAME, p)).transpose()? {
            Some(PageWire::Page { number, size }) => {
                common::put_control(NAME, &mut out, "page", common::number(number))?;
                common::put_control(NAME, &mut out, "per_page", common::number(size))?;
            }
            Some(PageWire::Marker { limit, marker }) => {
                common::put_control(NAME, &mut out, "limit", common::number(limit))?;
                common::put_control(NAME, &mut out, "marker", Value::String(marker))?;
            }
            None => {}
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{and, eq, gte, like, Node, Pagination};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn renders_operators_inline() {
        let mut state = QueryState::new();
        state.add_filter(eq("status", "active"));
        state.add_filter(gte("age", 18));
        state.add_filter(like("name", "jo%"));
        let encoded = SimpleEncoder::default().encode(&state).unwrap();
        assert_eq!(
            Value::Object(encoded),
            json!({"status": "active", "age": "gte:18", "name": "like:jo%"})
        );
    }

    #[test]
    fn nested_and_overwrites_earlier_fields() {
        let mut state = QueryState::new();
        state.add_filter(eq("status", "active"));
        state.add_filter(and([Node::from(eq("status", "archived")), and(Vec::<Node>::new()).into()]));
        let encoded = SimpleEncoder::default().encode(&state).unwrap();
        assert_eq!(Value::Object(encoded), json!({"status": "archived"}));
    }

    #[test]
    fn offset_is_normalized_to_pages() {
        let mut state = QueryState::new();
        state.set_pagination(Some(Pagination::Offset { limit: 25, offset: 50 }));
        let encoded = SimpleEncoder::default().encode(&state).unwrap();
        assert_eq!(Value::Object(encoded), json!({"page": "3", "per_page": "25"}));
    }

    #[test]
    fn filter_named_like_a_control_parameter_is_rejected() {
        let mut state = QueryState::new();
        state.add_filter(eq("order", "pending"));
        state.add_sort("created", crate::query::Direction::Desc);
        let err = SimpleEncoder::default().encode(&state).unwrap_err();
        assert_eq!(
            err,
            EncodingError::ReservedField {
                encoder: NAME,
                field: "order".into()
            }
        );

        let mut unsorted = QueryState::new();
        unsorted.add_filter(eq("order", "pending"));
        let encoded = SimpleEncoder::default().encode(&unsorted).unwrap();
        assert_eq!(Value::Object(encoded), json!({"order": "pending"}));
    }

    #[test]
    fn marker_pagination_is_flat() {
        let mut state = QueryState::new();
        state.set_pagination(Some(Pagination::Marker { limit: 5, marker: "abc".into() }));
        let encoded = SimpleEncoder::default().encode(&state).unwrap();
        assert_eq!(Value::Object(encoded), json!({"limit": "5", "marker": "abc"}));
    }
}
