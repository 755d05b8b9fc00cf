use {
    super::{
        common::{self, PageWire},
        EncodedQuery, EncoderOptions, QueryEncoder,
    },
    crate::{
        error::EncodingError,
        query::{Operator, QueryState},
    },
    serde_json::{Map, Value},
};

const NAME: &str = "json_api";

/// `filter[field]=value`, `page[number]`/`page[size]`, `sort`, `include`.
///
/// Only EQ and IN can be expressed; IN values are comma-joined.
#[derive(Debug, Clone, Default)]
pub struct JsonApiEncoder {
    options: EncoderOptions,
}

impl JsonApiEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }
}

impl QueryEncoder for JsonApiEncoder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn encode(&self, state: &QueryState) -> Result<EncodedQuery, EncodingError> {
        let mut out = EncodedQuery::new();

        let mut filter = Map::new();
        common::merge_filters(NAME, state.filters(), &mut filter, &|expr| {
            common::ensure_operator(NAME, expr, &[Operator::Eq, Operator::In])?;
            Ok(Value::String(expr.value_as_string()))
        })?;
        if !filter.is_empty() {
            out.insert("filter".into(), Value::Object(filter));
        }

        if let Some(include) = common::include_value(state.includes(), &self.options) {
            out.insert("include".into(), include);
        }
        if let Some(sort) = common::sort_value(state.sort()) {
            out.insert("sort".into(), sort);
        }

        if let Some(pagination) = state.pagination() {
            let mut page = Map::new();
            match common::page_form(NAME, pagination)? {
                PageWire::Page { number, size } => {
                    page.insert("number".into(), common::number(number));
                    page.insert("size".into(), common::number(size));
                }
                PageWire::Marker { limit, marker } => {
                    page.insert("size".into(), common::number(limit));
                    page.insert("marker".into(), Value::String(marker));
                }
            }
            out.insert("page".into(), Value::Object(page));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{and, eq, gt, in_, or, Direction, Node, Pagination};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn encode(state: &QueryState) -> Result<Value, EncodingError> {
        JsonApiEncoder::default().encode(state).map(Value::Object)
    }

    #[test]
    fn nests_filters_and_joins_in_values() {
        let mut state = QueryState::new();
        state.add_filter(eq("email", "a@example.com"));
        state.add_filter(in_("role", ["admin", "owner"]));
        assert_eq!(
            encode(&state).unwrap(),
            json!({"filter": {"email": "a@example.com", "role": "admin,owner"}})
        );
    }

    #[test]
    fn rejects_unsupported_operator() {
        let mut state = QueryState::new();
        state.add_filter(gt("age", 21));
        assert_eq!(
            encode(&state).unwrap_err(),
            EncodingError::UnsupportedOperator {
                encoder: NAME,
                field: "age".into(),
                operator: Operator::Gt,
            }
        );
    }

    #[test]
    fn rejects_or_at_any_depth() {
        let mut state = QueryState::new();
        state.add_filter(eq("a", 1));
        state.add_filter(and([Node::from(eq("b", 2)), or([eq("c", 3)]).into()]));
        assert!(matches!(
            encode(&state),
            Err(EncodingError::UnsupportedComposite { .. })
        ));
    }

    #[test]
    fn page_and_offset_paginate_identically() {
        let mut by_page = QueryState::new();
        by_page.set_pagination(Some(Pagination::Page { page: 2, per_page: 10 }));
        let mut by_offset = QueryState::new();
        by_offset.set_pagination(Some(Pagination::Offset { limit: 10, offset: 10 }));

        let expected = json!({"page": {"number": "2", "size": "10"}});
        assert_eq!(encode(&by_page).unwrap(), expected);
        assert_eq!(encode(&by_offset).unwrap(), expected);
    }

    #[test]
    fn encodes_sort_and_includes() {
        let mut state = QueryState::new();
        state.add_sort("created", Direction::Desc);
        state.add_include("account");
        state.add_include("account.owner");
        assert_eq!(
            encode(&state).unwrap(),
            json!({"include": "account,account.owner", "sort": "-created"})
        );
    }
}
