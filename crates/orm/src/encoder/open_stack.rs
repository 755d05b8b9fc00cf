use {
    super::{
        common::{self, OffsetWire},
        EncodedQuery, EncoderOptions, QueryEncoder,
    },
    crate::{error::EncodingError, query::QueryState},
    serde_json::Value,
};

const NAME: &str = "open_stack";

/// Flat `field=op:value` filters with `limit`/`offset` (or `limit`/`marker`)
/// pagination.
#[derive(Debug, Clone, Default)]
pub struct OpenStackEncoder {
    options: EncoderOptions,
}

impl OpenStackEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }
}

impl QueryEncoder for OpenStackEncoder {
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
        if let Some(sort) = common::sort_value(state.sort()) {
            common::put_control(NAME, &mut out, "sort", sort)?;
        }

        match state.pagination().map(|p| common::offset_form(NAME, p)).transpose()? {
            Some(OffsetWire::Offset { limit, offset }) => {
                common::put_control(NAME, &mut out, "limit", common::number(limit))?;
                common::put_control(NAME, &mut out, "offset", common::number(offset))?;
            }
            Some(OffsetWire::Marker { limit, marker }) => {
                common::put_control(NAME, &mut out, "limit", common::number(limit))?;
                common::put_control(NAME, &mut out, "marker", Value::String(marker))?;
            }
            None => {}
        }

        Ok(out)
    }
}
