//! Helpers shared by the built-in encoders.

use {
    super::{EncodedQuery, EncoderOptions},
    crate::{
        error::EncodingError,
        query::{CompositeExpression, CompositeKind, Direction, Expression, Node, Operator, Pagination},
    },
    heck::ToSnakeCase,
    itertools::Itertools,
    serde_json::Value,
};

/// Flatten an AND tree into `out`, one entry per field. Later entries
/// overwrite earlier ones and an empty nested composite contributes nothing.
/// Any OR, at any depth, is rejected.
pub(crate) fn merge_filters(
    encoder: &'static str,
    root: Option<&CompositeExpression>,
    out: &mut EncodedQuery,
    render: &dyn Fn(&Expression) -> Result<Value, EncodingError>,
) -> Result<(), EncodingError> {
    match root {
        Some(composite) => walk(encoder, composite, out, render),
        None => Ok(()),
    }
}

fn walk(
    encoder: &'static str,
    composite: &CompositeExpression,
    out: &mut EncodedQuery,
    render: &dyn Fn(&Expression) -> Result<Value, EncodingError>,
) -> Result<(), EncodingError> {
    if composite.kind() == CompositeKind::Or {
        return Err(EncodingError::UnsupportedComposite {
            encoder,
            kind: CompositeKind::Or,
        });
    }
    for part in composite.parts() {
        match part {
            Node::Expr(expr) => {
                out.insert(expr.field().to_string(), render(expr)?);
            }
            Node::Composite(nested) => walk(encoder, nested, out, render)?,
        }
    }
    Ok(())
}

/// Add a control parameter (sort, include, pagination) next to flat filters.
/// Fails when a filter already holds `key`.
pub(crate) fn put_control(
    encoder: &'static str,
    out: &mut EncodedQuery,
    key: &str,
    value: Value,
) -> Result<(), EncodingError> {
    if out.contains_key(key) {
        return Err(EncodingError::ReservedField {
            encoder,
            field: key.to_string(),
        });
    }
    out.insert(key.to_string(), value);
    Ok(())
}

pub(crate) fn ensure_operator(
    encoder: &'static str,
    expr: &Expression,
    allowed: &[Operator],
) -> Result<(), EncodingError> {
    if allowed.contains(&expr.operator()) {
        Ok(())
    } else {
        Err(EncodingError::UnsupportedOperator {
            encoder,
            field: expr.field().to_string(),
            operator: expr.operator(),
        })
    }
}

/// `-field` for descending, comma-joined in order.
pub(crate) fn sort_value(sort: &[(String, Direction)]) -> Option<Value> {
    if sort.is_empty() {
        return None;
    }
    let joined = sort
        .iter()
        .map(|(field, dir)| match dir {
            Direction::Asc => field.clone(),
            Direction::Desc => format!("-{field}"),
        })
        .join(",");
    Some(Value::String(joined))
}

pub(crate) fn include_value(includes: &[String], options: &EncoderOptions) -> Option<Value> {
    if includes.is_empty() {
        return None;
    }
    let joined = includes
        .iter()
        .map(|path| {
            if options.snake_case_includes {
                path.split('.').map(|segment| segment.to_snake_case()).join(".")
            } else {
                path.clone()
            }
        })
        .join(",");
    Some(Value::String(joined))
}

pub(crate) fn number(n: u64) -> Value {
    Value::String(n.to_string())
}

// ============================================================================
// Pagination normalization
// ============================================================================

/// Pagination expressed as page number + page size (or a marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageWire {
    Page { number: u64, size: u64 },
    Marker { limit: u64, marker: String },
}

/// Pagination expressed as limit + offset (or a marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OffsetWire {
    Offset { limit: u64, offset: u64 },
    Marker { limit: u64, marker: String },
}

fn positive(encoder: &'static str, what: &str, n: u64) -> Result<u64, EncodingError> {
    if n == 0 {
        Err(EncodingError::InvalidPagination {
            encoder,
            reason: format!("{what} must be greater than zero"),
        })
    } else {
        Ok(n)
    }
}

fn overflow(encoder: &'static str, what: &str) -> EncodingError {
    EncodingError::InvalidPagination {
        encoder,
        reason: format!("{what} is out of range"),
    }
}

/// `offset → page = offset / limit + 1`. The offset must fall on a page
/// boundary; anything else cannot be expressed as a page number.
pub(crate) fn page_form(encoder: &'static str, p: &Pagination) -> Result<PageWire, EncodingError> {
    Ok(match p {
        Pagination::Page { page, per_page } => PageWire::Page {
            number: positive(encoder, "page", *page)?,
            size: positive(encoder, "per_page", *per_page)?,
        },
        Pagination::Offset { limit, offset } => {
            let size = positive(encoder, "limit", *limit)?;
            if offset % size != 0 {
                return Err(EncodingError::InvalidPagination {
                    encoder,
                    reason: format!("offset {offset} is not a multiple of limit {size}"),
                });
            }
            PageWire::Page {
                number: (offset / size)
                    .checked_add(1)
                    .ok_or_else(|| overflow(encoder, "page"))?,
                size,
            }
        }
        Pagination::Marker { limit, marker } => PageWire::Marker {
            limit: positive(encoder, "limit", *limit)?,
            marker: marker.clone(),
        },
    })
}

/// `page → offset = (page - 1) * per_page`.
pub(crate) fn offset_form(
    encoder: &'static str,
    p: &Pagination,
) -> Result<OffsetWire, EncodingError> {
    Ok(match p {
        Pagination::Page { page, per_page } => {
            let page = positive(encoder, "page", *page)?;
            let limit = positive(encoder, "per_page", *per_page)?;
            OffsetWire::Offset {
                limit,
                offset: (page - 1)
                    .checked_mul(limit)
                    .ok_or_else(|| overflow(encoder, "offset"))?,
            }
        }
        Pagination::Offset { limit, offset } => OffsetWire::Offset {
            limit: positive(encoder, "limit", *limit)?,
            offset: *offset,
        },
        Pagination::Marker { limit, marker } => OffsetWire::Marker {
            limit: positive(encoder, "limit", *limit)?,
            marker: marker.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn offset_and_page_forms_agree() {
        let from_offset = page_form("test", &Pagination::Offset { limit: 10, offset: 10 }).unwrap();
        let from_page = page_form("test", &Pagination::Page { page: 2, per_page: 10 }).unwrap();
        assert_eq!(from_offset, from_page);

        let back = offset_form("test", &Pagination::Page { page: 2, per_page: 10 }).unwrap();
        assert_eq!(back, OffsetWire::Offset { limit: 10, offset: 10 });
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = page_form("test", &Pagination::Offset { limit: 0, offset: 5 }).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidPagination { .. }));
        assert!(offset_form("test", &Pagination::Page { page: 0, per_page: 5 }).is_err());
    }

    #[test]
    fn overflowing_pagination_is_rejected() {
        let err = page_form("test", &Pagination::Offset { limit: 1, offset: u64::MAX }).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidPagination { .. }));

        let err = offset_form("test", &Pagination::Page { page: u64::MAX, per_page: 2 }).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidPagination { .. }));

        let last = offset_form("test", &Pagination::Page { page: u64::MAX, per_page: 1 }).unwrap();
        assert_eq!(last, OffsetWire::Offset { limit: 1, offset: u64::MAX - 1 });
    }

    #[test]
    fn unaligned_offset_cannot_become_a_page() {
        let err = page_form("test", &Pagination::Offset { limit: 10, offset: 15 }).unwrap_err();
        match err {
            EncodingError::InvalidPagination { reason, .. } => {
                assert_eq!(reason, "offset 15 is not a multiple of limit 10");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            offset_form("test", &Pagination::Offset { limit: 10, offset: 15 }).unwrap(),
            OffsetWire::Offset { limit: 10, offset: 15 }
        );
    }

    #[test]
    fn includes_can_be_snake_cased() {
        let includes = vec!["billingAccount.primaryOwner".to_string(), "tags".to_string()];
        let options = EncoderOptions {
            snake_case_includes: true,
        };
        assert_eq!(
            include_value(&includes, &options),
            Some(Value::String("billing_account.primary_owner,tags".into()))
        );
        assert_eq!(
            include_value(&includes, &EncoderOptions::default()),
            Some(Value::String("billingAccount.primaryOwner,tags".into()))
        );
    }

    #[test]
    fn descending_sort_is_prefixed() {
        let sort = vec![("created".to_string(), Direction::Desc), ("name".to_string(), Direction::Asc)];
        assert_eq!(sort_value(&sort), Some(Value::String("-created,name".into())));
        assert_eq!(sort_value(&[]), None);
    }
}
