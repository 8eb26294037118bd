//! Lookup resolver
//!
//! Resolves a filter predicate to exactly one remote record. The listing is
//! capped at [`LOOKUP_LIMIT`] results, which is enough to tell "one" from
//! "more than one" without pulling a large result set. The resolver never
//! picks among several matches.

use tracing::{debug, warn};

use crate::api::{InventoryApi, ListQuery};
use crate::error::{ReconcileError, ReconcileResult};
use crate::mapper::FieldMapper;
use crate::record::RemoteRecord;
use crate::schema::ResourceSpec;
use crate::state::LocalState;
use crate::value::{AttributeSet, AttributeValue};

/// Result-page cap for lookups.
pub const LOOKUP_LIMIT: u32 = 2;

/// Validated lookup filters for one resource type.
///
/// Zero-valued candidates are dropped. At least one filter must remain for
/// every at-least-one-of group of the spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPredicate {
    filters: Vec<(String, String)>,
}

impl FilterPredicate {
    /// Build a predicate from candidate filter attributes.
    ///
    /// Each candidate must be a filter attribute of `spec` and pass its
    /// validators. Nothing is sent anywhere yet.
    pub fn new(spec: &ResourceSpec, candidates: &AttributeSet) -> ReconcileResult<Self> {
        let mut filters = Vec::new();
        for (name, value) in candidates.iter() {
            let attr = spec.require_attribute(name)?;
            let Some(param) = &attr.filter_param else {
                return Err(ReconcileError::validation(
                    name.as_str(),
                    format!("not a lookup filter for {}", spec.name()),
                ));
            };
            if value.is_zero() && value.matches_kind(attr.kind) {
                continue;
            }
            attr.check(value)?;
            push_filter(&mut filters, param, value);
        }

        spec.check_at_least_one_of(candidates)?;
        if filters.is_empty() {
            return Err(ReconcileError::validation(
                spec.name(),
                "at least one filter must be specified",
            ));
        }
        Ok(Self { filters })
    }

    /// Query parameters, ordered by attribute name.
    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    /// The capped list query for this predicate.
    pub fn to_query(&self) -> ListQuery {
        self.filters
            .iter()
            .fold(ListQuery::new(), |query, (param, value)| {
                query.filter(param.as_str(), value.as_str())
            })
            .limit(LOOKUP_LIMIT)
    }
}

fn push_filter(filters: &mut Vec<(String, String)>, param: &str, value: &AttributeValue) {
    match value {
        AttributeValue::String(s) => filters.push((param.to_string(), s.clone())),
        AttributeValue::Integer(i) => filters.push((param.to_string(), i.to_string())),
        AttributeValue::Boolean(b) => filters.push((param.to_string(), b.to_string())),
        AttributeValue::Set(items) => {
            filters.extend(items.iter().map(|item| (param.to_string(), item.clone())));
        }
    }
}

/// Resolves filter predicates against one resource type.
pub struct LookupResolver<'a, A: InventoryApi + ?Sized> {
    api: &'a A,
    spec: &'a ResourceSpec,
}

impl<'a, A: InventoryApi + ?Sized> LookupResolver<'a, A> {
    pub fn new(api: &'a A, spec: &'a ResourceSpec) -> Self {
        Self { api, spec }
    }

    /// Resolve to the single matching record.
    pub async fn resolve_record(&self, predicate: &FilterPredicate) -> ReconcileResult<RemoteRecord> {
        fetch_unique(
            self.api,
            self.spec.name(),
            self.spec.endpoint(),
            &predicate.to_query(),
        )
        .await
    }

    /// Resolve to the single matching record, projected onto the spec.
    pub async fn resolve(&self, predicate: &FilterPredicate) -> ReconcileResult<LocalState> {
        let record = self.resolve_record(predicate).await?;
        FieldMapper::from_remote(&record, self.spec)
    }
}

/// List with a capped query and insist on exactly one match.
pub(crate) async fn fetch_unique<A: InventoryApi + ?Sized>(
    api: &A,
    resource: &str,
    endpoint: &str,
    query: &ListQuery,
) -> ReconcileResult<RemoteRecord> {
    debug!(resource = %resource, endpoint = %endpoint, filters = ?query.filters, "Resolving lookup");

    let page = api.list(endpoint, query).await?;
    match page.match_count() {
        0 => Err(ReconcileError::not_found(
            resource,
            "no object matches the given filter",
        )),
        1 => page.results.into_iter().next().ok_or_else(|| {
            ReconcileError::invalid_response(format!(
                "listing of {endpoint} reported one match but returned none"
            ))
        }),
        count => {
            warn!(resource = %resource, count, "Lookup matched more than one object");
            Err(ReconcileError::Ambiguous {
                resource: resource.to_string(),
                count,
            })
        }
    }
}
