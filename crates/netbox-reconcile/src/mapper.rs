//! Field mapper: translates between local attribute sets and remote records.
//!
//! Translation is driven entirely by the [`ResourceSpec`] attribute table.
//! Absence policy:
//!
//! - writing: an attribute that was never set is omitted so the server
//!   default applies; a zero value on a nullable field is sent as `null`,
//!   and for a nested path such as `group.id` the whole `group` is `null`.
//! - reading: a missing or `null` field becomes the zero value of its type,
//!   so a projected state is always fully populated.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{ReconcileError, ReconcileResult};
use crate::record::{RemotePayload, RemoteRecord};
use crate::schema::{AttributeKind, AttributeSpec, ResourceSpec};
use crate::state::LocalState;
use crate::tags;
use crate::value::{AttributeSet, AttributeValue};

/// Stateless, descriptor-driven translation between local and remote shapes.
pub struct FieldMapper;

impl FieldMapper {
    /// Build the write payload for a local state.
    ///
    /// The state is validated first, so nothing invalid reaches the remote.
    /// Computed attributes are never written. Tag-set attributes are left to
    /// the [`TagSynchronizer`](crate::tags::TagSynchronizer), which has to
    /// resolve names remotely.
    pub fn to_remote(state: &LocalState, spec: &ResourceSpec) -> ReconcileResult<RemotePayload> {
        state.validate(spec)?;

        let mut payload = RemotePayload::new();
        for attr in spec.attributes() {
            if attr.is_computed() || attr.kind == AttributeKind::TagSet {
                continue;
            }
            let Some(value) = state.get(&attr.name) else {
                continue;
            };
            let json = Self::value_to_json(attr, value);
            match attr.remote_path.split_once('.') {
                // A cleared reference nulls the whole nested object.
                Some((head, _)) if json.is_null() => payload.set_path(head, Value::Null),
                _ => payload.set_path(&attr.remote_path, json),
            }
        }
        Ok(payload)
    }

    /// Project a remote record onto the spec's attributes.
    pub fn from_remote(record: &RemoteRecord, spec: &ResourceSpec) -> ReconcileResult<LocalState> {
        let mut attributes = AttributeSet::new();
        for attr in spec.attributes() {
            let value = match record.get_path(&attr.remote_path) {
                Some(json) => Self::json_to_value(spec, attr, json)?,
                None => AttributeValue::zero(attr.kind),
            };
            attributes.set(attr.name.clone(), value);
        }

        if let Some(scope) = spec.scope() {
            let type_zero = attributes
                .get(&scope.type_attribute)
                .map_or(true, AttributeValue::is_zero);
            let id_zero = attributes
                .get(&scope.id_attribute)
                .map_or(true, AttributeValue::is_zero);
            if type_zero || id_zero {
                attributes.set(scope.type_attribute.clone(), AttributeValue::zero(AttributeKind::String));
                attributes.set(scope.id_attribute.clone(), AttributeValue::zero(AttributeKind::Integer));
            }
        }

        Ok(LocalState::from_parts(Some(record.id), attributes))
    }

    /// Names of attributes in `before` whose value differs in `after`.
    ///
    /// Attributes `before` never held are not reported; sets compare by
    /// membership.
    pub fn drifted(before: &AttributeSet, after: &AttributeSet) -> Vec<String> {
        before
            .iter()
            .filter(|(name, value)| after.get(name) != Some(*value))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn value_to_json(attr: &AttributeSpec, value: &AttributeValue) -> Value {
        if attr.nullable && value.is_zero() {
            return Value::Null;
        }
        match value {
            AttributeValue::String(s) => Value::String(s.clone()),
            AttributeValue::Integer(i) => Value::from(*i),
            AttributeValue::Boolean(b) => Value::Bool(*b),
            AttributeValue::Set(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }

    fn json_to_value(
        spec: &ResourceSpec,
        attr: &AttributeSpec,
        json: &Value,
    ) -> ReconcileResult<AttributeValue> {
        let mismatch = || {
            ReconcileError::invalid_response(format!(
                "{}.{}: expected {}, got {}",
                spec.name(),
                attr.name,
                attr.kind,
                json
            ))
        };

        match attr.kind {
            AttributeKind::String => json
                .as_str()
                .map(|s| AttributeValue::String(s.to_string()))
                .ok_or_else(mismatch),
            AttributeKind::Integer => json
                .as_i64()
                .map(AttributeValue::Integer)
                .ok_or_else(mismatch),
            AttributeKind::Boolean => json
                .as_bool()
                .map(AttributeValue::Boolean)
                .ok_or_else(mismatch),
            AttributeKind::StringSet => {
                let items = json.as_array().ok_or_else(mismatch)?;
                let set = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<BTreeSet<String>>>()
                    .ok_or_else(mismatch)?;
                Ok(AttributeValue::Set(set))
            }
            AttributeKind::TagSet => tags::tag_names(json)
                .map(AttributeValue::Set)
                .ok_or_else(mismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ObjectId;
    use crate::schema::Validator;
    use serde_json::json;

    fn webhook_spec() -> ResourceSpec {
        ResourceSpec::new("netbox_webhook", "extras/webhooks")
            .with_attribute(AttributeSpec::optional("name", AttributeKind::String).nullable())
            .with_attribute(
                AttributeSpec::required("http_method", AttributeKind::String)
                    .validate(Validator::one_of_ignore_case(&["GET", "POST", "PUT"])),
            )
            .with_attribute(AttributeSpec::optional("secret", AttributeKind::String))
            .with_attribute(AttributeSpec::optional("type_create", AttributeKind::Boolean).nullable())
            .with_attribute(AttributeSpec::required("content_types", AttributeKind::StringSet))
            .with_attribute(AttributeSpec::optional("tags", AttributeKind::TagSet))
            .with_attribute(AttributeSpec::computed("vrf_id", AttributeKind::Integer).remote("vrf.id"))
    }

    fn declared(attrs: AttributeSet) -> LocalState {
        LocalState::declare(&webhook_spec(), attrs).unwrap()
    }

    #[test]
    fn test_to_remote_omits_unset_attributes() {
        let state = declared(
            AttributeSet::new()
                .with("http_method", "POST")
                .with("content_types", vec!["dcim.site"]),
        );
        let payload = FieldMapper::to_remote(&state, &webhook_spec()).unwrap();

        assert!(!payload.contains("name"));
        assert!(!payload.contains("secret"));
        assert!(!payload.contains("type_create"));
        assert_eq!(payload.get_path("http_method"), Some(&json!("POST")));
        assert_eq!(payload.get_path("content_types"), Some(&json!(["dcim.site"])));
    }

    #[test]
    fn test_to_remote_zero_on_nullable_is_null() {
        let state = declared(
            AttributeSet::new()
                .with("http_method", "POST")
                .with("content_types", vec!["dcim.site"])
                .with("name", "")
                .with("type_create", false)
                .with("secret", ""),
        );
        let payload = FieldMapper::to_remote(&state, &webhook_spec()).unwrap();

        assert_eq!(payload.get_path("name"), Some(&Value::Null));
        assert_eq!(payload.get_path("type_create"), Some(&Value::Null));
        // Not nullable remotely: the zero value goes through as-is.
        assert_eq!(payload.get_path("secret"), Some(&json!("")));
    }

    #[test]
    fn test_to_remote_cleared_reference_nulls_object() {
        let spec = ResourceSpec::new("netbox_tenant", "tenancy/tenants")
            .with_attribute(AttributeSpec::required("name", AttributeKind::String))
            .with_attribute(
                AttributeSpec::optional("group_id", AttributeKind::Integer)
                    .remote("group.id")
                    .nullable(),
            );

        let state = LocalState::declare(
            &spec,
            AttributeSet::new().with("name", "acme").with("group_id", 4i64),
        )
        .unwrap();
        let payload = FieldMapper::to_remote(&state, &spec).unwrap();
        assert_eq!(payload.get_path("group"), Some(&json!({"id": 4})));

        let state = LocalState::declare(
            &spec,
            AttributeSet::new().with("name", "acme").with("group_id", 0i64),
        )
        .unwrap();
        let payload = FieldMapper::to_remote(&state, &spec).unwrap();
        assert_eq!(payload.as_map().get("group"), Some(&Value::Null));
    }

    #[test]
    fn test_to_remote_skips_computed_and_tags() {
        let state = declared(
            AttributeSet::new()
                .with("http_method", "GET")
                .with("content_types", vec!["dcim.site"])
                .with("tags", vec!["net"]),
        );
        let payload = FieldMapper::to_remote(&state, &webhook_spec()).unwrap();
        assert!(!payload.contains("tags"));
        assert!(!payload.contains("vrf"));
    }

    #[test]
    fn test_to_remote_validates_first() {
        let mut state = declared(
            AttributeSet::new()
                .with("http_method", "GET")
                .with("content_types", vec!["dcim.site"]),
        );
        // Bypass `set` to simulate a state that was mutated behind our back.
        let mut attrs = state.attributes().clone();
        attrs.set("http_method", "FETCH");
        state.replace_attributes(attrs);

        let err = FieldMapper::to_remote(&state, &webhook_spec()).unwrap_err();
        assert!(matches!(err, ReconcileError::Validation { .. }));
    }

    #[test]
    fn test_from_remote_absent_fields_become_zero() {
        let record = RemoteRecord::from_json(json!({
            "id": 7,
            "http_method": "POST",
            "content_types": ["dcim.device", "dcim.site"],
            "name": null
        }))
        .unwrap();
        let state = FieldMapper::from_remote(&record, &webhook_spec()).unwrap();

        assert_eq!(state.id(), Some(ObjectId::new(7)));
        let attrs = state.attributes();
        assert_eq!(attrs.get_string("name"), Some(""));
        assert_eq!(attrs.get_string("secret"), Some(""));
        assert_eq!(attrs.get_boolean("type_create"), Some(false));
        assert_eq!(attrs.get_integer("vrf_id"), Some(0));
        assert!(attrs.get_set("tags").unwrap().is_empty());
        assert_eq!(attrs.len(), webhook_spec().attributes().len());
    }

    #[test]
    fn test_from_remote_nested_and_tags() {
        let record = RemoteRecord::from_json(json!({
            "id": 3,
            "http_method": "GET",
            "content_types": [],
            "vrf": {"id": 11},
            "tags": [{"id": 1, "name": "net", "slug": "net"}, {"id": 2, "name": "core", "slug": "core"}]
        }))
        .unwrap();
        let state = FieldMapper::from_remote(&record, &webhook_spec()).unwrap();

        assert_eq!(state.attributes().get_integer("vrf_id"), Some(11));
        assert_eq!(
            state.get("tags"),
            Some(&AttributeValue::from(vec!["core", "net"]))
        );
    }

    #[test]
    fn test_from_remote_type_mismatch() {
        let record = RemoteRecord::from_json(json!({
            "id": 3,
            "http_method": 12,
            "content_types": []
        }))
        .unwrap();
        let err = FieldMapper::from_remote(&record, &webhook_spec()).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidResponse { .. }));
    }

    #[test]
    fn test_from_remote_scope_is_atomic() {
        let spec = ResourceSpec::new("netbox_vlan_group", "ipam/vlan-groups")
            .with_attribute(AttributeSpec::optional("scope_type", AttributeKind::String).nullable())
            .with_attribute(AttributeSpec::optional("scope_id", AttributeKind::Integer).nullable())
            .with_scope("scope_type", "scope_id");
        let record = RemoteRecord::from_json(json!({
            "id": 1,
            "scope_type": "dcim.site",
            "scope_id": null
        }))
        .unwrap();

        let state = FieldMapper::from_remote(&record, &spec).unwrap();
        assert_eq!(state.attributes().get_string("scope_type"), Some(""));
        assert_eq!(state.attributes().get_integer("scope_id"), Some(0));
        assert!(state.scope(&spec).is_none());
    }

    #[test]
    fn test_drifted() {
        let before = AttributeSet::new()
            .with("http_method", "post")
            .with("content_types", vec!["a", "b"]);
        let after = AttributeSet::new()
            .with("http_method", "POST")
            .with("content_types", vec!["b", "a"])
            .with("secret", "");

        assert_eq!(FieldMapper::drifted(&before, &after), vec!["http_method".to_string()]);
    }
}
