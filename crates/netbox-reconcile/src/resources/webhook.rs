//! `netbox_webhook`: reconciled webhooks.
//!
//! The remote canonicalizes `http_method` to upper case, so any case is
//! accepted locally and the read after each write brings the canonical form
//! back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::{
    optional_boolean, optional_string, required_set, required_string, ResourceConfig,
};
use crate::error::ReconcileResult;
use crate::schema::{AttributeKind, AttributeSpec, ResourceSpec, Validator};
use crate::value::AttributeSet;

/// Accepted HTTP methods, compared without regard to case.
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

pub static WEBHOOK: LazyLock<ResourceSpec> = LazyLock::new(|| {
    let flag = |name: &str| {
        AttributeSpec::optional(name, AttributeKind::Boolean).default_value(false)
    };
    ResourceSpec::new("netbox_webhook", "extras/webhooks")
        .with_attribute(AttributeSpec::optional("name", AttributeKind::String).nullable())
        .with_attribute(
            AttributeSpec::required("payload_url", AttributeKind::String)
                .nullable()
                .with_description("URL called when the webhook fires"),
        )
        .with_attribute(
            AttributeSpec::required("http_method", AttributeKind::String)
                .validate(Validator::one_of_ignore_case(HTTP_METHODS)),
        )
        .with_attribute(AttributeSpec::required("http_content_type", AttributeKind::String))
        .with_attribute(AttributeSpec::required("content_types", AttributeKind::StringSet))
        .with_attribute(
            AttributeSpec::optional("additional_headers", AttributeKind::String)
                .with_description("Extra headers, one 'Name: Value' per line"),
        )
        .with_attribute(AttributeSpec::optional("body_template", AttributeKind::String))
        .with_attribute(AttributeSpec::optional("secret", AttributeKind::String))
        .with_attribute(
            AttributeSpec::optional("conditions", AttributeKind::String)
                .nullable()
                .default_value(""),
        )
        .with_attribute(
            AttributeSpec::optional("ca_file_path", AttributeKind::String)
                .nullable()
                .default_value(""),
        )
        .with_attribute(flag("enabled"))
        .with_attribute(flag("ssl_verification"))
        .with_attribute(flag("type_create").nullable())
        .with_attribute(flag("type_update").nullable())
        .with_attribute(flag("type_delete").nullable())
});

/// Declared configuration of a webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub payload_url: String,
    pub http_method: String,
    pub http_content_type: String,
    pub content_types: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_headers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_verification: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_delete: Option<bool>,
}

impl WebhookConfig {
    pub fn new(
        payload_url: impl Into<String>,
        http_method: impl Into<String>,
        http_content_type: impl Into<String>,
    ) -> Self {
        Self {
            payload_url: payload_url.into(),
            http_method: http_method.into(),
            http_content_type: http_content_type.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_types.insert(content_type.into());
        self
    }

    /// Fire on create, update, and delete respectively.
    #[must_use]
    pub fn with_events(mut self, create: bool, update: bool, delete: bool) -> Self {
        self.type_create = Some(create);
        self.type_update = Some(update);
        self.type_delete = Some(delete);
        self
    }
}

impl ResourceConfig for WebhookConfig {
    fn spec() -> &'static ResourceSpec {
        &WEBHOOK
    }

    fn to_attributes(&self) -> AttributeSet {
        AttributeSet::new()
            .with_opt("name", self.name.clone())
            .with("payload_url", self.payload_url.as_str())
            .with("http_method", self.http_method.as_str())
            .with("http_content_type", self.http_content_type.as_str())
            .with("content_types", self.content_types.clone())
            .with_opt("additional_headers", self.additional_headers.clone())
            .with_opt("body_template", self.body_template.clone())
            .with_opt("secret", self.secret.clone())
            .with_opt("conditions", self.conditions.clone())
            .with_opt("ca_file_path", self.ca_file_path.clone())
            .with_opt("enabled", self.enabled)
            .with_opt("ssl_verification", self.ssl_verification)
            .with_opt("type_create", self.type_create)
            .with_opt("type_update", self.type_update)
            .with_opt("type_delete", self.type_delete)
    }

    fn from_attributes(attrs: &AttributeSet) -> ReconcileResult<Self> {
        Ok(Self {
            name: optional_string(attrs, "name"),
            payload_url: required_string(attrs, "payload_url")?,
            http_method: required_string(attrs, "http_method")?,
            http_content_type: required_string(attrs, "http_content_type")?,
            content_types: required_set(attrs, "content_types")?,
            additional_headers: optional_string(attrs, "additional_headers"),
            body_template: optional_string(attrs, "body_template"),
            secret: optional_string(attrs, "secret"),
            conditions: optional_string(attrs, "conditions"),
            ca_file_path: optional_string(attrs, "ca_file_path"),
            enabled: optional_boolean(attrs, "enabled"),
            ssl_verification: optional_boolean(attrs, "ssl_verification"),
            type_create: optional_boolean(attrs, "type_create"),
            type_update: optional_boolean(attrs, "type_update"),
            type_delete: optional_boolean(attrs, "type_delete"),
        })
    }
}
