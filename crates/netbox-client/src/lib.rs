//! # NetBox HTTP Client
//!
//! reqwest-based implementation of the reconciliation core's
//! [`InventoryApi`](netbox_reconcile::api::InventoryApi) boundary.
//!
//! ## Example
//!
//! ```ignore
//! use netbox_client::{ClientConfig, NetboxClient};
//! use netbox_reconcile::prelude::*;
//!
//! let client = NetboxClient::new(&ClientConfig::from_env()?)?;
//! let status = client.server_status().await?;
//!
//! let mut state = WebhookConfig::new("https://hooks.example.com", "POST", "application/json")
//!     .with_content_type("dcim.site")
//!     .to_state()?;
//! Reconciler::new(&client, &WEBHOOK).create(&mut state).await?;
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Connection settings loaded from the environment
//! - [`auth`] - API token authentication
//! - [`client`] - The HTTP client and status mapping

pub mod auth;
pub mod client;
pub mod config;

pub use auth::ApiToken;
pub use client::{NetboxClient, ServerStatus};
pub use config::{ClientConfig, ConfigError};
