//! Storefront Admin
//!
//! Client-side resource management for the storefront administration
//! dashboard: loading, filtering, paging and mutating blogs, sliders,
//! certificates, reviews, notifications, refunds, stock and transactions
//! through the admin REST API.

pub mod config;
pub mod errors;
pub mod filter;
pub mod form;
pub mod gateway;
pub mod models;
pub mod presenter;
pub mod session;
pub mod store;

pub use config::{Config, LogFormat};
pub use errors::{ErrorKind, FieldError, ResourceError};
pub use filter::{FilterEngine, FilterState};
pub use form::{FormDraft, FormSession, FormState};
pub use gateway::{HttpGateway, RestGateway};
pub use models::{Resource, ResourceKind, ResourceSchema};
pub use presenter::{PresenterSettings, ResourcePresenter};
pub use session::SessionStore;
pub use store::ResourceStore;
