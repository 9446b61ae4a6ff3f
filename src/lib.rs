pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod utils;

pub use api::client::{ApiClient, ApiRequest, HttpTransport, Transport};
pub use api::models::{Contact, ContactFilter, EntityId, Group, GroupRef, Listing, Memberships};
pub use config::Settings;
pub use error::{Error, Result};
pub use store::{Store, StoreState};
