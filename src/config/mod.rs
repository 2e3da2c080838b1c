pub mod models;
pub mod store;

pub use self::{models::ConfigValue, store::ConfigStore};
