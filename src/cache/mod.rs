// Response cache module
// Author: kelexine (https://github.com/kelexine)

pub mod fingerprint;
pub mod models;
pub mod store;

pub use fingerprint::{fingerprint, Fingerprint};
pub use models::CarbonCost;
pub use store::CacheStore;
