//! Identity, session and admin-authorization gate for the manuals client.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod cache;
mod gate;

pub use principal::{Identity, Role};
pub use session::{AuthEvent, Session, SessionSource, SessionStore};
pub use provider::{RoleProvider, RoleRecord};
pub use cache::{AuthCache, CacheEntry, DEFAULT_ROLE_TTL};
pub use gate::{AdminGate, Resolution};
