pub mod collections;
pub mod entity_cache;
pub mod invalidation;
pub mod organization_cache;
pub mod pagination;
pub mod scope_gate;

pub use collections::{Collection, EnvironmentSecrets, Environments, Repositories, TeamRepositories};
pub use entity_cache::{CacheStats, EntityCache};
pub use organization_cache::{GoneReason, OrganizationCache, OrganizationStats, Resolution};
pub use pagination::paginate;
pub use scope_gate::{ScopeGate, ScopeState};
