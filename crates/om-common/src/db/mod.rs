pub mod memory;
pub mod pool;
pub mod profiles;
pub mod util;

pub use memory::InMemoryProfileStore;
pub use pool::{DbPoolError, PgPool, create_pool_from_url};
pub use profiles::{DEFAULT_FETCH_CAP, PgProfileStore, ProfileStore, ProfileStoreError};
