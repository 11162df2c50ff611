mod model;
mod repository;

pub use model::{FetchJobDB, NewFetchJobDB};
pub use repository::{JobQueueRepository, DEFAULT_VISIBILITY_TIMEOUT};
