pub mod date_utils;
pub mod exam;
pub mod lookup;
pub mod pool_cache;
pub mod provider;
pub mod scheduler;
