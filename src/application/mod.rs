pub mod builder;
pub mod conditional;
pub mod errors;
pub mod ports;
pub mod scoped_pool;
pub mod use_cases;
