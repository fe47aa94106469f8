pub mod executor;
pub mod resolve;

pub use executor::Executor;
