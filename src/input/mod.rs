pub mod model;

pub use model::Task;
