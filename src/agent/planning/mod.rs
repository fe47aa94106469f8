pub mod plan;
pub mod planner;

pub use plan::{Argument, PLAN_SCHEMA, Plan, RawPlan, RawStep, Step};
pub use planner::Planner;
