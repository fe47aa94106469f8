pub mod planner;
pub mod verifier;

/// System and user text for one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}
