pub mod template;
pub mod verifier;

pub use verifier::Verifier;
