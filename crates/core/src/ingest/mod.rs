pub mod provider;
pub mod reconciler;
pub mod types;
