pub mod challenge;
pub mod provider;
pub mod zone;
