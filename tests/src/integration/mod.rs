//! Engine-level integration tests.

pub mod concurrent_validation;
pub mod retarget_flows;
