//! Pure dependency-analysis domain: value objects, scoring and aggregation
//! services, and the policies they apply. Nothing in here performs I/O.

pub mod domain;
pub mod policies;
pub mod services;
