//! Environment-driven knobs shared by the CI test jobs.

pub mod property_suite;
