//! Test helpers shared by the eegraph crates.
//!
//! [`RecordingLayer`](crate::tracing::RecordingLayer) captures spans and events for assertions on
//! instrumentation, and [`ci::property_suite`] builds the proptest configuration
//! every property suite shares.

pub mod ci;
pub mod tracing;
