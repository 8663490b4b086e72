use rand::distr::{Alphanumeric, SampleString};

pub(crate) mod chain;

pub mod executor;

pub mod item;

pub mod job;

pub mod listener;

pub mod metrics;

pub mod monitor;

pub mod parameters;

pub mod record;

pub mod report;

/// Generates a random name consisting of alphanumeric characters.
///
/// # Returns
///
/// A `String` containing the generated random name.
pub(crate) fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}
