/// This module provides a record reader over any iterator.
pub mod iterator;

/// This module provides an in-memory record writer.
pub mod vec;

/// This module provides a record reader and writers over blocking channels, to chain jobs.
pub mod channel;

/// This module provides ready-made record filters.
pub mod filter;

#[cfg(feature = "logger")]
/// This module provides a logger record writer.
pub mod logger;
