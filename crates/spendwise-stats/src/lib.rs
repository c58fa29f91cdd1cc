//! Statistical helpers shared by the Spendwise optimizer crates.
//!
//! The optimizer needs a handful of summary measures to judge how settled a run is:
//! the dispersion of the best-fitness history, and the spread of fitness across the
//! final population. This crate keeps those computations in one place.
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//!
//! # Examples
//!
//! ```
//! use spendwise_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.median, 3.0);
//! ```

pub mod descriptive;
