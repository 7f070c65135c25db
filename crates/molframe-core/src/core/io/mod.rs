//! Provides output functionality for simulation results.
//!
//! Energy samples collected during a run can be exported as CSV for plotting
//! or further analysis outside the program.

pub mod samples;
