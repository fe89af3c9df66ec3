pub mod prober;

pub use prober::{ProbeReport, Prober};
