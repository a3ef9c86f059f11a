//! Rendering of evaluation results: text table, HTML report and, with the
//! `plots` feature, Plotly diagnostics.
pub mod html;
#[cfg(feature = "plots")]
pub mod plots;
pub mod table;

pub use html::{Report, ReportSection};
