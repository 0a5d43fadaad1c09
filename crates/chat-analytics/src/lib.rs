//! Aggregation, charting, and report generation for chat exports.
//!
//! Computes time-bucketed message and conversation frequencies, role and
//! model breakdowns, and writes them out as charts and plain-text reports.

pub mod aggregations;
pub mod charts;
pub mod error;
pub mod output;
pub mod reports;

pub use aggregations::{Aggregator, ModelUsage, Month, Period, SummaryCounts, WeekStart};
pub use charts::{ChartRenderer, SvgCharts};
pub use error::RenderError;
pub use output::{Reporter, RunDirectory, RunSummary};
pub use reports::ReportGenerator;
