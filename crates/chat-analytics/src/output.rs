//! Per-run output: a uniquely named directory holding every artifact.

use crate::aggregations::{fill_gaps, periods_between, Aggregator, Month, Period};
use crate::charts::{BarChart, ChartRenderer, LineChart};
use crate::error::RenderError;
use crate::reports::ReportGenerator;
use chat_core::config::ChartConfig;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ANALYSIS_RESULTS: &str = "analysis_results.txt";
pub const MODEL_DISTRIBUTION: &str = "model_distribution.txt";
pub const CHAT_FREQUENCY: &str = "chat_frequency";
pub const MESSAGE_FREQUENCY: &str = "message_frequency";
pub const MONTHLY_MESSAGES: &str = "monthly_messages";
pub const MODEL_USAGE: &str = "model_usage";

/// Line that collects models beyond the chart's per-model limit.
const OTHER_MODELS: &str = "other models";

/// A freshly created output directory for one run.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    path: PathBuf,
}

impl RunDirectory {
    /// Create `<root>/<prefix>_<YYYYmmdd_HHMMSS>`.
    ///
    /// An existing directory is never reused: `_2`, `_3`, ... is appended
    /// until an unused name is found.
    pub fn create(root: &Path, prefix: &str, started: NaiveDateTime) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let stem = format!("{}_{}", prefix, started.format("%Y%m%d_%H%M%S"));

        let mut attempt = 1u32;
        loop {
            let name = if attempt == 1 {
                stem.clone()
            } else {
                format!("{}_{}", stem, attempt)
            };
            let path = root.join(name);
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    tracing::info!("Created output directory: {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// An artifact that could not be produced.
#[derive(Debug, Clone)]
pub struct ArtifactFailure {
    pub artifact: String,
    pub error: String,
}

/// Outcome of writing a run's artifacts.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ArtifactFailure>,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes text reports and charts for an aggregated export.
pub struct Reporter {
    renderer: Box<dyn ChartRenderer>,
    max_models: usize,
    max_buckets: usize,
}

impl Reporter {
    /// `max_models` caps the individually drawn lines on the model usage chart.
    pub fn new(renderer: Box<dyn ChartRenderer>, max_models: usize) -> Self {
        Self {
            renderer,
            max_models,
            max_buckets: ChartConfig::default().max_buckets,
        }
    }

    /// Charts whose gap-filled series would exceed `max_buckets` fail with
    /// [`RenderError::TooManyBuckets`] instead of being drawn.
    pub fn with_bucket_limit(mut self, max_buckets: usize) -> Self {
        self.max_buckets = max_buckets;
        self
    }

    /// Produce every artifact into `dir`. A failed artifact is logged and
    /// recorded; the remaining artifacts are still attempted.
    pub fn write_all(&self, agg: &Aggregator<'_>, dir: &RunDirectory) -> RunSummary {
        let mut run = RunSummary::default();
        let offset = agg.offset();

        let summary = agg.summary_counts();
        let models = agg.model_distribution();
        self.write_text(
            dir,
            ANALYSIS_RESULTS,
            &ReportGenerator::analysis_results(&summary, &models, offset),
            &mut run,
        );
        self.write_text(
            dir,
            MODEL_DISTRIBUTION,
            &ReportGenerator::model_distribution(&models, offset),
            &mut run,
        );

        let limit = self.max_buckets;
        self.render(dir, CHAT_FREQUENCY, &mut run, |r, path| {
            let series = dense(CHAT_FREQUENCY, &agg.weekly_conversation_frequency(), limit)?;
            let chart = bar_chart(
                "ChatGPT Conversations Per Week",
                "ISO Week",
                "Number of Conversations",
                &series,
                0,
            );
            r.render_bars(path, &chart)
        });

        self.render(dir, MESSAGE_FREQUENCY, &mut run, |r, path| {
            let series = dense(MESSAGE_FREQUENCY, &agg.weekly_message_frequency(), limit)?;
            let chart = bar_chart(
                "ChatGPT Messages Per Week",
                "ISO Week",
                "Number of Messages",
                &series,
                1,
            );
            r.render_bars(path, &chart)
        });

        self.render(dir, MONTHLY_MESSAGES, &mut run, |r, path| {
            let series = dense(MONTHLY_MESSAGES, &agg.monthly_message_frequency(), limit)?;
            let mut chart = bar_chart(
                "ChatGPT Messages Per Month",
                "Month",
                "Number of Messages",
                &series,
                2,
            );
            chart.value_labels = true;
            r.render_bars(path, &chart)
        });

        self.render(dir, MODEL_USAGE, &mut run, |r, path| {
            let chart = model_usage_chart(&agg.model_usage_over_time(), self.max_models, limit)?;
            r.render_lines(path, &chart)
        });

        run
    }

    fn write_text(&self, dir: &RunDirectory, name: &str, contents: &str, run: &mut RunSummary) {
        let path = dir.path().join(name);
        match std::fs::write(&path, contents) {
            Ok(()) => {
                tracing::debug!("Wrote {}", path.display());
                run.written.push(path);
            }
            Err(e) => {
                tracing::error!(artifact = name, "Failed to write report: {}", e);
                run.failures.push(ArtifactFailure {
                    artifact: name.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn render<F>(&self, dir: &RunDirectory, series: &str, run: &mut RunSummary, draw: F)
    where
        F: FnOnce(&dyn ChartRenderer, &Path) -> Result<(), RenderError>,
    {
        let name = format!("{}.{}", series, self.renderer.extension());
        let path = dir.path().join(&name);
        match draw(self.renderer.as_ref(), &path) {
            Ok(()) => {
                tracing::debug!("Rendered {}", path.display());
                run.written.push(path);
            }
            Err(e) => {
                tracing::error!(series, "Failed to render chart: {}", e);
                run.failures.push(ArtifactFailure {
                    artifact: name,
                    error: e.to_string(),
                });
            }
        }
    }
}

fn dense<K: Period>(series: &str, sparse: &[(K, usize)], limit: usize) -> Result<Vec<(K, usize)>, RenderError> {
    fill_gaps(sparse, limit).ok_or_else(|| RenderError::TooManyBuckets {
        series: series.to_string(),
        limit,
    })
}

fn bar_chart<K: Period>(
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[(K, usize)],
    color_index: usize,
) -> BarChart {
    BarChart {
        title: title.into(),
        x_desc: x_desc.into(),
        y_desc: y_desc.into(),
        labels: series.iter().map(|(k, _)| k.to_string()).collect(),
        values: series.iter().map(|(_, c)| *c).collect(),
        value_labels: false,
        color_index,
    }
}

/// One line per model across every month from first to last, busiest models
/// first. Models past `max_models` are summed into a single line.
fn model_usage_chart(
    usage: &[(Month, BTreeMap<String, usize>)],
    max_models: usize,
    max_buckets: usize,
) -> Result<LineChart, RenderError> {
    let mut chart = LineChart {
        title: "ChatGPT Model Usage Over Time".into(),
        x_desc: "Month".into(),
        y_desc: "Number of Conversations".into(),
        labels: Vec::new(),
        lines: Vec::new(),
    };
    let (Some((first, _)), Some((last, _))) = (usage.first(), usage.last()) else {
        return Ok(chart);
    };

    let months = periods_between(*first, *last, max_buckets).ok_or_else(|| RenderError::TooManyBuckets {
        series: MODEL_USAGE.to_string(),
        limit: max_buckets,
    })?;
    let by_month: BTreeMap<Month, &BTreeMap<String, usize>> =
        usage.iter().map(|(month, models)| (*month, models)).collect();

    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, models) in usage {
        for (model, count) in models {
            *totals.entry(model.as_str()).or_insert(0) += count;
        }
    }
    let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let count_in = |month: &Month, model: &str| {
        by_month
            .get(month)
            .and_then(|models| models.get(model))
            .copied()
            .unwrap_or(0)
    };

    let (shown, folded) = ranked.split_at(ranked.len().min(max_models));
    for (model, _) in shown {
        let values = months.iter().map(|m| count_in(m, *model)).collect();
        chart.lines.push((model.to_string(), values));
    }
    if !folded.is_empty() {
        let values = months
            .iter()
            .map(|m| folded.iter().map(|(model, _)| count_in(m, *model)).sum())
            .collect();
        chart.lines.push((OTHER_MODELS.to_string(), values));
    }

    chart.labels = months.iter().map(Month::to_string).collect();
    Ok(chart)
}
