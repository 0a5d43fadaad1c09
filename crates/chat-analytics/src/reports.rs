//! Plain-text report generation from aggregated statistics.

use crate::aggregations::{ModelUsage, SummaryCounts};
use chrono::{DateTime, FixedOffset, Utc};

const RULE_WIDTH: usize = 40;

/// Report generator for the text artifacts of a run.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Headline totals, role counts, models, and the covered date range.
    pub fn analysis_results(
        summary: &SummaryCounts,
        models: &[ModelUsage],
        offset: FixedOffset,
    ) -> String {
        let mut report = String::new();

        report.push_str("ChatGPT Conversation Analysis Results\n");
        report.push_str(&"=".repeat(RULE_WIDTH));
        report.push_str("\n\n");

        report.push_str(&format!("Total Conversations: {}\n", summary.total_conversations));
        report.push_str(&format!("Total Messages: {}\n", summary.total_messages));
        report.push_str(&format!(
            "Messages with Timestamps: {}\n",
            summary.messages_with_timestamp
        ));
        if summary.undated_messages > 0 || summary.undated_conversations > 0 {
            report.push_str(&format!(
                "Unparsable Timestamps: {} messages, {} conversations\n",
                summary.undated_messages, summary.undated_conversations
            ));
        }
        report.push_str(&format!(
            "Average Messages per Conversation: {:.2}\n",
            summary.avg_messages_per_conversation
        ));
        report.push_str(&format!("Total Content Characters: {}\n\n", summary.content_chars));

        report.push_str("Messages by Role:\n");
        if summary.messages_by_role.is_empty() {
            report.push_str("  (none)\n");
        }
        for (role, count) in &summary.messages_by_role {
            report.push_str(&format!("  {}: {}\n", role, count));
        }
        report.push('\n');

        report.push_str("Models Used:\n");
        if models.is_empty() {
            report.push_str("  (none)\n");
        }
        for usage in models {
            report.push_str(&format!("  {}: {}\n", usage.model, usage.conversations));
        }
        report.push('\n');

        report.push_str("Conversation Date Range:\n");
        match summary.date_range {
            Some((first, last)) => {
                report.push_str(&format!("  First: {}\n", format_timestamp(first, offset)));
                report.push_str(&format!("  Last: {}\n", format_timestamp(last, offset)));
            }
            None => report.push_str("  (no valid timestamps)\n"),
        }

        report
    }

    /// Per-model conversation counts and shares, most used first.
    pub fn model_distribution(models: &[ModelUsage], offset: FixedOffset) -> String {
        let mut report = String::new();

        report.push_str("Model Usage Distribution\n");
        report.push_str(&"=".repeat(RULE_WIDTH));
        report.push_str("\n\n");

        let total: usize = models.iter().map(|u| u.conversations).sum();

        if models.is_empty() {
            report.push_str("No conversations.\n");
        } else {
            let name_width = models
                .iter()
                .map(|u| u.model.chars().count())
                .max()
                .unwrap_or(0)
                .max("Model".len());

            report.push_str(&format!(
                "{:<name_width$}  {:>13}  {:>10}  {:<10}  {:<10}\n",
                "Model", "Conversations", "Percentage", "First", "Last",
            ));
            for usage in models {
                report.push_str(&format!(
                    "{:<name_width$}  {:>13}  {:>10}  {:<10}  {:<10}\n",
                    usage.model,
                    usage.conversations,
                    format!("{:.1}%", usage.percentage),
                    format_day(usage.first_seen, offset),
                    format_day(usage.last_seen, offset),
                ));
            }
        }

        report.push_str(&format!("\nTotal Conversations: {}\n", total));
        report
    }
}

fn format_timestamp(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S %:z")
        .to_string()
}

fn format_day(ts: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    ts.map(|ts| ts.with_timezone(&offset).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into())
}
