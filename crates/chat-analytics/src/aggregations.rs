//! Time and frequency aggregations over loaded conversations.
//!
//! Every operation is a pure function of the conversation slice and the bucket
//! timezone: calling it twice yields identical results.

use chat_core::types::{Conversation, Role};
use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A calendar bucket key that knows its successor.
pub trait Period: Copy + Ord + fmt::Display {
    fn succ(self) -> Self;
}

/// Monday starting an ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekStart(NaiveDate);

impl WeekStart {
    /// Weeks cut short by chrono's lower date bound start at `NaiveDate::MIN`.
    pub fn containing(date: NaiveDate) -> Self {
        let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
        Self(date.checked_sub_days(back).unwrap_or(NaiveDate::MIN))
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl Period for WeekStart {
    fn succ(self) -> Self {
        Self(self.0.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX))
    }
}

/// Formats as the ISO week label, e.g. `2024-W10`.
impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let week = self.0.iso_week();
        write!(f, "{}-W{:02}", week.year(), week.week())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }
}

impl Period for Month {
    fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Ascending `(bucket, count)` pairs with unique keys.
pub type Series<K> = Vec<(K, usize)>;

/// Every period from `first` to `last` inclusive, or `None` if that is more
/// than `limit` periods.
pub fn periods_between<K: Period>(first: K, last: K, limit: usize) -> Option<Vec<K>> {
    let mut periods = Vec::new();
    let mut current = first;
    while current <= last {
        if periods.len() == limit {
            return None;
        }
        periods.push(current);
        let next = current.succ();
        if next <= current {
            break;
        }
        current = next;
    }
    Some(periods)
}

/// Dense copy of `series` with zero-count buckets for every skipped period,
/// or `None` if the dense series would exceed `limit` buckets.
pub fn fill_gaps<K: Period>(series: &[(K, usize)], limit: usize) -> Option<Series<K>> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Some(Vec::new());
    };
    let counts: BTreeMap<K, usize> = series.iter().copied().collect();
    let dense = periods_between(first.0, last.0, limit)?
        .into_iter()
        .map(|period| (period, counts.get(&period).copied().unwrap_or(0)))
        .collect();
    Some(dense)
}

fn count_by<K: Ord>(keys: impl Iterator<Item = K>) -> Series<K> {
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

/// Conversation counts for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelUsage {
    pub model: String,
    pub conversations: usize,
    /// Share of all conversations, rounded to one decimal place.
    pub percentage: f64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Headline totals for the text report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCounts {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub messages_by_role: BTreeMap<Role, usize>,
    pub messages_with_timestamp: usize,
    /// Messages left out of time series because their timestamp was unusable.
    pub undated_messages: usize,
    /// Conversations left out of time series because their creation time was unusable.
    pub undated_conversations: usize,
    pub avg_messages_per_conversation: f64,
    pub content_chars: usize,
    /// Earliest and latest valid timestamp, messages and creation times alike.
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Aggregations over a loaded export.
pub struct Aggregator<'a> {
    conversations: &'a [Conversation],
    offset: FixedOffset,
}

impl<'a> Aggregator<'a> {
    /// `offset` fixes the timezone used for every calendar bucket.
    pub fn new(conversations: &'a [Conversation], offset: FixedOffset) -> Self {
        Self {
            conversations,
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    fn message_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.conversations
            .iter()
            .flat_map(|c| c.message_times())
            .map(|ts| self.local_date(ts))
    }

    fn conversation_dates(&self) -> impl Iterator<Item = (NaiveDate, &'a Conversation)> + '_ {
        self.conversations
            .iter()
            .filter_map(|c| c.created_at.map(|ts| (self.local_date(ts), c)))
    }

    pub fn weekly_message_frequency(&self) -> Series<WeekStart> {
        count_by(self.message_dates().map(WeekStart::containing))
    }

    /// Conversations without a valid creation time are left out.
    pub fn weekly_conversation_frequency(&self) -> Series<WeekStart> {
        count_by(self.conversation_dates().map(|(d, _)| WeekStart::containing(d)))
    }

    pub fn monthly_message_frequency(&self) -> Series<Month> {
        count_by(self.message_dates().map(Month::containing))
    }

    pub fn role_breakdown(&self) -> BTreeMap<Role, usize> {
        let mut counts = BTreeMap::new();
        for msg in self.conversations.iter().flat_map(|c| &c.messages) {
            *counts.entry(msg.role).or_insert(0) += 1;
        }
        counts
    }

    /// Per month of creation, conversation counts keyed by model.
    pub fn model_usage_over_time(&self) -> Vec<(Month, BTreeMap<String, usize>)> {
        let mut months: BTreeMap<Month, BTreeMap<String, usize>> = BTreeMap::new();
        for (date, conv) in self.conversation_dates() {
            *months
                .entry(Month::containing(date))
                .or_default()
                .entry(conv.model.clone())
                .or_insert(0) += 1;
        }
        months.into_iter().collect()
    }

    /// Models by conversation count, descending; ties ordered by model name.
    pub fn model_distribution(&self) -> Vec<ModelUsage> {
        let mut by_model: HashMap<&str, ModelUsage> = HashMap::new();
        for conv in self.conversations {
            let usage = by_model.entry(conv.model.as_str()).or_insert_with(|| ModelUsage {
                model: conv.model.clone(),
                conversations: 0,
                percentage: 0.0,
                first_seen: None,
                last_seen: None,
            });
            usage.conversations += 1;
            if let Some(ts) = conv.created_at {
                usage.first_seen = Some(usage.first_seen.map_or(ts, |seen| seen.min(ts)));
                usage.last_seen = Some(usage.last_seen.map_or(ts, |seen| seen.max(ts)));
            }
        }

        let mut usages: Vec<ModelUsage> = by_model.into_values().collect();
        usages.sort_by(|a, b| {
            b.conversations
                .cmp(&a.conversations)
                .then_with(|| a.model.cmp(&b.model))
        });

        let counts: Vec<usize> = usages.iter().map(|u| u.conversations).collect();
        for (usage, pct) in usages.iter_mut().zip(rounded_percentages(&counts)) {
            usage.percentage = pct;
        }
        usages
    }

    pub fn summary_counts(&self) -> SummaryCounts {
        let total_conversations = self.conversations.len();
        let total_messages: usize = self.conversations.iter().map(|c| c.messages.len()).sum();
        let messages_with_timestamp = self
            .conversations
            .iter()
            .map(|c| c.message_times().count())
            .sum();

        let times = self
            .conversations
            .iter()
            .flat_map(|c| c.created_at.into_iter().chain(c.message_times()));
        let date_range = times.fold(None, |range: Option<(DateTime<Utc>, DateTime<Utc>)>, ts| {
            Some(match range {
                Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
                None => (ts, ts),
            })
        });

        SummaryCounts {
            total_conversations,
            total_messages,
            messages_by_role: self.role_breakdown(),
            messages_with_timestamp,
            undated_messages: total_messages - messages_with_timestamp,
            undated_conversations: self
                .conversations
                .iter()
                .filter(|c| c.created_at.is_none())
                .count(),
            avg_messages_per_conversation: if total_conversations == 0 {
                0.0
            } else {
                total_messages as f64 / total_conversations as f64
            },
            content_chars: self
                .conversations
                .iter()
                .flat_map(|c| &c.messages)
                .map(|m| m.content.chars().count())
                .sum(),
            date_range,
        }
    }
}

/// Percentages to one decimal place that sum to exactly 100.0.
///
/// Largest-remainder rounding in tenths of a percent: floor every share, then
/// hand the leftover tenths to the largest remainders (earlier index on ties).
pub fn rounded_percentages(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }

    let mut tenths: Vec<u64> = Vec::with_capacity(counts.len());
    let mut remainders: Vec<(usize, u64)> = Vec::with_capacity(counts.len());
    for (i, &count) in counts.iter().enumerate() {
        let scaled = count as u64 * 1000;
        tenths.push(scaled / total as u64);
        remainders.push((i, scaled % total as u64));
    }

    let assigned: u64 = tenths.iter().sum();
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for &(i, _) in remainders.iter().take((1000 - assigned) as usize) {
        tenths[i] += 1;
    }

    tenths.into_iter().map(|t| t as f64 / 10.0).collect()
}
