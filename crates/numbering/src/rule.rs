use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// How the year segment of a generated number is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum YearFormat {
    /// Four-digit year, e.g. `2026`.
    Yyyy,
    /// Two-digit year, e.g. `26`.
    Yy,
}

/// When the sequence counter starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SequenceResetPolicy {
    /// Reset to zero whenever the generation year changes.
    Yearly,
    /// Keep counting across years.
    Never,
}

/// Per-tenant employee numbering rule.
///
/// `current_sequence` is monotonically non-decreasing within one reset epoch
/// and is advanced exactly once per allocation, by the allocator, under that
/// tenant's exclusive lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeNumberRule {
    pub prefix: String,
    pub include_year: bool,
    pub year_format: YearFormat,
    pub sequence_digits: usize,
    pub sequence_reset_policy: SequenceResetPolicy,
    pub current_sequence: u32,
    /// Last year the sequence was advanced for.
    pub current_year: Option<i32>,
    pub separator: String,
    pub allow_reuse: bool,
}

impl EmployeeNumberRule {
    /// A fresh rule with the common defaults: yearly reset, four-digit
    /// sequence, four-digit year, `-` separator, no number reuse.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            include_year: true,
            year_format: YearFormat::Yyyy,
            sequence_digits: 4,
            sequence_reset_policy: SequenceResetPolicy::Yearly,
            current_sequence: 0,
            current_year: None,
            separator: "-".to_string(),
            allow_reuse: false,
        }
    }

    /// Advance the rule for one allocation and return the formatted number.
    ///
    /// The generation year comes from `effective_date`, so year-based numbers
    /// reflect business time (a transfer date, a hire date), not "today".
    pub fn next_number(&mut self, effective_date: NaiveDate) -> String {
        let year = effective_date.year();

        if self.sequence_reset_policy == SequenceResetPolicy::Yearly
            && self.current_year != Some(year)
        {
            self.current_sequence = 0;
        }

        self.current_year = Some(year);
        self.current_sequence += 1;

        self.format(year)
    }

    fn format(&self, year: i32) -> String {
        let sequence = format!(
            "{:0width$}",
            self.current_sequence,
            width = self.sequence_digits
        );

        if self.include_year {
            let year = match self.year_format {
                YearFormat::Yyyy => format!("{year:04}"),
                YearFormat::Yy => format!("{:02}", year.rem_euclid(100)),
            };
            format!(
                "{}{}{}{}{}",
                self.prefix, self.separator, year, self.separator, sequence
            )
        } else {
            format!("{}{}{}", self.prefix, self.separator, sequence)
        }
    }
}

/// Degenerate number for tenants without a configured rule:
/// `{year}-{zero-padded(existing_count + 1)}`. Nothing is persisted for this
/// scheme, so callers need no lock.
pub fn fallback_number(year: i32, existing_count: u64) -> String {
    format!("{year}-{:04}", existing_count + 1)
}
