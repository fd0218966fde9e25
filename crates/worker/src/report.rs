use stockwatch_core::ingest::reconciler::TickerReport;

/// Per-ticker outcomes aggregated over one batch run. Every ticker in the
/// watchlist is always attempted; this is the success/failure summary the
/// run logs and records at the end.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reports: Vec<TickerReport>,
    pub fetch_failures: Vec<(String, String)>,
}

impl BatchReport {
    pub fn push(&mut self, report: TickerReport) {
        self.reports.push(report);
    }

    pub fn push_fetch_failure(&mut self, ticker: &str, error: &anyhow::Error) {
        self.fetch_failures.push((ticker.to_string(), format!("{error:#}")));
    }

    pub fn total(&self) -> usize {
        self.reports.len() + self.fetch_failures.len()
    }

    pub fn failed(&self) -> usize {
        self.fetch_failures.len()
            + self.reports.iter().filter(|r| !r.is_success()).count()
    }

    pub fn bars_written(&self) -> u64 {
        self.reports.iter().map(|r| r.bars_written).sum()
    }

    pub fn news_inserted(&self) -> u64 {
        self.reports.iter().map(|r| r.news_inserted).sum()
    }

    pub fn status(&self) -> &'static str {
        if self.failed() == 0 {
            "success"
        } else if self.failed() == self.total() {
            "error"
        } else {
            "partial"
        }
    }

    /// One line per failed ticker, for the ingest_runs audit row.
    pub fn error_summary(&self) -> Option<String> {
        let mut lines: Vec<String> = self
            .fetch_failures
            .iter()
            .map(|(ticker, err)| format!("{ticker}: {err}"))
            .collect();
        for report in self.reports.iter().filter(|r| !r.is_success()) {
            lines.push(format!("{}: {}", report.ticker, report.errors.join("; ")));
        }

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(ticker: &str, errors: Vec<String>) -> TickerReport {
        TickerReport {
            ticker: ticker.to_string(),
            bars_written: 3,
            metadata_updated: true,
            news_inserted: 1,
            errors,
        }
    }

    #[test]
    fn all_success_reports_success_status() {
        let mut batch = BatchReport::default();
        batch.push(report("ABC", vec![]));
        batch.push(report("XYZ", vec![]));

        assert_eq!(batch.total(), 2);
        assert_eq!(batch.failed(), 0);
        assert_eq!(batch.status(), "success");
        assert_eq!(batch.error_summary(), None);
        assert_eq!(batch.bars_written(), 6);
    }

    #[test]
    fn fetch_failure_counts_as_failed_but_not_fatal() {
        let mut batch = BatchReport::default();
        batch.push(report("ABC", vec![]));
        batch.push_fetch_failure("XYZ", &anyhow::anyhow!("provider unavailable"));

        assert_eq!(batch.total(), 2);
        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.status(), "partial");
        assert!(batch.error_summary().unwrap().contains("XYZ"));
    }

    #[test]
    fn store_errors_inside_a_report_mark_the_ticker_failed() {
        let mut batch = BatchReport::default();
        batch.push(report("ABC", vec!["price_bars: boom".to_string()]));

        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.status(), "error");
        assert!(batch.error_summary().unwrap().contains("price_bars: boom"));
    }
}
