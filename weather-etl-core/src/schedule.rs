use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use tracing::{error, info};

use crate::pipeline::{Pipeline, RunReport};

/// Once-a-day trigger at UTC midnight, starting no earlier than `start_date`.
///
/// Runs missed while the process was down are not replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub start_date: NaiveDate,
}

impl DailySchedule {
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }

    pub fn default_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, 21).unwrap_or_default()
    }

    /// The next trigger strictly after `now`.
    pub fn next_run(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start = midnight(self.start_date);
        if start > now {
            return start;
        }
        midnight((now + TimeDelta::days(1)).date_naive())
    }

    /// Sleep until each trigger and run the pipeline. Failed runs are logged
    /// and the schedule moves on to the next day.
    pub async fn run_forever(&self, pipeline: &Pipeline) {
        loop {
            let now = Utc::now();
            let next = self.next_run(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, wait_secs = wait.as_secs(), "Waiting for next scheduled run");
            tokio::time::sleep(wait).await;

            self.run_logged(pipeline).await;
        }
    }

    /// Run the pipeline once and log the outcome. Errors are not propagated.
    pub async fn run_logged(&self, pipeline: &Pipeline) -> Option<RunReport> {
        match pipeline.run_once().await {
            Ok(report) => {
                info!(path = %report.csv_path.display(), "Pipeline run finished");
                Some(report)
            }
            Err(err) => {
                error!(error = %err, "Pipeline run failed");
                None
            }
        }
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self::new(Self::default_start())
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
