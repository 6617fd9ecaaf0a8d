use std::time::Duration;

use serde::Serialize;

use crate::correlator::Delivery;

/// Scheduler operational counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerMetrics {
    /// Tasks admitted through `submit`.
    pub tasks_submitted: u64,
    /// Tasks handed to the executor.
    pub tasks_dispatched: u64,
    /// Outcomes sent on a live completion handle.
    pub outcomes_delivered: u64,
    /// Outcomes whose task was no longer registered.
    pub deliveries_dropped: u64,
    /// Second outcomes for an already completed task.
    pub duplicate_deliveries: u64,
    /// Tasks removed without ever producing an outcome.
    pub tasks_abandoned: u64,
    /// Mean executor wall time.
    pub avg_execution: Duration,
    /// Deepest the queue has been right after a submission.
    pub max_queue_depth: usize,
}

impl SchedulerMetrics {
    pub fn record_submission(&mut self, queue_depth: usize) {
        self.tasks_submitted += 1;
        self.max_queue_depth = self.max_queue_depth.max(queue_depth);
    }

    /// Record one executor run.
    pub fn record_dispatch(&mut self, duration: Duration) {
        self.tasks_dispatched += 1;

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        self.avg_execution = if self.tasks_dispatched == 1 {
            duration
        } else {
            let prev_nanos = self.avg_execution.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / self.tasks_dispatched as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
    }

    pub fn record_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Delivered => self.outcomes_delivered += 1,
            Delivery::Dropped => self.deliveries_dropped += 1,
        }
    }

    pub fn record_duplicate(&mut self) {
        self.duplicate_deliveries += 1;
    }

    pub fn record_abandoned(&mut self, count: usize) {
        self.tasks_abandoned += count as u64;
    }

    /// Tasks that were admitted but have neither run nor been abandoned.
    pub fn in_flight(&self) -> u64 {
        self.tasks_submitted
            .saturating_sub(self.tasks_dispatched + self.tasks_abandoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics() {
        let m = SchedulerMetrics::default();
        assert_eq!(m.tasks_submitted, 0);
        assert_eq!(m.avg_execution, Duration::ZERO);
        assert_eq!(m.in_flight(), 0);
    }

    #[test]
    fn record_multiple_dispatches_averages() {
        let mut m = SchedulerMetrics::default();
        m.record_dispatch(Duration::from_millis(100));
        m.record_dispatch(Duration::from_millis(200));

        assert_eq!(m.tasks_dispatched, 2);
        // Average of 100ms and 200ms = 150ms
        let avg = m.avg_execution.as_millis();
        assert!((140..=160).contains(&avg), "expected ~150ms, got {}ms", avg);
    }

    #[test]
    fn submissions_track_max_depth() {
        let mut m = SchedulerMetrics::default();
        m.record_submission(3);
        m.record_submission(1);
        assert_eq!(m.tasks_submitted, 2);
        assert_eq!(m.max_queue_depth, 3);
        assert_eq!(m.in_flight(), 2);
    }

    #[test]
    fn deliveries_split_by_kind() {
        let mut m = SchedulerMetrics::default();
        m.record_delivery(Delivery::Delivered);
        m.record_delivery(Delivery::Dropped);
        m.record_delivery(Delivery::Delivered);
        assert_eq!(m.outcomes_delivered, 2);
        assert_eq!(m.deliveries_dropped, 1);
    }

    #[test]
    fn serializes_for_status_output() {
        let mut m = SchedulerMetrics::default();
        m.record_submission(2);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["tasks_submitted"], 1);
        assert_eq!(json["max_queue_depth"], 2);
    }
}
