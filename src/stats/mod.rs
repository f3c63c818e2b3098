//! Dashboard aggregates for ward admins, the super admin and field workers.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};

use crate::models::{
    Alert, CityStats, DailyCount, Feedback, Priority, PriorityCount, Report, ReportState,
    ReportStatus, Resolution, Ward, WardStats, WorkerStats,
};

/// Wards below this readiness score count as high risk.
pub const HIGH_RISK_READINESS: i64 = 60;

/// Number of most recent days shown in the completion history.
pub const COMPLETION_HISTORY_DAYS: usize = 7;

fn day_of(timestamp: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|t| t.date_naive())
}

fn feedback_of(report: &Report) -> Option<Feedback> {
    report.state.feedback().map(|f| f.feedback)
}

fn count_status(reports: &[Report], status: ReportStatus) -> usize {
    reports.iter().filter(|r| r.status() == status).count()
}

pub fn ward_stats(
    ward: &str,
    ward_no: i64,
    total_users: usize,
    reports: &[Report],
    today: NaiveDate,
) -> WardStats {
    let resolved: Vec<&Report> = reports
        .iter()
        .filter(|r| r.status() == ReportStatus::Resolved)
        .collect();

    WardStats {
        ward: ward.to_string(),
        ward_no,
        total_users,
        total_reports: reports.len(),
        active_reports: reports.iter().filter(|r| r.status().is_active()).count(),
        resolved_today: resolved
            .iter()
            .filter(|r| day_of(&r.date) == Some(today))
            .count(),
        positive_feedback: resolved
            .iter()
            .filter(|r| feedback_of(r) == Some(Feedback::Positive))
            .count(),
        negative_feedback: resolved
            .iter()
            .filter(|r| feedback_of(r) == Some(Feedback::Negative))
            .count(),
        resolved_with_feedback: resolved.iter().filter(|r| feedback_of(r).is_some()).count(),
        total_resolved: resolved.len(),
    }
}

pub fn city_stats(wards: &[Ward], alerts: &[Alert], reports: &[Report]) -> CityStats {
    let average_readiness = if wards.is_empty() {
        0
    } else {
        let total: i64 = wards.iter().map(|w| w.readiness).sum();
        (total as f64 / wards.len() as f64).round() as i64
    };

    CityStats {
        total_wards: wards.len(),
        total_hotspots: wards.iter().map(|w| w.hotspots).sum(),
        high_risk_wards: wards
            .iter()
            .filter(|w| w.readiness < HIGH_RISK_READINESS)
            .count(),
        active_alerts: alerts.iter().filter(|a| !a.is_read).count(),
        total_reports: reports.len(),
        pending_reports: count_status(reports, ReportStatus::Pending),
        in_progress_reports: count_status(reports, ReportStatus::InProgress),
        resolved_reports: count_status(reports, ReportStatus::Resolved),
        average_readiness,
    }
}

/// Start and completion timestamps of work the worker finished.
fn work_window(state: &ReportState) -> Option<(&str, &str)> {
    match state {
        ReportState::WorkCompleted {
            worker_started_at,
            worker_completed_at,
            ..
        }
        | ReportState::Resolved {
            resolution:
                Resolution::Verified {
                    worker_started_at,
                    worker_completed_at,
                    ..
                },
            ..
        } => Some((worker_started_at.as_str(), worker_completed_at.as_str())),
        _ => None,
    }
}

/// Statistics over the reports assigned to one field worker.
pub fn worker_stats(reports: &[Report]) -> WorkerStats {
    let durations: Vec<f64> = reports
        .iter()
        .filter_map(|r| work_window(&r.state))
        .filter_map(|(start, end)| {
            let start = DateTime::parse_from_rfc3339(start).ok()?;
            let end = DateTime::parse_from_rfc3339(end).ok()?;
            Some((end - start).num_milliseconds() as f64 / 3_600_000.0)
        })
        .collect();

    let average_resolution_hours = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    };

    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for (_, end) in reports.iter().filter_map(|r| work_window(&r.state)) {
        if let Some(day) = day_of(end) {
            *by_day.entry(day).or_default() += 1;
        }
    }
    let skip = by_day.len().saturating_sub(COMPLETION_HISTORY_DAYS);
    let completed_by_date = by_day
        .into_iter()
        .skip(skip)
        .map(|(date, count)| DailyCount {
            date: date.to_string(),
            count,
        })
        .collect();

    let by_priority = Priority::ALL
        .iter()
        .map(|p| PriorityCount {
            priority: p.as_str().to_string(),
            count: reports.iter().filter(|r| r.priority == *p).count(),
        })
        .collect();

    WorkerStats {
        total_tasks: reports.len(),
        assigned: count_status(reports, ReportStatus::Assigned),
        in_progress: count_status(reports, ReportStatus::InProgress),
        completed: reports
            .iter()
            .filter(|r| {
                matches!(
                    r.status(),
                    ReportStatus::WorkCompleted | ReportStatus::Resolved
                )
            })
            .count(),
        average_resolution_hours,
        completed_by_date,
        by_priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertSeverity, Assignment, FeedbackRecord, WardResources};

    fn assignment() -> Assignment {
        Assignment {
            assigned_worker_id: "fw_1".into(),
            assigned_worker_name: "Ravi".into(),
            assigned_at: "2024-08-10T08:00:00+00:00".into(),
        }
    }

    fn report(id: i64, date: &str, priority: Priority, state: ReportState) -> Report {
        Report {
            id,
            user_id: "u1".into(),
            user: "Asha".into(),
            description: "Water on road".into(),
            location: "Rohini, Delhi (28.7041, 77.1025)".into(),
            ward: "Rohini".into(),
            ward_no: 8,
            latitude: 28.7041,
            longitude: 77.1025,
            date: date.into(),
            image: None,
            priority,
            priority_reason: None,
            near_sensitive_area: false,
            sensitive_area_info: None,
            state,
            version: 1,
        }
    }

    fn completed(start: &str, end: &str) -> ReportState {
        ReportState::WorkCompleted {
            assignment: assignment(),
            worker_started_at: start.into(),
            worker_completed_at: end.into(),
            completion_proof_url: "proof.png".into(),
        }
    }

    fn resolved(start: &str, end: &str, feedback: Option<Feedback>) -> ReportState {
        ReportState::Resolved {
            resolution: Resolution::Verified {
                assignment: assignment(),
                worker_started_at: start.into(),
                worker_completed_at: end.into(),
                completion_proof_url: "proof.png".into(),
            },
            resolved_at: end.into(),
            feedback: feedback.map(|feedback| FeedbackRecord {
                feedback,
                feedback_date: end.into(),
            }),
        }
    }

    fn ward(ward_no: i64, readiness: i64, hotspots: i64) -> Ward {
        Ward {
            ward_no,
            name: format!("Ward {}", ward_no),
            readiness,
            resources: WardResources {
                pumps: 1,
                personnel: 1,
                vehicles: 1,
            },
            hotspots,
            last_maintenance: "2024-07-01".into(),
            coords: [28.7, 77.1],
            boundary: None,
        }
    }

    #[test]
    fn test_ward_stats_counts() {
        let today = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        let reports = vec![
            report(1, "2024-08-15T09:00:00+00:00", Priority::Medium, ReportState::Pending),
            report(
                2,
                "2024-08-15T07:00:00+00:00",
                Priority::High,
                resolved(
                    "2024-08-15T08:00:00+00:00",
                    "2024-08-15T10:00:00+00:00",
                    Some(Feedback::Positive),
                ),
            ),
            report(
                3,
                "2024-08-14T07:00:00+00:00",
                Priority::Medium,
                resolved(
                    "2024-08-14T08:00:00+00:00",
                    "2024-08-14T10:00:00+00:00",
                    Some(Feedback::Negative),
                ),
            ),
            report(
                4,
                "2024-08-14T07:00:00+00:00",
                Priority::Medium,
                resolved("2024-08-14T08:00:00+00:00", "2024-08-14T09:00:00+00:00", None),
            ),
            report(
                5,
                "2024-08-13T07:00:00+00:00",
                Priority::Medium,
                ReportState::Rejected {
                    rejected_at: "2024-08-13T08:00:00+00:00".into(),
                },
            ),
        ];

        let stats = ward_stats("Rohini", 8, 3, &reports, today);
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_reports, 5);
        assert_eq!(stats.active_reports, 1);
        assert_eq!(stats.resolved_today, 1);
        assert_eq!(stats.positive_feedback, 1);
        assert_eq!(stats.negative_feedback, 1);
        assert_eq!(stats.resolved_with_feedback, 2);
        assert_eq!(stats.total_resolved, 3);
    }

    #[test]
    fn test_city_stats() {
        let wards = vec![ward(8, 65, 12), ward(12, 55, 8), ward(45, 58, 10)];
        let alerts = vec![
            Alert {
                id: "1".into(),
                severity: AlertSeverity::High,
                location: "x".into(),
                ward: None,
                ward_no: None,
                message: "m".into(),
                timestamp: "t".into(),
                is_read: false,
            },
            Alert {
                id: "2".into(),
                severity: AlertSeverity::Low,
                location: "y".into(),
                ward: None,
                ward_no: None,
                message: "m".into(),
                timestamp: "t".into(),
                is_read: true,
            },
        ];
        let reports = vec![
            report(1, "2024-08-15T09:00:00+00:00", Priority::Medium, ReportState::Pending),
            report(
                2,
                "2024-08-15T09:00:00+00:00",
                Priority::Medium,
                ReportState::InProgress {
                    assignment: assignment(),
                    worker_started_at: "2024-08-15T10:00:00+00:00".into(),
                    completion_proof_url: None,
                },
            ),
        ];

        let stats = city_stats(&wards, &alerts, &reports);
        assert_eq!(stats.total_wards, 3);
        assert_eq!(stats.total_hotspots, 30);
        assert_eq!(stats.high_risk_wards, 2);
        assert_eq!(stats.active_alerts, 1);
        assert_eq!(stats.pending_reports, 1);
        assert_eq!(stats.in_progress_reports, 1);
        assert_eq!(stats.resolved_reports, 0);
        // (65 + 55 + 58) / 3 = 59.33
        assert_eq!(stats.average_readiness, 59);
        assert_eq!(city_stats(&[], &[], &[]).average_readiness, 0);
    }

    #[test]
    fn test_worker_stats() {
        let reports = vec![
            report(
                1,
                "2024-08-10T07:00:00+00:00",
                Priority::High,
                ReportState::Assigned {
                    assignment: assignment(),
                },
            ),
            report(
                2,
                "2024-08-10T07:00:00+00:00",
                Priority::Medium,
                completed("2024-08-10T08:00:00+00:00", "2024-08-10T10:00:00+00:00"),
            ),
            report(
                3,
                "2024-08-11T07:00:00+00:00",
                Priority::Medium,
                resolved("2024-08-11T08:00:00+00:00", "2024-08-11T12:00:00+00:00", None),
            ),
        ];

        let stats = worker_stats(&reports);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.assigned, 1);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.average_resolution_hours, Some(3.0));
        assert_eq!(
            stats.completed_by_date,
            vec![
                DailyCount {
                    date: "2024-08-10".into(),
                    count: 1
                },
                DailyCount {
                    date: "2024-08-11".into(),
                    count: 1
                },
            ]
        );
        let medium = stats
            .by_priority
            .iter()
            .find(|p| p.priority == "Medium")
            .unwrap();
        assert_eq!(medium.count, 2);
    }

    #[test]
    fn test_worker_history_keeps_last_seven_days() {
        let reports: Vec<Report> = (1..=9)
            .map(|day| {
                let start = format!("2024-08-{:02}T08:00:00+00:00", day);
                let end = format!("2024-08-{:02}T09:00:00+00:00", day);
                report(day, &start, Priority::Medium, completed(&start, &end))
            })
            .collect();

        let stats = worker_stats(&reports);
        assert_eq!(stats.completed_by_date.len(), 7);
        assert_eq!(stats.completed_by_date[0].date, "2024-08-03");
        assert_eq!(stats.completed_by_date[6].date, "2024-08-09");
        assert_eq!(worker_stats(&[]).average_resolution_hours, None);
    }
}
