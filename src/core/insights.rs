use crate::models::{AnalyticsDay, AnalyticsReport, AnalyticsSummary, ChartPoint};
use chrono::{Duration, NaiveDate};

/// Days shown on the company dashboard
pub const DASHBOARD_WINDOW_DAYS: i64 = 30;

/// Days covered by the compact summary
pub const SUMMARY_WINDOW_DAYS: i64 = 7;

/// First date included in a window ending today
pub fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days)
}

/// WhatsApp clicks per profile view, as a percentage with two decimals
pub fn click_through_rate(views: i64, clicks: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    let rate = clicks as f64 / views as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Dashboard report; rows are returned in date order
pub fn build_report(mut days: Vec<AnalyticsDay>) -> AnalyticsReport {
    days.sort_by_key(|day| day.date);

    let total_views: i64 = days.iter().map(|d| d.profile_views).sum();
    let total_clicks: i64 = days.iter().map(|d| d.whatsapp_clicks).sum();

    let chart_data = days
        .iter()
        .map(|d| ChartPoint {
            date: d.date,
            views: d.profile_views,
            clicks: d.whatsapp_clicks,
        })
        .collect();

    AnalyticsReport {
        total_views,
        total_clicks,
        click_through_rate: click_through_rate(total_views, total_clicks),
        chart_data,
        analytics: days,
    }
}

/// Totals for a labelled period
pub fn summarize(days: &[AnalyticsDay], period: &str) -> AnalyticsSummary {
    let total_views: i64 = days.iter().map(|d| d.profile_views).sum();
    let total_clicks: i64 = days.iter().map(|d| d.whatsapp_clicks).sum();

    let mut dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
    dates.sort_unstable();
    dates.dedup();

    AnalyticsSummary {
        period: period.to_string(),
        total_views,
        total_clicks,
        days_with_data: dates.len() as i64,
        click_through_rate: click_through_rate(total_views, total_clicks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, views: i64, clicks: i64) -> AnalyticsDay {
        AnalyticsDay {
            company_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
            profile_views: views,
            whatsapp_clicks: clicks,
        }
    }

    #[test]
    fn test_click_through_rate() {
        assert_eq!(click_through_rate(0, 0), 0.0);
        assert_eq!(click_through_rate(0, 5), 0.0);
        assert_eq!(click_through_rate(200, 50), 25.0);
        assert_eq!(click_through_rate(3, 1), 33.33);
    }

    #[test]
    fn test_report_totals_and_order() {
        let report = build_report(vec![day(3, 10, 2), day(1, 4, 1), day(2, 6, 0)]);

        assert_eq!(report.total_views, 20);
        assert_eq!(report.total_clicks, 3);
        assert_eq!(report.click_through_rate, 15.0);

        let dates: Vec<u32> = report
            .chart_data
            .iter()
            .map(|p| chrono::Datelike::day(&p.date))
            .collect();
        assert_eq!(dates, vec![1, 2, 3]);
    }

    #[test]
    fn test_summary_counts_distinct_days() {
        let summary = summarize(&[day(1, 4, 1), day(2, 6, 3)], "last_7_days");
        assert_eq!(summary.period, "last_7_days");
        assert_eq!(summary.total_views, 10);
        assert_eq!(summary.total_clicks, 4);
        assert_eq!(summary.days_with_data, 2);
        assert_eq!(summary.click_through_rate, 40.0);

        let empty = summarize(&[], "last_7_days");
        assert_eq!(empty.days_with_data, 0);
        assert_eq!(empty.click_through_rate, 0.0);
    }

    #[test]
    fn test_window_start() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(
            window_start(today, SUMMARY_WINDOW_DAYS),
            NaiveDate::from_ymd_opt(2026, 3, 24).unwrap()
        );
    }
}
