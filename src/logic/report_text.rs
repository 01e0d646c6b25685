use super::calculations::round_to;
use crate::models::Report;
use std::fmt::Write;

const RULE_WIDTH: usize = 50;

/// Plain-text rendering of a report for terminals and logs
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &Report) -> std::fmt::Result {
    writeln!(out, "BLOOMWATCH ANALYSIS REPORT")?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "Location: {}", report.place_name)?;
    writeln!(
        out,
        "Region: {} (±{}°)",
        report.context.roi.center,
        report.context.roi.size_degrees / 2.0
    )?;
    let (min_lon, min_lat, max_lon, max_lat) = report.context.roi.bounding_box();
    writeln!(
        out,
        "Bounds: lat {:.2} to {:.2}, lon {:.2} to {:.2}",
        min_lat, max_lat, min_lon, max_lon
    )?;
    writeln!(out, "Status: {}", report.status)?;

    writeln!(out)?;
    writeln!(out, "ANALYSIS SUMMARY")?;
    writeln!(out, "Period: {}", report.context.date_range)?;
    writeln!(out, "Data Points: {}", report.data_points)?;

    if let Some(current) = &report.current {
        writeln!(out)?;
        writeln!(out, "CURRENT VEGETATION STATUS")?;
        writeln!(out, "Type: {}", current.band.label)?;
        writeln!(out, "Description: {}", current.band.description)?;
        writeln!(out, "Health: {}", current.band.health)?;
        writeln!(out, "Current NDVI: {} ({})", round_to(current.ndvi, 3), current.date)?;
    }

    // A server-side verdict overrides the locally computed one
    let remote = report
        .analysis
        .as_ref()
        .and_then(|a| a.health_status.as_deref().map(|s| (s, a.health_description.as_deref())));
    match (remote, &report.overall_health) {
        (Some((status, details)), _) => {
            writeln!(out, "Overall Health: {}", status)?;
            if let Some(details) = details {
                writeln!(out, "Details: {}", details)?;
            }
        }
        (None, Some(local)) => {
            writeln!(out, "Overall Health: {}", local.status)?;
            writeln!(out, "Details: {}", local.description)?;
        }
        (None, None) => {}
    }

    if let Some(trend) = &report.trend {
        writeln!(out)?;
        writeln!(out, "TREND ANALYSIS")?;
        writeln!(out, "Average NDVI: {}", round_to(trend.mean_ndvi, 3))?;
        writeln!(out, "Highest NDVI: {}", round_to(trend.max_ndvi, 3))?;
        writeln!(out, "Lowest NDVI: {}", round_to(trend.min_ndvi, 3))?;
        writeln!(
            out,
            "Trend: {} ({:+.4} over last {} points)",
            trend.direction, trend.delta_over_window, trend.window_len
        )?;
    }

    if !report.recommendations.is_empty() {
        writeln!(out)?;
        writeln!(out, "RECOMMENDATIONS")?;
        for rec in &report.recommendations {
            writeln!(out, "  {} [{}] {}", rec.severity.symbol(), rec.category, rec.message)?;
        }
    }

    if let Some(forecast) = &report.forecast {
        writeln!(out)?;
        writeln!(out, "FORECAST")?;
        writeln!(out, "Period: {} to {}", forecast.start, forecast.end)?;
        writeln!(
            out,
            "Predicted NDVI: {}",
            round_to(forecast.predicted_mean_ndvi, 3)
        )?;
        writeln!(out, "Forecast Trend: {}", forecast.direction)?;
        writeln!(out, "Interpretation: {}", forecast.interpretation.label)?;
    }

    if !report.blooms.is_empty() {
        writeln!(out)?;
        writeln!(out, "DETECTED BLOOM EVENTS")?;
        writeln!(out, "Total Peaks: {}", report.total_blooms)?;
        for (i, bloom) in report.blooms.iter().enumerate() {
            writeln!(
                out,
                "  Peak {}: {} (NDVI: {})",
                i + 1,
                bloom.date,
                round_to(bloom.ndvi, 3)
            )?;
        }
    }

    if let Some(url) = &report.thumbnail_url {
        writeln!(out)?;
        writeln!(out, "Thumbnail: {}", url)?;
    }

    if !report.notes.is_empty() {
        writeln!(out)?;
        writeln!(out, "NOTES")?;
        for note in &report.notes {
            writeln!(out, "  - {}", note)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::vegetation::VegetationClassifier;
    use crate::models::{
        BloomEvent, Coordinate, CurrentStatus, DateRange, RegionOfInterest, ReportContext,
        SectionFlags,
    };
    use chrono::NaiveDate;

    fn context() -> ReportContext {
        ReportContext {
            roi: RegionOfInterest::new(Coordinate::new(48.85, 2.35).unwrap(), 5.0).unwrap(),
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            )
            .unwrap(),
            threshold: 0.2,
        }
    }

    #[test]
    fn unavailable_report_shows_reason() {
        let report = Report::unavailable(
            context(),
            "Paris, France".into(),
            SectionFlags::default(),
            "No NDVI data available for this region and date range",
        );
        let text = format_report(&report);

        assert!(text.starts_with("BLOOMWATCH ANALYSIS REPORT\n"));
        assert!(text.contains("Location: Paris, France"));
        assert!(text.contains("Status: No Data"));
        assert!(text.contains("  - No NDVI data available"));
        assert!(!text.contains("CURRENT VEGETATION STATUS"));
    }

    #[test]
    fn blooms_and_status_are_rendered() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut report = Report::unavailable(
            context(),
            "Paris, France".into(),
            SectionFlags::default(),
            "unused",
        );
        report.status = crate::models::ReportStatus::Complete;
        report.notes.clear();
        report.current = Some(CurrentStatus {
            date,
            ndvi: 0.6543,
            band: VegetationClassifier::classify(0.6543),
        });
        report.blooms = vec![BloomEvent {
            index: 4,
            date,
            ndvi: 0.71234,
        }];
        report.total_blooms = 3;

        let text = format_report(&report);
        assert!(text.contains("Type: Dense Vegetation"));
        assert!(text.contains("Current NDVI: 0.654 (2024-05-10)"));
        assert!(text.contains("Total Peaks: 3"));
        assert!(text.contains("  Peak 1: 2024-05-10 (NDVI: 0.712)"));
        assert!(!text.contains("NOTES"));
    }

    #[test]
    fn remote_health_overrides_local_verdict() {
        let mut report = Report::unavailable(
            context(),
            "Paris, France".into(),
            SectionFlags::default(),
            "unused",
        );
        report.overall_health = Some(VegetationClassifier::overall_health(0.45, -0.02));

        let text = format_report(&report);
        assert!(text.contains("Overall Health: Stressed\nDetails: Vegetation under stress"));
        assert!(text.contains("Bounds: lat 46.35 to 51.35, lon -0.15 to 4.85"));

        report.analysis = Some(crate::models::RemoteAnalysis {
            health_status: Some("Good".into()),
            health_description: None,
            formatted_output: None,
        });
        let text = format_report(&report);
        assert!(text.contains("Overall Health: Good"));
        assert!(!text.contains("Stressed"));
    }
}
