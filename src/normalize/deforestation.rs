/// Deforestation event-log normalizer
///
/// Turns the raw event log into a strictly monthly series of affected-area
/// totals: one point per calendar month, no gaps, covering the months of
/// the analysis window that lie within the min/max month of the filtered
/// input. Gap months carry linearly interpolated totals; dropped records
/// are counted, never defaulted.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};

use crate::logging::{self, DataSource};
use crate::model::{
    in_analysis_window, MonthlyDeforestationPoint, RawDeforestationRecord, YearMonth,
    DEFORESTATION_TIMESTAMP_FORMAT, PRIMARY_EVENT_TYPE,
};
use crate::normalize::{coerce_numeric, round2, LoadError};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load raw event records from the CSV export. Only the columns used
/// downstream are carried; geometry and bookkeeping columns are skipped.
/// Rows the reader cannot decode are skipped with a counted diagnostic.
pub fn load_records(path: &Path) -> Result<Vec<RawDeforestationRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoadError::Csv(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| LoadError::Csv(e.to_string()))?
        .clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let date_col =
        position("date").ok_or_else(|| LoadError::MissingColumn("date".to_string()))?;
    let tag_col =
        position("data_type").ok_or_else(|| LoadError::MissingColumn("data_type".to_string()))?;
    let area_col =
        position("ha_eck_iv").ok_or_else(|| LoadError::MissingColumn("ha_eck_iv".to_string()))?;
    let id_col = position("objectid");

    let mut records = Vec::new();
    let mut unreadable = 0usize;
    for row in reader.records() {
        let row = match row {
            Ok(r) => r,
            Err(_) => {
                unreadable += 1;
                continue;
            }
        };
        records.push(RawDeforestationRecord {
            object_id: id_col
                .and_then(|i| row.get(i))
                .and_then(|s| s.trim().parse().ok()),
            date: row.get(date_col).unwrap_or("").to_string(),
            data_type: row.get(tag_col).unwrap_or("").to_string(),
            area_ha: row.get(area_col).and_then(coerce_numeric),
        });
    }

    if unreadable > 0 {
        logging::warn(
            DataSource::ArcGis,
            None,
            &format!("{} unreadable rows skipped in {}", unreadable, path.display()),
        );
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Per-reason counts of records dropped during cleaning. Parse failures
/// are recovered locally, so these counts are their only trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub input: usize,
    pub wrong_tag: usize,
    pub bad_timestamp: usize,
    pub missing_area: usize,
}

impl DropCounts {
    pub fn kept(&self) -> usize {
        self.input - self.wrong_tag - self.bad_timestamp - self.missing_area
    }
}

/// Record-level drop trace. Aggregate counts go through
/// `log_discard_summary`; the per-record reason only shows at debug level.
fn debug_drop(record: &RawDeforestationRecord, reason: &str) {
    let id = record.object_id.map(|id| id.to_string());
    logging::debug(DataSource::ArcGis, id.as_deref(), reason);
}

/// Build the monthly affected-area series from raw records.
///
/// Steps, in order: keep only primary-tag records; parse the offset
/// timestamp and keep the naive wall time (offset deliberately stripped,
/// not converted); sort ascending; sum per calendar month; restrict to
/// the analysis window; reindex to a gap-free month range; interpolate
/// gap months; round to 2 decimals. Empty input after filtering yields an
/// empty series, not an error.
pub fn monthly_totals(
    records: &[RawDeforestationRecord],
) -> (Vec<MonthlyDeforestationPoint>, DropCounts) {
    let mut drops = DropCounts {
        input: records.len(),
        ..DropCounts::default()
    };

    let mut dated: Vec<(NaiveDateTime, f64)> = Vec::new();
    for record in records {
        if !record
            .data_type
            .trim()
            .eq_ignore_ascii_case(PRIMARY_EVENT_TYPE)
        {
            drops.wrong_tag += 1;
            continue;
        }
        let timestamp =
            match DateTime::parse_from_str(record.date.trim(), DEFORESTATION_TIMESTAMP_FORMAT) {
                // naive_local keeps the wall time as recorded upstream
                Ok(dt) => dt.naive_local(),
                Err(_) => {
                    drops.bad_timestamp += 1;
                    debug_drop(
                        record,
                        &format!("dropped: unparsable timestamp {:?}", record.date.trim()),
                    );
                    continue;
                }
            };
        let area = match record.area_ha {
            Some(a) => a,
            None => {
                drops.missing_area += 1;
                debug_drop(record, "dropped: area missing or not numeric");
                continue;
            }
        };
        dated.push((timestamp, area));
    }

    // Ascending order makes the per-month sums deterministic.
    dated.sort_by_key(|(timestamp, _)| *timestamp);

    let mut totals: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for (timestamp, area) in &dated {
        let month = YearMonth::from_date(timestamp.date());
        *totals.entry(month).or_insert(0.0) += area;
    }

    totals.retain(|month, _| in_analysis_window(*month));

    let known: Vec<(YearMonth, f64)> = totals.into_iter().collect();
    let filled = fill_monthly_gaps(&known);

    let points = filled
        .into_iter()
        .map(|(month, total)| MonthlyDeforestationPoint {
            month,
            area_ha: round2(total),
        })
        .collect();

    (points, drops)
}

/// Expand a sorted list of known monthly totals into a gap-free sequence
/// over [first, last], computing each gap month by linear interpolation
/// between its two bracketing known points on the month-ordinal axis.
/// Known months pass through unchanged; nothing is extrapolated beyond
/// the ends.
fn fill_monthly_gaps(known: &[(YearMonth, f64)]) -> Vec<(YearMonth, f64)> {
    let mut out = Vec::new();
    if known.is_empty() {
        return out;
    }

    for pair in known.windows(2) {
        let (left_month, left_value) = pair[0];
        let (right_month, right_value) = pair[1];
        out.push((left_month, left_value));

        let span = right_month.index() - left_month.index();
        if span > 1 {
            let mut month = left_month.succ();
            while month < right_month {
                let t = (month.index() - left_month.index()) as f64 / span as f64;
                out.push((month, left_value + t * (right_value - left_value)));
                month = month.succ();
            }
        }
    }

    // windows(2) pushes only left endpoints; close with the final known point
    if let Some(&last) = known.last() {
        out.push(last);
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn record(date: &str, tag: &str, area: Option<f64>) -> RawDeforestationRecord {
        RawDeforestationRecord {
            object_id: Some(1),
            date: date.to_string(),
            data_type: tag.to_string(),
            area_ha: area,
        }
    }

    #[test]
    fn test_non_primary_tags_are_excluded_entirely() {
        let records = vec![
            record("2015/06/10 00:00:00+00", "deforestation", Some(5.0)),
            record("2015/06/11 00:00:00+00", "degradation", Some(100.0)),
        ];
        let (points, drops) = monthly_totals(&records);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].area_ha, 5.0, "degradation area must not be merged");
        assert_eq!(drops.wrong_tag, 1);
    }

    #[test]
    fn test_tag_match_tolerates_case_and_padding() {
        let records = vec![record("2015/06/10 00:00:00+00", " Deforestation ", Some(2.0))];
        let (points, _) = monthly_totals(&records);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_unparsable_timestamps_drop_the_record() {
        let records = vec![
            record("2015/06/10 00:00:00+00", "deforestation", Some(5.0)),
            record("not a date", "deforestation", Some(7.0)),
            record("2015-06-10 00:00:00", "deforestation", Some(7.0)), // wrong separator
        ];
        let (points, drops) = monthly_totals(&records);
        assert_eq!(drops.bad_timestamp, 2);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].area_ha, 5.0);
    }

    #[test]
    fn test_offset_is_stripped_not_converted() {
        // 23:00 at -02:00 is 01:00 next day in UTC; stripping must keep
        // the wall time, so this event stays in May.
        let records = vec![record("2013/05/31 23:00:00-02", "deforestation", Some(3.0))];
        let (points, _) = monthly_totals(&records);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].month, YearMonth::new(2013, 5));
    }

    #[test]
    fn test_hour_only_offsets_parse() {
        let records = vec![
            record("2016/03/14 00:00:00+00", "deforestation", Some(1.0)),
            record("2016/03/15 12:30:00+0000", "deforestation", Some(1.0)),
            record("2016/03/16 12:30:00+00:00", "deforestation", Some(1.0)),
        ];
        let (_, drops) = monthly_totals(&records);
        assert_eq!(drops.bad_timestamp, 0, "all three offset spellings are valid");
    }

    #[test]
    fn test_missing_area_drops_the_record_never_zero_fills() {
        let records = vec![
            record("2015/06/10 00:00:00+00", "deforestation", None),
            record("2015/07/10 00:00:00+00", "deforestation", Some(4.0)),
        ];
        let (points, drops) = monthly_totals(&records);
        assert_eq!(drops.missing_area, 1);
        // June contributed nothing, so the series starts at July.
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].month, YearMonth::new(2015, 7));
    }

    #[test]
    fn test_records_in_one_month_are_summed() {
        let records = vec![
            record("2015/06/01 00:00:00+00", "deforestation", Some(1.5)),
            record("2015/06/20 00:00:00+00", "deforestation", Some(2.25)),
            record("2015/06/30 00:00:00+00", "deforestation", Some(0.25)),
        ];
        let (points, _) = monthly_totals(&records);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].area_ha, 4.0);
    }

    #[test]
    fn test_months_outside_the_window_are_removed() {
        let records = vec![
            record("2013/04/30 00:00:00+00", "deforestation", Some(9.0)), // before window
            record("2013/05/01 00:00:00+00", "deforestation", Some(1.0)),
            record("2019/01/02 00:00:00+00", "deforestation", Some(9.0)), // after window
        ];
        let (points, _) = monthly_totals(&records);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].month, YearMonth::new(2013, 5));
    }

    #[test]
    fn test_gaps_are_interpolated_linearly() {
        let records = vec![
            record("2015/05/10 00:00:00+00", "deforestation", Some(10.0)),
            record("2015/08/10 00:00:00+00", "deforestation", Some(40.0)),
        ];
        let (points, _) = monthly_totals(&records);
        let months: Vec<YearMonth> = points.iter().map(|p| p.month).collect();
        assert_eq!(
            months,
            vec![
                YearMonth::new(2015, 5),
                YearMonth::new(2015, 6),
                YearMonth::new(2015, 7),
                YearMonth::new(2015, 8),
            ]
        );
        assert_eq!(points[0].area_ha, 10.0);
        assert_eq!(points[1].area_ha, 20.0);
        assert_eq!(points[2].area_ha, 30.0);
        assert_eq!(points[3].area_ha, 40.0);
    }

    #[test]
    fn test_interpolation_spans_year_boundaries() {
        let records = vec![
            record("2014/11/10 00:00:00+00", "deforestation", Some(0.0)),
            record("2015/02/10 00:00:00+00", "deforestation", Some(30.0)),
        ];
        let (points, _) = monthly_totals(&records);
        assert_eq!(points.len(), 4);
        assert_eq!(points[1].month, YearMonth::new(2014, 12));
        assert_eq!(points[1].area_ha, 10.0);
        assert_eq!(points[2].month, YearMonth::new(2015, 1));
        assert_eq!(points[2].area_ha, 20.0);
    }

    #[test]
    fn test_output_is_gap_free_and_interpolations_stay_bracketed() {
        let records = vec![
            record("2016/01/05 00:00:00+00", "deforestation", Some(12.0)),
            record("2016/04/05 00:00:00+00", "deforestation", Some(3.0)),
            record("2016/09/05 00:00:00+00", "deforestation", Some(60.0)),
        ];
        let (points, _) = monthly_totals(&records);

        for pair in points.windows(2) {
            assert_eq!(
                pair[0].month.succ(),
                pair[1].month,
                "consecutive output months must be adjacent"
            );
        }
        // Interpolated values lie between their bracketing known values.
        for p in &points[1..4] {
            assert!(p.area_ha <= 12.0 && p.area_ha >= 3.0);
        }
        for p in &points[4..8] {
            assert!(p.area_ha >= 3.0 && p.area_ha <= 60.0);
        }
    }

    #[test]
    fn test_observed_months_are_unchanged_by_interpolation() {
        let records = vec![
            record("2016/01/05 00:00:00+00", "deforestation", Some(12.5)),
            record("2016/03/05 00:00:00+00", "deforestation", Some(7.25)),
        ];
        let (points, _) = monthly_totals(&records);
        assert_eq!(points[0].area_ha, 12.5);
        assert_eq!(points[2].area_ha, 7.25);
    }

    #[test]
    fn test_totals_are_rounded_to_two_decimals() {
        let records = vec![
            record("2016/01/05 00:00:00+00", "deforestation", Some(1.111)),
            record("2016/01/06 00:00:00+00", "deforestation", Some(2.222)),
        ];
        let (points, _) = monthly_totals(&records);
        assert_eq!(points[0].area_ha, 3.33);
    }

    #[test]
    fn test_empty_and_fully_filtered_inputs_yield_empty_series() {
        let (points, _) = monthly_totals(&[]);
        assert!(points.is_empty());

        let records = vec![record("2015/06/10 00:00:00+00", "degradation", Some(5.0))];
        let (points, drops) = monthly_totals(&records);
        assert!(points.is_empty(), "fully filtered input is not an error");
        assert_eq!(drops.kept(), 0);
    }

    #[test]
    fn test_single_known_month_passes_through() {
        let records = vec![record("2017/03/10 00:00:00+00", "deforestation", Some(8.0))];
        let (points, _) = monthly_totals(&records);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].month, YearMonth::new(2017, 3));
        assert_eq!(points[0].area_ha, 8.0);
    }

    #[test]
    fn test_load_records_reads_the_upstream_column_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deforestation.csv");
        fs::write(
            &path,
            "objectid,date,data_type,orig_oid,orig_fname,gfwid,globalid,ha_eck_iv,date_alias,shape_Length,shape_Area\n\
             1,2015/06/10 00:00:00+00,deforestation,11,f.tif,g1,{A},12.5,June,0.1,0.2\n\
             2,2015/06/11 00:00:00+00,degradation,12,f.tif,g2,{B},3.5,June,0.1,0.2\n\
             3,2015/06/12 00:00:00+00,deforestation,13,f.tif,g3,{C},abc,June,0.1,0.2\n",
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].object_id, Some(1));
        assert_eq!(records[0].area_ha, Some(12.5));
        assert_eq!(records[1].data_type, "degradation");
        assert_eq!(records[2].area_ha, None, "non-numeric area is coerced to missing");
    }

    #[test]
    fn test_load_records_requires_the_area_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deforestation.csv");
        fs::write(&path, "objectid,date,data_type\n1,2015/06/10 00:00:00+00,deforestation\n")
            .unwrap();

        match load_records(&path) {
            Err(LoadError::MissingColumn(name)) => assert_eq!(name, "ha_eck_iv"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }
}
