use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Coordinate fields shorter than this are treated as unparsable and the
/// record is dropped.
const MIN_COORD_LEN: usize = 3;

/// One panorama reference from a metadata batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub pano_id: String,
    pub pano_date: String,
    pub longitude: String,
    pub latitude: String,
}

impl SampleRecord {
    /// Parses a labeled record line:
    /// `panoID: <id> panoDate: <date> longitude: <lon> latitude: <lat>`.
    /// Returns `None` for lines missing any field.
    pub fn parse(line: &str) -> Option<SampleRecord> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let field = |label: &str| {
            tokens
                .iter()
                .position(|t| *t == label)
                .and_then(|i| tokens.get(i + 1))
                .copied()
        };
        Some(SampleRecord {
            pano_id: field("panoID:")?.to_string(),
            pano_date: field("panoDate:")?.to_string(),
            longitude: field("longitude:")?.to_string(),
            latitude: field("latitude:")?.to_string(),
        })
    }

    /// The record line format written by metadata collection and re-parsed
    /// by the pipeline.
    pub fn to_metadata_line(&self) -> String {
        format!(
            "panoID: {} panoDate: {} longitude: {} latitude: {}",
            self.pano_id, self.pano_date, self.longitude, self.latitude
        )
    }

    /// Capture month: the trailing two characters of the date field.
    pub fn month(&self) -> Option<&str> {
        let len = self.pano_date.len();
        if len < 2 {
            return None;
        }
        self.pano_date.get(len - 2..)
    }

    /// Both coordinate fields carry at least the minimum textual length.
    pub fn has_valid_coordinates(&self) -> bool {
        self.longitude.len() >= MIN_COORD_LEN && self.latitude.len() >= MIN_COORD_LEN
    }

    /// Capture month falls inside the configured season.
    pub fn is_in_season(&self, season_months: &HashSet<String>) -> bool {
        self.month()
            .map(|m| season_months.contains(m))
            .unwrap_or(false)
    }
}

/// Reads one batch file into the records that survive parsing, coordinate
/// validation, and the season filter. Malformed and out-of-season lines are
/// dropped, never errors.
pub fn read_batch(path: &Path, season_months: &HashSet<String>) -> Result<Vec<SampleRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {:?}", path))?;
    let mut records = Vec::new();
    for line in content.lines() {
        let record = match SampleRecord::parse(line) {
            Some(record) => record,
            None => continue,
        };
        if !record.has_valid_coordinates() {
            debug!(pano = record.pano_id.as_str(), "dropping record with malformed coordinates");
            continue;
        }
        if !record.is_in_season(season_months) {
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months(list: &[&str]) -> HashSet<String> {
        list.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_parse_record_line() {
        let line = "panoID: pq3KXdJgpl4BxLS1-XDiQg panoDate: 2014-07 longitude: -71.1167 latitude: 42.3733";
        let record = SampleRecord::parse(line).unwrap();
        assert_eq!(record.pano_id, "pq3KXdJgpl4BxLS1-XDiQg");
        assert_eq!(record.pano_date, "2014-07");
        assert_eq!(record.longitude, "-71.1167");
        assert_eq!(record.latitude, "42.3733");
        assert_eq!(record.month(), Some("07"));
    }

    #[test]
    fn test_parse_rejects_incomplete_lines() {
        assert!(SampleRecord::parse("panoID: abc panoDate: 2014-07").is_none());
        assert!(SampleRecord::parse("").is_none());
    }

    #[test]
    fn test_metadata_line_round_trips() {
        let record = SampleRecord {
            pano_id: "abc".into(),
            pano_date: "2014-07".into(),
            longitude: "-71.1".into(),
            latitude: "42.3".into(),
        };
        assert_eq!(
            SampleRecord::parse(&record.to_metadata_line()),
            Some(record)
        );
    }

    #[test]
    fn test_short_coordinates_are_invalid() {
        let record = SampleRecord {
            pano_id: "abc".into(),
            pano_date: "2014-07".into(),
            longitude: "-1".into(),
            latitude: "42.3".into(),
        };
        assert!(!record.has_valid_coordinates());
    }

    #[test]
    fn test_season_filter() {
        let record = SampleRecord {
            pano_id: "abc".into(),
            pano_date: "2014-07".into(),
            longitude: "-71.1".into(),
            latitude: "42.3".into(),
        };
        assert!(record.is_in_season(&months(&["05", "06", "07"])));
        assert!(!record.is_in_season(&months(&["01", "02"])));
    }

    #[test]
    fn test_read_batch_drops_invalid_and_out_of_season_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Pnt_start0_end4.txt");
        std::fs::write(
            &path,
            "panoID: in panoDate: 2014-07 longitude: -71.11 latitude: 42.37\n\
             panoID: winter panoDate: 2014-01 longitude: -71.12 latitude: 42.38\n\
             panoID: short panoDate: 2014-07 longitude: -1 latitude: 42.39\n\
             not a record line\n",
        )
        .unwrap();

        let records = read_batch(&path, &months(&["07"])).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pano_id, "in");
    }
}
