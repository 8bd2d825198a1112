//! Offline jobs over previously exported CSVs.

use std::path::Path;

use vbetl_core::{default_dimension_configs, load_dimension_configs};
use vbetl_report::{merge_webcast_video, unpivot, DecimalSeparator, MergeOptions, Table};

pub(crate) fn run_merge(
    videos: &Path,
    webcasts: &Path,
    out: &Path,
    decimal_comma: bool,
) -> anyhow::Result<()> {
    let video_table = Table::read_csv(videos)?;
    let webcast_table = Table::read_csv(webcasts)?;

    let options = MergeOptions {
        decimal: if decimal_comma {
            DecimalSeparator::Comma
        } else {
            DecimalSeparator::Dot
        },
    };
    let merged = merge_webcast_video(&video_table, &webcast_table, options)?;
    merged.write_csv(out)?;
    tracing::info!(rows = merged.len(), out = %out.display(), "merge complete");
    Ok(())
}

pub(crate) fn run_normalize(input: &Path, out: &Path, dimensions: Option<&Path>) -> anyhow::Result<()> {
    let config = match dimensions {
        Some(path) => load_dimension_configs(path)?,
        None => default_dimension_configs(),
    };
    let table = Table::read_csv(input)?;
    let normalized = unpivot(&table, &config)?;
    normalized.write_csv(out)?;
    tracing::info!(records = normalized.len(), out = %out.display(), "normalization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const VIDEOS: &str = "video_id,title,duration,lastViewed,whenPublished,commentCount,score,date,views,Desktop\n\
        v1,Intro,90,2024-02-01,2024-01-02,1,2.5,2024-01-01,3,3\n\
        v1,Intro,90,2024-02-01,2024-01-02,1,2.5,2024-01-02,4,3\n";

    const WEBCASTS: &str = "id,title,vodId,eventUrl,attendeeCount,attendeeTotal,startDate,endDate,total_viewingTime,category,subcategory,zone_EMEA,zone_Swiss\n\
        e1,Town hall,v1,https://x/e1,3,3,2024-01-01,2024-01-01,1800,News,News / Q1,2,1\n";

    #[test]
    fn merge_then_normalize_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let videos = dir.path().join("videos.csv");
        let webcasts = dir.path().join("webcasts.csv");
        let merged = dir.path().join("merged.csv");
        let normalized = dir.path().join("normalized.csv");
        fs::write(&videos, VIDEOS).unwrap();
        fs::write(&webcasts, WEBCASTS).unwrap();

        run_merge(&videos, &webcasts, &merged, false).unwrap();
        let merged_table = Table::read_csv(&merged).unwrap();
        assert_eq!(merged_table.len(), 1);
        assert_eq!(merged_table.cell(0, "v_views"), &vbetl_report::Cell::Int(7));

        run_normalize(&merged, &normalized, None).unwrap();
        let records = Table::read_csv(&normalized).unwrap();
        // zone EMEA, zone Swiss, video device Desktop.
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn normalize_with_bad_dimensions_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let yaml = dir.path().join("dims.yaml");
        fs::write(&input, WEBCASTS).unwrap();
        fs::write(&yaml, "metadata_columns: [id]\ndimensions: []\n").unwrap();

        let err = run_normalize(&input, &dir.path().join("out.csv"), Some(&yaml)).unwrap_err();
        assert!(err.to_string().contains("validation"), "{err}");
    }

    #[test]
    fn merge_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_merge(
            &dir.path().join("absent.csv"),
            &dir.path().join("absent2.csv"),
            &dir.path().join("out.csv"),
            false,
        );
        assert!(result.is_err());
    }
}
