use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use csv::Writer;
use portal_core::StateStats;

const CHANNELS: [&str; 4] = ["r", "g", "b", "a"];

/// Per-snapshot statistics of the flow-field state as CSV
pub struct MetricsWriter {
    csv_writer: Writer<File>,
}

impl MetricsWriter {
    /// Create `metrics.csv` in `output_dir` and write its header
    pub fn new(output_dir: &Path) -> Result<Self> {
        let file = File::create(output_dir.join("metrics.csv"))?;
        let mut csv_writer = Writer::from_writer(file);
        csv_writer.write_record(header())?;

        Ok(Self { csv_writer })
    }

    pub fn write_step(&mut self, frame: u32, time: f32, stats: &StateStats, frame_time: Duration) -> Result<()> {
        let wall_time_ms = frame_time.as_secs_f64() * 1000.0;
        let fps_proxy = if wall_time_ms > 0.0 { 1000.0 / wall_time_ms } else { 0.0 };

        let mut record = vec![frame.to_string(), time.to_string(), stats.count.to_string()];
        for stat in [&stats.mean, &stats.min, &stats.max] {
            record.extend(stat.iter().map(|v| v.to_string()));
        }
        record.push(format!("{:.3}", wall_time_ms));
        record.push(format!("{:.1}", fps_proxy));

        self.csv_writer.write_record(&record)?;
        self.csv_writer.flush()?;
        Ok(())
    }
}

fn header() -> Vec<String> {
    let mut columns = vec!["frame".to_string(), "time".to_string(), "count".to_string()];
    for stat in ["mean", "min", "max"] {
        columns.extend(CHANNELS.iter().map(|c| format!("{}_{}", stat, c)));
    }
    columns.push("wall_time_ms".to_string());
    columns.push("fps_proxy".to_string());
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_matches_record_width() {
        let dir = std::env::temp_dir().join(format!("portal-metrics-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut writer = MetricsWriter::new(&dir).unwrap();
        let stats = StateStats::from_texels(&[[0.5, 1.0, 0.0, 0.25]], 1);
        writer.write_step(10, 0.5, &stats, Duration::from_millis(4)).unwrap();
        drop(writer);

        let mut reader = csv::Reader::from_path(dir.join("metrics.csv")).unwrap();
        let columns = reader.headers().unwrap().len();
        assert_eq!(columns, header().len());

        let rows: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.len(), columns);
        assert_eq!(&row[0], "10");
        assert_eq!(&row[3], "0.5");

        std::fs::remove_dir_all(&dir).ok();
    }
}
