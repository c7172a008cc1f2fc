use super::ExportError;
use crate::periods::PeriodSummary;
use csv::Writer;
use std::io::Write;
use std::path::Path;

const PERIOD_HEADER: [&str; 13] = [
    "label",
    "kind",
    "start_date",
    "end_date",
    "start_weight",
    "end_weight",
    "weight_change",
    "anchor_weight",
    "total_net_calories",
    "avg_daily_deficit",
    "valid_days",
    "total_days",
    "exercise_count",
];

fn optional(value: Option<f64>) -> String {
    value.map_or(String::new(), |v| format!("{:.2}", v))
}

/// Write one row per period; missing values are left empty
pub fn write_periods_csv<W: Write>(
    periods: &[PeriodSummary],
    writer: &mut Writer<W>,
) -> Result<(), ExportError> {
    writer.write_record(PERIOD_HEADER)?;

    for period in periods {
        writer.write_record(&[
            period.label.clone(),
            format!("{:?}", period.kind).to_lowercase(),
            period.start_date.format("%Y-%m-%d").to_string(),
            period.end_date.format("%Y-%m-%d").to_string(),
            optional(period.start_weight),
            optional(period.end_weight),
            optional(period.weight_change),
            optional(period.anchor_weight),
            optional(period.total_net_calories),
            optional(period.avg_daily_deficit),
            period.valid_days.to_string(),
            period.total_days.to_string(),
            period.exercise_count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Export period summaries to a CSV file
pub fn export_periods_csv<P: AsRef<Path>>(
    periods: &[PeriodSummary],
    output_path: P,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(output_path)?;
    let mut writer = Writer::from_writer(file);
    write_periods_csv(periods, &mut writer)
}
