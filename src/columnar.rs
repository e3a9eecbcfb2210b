use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use parquet::data_type::{ByteArray, ByteArrayType, DoubleType, Int32Type, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::record::{Field, Row, RowAccessor};
use parquet::schema::parser::parse_message_type;

use crate::join::TrainingRow;
use crate::label::OutcomeLabel;
use crate::rolling::{FormWindow, TeamForm};

/// One column's values, in the physical type the schema declares for it.
enum Column {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    OptInt32(Vec<Option<i32>>),
    OptUtf8(Vec<Option<String>>),
    Double(Vec<f64>),
}

pub fn team_form_schema(window: usize) -> String {
    format!(
        "message team_events {{
            REQUIRED INT64 team_id;
            REQUIRED INT64 match_id;
            REQUIRED INT64 event_timestamp (TIMESTAMP_MILLIS);
            REQUIRED INT32 points;
            REQUIRED INT32 gf;
            REQUIRED INT32 ga;
            REQUIRED DOUBLE points_last_{window};
            REQUIRED DOUBLE gf_last_{window};
            REQUIRED DOUBLE ga_last_{window};
        }}"
    )
}

pub fn training_schema(window: usize) -> String {
    format!(
        "message match_training {{
            REQUIRED INT64 match_id;
            OPTIONAL INT32 season_start_year;
            REQUIRED INT64 event_timestamp (TIMESTAMP_MILLIS);
            REQUIRED INT64 home_team_id;
            REQUIRED INT64 away_team_id;
            OPTIONAL BYTE_ARRAY home_team (UTF8);
            OPTIONAL BYTE_ARRAY away_team (UTF8);
            REQUIRED INT32 home_goals;
            REQUIRED INT32 away_goals;
            REQUIRED INT32 label;
            REQUIRED DOUBLE home_points_last_{window};
            REQUIRED DOUBLE home_gf_last_{window};
            REQUIRED DOUBLE home_ga_last_{window};
            REQUIRED DOUBLE away_points_last_{window};
            REQUIRED DOUBLE away_gf_last_{window};
            REQUIRED DOUBLE away_ga_last_{window};
        }}"
    )
}

/// Writes the per-team event stream with each event's own (zero-filled)
/// result and the form it carried into the match.
pub fn write_team_form(path: &Path, rows: &[TeamForm], window: usize) -> Result<usize> {
    let columns = vec![
        Column::Int64(rows.iter().map(|r| i64::from(r.team_id())).collect()),
        Column::Int64(rows.iter().map(|r| r.match_id() as i64).collect()),
        Column::Int64(rows.iter().map(|r| r.event_timestamp().timestamp_millis()).collect()),
        Column::Int32(rows.iter().map(|r| r.event.contribution().points as i32).collect()),
        Column::Int32(rows.iter().map(|r| r.event.contribution().goals_for as i32).collect()),
        Column::Int32(
            rows.iter()
                .map(|r| r.event.contribution().goals_against as i32)
                .collect(),
        ),
        Column::Double(rows.iter().map(|r| r.window.points as f64).collect()),
        Column::Double(rows.iter().map(|r| r.window.goals_for as f64).collect()),
        Column::Double(rows.iter().map(|r| r.window.goals_against as f64).collect()),
    ];
    write_columns(path, &team_form_schema(window), columns)?;
    Ok(rows.len())
}

pub fn write_training_rows(path: &Path, rows: &[TrainingRow], window: usize) -> Result<usize> {
    let form_column = |pick: fn(&TrainingRow) -> i64| {
        Column::Double(rows.iter().map(|r| pick(r) as f64).collect())
    };
    let columns = vec![
        Column::Int64(rows.iter().map(|r| r.match_id as i64).collect()),
        Column::OptInt32(rows.iter().map(|r| r.season_start_year).collect()),
        Column::Int64(rows.iter().map(|r| r.event_timestamp.timestamp_millis()).collect()),
        Column::Int64(rows.iter().map(|r| i64::from(r.home_team_id)).collect()),
        Column::Int64(rows.iter().map(|r| i64::from(r.away_team_id)).collect()),
        Column::OptUtf8(rows.iter().map(|r| r.home_team.clone()).collect()),
        Column::OptUtf8(rows.iter().map(|r| r.away_team.clone()).collect()),
        Column::Int32(rows.iter().map(|r| r.home_goals).collect()),
        Column::Int32(rows.iter().map(|r| r.away_goals).collect()),
        Column::Int32(rows.iter().map(|r| i32::from(r.label.class())).collect()),
        form_column(|r| r.home_form.points),
        form_column(|r| r.home_form.goals_for),
        form_column(|r| r.home_form.goals_against),
        form_column(|r| r.away_form.points),
        form_column(|r| r.away_form.goals_for),
        form_column(|r| r.away_form.goals_against),
    ];
    write_columns(path, &training_schema(window), columns)?;
    Ok(rows.len())
}

/// Reads a table written by [`write_training_rows`].
pub fn read_training_rows(path: &Path) -> Result<Vec<TrainingRow>> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open parquet reader training rows")?;
    let iter = reader
        .get_row_iter(None)
        .context("iterate training rows")?;

    let mut out = Vec::new();
    for row in iter {
        let row = row.context("decode training row")?;
        let millis = row.get_timestamp_millis(2).context("event_timestamp")?;
        let event_timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| anyhow!("event_timestamp out of range: {millis}"))?;
        let label = row.get_int(9).context("label")?;
        let label = u8::try_from(label)
            .ok()
            .and_then(OutcomeLabel::from_class)
            .ok_or_else(|| anyhow!("invalid label class {label}"))?;

        out.push(TrainingRow {
            match_id: row.get_long(0).context("match_id")? as u64,
            season_start_year: optional(&row, 1, |r| {
                r.get_int(1).context("season_start_year")
            })?,
            event_timestamp,
            home_team_id: u32::try_from(row.get_long(3).context("home_team_id")?)
                .context("home_team_id range")?,
            away_team_id: u32::try_from(row.get_long(4).context("away_team_id")?)
                .context("away_team_id range")?,
            home_team: optional(&row, 5, |r| r.get_string(5).cloned().context("home_team"))?,
            away_team: optional(&row, 6, |r| r.get_string(6).cloned().context("away_team"))?,
            home_goals: row.get_int(7).context("home_goals")?,
            away_goals: row.get_int(8).context("away_goals")?,
            label,
            home_form: FormWindow {
                points: read_sum(&row, 10)?,
                goals_for: read_sum(&row, 11)?,
                goals_against: read_sum(&row, 12)?,
            },
            away_form: FormWindow {
                points: read_sum(&row, 13)?,
                goals_for: read_sum(&row, 14)?,
                goals_against: read_sum(&row, 15)?,
            },
        });
    }
    Ok(out)
}

/// `None` only for a real null; a value of the wrong type is an error.
fn optional<T>(row: &Row, idx: usize, get: impl FnOnce(&Row) -> Result<T>) -> Result<Option<T>> {
    let Some((name, field)) = row.get_column_iter().nth(idx) else {
        return Err(anyhow!("row has no column {idx}"));
    };
    if matches!(field, Field::Null) {
        return Ok(None);
    }
    get(row).with_context(|| format!("column {name}")).map(Some)
}

fn read_sum(row: &Row, idx: usize) -> Result<i64> {
    let v = row
        .get_double(idx)
        .with_context(|| format!("form column {idx}"))?;
    Ok(v.round() as i64)
}

fn write_columns(path: &Path, message: &str, columns: Vec<Column>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = path.with_extension("parquet.tmp");
    if let Err(err) = write_file(&tmp, message, columns) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

fn write_file(tmp: &Path, message: &str, columns: Vec<Column>) -> Result<()> {
    let schema = Arc::new(parse_message_type(message).context("parse parquet schema")?);
    let props = Arc::new(WriterProperties::builder().build());

    let file = fs::File::create(tmp).with_context(|| format!("create {}", tmp.display()))?;
    let mut writer =
        SerializedFileWriter::new(file, schema, props).context("open parquet writer")?;

    let mut row_group = writer.next_row_group().context("open row group")?;
    let mut columns = columns.into_iter();
    while let Some(mut col) = row_group.next_column().context("next column")? {
        let Some(values) = columns.next() else {
            return Err(anyhow!("schema has more columns than data"));
        };
        match values {
            Column::Int32(v) => {
                col.typed::<Int32Type>().write_batch(&v, None, None)?;
            }
            Column::Int64(v) => {
                col.typed::<Int64Type>().write_batch(&v, None, None)?;
            }
            Column::Double(v) => {
                col.typed::<DoubleType>().write_batch(&v, None, None)?;
            }
            Column::OptInt32(v) => {
                let def_levels = v.iter().map(|x| i16::from(x.is_some())).collect::<Vec<_>>();
                let present = v.into_iter().flatten().collect::<Vec<_>>();
                col.typed::<Int32Type>()
                    .write_batch(&present, Some(def_levels.as_slice()), None)?;
            }
            Column::OptUtf8(v) => {
                let def_levels = v.iter().map(|x| i16::from(x.is_some())).collect::<Vec<_>>();
                let present = v
                    .into_iter()
                    .flatten()
                    .map(|s| ByteArray::from(s.as_str()))
                    .collect::<Vec<_>>();
                col.typed::<ByteArrayType>()
                    .write_batch(&present, Some(def_levels.as_slice()), None)?;
            }
        }
        col.close().context("close column")?;
    }
    if columns.next().is_some() {
        return Err(anyhow!("data has more columns than schema"));
    }
    row_group.close().context("close row group")?;
    writer.close().context("close parquet writer")?;
    Ok(())
}
