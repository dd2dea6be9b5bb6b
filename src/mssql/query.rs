use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tiberius::{Column, ColumnData, Query, Row};

use crate::events::ColumnMeta;
use crate::types::RowValues;

/// Bind values to the `@P1..@Pn` placeholders of `query`, in order.
pub fn bind_query_params<'a>(query: &'a str, params: &[RowValues]) -> Query<'a> {
    let mut query_builder = Query::new(query);

    for param in params {
        match param {
            RowValues::Int(i) => query_builder.bind(*i),
            RowValues::Float(f) => query_builder.bind(*f),
            RowValues::Text(s) => query_builder.bind(s.clone()),
            RowValues::Bool(b) => query_builder.bind(*b),
            RowValues::Timestamp(dt) => query_builder.bind(*dt),
            RowValues::Null => query_builder.bind(Option::<String>::None),
            RowValues::JSON(jsval) => query_builder.bind(jsval.to_string()),
            RowValues::Blob(bytes) => query_builder.bind(bytes.clone()),
        }
    }

    query_builder
}

pub fn column_meta(columns: &[Column]) -> Vec<ColumnMeta> {
    columns
        .iter()
        .map(|col| ColumnMeta::new(col.name(), format!("{:?}", col.column_type())))
        .collect()
}

/// Convert every cell of `row`, in column order.
pub fn convert_row(row: &Row) -> Vec<RowValues> {
    row.cells()
        .enumerate()
        .map(|(idx, (_col, data))| extract_value(row, idx, data))
        .collect()
}

/// Date and time cells go through chrono via `try_get`; everything else is read
/// straight from the column data.
fn extract_value(row: &Row, idx: usize, data: &ColumnData<'_>) -> RowValues {
    match data {
        ColumnData::U8(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I16(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I32(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I64(Some(v)) => RowValues::Int(*v),
        ColumnData::F32(Some(v)) => RowValues::Float(f64::from(*v)),
        ColumnData::F64(Some(v)) => RowValues::Float(*v),
        ColumnData::Bit(Some(b)) => RowValues::Bool(*b),
        ColumnData::Numeric(Some(n)) => {
            #[allow(clippy::cast_precision_loss)]
            let value = n.value() as f64 / 10f64.powi(i32::from(n.scale()));
            RowValues::Float(value)
        }
        ColumnData::String(Some(s)) => RowValues::Text(s.to_string()),
        ColumnData::Guid(Some(g)) => RowValues::Text(g.to_string()),
        ColumnData::Binary(Some(b)) => RowValues::Blob(b.to_vec()),
        ColumnData::Xml(Some(xml)) => RowValues::Text(xml.clone().into_owned().into_string()),
        ColumnData::DateTime(Some(_))
        | ColumnData::SmallDateTime(Some(_))
        | ColumnData::DateTime2(Some(_)) => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .flatten()
            .map_or(RowValues::Null, RowValues::Timestamp),
        ColumnData::DateTimeOffset(Some(_)) => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)
            .ok()
            .flatten()
            .map_or(RowValues::Null, |dt| RowValues::Timestamp(dt.naive_utc())),
        ColumnData::Date(Some(_)) => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .flatten()
            .map_or(RowValues::Null, |d| RowValues::Timestamp(d.and_time(NaiveTime::MIN))),
        ColumnData::Time(Some(_)) => row
            .try_get::<NaiveTime, _>(idx)
            .ok()
            .flatten()
            .map_or(RowValues::Null, |t| {
                RowValues::Text(t.format("%H:%M:%S%.f").to_string())
            }),
        _ => RowValues::Null,
    }
}
