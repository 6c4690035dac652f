use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;
use geoload::error::EtlResult;
use geoload::types::{AppendRow, CountyRecord};
use serde::Serialize;

use crate::bigquery::client::bq_error_to_etl_error;

/// JSON shape of one streamed row, keyed by destination column name.
#[derive(Debug, Serialize)]
struct BigQueryRow<'a> {
    id: i64,
    county_fp: &'a str,
    geom: &'a str,
}

impl<'a> From<&'a CountyRecord> for BigQueryRow<'a> {
    fn from(record: &'a CountyRecord) -> Self {
        Self {
            id: record.id,
            county_fp: &record.county_fp,
            geom: &record.geom,
        }
    }
}

/// Builds the `insertAll` request body for `rows`, preserving their order.
pub(crate) fn build_insert_all_request(rows: &[AppendRow]) -> EtlResult<TableDataInsertAllRequest> {
    let mut request = TableDataInsertAllRequest::new();
    for row in rows {
        request
            .add_row(row.insert_id.clone(), BigQueryRow::from(&row.record))
            .map_err(bq_error_to_etl_error)?;
    }

    Ok(request)
}
