/// One row of the source county table.
///
/// Records are immutable once read. `geom` holds the geometry as text, either WKT or GeoJSON
/// depending on how the source was configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyRecord {
    pub id: i64,
    pub county_fp: String,
    pub geom: String,
}

impl CountyRecord {
    /// Creates a new [`CountyRecord`].
    pub fn new(id: i64, county_fp: impl Into<String>, geom: impl Into<String>) -> Self {
        Self {
            id,
            county_fp: county_fp.into(),
            geom: geom.into(),
        }
    }
}

/// A record as handed to a destination append call.
///
/// When `insert_id` is [`None`] the destination does not deduplicate the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRow {
    pub insert_id: Option<String>,
    pub record: CountyRecord,
}

impl AppendRow {
    /// Creates an [`AppendRow`] without an insert id.
    pub fn new(record: CountyRecord) -> Self {
        Self {
            insert_id: None,
            record,
        }
    }

    /// Creates an [`AppendRow`] carrying the given insert id.
    pub fn with_insert_id(record: CountyRecord, insert_id: String) -> Self {
        Self {
            insert_id: Some(insert_id),
            record,
        }
    }
}
