use crate::types::CountyRecord;

/// Builds a county record whose fields are derived from `id`.
pub fn county_record(id: i64) -> CountyRecord {
    CountyRecord::new(
        id,
        format!("{:03}", id * 2 - 1),
        format!("POLYGON(({id} 0,{id} 1,{} 1,{id} 0))", id + 1),
    )
}

/// Builds `count` county records with ids starting at 1.
pub fn county_records(count: usize) -> Vec<CountyRecord> {
    (1..=count as i64).map(county_record).collect()
}

/// Returns the ids of `records` in order.
pub fn ids<'a>(records: impl IntoIterator<Item = &'a CountyRecord>) -> Vec<i64> {
    records.into_iter().map(|record| record.id).collect()
}
