//! Insert id derivation for best-effort deduplication of appended rows.

use aws_lc_rs::digest;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::types::CountyRecord;

/// Derives an insert id from the content of a record.
///
/// Fields are length-prefixed before hashing so that distinct records never share an input. The
/// SHA-256 digest is encoded as unpadded URL-safe base64, 43 characters long.
pub fn content_hash_insert_id(record: &CountyRecord) -> String {
    let mut context = digest::Context::new(&digest::SHA256);

    context.update(&record.id.to_be_bytes());
    for field in [record.county_fp.as_bytes(), record.geom.as_bytes()] {
        context.update(&(field.len() as u64).to_be_bytes());
        context.update(field);
    }

    URL_SAFE_NO_PAD.encode(context.finish().as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_records_share_an_id() {
        let a = CountyRecord::new(7, "013", "POLYGON((0 0,1 0,1 1,0 0))");
        let b = a.clone();

        assert_eq!(content_hash_insert_id(&a), content_hash_insert_id(&b));
    }

    #[test]
    fn shifted_field_boundaries_produce_different_ids() {
        let a = CountyRecord::new(1, "01", "3POINT(0 0)");
        let b = CountyRecord::new(1, "013", "POINT(0 0)");

        assert_ne!(content_hash_insert_id(&a), content_hash_insert_id(&b));
    }

    #[test]
    fn id_fits_bigquery_insert_id_limit() {
        let id = content_hash_insert_id(&CountyRecord::new(1, "001", "POINT(0 0)"));

        assert_eq!(id.len(), 43);
        assert!(
            id.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
