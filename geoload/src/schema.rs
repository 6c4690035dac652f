//! Schema of the destination table.

use chrono::{DateTime, Months, Utc};
use std::fmt;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};

/// Type of a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int64,
    String,
    Geography,
}

impl FieldType {
    /// Returns the name of the type as used in DDL statements.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Int64 => "int64",
            FieldType::String => "string",
            FieldType::Geography => "geography",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, typed column of the destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
}

/// Fixed schema of the destination table together with its expiration.
///
/// The field list matches [`crate::types::CountyRecord`] one to one and never changes after the
/// table is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTableSchema {
    fields: Vec<FieldSchema>,
    expires_at: DateTime<Utc>,
}

impl DestinationTableSchema {
    /// Time to live of the destination table, measured from provisioning.
    pub const TIME_TO_LIVE: Months = Months::new(12);

    /// Builds the schema for a table provisioned at `now`.
    ///
    /// The expiration is one calendar year after `now`. A February 29th provisioning time expires
    /// on February 28th of the next year.
    pub fn provisioned_at(now: DateTime<Utc>) -> EtlResult<Self> {
        let Some(expires_at) = now.checked_add_months(Self::TIME_TO_LIVE) else {
            bail!(
                ErrorKind::InvalidData,
                "Table expiration is out of range",
                format!("provisioning time {now} plus one year overflows")
            );
        };

        Ok(Self {
            fields: vec![
                FieldSchema {
                    name: "id",
                    field_type: FieldType::Int64,
                },
                FieldSchema {
                    name: "county_fp",
                    field_type: FieldType::String,
                },
                FieldSchema {
                    name: "geom",
                    field_type: FieldType::Geography,
                },
            ],
            expires_at,
        })
    }

    /// Returns the fields of the table in column order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Returns when the destination table expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn schema_has_three_ordered_fields() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        let schema = DestinationTableSchema::provisioned_at(now).unwrap();

        let fields: Vec<_> = schema
            .fields()
            .iter()
            .map(|field| (field.name, field.field_type))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("id", FieldType::Int64),
                ("county_fp", FieldType::String),
                ("geom", FieldType::Geography),
            ]
        );
    }

    #[test]
    fn expiration_is_one_calendar_year_later() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        let schema = DestinationTableSchema::provisioned_at(now).unwrap();

        assert_eq!(
            schema.expires_at(),
            Utc.with_ymd_and_hms(2025, 3, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn leap_day_expires_on_last_day_of_february() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        let schema = DestinationTableSchema::provisioned_at(now).unwrap();

        assert_eq!(
            schema.expires_at(),
            Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn overflowing_expiration_is_rejected() {
        let err = DestinationTableSchema::provisioned_at(DateTime::<Utc>::MAX_UTC).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
