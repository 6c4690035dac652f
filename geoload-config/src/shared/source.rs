use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Text representation used when reading geometries from the source table.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeometryFormat {
    /// Well-known text, produced with `ST_AsText`.
    #[default]
    Wkt,
    /// GeoJSON, produced with `ST_AsGeoJSON`.
    GeoJson,
}

/// Location and column names of the source table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceTableConfig {
    /// Schema containing the source table.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Name of the source table.
    pub table: String,
    /// Integer identifier column.
    #[serde(default = "default_id_column")]
    pub id_column: String,
    /// County code column.
    #[serde(default = "default_county_fp_column")]
    pub county_fp_column: String,
    /// PostGIS geometry column.
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,
    /// How geometries are rendered as text.
    #[serde(default)]
    pub geometry_format: GeometryFormat,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_county_fp_column() -> String {
    "COUNTYFP".to_string()
}

fn default_geometry_column() -> String {
    "geom".to_string()
}

impl SourceTableConfig {
    /// Creates a configuration for `table` in the `public` schema with the default column names.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: default_schema(),
            table: table.into(),
            id_column: default_id_column(),
            county_fp_column: default_county_fp_column(),
            geometry_column: default_geometry_column(),
            geometry_format: GeometryFormat::default(),
        }
    }

    /// Validates that no identifier is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let identifiers = [
            ("source_table.schema", &self.schema),
            ("source_table.table", &self.table),
            ("source_table.id_column", &self.id_column),
            ("source_table.county_fp_column", &self.county_fp_column),
            ("source_table.geometry_column", &self.geometry_column),
        ];

        for (field, value) in identifiers {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyIdentifier(field));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_default_columns() {
        let config: SourceTableConfig =
            serde_json::from_str(r#"{"table": "al_counties_wgs84", "geometry_format": "geo_json"}"#)
                .unwrap();

        assert_eq!(config.schema, "public");
        assert_eq!(config.county_fp_column, "COUNTYFP");
        assert_eq!(config.geometry_format, GeometryFormat::GeoJson);
    }

    #[test]
    fn rejects_empty_table_name() {
        let config = SourceTableConfig::new(" ");

        assert!(matches!(
            config.validate(),
            Err(ValidationError::EmptyIdentifier("source_table.table"))
        ));
    }
}
