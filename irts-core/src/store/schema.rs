use polars::prelude::*;

pub const DATE_COLUMN: &str = "date";
pub const TYPE_COLUMN: &str = "type";
/// Parameter columns in stored order.
pub const VALUE_COLUMNS: [&str; 6] = ["b1", "b2", "b3", "b4", "l1", "l2"];

/// Canonical schema of the parameter dataset.
pub struct ParameterSchema;

impl ParameterSchema {
    pub fn schema() -> Schema {
        let mut fields = vec![
            Field::new(DATE_COLUMN.into(), DataType::Date),
            Field::new(TYPE_COLUMN.into(), DataType::String),
        ];
        fields.extend(
            VALUE_COLUMNS
                .iter()
                .map(|name| Field::new((*name).into(), DataType::Float64)),
        );
        Schema::from_iter(fields)
    }

    /// Check each canonical column in order: present, then typed as expected.
    /// The first offending column is reported. Extra columns are allowed.
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let actual = df.schema();
        for field in Self::schema().iter_fields() {
            match actual.get(field.name()) {
                None => return Err(SchemaError::MissingColumn(field.name().to_string())),
                Some(dtype) if dtype != field.dtype() => {
                    return Err(SchemaError::TypeMismatch {
                        column: field.name().to_string(),
                        expected: field.dtype().clone(),
                        actual: dtype.clone(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("column '{0}' is missing")]
    MissingColumn(String),

    #[error("column '{column}' is {actual}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_frame(b1: Column) -> DataFrame {
        let date = Column::new(DATE_COLUMN.into(), &[20158i32])
            .cast(&DataType::Date)
            .unwrap();
        let mut columns = vec![date, Column::new(TYPE_COLUMN.into(), &["pre"]), b1];
        for name in &VALUE_COLUMNS[1..] {
            columns.push(Column::new((*name).into(), &[0.5f64]));
        }
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn schema_has_all_required_columns() {
        let schema = ParameterSchema::schema();
        assert_eq!(schema.len(), 8);
        assert!(schema.contains("date"));
        assert!(schema.contains("type"));
        for name in VALUE_COLUMNS {
            assert!(schema.contains(name));
        }
    }

    #[test]
    fn validate_accepts_canonical_frame() {
        let df = canonical_frame(Column::new("b1".into(), &[0.1425f64]));
        assert!(ParameterSchema::validate(&df).is_ok());
    }

    #[test]
    fn validate_allows_extra_columns() {
        let mut df = canonical_frame(Column::new("b1".into(), &[0.1425f64]));
        df.with_column(Column::new("source".into(), &["anbima"]))
            .unwrap();
        assert!(ParameterSchema::validate(&df).is_ok());
    }

    #[test]
    fn validate_rejects_missing_column() {
        let df = DataFrame::new(vec![Column::new("type".into(), &["pre"])]).unwrap();
        let err = ParameterSchema::validate(&df).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(ref c) if c == "date"));
    }

    #[test]
    fn validate_rejects_wrong_type() {
        let df = canonical_frame(Column::new("b1".into(), &["0,1425"]));
        let err = ParameterSchema::validate(&df).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { ref column, .. } if column == "b1"));
    }

    #[test]
    fn validate_reports_the_first_offending_column() {
        // `type` is missing and `b1` is mistyped; `type` comes first
        let mut df = canonical_frame(Column::new("b1".into(), &["0,1425"]));
        df.drop_in_place(TYPE_COLUMN).unwrap();
        let err = ParameterSchema::validate(&df).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(ref c) if c == "type"));
    }
}
