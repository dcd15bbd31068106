use anyhow::{Context, Result};
use polars::prelude::{AnyValue, Column, DataFrame};

/// A single attribute cell as read from, or written to, a container file.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttrValue {
    pub(crate) fn from_any(value: &AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => AttrValue::Null,
            AnyValue::Boolean(b) => AttrValue::Bool(*b),
            AnyValue::Int32(v) => AttrValue::Int(*v as i64),
            AnyValue::Int64(v) => AttrValue::Int(*v),
            AnyValue::UInt32(v) => AttrValue::Int(*v as i64),
            AnyValue::UInt64(v) => AttrValue::Int(*v as i64),
            AnyValue::Float32(v) => AttrValue::Float(*v as f64),
            AnyValue::Float64(v) => AttrValue::Float(*v),
            AnyValue::String(s) => AttrValue::Str((*s).to_string()),
            AnyValue::StringOwned(s) => AttrValue::Str(s.to_string()),
            other => AttrValue::Str(other.to_string()),
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            AttrValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Float(v) if v.is_finite() => Some(v.round() as i64),
            AttrValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn as_string(&self) -> Option<String> {
        match self {
            AttrValue::Null => None,
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::Int(v) => Some(v.to_string()),
            AttrValue::Float(v) => Some(v.to_string()),
            AttrValue::Str(s) => Some(s.clone()),
        }
    }
}

/// Accumulates one attribute column, then picks the narrowest type that holds every value.
#[derive(Debug)]
pub(crate) struct ColumnBuilder {
    name: String,
    values: Vec<AttrValue>,
}

impl ColumnBuilder {
    /// A column already padded with `rows` nulls, for keys first seen part-way through a file.
    pub(crate) fn new(name: &str, rows: usize) -> Self {
        Self { name: name.to_string(), values: vec![AttrValue::Null; rows] }
    }

    pub(crate) fn push(&mut self, value: AttrValue) { self.values.push(value) }

    pub(crate) fn len(&self) -> usize { self.values.len() }

    pub(crate) fn finish(self) -> Column {
        let non_null = || self.values.iter().filter(|v| **v != AttrValue::Null);
        let all_bool = non_null().all(|v| matches!(v, AttrValue::Bool(_)));
        let all_int = non_null().all(|v| matches!(v, AttrValue::Int(_)));
        let all_numeric = non_null().all(|v| matches!(v, AttrValue::Int(_) | AttrValue::Float(_)));
        let any = non_null().next().is_some();

        let name = self.name.as_str();
        if any && all_bool {
            let values: Vec<Option<bool>> = self.values.iter()
                .map(|v| match v { AttrValue::Bool(b) => Some(*b), _ => None })
                .collect();
            Column::new(name.into(), values)
        } else if any && all_int {
            let values: Vec<Option<i64>> = self.values.iter().map(|v| match v { AttrValue::Int(i) => Some(*i), _ => None }).collect();
            Column::new(name.into(), values)
        } else if any && all_numeric {
            let values: Vec<Option<f64>> = self.values.iter().map(AttrValue::as_f64).collect();
            Column::new(name.into(), values)
        } else {
            let values: Vec<Option<String>> = self.values.iter().map(AttrValue::as_string).collect();
            Column::new(name.into(), values)
        }
    }
}

/// Assemble finished columns into a frame; an empty list gives an empty frame.
pub(crate) fn frame_from_builders(builders: Vec<ColumnBuilder>) -> Result<DataFrame> {
    let columns: Vec<Column> = builders.into_iter().map(ColumnBuilder::finish).collect();
    DataFrame::new(columns).context("Failed to assemble attribute table")
}

/// Read one cell of `df` as an AttrValue.
pub(crate) fn cell(df: &DataFrame, column: &str, row: usize) -> Result<AttrValue> {
    let value = df.column(column)
        .with_context(|| format!("Missing column {column:?}"))?
        .get(row)
        .with_context(|| format!("Row {row} out of bounds for column {column:?}"))?;
    Ok(AttrValue::from_any(&value))
}

#[cfg(test)]
mod tests {
    use polars::prelude::DataType;

    use super::{AttrValue, ColumnBuilder};

    fn build(values: Vec<AttrValue>) -> polars::prelude::Column {
        let mut builder = ColumnBuilder::new("x", 0);
        for v in values { builder.push(v) }
        builder.finish()
    }

    #[test]
    fn infers_narrowest_type() {
        assert_eq!(build(vec![AttrValue::Int(1), AttrValue::Null]).dtype(), &DataType::Int64);
        assert_eq!(build(vec![AttrValue::Int(1), AttrValue::Float(2.5)]).dtype(), &DataType::Float64);
        assert_eq!(build(vec![AttrValue::Bool(true)]).dtype(), &DataType::Boolean);
        assert_eq!(build(vec![AttrValue::Int(1), AttrValue::Str("a".into())]).dtype(), &DataType::String);
        assert_eq!(build(vec![AttrValue::Null]).dtype(), &DataType::String);
    }

    #[test]
    fn padded_builder_keeps_row_alignment() {
        let mut builder = ColumnBuilder::new("late", 2);
        builder.push(AttrValue::Float(1.5));
        assert_eq!(builder.len(), 3);
        let column = builder.finish();
        assert_eq!(column.len(), 3);
        assert_eq!(column.null_count(), 2);
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(AttrValue::Float(1234.0).as_i64(), Some(1234));
        assert_eq!(AttrValue::Str(" 42 ".into()).as_f64(), Some(42.0));
        assert_eq!(AttrValue::Null.as_f64(), None);
        assert_eq!(AttrValue::Bool(true).as_string().as_deref(), Some("true"));
    }
}
