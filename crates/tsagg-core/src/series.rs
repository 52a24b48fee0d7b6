// File: crates/tsagg-core/src/series.rs
// Summary: Series model: strictly increasing f64 index with typed values.
// Notes:
// - Aggregators select positions, so `take` keeps the original value type.
// - Only the gap post-process changes the type (to float, for NaN markers).

use crate::error::{Error, Result};

/// Typed column of series values.
#[derive(Clone, Debug, PartialEq)]
pub enum Values {
    Float(Vec<f64>),
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Bool(Vec<bool>),
    /// Categorical values stored as codes into `labels`.
    Category { codes: Vec<u32>, labels: Vec<String> },
    Text(Vec<String>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Float(v) => v.len(),
            Values::Int(v) => v.len(),
            Values::UInt(v) => v.len(),
            Values::Bool(v) => v.len(),
            Values::Category { codes, .. } => codes.len(),
            Values::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn type_name(&self) -> &'static str {
        match self {
            Values::Float(_) => "float",
            Values::Int(_) => "int",
            Values::UInt(_) => "uint",
            Values::Bool(_) => "bool",
            Values::Category { .. } => "category",
            Values::Text(_) => "text",
        }
    }

    /// Numeric encoding used by the aggregation algorithms and renderers.
    pub fn to_f64(&self) -> Result<Vec<f64>> {
        Ok(match self {
            Values::Float(v) => v.clone(),
            Values::Int(v) => v.iter().map(|&x| x as f64).collect(),
            Values::UInt(v) => v.iter().map(|&x| x as f64).collect(),
            Values::Bool(v) => v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
            Values::Category { codes, .. } => codes.iter().map(|&c| c as f64).collect(),
            Values::Text(_) => return Err(Error::UnsupportedType(self.type_name())),
        })
    }

    /// Values at the given positions, same variant as `self`.
    pub fn take(&self, positions: &[usize]) -> Values {
        fn pick<T: Clone>(v: &[T], positions: &[usize]) -> Vec<T> {
            positions.iter().map(|&p| v[p].clone()).collect()
        }
        match self {
            Values::Float(v) => Values::Float(pick(v, positions)),
            Values::Int(v) => Values::Int(pick(v, positions)),
            Values::UInt(v) => Values::UInt(pick(v, positions)),
            Values::Bool(v) => Values::Bool(pick(v, positions)),
            Values::Category { codes, labels } => {
                Values::Category { codes: pick(codes, positions), labels: labels.clone() }
            }
            Values::Text(v) => Values::Text(pick(v, positions)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    index: Vec<f64>,
    values: Values,
}

impl Series {
    /// Build a series, enforcing equal lengths and a strictly increasing index.
    pub fn try_new(name: impl Into<String>, index: Vec<f64>, values: Values) -> Result<Self> {
        if index.len() != values.len() {
            return Err(Error::config(format!(
                "index has {} entries but values have {}",
                index.len(),
                values.len()
            )));
        }
        if let Some(w) = index.windows(2).position(|w| !(w[0] < w[1])) {
            return Err(Error::config(format!(
                "index must be strictly increasing (position {} -> {})",
                w,
                w + 1
            )));
        }
        Ok(Self { name: name.into(), index, values })
    }

    /// Float series from `(index, value)` pairs.
    pub fn from_points(name: impl Into<String>, points: &[(f64, f64)]) -> Result<Self> {
        let (index, values): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        Self::try_new(name, index, Values::Float(values))
    }

    /// Float series over the positional index `0..values.len()`.
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        let index = (0..values.len()).map(|i| i as f64).collect();
        Self { name: name.into(), index, values: Values::Float(values) }
    }

    pub fn len(&self) -> usize { self.index.len() }
    pub fn is_empty(&self) -> bool { self.index.is_empty() }
    pub fn index(&self) -> &[f64] { &self.index }
    pub fn values(&self) -> &Values { &self.values }

    /// `(index, numeric value)` pairs; fails for text values.
    pub fn points(&self) -> Result<Vec<(f64, f64)>> {
        let ys = self.values.to_f64()?;
        Ok(self.index.iter().copied().zip(ys).collect())
    }

    /// Sub-series at the given (increasing) positions.
    pub fn take(&self, positions: &[usize]) -> Series {
        Series {
            name: self.name.clone(),
            index: positions.iter().map(|&p| self.index[p]).collect(),
            values: self.values.take(positions),
        }
    }

    /// Float copy of this series with the flagged positions replaced by NaN.
    pub fn with_nan_at(&self, mask: &[bool]) -> Result<Series> {
        let mut ys = self.values.to_f64()?;
        for (y, &m) in ys.iter_mut().zip(mask) {
            if m { *y = f64::NAN; }
        }
        Ok(Series { name: self.name.clone(), index: self.index.clone(), values: Values::Float(ys) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsorted_index() {
        let err = Series::try_new("s", vec![0.0, 2.0, 1.0], Values::Float(vec![0.0; 3])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Series::try_new("s", vec![0.0, 1.0], Values::Int(vec![1])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn take_keeps_value_type() {
        let s = Series::try_new("b", vec![0.0, 1.0, 2.0], Values::Bool(vec![true, false, true])).unwrap();
        let t = s.take(&[0, 2]);
        assert_eq!(t.values(), &Values::Bool(vec![true, true]));
        assert_eq!(t.index(), &[0.0, 2.0]);
    }

    #[test]
    fn text_has_no_numeric_encoding() {
        let s = Series::try_new("t", vec![0.0], Values::Text(vec!["a".into()])).unwrap();
        assert!(matches!(s.points(), Err(Error::UnsupportedType("text"))));
    }
}
