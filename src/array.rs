// ABOUTME: Rectangular dynamic array storage with arbitrary per-dimension lower bounds

use crate::error::EngineError;
use crate::value::Value;

/// A single dimension's bounds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub lower: i32,
    pub upper: i32,
}

impl Dimension {
    pub fn len(&self) -> usize {
        if self.upper < self.lower {
            0
        } else {
            (self.upper - self.lower + 1) as usize
        }
    }
}

/// Row-major, multi-dimensional storage for a script `Array`. Every element is a
/// [`Value`]; `ReDim` replaces the whole backing store, `ReDim Preserve` copies
/// element-wise up to the minimum extent of old and new shape per dimension.
#[derive(Debug, Clone)]
pub struct DynamicArray {
    dims: Vec<Dimension>,
    data: Vec<Value>,
}

impl DynamicArray {
    /// Build a new array from a list of (lower, upper) bound pairs, filled with `Empty`.
    pub fn new(dims: Vec<Dimension>) -> Self {
        let len = dims.iter().map(Dimension::len).product();
        DynamicArray { dims, data: vec![Value::Empty; len] }
    }

    /// Convenience constructor for a zero-based single dimension array of the given length,
    /// used by the host value bridge and by `Array(...)`.
    pub fn from_values(values: Vec<Value>) -> Self {
        let upper = values.len() as i32 - 1;
        DynamicArray {
            dims: vec![Dimension { lower: 0, upper }],
            data: values,
        }
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn lower_bound(&self, dimension: usize) -> Result<i32, EngineError> {
        self.dims
            .get(dimension)
            .map(|d| d.lower)
            .ok_or_else(|| EngineError::subscript_out_of_range(format!("dimension {dimension}")))
    }

    pub fn upper_bound(&self, dimension: usize) -> Result<i32, EngineError> {
        self.dims
            .get(dimension)
            .map(|d| d.upper)
            .ok_or_else(|| EngineError::subscript_out_of_range(format!("dimension {dimension}")))
    }

    fn flat_index(&self, indices: &[i32]) -> Result<usize, EngineError> {
        if indices.len() != self.dims.len() {
            return Err(EngineError::subscript_out_of_range(format!(
                "expected {} indices, got {}",
                self.dims.len(),
                indices.len()
            )));
        }
        let mut flat = 0usize;
        for (dim, &idx) in self.dims.iter().zip(indices) {
            if idx < dim.lower || idx > dim.upper {
                return Err(EngineError::subscript_out_of_range(format!(
                    "index {idx} outside [{}, {}]",
                    dim.lower, dim.upper
                )));
            }
            flat = flat * dim.len() + (idx - dim.lower) as usize;
        }
        Ok(flat)
    }

    pub fn get(&self, indices: &[i32]) -> Result<Value, EngineError> {
        let flat = self.flat_index(indices)?;
        Ok(self.data[flat].clone())
    }

    pub fn set(&mut self, indices: &[i32], value: Value) -> Result<(), EngineError> {
        let flat = self.flat_index(indices)?;
        self.data[flat] = value;
        Ok(())
    }

    /// `ReDim`: replace storage entirely with a fresh, `Empty`-filled array of the new shape.
    pub fn redim(&mut self, dims: Vec<Dimension>) {
        *self = DynamicArray::new(dims);
    }

    /// `ReDim Preserve`: copy old elements into the new shape, element-wise, up to the
    /// minimum of old/new extent in each dimension. Dimensions beyond the old rank (or a
    /// change in rank) degrade to plain `ReDim` per the dialect's own limitation that
    /// `Preserve` may only change the bounds of the last dimension; this port accepts any
    /// shape and preserves whatever indices remain valid in both shapes.
    pub fn redim_preserve(&mut self, dims: Vec<Dimension>) {
        let new = DynamicArray::new(dims);
        let mut merged = new;
        if merged.dims.len() == self.dims.len() {
            copy_overlap(self, &mut merged, &mut vec![0; self.dims.len()], 0);
        }
        *self = merged;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.data.iter()
    }

    pub fn values(&self) -> &[Value] {
        &self.data
    }
}

fn copy_overlap(src: &DynamicArray, dst: &mut DynamicArray, cursor: &mut Vec<i32>, axis: usize) {
    if axis == src.dims.len() {
        let indices: Vec<i32> = cursor.clone();
        if let (Ok(v), true) = (src.get(&indices), indices_in(&dst.dims, &indices)) {
            let _ = dst.set(&indices, v);
        }
        return;
    }
    let lower = src.dims[axis].lower;
    let upper = src.dims[axis].upper;
    for i in lower..=upper {
        cursor.push(i);
        copy_overlap(src, dst, cursor, axis + 1);
        cursor.pop();
    }
}

fn indices_in(dims: &[Dimension], indices: &[i32]) -> bool {
    dims.iter().zip(indices).all(|(d, &i)| i >= d.lower && i <= d.upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(lower: i32, upper: i32) -> Dimension {
        Dimension { lower, upper }
    }

    #[test]
    fn single_dimension_round_trips() {
        let mut arr = DynamicArray::new(vec![dim(0, 2)]);
        arr.set(&[1], Value::Long(42)).unwrap();
        assert!(matches!(arr.get(&[1]), Ok(Value::Long(42))));
        assert!(matches!(arr.get(&[0]), Ok(Value::Empty)));
    }

    #[test]
    fn out_of_bounds_access_raises_subscript_error() {
        let arr = DynamicArray::new(vec![dim(1, 3)]);
        assert!(arr.get(&[0]).is_err());
        assert!(arr.get(&[4]).is_err());
    }

    #[test]
    fn arbitrary_lower_bounds_are_honoured() {
        let mut arr = DynamicArray::new(vec![dim(-2, 2)]);
        arr.set(&[-2], Value::Long(1)).unwrap();
        arr.set(&[2], Value::Long(5)).unwrap();
        assert!(matches!(arr.get(&[-2]), Ok(Value::Long(1))));
        assert!(matches!(arr.get(&[2]), Ok(Value::Long(5))));
    }

    #[test]
    fn multi_dimension_indexing_is_row_major() {
        let mut arr = DynamicArray::new(vec![dim(0, 1), dim(0, 2)]);
        arr.set(&[0, 0], Value::Long(1)).unwrap();
        arr.set(&[1, 2], Value::Long(9)).unwrap();
        assert!(matches!(arr.get(&[0, 0]), Ok(Value::Long(1))));
        assert!(matches!(arr.get(&[1, 2]), Ok(Value::Long(9))));
    }

    #[test]
    fn redim_preserve_keeps_overlapping_elements() {
        let mut arr = DynamicArray::new(vec![dim(0, 3)]);
        for i in 0..=3 {
            arr.set(&[i], Value::Long(i * 10)).unwrap();
        }
        arr.redim_preserve(vec![dim(0, 5)]);
        assert!(matches!(arr.get(&[3]), Ok(Value::Long(30))));
        assert!(matches!(arr.get(&[5]), Ok(Value::Empty)));
    }

    #[test]
    fn redim_without_preserve_clears_storage() {
        let mut arr = DynamicArray::new(vec![dim(0, 3)]);
        arr.set(&[0], Value::Long(10)).unwrap();
        arr.redim(vec![dim(0, 3)]);
        assert!(matches!(arr.get(&[0]), Ok(Value::Empty)));
    }

    #[test]
    fn from_values_builds_a_zero_based_vector() {
        let arr = DynamicArray::from_values(vec![Value::Long(1), Value::Long(2)]);
        assert_eq!(arr.lower_bound(0).unwrap(), 0);
        assert_eq!(arr.upper_bound(0).unwrap(), 1);
    }
}
