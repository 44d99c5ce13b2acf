#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    #[error("Row {row} has {found} values, expected {expected}")]
    RowArity {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Field `{name}` has index {index} but rows only have {arity} values")]
    FieldIndexOutOfBounds {
        name: String,
        index: usize,
        arity: usize,
    },

    #[error("Index {index} is out of bounds for a dataset with {len} rows")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Index must be strictly increasing, found {next} after {prev}")]
    UnsortedIndex { prev: usize, next: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid color `{0}`")]
pub struct ColorParseError(pub String);
