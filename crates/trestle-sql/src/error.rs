use thiserror::Error;

use crate::dialect::Dialect;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{construct} requires at least one {item}")]
    EmptyList {
        construct: &'static str,
        item: &'static str,
    },

    #[error("{construct} is not supported on {dialect}")]
    Unsupported {
        dialect: Dialect,
        construct: String,
    },

    #[error("cte name {name:?} is used by two different definitions")]
    CteNameConflict { name: String },

    #[error("target table {table:?} does not appear in the statement's source list")]
    TargetNotInSources { table: String },

    #[error("function name {name:?} cannot be emitted safely")]
    InvalidFunctionName { name: String },

    #[error("OFFSET without ORDER BY is not valid on {dialect}")]
    OffsetWithoutOrderBy { dialect: Dialect },

    #[error("literal cannot be represented: {reason}")]
    UnrepresentableLiteral { reason: String },

    #[error("row has {found} values but {expected} columns")]
    RowArity { expected: usize, found: usize },

    #[error("merge source reads target table {table:?}; the rewrite would not be equivalent")]
    MergeNotSimulatable { table: String },
}

pub type Result<T> = std::result::Result<T, Error>;
