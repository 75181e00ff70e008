//! Logical column types.
//!
//! A [`SqlType`] names a backend-independent scalar type; each dialect maps
//! it to a concrete type name when a CAST is emitted. [`ColumnType`] adds the
//! nullability flag carried by table metadata.

/// A backend-independent scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// Boolean (BIT on T-SQL)
    Bool,
    /// 8-bit unsigned integer (no PostgreSQL representation)
    Byte,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// Fixed-point decimal, optionally with explicit precision and scale
    Decimal { spec: Option<DecimalSpec> },
    /// 64-bit float
    Double,
    /// Date and time without offset
    DateTime,
    /// Date and time with UTC offset (no MySQL representation)
    DateTimeOffset,
    /// GUID / UUID
    Guid,
    /// Variable-length text, unbounded when `len` is `None`
    Text { len: Option<u32> },
    /// Fixed-length text
    FixedText { len: u32 },
    /// Variable-length binary, unbounded when `len` is `None`
    Blob { len: Option<u32> },
    /// Fixed-length binary
    FixedBlob { len: u32 },
    /// XML document (no MySQL representation)
    Xml,
}

/// Precision and scale for [`SqlType::Decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalSpec {
    pub precision: u8,
    pub scale: u8,
}

impl DecimalSpec {
    pub fn new(precision: u8, scale: u8) -> Self {
        Self { precision, scale }
    }
}

/// A scalar type plus nullability, as carried by table metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnType {
    pub ty: SqlType,
    pub nullable: bool,
}

impl ColumnType {
    pub fn not_null(ty: SqlType) -> Self {
        Self {
            ty,
            nullable: false,
        }
    }

    pub fn nullable(ty: SqlType) -> Self {
        Self { ty, nullable: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullability_constructors() {
        let id = ColumnType::not_null(SqlType::Int64);
        assert!(!id.nullable);
        assert_eq!(id.ty, SqlType::Int64);

        let note = ColumnType::nullable(SqlType::Text { len: Some(200) });
        assert!(note.nullable);
    }
}
