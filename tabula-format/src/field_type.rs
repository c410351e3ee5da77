use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tabula_error::{TabulaError, TabulaResult, tabula_err};

/// The logical type of a single field.
///
/// Every type has an adapter-internal name (see [`FieldType::name`]) and a wire tag used by the
/// columnar format (see [`FieldType::tag`]). Both mappings are total and invertible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    /// `true` or `false`
    Boolean,
    /// Whole numbers
    Integer,
    /// Floating point numbers, optionally with a precision
    Real,
    /// Fixed point monetary amounts
    Money,
    /// UTF-8 text
    #[default]
    String,
    /// XML documents stored as text
    Xml,
    /// A point in time, optionally with a time zone
    DateTime,
    /// A calendar date
    Date,
    /// A time of day
    Time,
    /// A duration
    TimeInterval,
    /// A primary key value
    Identity,
    /// One value out of a dictionary
    Enum,
    /// A set of values out of a dictionary
    Flags,
    /// A nested record
    Record,
    /// A nested table of records
    RecordSet,
    /// Opaque bytes
    Binary,
    /// A UUID
    Uuid,
    /// A file attached to a remote call
    RpcFile,
    /// An arbitrary object
    Object,
    /// A homogeneous array of scalar items
    Array,
}

impl FieldType {
    /// All field types in declaration order.
    pub const ALL: [FieldType; 20] = [
        FieldType::Boolean,
        FieldType::Integer,
        FieldType::Real,
        FieldType::Money,
        FieldType::String,
        FieldType::Xml,
        FieldType::DateTime,
        FieldType::Date,
        FieldType::Time,
        FieldType::TimeInterval,
        FieldType::Identity,
        FieldType::Enum,
        FieldType::Flags,
        FieldType::Record,
        FieldType::RecordSet,
        FieldType::Binary,
        FieldType::Uuid,
        FieldType::RpcFile,
        FieldType::Object,
        FieldType::Array,
    ];

    /// The adapter-internal name of the type.
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Real => "real",
            FieldType::Money => "money",
            FieldType::String => "string",
            FieldType::Xml => "xml",
            FieldType::DateTime => "datetime",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::TimeInterval => "timeinterval",
            FieldType::Identity => "identity",
            FieldType::Enum => "enum",
            FieldType::Flags => "flags",
            FieldType::Record => "record",
            FieldType::RecordSet => "recordset",
            FieldType::Binary => "binary",
            FieldType::Uuid => "uuid",
            FieldType::RpcFile => "rpcfile",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }

    /// The tag used for the type in columnar field descriptors.
    pub const fn tag(self) -> &'static str {
        match self {
            FieldType::Boolean => "Boolean-tag",
            FieldType::Integer => "Integer-tag",
            FieldType::Real => "Real-tag",
            FieldType::Money => "Money-tag",
            FieldType::String => "String-tag",
            FieldType::Xml => "Xml-tag",
            FieldType::DateTime => "DateTime-tag",
            FieldType::Date => "Date-tag",
            FieldType::Time => "Time-tag",
            FieldType::TimeInterval => "TimeInterval-tag",
            FieldType::Identity => "Identity-tag",
            FieldType::Enum => "Enum-tag",
            FieldType::Flags => "Flags-tag",
            FieldType::Record => "Record-tag",
            FieldType::RecordSet => "RecordSet-tag",
            FieldType::Binary => "Binary-tag",
            FieldType::Uuid => "Uuid-tag",
            FieldType::RpcFile => "RpcFile-tag",
            FieldType::Object => "Object-tag",
            FieldType::Array => "Array-tag",
        }
    }

    /// Look up the type for a wire tag, returning `None` for unknown tags.
    pub fn try_from_tag(tag: &str) -> Option<FieldType> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Look up the type for a wire tag. Unknown tags decode as [`FieldType::String`].
    pub fn from_tag(tag: &str) -> FieldType {
        Self::try_from_tag(tag).unwrap_or_else(|| {
            log::debug!("Unknown field type tag {tag}, decoding as string");
            FieldType::String
        })
    }

    /// Whether the columnar descriptor of this type may carry type-specific details. The
    /// descriptors of all other types are bare tags.
    pub fn has_details(self) -> bool {
        matches!(
            self,
            FieldType::Real
                | FieldType::Money
                | FieldType::Enum
                | FieldType::Flags
                | FieldType::DateTime
                | FieldType::Array
        )
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = TabulaError;

    fn from_str(s: &str) -> TabulaResult<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == lower)
            .ok_or_else(|| tabula_err!("Unknown field type name {s}"))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn tag_table_is_invertible() {
        for field_type in FieldType::ALL {
            assert_eq!(FieldType::from_tag(field_type.tag()), field_type);
            assert_eq!(field_type.name().parse::<FieldType>().unwrap(), field_type);
        }
    }

    #[test]
    fn tags_and_names_are_unique() {
        let mut tags = FieldType::ALL.map(FieldType::tag).to_vec();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), FieldType::ALL.len());

        let mut names = FieldType::ALL.map(FieldType::name).to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FieldType::ALL.len());
    }

    #[rstest]
    #[case("Decimal-tag")]
    #[case("")]
    #[case("string")]
    fn unknown_tag_decodes_as_string(#[case] tag: &str) {
        assert_eq!(FieldType::try_from_tag(tag), None);
        assert_eq!(FieldType::from_tag(tag), FieldType::String);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("DateTime".parse::<FieldType>().unwrap(), FieldType::DateTime);
        assert!("decimal".parse::<FieldType>().is_err());
    }
}
