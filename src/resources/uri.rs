//! `mysql://` resource addresses.

use std::fmt;

pub const RESOURCE_SCHEME: &str = "mysql";

const TABLES: &str = "mysql://tables";
const VIEWS: &str = "mysql://views";
const PROCEDURES: &str = "mysql://procedures";
const TABLE_PREFIX: &str = "mysql://table/";
const SCHEMA_SUFFIX: &str = "/schema";

/// A recognised resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    Tables,
    Views,
    Procedures,
    /// Structure plus sample rows
    Table(String),
    /// Same payload as `get_table_info`
    TableSchema(String),
}

impl ResourceUri {
    /// Match `uri` against the known shapes, first match wins.
    ///
    /// Table names must be non-empty and contain no `/`, so
    /// `mysql://table/a/b` and `mysql://table/` match nothing.
    ///
    /// Names are taken verbatim, with no percent-decoding: listed URIs carry
    /// the raw table name, so `mysql://table/my%20table` names a table
    /// literally called `my%20table`.
    pub fn parse(uri: &str) -> Option<Self> {
        match uri {
            TABLES => return Some(Self::Tables),
            VIEWS => return Some(Self::Views),
            PROCEDURES => return Some(Self::Procedures),
            _ => {}
        }

        let rest = uri.strip_prefix(TABLE_PREFIX)?;
        if is_table_segment(rest) {
            return Some(Self::Table(rest.to_string()));
        }

        rest.strip_suffix(SCHEMA_SUFFIX)
            .filter(|name| is_table_segment(name))
            .map(|name| Self::TableSchema(name.to_string()))
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self::Table(name.into())
    }

    pub fn table_schema(name: impl Into<String>) -> Self {
        Self::TableSchema(name.into())
    }
}

fn is_table_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains('/')
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tables => f.write_str(TABLES),
            Self::Views => f.write_str(VIEWS),
            Self::Procedures => f.write_str(PROCEDURES),
            Self::Table(name) => write!(f, "{}{}", TABLE_PREFIX, name),
            Self::TableSchema(name) => write!(f, "{}{}{}", TABLE_PREFIX, name, SCHEMA_SUFFIX),
        }
    }
}
