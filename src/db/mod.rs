/// Text-backed enums round-trip through their `as_str`/`FromStr` pair.
macro_rules! sql_text_enum {
    ($($ty:ty),+ $(,)?) => {$(
        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $ty {
            fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
            }
        }
    )+};
}

pub mod connection;
pub mod insights;
pub mod migration_runner;
pub mod rollups;
pub mod settings;
pub mod tags;
pub mod trades;
pub mod users;

pub use connection::Database;
