pub mod auth;
pub mod import;
pub mod insights;
pub mod settings;
pub mod stats;
pub mod tags;
pub mod trades;

pub use auth::*;
pub use import::*;
pub use insights::*;
pub use settings::*;
pub use stats::*;
pub use tags::*;
pub use trades::*;

use chrono::{FixedOffset, NaiveDate, Utc};

/// Calendar date "now" in the journal's configured offset.
pub(crate) fn local_today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}
