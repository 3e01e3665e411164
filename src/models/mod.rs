pub mod daily_metrics;
pub mod insight;
pub mod settings;
pub mod tags;
pub mod trade;
pub mod user;
pub mod window;

pub use daily_metrics::*;
pub use insight::*;
pub use settings::*;
pub use tags::*;
pub use trade::*;
pub use user::*;
pub use window::*;
