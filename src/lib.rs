pub mod align;
pub mod data;
pub mod export;
pub mod returns;
pub mod window;

// Re-export commonly used types
pub use align::{AlignError, Aligner};
pub use data::{
    AlignedSeries, BcbClient, DatedSeries, LoadOptions, LoaderError, RateError, ReturnSeries,
    SeriesType, WindowRecord,
};
pub use export::{write_records, write_records_to_path, ExportError};
pub use returns::daily_returns;
pub use window::WindowExpander;
