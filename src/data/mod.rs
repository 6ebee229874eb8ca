pub mod bcb;
pub mod loader;
pub mod types;

pub use bcb::{first_cdi_date, BcbClient, RateError};
pub use loader::{
    load_cdi_series, load_from_path, load_from_reader, load_ibov_series, LoadOptions, LoaderError,
};
pub use types::{
    AlignedRow, AlignedSeries, DatedSeries, ReturnRow, ReturnSeries, SeriesType, WindowRecord,
};
