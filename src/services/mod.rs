pub mod error;
pub mod refresh;
pub mod shows;
pub mod transfer;
pub mod watching;

pub use error::{ServiceError, ServiceResult};
pub use refresh::{RefreshService, RefreshStats};
pub use shows::{EpisodeView, SeasonView, ShowDetail, ShowService, TrackedShow};
pub use transfer::{ExportDocument, ImportSummary, TransferService};
pub use watching::WatchService;
