pub mod ancestry;
pub mod context;
pub mod error;
pub mod timechain;

pub use ancestry::HeaderAncestryView;
pub use context::{HeaderContext, HeaderHandle, PendingHeader};
pub use error::{PreconditionError, TimechainError};
pub use timechain::HeaderTimechain;
