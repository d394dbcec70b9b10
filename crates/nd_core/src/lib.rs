pub mod error;
pub mod extract;
pub mod logging;
pub mod store;
pub mod types;

pub use error::Error;
pub use extract::{ContentExtractor, ExtractFailure};
pub use store::ArticleStore;
pub use types::{Article, ArticleId, ExtractionState, NewArticle};

pub type Result<T> = std::result::Result<T, Error>;
