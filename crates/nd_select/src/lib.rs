pub mod engine;
pub mod ranker;
pub mod taxonomy;

pub use engine::SelectionEngine;
pub use ranker::{select_top_diverse, ScoredArticle, SelectionConfig};
pub use taxonomy::{normalize, Topic, TopicTaxonomy};
