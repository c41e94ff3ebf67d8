pub mod category;
pub mod engine;
pub mod error;
pub mod index;
pub mod paths;
pub mod schema;
pub mod writer;

pub use category::{
    AttachmentSpec, CategorySpec, DetailSpec, IdPattern, NamingRule, RemoteId, SortKey, StatusLabel,
};
pub use engine::{CategoryMirror, ListedEntity, MirrorReport};
pub use error::MirrorError;
pub use index::ArchiveIndex;
pub use schema::RecordSchema;
