pub use self::mapper::{SkipReason, SkippedRecord, map_godpack, map_user, record_key};
pub use self::reader::{
    GODPACK_TAGS, LegacyDocument, LegacyDocumentReader, LegacyError, godpack_elements,
    user_elements,
};

pub mod mapper;
pub mod reader;
