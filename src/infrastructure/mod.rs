//! Infrastructure layer implementations
//!
//! Access to resources living outside the configuration, such as the Markdown
//! description files of elements.

mod description_cache;

pub use description_cache::{
    compose_description, description_path, DescriptionCache, DescriptionError,
    DescriptionResult, DescriptionSource, FsDescriptionSource, MISSING_DESCRIPTION,
};
