pub(crate) mod metadata;
pub(crate) mod render;
pub(crate) mod scratch;
pub(crate) mod thumbnails;
