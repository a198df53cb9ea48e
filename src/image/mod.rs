//! Image records and the catalog that holds them.

mod catalog;
mod record;

pub use catalog::{check_content_type, ImageCatalog, InMemoryImageCatalog, ACCEPTED_CONTENT_TYPES};
pub use record::{is_valid_image_id, ImageRecord, MAX_IMAGE_ID_LEN};
