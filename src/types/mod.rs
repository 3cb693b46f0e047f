// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Phantom-typed IDs, image references, and container status.

mod id;
mod image_ref;
mod status;

pub use id::{ContainerId, ExecId, Id, ImageId, SHORT_ID_LEN, short_id};
pub use image_ref::{DEFAULT_TAG, ImageRef, ParseImageRefError};
pub use status::ContainerStatus;
