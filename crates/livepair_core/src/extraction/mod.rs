//! Still-frame extraction from source movies.
//!
//! Two consumers sit on top of this module: the export pipeline pulls
//! full-resolution poster frames, and the preview layer pulls capped
//! start/end thumbnails through [`ThumbnailService`] with stale-request
//! cancellation.

mod frame;
mod thumbnails;

pub use frame::{apply_dimension_cap, FfmpegFrameSource, FrameError, FrameResult, FrameSource};
pub use thumbnails::{ThumbnailService, ThumbnailSlot};
