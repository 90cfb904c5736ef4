//! Service layer
//!
//! Services implement the dashboard's user actions on top of the
//! [`TranslationApi`](transdoc_client::TranslationApi) seam: submitting a
//! document and handing off a finished translation.

mod download;
mod upload;

pub use download::DownloadService;
pub use upload::{UploadForm, UploadSubmitter};
