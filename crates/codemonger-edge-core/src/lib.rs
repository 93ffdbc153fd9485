//! Core of the codemonger edge: directory-style URI expansion.
//!
//! The heart of this crate is [`expand_uri`], a pure function run as a
//! viewer-request hook in front of a static-contents origin. It rewrites
//! URIs whose last path segment carries no file extension so they address an
//! `index.html` document, keeping query and fragment intact.
//!
//! Around it sit the viewer-request event model ([`ViewerRequestEvent`],
//! [`ViewerRequest`]), the [`ViewerRequestFunction`] seam used by the HTTP
//! data plane, and [`EdgeConfig`].

pub mod config;
mod error;
pub mod event;
pub mod expand_index;
pub mod function;

pub use config::{DeploymentStage, EdgeConfig};
pub use error::{EdgeError, EdgeResult};
pub use event::{ViewerRequest, ViewerRequestEvent, handle_viewer_request};
pub use expand_index::{INDEX_DOCUMENT, SEPARATED_INDEX_DOCUMENT, UriComponents, expand_uri};
pub use function::{ExpandIndex, PassThrough, ViewerRequestFunction};
