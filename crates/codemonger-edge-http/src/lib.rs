//! Edge HTTP data plane for the codemonger site.
//!
//! This crate serves static contents the way the production distribution
//! does, with a viewer-request function applied to every request before the
//! origin is consulted:
//!
//! - **Service** ([`service`]): [`EdgeHttpService`], a hyper `Service` tying
//!   health checks, the function test endpoint, the viewer-request hook and
//!   the origin together.
//! - **Origin** ([`origin`]): the [`Origin`] trait and [`DirectoryOrigin`],
//!   which serves files from a contents directory.
//! - **Responses** ([`response`]): object responses, JSON and XML error
//!   responses, all with `Full<Bytes>` bodies.
//! - **Server** ([`server`]): the accept loop with graceful shutdown.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> EdgeHttpService (hyper Service)
//!     -> Health check / function test interception
//!     -> GET/HEAD filter
//!     -> ViewerRequestFunction (e.g. ExpandIndex)
//!     -> Origin::get_object (percent-decoded key)
//!     -> Common response headers (x-amz-cf-id, Server, Via)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use codemonger_edge_core::ExpandIndex;
//! use codemonger_edge_http::{DirectoryOrigin, EdgeHttpConfig, EdgeHttpService};
//!
//! let service = EdgeHttpService::new(
//!     ExpandIndex,
//!     DirectoryOrigin::new("./docs"),
//!     EdgeHttpConfig::default(),
//! );
//! // Use `service` with hyper server, or `codemonger_edge_http::server::serve`.
//! ```

pub mod error;
pub mod origin;
pub mod response;
pub mod server;
pub mod service;

pub use error::{EdgeErrorCode, EdgeHttpError};
pub use origin::{DirectoryOrigin, Origin, OriginObject};
pub use server::serve;
pub use service::{EdgeHttpConfig, EdgeHttpService, FUNCTION_TEST_PATH};
