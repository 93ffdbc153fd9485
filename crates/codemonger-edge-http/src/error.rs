//! Errors surfaced to edge clients.
//!
//! An [`EdgeHttpError`] renders itself as the flat `<Error>` document an S3
//! origin returns behind a distribution.

use std::fmt;
use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

/// Error codes the data plane can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeErrorCode {
    /// The origin has no object for the requested key.
    NoSuchKey,
    /// The method is not served by the distribution.
    MethodNotAllowed,
    /// The request could not be interpreted.
    InvalidArgument,
    /// Unexpected failure while serving.
    InternalError,
}

impl EdgeErrorCode {
    /// Wire name of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSuchKey => "NoSuchKey",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::InvalidArgument => "InvalidArgument",
            Self::InternalError => "InternalError",
        }
    }

    /// HTTP status code of the code.
    #[must_use]
    pub fn status_code(self) -> http::StatusCode {
        match self {
            Self::NoSuchKey => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidArgument => http::StatusCode::BAD_REQUEST,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message used when none is given.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::NoSuchKey => "The specified key does not exist.",
            Self::MethodNotAllowed => "The specified method is not allowed against this resource.",
            Self::InvalidArgument => "Invalid Argument",
            Self::InternalError => "We encountered an internal error. Please try again.",
        }
    }
}

impl fmt::Display for EdgeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error rendered into an HTTP error response.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct EdgeHttpError {
    /// Error code.
    pub code: EdgeErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Resource the error refers to, if any.
    pub resource: Option<String>,
    /// Underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EdgeHttpError {
    /// Create an error with the code's default message.
    #[must_use]
    pub fn new(code: EdgeErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    /// Create an error with a custom message.
    #[must_use]
    pub fn with_message(code: EdgeErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            resource: None,
            source: None,
        }
    }

    /// `NoSuchKey` for `key`.
    #[must_use]
    pub fn no_such_key(key: impl Into<String>) -> Self {
        Self::new(EdgeErrorCode::NoSuchKey).with_resource(key)
    }

    /// `MethodNotAllowed` for `method`.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method) -> Self {
        Self::new(EdgeErrorCode::MethodNotAllowed).with_resource(method.as_str())
    }

    /// `InvalidArgument` with `message`.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::with_message(EdgeErrorCode::InvalidArgument, message)
    }

    /// `InternalError` with `message`.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(EdgeErrorCode::InternalError, message)
    }

    /// Attach the resource the error refers to.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// HTTP status code of this error.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        self.code.status_code()
    }

    /// Render this error as an XML document.
    ///
    /// ```xml
    /// <?xml version="1.0" encoding="UTF-8"?>
    /// <Error>
    ///   <Code>NoSuchKey</Code>
    ///   <Message>The specified key does not exist.</Message>
    ///   <Resource>blog/index.html</Resource>
    ///   <RequestId>4d3c...</RequestId>
    /// </Error>
    /// ```
    ///
    /// Returns an empty document if serialization fails.
    #[must_use]
    pub fn to_xml(&self, request_id: &str) -> Vec<u8> {
        let mut writer = Writer::new(Vec::with_capacity(256));
        match self.write_xml(&mut writer, request_id) {
            Ok(()) => writer.into_inner(),
            Err(e) => {
                tracing::error!(error = %e, code = %self.code, "failed to serialize edge error XML");
                Vec::new()
            }
        }
    }

    fn write_xml(&self, writer: &mut Writer<Vec<u8>>, request_id: &str) -> io::Result<()> {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.create_element("Error").write_inner_content(|w| {
            let fields = [
                ("Code", Some(self.code.as_str())),
                ("Message", Some(self.message.as_str())),
                ("Resource", self.resource.as_deref()),
                ("RequestId", Some(request_id)),
            ];
            for (name, value) in fields {
                if let Some(value) = value {
                    w.create_element(name)
                        .write_text_content(BytesText::new(value))?;
                }
            }
            Ok(())
        })?;
        Ok(())
    }
}
