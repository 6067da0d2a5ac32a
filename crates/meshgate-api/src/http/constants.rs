//! Header names, form fields, and error kinds shared by the handlers.

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// Multipart or urlencoded field carrying the image.
pub(crate) const FIELD_IMAGE: &str = "image";

pub(crate) const KIND_BAD_REQUEST: &str = "bad_request";
pub(crate) const KIND_NOT_FOUND: &str = "not_found";
pub(crate) const KIND_PAYLOAD_TOO_LARGE: &str = "payload_too_large";
pub(crate) const KIND_INTERNAL: &str = "internal";

pub(crate) const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";
