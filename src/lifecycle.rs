//! # lifecycle
//!
//! the request/response a handler computation is bound to
//!

use crate::error::Error;

/// an in-progress request whose response must be finished explicitly
///
/// methods take `&self`, implementors keep their state behind interior
/// mutability since the same sink is shared by the caller and the
/// trampoline
pub trait Lifecycle {
    /// the response has been finished
    fn is_finished(&self) -> bool;

    /// headers or body output have already been sent
    fn headers_written(&self) -> bool;

    /// finish the response
    fn finish(&self);

    /// produce a failure response for an unhandled error
    fn handle_error(&self, err: Error);

    /// the response will be finished by the trampoline, not when the
    /// handler call returns
    fn detach(&self) {}
}
