//! Folding helpers for `Result` values that cross the HTTP boundary.
//!
//! Service calls return `Result<T, DomainError>`. Handlers collapse them into a
//! single response with [`Fold::fold`], which runs exactly one of the two
//! branches. `unwrap`/`unwrap_err` stay available but panic on the wrong
//! variant, so they are reserved for tests and proven invariants.

/// Collapse a two-variant value into a single output.
pub trait Fold<T, E> {
    /// Run `on_success` for the success variant or `on_failure` for the failure
    /// variant and return its output. Never runs both.
    fn fold<U>(self, on_success: impl FnOnce(T) -> U, on_failure: impl FnOnce(E) -> U) -> U;
}

impl<T, E> Fold<T, E> for Result<T, E> {
    fn fold<U>(self, on_success: impl FnOnce(T) -> U, on_failure: impl FnOnce(E) -> U) -> U {
        match self {
            Ok(value) => on_success(value),
            Err(error) => on_failure(error),
        }
    }
}
