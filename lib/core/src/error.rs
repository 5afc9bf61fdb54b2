//! Error handling foundation for toolchat.
//!
//! Only the `Result` alias lives here. Each crate owns its domain error enums
//! and wraps them in rootcause reports, adding context with `.context()` as a
//! failure crosses from one layer into the next.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    fn fails() -> Result<u8, Boom> {
        Err(Boom.into())
    }

    #[test]
    fn report_carries_its_context() {
        let report = fails().expect_err("should fail");
        assert!(report.to_string().contains("boom"));
    }

    #[test]
    fn ok_passes_through() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.expect("should be ok"), 42);
    }
}
