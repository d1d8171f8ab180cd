//! Panicking convenience layer over the `Result` API.
//!
//! Useful in scripts and tests where any database error is fatal:
//!
//! ```ignore
//! use sqlkit::Must;
//!
//! let n = db.count("users", WhereInput::None, &[]).await.must();
//! ```

use crate::error::OrmResult;

pub trait Must<T> {
    /// Unwrap the value or panic with the error's message.
    fn must(self) -> T;
}

impl<T> Must<T> for OrmResult<T> {
    #[track_caller]
    fn must(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}
