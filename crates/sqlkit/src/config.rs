//! Execution wrapper configuration and SQL logging.

use crate::value::Value;
use tracing::Level;

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// Configuration shared by a [`crate::Db`] and every transaction begun from it.
///
/// Each executed statement is emitted as a `tracing` event with target
/// `sqlkit.sql`:
///
/// ```ignore
/// tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
/// let db = sqlkit::Db::with_config(driver, sqlkit::DbConfig::new().no_truncate());
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes, on a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Include bound arguments in events.
    pub log_args: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            log_args: true,
        }
    }
}

impl DbConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Whether bound arguments are logged.
    pub fn log_args(mut self, yes: bool) -> Self {
        self.log_args = yes;
        self
    }

    pub(crate) fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                format!("{}...", truncate_sql_bytes(sql, max)).into()
            }
            _ => sql.into(),
        }
    }

    /// Emit one statement event.
    pub(crate) fn log_sql(&self, tx: Option<&str>, sql: &str, args: &[Value]) {
        let tx = tx.unwrap_or("-");
        let sql = self.truncate_sql(sql);
        if self.log_args {
            let args = tracing::field::debug(args);
            emit_at_level!(self.level, target: "sqlkit.sql", tx, sql = %sql, args = args);
        } else {
            emit_at_level!(self.level, target: "sqlkit.sql", tx, sql = %sql, param_count = args.len());
        }
    }

    /// Emit a transaction lifecycle event (`begin`, `commit`, `rollback`).
    pub(crate) fn log_tx(&self, tx: &str, event: &str) {
        emit_at_level!(self.level, target: "sqlkit.sql", tx, sql = %event);
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
