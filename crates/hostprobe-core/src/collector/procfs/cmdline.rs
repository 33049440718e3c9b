//! Recovers a server's connection limit from `/proc/[pid]/cmdline`.
//!
//! memcached does not report its `-c` (max simultaneous connections) setting
//! through `stats`, so it is read back from the process command line.

use std::path::Path;

use tracing::debug;

use crate::collector::traits::FileSystem;

/// Command-line flag carrying the connection limit.
pub const CONNECTION_LIMIT_FLAG: &str = "-c";

/// Finds the numeric argument following `-c` in NUL-separated cmdline content.
pub fn parse_connection_limit(cmdline: &str) -> Option<u64> {
    let mut args = cmdline.split('\0');
    while let Some(arg) = args.next() {
        if arg != CONNECTION_LIMIT_FLAG {
            continue;
        }
        let value = args.next()?;
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            return value.parse().ok();
        }
    }
    None
}

/// Reads the connection limit of process `pid`.
///
/// Returns `None` when the process is gone, unreadable, or was started
/// without `-c`.
pub fn read_connection_limit<F: FileSystem>(fs: &F, proc_path: &str, pid: u32) -> Option<u64> {
    let path = format!("{}/{}/cmdline", proc_path, pid);
    let content = match fs.read_to_string(Path::new(&path)) {
        Ok(content) => content,
        Err(e) => {
            debug!(pid, error = %e, "cannot read memcached command line");
            return None;
        }
    };

    let limit = parse_connection_limit(&content);
    match limit {
        Some(limit) => debug!(pid, limit, "limit connections"),
        None => debug!(pid, "no connection limit on memcached command line"),
    }
    limit
}
