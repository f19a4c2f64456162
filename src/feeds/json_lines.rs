//! Newline-delimited JSON feed reader.
//!
//! Stand-in transport for the binary: every line is one [`FeedEvent`].
//! Lines that do not decode are logged and skipped.

use flume::Sender;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::core::{Error, Result};
use crate::feeds::FeedEvent;

/// Forward decoded events until EOF. Returns the number forwarded.
///
/// Lines are decoded from raw bytes, so a line that is not UTF-8 is skipped
/// like any other undecodable line.
pub async fn read_json_lines<R>(mut reader: R, tx: Sender<FeedEvent>) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(1024);
    let mut forwarded = 0u64;
    let mut line_no = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_slice::<FeedEvent>(line) {
            Ok(event) => {
                tx.send_async(event)
                    .await
                    .map_err(|_| Error::Feed("engine stopped receiving".into()))?;
                forwarded += 1;
            }
            Err(e) => warn!("Skipping feed line {}: {}", line_no, e),
        }
    }

    debug!("Feed reached EOF after {} lines", line_no);
    Ok(forwarded)
}
