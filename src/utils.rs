use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Error;

pub fn unix(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}

pub fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

/// Largest frame accepted from a peer, counting the type byte
pub const MAX_PACKET_LEN: u32 = 16 * 1024 * 1024;

pub async fn read_packet<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Bytes, Error> {
    let length = stream.read_u32().await?;
    if length > MAX_PACKET_LEN {
        return Err(Error::BadMessage(format!(
            "frame of {length} bytes exceeds the {MAX_PACKET_LEN} byte limit"
        )));
    }

    let mut buf = vec![0; length as usize];
    let _ = stream.read_exact(&mut buf).await?;

    Ok(Bytes::from(buf))
}
