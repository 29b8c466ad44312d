use anyhow::{bail, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Every i3 IPC message starts with this magic string.
pub const MAGIC: &[u8; 6] = b"i3-ipc";

/// Replies to subscriptions carry the event bit in the type field.
pub const EVENT_BIT: u32 = 1 << 31;

/// Event type delivered for `window` subscriptions.
pub const WINDOW_EVENT: u32 = 3;

// Upper bound on a single payload. The tree of a busy session is a few
// hundred KiB; anything near this limit means a corrupt stream.
const MAX_PAYLOAD: u32 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    RunCommand,
    Subscribe,
    GetTree,
}

impl MessageType {
    fn code(self) -> u32 {
        match self {
            MessageType::RunCommand => 0,
            MessageType::Subscribe => 2,
            MessageType::GetTree => 4,
        }
    }
}

#[derive(Debug)]
pub struct RawMessage {
    pub kind: u32,
    pub payload: Vec<u8>,
}

impl RawMessage {
    pub fn is_event(&self) -> bool {
        self.kind & EVENT_BIT != 0
    }

    pub fn event_type(&self) -> u32 {
        self.kind & !EVENT_BIT
    }
}

pub async fn write_message<W>(writer: &mut W, kind: MessageType, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(MAGIC.len() + 8 + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    buf.extend_from_slice(&kind.code().to_ne_bytes());
    buf.extend_from_slice(payload);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_message<R>(reader: &mut R) -> Result<RawMessage>
where
    R: AsyncRead + Unpin,
{
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic).await?;
    if &magic != MAGIC {
        bail!("bad magic in IPC stream: {:?}", magic);
    }

    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let mut kind_buf = [0u8; 4];
    reader.read_exact(&mut kind_buf).await?;
    let len = u32::from_ne_bytes(len_buf);
    let kind = u32::from_ne_bytes(kind_buf);
    if len > MAX_PAYLOAD {
        bail!("IPC payload too large: {} bytes", len);
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(RawMessage { kind, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_roundtrip() {
        let mut buf = std::io::Cursor::new(Vec::new());
        write_message(&mut buf, MessageType::RunCommand, b"focus")
            .await
            .unwrap();

        let mut cursor = std::io::Cursor::new(buf.into_inner());
        let msg = read_message(&mut cursor).await.unwrap();
        assert_eq!(msg.kind, 0);
        assert_eq!(msg.payload, b"focus");
        assert!(!msg.is_event());
    }

    #[tokio::test]
    async fn test_event_bit() {
        let msg = RawMessage {
            kind: EVENT_BIT | WINDOW_EVENT,
            payload: vec![],
        };
        assert!(msg.is_event());
        assert_eq!(msg.event_type(), WINDOW_EVENT);
    }

    #[tokio::test]
    async fn test_bad_magic_is_rejected() {
        let mut data = b"not-i3".to_vec();
        data.extend_from_slice(&[0u8; 8]);
        let mut cursor = std::io::Cursor::new(data);
        assert!(read_message(&mut cursor).await.is_err());
    }
}
