use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    buf::{PutBuf, TryBuf},
    error, utils,
};

/// Kind of a listed entry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromPrimitive,
)]
#[serde(rename_all = "lowercase")]
pub enum DirentKind {
    #[default]
    File = 0,
    Dir = 1,
    Symlink = 2,
    Exec = 3,
    Other = 4,
}

impl DirentKind {
    /// Tag used by the line renderer
    pub const fn tag(self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Dir => "DIR",
            Self::Symlink => "SYM",
            Self::Exec => "EXEC",
            Self::Other => "OTHER",
        }
    }

    const fn to_wire(self) -> u32 {
        self as u32
    }

    fn from_wire(value: u32) -> Self {
        num_traits::FromPrimitive::from_u32(value).unwrap_or(Self::Other)
    }
}

/// One entry of a listing. `size` is only meaningful for non-directories
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: DirentKind,
    pub size: u64,
    pub time: DateTime<Utc>,
}

impl DirEntry {
    /// Directory entry with default size and time
    pub fn directory<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            kind: DirentKind::Dir,
            ..Default::default()
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == DirentKind::Dir
    }

    /// Formats the entry as a tab separated listing line without the newline
    pub fn long_format(&self) -> String {
        let time = self.time.format("%Y-%m-%d %H:%M:%S %Z");

        if self.is_dir() {
            format!("{time}\t<{}>\t\t{}", self.kind.tag(), self.name)
        } else {
            format!("{time}\t{}\t{}\t{}", self.kind.tag(), self.size, self.name)
        }
    }

    pub(crate) fn put(&self, bytes: &mut BytesMut) {
        bytes.put_str(&self.name);
        bytes.put_u32(self.kind.to_wire());
        bytes.put_u64(self.size);
        bytes.put_i64(utils::unix(self.time));
    }
}

impl TryFrom<&mut Bytes> for DirEntry {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        Ok(Self {
            name: bytes.try_get_string()?,
            kind: DirentKind::from_wire(bytes.try_get_u32()?),
            size: bytes.try_get_u64()?,
            time: utils::from_unix(bytes.try_get_i64()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_line_has_no_size() {
        let entry = DirEntry::directory("bob");
        assert_eq!(
            entry.long_format(),
            "1970-01-01 00:00:00 UTC\t<DIR>\t\tbob"
        );
    }

    #[test]
    fn file_line_has_size() {
        let entry = DirEntry {
            name: "notes.txt".to_owned(),
            kind: DirentKind::File,
            size: 42,
            time: utils::from_unix(86_400),
        };
        assert_eq!(
            entry.long_format(),
            "1970-01-02 00:00:00 UTC\tFILE\t42\tnotes.txt"
        );
    }

    #[test]
    fn unknown_kind_decodes_as_other() {
        let mut buf = BytesMut::new();
        buf.put_str("fifo");
        buf.put_u32(77);
        buf.put_u64(0);
        buf.put_i64(0);

        let entry = DirEntry::try_from(&mut buf.freeze()).ok();
        assert_eq!(entry.map(|e| e.kind), Some(DirentKind::Other));
    }

    #[test]
    fn kinds_keep_their_wire_value() {
        let kinds = [
            DirentKind::File,
            DirentKind::Dir,
            DirentKind::Symlink,
            DirentKind::Exec,
            DirentKind::Other,
        ];

        for (value, kind) in (0..).zip(kinds) {
            assert_eq!(kind.to_wire(), value);
            assert_eq!(DirentKind::from_wire(value), kind);
        }
    }

    #[test]
    fn entry_serializes_with_lowercase_kind() -> anyhow::Result<()> {
        let entry = DirEntry {
            name: "src".to_owned(),
            kind: DirentKind::Dir,
            size: 0,
            time: utils::from_unix(86_400),
        };

        let json = serde_json::to_string(&entry)?;
        assert!(json.contains(r#""kind":"dir""#), "{json}");

        let back: DirEntry = serde_json::from_str(&json)?;
        assert_eq!(back, entry);
        Ok(())
    }

    #[test]
    fn unknown_kind_name_is_rejected() {
        let json = r#"{"name":"x","kind":"socket","size":0,"time":"1970-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<DirEntry>(json).is_err());
    }
}
