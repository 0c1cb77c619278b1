//! # Archive Entries
//!
//! Metadata for a single record of a ZIP container, as seen by the extractor.
//!
//! Older archiving tools store non-ASCII names in a regional code page and do
//! not set the UTF-8 flag (general purpose bit 11). The `zip` crate decodes
//! such names as CP437, which is wrong for archives produced on Chinese
//! systems; [`EntryName`] re-decodes them as GB18030 and records how the name
//! was obtained.

use std::fmt;

use encoding_rs::GB18030;
use zip::read::ZipFile;

/// An entry name together with the way it was decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryName {
    /// Stored as UTF-8 (flag set) or plain ASCII; used as-is.
    Standard(String),
    /// Stored without the UTF-8 flag and decoded cleanly as GB18030.
    Legacy(String),
    /// Stored without the UTF-8 flag, but GB18030 decoding hit malformed
    /// sequences. Holds the lossy result with replacement characters.
    Garbled(String),
}

impl EntryName {
    /// Classifies a name given the library-decoded form and the raw bytes.
    ///
    /// Both forms are byte-identical only when the flag was set on valid UTF-8
    /// or the name is pure ASCII. Any mismatch means the name was not
    /// stored as standard UTF-8.
    ///
    /// The flag itself is not consulted. A name that carries the UTF-8 flag
    /// but holds invalid UTF-8 is lossily decoded by the container library,
    /// no longer matches its raw bytes and is therefore decoded as GB18030
    /// like an unflagged name.
    pub fn classify(decoded: &str, raw: &[u8]) -> Self {
        if decoded.as_bytes() == raw {
            EntryName::Standard(decoded.to_owned())
        } else {
            Self::decode_legacy(raw)
        }
    }

    /// Decodes raw name bytes as GB18030. Never fails.
    pub fn decode_legacy(raw: &[u8]) -> Self {
        let (name, had_errors) = GB18030.decode_without_bom_handling(raw);
        if had_errors {
            EntryName::Garbled(name.into_owned())
        } else {
            EntryName::Legacy(name.into_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntryName::Standard(name) | EntryName::Legacy(name) | EntryName::Garbled(name) => name,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            EntryName::Standard(name) | EntryName::Legacy(name) | EntryName::Garbled(name) => name,
        }
    }

    /// True when the name did not carry the standard encoding.
    pub fn is_legacy(&self) -> bool {
        !matches!(self, EntryName::Standard(_))
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a single entry (file or directory) read from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// The name of the entry, relative to the archive root.
    pub name: EntryName,
    /// True if this entry represents a directory.
    pub is_dir: bool,
    /// The Unix-style mode of the entry, if the archive records one.
    pub mode: Option<u32>,
    /// The uncompressed size. Zero for directories.
    pub size: u64,
}

impl ArchiveEntry {
    /// Reads the entry metadata, re-decoding legacy names as GB18030.
    pub fn decoded(file: &ZipFile<'_>) -> Self {
        Self::with_name(file, EntryName::classify(file.name(), file.name_raw()))
    }

    /// Reads the entry metadata, keeping the name exactly as the `zip` crate
    /// decoded it.
    pub fn undecoded(file: &ZipFile<'_>) -> Self {
        Self::with_name(file, EntryName::Standard(file.name().to_owned()))
    }

    fn with_name(file: &ZipFile<'_>, name: EntryName) -> Self {
        Self {
            name,
            is_dir: file.is_dir(),
            mode: file.unix_mode(),
            size: file.size(),
        }
    }

    /// Permission bits to apply when the entry is written out.
    pub fn permission_bits(&self, default: u32) -> u32 {
        self.mode.map(|mode| mode & 0o7777).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_are_standard() {
        let name = EntryName::classify("/docs/readme.md", b"/docs/readme.md");
        assert_eq!(name, EntryName::Standard("/docs/readme.md".into()));
        assert!(!name.is_legacy());
    }

    #[test]
    fn utf8_flagged_names_are_standard() {
        let raw = "报告/总结.txt".as_bytes();
        let name = EntryName::classify("报告/总结.txt", raw);
        assert_eq!(name.as_str(), "报告/总结.txt");
        assert!(!name.is_legacy());
    }

    #[test]
    fn gb18030_names_are_redecoded() {
        let (raw, _, _) = GB18030.encode("中文/说明.txt");
        // What the container library produces when the UTF-8 flag is unset.
        let cp437_guess: String = raw.iter().map(|&b| b as char).collect();
        let name = EntryName::classify(&cp437_guess, &raw);
        assert_eq!(name, EntryName::Legacy("中文/说明.txt".into()));
        assert!(name.is_legacy());
    }

    #[test]
    fn flagged_invalid_utf8_is_decoded_as_gb18030() {
        let raw = [0xd6, 0xd0, b'.', b't', b'x', b't'];
        // The container library decodes flagged names lossily.
        let lossy = String::from_utf8_lossy(&raw);
        let name = EntryName::classify(&lossy, &raw);
        assert_eq!(name, EntryName::Legacy("中.txt".into()));
    }

    #[test]
    fn malformed_bytes_fall_back_to_lossy_name() {
        let raw = [0x81, 0x30, b'.', b't', b'x', b't'];
        let name = EntryName::decode_legacy(&raw);
        match &name {
            EntryName::Garbled(text) => {
                assert!(text.contains('\u{FFFD}'));
                assert!(text.ends_with("txt"));
            }
            other => panic!("expected a garbled name, got {other:?}"),
        }
        assert_eq!(name.to_string(), name.clone().into_string());
    }

    #[test]
    fn permission_bits_strip_file_type() {
        let entry = ArchiveEntry {
            name: EntryName::Standard("a".into()),
            is_dir: false,
            mode: Some(0o100755),
            size: 1,
        };
        assert_eq!(entry.permission_bits(0o644), 0o755);

        let bare = ArchiveEntry { mode: None, ..entry };
        assert_eq!(bare.permission_bits(0o644), 0o644);
    }
}
