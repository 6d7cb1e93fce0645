// Output file naming: "{serial}_{shortTitle}.{ext}"
//
// The serial is recomputed from the destination directory on every call,
// so two calls without a write in between return the same name.

use std::io;
use std::path::Path;

pub const MAX_FILENAME_LEN: usize = 200;
const SHORT_TITLE_LEN: usize = 20;
const HASH_LEN: usize = 8;

pub struct OutputNamer;

impl OutputNamer {
    /// Next collision-free name for `title` given the current directory listing.
    pub fn next_name<S: AsRef<str>>(title: &str, extension: &str, listing: &[S]) -> String {
        let serial = Self::next_serial(listing);
        let candidate = format!("{}_{}.{}", serial, Self::short_title(title), extension);
        truncate_filename(&candidate, MAX_FILENAME_LEN)
    }

    /// Same as [`next_name`](Self::next_name), scanning `dir` itself.
    /// A missing directory counts as empty.
    pub fn next_name_in(title: &str, extension: &str, dir: &Path) -> io::Result<String> {
        let listing = list_dir(dir)?;
        Ok(Self::next_name(title, extension, &listing))
    }

    /// 1 + the highest numeric prefix before the first `_`.
    pub fn next_serial<S: AsRef<str>>(listing: &[S]) -> u64 {
        listing
            .iter()
            .filter_map(|name| serial_of(name.as_ref()))
            .max()
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// First 20 characters, spaces to `_`, `:` and `/` dropped.
    pub fn short_title(title: &str) -> String {
        title
            .chars()
            .take(SHORT_TITLE_LEN)
            .filter(|c| *c != ':' && *c != '/')
            .map(|c| if c == ' ' { '_' } else { c })
            .collect()
    }

    /// "{title}_merged.mp4", with path separators removed.
    pub fn merged_name(title: &str) -> String {
        let safe: String = title
            .chars()
            .filter(|c| *c != '/' && *c != '\\')
            .collect();
        truncate_filename(&format!("{}_merged.mp4", safe), MAX_FILENAME_LEN)
    }
}

fn serial_of(filename: &str) -> Option<u64> {
    let (prefix, _) = filename.split_once('_')?;
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Cap `filename` at `max_len` characters. Over-long names keep their
/// extension and get an 8-hex md5 of the untruncated stem appended, so the
/// same input always yields the same output.
pub fn truncate_filename(filename: &str, max_len: usize) -> String {
    if filename.chars().count() <= max_len {
        return filename.to_string();
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    };

    let digest = format!("{:x}", md5::compute(stem.as_bytes()));
    let hash = &digest[..HASH_LEN];
    let keep = max_len.saturating_sub(ext.chars().count() + HASH_LEN + 1);
    let head: String = stem.chars().take(keep).collect();

    let name = format!("{}_{}{}", head, hash, ext);
    // Only an absurdly long extension can still overflow here
    name.chars().take(max_len).collect()
}

/// Names of the entries in `dir`; empty when it does not exist yet.
pub fn list_dir(dir: &Path) -> io::Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_ignores_non_numeric_prefixes() {
        let listing = ["3_a.mp4", "7_b.m4a", "x_c.mp4"];
        assert_eq!(OutputNamer::next_serial(&listing), 8);
    }

    #[test]
    fn test_serial_edge_cases() {
        let empty: [&str; 0] = [];
        assert_eq!(OutputNamer::next_serial(&empty), 1);
        assert_eq!(OutputNamer::next_serial(&["12abc_x.mp4", "5.mp4", "_1.mp4", "notes.txt"]), 1);
        assert_eq!(OutputNamer::next_serial(&["0009_a_b.mp4"]), 10);
        assert_eq!(OutputNamer::next_serial(&["99999999999999999999999_a.mp4", "2_b.mp4"]), 3);
    }

    #[test]
    fn test_first_name_in_empty_dir() {
        let empty: [&str; 0] = [];
        assert_eq!(
            OutputNamer::next_name("My Amazing Video Clip", "mp4", &empty),
            "1_My_Amazing_Video_Cli.mp4"
        );
    }

    #[test]
    fn test_short_title_drops_separators() {
        assert_eq!(OutputNamer::short_title("a: b/c"), "a_bc");
        assert_eq!(OutputNamer::short_title(""), "");
        assert_eq!(
            OutputNamer::short_title("日本語のタイトルはとても長いのでここで切られます"),
            "日本語のタイトルはとても長いのでここで切"
        );
    }

    #[test]
    fn test_empty_title_is_accepted() {
        assert_eq!(OutputNamer::next_name("", "m4a", &["4_x.mp4"]), "5_.m4a");
    }

    #[test]
    fn test_truncation_keeps_extension_and_hash() {
        let long = format!("{}.mp4", "a".repeat(300));
        let out = truncate_filename(&long, MAX_FILENAME_LEN);

        assert_eq!(out.chars().count(), MAX_FILENAME_LEN);
        assert!(out.ends_with(".mp4"));
        let hash = &format!("{:x}", md5::compute("a".repeat(300).as_bytes()))[..8];
        assert!(out.ends_with(&format!("_{}.mp4", hash)));
        assert_eq!(out, truncate_filename(&long, MAX_FILENAME_LEN));
    }

    #[test]
    fn test_short_names_untouched() {
        assert_eq!(truncate_filename("1_clip.mp4", MAX_FILENAME_LEN), "1_clip.mp4");
    }

    #[test]
    fn test_merged_name() {
        assert_eq!(OutputNamer::merged_name("My Clip"), "My Clip_merged.mp4");
        assert_eq!(OutputNamer::merged_name("AC/DC live"), "ACDC live_merged.mp4");
        assert!(OutputNamer::merged_name(&"x".repeat(500)).chars().count() <= MAX_FILENAME_LEN);
    }

    #[test]
    fn test_name_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2_old.mp4"), b"").unwrap();

        let first = OutputNamer::next_name_in("new clip", "mp4", dir.path()).unwrap();
        let again = OutputNamer::next_name_in("new clip", "mp4", dir.path()).unwrap();
        assert_eq!(first, "3_new_clip.mp4");
        assert_eq!(first, again);

        std::fs::write(dir.path().join(&first), b"").unwrap();
        assert_eq!(
            OutputNamer::next_name_in("new clip", "mp4", dir.path()).unwrap(),
            "4_new_clip.mp4"
        );

        let missing = dir.path().join("not-there");
        assert_eq!(OutputNamer::next_name_in("a", "mp4", &missing).unwrap(), "1_a.mp4");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn names_never_exceed_limit(
                title in ".{0,300}",
                ext in "[a-z0-9]{1,180}",
                serials in proptest::collection::vec(0u64..1_000_000, 0..10),
            ) {
                let listing: Vec<String> = serials.iter().map(|s| format!("{}_x.mp4", s)).collect();
                let name = OutputNamer::next_name(&title, &ext, &listing);
                prop_assert!(name.chars().count() <= MAX_FILENAME_LEN);
                prop_assert_eq!(name, OutputNamer::next_name(&title, &ext, &listing));
            }

            #[test]
            fn serial_never_decreases_when_files_are_added(
                serials in proptest::collection::vec(0u64..1_000, 0..10),
                extra in "[a-z0-9_]{1,12}",
            ) {
                let mut listing: Vec<String> =
                    serials.iter().map(|s| format!("{}_x.mp4", s)).collect();
                let before = OutputNamer::next_serial(&listing);
                listing.push(extra);
                prop_assert!(OutputNamer::next_serial(&listing) >= before);
            }
        }
    }
}
