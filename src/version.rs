//! Distribution-neutral version parsing, comparison, and native translation.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{BuzzyError, Result};

/// The kind of a version part, ordered `PRERELEASE < FINAL < POSTRELEASE < RELEASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartKind {
    /// A `~tag` part, e.g. `~alpha1`.
    Prerelease,
    /// The synthetic terminator appended to every parsed version.
    Final,
    /// A `+tag` part, e.g. `+dev4`.
    Postrelease,
    /// A `.tag` part, e.g. the leading part or any `.N` segment.
    Release,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prerelease => "prerelease",
            Self::Final => "final",
            Self::Postrelease => "postrelease",
            Self::Release => "release",
        };
        write!(f, "{name}")
    }
}

/// A single part of a version: a kind plus its textual (and, if integral, numeric) value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionPart {
    pub kind: PartKind,
    /// `Some(n)` iff the textual value is a non-empty digit run.
    pub int_value: Option<u64>,
    pub text: String,
}

impl VersionPart {
    fn new(kind: PartKind, text: &str) -> Self {
        let int_value = if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            text.parse::<u64>().ok()
        } else {
            None
        };
        Self {
            kind,
            int_value,
            text: text.to_string(),
        }
    }

    fn is_integral(&self) -> bool {
        self.int_value.is_some()
    }

    /// Render this part with its leading separator, as in the canonical string form.
    fn to_canonical(&self, dest: &mut String) {
        match self.kind {
            PartKind::Release => dest.push('.'),
            PartKind::Prerelease => dest.push('~'),
            PartKind::Postrelease => dest.push('+'),
            PartKind::Final => return,
        }
        dest.push_str(&self.text);
    }
}

/// A distribution-neutral version: an ordered sequence of parts.
///
/// Invariants: the sequence begins with a `Release` part, and a synthetic
/// `Final` terminator is always appended.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<VersionPart>,
    compare_parts: Vec<VersionPart>,
    original: String,
}

impl Version {
    /// Parse a version string per the grammar in §4.1: alphanumerics separated
    /// by `.` (release), `~` (prerelease), `+` (postrelease).
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(BuzzyError::invalid_version(format!("Invalid version \"{s}\"")));
        }

        let mut parts = Vec::new();
        let mut kind = PartKind::Release;
        let mut part_start = 0usize;
        let bytes = s.as_bytes();

        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'.' | b'~' | b'+' => {
                    if i == part_start {
                        return Err(BuzzyError::invalid_version(format!("Invalid version {s}")));
                    }
                    parts.push(VersionPart::new(kind, &s[part_start..i]));
                    kind = match b {
                        b'.' => PartKind::Release,
                        b'~' => PartKind::Prerelease,
                        b'+' => PartKind::Postrelease,
                        _ => unreachable!(),
                    };
                    part_start = i + 1;
                }
                _ => {}
            }
        }
        if part_start == bytes.len() {
            return Err(BuzzyError::invalid_version(format!("Invalid version {s}")));
        }
        parts.push(VersionPart::new(kind, &s[part_start..]));
        parts.push(VersionPart::new(PartKind::Final, ""));

        let compare_parts = Self::compute_compare_parts(&parts);
        Ok(Self {
            parts,
            compare_parts,
            original: s.to_string(),
        })
    }

    /// Elide trailing runs of zero-valued `Release` parts not followed by a
    /// non-zero `Release` part, per the invariant in §3.
    fn compute_compare_parts(parts: &[VersionPart]) -> Vec<VersionPart> {
        let mut out = Vec::with_capacity(parts.len());
        let mut pending_zeros: Vec<&VersionPart> = Vec::new();
        for part in parts {
            if part.kind == PartKind::Release {
                if part.int_value == Some(0) {
                    pending_zeros.push(part);
                } else {
                    out.extend(pending_zeros.drain(..).cloned());
                    out.push(part.clone());
                }
            } else {
                pending_zeros.clear();
                out.push(part.clone());
            }
        }
        out
    }

    /// The original string as parsed.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// All parts, including the synthetic `Final` terminator.
    pub fn parts(&self) -> &[VersionPart] {
        &self.parts
    }

    fn compare_parts(&self) -> &[VersionPart] {
        &self.compare_parts
    }

    /// Compare two versions per the total order in §4.1. Fails if a kind
    /// matches but one side is integral and the other isn't.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering> {
        let a = self.compare_parts();
        let b = other.compare_parts();
        let min_len = a.len().min(b.len());

        for i in 0..min_len {
            let (pa, pb) = (&a[i], &b[i]);
            match pa.kind.cmp(&pb.kind) {
                Ordering::Equal => {}
                other => return Ok(other),
            }
            match (pa.is_integral(), pb.is_integral()) {
                (true, true) => match pa.int_value.cmp(&pb.int_value) {
                    Ordering::Equal => {}
                    other => return Ok(other),
                },
                (false, false) => match pa.text.cmp(&pb.text) {
                    Ordering::Equal => {}
                    other => return Ok(other),
                },
                _ => {
                    return Err(BuzzyError::invalid_version(format!(
                        "Cannot compare {} to {}",
                        self.original, other.original
                    )))
                }
            }
        }
        Ok(a.len().cmp(&b.len()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare_parts() == other.compare_parts()
    }
}
impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

/// Native-format translation, per §4.1.
impl Version {
    /// Render in pacman's version format.
    pub fn to_pacman(&self) -> String {
        let mut out = String::new();
        let real: Vec<&VersionPart> = self
            .parts
            .iter()
            .filter(|p| p.kind != PartKind::Final)
            .collect();
        let last_idx = real.len().saturating_sub(1);
        for (i, part) in real.iter().enumerate() {
            match part.kind {
                PartKind::Release => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(&part.text);
                }
                PartKind::Prerelease => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    let starts_digit = part.text.as_bytes().first().is_some_and(u8::is_ascii_digit);
                    if starts_digit {
                        out.push_str("pre");
                    }
                    out.push_str(&part.text);
                }
                PartKind::Postrelease => {
                    if i == last_idx {
                        if let Some(rest) = part.text.strip_prefix("rev") {
                            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                                if rest != "1" {
                                    out.push('-');
                                    out.push_str(rest);
                                }
                                continue;
                            }
                        }
                    }
                    let starts_digit = part.text.as_bytes().first().is_some_and(u8::is_ascii_digit);
                    out.push_str(if starts_digit { ".post" } else { "." });
                    out.push_str(&part.text);
                }
                PartKind::Final => {}
            }
        }
        out
    }

    /// Parse a pacman-format version string back into a `Version`. Strips a
    /// trailing `-N` pkgrel suffix (pacman's own build counter, not part of
    /// this grammar) before reparsing.
    pub fn from_pacman(s: &str) -> Result<Self> {
        let without_pkgrel = match s.rfind('-') {
            Some(idx) if s[idx + 1..].bytes().all(|b| b.is_ascii_digit()) && idx + 1 < s.len() => {
                &s[..idx]
            }
            _ => s,
        };
        Self::parse(without_pkgrel)
    }

    /// Render in Debian's version format (no epoch prefix; see `to_debian_full`).
    pub fn to_debian(&self) -> String {
        let mut out = String::new();
        let mut have_release = false;
        let mut need_punct = false;
        for part in self.parts.iter().filter(|p| p.kind != PartKind::Final) {
            match part.kind {
                PartKind::Release => {
                    let starts_digit = part.text.as_bytes().first().is_some_and(u8::is_ascii_digit);
                    if need_punct || !starts_digit {
                        out.push('.');
                    }
                    out.push_str(&part.text);
                    need_punct = true;
                }
                PartKind::Prerelease => {
                    out.push('~');
                    out.push_str(&part.text);
                    need_punct = false;
                }
                PartKind::Postrelease => {
                    if part.text == "rev" && !have_release {
                        have_release = true;
                        need_punct = false;
                        out.push('-');
                    } else {
                        out.push('+');
                        out.push_str(&part.text);
                        need_punct = false;
                    }
                }
                PartKind::Final => {}
            }
        }
        out
    }

    /// Render with an optional Debian epoch prefix (`epoch:version`).
    pub fn to_debian_full(&self, epoch: Option<u64>) -> String {
        match epoch {
            Some(e) => format!("{e}:{}", self.to_debian()),
            None => self.to_debian(),
        }
    }

    /// Parse a Debian-format version string (optionally epoch-prefixed).
    pub fn from_debian(s: &str) -> Result<(Self, Option<u64>)> {
        let (epoch, rest) = match s.split_once(':') {
            Some((e, rest)) if e.bytes().all(|b| b.is_ascii_digit()) && !e.is_empty() => {
                (Some(e.parse().unwrap_or(0)), rest)
            }
            _ => (None, s),
        };
        // Translate Debian punctuation back into our grammar: `~` stays, a
        // bare `-` becomes `+rev`, `+` stays.
        let mut buzzy = String::new();
        let mut chars = rest.char_indices().peekable();
        let mut first = true;
        while let Some((_, ch)) = chars.next() {
            match ch {
                '~' => buzzy.push('~'),
                '+' => buzzy.push('+'),
                '-' => {
                    buzzy.push_str("+rev");
                }
                _ => {
                    if first && buzzy.is_empty() {
                        buzzy.push('.');
                    }
                    buzzy.push(ch);
                }
            }
            first = false;
        }
        let v = Self::parse(buzzy.trim_start_matches('.'))
            .or_else(|_| Self::parse(rest))
            .map_err(|_| BuzzyError::invalid_version(format!("Invalid Debian version {s}")))?;
        Ok((v, epoch))
    }

    /// Render RPM's `Version` and `Release` fields, per the algorithm in §4.1.
    pub fn to_rpm(&self) -> (String, String) {
        let mut version = String::new();
        let mut release = String::new();
        let mut seen_non_release = false;
        let mut need_punct = false;

        for part in self.parts.iter().filter(|p| p.kind != PartKind::Final) {
            match part.kind {
                PartKind::Release if !seen_non_release => {
                    if need_punct {
                        version.push('.');
                    }
                    version.push_str(&part.text);
                    need_punct = true;
                }
                PartKind::Release => {
                    release.push_str(".1.");
                    release.push_str(&part.text);
                }
                PartKind::Prerelease => {
                    let starts_digit = part.text.as_bytes().first().is_some_and(u8::is_ascii_digit);
                    if !seen_non_release {
                        release.push_str("-0.");
                        seen_non_release = true;
                    } else {
                        release.push_str(".0.");
                    }
                    if !starts_digit {
                        release.push_str("pre");
                    }
                    release.push_str(&part.text);
                }
                PartKind::Postrelease => {
                    let starts_digit = part.text.as_bytes().first().is_some_and(u8::is_ascii_digit);
                    if !seen_non_release {
                        release.push_str("-2.");
                        seen_non_release = true;
                    } else {
                        release.push_str(".2.");
                    }
                    if !starts_digit {
                        release.push_str("post");
                    }
                    release.push_str(&part.text);
                }
                PartKind::Final => {}
            }
        }

        if seen_non_release {
            release.push_str(".1");
        } else {
            release.push_str("-1");
        }
        // `release` always picks up a leading separator from whichever arm
        // opened it (`-0.`/`-2.` above, or the bare `-1` fallback); the
        // Release field itself has no such separator, so drop it here
        // rather than leaking it into `Release: -1`.
        let release = release.trim_start_matches(['-', '.']).to_string();
        (version, release)
    }

    /// Parse RPM's `Version`-`Release` pair back into a `Version`. Fails
    /// (`InvalidVersion`) if the pair doesn't round-trip to an equivalent
    /// comparison sequence, per Open Question (a).
    pub fn from_rpm(version: &str, release: &str) -> Result<Self> {
        // The release field always ends in a bare numeric revision segment
        // (`-1` or `.1`) that carries no version information; strip it.
        let trimmed = release
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .trim_end_matches(['-', '.']);
        let mut buzzy = version.to_string();
        for seg in trimmed.split(['-', '.']).filter(|s| !s.is_empty()) {
            if let Some(rest) = seg.strip_prefix("0.") {
                buzzy.push('~');
                buzzy.push_str(rest.trim_start_matches("pre"));
            } else if let Some(rest) = seg.strip_prefix("2.") {
                buzzy.push('+');
                buzzy.push_str(rest.trim_start_matches("post"));
            } else if seg == "0" || seg == "1" || seg == "2" {
                // bare separator counters from the release-segment scheme
            } else {
                buzzy.push('.');
                buzzy.push_str(seg);
            }
        }
        Self::parse(&buzzy)
    }

    /// Parse the output of `git describe --tags [--dirty]`. Strips a
    /// letters/`v`/`pkgname-` tag prefix, then reads the `-n-g<hash>` trailer
    /// and any development-tag words (`dev`, `devel` become postrelease
    /// tags; `pre<N>` and any other word become prerelease tags) into our
    /// `+`/`~`-separated grammar. A trailing `-dirty` is preserved verbatim
    /// as a display suffix; it carries no ordering weight.
    pub fn from_git_describe(git_describe: &str) -> Result<Self> {
        let (core, dirty) = match git_describe.strip_suffix("-dirty") {
            Some(rest) => (rest, true),
            None => (git_describe, false),
        };

        let start = core.find(|c: char| c.is_ascii_digit()).ok_or_else(|| {
            BuzzyError::invalid_version(format!("Invalid git describe output {git_describe}"))
        })?;
        let rest = &core[start..];

        let (release_part, mut tail) = match rest.find('-') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let mut buzzy = release_part.to_string();

        while !tail.is_empty() {
            tail = tail.trim_start_matches('-');
            if tail.is_empty() {
                break;
            }

            if let Some(hex) = tail.strip_prefix('g') {
                let hex_len = hex.bytes().take_while(u8::is_ascii_hexdigit).count();
                if hex_len > 0 {
                    buzzy.push_str("+git");
                    buzzy.push_str(&hex[..hex_len]);
                    tail = &hex[hex_len..];
                    continue;
                }
            }

            if tail.as_bytes()[0].is_ascii_digit() {
                let len = tail.bytes().take_while(u8::is_ascii_digit).count();
                buzzy.push('+');
                buzzy.push_str(&tail[..len]);
                tail = &tail[len..];
                continue;
            }

            let word_len = tail.bytes().take_while(u8::is_ascii_alphabetic).count();
            let word = &tail[..word_len];
            let mut after = &tail[word_len..];
            let mut digit_len = after.bytes().take_while(u8::is_ascii_digit).count();
            if digit_len == 0 {
                if let Some(maybe_digits) = after.strip_prefix('-') {
                    let len = maybe_digits.bytes().take_while(u8::is_ascii_digit).count();
                    if len > 0 {
                        after = maybe_digits;
                        digit_len = len;
                    }
                }
            }
            let digits = &after[..digit_len];
            tail = &after[digit_len..];

            if word == "pre" && !digits.is_empty() {
                buzzy.push('~');
                buzzy.push_str(digits);
            } else if word == "dev" || word == "devel" {
                buzzy.push('+');
                buzzy.push_str(word);
                buzzy.push_str(digits);
            } else {
                buzzy.push('~');
                buzzy.push_str(word);
                buzzy.push_str(digits);
            }
        }

        let mut version = Self::parse(&buzzy)?;
        if dirty {
            version.original.push_str("-dirty");
        }
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let v = Version::parse("2.0.1").unwrap();
        assert_eq!(v.parts().len(), 4); // 3 release + final
    }

    #[test]
    fn round_trip_via_display() {
        let v = Version::parse("1.2~alpha3+dev4").unwrap();
        assert_eq!(v.to_string(), "1.2~alpha3+dev4");
        let reparsed = Version::parse(&v.to_string()).unwrap();
        assert_eq!(v, reparsed);
    }

    #[test]
    fn compare_elides_trailing_zero_release() {
        let a = Version::parse("2.0").unwrap();
        let b = Version::parse("2.0.0").unwrap();
        assert_eq!(a.try_cmp(&b).unwrap(), Ordering::Equal);
    }

    #[test]
    fn compare_prerelease_less_than_final() {
        let a = Version::parse("2.0~alpha").unwrap();
        let b = Version::parse("2.0").unwrap();
        assert_eq!(a.try_cmp(&b).unwrap(), Ordering::Less);
    }

    #[test]
    fn compare_postrelease_greater() {
        let a = Version::parse("2.0+dev").unwrap();
        let b = Version::parse("2.0.1").unwrap();
        assert_eq!(a.try_cmp(&b).unwrap(), Ordering::Less);
    }

    #[test]
    fn kind_ordering_total() {
        let pre = Version::parse("1~a").unwrap();
        let fin = Version::parse("1").unwrap();
        let post = Version::parse("1+a").unwrap();
        let rel = Version::parse("1.2").unwrap();
        assert!(pre < fin);
        assert!(fin < post);
        assert!(post < rel);
    }

    #[test]
    fn mixed_kind_comparison_errors() {
        let a = Version::parse("1.abc").unwrap();
        let b = Version::parse("1.2").unwrap();
        assert!(a.try_cmp(&b).is_err());
    }

    #[test]
    fn pacman_rev_tag() {
        let v = Version::parse("1.0+rev2").unwrap();
        assert_eq!(v.to_pacman(), "1.0-2");
        let v1 = Version::parse("1.0+rev1").unwrap();
        assert_eq!(v1.to_pacman(), "1.0");
    }

    #[test]
    fn from_pacman_strips_pkgrel_suffix() {
        let v = Version::from_pacman("2.5-1").unwrap();
        assert_eq!(v.to_string(), "2.5");
        // a trailing non-digit token isn't a pkgrel suffix, so it stays.
        let v2 = Version::from_pacman("2.5-beta").unwrap();
        assert_eq!(v2.to_string(), "2.5-beta");
    }

    #[test]
    fn pacman_prerelease_digit_prefix() {
        let v = Version::parse("1.0~1").unwrap();
        assert_eq!(v.to_pacman(), "1.0.pre1");
    }

    #[test]
    fn debian_rev_tag_is_revision_separator() {
        // Debian's "rev" marker is its own bare postrelease tag; the
        // revision number itself comes from the release part that follows.
        let v = Version::parse("2.4+rev.1").unwrap();
        assert_eq!(v.to_debian(), "2.4-1");
    }

    #[test]
    fn debian_preserves_tilde() {
        let v = Version::parse("2.5~alpha.1").unwrap();
        assert_eq!(v.to_debian(), "2.5~alpha1");
    }

    #[test]
    fn rpm_split_pure_release() {
        let v = Version::parse("2.4").unwrap();
        let (version, release) = v.to_rpm();
        assert_eq!(version, "2.4");
        assert_eq!(release, "1");
    }

    #[test]
    fn rpm_split_with_prerelease() {
        let v = Version::parse("2.4~alpha1").unwrap();
        let (version, release) = v.to_rpm();
        assert_eq!(version, "2.4");
        assert_eq!(release, "0.prealpha1.1");
    }

    #[test]
    fn git_describe_basic() {
        let v = Version::from_git_describe("test-pkg-1.0-dev-4-g1a2b3c4").unwrap();
        assert_eq!(v.to_string(), "1.0+dev4+git1a2b3c4");
    }

    #[test]
    fn git_describe_numeric_trailer() {
        let v = Version::from_git_describe("v1.0-4-g1a2b3c4").unwrap();
        assert_eq!(v.to_string(), "1.0+4+git1a2b3c4");
    }

    #[test]
    fn git_describe_prerelease_word() {
        let v = Version::from_git_describe("1.0--beta1").unwrap();
        assert_eq!(v.to_string(), "1.0~beta1");
    }

    #[test]
    fn git_describe_pre_prefix_stripped() {
        let v = Version::from_git_describe("1.0-pre1").unwrap();
        assert_eq!(v.to_string(), "1.0~1");
    }

    #[test]
    fn git_describe_dirty_suffix() {
        let v = Version::from_git_describe("1.0-dirty").unwrap();
        assert_eq!(v.to_string(), "1.0-dirty");
    }
}
