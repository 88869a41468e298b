// src/edition.rs

//! Editions (`[epoch:]version[-release]`) and capabilities (`NAME[OP EDITION]`)
//!
//! Used when marking resolvables by capability (`install -C`) and when
//! deciding whether an available resolvable updates an installed one.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// A parsed RPM edition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edition {
    pub epoch: u64,
    pub version: String,
    pub release: Option<String>,
}

impl Edition {
    /// Parse `[epoch:]version[-release]`
    ///
    /// - "1.2.3" → epoch=0, version="1.2.3", release=None
    /// - "1:2.3.4-5.1" → epoch=1, version="2.3.4", release=Some("5.1")
    pub fn parse(s: &str) -> Result<Self> {
        let (epoch, rest) = match s.split_once(':') {
            Some(("", rest)) => (0, rest),
            Some((e, rest)) => {
                let epoch = e
                    .parse::<u64>()
                    .map_err(|_| Error::InvalidEdition(s.to_string()))?;
                (epoch, rest)
            }
            None => (0, s),
        };

        let (version, release) = match rest.rsplit_once('-') {
            Some((v, r)) => (v.to_string(), Some(r.to_string())),
            None => (rest.to_string(), None),
        };

        if version.is_empty() {
            return Err(Error::InvalidEdition(s.to_string()));
        }

        Ok(Self {
            epoch,
            version,
            release,
        })
    }

    /// Compare two editions; a missing release on either side matches any release
    pub fn compare(&self, other: &Edition) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| vercmp(&self.version, &other.version))
            .then_with(|| match (&self.release, &other.release) {
                (Some(a), Some(b)) => vercmp(a, b),
                _ => Ordering::Equal,
            })
    }
}

/// rpm's segment-wise version comparison
///
/// Strings are split into alternating numeric and alphabetic segments,
/// separators are ignored, numeric segments compare numerically and are
/// newer than alphabetic ones, `~` sorts before everything.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a.as_bytes(), b.as_bytes());

    loop {
        a = trim_separators(a);
        b = trim_separators(b);

        match (a.first(), b.first()) {
            (Some(b'~'), Some(b'~')) => {
                a = &a[1..];
                b = &b[1..];
                continue;
            }
            (Some(b'~'), _) => return Ordering::Less,
            (_, Some(b'~')) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            _ => {}
        }

        let numeric = a[0].is_ascii_digit();
        let (seg_a, rest_a) = take_segment(a, numeric);
        let (seg_b, rest_b) = take_segment(b, numeric);

        if seg_b.is_empty() {
            // different segment types: numeric is newer
            return if numeric { Ordering::Greater } else { Ordering::Less };
        }

        let ord = if numeric {
            let sa = strip_zeros(seg_a);
            let sb = strip_zeros(seg_b);
            sa.len().cmp(&sb.len()).then_with(|| sa.cmp(sb))
        } else {
            seg_a.cmp(seg_b)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        a = rest_a;
        b = rest_b;
    }
}

fn trim_separators(s: &[u8]) -> &[u8] {
    let skip = s
        .iter()
        .take_while(|c| !c.is_ascii_alphanumeric() && **c != b'~')
        .count();
    &s[skip..]
}

fn take_segment(s: &[u8], numeric: bool) -> (&[u8], &[u8]) {
    let len = s
        .iter()
        .take_while(|c| {
            if numeric {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphabetic()
            }
        })
        .count();
    s.split_at(len)
}

fn strip_zeros(s: &[u8]) -> &[u8] {
    let zeros = s.iter().take_while(|c| **c == b'0').count();
    &s[zeros..]
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(release) = &self.release {
            write!(f, "-{}", release)?;
        }
        Ok(())
    }
}

impl Ord for Edition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Edition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Relational operator of a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rel {
    Any,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Rel {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Rel::Any => true,
            Rel::Eq => ord == Ordering::Equal,
            Rel::Ne => ord != Ordering::Equal,
            Rel::Lt => ord == Ordering::Less,
            Rel::Le => ord != Ordering::Greater,
            Rel::Gt => ord == Ordering::Greater,
            Rel::Ge => ord != Ordering::Less,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Rel::Any => "",
            Rel::Eq => "=",
            Rel::Ne => "!=",
            Rel::Lt => "<",
            Rel::Le => "<=",
            Rel::Gt => ">",
            Rel::Ge => ">=",
        }
    }
}

/// `NAME[OP EDITION]` as given to `install -C` or derived from an RPM file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub rel: Rel,
    pub edition: Option<Edition>,
}

impl Capability {
    /// Parse `name`, `name>=1.0`, `name = 1.0-2` and friends
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some(op_start) = s.find(['<', '>', '=', '!']) else {
            return Ok(Self::named(s));
        };

        let name = s[..op_start].trim();
        let rest = &s[op_start..];
        let (rel, edition) = [
            (">=", Rel::Ge),
            ("<=", Rel::Le),
            ("!=", Rel::Ne),
            ("==", Rel::Eq),
            (">", Rel::Gt),
            ("<", Rel::Lt),
            ("=", Rel::Eq),
        ]
        .into_iter()
        .find_map(|(op, rel)| rest.strip_prefix(op).map(|e| (rel, e.trim())))
        .ok_or_else(|| Error::InvalidEdition(s.to_string()))?;

        if name.is_empty() {
            return Err(Error::InvalidEdition(s.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            rel,
            edition: Some(Edition::parse(edition)?),
        })
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rel: Rel::Any,
            edition: None,
        }
    }

    /// Does a resolvable with this name and edition satisfy the capability?
    pub fn matches(&self, name: &str, edition: &Edition) -> bool {
        if self.name != name {
            return false;
        }
        match &self.edition {
            Some(wanted) => self.rel.holds(edition.compare(wanted)),
            None => true,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.edition {
            Some(edition) => write!(f, "{} {} {}", self.name, self.rel.as_str(), edition),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ed(s: &str) -> Edition {
        Edition::parse(s).unwrap()
    }

    #[test]
    fn test_edition_parse_full() {
        let e = ed("1:2.3.4-5.1");
        assert_eq!(e.epoch, 1);
        assert_eq!(e.version, "2.3.4");
        assert_eq!(e.release.as_deref(), Some("5.1"));
    }

    #[test]
    fn test_edition_parse_empty_epoch() {
        let e = ed(":1.02.208-2");
        assert_eq!(e.epoch, 0);
        assert_eq!(e.version, "1.02.208");
    }

    #[test]
    fn test_edition_parse_errors() {
        assert!(Edition::parse("").is_err());
        assert!(Edition::parse("x:1.0").is_err());
        assert!(Edition::parse("-1").is_err());
    }

    #[test]
    fn test_vercmp() {
        assert_eq!(vercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(vercmp("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(vercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(vercmp("1.010", "1.10"), Ordering::Equal);
        assert_eq!(vercmp("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(vercmp("1.0a", "1.01"), Ordering::Less);
        assert_eq!(vercmp("2.0~rc1", "2.0"), Ordering::Less);
        assert_eq!(vercmp("1.2.3.4", "1.2.3"), Ordering::Greater);
    }

    #[test]
    fn test_edition_ordering() {
        assert!(ed("1:1.0") > ed("0:2.0"));
        assert!(ed("1.2.3-1") < ed("1.2.3-2"));
        assert_eq!(ed("1.2.3").compare(&ed("1.2.3-7")), Ordering::Equal);
    }

    #[test]
    fn test_edition_display() {
        assert_eq!(ed("2:1.2.3-4.1").to_string(), "2:1.2.3-4.1");
        assert_eq!(ed("0:1.2").to_string(), "1.2");
    }

    #[test]
    fn test_capability_parse() {
        let cap = Capability::parse("zlib>=1.2").unwrap();
        assert_eq!(cap.name, "zlib");
        assert_eq!(cap.rel, Rel::Ge);
        assert_eq!(cap.edition, Some(ed("1.2")));

        let cap = Capability::parse("vim = 9.0-1").unwrap();
        assert_eq!(cap.rel, Rel::Eq);
        assert_eq!(cap.to_string(), "vim = 9.0-1");

        assert_eq!(Capability::parse("bash").unwrap(), Capability::named("bash"));
        assert!(Capability::parse(">=1.0").is_err());
        assert!(Capability::parse("foo!1.0").is_err());
    }

    #[test]
    fn test_capability_matches() {
        let cap = Capability::parse("zlib<1.3").unwrap();
        assert!(cap.matches("zlib", &ed("1.2.13-1")));
        assert!(!cap.matches("zlib", &ed("1.3")));
        assert!(!cap.matches("zlib-devel", &ed("1.2")));
        assert!(Capability::named("zlib").matches("zlib", &ed("9")));
    }
}
