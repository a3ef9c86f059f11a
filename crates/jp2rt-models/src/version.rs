//! Dotted version numbers used by the model archive manifest.
//!
//! A version is a non-empty list of numeric release components optionally
//! followed by a pre-release tag (`0.3.0-alpha.1`, `0.2.2a1`, `1.0.dev2`) or a
//! post-release tag (`0.3.0.post1`). Missing trailing components compare as
//! zero, so `1.0 == 1`. A pre-release sorts before the corresponding release
//! and a post-release after it. Any other tag is rejected.
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Words a pre-release tag may start with.
const PRE_MARKERS: &[&str] = &["a", "b", "c", "rc", "alpha", "beta", "pre", "preview", "dev"];

#[derive(Debug, Clone)]
enum Suffix {
    Pre(String),
    Post(u64),
}

#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    suffix: Option<Suffix>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError(String);

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version string '{}'", self.0)
    }
}

impl std::error::Error for ParseVersionError {}

impl Version {
    pub fn new(release: Vec<u64>) -> Self {
        Self {
            release,
            suffix: None,
        }
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<&str> {
        match &self.suffix {
            Some(Suffix::Pre(tag)) => Some(tag),
            _ => None,
        }
    }

    pub fn post(&self) -> Option<u64> {
        match self.suffix {
            Some(Suffix::Post(n)) => Some(n),
            _ => None,
        }
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre().is_some()
    }

    fn component(&self, idx: usize) -> u64 {
        self.release.get(idx).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (release_part, rest) = s.split_at(split);
        // a tag may follow a single dot, as in "1.0.post1"
        let release_part = if rest.is_empty() {
            release_part
        } else {
            release_part.strip_suffix('.').unwrap_or(release_part)
        };

        // "1.0." or "1..0" leave empty components behind.
        let release = release_part
            .split('.')
            .map(|c| c.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ParseVersionError(s.to_string()))?;

        let suffix = if rest.is_empty() {
            None
        } else {
            let tag = rest.trim_start_matches(['-', '.']);
            Some(parse_suffix(tag).ok_or_else(|| ParseVersionError(s.to_string()))?)
        };

        Ok(Self { release, suffix })
    }
}

fn parse_suffix(tag: &str) -> Option<Suffix> {
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
        return None;
    }
    if let Some(number) = tag.strip_prefix("post") {
        let number = number.trim_start_matches('.');
        return if number.is_empty() {
            Some(Suffix::Post(0))
        } else {
            number.parse().ok().map(Suffix::Post)
        };
    }
    let word = tag
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    PRE_MARKERS
        .contains(&word.as_str())
        .then(|| Suffix::Pre(tag.to_string()))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release = self
            .release
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".");
        match &self.suffix {
            Some(Suffix::Pre(tag)) => write!(f, "{}-{}", release, tag),
            Some(Suffix::Post(n)) => write!(f, "{}.post{}", release, n),
            None => write!(f, "{}", release),
        }
    }
}

fn cmp_pre(a: &str, b: &str) -> Ordering {
    let mut lhs = a.split('.');
    let mut rhs = b.split('.');
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn suffix_rank(suffix: &Option<Suffix>) -> u8 {
    match suffix {
        Some(Suffix::Pre(_)) => 0,
        None => 1,
        Some(Suffix::Post(_)) => 2,
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.release.len().max(other.release.len());
        for idx in 0..width {
            let ord = self.component(idx).cmp(&other.component(idx));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        match (&self.suffix, &other.suffix) {
            (Some(Suffix::Pre(a)), Some(Suffix::Pre(b))) => cmp_pre(a, b),
            (Some(Suffix::Post(a)), Some(Suffix::Post(b))) => a.cmp(b),
            (a, b) => suffix_rank(a).cmp(&suffix_rank(b)),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}
