//! Ordered security rules: which paths need which level of access.
//!
//! Rules are evaluated top to bottom and the first matching pattern wins. A path
//! that matches no rule gets the fallback access (`Authenticated` by default).
//!
//! Patterns are Ant-style:
//! - `?` matches one character within a segment
//! - `*` matches any characters within one segment
//! - `**` matches zero or more whole segments

use crate::config::AuthorityRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    PermitAll,
    Authenticated,
    HasAuthority(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<String>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            segments: split_path(pattern).map(str::to_string).collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = split_path(path).collect();
        match_segments(&self.segments, &path)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(pattern: &[String], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((first, rest)) if first == "**" => (0..=path.len())
            .any(|skip| path.get(skip..).is_some_and(|tail| match_segments(rest, tail))),
        Some((first, rest)) => match path.split_first() {
            Some((segment, path_rest)) => {
                match_segment(first, segment) && match_segments(rest, path_rest)
            }
            None => false,
        },
    }
}

// Glob match of a single segment (`*`, `?`), backtracking to the last `*`.
fn match_segment(pattern: &str, segment: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = segment.chars().collect();

    let (mut pi, mut si) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while si < s.len() {
        match p.get(pi) {
            Some('*') => {
                star = Some((pi, si));
                pi += 1;
            }
            Some(&c) if c == '?' || c == s[si] => {
                pi += 1;
                si += 1;
            }
            _ => match star {
                Some((star_pi, star_si)) => {
                    pi = star_pi + 1;
                    si = star_si + 1;
                    star = Some((star_pi, star_si + 1));
                }
                None => return false,
            },
        }
    }

    p.get(pi..).is_some_and(|rest| rest.iter().all(|&c| c == '*'))
}

#[derive(Debug, Clone)]
struct SecurityRule {
    pattern: PathPattern,
    access: Access,
}

#[derive(Debug, Clone)]
pub struct SecurityRules {
    rules: Vec<SecurityRule>,
    fallback: Access,
}

/// Static assets and the root page.
pub const STATIC_PATTERNS: &[&str] = &[
    "/",
    "/favicon.ico",
    "/**/*.png",
    "/**/*.gif",
    "/**/*.svg",
    "/**/*.jpg",
    "/**/*.html",
    "/**/*.css",
    "/**/*.js",
];

pub const ACCOUNT_PATTERN: &str = "/api/account/**";
pub const HEALTH_PATTERN: &str = "/health";
pub const ADMIN_PATTERN: &str = "/api/admin/**";
pub const ADMIN_AUTHORITY: &str = "ROLE_ADMIN";

impl SecurityRules {
    pub fn new(fallback: Access) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// The service's rules, in order:
    /// 1. static assets, root, health and the account endpoints are open
    /// 2. `/api/admin/**` needs `ROLE_ADMIN`
    /// 3. configured authority rules
    /// 4. configured extra permits
    ///
    /// Everything else needs a valid token.
    pub fn standard(extra_permits: &[String], authority_rules: &[AuthorityRule]) -> Self {
        let rules = Self::new(Access::Authenticated)
            .permit_all(STATIC_PATTERNS.iter().copied())
            .permit_all([ACCOUNT_PATTERN, HEALTH_PATTERN])
            .has_authority(ADMIN_PATTERN, ADMIN_AUTHORITY);

        authority_rules
            .iter()
            .fold(rules, |rules, rule| {
                rules.has_authority(&rule.pattern, rule.authority.as_str())
            })
            .permit_all(extra_permits.iter().map(String::as_str))
    }

    pub fn permit_all<'a>(mut self, patterns: impl IntoIterator<Item = &'a str>) -> Self {
        for pattern in patterns {
            self = self.rule(pattern, Access::PermitAll);
        }
        self
    }

    pub fn has_authority(self, pattern: &str, authority: impl Into<String>) -> Self {
        self.rule(pattern, Access::HasAuthority(authority.into()))
    }

    fn rule(mut self, pattern: &str, access: Access) -> Self {
        self.rules.push(SecurityRule {
            pattern: PathPattern::new(pattern),
            access,
        });
        self
    }

    pub fn access_for(&self, path: &str) -> &Access {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| &rule.access)
            .unwrap_or(&self.fallback)
    }
}
