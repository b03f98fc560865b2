//! # Scan Target Model
//!
//! A target is one domain name under test. The default list is built by
//! appending [`DEFAULT_SUFFIX`] to every entry of [`REGIONS`], but any fully
//! qualified name can be scanned.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Suffix appended to a region code to form its endpoint domain.
pub const DEFAULT_SUFFIX: &str = ".privateinternetaccess.com";

/// Region codes scanned when no region is selected.
pub const REGIONS: &[&str] = &[
    "ae", "albania", "ar", "au-melbourne", "au-perth", "au-sydney",
    "austria", "ba", "belgium", "bg", "ca-montreal", "ca-ontario",
    "ca-toronto", "ca-vancouver", "czech", "de-berlin", "de-frankfurt",
    "denmark", "ee", "fi", "france", "gr", "hungary", "in", "ireland",
    "is", "israel", "italy", "jp", "lt", "lu", "lv", "md", "mk", "nl", "no",
    "nz", "poland", "pt", "ro", "rs", "sg", "sk", "spain", "sweden",
    "swiss", "tr", "ua", "uk-london", "uk-manchester", "uk-southampton",
    "us-atlanta", "us-california", "us-chicago", "us-dal", "us-denver",
    "us-east", "us-florida", "us-houston", "us-lasvegas", "us-nyc",
    "us-sea", "us-siliconvalley", "us-washingtondc", "us-west", "za",
];

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("domain name is empty")]
    Empty,
    #[error("domain name '{0}' is longer than {MAX_DOMAIN_LEN} characters")]
    TooLong(String),
    #[error("domain name '{domain}' has an invalid label '{label}'")]
    InvalidLabel { domain: String, label: String },
}

/// A domain name to resolve and probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    domain: String,
}

impl Target {
    /// Builds the endpoint domain of a region, e.g. `"nl"` becomes
    /// `"nl.privateinternetaccess.com"` with the default suffix.
    pub fn from_region(region: &str, suffix: &str) -> Result<Self, TargetError> {
        format!("{region}{suffix}").parse()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)
    }
}

impl FromStr for Target {
    type Err = TargetError;

    /// Parses and normalizes a domain name.
    ///
    /// The name is trimmed, lowercased and stripped of a trailing root dot.
    /// Every label must be 1 to 63 characters of ASCII letters, digits,
    /// hyphens or underscores, and must not start or end with a hyphen.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let domain = s.trim().trim_end_matches('.').to_ascii_lowercase();

        if domain.is_empty() {
            return Err(TargetError::Empty);
        }
        if domain.len() > MAX_DOMAIN_LEN {
            return Err(TargetError::TooLong(domain));
        }

        if let Some(label) = domain.split('.').find(|label| !is_valid_label(label)) {
            return Err(TargetError::InvalidLabel {
                label: label.to_string(),
                domain: domain.clone(),
            });
        }

        Ok(Self { domain })
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Builds targets from region codes, keeping their order.
pub fn from_regions<'a, I>(regions: I, suffix: &str) -> Result<Vec<Target>, TargetError>
where
    I: IntoIterator<Item = &'a str>,
{
    regions
        .into_iter()
        .map(|region| Target::from_region(region, suffix))
        .collect()
}

/// The full default target list.
pub fn default_targets() -> Vec<Target> {
    REGIONS
        .iter()
        .map(|region| Target {
            domain: format!("{region}{DEFAULT_SUFFIX}"),
        })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
