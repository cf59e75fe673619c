//! Influencer roster
//!
//! Read-only list of influencers loaded once at startup from a JSON file.
//! Trust scores and claim counts are static display values; live
//! verification never writes back to them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use vh_common::{Error, Result};

/// A claim shown on an influencer card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentClaim {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Verified,
    Questionable,
    Debunked,
}

/// Previously reviewed claim (static)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewedClaim {
    pub id: u64,
    pub claim: String,
    pub status: ClaimStatus,
    pub confidence: f64,
    pub category: String,
}

/// One point on the trust score history chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPoint {
    pub date: String,
    pub trust_score: f64,
}

/// Follower count as the roster gives it: a number or a display string ("1.2M")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Followers {
    Count(u64),
    Display(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Influencer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub username: String,
    pub followers: Followers,
    pub trust_score: f64,
    pub verified_claims: u32,
    pub questionable_claims: u32,
    #[serde(default)]
    pub recent_claims: Vec<RecentClaim>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ReviewedClaim>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_activity: Vec<ActivityPoint>,
}

impl Influencer {
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.username.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    influencers: Vec<Influencer>,
}

impl Roster {
    pub fn new(influencers: Vec<Influencer>) -> Self {
        Self { influencers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the roster from a JSON array file
    ///
    /// # Errors
    /// `Error::Config` if the file cannot be read, `Error::Parse` if it is not
    /// a valid roster.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read roster {}: {}", path.display(), e))
        })?;

        let influencers: Vec<Influencer> = serde_json::from_str(&contents)
            .map_err(|e| Error::Parse(format!("Invalid roster {}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            influencers = influencers.len(),
            "Roster loaded"
        );

        Ok(Self::new(influencers))
    }

    /// Load from the configured path, or an empty roster when none is set
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                info!("No roster configured; influencer listings will be empty");
                Ok(Self::empty())
            }
        }
    }

    pub fn all(&self) -> &[Influencer] {
        &self.influencers
    }

    pub fn get(&self, id: u64) -> Option<&Influencer> {
        self.influencers.iter().find(|i| i.id == id)
    }

    /// Case-insensitive substring match on name or username
    ///
    /// A blank query matches everyone.
    pub fn search(&self, query: &str) -> Vec<&Influencer> {
        let needle = query.trim().to_lowercase();
        self.influencers
            .iter()
            .filter(|i| i.matches(&needle))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.influencers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.influencers.is_empty()
    }
}
