use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::player::Track;

/// Generation state advertised by the service. Anything unrecognized is
/// treated as still generating, so the episode stays unplayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeStatus {
    Ready,
    #[serde(other)]
    Generating,
}

/// Generated transcript: section name to speaker/line pairs. The map keeps
/// sections in name order, which is the order they are rendered in.
pub type Script = BTreeMap<String, Vec<BTreeMap<String, String>>>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Episode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    /// Id of the user who generated this episode.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "unknown_author")]
    pub author_name: String,
    pub status: EpisodeStatus,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub script: Option<Script>,
}

fn unknown_author() -> String {
    "Unknown".to_string()
}

impl Episode {
    /// Only finished episodes with a media URL can be played.
    pub fn is_ready(&self) -> bool {
        self.status == EpisodeStatus::Ready && self.audio_url.is_some()
    }

    pub fn like_count(&self) -> usize {
        self.liked_by.len()
    }

    pub fn liked_by_user(&self, user_id: &str) -> bool {
        self.liked_by.iter().any(|u| u == user_id)
    }

    pub fn owned_by(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.user_id.as_deref() == Some(user_id)
    }

    /// Track descriptor for the player, when the episode is playable.
    pub fn to_track(&self) -> Option<Track> {
        if self.status != EpisodeStatus::Ready {
            return None;
        }
        Some(Track {
            id: self.id.clone(),
            title: self.name.clone(),
            author: self.author_name.clone(),
            source_url: self.audio_url.clone()?,
            image_url: self.image_url.clone(),
            duration_hint: self.duration_secs.map(Duration::from_secs),
        })
    }
}

/// The two home rails, composed by the client from separate requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Home {
    pub most_liked: Vec<Episode>,
    pub mine: Vec<Episode>,
}

/// Masked card summary. The service never sends full numbers here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardOnFile {
    pub id: String,
    pub last4: String,
    pub expiry: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub username: String,
    pub plan: String,
    pub tokens: i64,
    #[serde(default)]
    pub cards: Vec<CardOnFile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub tokens: i64,
    #[serde(default)]
    pub features: Vec<String>,
}
