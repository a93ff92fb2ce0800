use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Upcoming,
    Planned,
    Archived,
    #[default]
    Unknown,
}

impl EventStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => EventStatus::Active,
            // Older index files carry the misspelling
            "upcoming" | "upcomming" => EventStatus::Upcoming,
            "planned" => EventStatus::Planned,
            "archived" => EventStatus::Archived,
            _ => EventStatus::Unknown,
        }
    }

    /// Sort rank: live events first, unknown statuses last
    pub fn rank(&self) -> u8 {
        match self {
            EventStatus::Active => 1,
            EventStatus::Upcoming => 2,
            EventStatus::Planned => 3,
            EventStatus::Archived => 4,
            EventStatus::Unknown => 99,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, EventStatus::Active | EventStatus::Upcoming)
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "INCOMING",
            EventStatus::Planned => "LOCKED",
            EventStatus::Archived => "ACCESS LOGS",
            EventStatus::Active | EventStatus::Unknown => "INITIALIZE",
        }
    }
}

impl<'de> Deserialize<'de> for EventStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EventStatus::parse(&raw))
    }
}

/// One entry of the events index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListing {
    pub name: String,
    pub folder: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub dates: String,
    pub color: Option<String>,
    #[serde(alias = "image")]
    pub img: Option<String>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

impl EventListing {
    pub fn href(&self) -> String {
        format!("{}/index.html", self.folder.trim_end_matches('/'))
    }

    /// Planned events are shown but cannot be entered
    pub fn is_enterable(&self) -> bool {
        self.status != EventStatus::Planned
    }

    pub fn tint(&self) -> &str {
        self.color.as_deref().unwrap_or("#fff")
    }
}

/// Sort events by status rank, keeping file order within a status.
pub fn sort_events(events: &mut [EventListing]) {
    events.sort_by_key(|e| e.status.rank());
}

pub fn live_count(events: &[EventListing]) -> usize {
    events.iter().filter(|e| e.status.is_live()).count()
}
