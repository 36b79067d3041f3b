//! Domain model of the detailed catalogue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub director: Option<Director>,
    pub soundtrack: Option<Soundtrack>,
    pub awards: Vec<Award>,
    /// Running time as displayed, e.g. `152 min`.
    pub runtime: Option<String>,
    /// Production budget in US dollars.
    pub budget: Option<i64>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Director {
    pub first_name: String,
    pub last_name: String,
}

impl std::fmt::Display for Director {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Soundtrack {
    pub composer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Award {
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
}
