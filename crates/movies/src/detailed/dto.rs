//! Transfer objects of the detailed catalogue. Every field is optional and
//! holds a string or a primitive.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieDto {
    pub title: Option<String>,
    /// `dd.mm.yyyy`
    pub release_date: Option<String>,
    /// Director's full name.
    pub director: Option<String>,
    /// Soundtrack composer.
    pub soundtrack: Option<String>,
    pub awards: Option<HashSet<AwardDto>>,
    pub runtime: Option<String>,
    /// Budget with currency symbol and thousands separators.
    pub budget: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AwardDto {
    pub category: Option<String>,
    pub year: Option<i32>,
}
