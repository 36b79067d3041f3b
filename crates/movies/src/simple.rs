//! Flat movie model and its DTO.
//!
//! The rule table lives in `mappings/simple_movie.toml` and is compiled
//! through [`MapperBuilder::from_config`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use fieldmap_core::{CoreError, Mapper, MapperBuilder, MappingConfig};

const RULES: &str = include_str!("../mappings/simple_movie.toml");

/// A movie as the catalogue stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub director: Option<String>,
}

/// A movie as it travels over the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieDto {
    pub title: Option<String>,
    pub year: Option<String>,
    pub maker: Option<String>,
}

/// Compile the movie rule table.
pub fn movie_mapper() -> Result<Mapper<Movie, MovieDto>, CoreError> {
    let config = MappingConfig::from_toml_str(RULES)?;
    config.validate()?;
    debug!(name = %config.name, "building simple movie mapper");
    Ok(MapperBuilder::from_config(&config).build()?)
}
