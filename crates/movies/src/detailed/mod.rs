//! Movie with nested director, soundtrack and awards, flattened into a DTO.

pub mod domain;
pub mod dto;
pub mod mappers;

pub use domain::{Award, Director, Movie, Soundtrack};
pub use dto::{AwardDto, MovieDto};
pub use mappers::{award_mapper, movie_mapper};
