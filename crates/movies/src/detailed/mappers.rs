//! Rule tables for the detailed catalogue.

use chrono::Datelike;
use tracing::debug;

use fieldmap_core::{CollectionKind, Mapper, MappingError, MissingPolicy};

use super::domain::{Award, Movie};
use super::dto::{AwardDto, MovieDto};

pub const RELEASE_DATE_PATTERN: &str = "%d.%m.%Y";
pub const BUDGET_PATTERN: &str = "$###,###,###";
pub const DEFAULT_LANGUAGE: &str = "English";

/// Award → AwardDto. The year is taken from the award date and left null
/// when the date is unknown.
pub fn award_mapper() -> Result<Mapper<Award, AwardDto>, MappingError> {
    Mapper::builder("award")
        .copy("category")
        .computed("year", "date", MissingPolicy::Null, |award: &Award| {
            award.date.map(|date| date.year())
        })
        .build()
}

/// Movie → MovieDto.
///
/// A movie without a director cannot be mapped: the director's full name
/// is required and its absence fails with [`MappingError::MissingReference`].
pub fn movie_mapper() -> Result<Mapper<Movie, MovieDto>, MappingError> {
    debug!("building detailed movie mapper");
    Mapper::builder("movie")
        .copy("title")
        .date_format("release_date", "release_date", RELEASE_DATE_PATTERN)
        .computed("director", "director", MissingPolicy::Fail, |movie: &Movie| {
            movie.director.as_ref().map(ToString::to_string)
        })
        .nested("soundtrack", "soundtrack.composer")
        .collection("awards", "awards", award_mapper()?, CollectionKind::Set)
        .ignore("runtime")
        .number_format("budget", "budget", BUDGET_PATTERN)
        .default_value("lang", "language", DEFAULT_LANGUAGE)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detailed::domain::{Director, Soundtrack};
    use chrono::NaiveDate;

    fn award(category: &str, date: Option<NaiveDate>) -> Award {
        Award {
            category: Some(category.into()),
            date,
        }
    }

    fn the_dark_knight() -> Movie {
        let oscars = NaiveDate::from_ymd_opt(2009, 2, 22);
        Movie {
            title: Some("The Dark Knight".into()),
            release_date: NaiveDate::from_ymd_opt(2008, 7, 18),
            director: Some(Director {
                first_name: "Christopher".into(),
                last_name: "Nolan".into(),
            }),
            soundtrack: Some(Soundtrack {
                composer: Some("Hans Zimmer".into()),
            }),
            awards: vec![
                award("Best Performance by an Actor in a Supporting Role", oscars),
                award("Best Achievement in Sound Editing", oscars),
            ],
            runtime: Some("152 min".into()),
            budget: Some(185_000_000),
            language: None,
        }
    }

    #[test]
    fn test_award_to_dto() {
        let today = chrono::Local::now().date_naive();
        let award = award("Best Performance by an Actor in a Supporting Role", Some(today));

        let dto = award_mapper().unwrap().map_forward(&award).unwrap();

        assert_eq!(dto.category, award.category);
        assert_eq!(dto.year, Some(today.year()));
    }

    #[test]
    fn test_award_without_date() {
        let dto = award_mapper()
            .unwrap()
            .map_forward(&award("Best Original Score", None))
            .unwrap();
        assert_eq!(dto.year, None);
        assert_eq!(dto.category.as_deref(), Some("Best Original Score"));
    }

    #[test]
    fn test_movie_to_dto() {
        let dto = movie_mapper().unwrap().map_forward(&the_dark_knight()).unwrap();

        assert_eq!(dto.title.as_deref(), Some("The Dark Knight"));
        assert_eq!(dto.release_date.as_deref(), Some("18.07.2008"));
        assert_eq!(dto.director.as_deref(), Some("Christopher Nolan"));
        assert_eq!(dto.soundtrack.as_deref(), Some("Hans Zimmer"));

        let awards = dto.awards.expect("awards mapped");
        assert_eq!(awards.len(), 2);
        assert!(awards.iter().all(|a| a.year == Some(2009)));
        let categories: Vec<&str> = awards.iter().filter_map(|a| a.category.as_deref()).collect();
        assert!(categories.contains(&"Best Performance by an Actor in a Supporting Role"));
        assert!(categories.contains(&"Best Achievement in Sound Editing"));

        assert_eq!(dto.runtime, None);
        assert_eq!(dto.budget.as_deref(), Some("$185,000,000"));
        assert_eq!(dto.lang.as_deref(), Some("English"));
    }

    #[test]
    fn test_movie_without_director_fails() {
        let mut movie = the_dark_knight();
        movie.director = None;

        let err = movie_mapper().unwrap().map_forward(&movie).unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingReference { ref field, ref reference }
                if field == "director" && reference == "director"
        ));
    }
}
