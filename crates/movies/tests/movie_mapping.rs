//! End-to-end tests for the movie catalogue mappings.
//!
//! These tests exercise the real rule tables from `fieldmap-movies` in both
//! directions, plus a rule table loaded from a TOML file on disk.

use std::io::Write;

use chrono::{Datelike, NaiveDate};

use fieldmap_core::{
    CollectionKind, Mapper, MapperBuilder, MappingConfig, MappingError, MissingPolicy,
};
use fieldmap_movies::detailed::{
    self, award_mapper, Award, AwardDto, Director, Movie, MovieDto, Soundtrack,
};
use fieldmap_movies::simple;

// ===========================================================================
// Helpers
// ===========================================================================

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn heat() -> Movie {
    Movie {
        title: Some("Heat".into()),
        release_date: date(1995, 12, 15),
        director: Some(Director {
            first_name: "Michael".into(),
            last_name: "Mann".into(),
        }),
        soundtrack: Some(Soundtrack {
            composer: Some("Elliot Goldenthal".into()),
        }),
        awards: vec![Award {
            category: Some("Best Score".into()),
            date: date(1996, 3, 2),
        }],
        runtime: Some("170 min".into()),
        budget: Some(60_000_000),
        language: Some("English".into()),
    }
}

const DECLARATIVE_RULES: &str = r#"
name = "movie"

[[fields]]
kind = "copy"
target = "title"

[[fields]]
kind = "date_format"
target = "release_date"
pattern = "%d.%m.%Y"

[[fields]]
kind = "nested"
target = "soundtrack"
path = "soundtrack.composer"

[[fields]]
kind = "ignore"
target = "runtime"

[[fields]]
kind = "number_format"
target = "budget"
pattern = "$###,###,###"

[[fields]]
kind = "default"
target = "lang"
source = "language"
value = "English"
"#;

fn mapper_from_file() -> Mapper<Movie, MovieDto> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movie.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(DECLARATIVE_RULES.as_bytes()).unwrap();

    let config = MappingConfig::load_and_validate(&path).unwrap();
    MapperBuilder::from_config(&config)
        .computed("director", "director", MissingPolicy::Fail, |movie: &Movie| {
            movie.director.as_ref().map(ToString::to_string)
        })
        .collection("awards", "awards", award_mapper().unwrap(), CollectionKind::Set)
        .build()
        .unwrap()
}

// ===========================================================================
// Round trips
// ===========================================================================

#[test]
fn test_round_trip_preserves_copied_and_renamed_fields() {
    let mapper = simple::movie_mapper().unwrap();
    let movie = simple::Movie {
        title: Some("Memento".into()),
        year: Some(2000),
        director: Some("Christopher Nolan".into()),
    };

    let restored = mapper.map_inverse(&mapper.map_forward(&movie).unwrap()).unwrap();
    assert_eq!(restored, movie);
}

#[test]
fn test_round_trip_detailed_movie() {
    let mapper = detailed::movie_mapper().unwrap();
    let movie = heat();

    let restored = mapper.map_inverse(&mapper.map_forward(&movie).unwrap()).unwrap();

    assert_eq!(restored.title, movie.title);
    assert_eq!(restored.release_date, movie.release_date);
    assert_eq!(restored.soundtrack, movie.soundtrack);
    assert_eq!(restored.budget, movie.budget);
    assert_eq!(restored.language, movie.language);
    assert_eq!(restored.awards.len(), 1);
    assert_eq!(restored.awards[0].category.as_deref(), Some("Best Score"));

    // One-directional fields come back empty.
    assert_eq!(restored.director, None);
    assert_eq!(restored.runtime, None);
    assert_eq!(restored.awards[0].date, None);
}

#[test]
fn test_inverse_does_not_reapply_defaults() {
    let dto = MovieDto {
        title: Some("Heat".into()),
        ..Default::default()
    };
    let movie = detailed::movie_mapper().unwrap().map_inverse(&dto).unwrap();
    assert_eq!(movie.language, None);
    assert_eq!(movie.soundtrack, None);
    assert!(movie.awards.is_empty());
}

// ===========================================================================
// Forward rules
// ===========================================================================

#[test]
fn test_ignored_runtime_is_always_null() {
    let mapper = detailed::movie_mapper().unwrap();
    for runtime in [Some("170 min".to_string()), None] {
        let mut movie = heat();
        movie.runtime = runtime;
        assert_eq!(mapper.map_forward(&movie).unwrap().runtime, None);
    }
}

#[test]
fn test_language_default() {
    let mapper = detailed::movie_mapper().unwrap();

    let mut movie = heat();
    movie.language = None;
    assert_eq!(mapper.map_forward(&movie).unwrap().lang.as_deref(), Some("English"));

    movie.language = Some("French".into());
    assert_eq!(mapper.map_forward(&movie).unwrap().lang.as_deref(), Some("French"));
}

#[test]
fn test_release_date_format() {
    let mapper = detailed::movie_mapper().unwrap();
    let mut movie = heat();
    movie.release_date = date(2008, 7, 18);

    let dto = mapper.map_forward(&movie).unwrap();
    assert_eq!(dto.release_date.as_deref(), Some("18.07.2008"));
    assert_eq!(mapper.map_inverse(&dto).unwrap().release_date, date(2008, 7, 18));

    movie.release_date = None;
    assert_eq!(mapper.map_forward(&movie).unwrap().release_date, None);
}

#[test]
fn test_budget_format() {
    let mapper = detailed::movie_mapper().unwrap();
    let mut movie = heat();
    movie.budget = Some(185_000_000);
    assert_eq!(
        mapper.map_forward(&movie).unwrap().budget.as_deref(),
        Some("$185,000,000")
    );

    movie.budget = None;
    assert_eq!(mapper.map_forward(&movie).unwrap().budget, None);
}

#[test]
fn test_awards_mapped_independently() {
    let oscars = date(2009, 2, 22);
    let mut movie = heat();
    movie.awards = vec![
        Award {
            category: Some("Best Performance by an Actor in a Supporting Role".into()),
            date: oscars,
        },
        Award {
            category: Some("Best Achievement in Sound Editing".into()),
            date: oscars,
        },
    ];

    let awards = detailed::movie_mapper()
        .unwrap()
        .map_forward(&movie)
        .unwrap()
        .awards
        .unwrap();

    assert_eq!(awards.len(), 2);
    for award in &awards {
        assert_eq!(award.year, oscars.map(|d| d.year()));
    }
}

#[test]
fn test_duplicate_awards_collapse() {
    let mut movie = heat();
    movie.awards = vec![movie.awards[0].clone(), movie.awards[0].clone()];

    let awards = detailed::movie_mapper()
        .unwrap()
        .map_forward(&movie)
        .unwrap()
        .awards
        .unwrap();
    assert_eq!(awards.len(), 1);
    assert!(awards.contains(&AwardDto {
        category: Some("Best Score".into()),
        year: Some(1996),
    }));
}

#[test]
fn test_missing_soundtrack_degrades_to_null() {
    let mut movie = heat();
    movie.soundtrack = None;
    let dto = detailed::movie_mapper().unwrap().map_forward(&movie).unwrap();
    assert_eq!(dto.soundtrack, None);
    assert_eq!(dto.title.as_deref(), Some("Heat"));
}

#[test]
fn test_dto_wire_shape() {
    let mut movie = heat();
    movie.release_date = date(2008, 7, 18);
    movie.budget = Some(185_000_000);
    let dto = detailed::movie_mapper().unwrap().map_forward(&movie).unwrap();

    let wire = serde_json::to_value(&dto).unwrap();
    assert_eq!(wire["title"], "Heat");
    assert_eq!(wire["release_date"], "18.07.2008");
    assert_eq!(wire["director"], "Michael Mann");
    assert_eq!(wire["soundtrack"], "Elliot Goldenthal");
    assert_eq!(wire["budget"], "$185,000,000");
    assert_eq!(wire["lang"], "English");
    assert!(wire["runtime"].is_null());
    assert_eq!(wire["awards"][0]["category"], "Best Score");
    assert_eq!(wire["awards"][0]["year"], 1996);
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn test_missing_director_fails_deterministically() {
    let mapper = detailed::movie_mapper().unwrap();
    let mut movie = heat();
    movie.director = None;

    for _ in 0..3 {
        let err = mapper.map_forward(&movie).unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingReference { ref field, .. } if field == "director"
        ));
    }
}

#[test]
fn test_malformed_budget_is_a_format_error() {
    let dto = MovieDto {
        budget: Some("185 million".into()),
        ..Default::default()
    };
    let err = detailed::movie_mapper().unwrap().map_inverse(&dto).unwrap_err();
    assert!(matches!(
        err,
        MappingError::Format { ref field, ref value, .. }
            if field == "budget" && value == "185 million"
    ));
}

#[test]
fn test_oversized_budget_is_a_format_error() {
    let dto = MovieDto {
        title: Some("Heat".into()),
        budget: Some("$9,223,372,036,854,775,808".into()),
        ..Default::default()
    };
    let err = detailed::movie_mapper().unwrap().map_inverse(&dto).unwrap_err();
    assert!(matches!(
        err,
        MappingError::Format { ref field, ref value, .. }
            if field == "budget" && value == "$9,223,372,036,854,775,808"
    ));
}

#[test]
fn test_malformed_release_date_is_a_format_error() {
    let dto = MovieDto {
        release_date: Some("July 18th".into()),
        ..Default::default()
    };
    let err = detailed::movie_mapper().unwrap().map_inverse(&dto).unwrap_err();
    assert!(matches!(err, MappingError::Format { ref field, .. } if field == "release_date"));
}

// ===========================================================================
// Configuration
// ===========================================================================

#[test]
fn test_file_rules_match_builder_rules() {
    let from_file = mapper_from_file();
    let from_code = detailed::movie_mapper().unwrap();

    let mut movie = heat();
    movie.language = None;
    assert_eq!(
        from_file.map_forward(&movie).unwrap(),
        from_code.map_forward(&movie).unwrap()
    );

    let kinds = |m: &Mapper<Movie, MovieDto>| {
        let mut kinds: Vec<String> = m
            .fields()
            .map(|f| format!("{}:{}", f.target(), f.kind()))
            .collect();
        kinds.sort();
        kinds
    };
    assert_eq!(kinds(&from_file), kinds(&from_code));
}
