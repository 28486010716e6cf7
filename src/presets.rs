//! Preset Queries - canned lessons against the sample dataset

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetQuery {
    pub title: &'static str,
    pub description: &'static str,
    pub sql: &'static str,
    pub difficulty: Difficulty,
}

pub const PRESETS: &[PresetQuery] = &[
    PresetQuery {
        title: "List All Movies",
        description: "Basic SELECT to show all movies",
        sql: "SELECT * FROM movies;",
        difficulty: Difficulty::Beginner,
    },
    PresetQuery {
        title: "Find Sci-Fi Movies",
        description: "JOIN movies and genres tables",
        sql: "SELECT DISTINCT m.title, m.year
FROM movies m
JOIN genres g ON m.movie_id = g.movie_id
WHERE g.genre = 'Sci-Fi'
ORDER BY m.year DESC;",
        difficulty: Difficulty::Beginner,
    },
    PresetQuery {
        title: "Movies by Genre Count",
        description: "GROUP BY and COUNT aggregation",
        sql: "SELECT genre, COUNT(*) AS total_movies
FROM genres
GROUP BY genre
ORDER BY total_movies DESC;",
        difficulty: Difficulty::Beginner,
    },
    PresetQuery {
        title: "Average Rating per Movie",
        description: "JOIN with AVG aggregation",
        sql: "SELECT m.title, ROUND(AVG(r.rating), 2) AS avg_rating
FROM movies m
JOIN ratings r ON m.movie_id = r.movie_id
GROUP BY m.title
ORDER BY avg_rating DESC;",
        difficulty: Difficulty::Intermediate,
    },
    PresetQuery {
        title: "Movies After 2010",
        description: "WHERE clause with date filtering",
        sql: "SELECT title, year, duration
FROM movies
WHERE year > 2010
ORDER BY year DESC;",
        difficulty: Difficulty::Beginner,
    },
    PresetQuery {
        title: "Top 5 Highest-Rated Movies",
        description: "Complex query with LIMIT",
        sql: "SELECT m.title, ROUND(AVG(r.rating), 2) AS avg_rating, m.year
FROM movies m
JOIN ratings r ON m.movie_id = r.movie_id
GROUP BY m.title, m.year
ORDER BY avg_rating DESC
LIMIT 5;",
        difficulty: Difficulty::Intermediate,
    },
    PresetQuery {
        title: "Long Movies by Language",
        description: "Multi-condition filtering",
        sql: "SELECT title, language, duration
FROM movies
WHERE duration > 150
ORDER BY duration DESC;",
        difficulty: Difficulty::Beginner,
    },
    PresetQuery {
        title: "Genre Distribution Analysis",
        description: "Advanced aggregation with percentage",
        sql: "SELECT
  genre,
  COUNT(*) AS movie_count,
  ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM genres), 1) AS percentage
FROM genres
GROUP BY genre
ORDER BY movie_count DESC;",
        difficulty: Difficulty::Advanced,
    },
];

/// Look a preset up by title (case-insensitive) or by 1-based position.
pub fn find(key: &str) -> Option<&'static PresetQuery> {
    let key = key.trim();
    if let Ok(position) = key.parse::<usize>() {
        return position.checked_sub(1).and_then(|idx| PRESETS.get(idx));
    }
    PRESETS.iter().find(|p| p.title.eq_ignore_ascii_case(key))
}
