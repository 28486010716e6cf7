//! Statistics - a fixed set of summary facts about the movie dataset
//!
//! Each fact is its own read-only query and falls back to a sentinel (`0`
//! or `"N/A"`) when the query fails or returns nothing, so a summary is
//! always produced, even against an empty database.

use crate::engine::Database;
use crate::result::Scalar;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const TEXT_SENTINEL: &str = "N/A";

const TOTAL_MOVIES_SQL: &str = "SELECT COUNT(*) FROM movies";
const TOTAL_GENRES_SQL: &str = "SELECT COUNT(DISTINCT genre) FROM genres";
const AVERAGE_RATING_SQL: &str = "SELECT ROUND(AVG(rating), 2) FROM ratings";
const MOST_POPULAR_GENRE_SQL: &str =
    "SELECT genre FROM genres GROUP BY genre ORDER BY COUNT(*) DESC LIMIT 1";
const NEWEST_MOVIE_SQL: &str = "SELECT title FROM movies ORDER BY year DESC LIMIT 1";
const OLDEST_MOVIE_SQL: &str = "SELECT title FROM movies ORDER BY year ASC LIMIT 1";
const LONGEST_MOVIE_SQL: &str = "SELECT title FROM movies ORDER BY duration DESC LIMIT 1";
const SHORTEST_MOVIE_SQL: &str = "SELECT title FROM movies ORDER BY duration ASC LIMIT 1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_movies: i64,
    pub total_genres: i64,
    pub average_rating: f64,
    pub most_popular_genre: String,
    pub newest_movie: String,
    pub oldest_movie: String,
    pub longest_movie: String,
    pub shortest_movie: String,
}

impl Default for StatsSummary {
    /// Every fact at its sentinel.
    fn default() -> Self {
        Self {
            total_movies: 0,
            total_genres: 0,
            average_rating: 0.0,
            most_popular_genre: TEXT_SENTINEL.to_string(),
            newest_movie: TEXT_SENTINEL.to_string(),
            oldest_movie: TEXT_SENTINEL.to_string(),
            longest_movie: TEXT_SENTINEL.to_string(),
            shortest_movie: TEXT_SENTINEL.to_string(),
        }
    }
}

pub struct StatsAggregator<'a> {
    db: &'a Database,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn summarize(&self) -> StatsSummary {
        StatsSummary {
            total_movies: self.number(TOTAL_MOVIES_SQL) as i64,
            total_genres: self.number(TOTAL_GENRES_SQL) as i64,
            average_rating: self.number(AVERAGE_RATING_SQL),
            most_popular_genre: self.text(MOST_POPULAR_GENRE_SQL),
            newest_movie: self.text(NEWEST_MOVIE_SQL),
            oldest_movie: self.text(OLDEST_MOVIE_SQL),
            longest_movie: self.text(LONGEST_MOVIE_SQL),
            shortest_movie: self.text(SHORTEST_MOVIE_SQL),
        }
    }

    fn number(&self, sql: &str) -> f64 {
        self.first_cell(sql)
            .and_then(|cell| cell.as_f64())
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    }

    fn text(&self, sql: &str) -> String {
        match self.first_cell(sql) {
            Some(cell) if !cell.is_null() => cell.to_string(),
            _ => TEXT_SENTINEL.to_string(),
        }
    }

    /// First cell of the first result set, if any.
    fn first_cell(&self, sql: &str) -> Option<Scalar> {
        match self.db.exec(sql) {
            Ok(sets) => sets
                .into_iter()
                .next()
                .and_then(|set| set.rows.into_iter().next())
                .and_then(|row| row.into_iter().next()),
            Err(e) => {
                warn!(query = sql, error = %e, "Statistic unavailable");
                None
            }
        }
    }
}
