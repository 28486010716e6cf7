use pretty_assertions::assert_eq;
use sql_sandbox::export;
use sql_sandbox::ingestion::sanitize_identifier;
use sql_sandbox::presets::PRESETS;
use sql_sandbox::result::{STATUS_HEADER, STATUS_SUCCESS};
use sql_sandbox::{
    CsvDialect, CsvImporter, Database, ImportSpec, QueryExecutor, SandboxError, Scalar,
    StatsAggregator,
};

fn seeded() -> Database {
    Database::open(true).expect("seeded database")
}

#[test]
fn select_rows_match_header_width() {
    let db = seeded();
    let executor = QueryExecutor::new(&db);
    for sql in [
        "SELECT * FROM movies",
        "SELECT m.title, g.genre FROM movies m JOIN genres g ON m.movie_id = g.movie_id",
        "SELECT rating FROM ratings WHERE rating > 9",
        "SELECT 1 AS one, NULL AS nothing, 'x' AS text",
    ] {
        let result = executor.execute(sql).unwrap();
        assert!(result.is_rectangular(), "{}", sql);
        for row in &result.rows {
            assert_eq!(row.len(), result.headers.len());
        }
    }
}

#[test]
fn statements_without_rows_report_status() {
    let db = seeded();
    let executor = QueryExecutor::new(&db);
    for sql in [
        "CREATE TABLE notes (body TEXT)",
        "INSERT INTO notes VALUES ('hello')",
        "UPDATE movies SET duration = 150 WHERE movie_id = 1",
        "DELETE FROM ratings WHERE rating < 8",
        "DROP TABLE notes",
    ] {
        let result = executor.execute(sql).unwrap();
        assert_eq!(result.headers, vec![STATUS_HEADER.to_string()]);
        assert_eq!(result.rows, vec![vec![Scalar::from(STATUS_SUCCESS)]]);
    }
}

#[test]
fn count_movies_on_seed() {
    let db = seeded();
    let result = QueryExecutor::new(&db).execute("SELECT COUNT(*) FROM movies;").unwrap();
    assert_eq!(result.headers, vec!["COUNT(*)".to_string()]);
    assert_eq!(result.rows, vec![vec![Scalar::Number(15.0)]]);
    assert_eq!(result.query, "SELECT COUNT(*) FROM movies;");
}

#[test]
fn execute_before_initialization() {
    let db = Database::uninitialized();
    let err = QueryExecutor::new(&db).execute("SELECT 1").unwrap_err();
    assert!(matches!(err, SandboxError::NotInitialized));

    db.initialize(false).unwrap();
    assert!(QueryExecutor::new(&db).execute("SELECT 1").is_ok());
}

#[test]
fn films_import_end_to_end() {
    let db = seeded();
    let summary = CsvImporter::new(&db)
        .import_csv("Title,Year\nInception,2010\nAvatar,2009\n", "films", ',')
        .unwrap();
    assert_eq!(summary.table_name, "films");
    assert_eq!(summary.row_count, 2);
    assert_eq!(summary.columns, vec!["title".to_string(), "year".to_string()]);

    let columns = db.describe_table("films").unwrap();
    let described: Vec<(String, String)> = columns
        .into_iter()
        .map(|c| (c.name, c.declared_type))
        .collect();
    assert_eq!(
        described,
        vec![
            ("title".to_string(), "TEXT".to_string()),
            ("year".to_string(), "TEXT".to_string()),
        ]
    );

    let result = QueryExecutor::new(&db)
        .execute("SELECT title, year FROM films ORDER BY title")
        .unwrap();
    assert_eq!(
        result.rows,
        vec![
            vec![Scalar::from("Avatar"), Scalar::from("2009")],
            vec![Scalar::from("Inception"), Scalar::from("2010")],
        ]
    );
}

#[test]
fn reimport_replaces_contents() {
    let db = seeded();
    let importer = CsvImporter::new(&db);
    importer.import_csv("a,b\n1,2\n3,4\n5,6\n", "nums", ',').unwrap();
    let before = db.schema_version();
    importer.import_csv("c\n7\n", "nums", ',').unwrap();
    assert!(db.schema_version() > before);

    let result = QueryExecutor::new(&db).execute("SELECT * FROM nums").unwrap();
    assert_eq!(result.headers, vec!["c".to_string()]);
    assert_eq!(result.rows, vec![vec![Scalar::from("7")]]);
}

#[test]
fn colliding_headers_get_distinct_names() {
    let db = seeded();
    let summary = CsvImporter::new(&db)
        .import_csv("Name,name,NAME,\nx,y,z,w\n", "people", ',')
        .unwrap();
    assert_eq!(
        summary.columns,
        vec![
            "name".to_string(),
            "name_2".to_string(),
            "name_3".to_string(),
            "column_4".to_string(),
        ]
    );
}

#[test]
fn quoted_dialect_import_from_spec() {
    let db = seeded();
    let spec = ImportSpec::new("Best Films.csv", "title,note\n\"Up\",\"funny, sad\"\n")
        .with_dialect(CsvDialect::Quoted);
    let summary = CsvImporter::new(&db).import(spec).unwrap();
    assert_eq!(summary.table_name, "best_films");

    let result = QueryExecutor::new(&db).execute("SELECT note FROM best_films").unwrap();
    assert_eq!(result.rows, vec![vec![Scalar::from("funny, sad")]]);
}

#[test]
fn export_header_line_reparses() {
    let db = seeded();
    let result = QueryExecutor::new(&db)
        .execute("SELECT title, year, duration FROM movies ORDER BY year LIMIT 3")
        .unwrap();
    let csv = export::to_csv(&result);
    let mut lines = csv.lines();
    let header: Vec<String> = lines.next().unwrap().split(',').map(String::from).collect();
    assert_eq!(header, result.headers);
    assert_eq!(lines.count(), 3);
}

#[test]
fn export_writes_file() {
    let db = seeded();
    let result = QueryExecutor::new(&db).execute("SELECT COUNT(*) FROM genres").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = export::write_csv(&result, dir.path()).unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "COUNT(*)\n\"37\"");
}

#[test]
fn sanitize_is_idempotent() {
    for raw in ["Release Year", "émigré", "2019-data", "a.b.c", "", "ALL_CAPS", "  spaced  "] {
        let once = sanitize_identifier(raw);
        assert_eq!(sanitize_identifier(&once), once);
    }
}

#[test]
fn stats_on_empty_database() {
    let db = Database::open(false).unwrap();
    let stats = StatsAggregator::new(&db).summarize();
    assert_eq!(stats.total_movies, 0);
    assert_eq!(stats.total_genres, 0);
    assert_eq!(stats.average_rating, 0.0);
    assert_eq!(stats.most_popular_genre, "N/A");
    assert_eq!(stats.newest_movie, "N/A");
    assert_eq!(stats.oldest_movie, "N/A");
    assert_eq!(stats.longest_movie, "N/A");
    assert_eq!(stats.shortest_movie, "N/A");
}

#[test]
fn stats_on_seed() {
    let db = seeded();
    let stats = StatsAggregator::new(&db).summarize();
    assert_eq!(stats.total_movies, 15);
    assert_eq!(stats.total_genres, 11);
    assert_eq!(stats.most_popular_genre, "Drama");
    assert!(["Parasite", "Avengers: Endgame", "Joker"].contains(&stats.newest_movie.as_str()));
    assert_eq!(stats.oldest_movie, "The Godfather");
    assert_eq!(stats.longest_movie, "Titanic");
    assert_eq!(stats.shortest_movie, "The Lion King");
    assert!((stats.average_rating - 8.77).abs() < 0.01);
}

#[test]
fn every_preset_runs_on_seed() {
    let db = seeded();
    let executor = QueryExecutor::new(&db);
    for preset in PRESETS {
        let result = executor.execute(preset.sql).unwrap();
        assert!(!result.is_status(), "{}", preset.title);
        assert!(result.row_count() > 0, "{}", preset.title);
    }
}

#[test]
fn failed_query_leaves_database_usable() {
    let db = seeded();
    let executor = QueryExecutor::new(&db);
    let err = executor.execute("SELEC * FROM movies").unwrap_err();
    assert!(matches!(err, SandboxError::Execution(_)));
    assert!(err.to_string().contains("syntax error"));

    let result = executor.execute("SELECT COUNT(*) FROM ratings").unwrap();
    assert_eq!(result.rows, vec![vec![Scalar::Number(60.0)]]);
}
