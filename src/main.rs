use sql_sandbox::config::{parse_delimiter, SandboxConfig};
use sql_sandbox::engine::Database;
use sql_sandbox::export;
use sql_sandbox::ingestion::{CsvDialect, CsvImporter, ImportSpec, ImportSummary};
use sql_sandbox::observability::init_tracing;
use sql_sandbox::presets::{self, PRESETS};
use sql_sandbox::query::QueryExecutor;
use sql_sandbox::result::TabularResult;
use sql_sandbox::stats::{StatsAggregator, StatsSummary};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "sql-sandbox")]
#[command(about = "Practice SQL against an embedded movie dataset")]
#[command(version)]
struct Args {
    /// CSV file to import before running the command, as FILE or FILE=TABLE (repeatable)
    #[arg(short, long = "import", value_name = "FILE[=TABLE]")]
    imports: Vec<String>,

    /// Field delimiter for imports (a character, or tab/comma/semicolon/pipe)
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Honor double-quoted fields in imported files
    #[arg(long)]
    quoted: bool,

    /// Start from an empty database instead of the sample dataset
    #[arg(long)]
    no_seed: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a SQL statement (or script) and print the result
    Query {
        sql: String,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List preset queries, or run one by number or title
    Preset {
        name: Option<String>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Print dataset statistics
    Stats {
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List tables with their columns and row counts
    Tables,
    /// Run a query and write the result as CSV
    Export {
        sql: String,

        /// Directory for the export (default: SQL_SANDBOX_EXPORT_DIR or .)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Interactive shell (default)
    Shell,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = SandboxConfig::from_env()?;
    init_tracing(&config.log_filter);

    let args = Args::parse();

    let delimiter = match &args.delimiter {
        Some(value) => parse_delimiter(value).map_err(|e| anyhow!("--delimiter: {}", e))?,
        None => config.delimiter,
    };
    let dialect = if args.quoted { CsvDialect::Quoted } else { CsvDialect::Simple };

    let db = Database::open(config.seed && !args.no_seed)?;

    for import in &args.imports {
        let summary = import_file(&db, import, delimiter, dialect)?;
        print_import(&summary);
    }

    let outcome = match args.command.unwrap_or(Commands::Shell) {
        Commands::Query { sql, format } => run_query(&db, &sql, format),
        Commands::Preset { name: None, .. } => {
            print_presets();
            Ok(())
        }
        Commands::Preset { name: Some(name), format } => {
            let preset = presets::find(&name).ok_or_else(|| anyhow!("unknown preset {:?}", name))?;
            run_query(&db, preset.sql, format)
        }
        Commands::Stats { format } => print_stats(&StatsAggregator::new(&db).summarize(), format),
        Commands::Tables => print_tables(&db),
        Commands::Export { sql, out_dir } => {
            let result = QueryExecutor::new(&db).execute(&sql)?;
            let dir = out_dir.unwrap_or_else(|| config.export_dir.clone());
            let path = export::write_csv(&result, &dir)?;
            println!("Exported {} rows to {}", result.row_count(), path.display());
            Ok(())
        }
        Commands::Shell => {
            let mut shell = Shell::new(&db, config.export_dir.clone(), delimiter, dialect)?;
            shell.run()
        }
    };

    db.close()?;
    outcome
}

/// Import `FILE` or `FILE=TABLE`.
fn import_file(
    db: &Database,
    arg: &str,
    delimiter: char,
    dialect: CsvDialect,
) -> Result<ImportSummary> {
    let (path, table) = match arg.rsplit_once('=') {
        Some((path, table)) if !table.is_empty() && !table.contains(['/', '\\']) => {
            (path, Some(table))
        }
        _ => (arg, None),
    };

    let mut spec = ImportSpec::from_path(path)
        .with_context(|| format!("Failed to read {}", path))?
        .with_delimiter(delimiter)
        .with_dialect(dialect);
    if let Some(table) = table {
        spec = spec.with_table_name(table);
    }

    Ok(CsvImporter::new(db).import(spec)?)
}

fn run_query(db: &Database, sql: &str, format: OutputFormat) -> Result<()> {
    let result = QueryExecutor::new(db).execute(sql)?;
    print_result(&result, format)
}

fn print_result(result: &TabularResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", result.render_table()),
        OutputFormat::Csv => println!("{}", export::to_csv(result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }
    Ok(())
}

fn print_import(summary: &ImportSummary) {
    println!(
        "Successfully imported {} rows into table '{}' ({})",
        summary.row_count,
        summary.table_name,
        summary.columns.join(", ")
    );
}

fn print_presets() {
    for (idx, preset) in PRESETS.iter().enumerate() {
        println!("{:>2}. {} [{}]", idx + 1, preset.title, preset.difficulty);
        println!("    {}", preset.description);
    }
}

fn print_stats(stats: &StatsSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(stats)?),
        OutputFormat::Table | OutputFormat::Csv => {
            println!("Total movies:        {}", stats.total_movies);
            println!("Genres:              {}", stats.total_genres);
            println!("Average rating:      {:.2}", stats.average_rating);
            println!("Most popular genre:  {}", stats.most_popular_genre);
            println!("Newest movie:        {}", stats.newest_movie);
            println!("Oldest movie:        {}", stats.oldest_movie);
            println!("Longest movie:       {}", stats.longest_movie);
            println!("Shortest movie:      {}", stats.shortest_movie);
        }
    }
    Ok(())
}

fn print_tables(db: &Database) -> Result<()> {
    let tables = db.tables()?;
    if tables.is_empty() {
        println!("No tables");
    }
    for table in tables {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| match c.declared_type.as_str() {
                "" => c.name.clone(),
                ty => format!("{} {}", c.name, ty),
            })
            .collect();
        println!("{} ({} rows): {}", table.name, table.row_count, columns.join(", "));
    }
    Ok(())
}

/// Interactive shell. SQL runs once a line ends with `;`; lines starting
/// with `!` are shell commands.
struct Shell<'a> {
    db: &'a Database,
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    /// Result of the last successful query, for !export
    last_result: Option<TabularResult>,
    export_dir: PathBuf,
    delimiter: char,
    dialect: CsvDialect,
}

impl<'a> Shell<'a> {
    fn new(
        db: &'a Database,
        export_dir: PathBuf,
        delimiter: char,
        dialect: CsvDialect,
    ) -> Result<Self> {
        let editor = DefaultEditor::new()?;
        let history_path =
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".sql_sandbox_history"));
        Ok(Self {
            db,
            editor,
            history_path,
            last_result: None,
            export_dir,
            delimiter,
            dialect,
        })
    }

    fn run(&mut self) -> Result<()> {
        if let Some(path) = &self.history_path {
            if let Err(e) = self.editor.load_history(path) {
                debug!("No shell history loaded: {}", e);
            }
        }

        println!("SQL sandbox. Enter SQL terminated by ';', !help for commands, Ctrl-D to exit.");

        let mut buffer = String::new();
        loop {
            let prompt = if buffer.is_empty() { "sandbox> " } else { "      -> " };
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if buffer.is_empty() && line.trim_start().starts_with('!') {
                        self.editor.add_history_entry(line.as_str())?;
                        if let Err(e) = self.execute_command(line.trim()) {
                            eprintln!("Error: {}", e);
                        }
                        continue;
                    }

                    if !buffer.is_empty() {
                        buffer.push('\n');
                    }
                    buffer.push_str(&line);

                    if buffer.trim_end().ends_with(';') {
                        let statement = std::mem::take(&mut buffer);
                        self.editor.add_history_entry(statement.as_str())?;
                        self.execute_sql(&statement);
                    }
                }
                Err(ReadlineError::Interrupted) => buffer.clear(),
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(path) = &self.history_path {
            self.editor.save_history(path)?;
        }
        Ok(())
    }

    fn execute_sql(&mut self, statement: &str) {
        match QueryExecutor::new(self.db).execute(statement) {
            Ok(result) => {
                println!("{}", result.render_table());
                self.last_result = Some(result);
            }
            Err(e) => {
                self.last_result = None;
                eprintln!("Error: {}", e);
            }
        }
    }

    fn execute_command(&mut self, input: &str) -> Result<()> {
        let mut parts = input.split_whitespace();
        let Some(command) = parts.next() else {
            bail!("expected command");
        };
        let args: Vec<&str> = parts.collect();

        match (command, args.as_slice()) {
            ("!help", []) => println!(
                r#"
Enter a SQL statement terminated by a semicolon (;) to execute it, or Ctrl-D to
exit. The following commands are also available:

    !export [DIR]          Write the last result as CSV
    !help                  This help message
    !import FILE [TABLE]   Import a CSV file as a table
    !preset N|TITLE        Run a preset query
    !presets               List preset queries
    !stats                 Dataset statistics
    !table NAME            Display a table's columns
    !tables                List tables
"#
            ),
            ("!tables", []) => print_tables(self.db)?,
            ("!table", [name]) => {
                for column in self.db.describe_table(name)? {
                    println!("{} {}", column.name, column.declared_type);
                }
            }
            ("!stats", []) => {
                print_stats(&StatsAggregator::new(self.db).summarize(), OutputFormat::Table)?
            }
            ("!presets", []) => print_presets(),
            ("!preset", [_, ..]) => {
                let key = args.join(" ");
                let preset =
                    presets::find(&key).ok_or_else(|| anyhow!("unknown preset {:?}", key))?;
                println!("{}", preset.sql);
                self.execute_sql(preset.sql);
            }
            ("!import", [file]) | ("!import", [file, _]) => {
                let mut spec = ImportSpec::from_path(*file)
                    .with_context(|| format!("Failed to read {}", file))?
                    .with_delimiter(self.delimiter)
                    .with_dialect(self.dialect);
                if let [_, table] = args.as_slice() {
                    spec = spec.with_table_name(*table);
                }
                let summary = CsvImporter::new(self.db).import(spec)?;
                print_import(&summary);
            }
            ("!export", []) | ("!export", [_]) => {
                let result = self
                    .last_result
                    .as_ref()
                    .ok_or_else(|| anyhow!("no result to export"))?;
                let dir = args
                    .first()
                    .map(|dir| PathBuf::from(*dir))
                    .unwrap_or_else(|| self.export_dir.clone());
                let path = export::write_csv(result, &dir)?;
                info!(path = %path.display(), "Shell export written");
                println!("Exported {} rows to {}", result.row_count(), path.display());
            }
            (command, _) => bail!("unknown command or wrong arguments: {}", command),
        }
        Ok(())
    }
}
