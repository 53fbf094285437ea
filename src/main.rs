use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use slideshow::api::{self, SlideRequest};
use slideshow::config::Config;
use slideshow::import::import_folder_async;
use slideshow::state::library::{SlideLibrary, SlideRepository};
use slideshow::state::seed::seed_defaults;
use slideshow::viewer::{Command, Viewer};
use slideshow::Result;

/// Slideshow viewer and slide catalog manager
#[derive(Parser, Debug)]
#[command(name = "slideshow", version)]
struct Cli {
    /// Slide catalog database (overrides SLIDESHOW_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print every slide as JSON
    List,
    /// Add a slide
    Add {
        image_path: String,
        description: String,
    },
    /// Overwrite a slide
    Update {
        id: String,
        image_path: String,
        description: String,
    },
    /// Delete a slide
    Delete { id: String },
    /// Add the built-in destination slides to an empty catalog
    Seed,
    /// Add every image under a folder
    Import { folder: PathBuf },
    /// Browse the slides interactively (default)
    View {
        /// Wrap from the last slide to the first and back
        #[arg(long)]
        wrap: bool,
    },
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let command = cli.command.unwrap_or(Cmd::View { wrap: false });
    match run(command, config) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            eprintln!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Cmd, mut config: Config) -> Result<ExitCode> {
    match command {
        Cmd::List => crud(&config, SlideRequest::List),
        Cmd::Add {
            image_path,
            description,
        } => crud(
            &config,
            SlideRequest::Create {
                image_path: Some(image_path),
                description: Some(description),
            },
        ),
        Cmd::Update {
            id,
            image_path,
            description,
        } => crud(
            &config,
            SlideRequest::Update {
                id: Some(id),
                image_path: Some(image_path),
                description: Some(description),
            },
        ),
        Cmd::Delete { id } => crud(&config, SlideRequest::Delete { id: Some(id) }),
        Cmd::Seed => {
            let mut library = SlideLibrary::open(&config.db_path)?;
            let added = seed_defaults(&mut library)?;
            library.close()?;
            println!("🌴 Added {added} default slides");
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Import { folder } => {
            // Background import runs on the blocking pool of a small runtime
            let runtime = tokio::runtime::Builder::new_current_thread().build()?;
            let result = runtime.block_on(import_folder_async(folder, config.db_path))?;
            println!(
                "✅ Import complete! Added {} slides, skipped {} duplicates.",
                result.imported, result.skipped
            );
            Ok(ExitCode::SUCCESS)
        }
        Cmd::View { wrap } => {
            config.wrap_around |= wrap;
            view(&config)
        }
    }
}

/// Send one request through the CRUD surface and print the outcome.
fn crud(config: &Config, request: SlideRequest) -> Result<ExitCode> {
    let mut library = SlideLibrary::open(&config.db_path)?;
    let response = api::handle(&mut library, request);
    library.close()?;

    println!("{}", response.status.code());
    if let Some(body) = response.body {
        println!("{body}");
    }

    Ok(if response.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn view(config: &Config) -> Result<ExitCode> {
    let library = SlideLibrary::open(&config.db_path)?;
    let mut viewer = Viewer::with_config(library, config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    session(&mut viewer, stdin.lock(), &mut stdout.lock())?;

    let stats = viewer.index().stats();
    info!(
        hits = stats.hits,
        walks = stats.walks,
        steps = stats.steps,
        "Position lookups"
    );

    viewer.into_repository().close()?;
    Ok(ExitCode::SUCCESS)
}

/// Read commands from `input` until it ends or the user quits.
fn session<R, I, W>(viewer: &mut Viewer<R>, input: I, out: &mut W) -> Result<()>
where
    R: SlideRepository,
    I: BufRead,
    W: Write,
{
    print_help(out)?;
    show(viewer, out)?;
    prompt(out)?;

    for line in input.lines() {
        let line = line?;
        match line.trim() {
            "" => {}
            "q" | "quit" | "exit" => break,
            "?" | "help" => print_help(out)?,
            text => match Command::parse(text).and_then(|command| viewer.dispatch(command)) {
                Ok(()) => show(viewer, out)?,
                Err(err) => writeln!(out, "⚠️  {err}")?,
            },
        }
        prompt(out)?;
    }
    Ok(())
}

fn show<R: SlideRepository, W: Write>(viewer: &Viewer<R>, out: &mut W) -> io::Result<()> {
    match viewer.current() {
        Some(slide) => writeln!(out, "\n{slide}"),
        None => writeln!(out, "\n(no slides, try `add <image_path> <description>`)"),
    }
}

fn print_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    for (names, help) in Command::help() {
        writeln!(out, "  {:<22} {}", names.join(", "), help)?;
    }
    writeln!(out, "  {:<22} {}", "help, ?", "show this list")?;
    writeln!(out, "  {:<22} {}", "quit, q", "leave the slideshow")
}

fn prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slideshow::state::data::SlideRecord;
    use slideshow::state::lookup::CachePolicy;

    fn run_session(descriptions: &[&str], input: &str) -> String {
        let mut library = SlideLibrary::open_in_memory().unwrap();
        for d in descriptions {
            library
                .create_slide(&SlideRecord::new(format!("{d}.jpg"), *d))
                .unwrap();
        }
        let mut viewer = Viewer::new(library, CachePolicy::Versioned, false).unwrap();

        let mut out = Vec::new();
        session(&mut viewer, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_prompt_shows_before_first_input() {
        let output = run_session(&["A", "B"], "");
        assert!(output.contains("[1/2] #1 A.jpg"));
        assert!(output.ends_with("> "));
    }

    #[test]
    fn test_one_prompt_per_line() {
        let output = run_session(&["A", "B"], "next\nnope\nq\n");
        assert_eq!(output.matches("\n> ").count(), 3);
        assert!(output.contains("[2/2] #2 B.jpg"));
        assert!(output.contains("unknown command: \"nope\""));
    }
}
