use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};

use ariadne::{Color, ColorGenerator, Config as ReportConfig, IndexType, Label, Report, ReportKind, Source};
use clap::{Parser as ClapParser, Subcommand};
use log::{LevelFilter, Log, Metadata, Record};
use stubgen::{Config, Diagnostic, Error, Expander, error::SyntaxError};
use termcolor::{ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(ClapParser)]
#[command(version, about)]
pub struct Arguments {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Expand declarations on worker threads
    #[arg(short = 'j', long, global = true)]
    parallel: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the unit with every annotated declaration expanded
    Expand { input: PathBuf },
    /// Report diagnostics without printing generated code
    Check { input: PathBuf },
    /// Apply every available fix-it
    Fix {
        input: PathBuf,
        /// Overwrite the input file instead of printing the result
        #[arg(long)]
        in_place: bool,
    },
}

/// Minimal stderr sink for the `log` facade.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let thread = std::thread::current();
        eprintln!(
            "[{} {:<5} {} ({})] {}",
            chrono::Local::now().naive_local().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            thread.name().unwrap_or("unnamed"),
            record.args()
        );
    }

    fn flush(&self) {}
}

fn install_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let logger: &'static StderrLogger = Box::leak(Box::new(StderrLogger { level }));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn report_diagnostic(file: &str, source: &str, diagnostic: &Diagnostic, color: Color) {
    let span = (file.to_string(), diagnostic.span.start..diagnostic.span.end);
    let mut report = Report::build(ReportKind::Error, span.clone())
        .with_config(ReportConfig::default().with_index_type(IndexType::Byte))
        .with_code(diagnostic.id())
        .with_message(&diagnostic.message)
        .with_label(
            Label::new(span)
                .with_message(format!("while expanding '{}'", diagnostic.property))
                .with_color(color),
        );
    if let Some(fix) = &diagnostic.fix {
        report = report.with_help(&fix.description);
    }
    if let Err(e) = report
        .finish()
        .eprint((file.to_string(), Source::from(source.to_string())))
    {
        eprintln!("{diagnostic} ({e})");
    }
}

fn report_syntax_error(file: &str, source: &str, error: &SyntaxError, color: Color) {
    let span = (file.to_string(), error.span.start..error.span.end);
    let report = Report::build(ReportKind::Error, span.clone())
        .with_config(ReportConfig::default().with_index_type(IndexType::Byte))
        .with_message(&error.message)
        .with_label(
            Label::new(span)
                .with_message("The error occurred here")
                .with_color(color),
        )
        .finish();
    if let Err(e) = report.eprint((file.to_string(), Source::from(source.to_string()))) {
        eprintln!("{error} ({e})");
    }
}

/// One colored summary line on stderr.
fn status(ok: bool, message: &str) -> std::io::Result<()> {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let mut spec = ColorSpec::new();
    spec.set_bold(true).set_fg(Some(if ok {
        termcolor::Color::Green
    } else {
        termcolor::Color::Red
    }));
    stderr.set_color(&spec)?;
    write!(stderr, "{}", if ok { "ok" } else { "error" })?;
    stderr.reset()?;
    writeln!(stderr, ": {message}")
}

fn load_config(args: &Arguments) -> stubgen::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    config.parallel |= args.parallel;
    Ok(config)
}

fn run(args: &Arguments, source: &mut String, file: &mut String) -> stubgen::Result<ExitCode> {
    let expander = Expander::new(load_config(args)?);
    let input: &Path = match &args.command {
        Command::Expand { input } | Command::Check { input } | Command::Fix { input, .. } => input,
    };
    *file = input.display().to_string();
    *source = std::fs::read_to_string(input)?;

    let mut colors = ColorGenerator::new();
    let color = colors.next();

    match &args.command {
        Command::Expand { .. } => {
            let expansion = expander.expand(source)?;
            for diagnostic in &expansion.diagnostics {
                report_diagnostic(file, source, diagnostic, color);
            }
            print!("{}", expansion.source);
            Ok(if expansion.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Check { .. } => {
            let diagnostics = expander.check(source)?;
            for diagnostic in &diagnostics {
                report_diagnostic(file, source, diagnostic, color);
            }
            if diagnostics.is_empty() {
                status(true, &format!("{file}: no diagnostics"))?;
                Ok(ExitCode::SUCCESS)
            } else {
                status(false, &format!("{file}: {} diagnostic(s)", diagnostics.len()))?;
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Fix { input, in_place } => {
            let diagnostics = expander.check(source)?;
            let fixable = diagnostics.iter().filter(|d| d.fix.is_some()).count();
            let fixed = stubgen::apply_fixes(source, &diagnostics)?;
            if *in_place {
                std::fs::write(input, &fixed)?;
            } else {
                print!("{fixed}");
            }
            let remaining = diagnostics.len() - fixable;
            status(
                remaining == 0,
                &format!("{file}: applied {fixable} fix-it(s), {remaining} diagnostic(s) need manual attention"),
            )?;
            Ok(if remaining == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    install_logger(args.verbose);

    let mut source = String::new();
    let mut file = String::from("<input>");
    match run(&args, &mut source, &mut file) {
        Ok(code) => code,
        Err(Error::Syntax(errors)) => {
            eprintln!("Failed to parse {file}:");
            let mut colors = ColorGenerator::new();
            let color = colors.next();
            for error in &errors {
                report_syntax_error(&file, &source, error, color);
            }
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
