//! CLI entry point for `urlscan`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use urlscan::encoding::LocaleSnapshot;
use urlscan::error::{ScanError, EXIT_FAILURE};
use urlscan::i18n;
use urlscan::input::{ByteSource, TerminalGuard};
use urlscan::model::message::StructuredMessage;
use urlscan::parser::header::parse_date;
use urlscan::pipeline::{self, MessageConsumer, PreparedMessage};

#[derive(Parser)]
#[command(name = "urlscan", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Message file to read (standard input if omitted)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Decode the input with this encoding only
    #[arg(short, long, value_name = "ENCODING", env = "URLSCAN_ENCODING")]
    encoding: Option<String>,

    /// Print the decoded structure without rebinding the terminal
    #[arg(short, long)]
    dump: bool,

    /// Output the summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Language (en, es). Defaults to system locale.
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Detect language from --lang or the environment, before clap handles --help.
fn detect_lang_early() -> i18n::Lang {
    let args: Vec<String> = std::env::args().collect();
    for (i, arg) in args.iter().enumerate() {
        let code = if arg == "--lang" {
            args.get(i + 1).map(String::as_str)
        } else {
            arg.strip_prefix("--lang=")
        };
        if let Some(lang) = code.and_then(i18n::Lang::from_code) {
            return lang;
        }
    }
    i18n::detect_system_lang()
}

/// Build the clap command with localized about strings.
fn build_localized_command() -> clap::Command {
    Cli::command()
        .about(i18n::app_about())
        .mut_subcommand("completions", |s| s.about(i18n::help_cmd_completions()))
        .mut_subcommand("manpage", |s| s.about(i18n::help_cmd_manpage()))
}

fn main() -> ExitCode {
    i18n::set_lang(detect_lang_early());

    let matches = build_localized_command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = match e.downcast_ref::<ScanError>() {
                Some(scan) => {
                    eprintln!("urlscan: {}", user_message(scan));
                    scan.exit_code()
                }
                None => {
                    eprintln!("urlscan: {e}");
                    EXIT_FAILURE
                }
            };
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Completions { shell }) => return cmd_completions(shell),
        Some(Commands::Manpage) => return cmd_manpage(),
        None => {}
    }

    let config = urlscan::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);
    tracing::debug!(lang = i18n::lang().code(), "Interface language");

    // Locale is read once here and passed down explicitly.
    let locale = LocaleSnapshot::from_env();
    let candidates = pipeline::build_candidates(&locale, &config.decoding, cli.encoding.as_deref())?;
    tracing::debug!(candidates = ?candidates.as_slice(), "Encoding candidates");

    let source = match cli.file {
        Some(path) => ByteSource::File(path),
        None => ByteSource::Stdin,
    };
    let terminal = (!cli.dump).then(|| TerminalGuard::new(&config.terminal.device));
    if let Some(guard) = &terminal {
        tracing::debug!(device = %guard.device().display(), "Terminal guard armed");
    }

    let mut summary = PartSummary { json: cli.json };
    pipeline::run(source, &candidates, terminal, &mut summary)
}

/// Localized one-line message for a fatal error.
fn user_message(err: &ScanError) -> String {
    match err {
        ScanError::DecodingExhausted { .. } => i18n::err_decoding_exhausted().to_string(),
        ScanError::NoControllingTerminal { device, .. } => {
            format!("{}: {}", i18n::err_no_terminal(), device.display())
        }
        ScanError::FileNotFound(path) => {
            format!("{}: {}", i18n::err_file_not_found(), path.display())
        }
        other => other.to_string(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &urlscan::config::Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = urlscan::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "urlscan.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "urlscan", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let man = clap_mangen::Man::new(Cli::command());
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Built-in consumer: prints the decoded structure of the message.
struct PartSummary {
    json: bool,
}

impl MessageConsumer for PartSummary {
    fn consume(&mut self, prepared: &PreparedMessage) -> anyhow::Result<()> {
        if self.json {
            print_summary_json(prepared)
        } else {
            print_summary_table(prepared);
            Ok(())
        }
    }
}

/// Every node with its depth, in document order.
fn nodes_with_depth(root: &StructuredMessage) -> Vec<(usize, &StructuredMessage)> {
    let mut result = Vec::new();
    let mut stack = vec![(0, root)];
    while let Some((depth, node)) = stack.pop() {
        result.push((depth, node));
        stack.extend(node.parts().iter().rev().map(|p| (depth + 1, p)));
    }
    result
}

fn payload_size(node: &StructuredMessage) -> u64 {
    match node.payload() {
        urlscan::model::Payload::Text(text) => text.len() as u64,
        urlscan::model::Payload::Parts(_) => 0,
    }
}

/// Print the summary as a human-readable table.
fn print_summary_table(prepared: &PreparedMessage) {
    use humansize::{format_size, BINARY};

    let msg = &prepared.message;
    let yes_no = |b: bool| if b { i18n::msg_yes() } else { i18n::msg_no() };

    println!();
    println!("  {:<14} {}", i18n::msg_source(), prepared.origin);
    println!("  {:<14} {}", i18n::msg_encoding(), prepared.encoding);
    println!(
        "  {:<14} {}",
        i18n::msg_plain_text(),
        yes_no(prepared.plain_text_fix)
    );
    if let Some(subject) = msg.header_decoded("Subject") {
        println!("  {:<14} {}", i18n::msg_subject(), subject);
    }
    if let Some(date) = msg.header("Date").and_then(parse_date) {
        println!(
            "  {:<14} {}",
            i18n::msg_date(),
            date.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("  {}:", i18n::msg_parts());
    for (depth, node) in nodes_with_depth(msg) {
        let indent = "  ".repeat(depth);
        let content_type = node.content_type().mime_type();
        println!(
            "    {indent}{:<32} {:<12} {:>10}",
            content_type,
            node.charset().unwrap_or("-"),
            format_size(payload_size(node), BINARY)
        );
    }
    println!();
}

/// Print the summary as JSON.
fn print_summary_json(prepared: &PreparedMessage) -> anyhow::Result<()> {
    let msg = &prepared.message;
    let parts: Vec<serde_json::Value> = nodes_with_depth(msg)
        .into_iter()
        .map(|(depth, node)| {
            serde_json::json!({
                "depth": depth,
                "content_type": node.content_type().mime_type(),
                "charset": node.charset(),
                "size": payload_size(node),
            })
        })
        .collect();

    let output = serde_json::json!({
        "source": prepared.origin,
        "encoding": prepared.encoding,
        "plain_text": prepared.plain_text_fix,
        "subject": msg.header_decoded("Subject"),
        "date": msg.header("Date").and_then(parse_date).map(|d| d.to_rfc3339()),
        "charsets": prepared.report,
        "parts": parts,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
