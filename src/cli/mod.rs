use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::application::{BillIdSource, BillingService, SequentialBillIds};
use crate::domain::BillId;
use crate::io::ExportFormat;

/// Tally - in-memory billing ledger
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Record clients, bills and line items from a shell and export bills as CSV")]
#[command(version)]
pub struct Cli {
    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Number given to the first bill; later bills count up from it
    #[arg(long, default_value_t = SequentialBillIds::DEFAULT_START, allow_hyphen_values = true)]
    pub first_bill_id: BillId,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// One line of shell input.
#[derive(Parser)]
#[command(no_binary_name = true)]
#[command(disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

/// Shell commands. Free-text arguments may start with `-`, so `-h` is not a
/// help flag here; use `help <command>` instead.
#[derive(Subcommand)]
pub enum ShellCommand {
    /// Register a client (no-op if the name is already known)
    #[command(disable_help_flag = true)]
    LogClient {
        /// Client name
        #[arg(allow_hyphen_values = true)]
        name: String,
    },

    /// Add a bill to an existing client
    #[command(disable_help_flag = true)]
    AddBill {
        /// Client name
        #[arg(allow_hyphen_values = true)]
        client: String,

        /// Bill date (YYYY-MM-DD)
        #[arg(allow_hyphen_values = true)]
        date: String,
    },

    /// Add a product to a client's bill
    #[command(disable_help_flag = true)]
    AddProduct {
        /// Client name
        #[arg(allow_hyphen_values = true)]
        client: String,

        /// Bill date (YYYY-MM-DD)
        #[arg(allow_hyphen_values = true)]
        date: String,

        /// Product id (unparseable input is recorded as 0)
        #[arg(allow_hyphen_values = true)]
        product_id: String,

        /// Product name
        #[arg(allow_hyphen_values = true)]
        name: String,

        /// Price, e.g. "19.99" (unparseable input is recorded as 0)
        #[arg(allow_hyphen_values = true)]
        price: String,
    },

    /// List client names
    ShowStore,

    /// List a client's bills
    #[command(disable_help_flag = true)]
    ShowClient {
        /// Client name
        #[arg(allow_hyphen_values = true)]
        name: String,
    },

    /// Show a bill with its products
    #[command(disable_help_flag = true)]
    ShowBill {
        /// Client name
        #[arg(allow_hyphen_values = true)]
        client: String,

        /// Bill date (YYYY-MM-DD)
        #[arg(allow_hyphen_values = true)]
        date: String,
    },

    /// Show every client with its last modification time
    Summary,

    /// Export one bill as CSV
    #[command(disable_help_flag = true)]
    ExportBill {
        /// Client name
        #[arg(allow_hyphen_values = true)]
        client: String,

        /// Bill date (YYYY-MM-DD)
        #[arg(allow_hyphen_values = true)]
        date: String,

        /// Output file (overwritten)
        #[arg(allow_hyphen_values = true)]
        path: PathBuf,
    },

    /// Export the whole store
    #[command(disable_help_flag = true)]
    ExportStore {
        /// Output file (overwritten)
        #[arg(allow_hyphen_values = true)]
        path: PathBuf,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// What the shell should do after a line has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print this text and read the next line.
    Output(String),
    /// Nothing to print (blank line or comment).
    Silent,
    Quit,
}

/// Counters reported when the shell exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellStats {
    pub executed: usize,
    pub failed: usize,
}

/// Split a line into words. Double quotes group words and are removed.
pub fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        anyhow::bail!("Unterminated quote in: {}", line);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Line-oriented front end over [`BillingService`].
pub struct Shell<G: BillIdSource = SequentialBillIds> {
    service: BillingService<G>,
}

impl<G: BillIdSource> Shell<G> {
    pub fn new(service: BillingService<G>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &BillingService<G> {
        &self.service
    }

    /// Parse and execute a single line.
    pub fn execute_line(&mut self, line: &str) -> Result<Outcome> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Outcome::Silent);
        }

        let words = split_words(line)?;
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) if !e.use_stderr() => return Ok(Outcome::Output(e.render().to_string())),
            Err(e) => {
                let rendered = e.render().to_string();
                let message = rendered.trim_end().trim_start_matches("error: ");
                anyhow::bail!("{}", message);
            }
        };

        self.execute(parsed.command)
    }

    fn execute(&mut self, command: ShellCommand) -> Result<Outcome> {
        let output = match command {
            ShellCommand::LogClient { name } => {
                self.service.log_client(&name)?;
                "Client logged".to_string()
            }

            ShellCommand::AddBill { client, date } => {
                self.service.add_bill(&client, &date)?;
                "Bill added".to_string()
            }

            ShellCommand::AddProduct {
                client,
                date,
                product_id,
                name,
                price,
            } => {
                self.service
                    .add_product(&client, &date, &product_id, &name, &price)?;
                "Product added".to_string()
            }

            ShellCommand::ShowStore => self.service.show_store(),

            ShellCommand::ShowClient { name } => self.service.show_client(&name)?,

            ShellCommand::ShowBill { client, date } => self.service.show_bill(&client, &date)?,

            ShellCommand::Summary => self.service.summary(),

            ShellCommand::ExportBill { client, date, path } => {
                let count = self.service.export_bill(&client, &date, &path)?;
                format!("Exported {} products to {}", count, path.display())
            }

            ShellCommand::ExportStore { path, format } => {
                let format: ExportFormat = format.parse().map_err(|e| {
                    anyhow::anyhow!("Invalid export format '{}'. Valid formats: csv, json", e)
                })?;
                let count = self.service.export_store(&path, format)?;
                let unit = match format {
                    ExportFormat::Csv => "products",
                    ExportFormat::Json => "clients",
                };
                format!("Exported {} {} to {}", count, unit, path.display())
            }

            ShellCommand::Quit => return Ok(Outcome::Quit),
        };

        Ok(Outcome::Output(output))
    }

    /// Execute lines from `input` until it is exhausted or `quit` is read.
    ///
    /// Failing commands are reported on `err` and do not stop the shell.
    pub fn run<R: BufRead, W: Write, E: Write>(
        &mut self,
        input: R,
        mut out: W,
        mut err: E,
        prompt: bool,
    ) -> Result<ShellStats> {
        let mut stats = ShellStats::default();
        let mut lines = input.lines();

        loop {
            if prompt {
                write!(out, "> ")?;
                out.flush()?;
            }

            let Some(line) = lines.next() else {
                break;
            };
            let line = line.context("Failed to read command")?;

            match self.execute_line(&line) {
                Ok(Outcome::Output(text)) => {
                    stats.executed += 1;
                    if !text.is_empty() {
                        writeln!(out, "{}", text.trim_end())?;
                    }
                }
                Ok(Outcome::Silent) => {}
                Ok(Outcome::Quit) => break,
                Err(e) => {
                    stats.failed += 1;
                    debug!(command = %line.trim(), error = %e, "command failed");
                    writeln!(err, "error: {}", e)?;
                }
            }
        }

        out.flush()?;
        Ok(stats)
    }

    /// Release the store held by the service.
    pub fn shutdown(mut self) {
        self.service.shutdown();
    }
}

impl Cli {
    /// Install the log subscriber. `RUST_LOG` takes precedence over `--verbose`.
    pub fn init_logging(&self) {
        let default_level = if self.verbose { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    pub fn run(self) -> Result<()> {
        let bill_ids = SequentialBillIds::starting_at(self.first_bill_id);
        let mut shell = Shell::new(BillingService::with_bill_ids(bill_ids));

        let stats = match &self.script {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open script file: {}", path.display()))?;
                shell.run(BufReader::new(file), io::stdout(), io::stderr(), false)?
            }
            None => {
                let stdin = io::stdin();
                let prompt = stdin.is_terminal();
                shell.run(stdin.lock(), io::stdout(), io::stderr(), prompt)?
            }
        };

        info!(executed = stats.executed, failed = stats.failed, "shell finished");
        shell.shutdown();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Shell {
        Shell::new(BillingService::new())
    }

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words("add-bill Alice 2024-01-01").unwrap(),
            vec!["add-bill", "Alice", "2024-01-01"]
        );
        assert_eq!(
            split_words(r#"log-client "Acme Corp"  "#).unwrap(),
            vec!["log-client", "Acme Corp"]
        );
        assert_eq!(split_words(r#"x """#).unwrap(), vec!["x", ""]);
        assert!(split_words(r#"log-client "Acme"#).is_err());
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let mut shell = shell();
        assert_eq!(shell.execute_line("").unwrap(), Outcome::Silent);
        assert_eq!(shell.execute_line("   # note").unwrap(), Outcome::Silent);
    }

    #[test]
    fn test_command_messages() {
        let mut shell = shell();
        assert_eq!(
            shell.execute_line("log-client Alice").unwrap(),
            Outcome::Output("Client logged".into())
        );
        assert_eq!(
            shell.execute_line("add-bill Alice 2024-01-01").unwrap(),
            Outcome::Output("Bill added".into())
        );
        assert_eq!(
            shell
                .execute_line(r#"add-product Alice 2024-01-01 7 "Blue Widget" -1.5"#)
                .unwrap(),
            Outcome::Output("Product added".into())
        );
        assert_eq!(shell.execute_line("quit").unwrap(), Outcome::Quit);
        assert_eq!(shell.execute_line("exit").unwrap(), Outcome::Quit);

        let bill = shell
            .service()
            .store()
            .find_client("Alice")
            .and_then(|c| c.find_bill_by_date("2024-01-01"))
            .unwrap();
        assert_eq!(bill.products[0].name, "Blue Widget");
        assert_eq!(bill.products[0].price, -1.5);
    }

    #[test]
    fn test_errors_are_reported() {
        let mut shell = shell();
        let err = shell.execute_line("add-bill Nobody 2024-01-01").unwrap_err();
        assert_eq!(err.to_string(), "No such client: Nobody");

        assert!(shell.execute_line("log-client").is_err());
        assert!(shell.execute_line("frobnicate").is_err());
    }

    #[test]
    fn test_values_starting_with_hyphen() {
        let mut shell = shell();
        shell.execute_line(r#"log-client "-Bob""#).unwrap();
        shell.execute_line("log-client -h").unwrap();
        shell.execute_line("add-bill -Bob 2024-01-01").unwrap();
        shell
            .execute_line(r#"add-product -Bob 2024-01-01 1 "-10% coupon" -1"#)
            .unwrap();

        assert_eq!(shell.service().show_store(), "-Bob\n-h");
        let bill = shell
            .service()
            .store()
            .find_client("-Bob")
            .and_then(|c| c.find_bill_by_date("2024-01-01"))
            .unwrap();
        assert_eq!(bill.products[0].name, "-10% coupon");
        assert_eq!(bill.products[0].price, -1.0);
    }

    #[test]
    fn test_subcommand_help() {
        let mut shell = shell();
        match shell.execute_line("help log-client").unwrap() {
            Outcome::Output(text) => assert!(text.contains("Client name")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_export_format() {
        let mut shell = shell();
        let err = shell
            .execute_line("export-store out.xlsx --format xlsx")
            .unwrap_err();
        assert!(err.to_string().contains("Invalid export format 'xlsx'"));
    }

    #[test]
    fn test_help_is_output() {
        let mut shell = shell();
        match shell.execute_line("help").unwrap() {
            Outcome::Output(text) => assert!(text.contains("log-client")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_run_continues_after_failure() {
        let mut shell = shell();
        let input = "add-bill Nobody 2024-01-01\nlog-client Alice\nshow-store\nquit\nlog-client Bob\n";
        let mut out = Vec::new();
        let mut err = Vec::new();

        let stats = shell.run(input.as_bytes(), &mut out, &mut err, false).unwrap();

        assert_eq!(stats, ShellStats { executed: 2, failed: 1 });
        assert_eq!(String::from_utf8(out).unwrap(), "Client logged\nAlice\n");
        assert_eq!(String::from_utf8(err).unwrap(), "error: No such client: Nobody\n");
        assert!(shell.service().store().find_client("Bob").is_none());
    }
}
