use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "techinterview")]
#[command(author, version, about = "Salary charts API and Telegram bot for techinterview.space", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API and the Telegram bot
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Drop the cached currency rates, fetch them again and print them
    ResetCurrencies,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["techinterview", "run", "--webhook"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Run { webhook: true }));

        let cli = Cli::try_parse_from(["techinterview", "reset-currencies"]).unwrap();
        assert_eq!(cli.command, Some(Commands::ResetCurrencies));

        let cli = Cli::try_parse_from(["techinterview"]).unwrap();
        assert_eq!(cli.command, None);
    }
}
