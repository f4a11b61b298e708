use clap::Parser;

use crate::engine::Operation;

#[derive(Parser, Debug)]
#[command(name = "backedup", disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long)]
    pub backup: bool,
    #[arg(long)]
    pub restore: bool,
    #[arg(long)]
    pub uninstall: bool,

    #[arg(long, short = 'v')]
    pub verbose: bool,

    #[arg(long, short = 'h')]
    pub help: bool,
    #[arg(long)]
    pub version: bool,
}

impl Cli {
    /// The operation to run. Uninstall wins over backup, backup over restore.
    pub fn operation(&self) -> Option<Operation> {
        if self.uninstall {
            Some(Operation::Uninstall)
        } else if self.backup {
            Some(Operation::Backup)
        } else if self.restore {
            Some(Operation::Restore)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse")
    }

    #[test]
    fn operation_precedence() {
        assert_eq!(parse(&["backedup"]).operation(), None);
        assert_eq!(
            parse(&["backedup", "--restore"]).operation(),
            Some(Operation::Restore)
        );
        assert_eq!(
            parse(&["backedup", "--restore", "--backup"]).operation(),
            Some(Operation::Backup)
        );
        assert_eq!(
            parse(&["backedup", "--backup", "--uninstall", "--restore"]).operation(),
            Some(Operation::Uninstall)
        );
    }

    #[test]
    fn config_path_is_kept_verbatim() {
        let cli = parse(&["backedup", "--config", "$HOME/alt.yaml", "-v"]);
        assert_eq!(cli.config.as_deref(), Some("$HOME/alt.yaml"));
        assert!(cli.verbose);
    }
}
