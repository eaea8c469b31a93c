//! Shell completions for the aidmap stages
//!
//! Completes stage names (`threew`, `iati`, `merge`, `index orgs|sectors|locations`,
//! `network`, `stats`, `run`) and their flags.
//!
//! ```bash
//! source <(aidmap completions bash)
//! aidmap completions zsh > ~/.zfunc/_aidmap
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;
use std::io::{self, Write};

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout());
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    generate(shell, &mut Cli::command(), "aidmap", out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completions_cover_stages() {
        let mut out = Vec::new();
        write_completions(Shell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();
        for word in ["threew", "iati", "merge", "network", "locations", "--verbose"] {
            assert!(script.contains(word), "missing {}", word);
        }
    }
}
