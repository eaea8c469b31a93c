use clap::Parser;
use miette::Result;
use aidmap::cli::commands;
use aidmap::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` terminates quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Threew { paths } => commands::threew::run(&paths, &global),
        Commands::Iati { paths } => commands::iati::run(&paths, &global),
        Commands::Merge { paths } => commands::merge::run(&paths, &global),
        Commands::Index(cmd) => commands::index::run(cmd, &global),
        Commands::Network(args) => commands::network::run(args, &global),
        Commands::Stats(args) => commands::stats::run(args, &global),
        Commands::Run(args) => commands::run::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
