use clap::Parser;
use miette::Result;
use cca::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
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

    if let Err(e) = cca::logging::init(global.verbose) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        Commands::Overview => cca::cli::commands::overview::run(&global),
        Commands::Claims(args) => cca::cli::commands::claims::run(args, &global),
        Commands::Show(args) => cca::cli::commands::show::run(args, &global),
        Commands::Sentiment(args) => cca::cli::commands::sentiment::run(args, &global),
        Commands::Ask(args) => cca::cli::commands::ask::run(args, &global),
        Commands::Shell(args) => cca::cli::commands::shell::run(args, &global),
        Commands::Config(cmd) => cca::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => cca::cli::commands::completions::run(args),
    }
}
