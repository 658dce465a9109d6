use clap::{Parser, Subcommand};
use clap_complete::Shell;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // If there's a git tag at HEAD, use just the tag (release build)
    if let Some(tag) = option_env!("BINUP_GIT_TAG") {
        return tag;
    }

    // Not on a tag - include commit hash and branch (dev build)
    let commit = option_env!("BINUP_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("BINUP_GIT_BRANCH").unwrap_or("unknown");

    // Return a static string by leaking the formatted string
    // This is safe because it only happens once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "binup")]
#[command(about = "Update binaries installed by 'go install'")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Update binaries installed by 'go install'
    #[command(
        after_help = "Without arguments every binary under $GOPATH/bin or $GOBIN is updated.\n\
                      Version comparison is lexical, not semantic: untagged pseudo-versions\n\
                      are compared as opaque strings and may count as newer than a tag."
    )]
    Update {
        /// Binaries to update (default: everything under $GOPATH/bin or $GOBIN)
        binaries: Vec<String>,

        /// Perform the trial update with no changes
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Enable desktop notifications
        #[arg(short = 'N', long)]
        notify: bool,

        /// Binaries which should not be updated (delimiter: ',')
        #[arg(short, long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Binaries which update by @main or @master (delimiter: ',')
        #[arg(short, long = "main", value_delimiter = ',')]
        main_pkgs: Vec<String>,

        /// Number of simultaneous installs
        #[arg(short, long, default_value_t = default_jobs())]
        jobs: usize,
    },

    /// Check the latest version of binaries installed by 'go install', without updating
    Check {
        /// Binaries to check (default: everything under $GOPATH/bin or $GOBIN)
        binaries: Vec<String>,

        /// Number of simultaneous version queries
        #[arg(short, long, default_value_t = default_jobs())]
        jobs: usize,
    },

    /// List up command name with package path and version under $GOPATH/bin or $GOBIN
    List,

    /// Export the binary names and their import paths to binup.conf
    Export {
        /// Print the configuration at STDOUT instead of writing the file
        #[arg(short, long)]
        output: bool,
    },

    /// Install binaries according to binup.conf
    Import {
        /// Perform the trial update with no changes
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Enable desktop notifications
        #[arg(short = 'N', long)]
        notify: bool,

        /// Number of simultaneous installs
        #[arg(short, long, default_value_t = default_jobs())]
        jobs: usize,
    },

    /// Remove binaries under $GOPATH/bin or $GOBIN
    #[command(alias = "rm")]
    Remove {
        /// Binaries to remove
        #[arg(required = true)]
        binaries: Vec<String>,

        /// Forcibly remove without confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show the current version
    Version,
}

pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
