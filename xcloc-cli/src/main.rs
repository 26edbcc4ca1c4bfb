mod edit;
mod find;
mod stats;
mod view;

use clap::{Parser, Subcommand};
use xcloc::{Bundle, OpenOptions};

use crate::edit::{run_set_command, run_toggle_command};
use crate::find::run_find_command;
use crate::stats::print_stats;
use crate::view::{ViewOptions, print_view};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

/// How to open the bundle.
#[derive(clap::Args, Debug)]
struct OpenArgs {
    /// The .xcloc bundle to open
    #[arg(short, long)]
    input: String,

    /// Fail when contents.json is missing
    #[arg(long)]
    require_manifest: bool,

    /// Parse every XLIFF document while opening
    #[arg(long)]
    eager: bool,
}

impl OpenArgs {
    fn open(&self) -> Result<Bundle, String> {
        let options = OpenOptions::new()
            .with_require_manifest(self.require_manifest)
            .with_lazy_documents(!self.eager);
        Bundle::open_with(&self.input, options)
            .map_err(|e| format!("Failed to open {}: {}", self.input, e))
    }
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the translation units of a bundle.
    View {
        #[command(flatten)]
        open: OpenArgs,

        /// Document inside `Localized Contents` (defaults to the target locale's)
        #[arg(long)]
        doc: Option<String>,

        /// Only show units whose id, source, target or note contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Column to sort by: id, source, target, note or state
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Display full text without truncation
        #[arg(long)]
        full: bool,
    },

    /// Show translation progress per file and for the whole bundle.
    Stats {
        #[command(flatten)]
        open: OpenArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the target text and/or state of a unit, then save.
    Set {
        #[command(flatten)]
        open: OpenArgs,

        #[arg(long)]
        doc: Option<String>,

        /// Unit id
        #[arg(long)]
        id: String,

        /// Index of the <file> section holding the unit (defaults to the first match)
        #[arg(long)]
        section: Option<usize>,

        /// New target text
        #[arg(short, long)]
        target: Option<String>,

        /// New state: new, needs-review, translated or do-not-translate
        #[arg(short, long)]
        state: Option<String>,
    },

    /// Toggle a unit between translated and needs-review, then save.
    Toggle {
        #[command(flatten)]
        open: OpenArgs,

        #[arg(long)]
        doc: Option<String>,

        #[arg(long)]
        id: String,

        #[arg(long)]
        section: Option<usize>,
    },

    /// List .xcloc bundles below a directory.
    Find {
        /// Directory to search
        dir: String,

        /// Give up after this many milliseconds and print what was found
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    log::debug!("Running {:?}", args.commands);

    let result = match args.commands {
        Commands::View {
            open,
            doc,
            filter,
            sort,
            desc,
            full,
        } => open.open().and_then(|mut bundle| {
            let options = ViewOptions {
                doc,
                filter,
                sort,
                descending: desc,
                full,
            };
            print_view(&mut bundle, &options)
        }),
        Commands::Stats { open, json } => {
            open.open().and_then(|mut bundle| print_stats(&mut bundle, json))
        }
        Commands::Set {
            open,
            doc,
            id,
            section,
            target,
            state,
        } => open.open().and_then(|mut bundle| {
            run_set_command(&mut bundle, doc, &id, section, target, state)
        }),
        Commands::Toggle {
            open,
            doc,
            id,
            section,
        } => open
            .open()
            .and_then(|mut bundle| run_toggle_command(&mut bundle, doc, &id, section)),
        Commands::Find { dir, timeout_ms } => run_find_command(&dir, timeout_ms),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Resolves `--doc` to a bundle path; a bare file name is looked up in
/// `Localized Contents`.
pub(crate) fn resolve_document(bundle: &Bundle, doc: Option<String>) -> Result<String, String> {
    match doc {
        Some(doc) if doc.contains('/') => Ok(doc),
        Some(doc) => Ok(format!("{}/{}", xcloc::bundle::LOCALIZED_CONTENTS, doc)),
        None => bundle
            .primary_document_path()
            .ok_or_else(|| "Bundle has no localized documents".to_string()),
    }
}
