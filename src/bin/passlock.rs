//! Passlock CLI - password-protected vaults
//!
//! Command-line interface for vaults sealed with AES-256-GCM under an
//! Argon2id-derived key. A vault either seals a whole file (`create`, `open`,
//! `update`) or holds a list of password entries (`init`, `add`, `list`,
//! `show`, `edit`, `remove`, `tags`).

use clap::{ArgAction, Args, Parser, Subcommand};
use std::error::Error as _;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use passlock::entries::{Entry, EntryChanges, EntryFields};
use passlock::file_ops;
use passlock::generate::{DEFAULT_LENGTH, generate_password};
use passlock::password::{ConfirmingPassword, PasswordSource, StdinPassword, TerminalPassword};
use passlock::{ErrorCategory, ErrorKind, PasslockError};

#[derive(Parser)]
#[command(name = "passlock")]
#[command(version)]
#[command(about = "Password-protected vaults for files and password entries.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    password_stdin: bool,

    /// Increase diagnostic output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log filter directive, e.g. "passlock=debug"; overridden by -v
    #[arg(long, env = "PASSLOCK_LOG", default_value = "warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault from a plaintext file
    #[command(alias = "c")]
    Create {
        /// Path to the file whose contents is to be sealed
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path of the vault file to create; must not exist yet
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Open a vault and write its contents to a file
    #[command(alias = "o")]
    Open {
        /// Path to the vault file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the plaintext to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Replace the contents of an existing vault, while validating
    /// that the password is not accidentally changed.
    #[command(alias = "u")]
    Update {
        /// Path to the file whose contents is to be sealed
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the existing vault file to replace
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Create a new, empty vault for password entries
    Init {
        #[command(flatten)]
        vault: VaultArg,
    },

    /// Add a password entry
    Add {
        #[command(flatten)]
        vault: VaultArg,

        #[arg(long)]
        name: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Tag the entry; may be repeated
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        #[command(flatten)]
        secret: EntrySecret,
    },

    /// List entries, without their passwords
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        vault: VaultArg,

        /// Only entries whose name, username, url or tags contain this text
        #[arg(long)]
        search: Option<String>,

        /// Only entries with this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show one entry, including its password
    Show {
        #[command(flatten)]
        vault: VaultArg,

        /// Entry id, or its name if unique
        entry: String,

        /// Also show previous passwords
        #[arg(long)]
        history: bool,
    },

    /// Change fields of an entry
    Edit {
        #[command(flatten)]
        vault: VaultArg,

        /// Entry id, or its name if unique
        entry: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        username: Option<String>,

        /// New url; an empty value removes it
        #[arg(long)]
        url: Option<String>,

        /// New notes; an empty value removes them
        #[arg(long)]
        notes: Option<String>,

        /// Replace the entry's tags; may be repeated
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        #[command(flatten)]
        secret: EntrySecret,
    },

    /// Delete an entry
    #[command(alias = "rm")]
    Remove {
        #[command(flatten)]
        vault: VaultArg,

        /// Entry id, or its name if unique
        entry: String,
    },

    /// List tags in use with their number of entries
    Tags {
        #[command(flatten)]
        vault: VaultArg,
    },

    /// Print a random password
    #[command(alias = "gen")]
    Generate {
        /// Number of characters (4 to 64)
        #[arg(short, long, default_value_t = DEFAULT_LENGTH)]
        length: usize,
    },
}

#[derive(Args)]
struct VaultArg {
    /// Path to the entry vault
    #[arg(long = "vault", env = "PASSLOCK_VAULT", value_name = "FILE")]
    path: PathBuf,
}

#[derive(Args)]
struct EntrySecret {
    /// Password to store in the entry
    #[arg(long, env = "PASSLOCK_ENTRY_PASSWORD", hide_env_values = true)]
    entry_password: Option<String>,

    /// Generate the entry password, optionally of the given length; takes
    /// precedence over --entry-password
    #[arg(long, value_name = "LEN", num_args = 0..=1, default_missing_value = "16")]
    generate: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, &cli.log);

    if let Err(e) = passlock::init() {
        report(&e);
        process::exit(1);
    }

    if let Err(e) = run(cli.command, cli.password_stdin) {
        report(&e);
        process::exit(1);
    }
}

fn run(command: Commands, password_stdin: bool) -> passlock::Result<()> {
    match command {
        Commands::Create { input, output } => {
            let mut source = password_source(password_stdin, true);
            file_ops::create_vault_file(&input, &output, &mut *source)
        }
        Commands::Open { input, output } => {
            let mut source = password_source(password_stdin, false);
            file_ops::open_vault_file(&input, &output, &mut *source)
        }
        Commands::Update { input, output } => {
            let mut source = password_source(password_stdin, false);
            file_ops::update_vault_file(&input, &output, &mut *source)
        }
        Commands::Init { vault } => {
            let mut source = password_source(password_stdin, true);
            file_ops::create_entry_vault(&vault.path, &mut *source)?;
            println!("Created entry vault {}", vault.path.display());
            Ok(())
        }
        Commands::Add {
            vault,
            name,
            username,
            url,
            notes,
            tags,
            secret,
        } => {
            let password = entry_secret(secret, true)?.unwrap_or_default();
            let fields = EntryFields {
                name,
                username,
                password,
                url,
                notes,
                tags,
            };
            let mut source = password_source(password_stdin, false);
            let id = file_ops::modify_entries(&vault.path, &mut *source, |store| {
                store.add(fields).map(|entry| entry.id.clone())
            })?;
            println!("Added entry {}", id);
            Ok(())
        }
        Commands::List { vault, search, tag } => {
            let mut source = password_source(password_stdin, false);
            let store = file_ops::read_entries(&vault.path, &mut *source)?;
            let mut hits = store.search(search.as_deref().unwrap_or(""));
            if let Some(tag) = tag {
                let tagged = store.with_tag(&tag);
                hits.retain(|e| tagged.iter().any(|t| t.id == e.id));
            }
            for entry in hits {
                println!("{}", summary_line(entry));
            }
            Ok(())
        }
        Commands::Show {
            vault,
            entry,
            history,
        } => {
            let mut source = password_source(password_stdin, false);
            let store = file_ops::read_entries(&vault.path, &mut *source)?;
            print_entry(store.get(&entry)?, history);
            Ok(())
        }
        Commands::Edit {
            vault,
            entry,
            name,
            username,
            url,
            notes,
            tags,
            secret,
        } => {
            let changes = EntryChanges {
                name,
                username,
                password: entry_secret(secret, false)?,
                url,
                notes,
                tags: if tags.is_empty() { None } else { Some(tags) },
            };
            let mut source = password_source(password_stdin, false);
            let id = file_ops::modify_entries(&vault.path, &mut *source, |store| {
                store.edit(&entry, changes).map(|entry| entry.id.clone())
            })?;
            println!("Updated entry {}", id);
            Ok(())
        }
        Commands::Remove { vault, entry } => {
            let mut source = password_source(password_stdin, false);
            let removed = file_ops::modify_entries(&vault.path, &mut *source, |store| {
                store.remove(&entry)
            })?;
            println!("Removed entry {} ({})", removed.name, removed.id);
            Ok(())
        }
        Commands::Tags { vault } => {
            let mut source = password_source(password_stdin, false);
            let store = file_ops::read_entries(&vault.path, &mut *source)?;
            for (tag, count) in store.tag_counts() {
                println!("{}\t{}", tag, count);
            }
            Ok(())
        }
        Commands::Generate { length } => {
            let password = generate_password(length)?;
            println!("{}", *password);
            Ok(())
        }
    }
}
fn init_logging(verbose: u8, directive: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(err: &passlock::PasslockError) {
    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

fn password_source(use_stdin: bool, confirm: bool) -> Box<dyn PasswordSource> {
    if use_stdin {
        Box::new(StdinPassword::new(Box::new(std::io::stdin())))
    } else if confirm {
        Box::new(ConfirmingPassword::new(
            Box::new(TerminalPassword::new()),
            Box::new(TerminalPassword::with_prompt("Confirm password (passlock): ")),
        ))
    } else {
        Box::new(TerminalPassword::new())
    }
}

/// The password to store in an entry: generated, given, or (if `required`)
/// read from the terminal.
fn entry_secret(
    secret: EntrySecret,
    required: bool,
) -> passlock::Result<Option<Zeroizing<String>>> {
    if let Some(length) = secret.generate {
        return generate_password(length).map(Some);
    }
    if let Some(password) = secret.entry_password {
        return Ok(Some(Zeroizing::new(password)));
    }
    if !required {
        return Ok(None);
    }

    let bytes = TerminalPassword::with_prompt("Entry password: ").read_password()?;
    let password = String::from_utf8(bytes.to_vec()).map_err(|_| {
        PasslockError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "entry password is not valid UTF-8",
        )
    })?;
    Ok(Some(Zeroizing::new(password)))
}

fn summary_line(entry: &Entry) -> String {
    let mut line = format!("{}  {}  {}", entry.id, entry.name, entry.username);
    if let Some(url) = &entry.url {
        line.push_str("  ");
        line.push_str(url);
    }
    if !entry.tags.is_empty() {
        line.push_str(&format!("  [{}]", entry.tags.join(", ")));
    }
    line
}

fn print_entry(entry: &Entry, history: bool) {
    println!("id:       {}", entry.id);
    println!("name:     {}", entry.name);
    println!("username: {}", entry.username);
    println!("password: {}", entry.password);
    if let Some(url) = &entry.url {
        println!("url:      {}", url);
    }
    if let Some(notes) = &entry.notes {
        println!("notes:    {}", notes);
    }
    if !entry.tags.is_empty() {
        println!("tags:     {}", entry.tags.join(", "));
    }
    println!("created:  {}", entry.created_at);
    println!("modified: {}", entry.modified_at);
    if history {
        for old in entry.history.iter().rev() {
            println!("previous: {}  (changed {})", old.password, old.changed_at);
        }
    }
}
