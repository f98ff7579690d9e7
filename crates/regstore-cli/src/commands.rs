use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use regstore_events::{EventFilter, RegistryEvent, RegistryProjection};
use regstore_guard::GuardConfig;
use regstore_registry::{FileEntry, FileRegistry, Post};
use regstore_types::{AccountId, FileKey, RegistryKind};
use serde::Serialize;
use tracing::info;

use crate::cli::*;
use crate::config::CliConfig;
use crate::state::{Session, StateFile};

/// Flags and config values shared by every command.
struct Env {
    state_path: PathBuf,
    caller: Option<String>,
    format: OutputFormat,
}

impl Env {
    fn caller(&self) -> anyhow::Result<AccountId> {
        self.caller
            .as_deref()
            .map(AccountId::parse_or_label)
            .ok_or_else(|| anyhow!("no caller: pass --caller or set `caller` in regstore.toml"))
    }

    fn open(&self) -> anyhow::Result<Session> {
        Session::open(StateFile::load(&self.state_path)?)
    }

    /// Open the state, run a mutation, and persist the result.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&Session, &AccountId) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let caller = self.caller()?;
        let session = self.open()?;
        let out = f(&session, &caller)?;
        session.to_state()?.save(&self.state_path)?;
        Ok(out)
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn run_command(cli: Cli, config: CliConfig) -> anyhow::Result<()> {
    let env = Env {
        state_path: cli.state.unwrap_or(config.state_file),
        caller: cli.caller.or(config.caller),
        format: cli.format,
    };
    match cli.command {
        Command::Init(args) => cmd_init(&env, args),
        Command::Post(args) => cmd_post(&env, args.action),
        Command::File(args) => cmd_file(&env, args.action),
        Command::Events(args) => cmd_events(&env, args),
        Command::Verify => cmd_verify(&env),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(env: &Env, args: InitArgs) -> anyhow::Result<()> {
    if env.state_path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            env.state_path.display()
        );
    }
    let guard = GuardConfig {
        admins: args
            .admins
            .iter()
            .map(|a| AccountId::parse_or_label(a))
            .collect(),
    };
    guard.build().context("invalid administrator set")?;
    StateFile::new(guard.clone()).save(&env.state_path)?;
    info!(path = %env.state_path.display(), admins = guard.admins.len(), "state initialized");

    if env.json() {
        return print_json(&guard);
    }
    println!(
        "{} Initialized regstore state in {}",
        "✓".green().bold(),
        env.state_path.display().to_string().bold()
    );
    for admin in &guard.admins {
        println!("  Admin: {}", admin.to_string().cyan());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

fn cmd_post(env: &Env, action: PostAction) -> anyhow::Result<()> {
    match action {
        PostAction::Create { title, locator } => {
            let id = env.mutate(|s, caller| Ok(s.posts.create_post(caller, title, locator)?))?;
            if env.json() {
                return print_json(&id);
            }
            println!("{} Created post {}", "✓".green().bold(), format!("#{id}").yellow());
        }
        PostAction::Update { id, title, locator } => {
            env.mutate(|s, caller| Ok(s.posts.update_post(caller, id, title, locator)?))?;
            if !env.json() {
                println!("{} Updated post {}", "✓".green().bold(), format!("#{id}").yellow());
            }
        }
        PostAction::Delete { id } => {
            env.mutate(|s, caller| Ok(s.posts.delete_post(caller, id)?))?;
            if !env.json() {
                println!("{} Deleted post {}", "✓".green().bold(), format!("#{id}").yellow());
            }
        }
        PostAction::Get { id } => {
            let post = env.open()?.posts.get_post(id)?;
            if env.json() {
                return print_json(&post);
            }
            print_post(&post);
        }
        PostAction::List(page) => {
            let session = env.open()?;
            if env.json() {
                return print_json(&session.posts.posts_by_page(page.offset, page.limit)?);
            }
            let posts = session.posts.list_posts(page.offset, page.limit)?;
            if posts.is_empty() {
                println!("No posts.");
            }
            for post in &posts {
                print_post(post);
            }
        }
        PostAction::Count => {
            let session = env.open()?;
            let count = session.posts.post_count()?;
            let next_id = session.posts.next_id()?;
            if env.json() {
                return print_json(&serde_json::json!({ "count": count, "next_id": next_id }));
            }
            println!("{} posts (next id {})", count.to_string().bold(), next_id);
        }
    }
    Ok(())
}

fn print_post(post: &Post) {
    println!(
        "{}  {}  {}  ({})",
        format!("#{}", post.id).yellow().bold(),
        post.title,
        post.locator.cyan(),
        post.timestamp.to_string().dimmed()
    );
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

fn resolve(target: &FileTarget) -> anyhow::Result<FileKey> {
    match (&target.key, &target.path) {
        (Some(key), _) => Ok(*key),
        (None, Some(path)) => Ok(FileRegistry::key_for_path(path)),
        (None, None) => bail!("pass --key or --path"),
    }
}

fn cmd_file(env: &Env, action: FileAction) -> anyhow::Result<()> {
    match action {
        FileAction::Create {
            path,
            locator,
            metadata,
        } => {
            let shown = path.clone();
            let key =
                env.mutate(|s, caller| Ok(s.files.create_file(caller, path, locator, metadata)?))?;
            if env.json() {
                return print_json(&key);
            }
            println!(
                "{} Created {} → {}",
                "✓".green().bold(),
                shown.bold(),
                key.to_string().yellow()
            );
        }
        FileAction::Update {
            target,
            locator,
            metadata,
        } => {
            let key = resolve(&target)?;
            env.mutate(|s, caller| Ok(s.files.update_file(caller, &key, locator, metadata)?))?;
            if !env.json() {
                println!("{} Updated {}", "✓".green().bold(), key.to_string().yellow());
            }
        }
        FileAction::Delete { target } => {
            let key = resolve(&target)?;
            env.mutate(|s, caller| Ok(s.files.delete_file(caller, &key)?))?;
            if !env.json() {
                println!("{} Deleted {}", "✓".green().bold(), key.to_string().yellow());
            }
        }
        FileAction::Read { keys, paths } => {
            let mut all = keys;
            all.extend(paths.iter().map(|p| FileRegistry::key_for_path(p)));
            if all.is_empty() {
                bail!("pass at least one --key or --path");
            }
            let columns = env.open()?.files.read_files(&all)?;
            if env.json() {
                return print_json(&columns);
            }
            for i in 0..columns.len() {
                println!(
                    "{}  {}  {}  ({})",
                    all[i].short_hex().yellow(),
                    columns.paths[i].bold(),
                    columns.locators[i].cyan(),
                    columns.timestamps[i].to_string().dimmed()
                );
                if !columns.metadata[i].is_empty() {
                    println!("    {}", columns.metadata[i]);
                }
            }
        }
        FileAction::List { page, all } => {
            let session = env.open()?;
            if env.json() {
                let columns = if all {
                    session.files.read_all_files()?
                } else {
                    session.files.files_by_page(page.offset, page.limit)?
                };
                return print_json(&columns);
            }
            let (offset, limit) = if all {
                (0, session.files.file_count()?)
            } else {
                (page.offset, page.limit)
            };
            let files = session.files.list_files(offset, limit)?;
            if files.is_empty() {
                println!("No files.");
            }
            for file in &files {
                print_file(file);
            }
        }
        FileAction::Keys { index } => {
            let session = env.open()?;
            let keys = match index {
                Some(i) => vec![session.files.file_key_at(i)?],
                None => session.files.all_file_keys()?,
            };
            if env.json() {
                return print_json(&keys);
            }
            for key in &keys {
                println!("{key}");
            }
        }
        FileAction::At { index } => {
            let session = env.open()?;
            let file = session.files.file_at(index)?;
            if env.json() {
                return print_json(&file);
            }
            print_file(&file);
        }
        FileAction::KeyOf { path } => {
            let key = FileRegistry::key_for_path(&path);
            if env.json() {
                return print_json(&key);
            }
            println!("{key}");
        }
        FileAction::Count => {
            let count = env.open()?.files.file_count()?;
            if env.json() {
                return print_json(&count);
            }
            println!("{} files", count.to_string().bold());
        }
    }
    Ok(())
}

fn print_file(file: &FileEntry) {
    println!(
        "{}  {}  {}  ({})",
        file.key.short_hex().yellow(),
        file.path.bold(),
        file.locator.cyan(),
        file.timestamp.to_string().dimmed()
    );
    if !file.metadata.is_empty() {
        println!("    {}", file.metadata);
    }
}

// ---------------------------------------------------------------------------
// Events and verification
// ---------------------------------------------------------------------------

fn cmd_events(env: &Env, args: EventsArgs) -> anyhow::Result<()> {
    let session = env.open()?;
    let events: Vec<RegistryEvent> = match args.registry {
        Some(registry) => {
            let matching = session
                .log
                .query(&EventFilter::registry(RegistryKind::from(registry)));
            let start = matching.len().saturating_sub(args.limit);
            matching[start..].to_vec()
        }
        None => session.log.tail(args.limit),
    };
    if env.json() {
        return print_json(&events);
    }
    if events.is_empty() {
        println!("No events.");
    }
    for event in &events {
        println!(
            "{} {:>4}  {:<12} {}  ({})",
            event.id.to_string().dimmed(),
            event.seq,
            event.kind.to_string().cyan(),
            event.key.to_string().yellow(),
            event.timestamp
        );
    }
    Ok(())
}

fn cmd_verify(env: &Env) -> anyhow::Result<()> {
    let session = env.open()?;
    session.posts.check_integrity().context("post store")?;
    session.files.check_integrity().context("file store")?;

    let events = session.log.events();
    if let Some(bad) = events.iter().find(|e| !e.verify()) {
        bail!("event {} (seq {}) failed its integrity check", bad.id, bad.seq);
    }
    let projection = RegistryProjection::replay(&events).context("replaying event log")?;

    let posts = session.posts.snapshot()?;
    let files = session.files.snapshot()?;
    if !projection.posts().iter().eq(posts.posts.iter()) {
        bail!("post registry does not match its event log");
    }
    if !projection.files().iter().eq(files.files.iter()) {
        bail!("file registry does not match its event log");
    }
    if projection.last_seq(RegistryKind::Posts) != posts.event_seq
        || projection.last_seq(RegistryKind::Files) != files.event_seq
    {
        bail!("event log is missing events");
    }

    if env.json() {
        return print_json(&serde_json::json!({
            "posts": posts.posts.count(),
            "files": files.files.count(),
            "events": events.len(),
            "ok": true,
        }));
    }
    println!("{} State verified", "✓".green().bold());
    println!("  Posts: {} ({})", posts.posts.count(), "consistent".green());
    println!("  Files: {} ({})", files.files.count(), "consistent".green());
    println!("  Events: {} ({})", events.len(), "replayed".green());
    Ok(())
}
