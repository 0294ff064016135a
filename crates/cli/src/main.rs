//! Binary entry point for the subtitle translation editor.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use subedit_core::autosave::AutosaveStore;
use subedit_core::document::{exceeds_line_limit, SelectionState, CHAR_LIMIT_PER_LINE};
use subedit_core::search::{FindOutcome, ReplaceAllOutcome, ReplaceOutcome};
use subedit_core::session::{RestoreOutcome, SaveStatus, Session, SessionError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options for the editor.
#[derive(Parser)]
struct Cli {
    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,

    /// Directory for auto-saved drafts. Defaults to the input file's directory.
    #[arg(long)]
    autosave_dir: Option<PathBuf>,

    /// Path to the .srt file to edit.
    input: PathBuf,
}

/// Application entry point which parses CLI args and opens the editor.
/// This function should initialize logging and delegate to the command loop.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("subedit=trace".parse().unwrap())
            .add_directive("subedit_core=trace".parse().unwrap())
            .add_directive("info".parse().unwrap())
    } else {
        EnvFilter::default()
            .add_directive("subedit=info".parse().unwrap())
            .add_directive("subedit_core=info".parse().unwrap())
            .add_directive("warn".parse().unwrap())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    run(&cli)
}

/// Open the session, restore any drafts and hand over to the command loop.
fn run(cli: &Cli) -> Result<()> {
    let file_name = cli
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("unusable input path {}", cli.input.display()))?
        .to_string();
    // Refuse other extensions before touching the file at all.
    if !file_name.ends_with(".srt") {
        bail!("Please select a valid .srt file.");
    }
    let content = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let store = AutosaveStore::new(autosave_root(cli));
    let mut session = match Session::open(&file_name, &content, store) {
        Ok(session) => session,
        Err(SessionError::NotSrt { .. }) => bail!("Please select a valid .srt file."),
        Err(SessionError::NoEntries) => {
            bail!("The subtitle file appears to be empty or invalid.")
        }
    };
    info!(
        "editing {} ({} entries)",
        cli.input.display(),
        session.document().len()
    );
    if let RestoreOutcome::Restored { .. } = session.restore_autosave() {
        println!("Loaded auto-saved session.");
    }
    render_table(&session);
    println!("Type 'help' for the command list.");
    command_loop(&mut session, &cli.input)
}

/// Auto-saved drafts live next to the file being edited unless overridden.
fn autosave_root(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.autosave_dir {
        return dir.clone();
    }
    match cli.input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// One parsed line of user input. Line numbers typed by the user are 1-based;
/// they become 0-based positions here.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List,
    Translate { position: usize, text: String },
    Copy { position: usize },
    Select(SelectTarget),
    Unselect { position: usize },
    Insert,
    Delete,
    Find { term: String },
    Next,
    Replace { replacement: String },
    ReplaceAll { replacement: String },
    Save { path: Option<PathBuf> },
    Clear,
    Help,
    Quit,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SelectTarget {
    All,
    None,
    One(usize),
}

fn parse_command(line: &str) -> Command {
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word {
        "list" | "ls" => Command::List,
        "tr" => match rest.split_once(char::is_whitespace) {
            Some((number, text)) => match position(number) {
                Some(position) => Command::Translate {
                    position,
                    text: text.trim().to_string(),
                },
                None => Command::Unknown(line.to_string()),
            },
            None => match position(rest) {
                Some(position) => Command::Translate {
                    position,
                    text: String::new(),
                },
                None => Command::Unknown(line.to_string()),
            },
        },
        "copy" => match position(rest) {
            Some(position) => Command::Copy { position },
            None => Command::Unknown(line.to_string()),
        },
        "sel" => match rest {
            "all" => Command::Select(SelectTarget::All),
            "none" => Command::Select(SelectTarget::None),
            _ => match position(rest) {
                Some(position) => Command::Select(SelectTarget::One(position)),
                None => Command::Unknown(line.to_string()),
            },
        },
        "unsel" => match position(rest) {
            Some(position) => Command::Unselect { position },
            None => Command::Unknown(line.to_string()),
        },
        "ins" => Command::Insert,
        "del" => Command::Delete,
        "find" => Command::Find {
            term: rest.to_string(),
        },
        "next" => Command::Next,
        "replace" => Command::Replace {
            replacement: rest.to_string(),
        },
        "replaceall" => Command::ReplaceAll {
            replacement: rest.to_string(),
        },
        "save" => Command::Save {
            path: (!rest.is_empty()).then(|| PathBuf::from(rest)),
        },
        "clear" => Command::Clear,
        "help" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(word.to_string()),
    }
}

/// Parse a 1-based line number from the table into a 0-based position.
fn position(text: &str) -> Option<usize> {
    text.parse::<usize>().ok().and_then(|n| n.checked_sub(1))
}

/// Read commands from stdin until quit or end of input.
fn command_loop(session: &mut Session, input_path: &Path) -> Result<()> {
    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            prompt()?;
            continue;
        }
        match parse_command(trimmed) {
            Command::Quit => return Ok(()),
            command => execute(session, input_path, command),
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}

fn execute(session: &mut Session, input_path: &Path, command: Command) {
    match command {
        Command::List => render_table(session),
        Command::Translate { position, text } => match session.set_translation(position, &text) {
            Ok(status) => report_save(&status),
            Err(e) => println!("{e}"),
        },
        Command::Copy { position } => match session.copy_original(position) {
            Ok(status) => report_save(&status),
            Err(e) => println!("{e}"),
        },
        Command::Select(SelectTarget::All) => {
            session.select_all(true);
            report_selection(session);
        }
        Command::Select(SelectTarget::None) => {
            session.select_all(false);
            report_selection(session);
        }
        Command::Select(SelectTarget::One(position)) => {
            match session.set_selected(position, true) {
                Ok(()) => report_selection(session),
                Err(e) => println!("{e}"),
            }
        }
        Command::Unselect { position } => match session.set_selected(position, false) {
            Ok(()) => report_selection(session),
            Err(e) => println!("{e}"),
        },
        Command::Insert => match session.insert_before_selected() {
            Ok((position, status)) => {
                println!("Inserted a new entry at line {}.", position + 1);
                report_save(&status);
                render_table(session);
            }
            Err(e) => println!("{e}"),
        },
        Command::Delete => match session.delete_selected() {
            Ok((removed, status)) => {
                println!("Deleted {removed} entry(ies).");
                report_save(&status);
                render_table(session);
            }
            Err(e) => println!("{e}"),
        },
        Command::Find { term } => report_find(&session.find_next(&term)),
        Command::Next => {
            let term = session.search().term().to_string();
            report_find(&session.find_next(&term));
        }
        Command::Replace { replacement } => {
            let term = session.search().term().to_string();
            let (outcome, save) = session.replace_current(&term, &replacement);
            report_replace(&outcome);
            if let Some(status) = save {
                report_save(&status);
            }
        }
        Command::ReplaceAll { replacement } => {
            let term = session.search().term().to_string();
            let (outcome, save) = session.replace_all(&term, &replacement);
            report_replace_all(&outcome);
            if let Some(status) = save {
                report_save(&status);
            }
        }
        Command::Save { path } => save_file(session, input_path, path),
        Command::Clear => match session.clear_autosave() {
            SaveStatus::Saved => println!("Auto-save cleared."),
            SaveStatus::Failed(reason) => println!("Save Error! {reason}"),
        },
        Command::Help => print_help(),
        Command::Quit => {}
        Command::Unknown(what) => {
            println!("Unknown command: {what}. Type 'help' for the command list.")
        }
    }
}

fn report_save(status: &SaveStatus) {
    match status {
        SaveStatus::Saved => println!("Saved."),
        SaveStatus::Failed(reason) => println!("Save Error! {reason}"),
    }
}

fn report_find(outcome: &FindOutcome) {
    match outcome {
        FindOutcome::EmptyTerm => println!("Please enter text to find."),
        FindOutcome::Found { index, .. } => println!("Found in line #{index}"),
        FindOutcome::NoMore => println!("End of document reached. No more results."),
    }
}

fn report_replace(outcome: &ReplaceOutcome) {
    match outcome {
        ReplaceOutcome::MustFindFirst => {
            println!("You must find text before you can replace it.")
        }
        ReplaceOutcome::BadPattern(reason) => println!("Invalid search pattern: {reason}"),
        ReplaceOutcome::NotInCurrent => {
            println!("The highlighted line no longer contains the search text.")
        }
        ReplaceOutcome::Replaced { then, .. } => {
            println!("Replaced one occurrence.");
            report_find(then);
        }
    }
}

fn report_replace_all(outcome: &ReplaceAllOutcome) {
    match outcome {
        ReplaceAllOutcome::EmptyTerm => println!("Please enter text to find and replace."),
        ReplaceAllOutcome::BadPattern(reason) => println!("Invalid search pattern: {reason}"),
        ReplaceAllOutcome::Done { count, .. } => {
            println!("Replaced {count} occurrence(s) throughout the file.")
        }
    }
}

fn report_selection(session: &Session) {
    let total = session.document().len();
    let selected = session
        .document()
        .entries()
        .iter()
        .filter(|e| e.selected)
        .count();
    println!("{selected} of {total} entries selected.");
}

/// Print the whole document, one block per entry: selection marker, sequence
/// number and timing, then the original and the translation underneath. The
/// `>` cursor marks the entry the search session has highlighted.
fn render_table(session: &Session) {
    let highlight = session.search().highlighted();
    for (position, entry) in session.document().entries().iter().enumerate() {
        let marker = if entry.selected { "[x]" } else { "[ ]" };
        let cursor = if highlight == Some(position) { ">" } else { " " };
        println!("{cursor}{marker} #{} {} --> {}", entry.index, entry.start, entry.end);
        for line in entry.original.lines() {
            println!("      {line}");
        }
        if !entry.translation.is_empty() {
            for line in entry.translation.lines() {
                println!("   -> {line}");
            }
            if exceeds_line_limit(&entry.translation, CHAR_LIMIT_PER_LINE) {
                println!("      (a line is over {CHAR_LIMIT_PER_LINE} characters)");
            }
        }
    }
    let footer = match session.selection_state() {
        SelectionState::All => "all selected",
        SelectionState::Some => "some selected",
        SelectionState::None => "none selected",
    };
    println!("{} entries, {footer}.", session.document().len());
}

fn print_help() {
    println!("Commands:");
    println!("  list                 show the document");
    println!("  tr <n> [text]        set the translation of line n (no text clears it)");
    println!("  copy <n>             copy line n's original text into its translation");
    println!("  sel <n>|all|none     change the selection");
    println!("  unsel <n>            unselect line n");
    println!("  ins                  insert a new entry before the selected line");
    println!("  del                  delete the selected entries");
    println!("  find <text>          find the next translation containing text");
    println!("  next                 repeat the last find");
    println!("  replace <text>       replace in the found entry, then find the next");
    println!("  replaceall <text>    replace everywhere");
    println!("  save [path]          write the translated file");
    println!("  clear                drop the auto-saved drafts for this file");
    println!("  quit                 leave the editor");
}

/// Write the translated document. Without an explicit path the file lands
/// next to the input, named after it.
fn save_file(session: &Session, input_path: &Path, path: Option<PathBuf>) {
    let target = path.unwrap_or_else(|| input_path.with_file_name(session.output_file_name()));
    match fs::write(&target, session.render()) {
        Ok(()) => {
            info!("wrote translated file {}", target.display());
            println!("Wrote {}.", target.display());
            println!("Use 'clear' to drop the auto-saved drafts if you are done.");
        }
        Err(e) => println!("Could not write {}: {e}", target.display()),
    }
}
