//! Changelog generation from conventional commits.
//!
//! Collects commits since the latest tag, buckets them by conventional
//! commit type, renders a Keep-a-Changelog release section, and splices it
//! into `CHANGELOG.md` in place of the `[Unreleased]` section. The text
//! processing is kept in pure functions so it can be tested without a git
//! repository.

use chrono::Local;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::process::Command;

/// Arguments for the changelog update
#[derive(Args)]
pub struct ChangelogArgs {
    /// Changelog file to update
    #[arg(long, default_value = "CHANGELOG.md")]
    pub file: String,

    /// Version heading to write (defaults to the crate version)
    #[arg(long)]
    pub set_version: Option<String>,

    /// Collect commits since this tag instead of the latest tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Repository URL for compare/release links (defaults to the git remote)
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Print the rendered section without touching the file
    #[arg(long)]
    pub dry_run: bool,
}

/// One commit as pulled from `git log`.
#[derive(Debug, Clone)]
struct Commit {
    hash: String,
    subject: String,
}

/// A parsed `type(scope)!: description` subject.
#[derive(Debug, Clone, PartialEq)]
struct Conventional {
    kind: String,
    description: String,
    breaking: bool,
}

/// A rendered changelog line.
#[derive(Debug, Clone)]
struct Entry {
    hash: String,
    description: String,
}

/// Commits bucketed by conventional commit type.
#[derive(Debug, Default)]
struct Categories {
    breaking: Vec<Entry>,
    feat: Vec<Entry>,
    fix: Vec<Entry>,
    perf: Vec<Entry>,
    refactor: Vec<Entry>,
    style: Vec<Entry>,
    test: Vec<Entry>,
    docs: Vec<Entry>,
    build: Vec<Entry>,
    ci: Vec<Entry>,
    chore: Vec<Entry>,
    other: Vec<Entry>,
}

pub fn run_changelog(args: ChangelogArgs) -> Result<(), Box<dyn std::error::Error>> {
    let version = args
        .set_version
        .clone()
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    let last_tag = args.tag.clone().or_else(latest_tag);
    match &last_tag {
        Some(tag) => println!("Last tag: {}", tag.bold()),
        None => println!("No previous tags found; using full history"),
    }

    let commits = commits_since(last_tag.as_deref())?;
    if commits.is_empty() {
        println!("No new commits since last tag");
        return Ok(());
    }
    println!("Found {} commits", commits.len());

    let section = render_markdown(&categorize(&commits));
    if section.trim().is_empty() {
        println!("No significant changes to add to the changelog");
        return Ok(());
    }

    if args.dry_run {
        print!("{section}");
        return Ok(());
    }

    let existing = fs::read_to_string(&args.file)
        .map_err(|e| format!("Failed to read '{}': {}", args.file, e))?;

    let repo_url = args
        .repo_url
        .clone()
        .or_else(remote_url)
        .map(|raw| normalize_repo_url(&raw));

    let today = Local::now().format("%Y-%m-%d").to_string();
    let updated = splice_unreleased(&existing, &version, &today, &section, repo_url.as_deref());
    fs::write(&args.file, updated)?;

    println!(
        "Updated {} with version {}",
        args.file.bold(),
        version.bold()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Git plumbing
// ---------------------------------------------------------------------------

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn latest_tag() -> Option<String> {
    git_output(&["describe", "--tags", "--abbrev=0"])
}

fn remote_url() -> Option<String> {
    git_output(&["config", "--get", "remote.origin.url"])
}

fn commits_since(tag: Option<&str>) -> Result<Vec<Commit>, Box<dyn std::error::Error>> {
    let mut args: Vec<String> = vec!["log".into()];
    if let Some(tag) = tag {
        args.push(format!("{tag}..HEAD"));
    }
    args.push("--pretty=format:%h|%s|%an|%ad".into());
    args.push("--date=short".into());

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let Some(output) = git_output(&arg_refs) else {
        return Ok(Vec::new());
    };

    Ok(output.lines().filter_map(parse_commit_line).collect())
}

fn parse_commit_line(line: &str) -> Option<Commit> {
    let mut parts = line.splitn(4, '|');
    let hash = parts.next()?.trim();
    let subject = parts.next()?.trim();
    if hash.is_empty() || subject.is_empty() {
        return None;
    }
    Some(Commit {
        hash: hash.to_string(),
        subject: subject.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Categorization
// ---------------------------------------------------------------------------

/// Parse a conventional commit subject: `type(scope)!: description`.
fn parse_conventional(subject: &str) -> Option<Conventional> {
    let (head, description) = subject.split_once(':')?;
    let description = description.trim();
    if description.is_empty() {
        return None;
    }

    let mut head = head.trim();
    let mut breaking = false;
    if let Some(stripped) = head.strip_suffix('!') {
        head = stripped;
        breaking = true;
    }

    let kind = match head.split_once('(') {
        Some((kind, scope)) => {
            scope.strip_suffix(')')?;
            kind
        }
        None => head,
    };
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(Conventional {
        kind: kind.to_ascii_lowercase(),
        description: description.to_string(),
        breaking: breaking || subject.to_ascii_lowercase().contains("breaking"),
    })
}

fn categorize(commits: &[Commit]) -> Categories {
    let mut categories = Categories::default();

    for commit in commits {
        let entry = |description: &str| Entry {
            hash: commit.hash.clone(),
            description: description.to_string(),
        };

        match parse_conventional(&commit.subject) {
            Some(conv) if conv.breaking => categories.breaking.push(entry(&conv.description)),
            Some(conv) => match conv.kind.as_str() {
                "feat" => categories.feat.push(entry(&conv.description)),
                "fix" => categories.fix.push(entry(&conv.description)),
                "perf" => categories.perf.push(entry(&conv.description)),
                "refactor" => categories.refactor.push(entry(&conv.description)),
                "style" => categories.style.push(entry(&conv.description)),
                "test" => categories.test.push(entry(&conv.description)),
                "docs" => categories.docs.push(entry(&conv.description)),
                "build" => categories.build.push(entry(&conv.description)),
                "ci" => categories.ci.push(entry(&conv.description)),
                "chore" => categories.chore.push(entry(&conv.description)),
                // Unknown type: keep the whole subject for context.
                _ => categories.other.push(entry(&commit.subject)),
            },
            None => categories.other.push(entry(&commit.subject)),
        }
    }

    categories
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_markdown(categories: &Categories) -> String {
    let mut out = String::new();

    push_section(&mut out, "💥 BREAKING CHANGES", &categories.breaking);
    push_section(&mut out, "✨ Features", &categories.feat);
    push_section(&mut out, "🐛 Bug Fixes", &categories.fix);
    push_section(&mut out, "⚡ Performance Improvements", &categories.perf);
    push_section(&mut out, "🔨 Code Refactoring", &categories.refactor);
    push_section(&mut out, "📚 Documentation", &categories.docs);
    push_section(&mut out, "🧪 Tests", &categories.test);

    let build_ci: Vec<Entry> = categories
        .build
        .iter()
        .chain(&categories.ci)
        .cloned()
        .collect();
    push_section(&mut out, "🔧 Build System & CI", &build_ci);

    let maintenance: Vec<Entry> = categories
        .style
        .iter()
        .chain(&categories.chore)
        .cloned()
        .collect();
    push_section(&mut out, "🧹 Maintenance", &maintenance);

    push_section(&mut out, "Other Changes", &categories.other);
    out
}

fn push_section(out: &mut String, title: &str, entries: &[Entry]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("\n### {title}\n\n"));
    for entry in entries {
        out.push_str(&format!("- {} ({})\n", entry.description, entry.hash));
    }
}

// ---------------------------------------------------------------------------
// Changelog splicing
// ---------------------------------------------------------------------------

const UNRELEASED_HEADER: &str = "## [Unreleased]";

/// Replace the `[Unreleased]` section with a fresh empty one followed by the
/// new release section, and point the compare/release links at the new tag.
fn splice_unreleased(
    existing: &str,
    version: &str,
    date: &str,
    section: &str,
    repo_url: Option<&str>,
) -> String {
    let release = format!("{UNRELEASED_HEADER}\n\n## [{version}] - {date}{section}\n");

    let mut updated = if let Some(start) = existing.find(UNRELEASED_HEADER) {
        let after = start + UNRELEASED_HEADER.len();
        let rest = &existing[after..];
        let end = rest
            .find("\n## [")
            .or_else(|| rest.find("\n[Unreleased]:"))
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        format!("{}{}{}", &existing[..start], release, &rest[end..])
    } else {
        // No [Unreleased] section: insert the release after the title line.
        match existing.split_once('\n') {
            Some((title, rest)) => format!("{title}\n\n{release}{rest}"),
            None => format!("{existing}\n\n{release}"),
        }
    };

    if let Some(repo) = repo_url {
        updated = rewrite_links(&updated, version, repo);
    }
    updated
}

/// Re-point `[Unreleased]: …/compare/<old>...HEAD` at the new tag and add a
/// release link for the version right below it.
fn rewrite_links(text: &str, version: &str, repo_url: &str) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();

    for i in 0..lines.len() {
        if lines[i].starts_with("[Unreleased]: ") && lines[i].ends_with("...HEAD") {
            if let Some(pos) = lines[i].find("/compare/") {
                let prefix = lines[i][..pos + "/compare/".len()].to_string();
                lines[i] = format!("{prefix}v{version}...HEAD");
                lines.insert(i + 1, format!("[{version}]: {repo_url}/releases/tag/v{version}"));
                break;
            }
        }
    }

    lines.join("\n")
}

/// Strip `.git`/`git+` wrappers and rewrite SSH remotes to https.
fn normalize_repo_url(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_start_matches("git+")
        .trim_end_matches(".git");
    if let Some(path) = trimmed.strip_prefix("git@github.com:") {
        format!("https://github.com/{path}")
    } else {
        trimmed.to_string()
    }
}
