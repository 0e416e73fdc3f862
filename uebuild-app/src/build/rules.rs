//! Reading `ModuleRules` / `TargetRules` source text
//!
//! Rules files are C# classes, but the parts the build graph needs are a few
//! enum assignments and list additions. Those are matched textually after
//! comments are stripped; anything else in the class body is ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use super::error::BuildError;
use super::types::RulesKind;

/// Directories never containing rules files worth reading
const SKIPPED_DIRS: &[&str] = &["Binaries", "Intermediate", "Saved", "DerivedDataCache"];

/// Statements under one of these only run conditionally
const CONDITIONAL_KEYWORDS: &[&str] = &["if", "else", "switch", "case", "default"];

// Verbatim @"..." (only "" escapes) or regular "..." (backslash escapes)
static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@"((?:[^"]|"")*)"|"((?:[^"\\]|\\.)*)""#).expect("string literal regex")
});

// Field = EnumType.Variant;
static ENUM_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\w+)\s*=\s*(\w+)\s*\.\s*(\w+)\s*;").expect("enum assignment regex")
});

// ListName.Add( / ListName.AddRange(
static LIST_ADDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\w+)\s*\.\s*(AddRange|Add)\s*\(").expect("list addition regex")
});

static RULES_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+(\w+)\s*:\s*(\w+)").expect("rules class regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    /// `"..."`, backslash escapes
    Regular,
    /// `@"..."`, `""` is the only escape
    Verbatim,
}

/// Remove `//` and `/* */` comments, keeping string literals and line breaks
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut literal: Option<Literal> = None;

    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        match (literal, c, next) {
            (Some(Literal::Regular), '\\', Some(escaped)) => {
                out.push(c);
                out.push(escaped);
                chars.next();
            }
            (Some(Literal::Verbatim), '"', Some('"')) => {
                out.push_str("\"\"");
                chars.next();
            }
            (Some(_), '"', _) => {
                literal = None;
                out.push(c);
            }
            (Some(_), _, _) => out.push(c),
            (None, '@', Some('"')) => {
                literal = Some(Literal::Verbatim);
                out.push_str("@\"");
                chars.next();
            }
            (None, '"', _) => {
                literal = Some(Literal::Regular);
                out.push(c);
            }
            (None, '/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            (None, '/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
                out.push(' ');
            }
            (None, _, _) => out.push(c),
        }
    }

    out
}

/// Characters of comment-free `text` outside string literals, with byte offsets
fn code_chars(text: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut chars = text.char_indices().peekable();
    let mut literal: Option<Literal> = None;

    std::iter::from_fn(move || {
        while let Some((index, c)) = chars.next() {
            let next = chars.peek().map(|&(_, next)| next);
            match (literal, c, next) {
                (Some(Literal::Regular), '\\', Some(_)) | (Some(Literal::Verbatim), '"', Some('"')) => {
                    chars.next();
                }
                (Some(_), '"', _) => literal = None,
                (Some(_), _, _) => {}
                (None, '@', Some('"')) => {
                    chars.next();
                    literal = Some(Literal::Verbatim);
                }
                (None, '"', _) => literal = Some(Literal::Regular),
                (None, _, _) => return Some((index, c)),
            }
        }
        None
    })
}

/// Variant of the last `field = enum_type.Variant;` assignment in `text`
pub fn enum_assignment<'t>(text: &'t str, field: &str, enum_type: &str) -> Option<&'t str> {
    ENUM_ASSIGNMENT
        .captures_iter(text)
        .filter(|captures| &captures[1] == field && &captures[2] == enum_type)
        .last()
        .and_then(|captures| captures.get(3))
        .map(|variant| variant.as_str())
}

/// Parse an enum field, falling back to the type's default when unassigned
pub fn parse_enum_field<T>(
    text: &str,
    descriptor: &str,
    field: &'static str,
    enum_type: &str,
) -> Result<T, BuildError>
where
    T: FromStr + Default,
{
    let Some(token) = enum_assignment(text, field, enum_type) else {
        return Ok(T::default());
    };

    T::from_str(token).map_err(|_| BuildError::UnknownToken {
        descriptor: descriptor.to_string(),
        field,
        token: token.to_string(),
    })
}

/// Every string passed to `list.Add(...)` or `list.AddRange(...)`, in order
pub fn list_additions(text: &str, list: &str) -> Vec<String> {
    let mut names = Vec::new();

    for captures in LIST_ADDITION.captures_iter(text) {
        if &captures[1] != list {
            continue;
        }
        let Some(call) = captures.get(0) else {
            continue;
        };

        let arguments = balanced_arguments(&text[call.end()..]);
        let added: Vec<String> = string_literals(arguments).collect();
        if is_conditional(text, call.start()) {
            tracing::debug!(
                "{} addition of [{}] is inside a conditional block, applied unconditionally",
                list,
                added.join(", ")
            );
        }
        names.extend(added);
    }

    names
}

/// Text up to the parenthesis closing an already opened call
fn balanced_arguments(rest: &str) -> &str {
    let mut depth = 1usize;

    for (index, c) in code_chars(rest) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &rest[..index];
                }
            }
            _ => {}
        }
    }

    rest
}

fn string_literals(text: &str) -> impl Iterator<Item = String> + '_ {
    STRING_LITERAL
        .captures_iter(text)
        .filter_map(|captures| match (captures.get(1), captures.get(2)) {
            (Some(verbatim), _) => Some(verbatim.as_str().replace("\"\"", "\"")),
            (None, Some(regular)) => Some(regular.as_str().to_string()),
            (None, None) => None,
        })
        .map(|literal| literal.trim().to_string())
        .filter(|literal| !literal.is_empty())
}

/// Whether the statement at `position` runs under an `if`, `else` or `switch`.
///
/// Conditions are not evaluated; rules files are read as if every branch ran.
pub fn is_conditional(text: &str, position: usize) -> bool {
    let code = &text[..position];
    let mut open_blocks: Vec<&str> = Vec::new();
    let mut statement_start = 0;

    for (index, c) in code_chars(code) {
        match c {
            '{' => {
                open_blocks.push(code[statement_start..index].trim());
                statement_start = index + 1;
            }
            '}' => {
                open_blocks.pop();
                statement_start = index + 1;
            }
            ';' => statement_start = index + 1,
            _ => {}
        }
    }

    let statement = code[statement_start..].trim();
    starts_with_conditional(statement) || open_blocks.into_iter().any(starts_with_conditional)
}

fn starts_with_conditional(header: &str) -> bool {
    header
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .is_some_and(|keyword| CONDITIONAL_KEYWORDS.contains(&keyword))
}

/// Name of the first class deriving from the rules base class of `kind`
pub fn rules_class(text: &str, kind: RulesKind) -> Option<&str> {
    RULES_CLASS
        .captures_iter(text)
        .find(|captures| &captures[2] == kind.base_class())
        .and_then(|captures| captures.get(1))
        .map(|class| class.as_str())
}

/// The file name decides the descriptor name; a disagreeing class is only a warning.
pub fn warn_on_class_mismatch(name: &str, text: &str, kind: RulesKind) {
    let expected = kind.expected_class_name(name);
    match rules_class(text, kind) {
        Some(class) if class == expected => {}
        Some(class) => tracing::warn!(
            "{}{} declares class {}, expected {}",
            name,
            kind.suffix(),
            class,
            expected
        ),
        None => tracing::warn!(
            "{}{} has no class deriving from {}",
            name,
            kind.suffix(),
            kind.base_class()
        ),
    }
}

/// `Homework.Build.cs` -> `Homework`
pub fn descriptor_name(path: &Path, kind: RulesKind) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.strip_suffix(kind.suffix())?;
    (!name.is_empty()).then(|| name.to_string())
}

pub fn read_rules(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|e| BuildError::io(path, e))
}

/// All rules files of `kind` below `dir`, sorted by path
pub fn find_rules_files(dir: &Path, kind: RulesKind) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| descriptor_name(entry.path(), kind).is_some())
        .map(DirEntry::into_path)
        .collect();

    files.sort();
    files
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.iter().any(|skipped| name == *skipped)
}
