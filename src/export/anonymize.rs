//! Participant coding for exported rows.
//!
//! Every username in the people columns (including `@mentions` in Tagged)
//! gets a stable code (`p0001`, ...)
//! assigned in sorted order, and every repository a team code (`t0001`, ...).

use std::collections::{BTreeMap, BTreeSet};

use super::row::{mention_login, CsvRow, SENTINEL};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Codebook {
    participants: BTreeMap<String, String>,
    repositories: BTreeMap<String, String>,
}

impl Codebook {
    pub fn from_rows(rows: &[CsvRow]) -> Codebook {
        let mut users = BTreeSet::new();
        let mut repos = BTreeSet::new();
        for row in rows {
            for cell in people_cells(row) {
                users.extend(usernames(cell).map(String::from));
            }
            repos.insert(normalize_repository(&row.repository));
        }

        Codebook {
            participants: assign(users, 'p'),
            repositories: assign(repos, 't'),
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn repository_count(&self) -> usize {
        self.repositories.len()
    }

    pub fn participant(&self, username: &str) -> Option<&str> {
        self.participants.get(username).map(String::as_str)
    }

    /// Replace names with codes in place. Names missing from the codebook
    /// are left as they are; sentinel cells stay sentinels.
    pub fn apply(&self, rows: &mut [CsvRow]) {
        for row in rows {
            let repository = normalize_repository(&row.repository);
            if let Some(code) = self.repositories.get(&repository) {
                row.repository = code.clone();
            }
            for cell in [
                &mut row.author,
                &mut row.assignees,
                &mut row.closed_by,
                &mut row.reviewers,
                &mut row.tagged,
            ] {
                *cell = self.code_cell(cell);
            }
            for text in [&mut row.message, &mut row.description] {
                *text = self.code_mentions(text);
            }
        }
    }

    /// Rewrite `@login` mentions of known participants inside free text.
    fn code_mentions(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(idx) = rest.find('@') {
            out.push_str(&rest[..idx]);
            let preceded_by_word = out.chars().next_back().is_some_and(|c| c.is_alphanumeric());
            let tail = &rest[idx + 1..];
            let login = mention_login(tail);
            out.push('@');
            match self.participant(login) {
                Some(code) if !preceded_by_word && !login.is_empty() => {
                    out.push_str(code);
                    rest = &tail[login.len()..];
                }
                _ => rest = tail,
            }
        }
        out.push_str(rest);
        out
    }

    fn code_cell(&self, cell: &str) -> String {
        if is_sentinel(cell) {
            return SENTINEL.to_string();
        }
        let coded: Vec<&str> = usernames(cell)
            .map(|user| self.participant(user).unwrap_or(user))
            .collect();
        if coded.is_empty() {
            SENTINEL.to_string()
        } else {
            coded.join(";")
        }
    }
}

/// Lower-case and strip everything but ASCII letters and digits.
pub fn normalize_repository(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn people_cells(row: &CsvRow) -> [&str; 5] {
    [
        row.author.as_str(),
        row.assignees.as_str(),
        row.closed_by.as_str(),
        row.reviewers.as_str(),
        row.tagged.as_str(),
    ]
}

fn usernames(cell: &str) -> impl Iterator<Item = &str> {
    let skip = is_sentinel(cell);
    cell.split([',', ';'])
        .map(str::trim)
        .filter(move |user| !skip && !user.is_empty() && *user != SENTINEL)
}

fn is_sentinel(cell: &str) -> bool {
    cell.trim().is_empty() || cell.trim() == SENTINEL
}

fn assign(names: BTreeSet<String>, prefix: char) -> BTreeMap<String, String> {
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, format!("{}{:04}", prefix, i + 1)))
        .collect()
}
