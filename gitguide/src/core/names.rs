//! Branch and ref naming rules shared by the flows.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Local short name of a remote-qualified ref (`origin/topic` -> `topic`,
/// `origin/feature/x` -> `feature/x`). Names without a remote component are
/// returned unchanged.
pub fn local_name(remote_ref: &str) -> &str {
    remote_ref
        .split_once('/')
        .map_or(remote_ref, |(_, tail)| tail)
}

/// Generate a unique `base.N` branch name, skipping names already taken by
/// a local branch or the short name of a remote branch.
pub fn unique_branch_name(base: &str, local: &[String], remote: &[String]) -> String {
    let taken: HashSet<&str> = local
        .iter()
        .map(String::as_str)
        .chain(remote.iter().map(|r| local_name(r)))
        .collect();
    // A trailing `.suffix` on the base is stripped before numbering, so
    // branching from `topic.2` yields `topic.3` rather than `topic.2.1`.
    let stem = match base.rfind('.') {
        Some(i) => &base[..i],
        None => base,
    };
    let mut n = 1;
    loop {
        let candidate = format!("{stem}.{n}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

/// A new local branch name must be non-empty and must not collide with an
/// existing local branch or the short name of a remote branch.
pub fn is_available_branch_name(name: &str, local: &[String], remote: &[String]) -> bool {
    if name.is_empty() {
        return false;
    }
    if local.iter().any(|l| l == name) {
        return false;
    }
    !remote.iter().any(|r| local_name(r) == name)
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern should be valid"));

/// Loose plausibility check for an email address; real validation belongs
/// to the mail system, this only catches obvious typos at the prompt.
pub fn is_plausible_email(candidate: &str) -> bool {
    EMAIL_RE.is_match(candidate)
}

/// Directory a clone of `url` lands in: last path component, `.git`
/// stripped, backslashes treated as separators.
pub fn clone_dir_name(url: &str) -> String {
    let normalized = url.replace('\\', "/");
    let last = normalized
        .rsplit('/')
        .find(|part| !part.is_empty())
        .unwrap_or(&normalized);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn local_name_strips_remote_component_only() {
        assert_eq!(local_name("origin/topic"), "topic");
        assert_eq!(local_name("origin/feature/x"), "feature/x");
        assert_eq!(local_name("topic"), "topic");
    }

    #[test]
    fn unique_name_skips_taken_numbers() {
        let local = names(&["main", "main.1", "main.3"]);
        let remote = names(&["origin/main.2"]);
        assert_eq!(unique_branch_name("main", &local, &remote), "main.4");
    }

    #[test]
    fn unique_name_strips_numeric_suffix_before_counting() {
        let local = names(&["topic", "topic.1", "topic.2"]);
        assert_eq!(unique_branch_name("topic.2", &local, &[]), "topic.3");
    }

    #[test]
    fn availability_rejects_blank_and_collisions() {
        let local = names(&["main"]);
        let remote = names(&["origin/topic"]);
        assert!(!is_available_branch_name("", &local, &remote));
        assert!(!is_available_branch_name("main", &local, &remote));
        assert!(!is_available_branch_name("topic", &local, &remote));
        assert!(is_available_branch_name("fresh", &local, &remote));
    }

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("dev@example.com"));
        assert!(!is_plausible_email("dev@example"));
        assert!(!is_plausible_email("not an email"));
    }

    #[test]
    fn clone_dir_from_url() {
        assert_eq!(clone_dir_name("https://example.com/team/repo.git"), "repo");
        assert_eq!(clone_dir_name("git@example.com:team/repo.git"), "repo");
        assert_eq!(clone_dir_name("C:\\repos\\thing"), "thing");
        assert_eq!(clone_dir_name("https://example.com/repo/"), "repo");
    }
}
