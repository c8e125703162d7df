//! Open pull request discovery

use std::collections::HashSet;

use octocrab::params;
use tracing::debug;

use crate::client::PER_PAGE;
use crate::{GitHubClient, Mode, PullRequestRef, RepoName, Result};

/// List open, non-draft pull requests for a repository, newest first
///
/// Precondition: PR numbers are monotonically non-decreasing with creation
/// time. Because results arrive created-descending, the first PR numbered
/// below `minimum_number` ends the scan for the whole repository - nothing
/// after it can qualify. If the precondition were ever violated (it cannot
/// be through the normal API), older-numbered-but-newer PRs would be missed.
///
/// `Mode::Community` drops PRs authored by a team member or skip-user;
/// `Mode::All` keeps every non-draft PR.
pub async fn find_prs(
    client: &GitHubClient,
    repo: &RepoName,
    team: &HashSet<String>,
    skip_users: &HashSet<String>,
    minimum_number: u64,
    mode: Mode,
) -> Result<Vec<PullRequestRef>> {
    let mut found = Vec::new();

    let mut page = client
        .inner()
        .pulls(&repo.owner, &repo.name)
        .list()
        .state(params::State::Open)
        .sort(params::pulls::Sort::Created)
        .direction(params::Direction::Descending)
        .per_page(PER_PAGE as u8)
        .send()
        .await?;

    loop {
        let items = std::mem::take(&mut page.items);
        let refs: Vec<PullRequestRef> = items
            .into_iter()
            .filter_map(|pr| PullRequestRef::from_octocrab(repo, pr))
            .collect();

        if scan_page(refs, team, skip_users, minimum_number, mode, &mut found) {
            break;
        }

        match client.inner().get_page(&page.next).await? {
            Some(next) => page = next,
            None => break,
        }
    }

    Ok(found)
}

/// Scan one page of descending-ordered PRs into `out`
///
/// Returns `true` once a PR below `minimum_number` is seen: the scan stops
/// there rather than skipping, since every later entry is older still.
fn scan_page(
    prs: Vec<PullRequestRef>,
    team: &HashSet<String>,
    skip_users: &HashSet<String>,
    minimum_number: u64,
    mode: Mode,
    out: &mut Vec<PullRequestRef>,
) -> bool {
    for pr in prs {
        if pr.number < minimum_number {
            return true;
        }
        if pr.draft {
            continue;
        }
        if mode == Mode::Community
            && (team.contains(&pr.author) || skip_users.contains(&pr.author))
        {
            debug!(pr = %pr.html_url, author = %pr.author, "Skipping internal pull request");
            continue;
        }

        debug!(pr = %pr.html_url, author = %pr.author, "Pull request meets criteria");
        out.push(pr);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn make_pr(number: u64, author: &str, draft: bool) -> PullRequestRef {
        PullRequestRef {
            repo: "acme/widget".parse().unwrap(),
            number,
            author: author.to_string(),
            // Numbers descend with age in these fixtures, matching the API ordering
            created_at: Utc::now() - Duration::days(1000 - number as i64),
            draft,
            labels: vec![],
            head_sha: format!("sha-{number}"),
            html_url: format!("https://github.com/acme/widget/pull/{number}"),
        }
    }

    fn team() -> HashSet<String> {
        ["maintainer".to_string()].into_iter().collect()
    }

    fn skip() -> HashSet<String> {
        ["dependabot[bot]".to_string()].into_iter().collect()
    }

    #[test]
    fn test_scan_stops_below_minimum_number() {
        // Page ordered newest-first. The entry below the minimum must end
        // the scan entirely: the qualifying PR after it is not picked up.
        // Known limitation by design - if PR numbers ever stopped tracking
        // creation order, that later entry would be silently missed.
        let page = vec![
            make_pr(50, "alice", false),
            make_pr(10, "bob", false),
            make_pr(40, "carol", false),
        ];
        let mut out = Vec::new();
        let stop = scan_page(page, &team(), &skip(), 20, Mode::All, &mut out);

        assert!(stop);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].number, 50);
    }

    #[test]
    fn test_scan_continues_when_all_qualify() {
        let page = vec![make_pr(50, "alice", false), make_pr(40, "bob", false)];
        let mut out = Vec::new();
        let stop = scan_page(page, &team(), &skip(), 20, Mode::All, &mut out);

        assert!(!stop);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_drafts_dropped_in_both_modes() {
        let page = vec![make_pr(50, "alice", true), make_pr(40, "maintainer", true)];
        for mode in [Mode::Community, Mode::All] {
            let mut out = Vec::new();
            scan_page(page.clone(), &team(), &skip(), 0, mode, &mut out);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_community_mode_drops_team_and_skip_users() {
        let page = vec![
            make_pr(52, "maintainer", false),
            make_pr(51, "dependabot[bot]", false),
            make_pr(50, "alice", false),
        ];
        let mut out = Vec::new();
        scan_page(page, &team(), &skip(), 0, Mode::Community, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].author, "alice");
    }

    #[test]
    fn test_all_mode_keeps_team_authors() {
        let page = vec![make_pr(52, "maintainer", false), make_pr(50, "alice", false)];
        let mut out = Vec::new();
        scan_page(page, &team(), &skip(), 0, Mode::All, &mut out);

        assert_eq!(out.len(), 2);
    }
}
