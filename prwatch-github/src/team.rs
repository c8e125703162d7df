//! Team membership resolution

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{Error, GitHubClient, Result};

#[derive(Debug, Deserialize)]
struct TeamMember {
    login: String,
}

/// Resolve a team identifier to the set of member logins
///
/// `team` must be in `org/slug` form. All pages of the roster are fetched
/// before returning; logins on the ignore list (matched case-insensitively)
/// are excluded.
pub async fn team_members(
    client: &GitHubClient,
    team: &str,
    ignored: &[String],
) -> Result<HashSet<String>> {
    let (org, slug) = parse_team(team)?;

    let roster: Vec<TeamMember> = client
        .get_all(&format!("/orgs/{org}/teams/{slug}/members"))
        .await?;

    let members: HashSet<String> = roster
        .into_iter()
        .map(|m| m.login)
        .filter(|login| {
            if is_ignored(login, ignored) {
                debug!(login = %login, "Excluding ignored team member");
                false
            } else {
                true
            }
        })
        .collect();

    info!(team = %team, count = members.len(), "Resolved team membership");

    Ok(members)
}

/// Split a team identifier into `(org, slug)`
pub(crate) fn parse_team(team: &str) -> Result<(&str, &str)> {
    let mut parts = team.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(org), Some(slug), None) if !org.is_empty() && !slug.is_empty() => Ok((org, slug)),
        _ => Err(Error::TeamFormat(team.to_string())),
    }
}

fn is_ignored(login: &str, ignored: &[String]) -> bool {
    ignored.iter().any(|i| i.eq_ignore_ascii_case(login))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_team() {
        let (org, slug) = parse_team("acme/reviewers").unwrap();
        assert_eq!(org, "acme");
        assert_eq!(slug, "reviewers");
    }

    #[test]
    fn test_parse_team_rejects_bare_org() {
        assert!(matches!(
            parse_team("acme"),
            Err(Error::TeamFormat(_))
        ));
    }

    #[test]
    fn test_parse_team_rejects_extra_segments() {
        assert!(matches!(
            parse_team("acme/reviewers/extra"),
            Err(Error::TeamFormat(_))
        ));
        assert!(matches!(parse_team("acme/"), Err(Error::TeamFormat(_))));
    }

    #[test]
    fn test_is_ignored_case_insensitive() {
        let ignored = vec!["Acme-Bot".to_string()];
        assert!(is_ignored("acme-bot", &ignored));
        assert!(is_ignored("ACME-BOT", &ignored));
        assert!(!is_ignored("acme-bot-2", &ignored));
    }
}
