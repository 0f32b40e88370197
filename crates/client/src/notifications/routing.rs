//! Where clicking a notification takes the user.
//!
//! The backend does not send a link, so the destination is derived from the
//! notification text. Only notifications tied to an entity are navigable.

use std::sync::LazyLock;

use innovation_portal_core::{Notification, paths};
use regex::Regex;

static IDEA_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)a soumis une nouvelle idée\s*:\s*['’]([^'’]+)['’]").expect("Invalid regex")
});

static PROJECT_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)projet\s+['’]([^'’]+)['’]").expect("Invalid regex"));

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)par\s+['’]([^'’]+)['’]").expect("Invalid regex"));

const IDEA_MARKER: &str = "nouvelle idée";
const EVALUATION_MARKERS: &[&str] = &["évaluation", "évalué", "projet"];

/// Destination for a click on `notification`, or `None` to stay put.
#[must_use]
pub fn destination(notification: &Notification) -> Option<String> {
    notification.related_id.as_ref()?;

    let text = format!("{}\n{}", notification.title, notification.message);
    let lowered = text.to_lowercase();

    if lowered.contains(IDEA_MARKER) {
        let title = capture(&IDEA_TITLE_RE, &text);
        return Some(with_search(paths::IDEAS_LISTING, title.as_deref()));
    }

    if EVALUATION_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        let parts: Vec<String> = [
            capture(&PROJECT_TITLE_RE, &text),
            capture(&USERNAME_RE, &text),
        ]
        .into_iter()
        .flatten()
        .collect();
        let query = (!parts.is_empty()).then(|| parts.join(" "));
        return Some(with_search(paths::STATISTICS, query.as_deref()));
    }

    None
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn with_search(base: &str, query: Option<&str>) -> String {
    match query {
        Some(query) => format!(
            "{base}?{}={}",
            paths::SEARCH_PARAM,
            urlencoding::encode(query)
        ),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use innovation_portal_core::{NotificationId, NotificationType};

    use super::*;

    fn notification(title: &str, message: &str) -> Notification {
        Notification {
            id: NotificationId::new("1"),
            title: title.to_string(),
            message: message.to_string(),
            kind: NotificationType::Info,
            is_read: false,
            created_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            related_id: Some("42".to_string()),
        }
    }

    #[test]
    fn test_idea_submission() {
        let n = notification("Nouvelle idée", "X a soumis une nouvelle idée : 'Idea Title'");
        assert_eq!(
            destination(&n).as_deref(),
            Some("/admin/idea?search=Idea%20Title")
        );
    }

    #[test]
    fn test_idea_submission_without_title() {
        let n = notification("Nouvelle idée", "Une idée est arrivée");
        assert_eq!(destination(&n).as_deref(), Some("/admin/idea"));
    }

    #[test]
    fn test_evaluation_with_project_and_user() {
        let n = notification(
            "Nouvelle évaluation",
            "Le projet 'Solar Roof' a été évalué par 'jdoe'",
        );
        assert_eq!(
            destination(&n).as_deref(),
            Some("/admin/statistics?search=Solar%20Roof%20jdoe")
        );
    }

    #[test]
    fn test_evaluation_with_single_match() {
        let n = notification("Évaluation terminée", "Évalué par 'jdoe'");
        assert_eq!(
            destination(&n).as_deref(),
            Some("/admin/statistics?search=jdoe")
        );

        let n = notification("Projet mis à jour", "Le projet 'Solar Roof' avance");
        assert_eq!(
            destination(&n).as_deref(),
            Some("/admin/statistics?search=Solar%20Roof")
        );
    }

    #[test]
    fn test_evaluation_without_matches() {
        let n = notification("Évaluation", "Une évaluation a été enregistrée");
        assert_eq!(destination(&n).as_deref(), Some("/admin/statistics"));
    }

    #[test]
    fn test_unrelated_text_stays_put() {
        let n = notification("Bienvenue", "Votre compte est prêt");
        assert_eq!(destination(&n), None);
    }

    #[test]
    fn test_missing_related_id_disables_navigation() {
        let mut n = notification("Nouvelle idée", "X a soumis une nouvelle idée : 'Idea Title'");
        n.related_id = None;
        assert_eq!(destination(&n), None);
    }
}
