//! Subjects and plain-text bodies of outgoing onboarding mail.

/// A message ready for [`super::Mailer::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub subject: String,
    pub body: String,
}

pub fn signup_team(site_name: &str, link: &str) -> Notice {
    Notice {
        subject: format!("Finish creating your team on {}", site_name),
        body: format!(
            "Thanks for signing up.\n\n\
             Follow this link within the next hour to set up your team:\n\n{}\n",
            link
        ),
    }
}

pub fn invite(sender: &str, sender_status: &str, team_name: &str, link: &str) -> Notice {
    Notice {
        subject: format!("{} invited you to join {}", sender, team_name),
        body: format!(
            "{}, a team {}, invited you to join {}.\n\n\
             Follow this link within the next hour to create your account:\n\n{}\n",
            sender, sender_status, team_name, link
        ),
    }
}

pub fn find_teams(site_name: &str, team_links: &[String]) -> Notice {
    let body = if team_links.is_empty() {
        "We could not find any teams for this email address.\n".to_string()
    } else {
        format!(
            "You belong to the following teams:\n\n{}\n",
            team_links.join("\n")
        )
    };

    Notice {
        subject: format!("Your {} teams", site_name),
        body,
    }
}
