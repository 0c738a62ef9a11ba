//! src/messages.rs
use serde::Deserialize;

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
}

/// User facing texts of the confirmation endpoints.
#[derive(Clone, Copy, Debug)]
pub struct Messages {
    language: Language,
}

impl Messages {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn link_expired(&self) -> &'static str {
        match self.language {
            Language::De => "Der benutzte Link ist leider abgelaufen. Bitte melden Sie sich erneut für den Newsletter an.",
            Language::En => "The link you used has expired. Please subscribe to the newsletter again.",
        }
    }

    pub fn generic_failure(&self) -> &'static str {
        match self.language {
            Language::De => "Es ist leider etwas schief gelaufen. Bitte versuchen Sie es erneut.",
            Language::En => "Something went wrong. Please try again.",
        }
    }

    pub fn unsubscribed(&self, newsletter: &str) -> String {
        match self.language {
            Language::De => format!(
                "Sie wurden erfolgreich von der Abonnentenliste von {} abgemeldet.",
                newsletter
            ),
            Language::En => format!(
                "You were successfully removed from the subscriber list of {}.",
                newsletter
            ),
        }
    }

    pub fn subscribed(&self, newsletter: &str) -> String {
        match self.language {
            Language::De => format!(
                "Sie wurden erfolgreich zu der Abonnentenliste von {} hinzugefügt.",
                newsletter
            ),
            Language::En => format!(
                "You were successfully added to the subscriber list of {}.",
                newsletter
            ),
        }
    }

    pub fn no_pending_changes(&self) -> &'static str {
        match self.language {
            Language::De => "Alle Änderungen an Ihren Abonnements wurden bereits übernommen. Es wurde nichts geändert.",
            Language::En => {
                "All changes to your subscriptions where already applied. No changes made."
            }
        }
    }

    pub fn changes_confirmed(&self, email: &str) -> String {
        match self.language {
            Language::De => format!("Abonnement-Änderungen für {} bestätigt.", email),
            Language::En => format!("Subscription changes confirmed for {}.", email),
        }
    }

    pub fn confirmation_subject(&self) -> &'static str {
        match self.language {
            Language::De => "Bitte bestätigen Sie Ihr Newsletter-Abonnement",
            Language::En => "Please confirm your newsletter subscription",
        }
    }

    pub fn confirmation_body(&self, newsletters: &str, link: &str) -> String {
        match self.language {
            Language::De => format!(
                "<p>Vielen Dank für Ihr Interesse an: {}</p><br/>Klicken Sie <a href=\"{}\">hier</a>, um die Änderungen zu bestätigen.",
                newsletters, link
            ),
            Language::En => format!(
                "<p>Thanks for your interest in: {}</p><br/>Click <a href=\"{}\">here</a> to confirm the changes.",
                newsletters, link
            ),
        }
    }
}
