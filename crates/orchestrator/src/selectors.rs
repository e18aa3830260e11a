//! Element selectors consumed by the sub-protocols. Configuration data so
//! deployments can track platform markup changes without a rebuild; the
//! defaults target LinkedIn.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSelectors {
    pub login_url: String,
    pub username_field: String,
    pub password_field: String,
    pub submit_button: String,
    /// URL fragments that identify a post-login security checkpoint.
    pub challenge_markers: Vec<String>,
    pub connect_button: String,
    pub add_note_button: String,
    pub note_textarea: String,
    pub send_button: String,
    pub listing_item: String,
    pub listing_name: String,
    pub listing_title: String,
    pub listing_link: String,
}

impl PlatformSelectors {
    pub fn linkedin() -> Self {
        Self {
            login_url: "https://www.linkedin.com/login".to_string(),
            username_field: "#username".to_string(),
            password_field: "#password".to_string(),
            submit_button: "button[type=\"submit\"]".to_string(),
            challenge_markers: vec!["checkpoint".to_string(), "challenge".to_string()],
            connect_button: "button[aria-label*=\"Connect\"]".to_string(),
            add_note_button: "button[aria-label*=\"Add a note\"]".to_string(),
            note_textarea: "textarea[name=\"message\"]".to_string(),
            send_button: "button[aria-label*=\"Send\"]".to_string(),
            listing_item: ".artdeco-list__item".to_string(),
            listing_name: ".artdeco-entity-lockup__title".to_string(),
            listing_title: ".artdeco-entity-lockup__subtitle".to_string(),
            listing_link: "a[href*=\"/sales/lead/\"]".to_string(),
        }
    }
}

impl Default for PlatformSelectors {
    fn default() -> Self {
        Self::linkedin()
    }
}
