//! The simulated interaction sub-protocols: login, connection request,
//! profile visit, and listing extraction. Every flow paces itself through
//! the emulator before and after each interaction; element absence maps to
//! semantic outcomes rather than errors.

use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{ActionOutcome, Credentials, Lead, SkippedEntry, Target};
use outreach_emulation::{HumanEmulator, Point};

use crate::driver::{ElementHandle, PageSession, SessionCookie};
use crate::selectors::PlatformSelectors;

/// Log in with human-like pacing and capture session cookies.
///
/// A post-login location matching a challenge marker is a security
/// checkpoint: terminal for the run and never retried, since retrying a
/// flagged account risks a ban. A location still on the login page means
/// the credentials were rejected.
pub async fn login(
    session: &mut dyn PageSession,
    emulator: &mut HumanEmulator,
    selectors: &PlatformSelectors,
    account_id: Uuid,
    credentials: &Credentials,
) -> OutreachResult<Vec<SessionCookie>> {
    info!(account_id = %account_id, "logging in");
    session.navigate(&selectors.login_url).await?;
    emulator.pause_secs(2, 4).await;

    let username_field = session
        .query(&selectors.username_field)
        .await?
        .ok_or_else(|| OutreachError::Authentication {
            account_id,
            reason: "login form not present".to_string(),
        })?;
    human_type(session, emulator, username_field, &credentials.username).await?;
    emulator.pause_secs(1, 2).await;

    let password_field = session
        .query(&selectors.password_field)
        .await?
        .ok_or_else(|| OutreachError::Authentication {
            account_id,
            reason: "password field not present".to_string(),
        })?;
    human_type(session, emulator, password_field, &credentials.secret).await?;
    emulator.pause_secs(1, 2).await;

    let submit = session
        .query(&selectors.submit_button)
        .await?
        .ok_or_else(|| OutreachError::Authentication {
            account_id,
            reason: "submit button not present".to_string(),
        })?;
    session.click(submit).await?;
    // Give the post-login redirect time to settle before inspecting it.
    emulator.pause_secs(2, 4).await;

    let location = session.current_url().await?;
    if selectors
        .challenge_markers
        .iter()
        .any(|marker| location.contains(marker.as_str()))
    {
        return Err(OutreachError::SecurityChallenge {
            account_id,
            location,
        });
    }
    if location.starts_with(selectors.login_url.as_str()) {
        return Err(OutreachError::Authentication {
            account_id,
            reason: "credentials rejected".to_string(),
        });
    }

    let cookies = session.cookies().await?;
    info!(account_id = %account_id, cookies = cookies.len(), "login successful");
    Ok(cookies)
}

/// Send a connection request, optionally with a personalized note.
pub async fn send_connection_request(
    session: &mut dyn PageSession,
    emulator: &mut HumanEmulator,
    selectors: &PlatformSelectors,
    target: &Target,
    note: Option<&str>,
) -> OutreachResult<ActionOutcome> {
    debug!(target = %target.profile_url, "visiting profile");
    session.navigate(&target.profile_url).await?;
    emulator.pause_secs(3, 8).await;

    // Skim the profile before acting on it.
    replay_scroll(session, emulator).await?;
    emulator.pause_secs(2, 5).await;

    let Some(connect_button) = session.query(&selectors.connect_button).await? else {
        debug!(target = %target.profile_url, "connect affordance absent");
        return Ok(ActionOutcome::AlreadyConnected);
    };
    // Drift the pointer toward the action area rather than teleporting.
    replay_pointer(session, emulator, Point::new(640.0, 420.0)).await?;
    session.click(connect_button).await?;
    emulator.pause_secs(1, 2).await;

    if let Some(note_text) = note {
        if let Some(add_note) = session.query(&selectors.add_note_button).await? {
            session.click(add_note).await?;
            emulator
                .pause(Duration::from_millis(500), Duration::from_millis(1_000))
                .await;
            if let Some(textarea) = session.query(&selectors.note_textarea).await? {
                human_type(session, emulator, textarea, note_text).await?;
                emulator.pause_secs(1, 2).await;
            }
        }
    }

    let Some(send_button) = session.query(&selectors.send_button).await? else {
        warn!(target = %target.profile_url, "send affordance absent after opening dialog");
        return Ok(ActionOutcome::Failed);
    };
    session.click(send_button).await?;
    debug!(target = %target.profile_url, "connection request sent");
    Ok(ActionOutcome::Success)
}

/// Visit a profile: navigate, dwell, skim. The visit itself is the action.
pub async fn visit_profile(
    session: &mut dyn PageSession,
    emulator: &mut HumanEmulator,
    target: &Target,
) -> OutreachResult<ActionOutcome> {
    debug!(target = %target.profile_url, "visiting profile");
    session.navigate(&target.profile_url).await?;
    emulator.pause_secs(3, 8).await;
    replay_scroll(session, emulator).await?;
    emulator.pause_secs(2, 5).await;
    Ok(ActionOutcome::Success)
}

/// Extract up to `limit` entries from a listing page, scrolling a fixed
/// number of rounds to trigger incremental loading. Unparseable entries
/// are catalogued and skipped; the returned list may be shorter than
/// `limit`.
pub async fn extract_listing(
    session: &mut dyn PageSession,
    emulator: &mut HumanEmulator,
    selectors: &PlatformSelectors,
    campaign_id: Uuid,
    search_url: &str,
    limit: usize,
    scroll_rounds: usize,
) -> OutreachResult<(Vec<Lead>, Vec<SkippedEntry>)> {
    info!(search_url, limit, "extracting listing");
    session.navigate(search_url).await?;
    emulator.pause_secs(3, 6).await;

    for _ in 0..scroll_rounds {
        replay_scroll(session, emulator).await?;
        emulator.pause_secs(2, 4).await;
    }

    let cards = session.query_all(&selectors.listing_item).await?;
    let mut leads = Vec::new();
    let mut skipped = Vec::new();

    for (index, card) in cards.into_iter().take(limit).enumerate() {
        match extract_card(session, selectors, card).await {
            Ok(Some((name, title, profile_url))) => leads.push(Lead {
                id: Uuid::new_v4(),
                campaign_id,
                name,
                title,
                profile_url,
            }),
            Ok(None) => skipped.push(SkippedEntry {
                index,
                reason: "name or profile link missing".to_string(),
            }),
            Err(error) => skipped.push(SkippedEntry {
                index,
                reason: error.to_string(),
            }),
        }
    }

    info!(extracted = leads.len(), skipped = skipped.len(), "listing extraction finished");
    Ok((leads, skipped))
}

async fn extract_card(
    session: &mut dyn PageSession,
    selectors: &PlatformSelectors,
    card: ElementHandle,
) -> OutreachResult<Option<(String, Option<String>, String)>> {
    let name_el = session.query_within(card, &selectors.listing_name).await?;
    let link_el = session.query_within(card, &selectors.listing_link).await?;
    let (Some(name_el), Some(link_el)) = (name_el, link_el) else {
        return Ok(None);
    };

    let name = match session.inner_text(name_el).await? {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => return Ok(None),
    };
    let Some(profile_url) = session.attribute(link_el, "href").await? else {
        return Ok(None);
    };

    let title = match session.query_within(card, &selectors.listing_title).await? {
        Some(title_el) => session
            .inner_text(title_el)
            .await?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        None => None,
    };

    Ok(Some((name, title, profile_url)))
}

/// Click into an element and replay a typing plan against it, one key at a
/// time with the planned pauses.
pub async fn human_type(
    session: &mut dyn PageSession,
    emulator: &mut HumanEmulator,
    element: ElementHandle,
    text: &str,
) -> OutreachResult<()> {
    session.click(element).await?;
    emulator
        .pause(Duration::from_millis(300), Duration::from_millis(800))
        .await;
    for stroke in emulator.plan_typing(text) {
        tokio::time::sleep(stroke.delay).await;
        session.send_key(element, stroke.key).await?;
    }
    Ok(())
}

/// Replay an interpolated pointer path as individual mouse-move events.
pub async fn replay_pointer(
    session: &mut dyn PageSession,
    emulator: &mut HumanEmulator,
    target: Point,
) -> OutreachResult<()> {
    for step in emulator.pointer_path(Point::new(0.0, 0.0), target) {
        tokio::time::sleep(step.delay).await;
        session.move_mouse(step.point.x, step.point.y).await?;
    }
    Ok(())
}

/// Replay a scroll plan through `window.scrollBy`.
pub async fn replay_scroll(
    session: &mut dyn PageSession,
    emulator: &mut HumanEmulator,
) -> OutreachResult<()> {
    for step in emulator.plan_scroll() {
        session
            .evaluate(&format!("window.scrollBy(0, {})", step.delta_px))
            .await?;
        tokio::time::sleep(step.pause).await;
    }
    Ok(())
}
