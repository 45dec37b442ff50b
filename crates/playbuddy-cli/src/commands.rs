//! One handler per subcommand.

use anyhow::{bail, Context as _, Result};
use chrono::{Duration, Utc};
use playbuddy_core::models::{
    attendee_counts, attendees_for_event, group_by_day, Event, ImportSourceUpdate, OrganizerEventsDeletion,
    OrganizerMerge, OrganizerUpdate,
};
use playbuddy_core::utils::{format_bytes, format_optional};
use playbuddy_core::{add_promo_code, EventsOptions, ImportSourcesOptions, OfflineStore, Session, SessionData};
use serde_json::json;
use tracing::info;

use crate::context::Context;
use crate::output::{print_json, require_data, Table};
use crate::{CacheCommand, Commands, ImportSourceCommand, OrganizerCommand};

pub async fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Events { admin, unapproved } => events(ctx, admin, unapproved).await,
        Commands::Organizers => organizers(ctx).await,
        Commands::Attendees { event } => attendees(ctx, event).await,
        Commands::Kinks => kinks(ctx).await,
        Commands::ImportSources { all } => import_sources(ctx, all).await,
        Commands::FestivalSchedule { search } => festival_schedule(ctx, search.as_deref()).await,
        Commands::PromoCodes => promo_codes(ctx).await,
        Commands::Organizer(cmd) => organizer(ctx, cmd).await,
        Commands::ImportSource(cmd) => import_source(ctx, cmd).await,
        Commands::PromoUrl { url, code } => promo_url(ctx, &url, &code),
        Commands::Login {
            token,
            user_id,
            email,
            expires_in,
        } => login(ctx, SessionData::new(token, user_id, email), expires_in),
        Commands::Logout => logout(ctx),
        Commands::Status => status(ctx),
        Commands::Cache(cmd) => cache(ctx, cmd),
    }
}

fn event_row(event: &Event) -> Vec<String> {
    let promo = event
        .promo_code()
        .map(|p| format!("{} ({})", p.promo_code, p.discount_label()));
    vec![
        event.id.to_string(),
        event.formatted_datetime_short(),
        event.name.clone(),
        format_optional(Some(event.organizer_name()), "-"),
        format_optional(event.short_price.as_deref().or(event.price.as_deref()), "-"),
        format_optional(promo.as_deref(), "-"),
    ]
}

async fn events(ctx: &Context, admin: bool, unapproved: bool) -> Result<()> {
    let state = if unapproved {
        ctx.data.fetch_unapproved_events().await
    } else {
        let options = if admin { EventsOptions::admin() } else { EventsOptions::default() };
        ctx.data.fetch_events(&options).await
    };
    let events = require_data("events", state)?;
    if ctx.json {
        return print_json(&events);
    }

    let mut table = Table::new(&["ID", "WHEN", "NAME", "ORGANIZER", "PRICE", "PROMO"]);
    for event in &events {
        table.row(event_row(event));
    }
    table.print();
    Ok(())
}

async fn organizers(ctx: &Context) -> Result<()> {
    let organizers = require_data("organizers", ctx.data.fetch_organizers().await)?;
    if ctx.json {
        return print_json(&organizers);
    }

    let mut table = Table::new(&["ID", "NAME", "HIDDEN", "PROMOS", "FETLIFE"]);
    for org in &organizers {
        table.row([
            org.id.to_string(),
            org.name.clone(),
            if org.is_hidden() { "yes" } else { "" }.to_string(),
            org.promo_codes.len().to_string(),
            org.all_fetlife_handles().join(", "),
        ]);
    }
    table.print();
    Ok(())
}

async fn attendees(ctx: &Context, event_id: Option<i64>) -> Result<()> {
    let entries = require_data("attendees", ctx.data.fetch_attendees().await)?;

    if let Some(event_id) = event_id {
        let people = attendees_for_event(&entries, event_id);
        if ctx.json {
            return print_json(&people);
        }
        let mut table = Table::new(&["ID", "NAME"]);
        for person in people {
            table.row([person.id.as_str(), person.name.as_str()]);
        }
        table.print();
        return Ok(());
    }

    let counts = attendee_counts(&entries);
    if ctx.json {
        let counts: Vec<_> = counts
            .iter()
            .map(|(event_id, count)| json!({"event_id": event_id, "attendees": count}))
            .collect();
        return print_json(&counts);
    }
    let mut table = Table::new(&["EVENT", "ATTENDEES"]);
    for (event_id, count) in counts {
        table.row([event_id.to_string(), count.to_string()]);
    }
    table.print();
    Ok(())
}

async fn kinks(ctx: &Context) -> Result<()> {
    let kinks = require_data("kinks", ctx.data.fetch_kinks().await)?;
    if ctx.json {
        return print_json(&kinks);
    }

    let mut table = Table::new(&["ID", "TITLE", "LEVEL", "CATEGORIES", "PICK"]);
    for kink in &kinks {
        table.row([
            kink.id.to_string(),
            kink.idea_title.clone(),
            format_optional(kink.level.as_deref(), "-"),
            kink.category_names().join(", "),
            if kink.is_recommended() { "*" } else { "" }.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

async fn import_sources(ctx: &Context, all: bool) -> Result<()> {
    let options = if all { ImportSourcesOptions::all() } else { ImportSourcesOptions::default() };
    let sources = require_data("import sources", ctx.data.fetch_import_sources(options).await)?;
    if ctx.json {
        return print_json(&sources);
    }

    let mut table = Table::new(&["ID", "SOURCE", "METHOD", "IDENTIFIER", "STATUS", "ORGANIZER"]);
    for source in &sources {
        table.row([
            source.id.clone(),
            source.source.clone(),
            source.method.to_string(),
            source.identifier.clone(),
            source
                .approval_status
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
            source
                .organizer_id()
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
        ]);
    }
    table.print();
    Ok(())
}

async fn festival_schedule(ctx: &Context, search: Option<&str>) -> Result<()> {
    let mut sessions = require_data("festival schedule", ctx.data.fetch_festival_schedule().await)?;
    if let Some(query) = search {
        sessions.retain(|s| s.matches(query));
    }
    if ctx.json {
        return print_json(&sessions);
    }

    let days = group_by_day(&sessions);
    if days.is_empty() {
        println!("(none)");
    }
    for (day, day_sessions) in days {
        println!("{}", day.format("%A, %b %d"));
        let mut table = Table::new(&["TIME", "SESSION", "LOCATION"]);
        for session in day_sessions {
            table.row([
                session.time_range().unwrap_or_default(),
                session.name.clone(),
                format_optional(session.location.as_deref(), ""),
            ]);
        }
        table.print();
        println!();
    }
    Ok(())
}

async fn promo_codes(ctx: &Context) -> Result<()> {
    let codes = require_data("promo codes", ctx.data.fetch_promo_codes().await)?;
    if ctx.json {
        return print_json(&codes);
    }

    let mut table = Table::new(&["ID", "CODE", "DISCOUNT", "ORGANIZER", "SCOPE"]);
    for code in &codes {
        table.row([
            code.id.clone(),
            code.promo_code.clone(),
            code.discount_label(),
            code.organizer_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            format_optional(code.scope.as_deref(), "-"),
        ]);
    }
    table.print();
    Ok(())
}

/// Build the patch for `organizer update`, refusing an empty one.
fn organizer_update(id: i64, hidden: Option<bool>, name: Option<String>) -> Result<OrganizerUpdate> {
    if hidden.is_none() && name.is_none() {
        bail!("Nothing to update; pass --hidden or --name");
    }
    Ok(OrganizerUpdate {
        hidden,
        name,
        ..OrganizerUpdate::new(id)
    })
}

async fn organizer(ctx: &Context, cmd: OrganizerCommand) -> Result<()> {
    match cmd {
        OrganizerCommand::Update { id, hidden, name } => {
            let update = organizer_update(id, hidden, name)?;
            let updated = ctx
                .data
                .update_organizer()
                .mutate(update)
                .await
                .with_context(|| format!("Failed to update organizer {}", id))?;
            info!(organizer_id = id, "Updated organizer");
            if ctx.json {
                return print_json(&updated);
            }
            println!("Updated {}", updated.label());
        }
        OrganizerCommand::Merge {
            source,
            target,
            keep_source,
        } => {
            let merge = OrganizerMerge {
                source_organizer_id: source,
                target_organizer_id: target,
                delete_source: !keep_source,
            };
            let outcome = ctx
                .data
                .merge_organizer()
                .mutate(merge)
                .await
                .with_context(|| format!("Failed to merge organizer {} into {}", source, target))?;
            if ctx.json {
                return print_json(&outcome);
            }
            println!(
                "Merged organizer {} into {}: {} events moved{}",
                source,
                target,
                outcome.events_moved.unwrap_or(0),
                if outcome.source_deleted.unwrap_or(false) { ", source deleted" } else { "" }
            );
        }
        OrganizerCommand::DeleteEvents {
            id,
            only_without_attendees,
        } => {
            let deletion = OrganizerEventsDeletion {
                organizer_id: id,
                only_without_attendees,
            };
            let deleted = ctx
                .data
                .delete_organizer_events()
                .mutate(deletion)
                .await
                .with_context(|| format!("Failed to delete events of organizer {}", id))?;
            if ctx.json {
                return print_json(&deleted);
            }
            println!("Deleted {} events", deleted.deleted);
        }
    }
    Ok(())
}

async fn import_source(ctx: &Context, cmd: ImportSourceCommand) -> Result<()> {
    match cmd {
        ImportSourceCommand::Approve { id } => {
            let source = ctx
                .data
                .update_import_source()
                .mutate(ImportSourceUpdate::approve(id.as_str()))
                .await
                .with_context(|| format!("Failed to approve import source {}", id))?;
            if ctx.json {
                return print_json(&source);
            }
            println!("Approved {} ({})", source.identifier, source.id);
        }
        ImportSourceCommand::Delete { id } => {
            ctx.data
                .delete_import_source()
                .mutate(id.clone())
                .await
                .with_context(|| format!("Failed to delete import source {}", id))?;
            if ctx.json {
                return print_json(&json!({"deleted": id}));
            }
            println!("Deleted import source {}", id);
        }
    }
    Ok(())
}

fn promo_url(ctx: &Context, url: &str, code: &str) -> Result<()> {
    let rewritten = add_promo_code(url, code)?;
    if ctx.json {
        return print_json(&json!({"url": rewritten}));
    }
    println!("{}", rewritten);
    Ok(())
}

fn login(ctx: &Context, data: SessionData, expires_in: Option<i64>) -> Result<()> {
    if data.token.trim().is_empty() || data.auth_user_id.trim().is_empty() {
        bail!("Token and user id must not be empty");
    }
    let data = match expires_in {
        Some(minutes) if minutes <= 0 => bail!("--expires-in must be a positive number of minutes"),
        Some(minutes) => {
            let Some(expires_at) = Duration::try_minutes(minutes).and_then(|d| Utc::now().checked_add_signed(d)) else {
                bail!("--expires-in is too large");
            };
            data.with_expiry(expires_at)
        }
        None => data,
    };

    let mut session = Session::new(ctx.cache_dir.clone());
    let who = data.display_name().to_string();
    session.update(data);
    session.save().context("Failed to save session")?;
    info!(user = %who, "Signed in");
    println!("Signed in as {}", who);
    Ok(())
}

fn logout(ctx: &Context) -> Result<()> {
    let mut session = Session::new(ctx.cache_dir.clone());
    session.clear().context("Failed to remove session")?;
    println!("Signed out");
    Ok(())
}

fn status(ctx: &Context) -> Result<()> {
    let signed_in = ctx.session.current();
    let offline = ctx.offline_store();

    if ctx.json {
        return print_json(&json!({
            "api_url": ctx.config.api_url(),
            "signed_in": signed_in.is_some(),
            "user_id": ctx.session.auth_user_id(),
            "minutes_left": signed_in.map(|d| d.minutes_until_expiry()),
            "offline_entries": offline.map(OfflineStore::len),
        }));
    }

    println!("API:      {}", ctx.config.api_url());
    match signed_in {
        Some(data) => println!(
            "Session:  {} ({} min left)",
            data.display_name(),
            data.minutes_until_expiry()
        ),
        None => println!("Session:  signed out"),
    }
    match offline {
        Some(store) => println!("Offline:  {} responses in {}", store.len(), store.dir().display()),
        None => println!("Offline:  disabled"),
    }
    Ok(())
}

fn cache(ctx: &Context, cmd: CacheCommand) -> Result<()> {
    let Some(store) = ctx.offline_store() else {
        bail!("The offline store is disabled in the config");
    };
    match cmd {
        CacheCommand::List => {
            let entries = store.entries();
            if ctx.json {
                let entries: Vec<_> = entries
                    .iter()
                    .map(|e| json!({"key": e.key, "age": e.age, "bytes": e.size}))
                    .collect();
                return print_json(&entries);
            }
            let mut table = Table::new(&["KEY", "SAVED", "SIZE"]);
            for entry in &entries {
                table.row([entry.key.to_string(), entry.age.clone(), format_bytes(entry.size)]);
            }
            table.print();
        }
        CacheCommand::Prune => {
            let removed = store.prune().context("Failed to prune offline store")?;
            println!("Removed {} stored responses", removed);
        }
        CacheCommand::Clear => {
            store.clear().context("Failed to clear offline store")?;
            println!("Cleared offline store");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use playbuddy_core::Config;

    use super::*;

    fn context_in(dir: &Path) -> Context {
        let config = Config {
            api_url: Some("http://127.0.0.1:1".into()),
            cache_dir: Some(dir.to_path_buf()),
            ..Config::default()
        };
        Context::new(config, dir.to_path_buf(), false).unwrap()
    }

    #[test]
    fn test_organizer_update_requires_a_field() {
        assert!(organizer_update(3, None, None).is_err());

        let update = organizer_update(3, Some(true), None).unwrap();
        assert_eq!(update.id, 3);
        assert_eq!(update.hidden, Some(true));
    }

    #[test]
    fn test_event_row_uses_placeholders() {
        let event: Event = serde_json::from_value(json!({
            "id": 9,
            "name": "Rope Jam",
            "start_date": "2025-01-26T17:00:00Z"
        }))
        .unwrap();
        let row = event_row(&event);
        assert_eq!(row[0], "9");
        assert_eq!(row[2], "Rope Jam");
        assert_eq!(&row[3..], ["-", "-", "-"]);
    }

    #[test]
    fn test_login_then_logout() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());

        login(&ctx, SessionData::new("tok".into(), "user-1".into(), None), None).unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        assert!(session.load().unwrap());
        assert_eq!(session.auth_user_id(), Some("user-1"));

        login(&ctx, SessionData::new("tok".into(), "user-1".into(), None), Some(10)).unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.load().unwrap();
        assert!(session.current().unwrap().minutes_until_expiry() <= 10);

        logout(&ctx).unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        assert!(!session.load().unwrap());
    }

    #[test]
    fn test_login_rejects_blank_token() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        assert!(login(&ctx, SessionData::new(" ".into(), "user-1".into(), None), None).is_err());
        assert!(login(&ctx, SessionData::new("tok".into(), "user-1".into(), None), Some(0)).is_err());
    }

    #[test]
    fn test_login_rejects_out_of_range_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        let data = SessionData::new("tok".into(), "user-1".into(), None);
        let err = login(&ctx, data.clone(), Some(1_000_000_000_000)).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(login(&ctx, data, Some(i64::MAX)).is_err());
        assert!(!dir.path().join("session.json").exists());
    }

    #[test]
    fn test_cache_commands() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        let store = ctx.offline_store().unwrap();
        store
            .save(&playbuddy_core::resources::keys::kinks(), &json!([]))
            .unwrap();
        assert_eq!(store.len(), 1);

        cache(&ctx, CacheCommand::List).unwrap();
        cache(&ctx, CacheCommand::Prune).unwrap();
        assert_eq!(store.len(), 1);
        cache(&ctx, CacheCommand::Clear).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_cache_commands_need_offline_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            offline_enabled: false,
            cache_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let ctx = Context::new(config, dir.path().to_path_buf(), false).unwrap();
        assert!(cache(&ctx, CacheCommand::Clear).is_err());
    }

    #[test]
    fn test_promo_url_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        assert!(promo_url(&ctx, "https://x.com/e", "SAVE10").is_ok());
        assert!(promo_url(&ctx, "not a url", "SAVE10").is_err());
    }
}
