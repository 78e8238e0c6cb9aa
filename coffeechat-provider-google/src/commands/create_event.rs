use anyhow::{Context, Result};
use coffeechat_core::event::CreatedEvent;
use coffeechat_core::protocol::CreateEvent;
use google_calendar::types::SendUpdates;

use crate::google_event::ToGoogle;
use crate::remote_config::GoogleRemoteConfig;
use crate::session::Session;

pub async fn handle(cmd: CreateEvent) -> Result<CreatedEvent> {
    let config = GoogleRemoteConfig::try_from(&cmd.remote_config)?;
    let client = Session::load_valid(&config.google_account).await?.client()?;

    let google_event = cmd.event.to_google();
    let send_updates = if cmd.event.send_updates {
        SendUpdates::All
    } else {
        SendUpdates::None
    };

    let response = client
        .events()
        .insert(
            &cmd.calendar_id,
            0,
            0,
            false,
            send_updates,
            false,
            &google_event,
        )
        .await
        .with_context(|| format!("Failed to create event: {}", &google_event.summary))?;

    let created = response.body;

    Ok(CreatedEvent {
        id: created.id,
        html_link: Some(created.html_link).filter(|link| !link.is_empty()),
    })
}
