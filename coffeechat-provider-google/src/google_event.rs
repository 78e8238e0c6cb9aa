use coffeechat_core::event::{EventRequest, Transparency};

pub trait ToGoogle {
    fn to_google(&self) -> google_calendar::types::Event;
}

impl ToGoogle for EventRequest {
    fn to_google(&self) -> google_calendar::types::Event {
        let transparency = match self.transparency {
            Transparency::Opaque => "opaque".to_string(),
            Transparency::Transparent => "transparent".to_string(),
        };

        // Never fall back to the calendar's default reminders.
        let reminders = Some(google_calendar::types::Reminders {
            overrides: self
                .reminders
                .iter()
                .map(|r| google_calendar::types::EventReminder {
                    method: "popup".to_string(),
                    minutes: r.minutes,
                })
                .collect(),
            use_default: false,
        });

        let attendees = self
            .attendees
            .iter()
            .map(|email| attendee_to_google(email))
            .collect();

        google_calendar::types::Event {
            summary: self.summary.clone(),
            description: self.description.clone().unwrap_or_default(),
            start: Some(utc_to_google(self.start)),
            end: Some(utc_to_google(self.end)),
            transparency,
            reminders,
            attendees,
            guests_can_modify: self.guests_can_modify,
            ..Default::default()
        }
    }
}

fn attendee_to_google(email: &str) -> google_calendar::types::EventAttendee {
    google_calendar::types::EventAttendee {
        email: email.to_string(),
        display_name: String::new(),
        response_status: "needsAction".to_string(),
        additional_guests: 0,
        comment: String::new(),
        id: String::new(),
        optional: false,
        organizer: false,
        resource: false,
        self_: false,
    }
}

fn utc_to_google(time: chrono::DateTime<chrono::Utc>) -> google_calendar::types::EventDateTime {
    google_calendar::types::EventDateTime {
        date: None,
        date_time: Some(time),
        time_zone: "UTC".to_string(),
    }
}
