use clubhub_core::{Identity, new_id, now_rfc3339};
use clubhub_kv::{run_atomic, KVRead};
use tracing::info;

use crate::model::{CreateEvent, Event, Registration, RegistrationStatus};
use crate::service::{
    ensure_head, keys, txn_get, txn_put, txn_require_club, txn_require_user, ClubError,
    ClubService,
};

fn txn_require_event<R: KVRead + ?Sized>(txn: &R, id: &str) -> Result<Event, ClubError> {
    txn_get(txn, &keys::event(id))?.ok_or_else(|| ClubError::NotFound(format!("event {id}")))
}

impl ClubService {
    /// Create an event for a club. Head only.
    pub fn create_event(
        &self,
        who: &Identity,
        club_id: &str,
        input: CreateEvent,
    ) -> Result<Event, ClubError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(ClubError::Validation("event title must not be empty".into()));
        }

        let now = now_rfc3339();
        let event = Event {
            id: new_id(),
            club_id: club_id.to_string(),
            title: title.to_string(),
            description: input.description,
            starts_at: input.starts_at,
            fee_cents: input.fee_cents,
            created_at: now.clone(),
            updated_at: now,
        };

        run_atomic(self.kv.as_ref(), |txn| -> Result<(), ClubError> {
            let club = txn_require_club(txn, club_id)?;
            ensure_head(who, &club)?;
            txn_put(txn, &keys::event(&event.id), &event)
        })?;

        info!("event {} created for club {club_id}", event.id);
        Ok(event)
    }

    pub fn get_event(&self, id: &str) -> Result<Event, ClubError> {
        self.get_doc(&keys::event(id))?
            .ok_or_else(|| ClubError::NotFound(format!("event {id}")))
    }

    /// Events of one club, newest first.
    pub fn list_events(&self, club_id: &str) -> Result<Vec<Event>, ClubError> {
        self.require_club(club_id)?;
        let mut events: Vec<Event> = self.scan_docs(keys::EVENT_PREFIX)?;
        events.retain(|e| e.club_id == club_id);
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    /// Register the caller for an event.
    ///
    /// Free events confirm immediately; paid events wait in `PENDING` for the
    /// club head.
    pub fn register(&self, who: &Identity, event_id: &str) -> Result<Registration, ClubError> {
        let registration = run_atomic(self.kv.as_ref(), |txn| -> Result<_, ClubError> {
            let event = txn_require_event(txn, event_id)?;
            txn_require_user(txn, &who.user_id)?;

            let key = keys::registration(event_id, &who.user_id);
            if txn_get::<Registration, _>(txn, &key)?.is_some() {
                return Err(ClubError::Conflict(format!(
                    "user {} is already registered for event {event_id}",
                    who.user_id
                )));
            }

            let now = now_rfc3339();
            let registration = Registration {
                event_id: event_id.to_string(),
                user_id: who.user_id.clone(),
                status: if event.is_paid() {
                    RegistrationStatus::Pending
                } else {
                    RegistrationStatus::Confirmed
                },
                created_at: now.clone(),
                updated_at: now,
            };
            txn_put(txn, &key, &registration)?;
            Ok(registration)
        })?;

        info!(
            "user {} registered for event {event_id} ({})",
            who.user_id, registration.status
        );
        Ok(registration)
    }

    /// Confirm or reject a pending registration. Club head only.
    pub fn decide_registration(
        &self,
        who: &Identity,
        event_id: &str,
        user_id: &str,
        status: RegistrationStatus,
    ) -> Result<Registration, ClubError> {
        if !status.is_terminal() {
            return Err(ClubError::Validation(format!(
                "a registration can only be decided as CONFIRMED or REJECTED, got {status}"
            )));
        }

        let registration = run_atomic(self.kv.as_ref(), |txn| -> Result<_, ClubError> {
            let event = txn_require_event(txn, event_id)?;
            let club = txn_require_club(txn, &event.club_id)?;
            ensure_head(who, &club)?;

            let key = keys::registration(event_id, user_id);
            let mut registration: Registration = txn_get(txn, &key)?.ok_or_else(|| {
                ClubError::NotFound(format!("registration {event_id}/{user_id}"))
            })?;
            if registration.status != RegistrationStatus::Pending {
                return Err(ClubError::Validation(format!(
                    "registration is {}, cannot move to {status}",
                    registration.status
                )));
            }

            registration.status = status;
            registration.updated_at = now_rfc3339();
            txn_put(txn, &key, &registration)?;
            Ok(registration)
        })?;

        info!("registration {event_id}/{user_id} {status} by {}", who.user_id);
        Ok(registration)
    }

    /// Withdraw the caller's own registration, whatever its state.
    pub fn cancel_registration(&self, who: &Identity, event_id: &str) -> Result<(), ClubError> {
        run_atomic(self.kv.as_ref(), |txn| -> Result<(), ClubError> {
            let key = keys::registration(event_id, &who.user_id);
            if txn_get::<Registration, _>(txn, &key)?.is_none() {
                return Err(ClubError::NotFound(format!(
                    "registration {event_id}/{}",
                    who.user_id
                )));
            }
            txn.delete(&key)?;
            Ok(())
        })?;

        info!("user {} cancelled registration for event {event_id}", who.user_id);
        Ok(())
    }

    /// All registrations for an event. Club head only.
    pub fn list_registrations(
        &self,
        who: &Identity,
        event_id: &str,
    ) -> Result<Vec<Registration>, ClubError> {
        let event = self.get_event(event_id)?;
        let club = self.require_club(&event.club_id)?;
        ensure_head(who, &club)?;

        let mut registrations: Vec<Registration> =
            self.scan_docs(&keys::registrations_of(event_id))?;
        registrations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(registrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Club, User};
    use crate::service::testutil::*;

    fn event(svc: &ClubService, head: &User, club: &Club, fee_cents: u64) -> Event {
        svc.create_event(
            &as_identity(head),
            &club.id,
            CreateEvent {
                title: "Spring tournament".into(),
                description: None,
                starts_at: Some("2026-04-01T18:00:00Z".into()),
                fee_cents,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_free_event_confirms_immediately() {
        let (svc, _dir) = test_service();
        let hana = head(&svc, "Hana");
        let club = club_headed_by(&svc, &hana, "Chess");
        let free = event(&svc, &hana, &club, 0);
        let alice = student(&svc, "Alice");

        let reg = svc.register(&as_identity(&alice), &free.id).unwrap();
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
    }

    #[test]
    fn test_paid_event_lifecycle() {
        let (svc, _dir) = test_service();
        let hana = head(&svc, "Hana");
        let club = club_headed_by(&svc, &hana, "Chess");
        let paid = event(&svc, &hana, &club, 1500);
        let alice = student(&svc, "Alice");
        let bob = student(&svc, "Bob");

        let reg = svc.register(&as_identity(&alice), &paid.id).unwrap();
        assert_eq!(reg.status, RegistrationStatus::Pending);
        svc.register(&as_identity(&bob), &paid.id).unwrap();

        let confirmed = svc
            .decide_registration(
                &as_identity(&hana),
                &paid.id,
                &alice.id,
                RegistrationStatus::Confirmed,
            )
            .unwrap();
        assert_eq!(confirmed.status, RegistrationStatus::Confirmed);

        let rejected = svc
            .decide_registration(&as_identity(&hana), &paid.id, &bob.id, RegistrationStatus::Rejected)
            .unwrap();
        assert_eq!(rejected.status, RegistrationStatus::Rejected);

        // Decided registrations cannot be decided again.
        let err = svc
            .decide_registration(&as_identity(&hana), &paid.id, &bob.id, RegistrationStatus::Confirmed)
            .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));

        let all = svc.list_registrations(&as_identity(&hana), &paid.id).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_decide_requires_head_and_terminal_status() {
        let (svc, _dir) = test_service();
        let hana = head(&svc, "Hana");
        let club = club_headed_by(&svc, &hana, "Chess");
        let paid = event(&svc, &hana, &club, 500);
        let alice = student(&svc, "Alice");
        svc.register(&as_identity(&alice), &paid.id).unwrap();

        let err = svc
            .decide_registration(
                &as_identity(&alice),
                &paid.id,
                &alice.id,
                RegistrationStatus::Confirmed,
            )
            .unwrap_err();
        assert!(matches!(err, ClubError::Forbidden(_)));

        let err = svc
            .decide_registration(&as_identity(&hana), &paid.id, &alice.id, RegistrationStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));

        let err = svc
            .list_registrations(&as_identity(&alice), &paid.id)
            .unwrap_err();
        assert!(matches!(err, ClubError::Forbidden(_)));
    }

    #[test]
    fn test_double_register_conflicts_and_cancel() {
        let (svc, _dir) = test_service();
        let hana = head(&svc, "Hana");
        let club = club_headed_by(&svc, &hana, "Chess");
        let free = event(&svc, &hana, &club, 0);
        let alice = student(&svc, "Alice");
        let who = as_identity(&alice);

        svc.register(&who, &free.id).unwrap();
        let err = svc.register(&who, &free.id).unwrap_err();
        assert!(matches!(err, ClubError::Conflict(_)));

        svc.cancel_registration(&who, &free.id).unwrap();
        let err = svc.cancel_registration(&who, &free.id).unwrap_err();
        assert!(matches!(err, ClubError::NotFound(_)));

        svc.register(&who, &free.id).unwrap();
    }

    #[test]
    fn test_create_event_checks() {
        let (svc, _dir) = test_service();
        let hana = head(&svc, "Hana");
        let club = club_headed_by(&svc, &hana, "Chess");
        let alice = student(&svc, "Alice");

        let input = CreateEvent {
            title: "Blitz".into(),
            description: None,
            starts_at: None,
            fee_cents: 0,
        };
        let err = svc
            .create_event(&as_identity(&alice), &club.id, input.clone())
            .unwrap_err();
        assert!(matches!(err, ClubError::Forbidden(_)));

        let err = svc
            .create_event(&as_identity(&hana), "missing", input.clone())
            .unwrap_err();
        assert!(matches!(err, ClubError::NotFound(_)));

        svc.create_event(&as_identity(&hana), &club.id, input).unwrap();
        assert_eq!(svc.list_events(&club.id).unwrap().len(), 1);
    }

    #[test]
    fn test_register_unknown_event() {
        let (svc, _dir) = test_service();
        let alice = student(&svc, "Alice");
        let err = svc.register(&as_identity(&alice), "missing").unwrap_err();
        assert!(matches!(err, ClubError::NotFound(_)));
    }
}
