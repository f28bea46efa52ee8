//! Fight applications and queue pairing.
//!
//! An application is a pending request to fight: open until someone
//! eligible accepts it, at which point both sides are converted to a match,
//! or until its expiry timestamp passes. Expired applications are excluded
//! from every matching query.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use combat_core::{BattleKind, CharacterId, CombatMode, ZoneId};

use crate::error::{Result, RuntimeError};

/// Identifier of one queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

/// Lifecycle of a queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Open,
    Matched,
    Expired,
    Cancelled,
}

/// Inputs for opening an application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub applicant: CharacterId,
    pub kind: BattleKind,
    pub mode: CombatMode,
    /// Countdown before the scheduled match start, in seconds. Clamped to
    /// the configured bounds at accept time.
    pub countdown_secs: u32,
    /// Post-loss XP penalty percent carried into the match.
    pub trauma_percent: u32,
    /// Acceptors must fall inside this level range, when present.
    pub level_range: Option<(u32, u32)>,
    /// Closed fights list the only characters allowed to accept. Empty
    /// means open to anyone.
    pub invited: Vec<CharacterId>,
    pub zone: Option<ZoneId>,
}

/// One pending request to fight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: CharacterId,
    pub kind: BattleKind,
    pub mode: CombatMode,
    pub countdown_secs: u32,
    pub trauma_percent: u32,
    pub level_range: Option<(u32, u32)>,
    pub invited: Vec<CharacterId>,
    pub zone: Option<ZoneId>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    /// Who accepted, once matched.
    pub acceptor: Option<CharacterId>,
}

impl Application {
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ApplicationStatus::Open && self.expires_at > now
    }
}

/// In-memory application book.
pub struct Matchmaker {
    applications: RwLock<HashMap<ApplicationId, Application>>,
    next_id: AtomicU64,
    /// Maximum simultaneous open applications per zone.
    zone_capacity: usize,
}

impl Matchmaker {
    pub fn new(zone_capacity: usize) -> Self {
        Self {
            applications: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            zone_capacity,
        }
    }

    /// Opens an application.
    ///
    /// Rejected when the applicant already has an open entry or the target
    /// zone is at capacity. The entry expires `expiry_secs` after `now`.
    pub fn create(
        &self,
        request: ApplicationRequest,
        now: DateTime<Utc>,
        expiry_secs: u64,
    ) -> Result<Application> {
        let mut applications = self.write()?;

        let duplicate = applications
            .values()
            .any(|a| a.applicant == request.applicant && a.is_open_at(now));
        if duplicate {
            return Err(RuntimeError::DuplicateApplication);
        }

        if let Some(zone) = request.zone {
            let open_in_zone = applications
                .values()
                .filter(|a| a.zone == Some(zone) && a.is_open_at(now))
                .count();
            if open_in_zone >= self.zone_capacity {
                return Err(RuntimeError::ZoneAtCapacity);
            }
        }

        let id = ApplicationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let application = Application {
            id,
            applicant: request.applicant,
            kind: request.kind,
            mode: request.mode,
            countdown_secs: request.countdown_secs,
            trauma_percent: request.trauma_percent,
            level_range: request.level_range,
            invited: request.invited,
            zone: request.zone,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(expiry_secs as i64),
            status: ApplicationStatus::Open,
            acceptor: None,
        };
        applications.insert(id, application.clone());
        Ok(application)
    }

    /// Open, unexpired applications the given character could accept.
    pub fn available_for(
        &self,
        character: CharacterId,
        level: u32,
        now: DateTime<Utc>,
    ) -> Vec<Application> {
        let Ok(applications) = self.read() else {
            return Vec::new();
        };
        let mut list: Vec<Application> = applications
            .values()
            .filter(|a| {
                a.is_open_at(now)
                    && a.applicant != character
                    && Self::eligible(a, character, level).is_ok()
            })
            .cloned()
            .collect();
        list.sort_by_key(|a| a.id.0);
        list
    }

    /// Accepts an application, converting it to `Matched`.
    ///
    /// Validates that the entry is open and unexpired and that the acceptor
    /// passes the level-range and invite rules. An entry whose deadline has
    /// passed is flipped to `Expired` on the spot and rejected.
    pub fn accept(
        &self,
        id: ApplicationId,
        acceptor: CharacterId,
        level: u32,
        now: DateTime<Utc>,
    ) -> Result<Application> {
        let mut applications = self.write()?;
        let application = applications
            .get_mut(&id)
            .ok_or(RuntimeError::ApplicationNotFound(id))?;

        match application.status {
            ApplicationStatus::Open => {}
            ApplicationStatus::Expired => return Err(RuntimeError::ApplicationExpired(id)),
            _ => {
                return Err(RuntimeError::NotEligible {
                    reason: "application is no longer open".into(),
                });
            }
        }
        if application.expires_at <= now {
            application.status = ApplicationStatus::Expired;
            return Err(RuntimeError::ApplicationExpired(id));
        }
        if application.applicant == acceptor {
            return Err(RuntimeError::NotEligible {
                reason: "cannot accept your own application".into(),
            });
        }
        Self::eligible(application, acceptor, level)?;

        application.status = ApplicationStatus::Matched;
        application.acceptor = Some(acceptor);
        Ok(application.clone())
    }

    /// Flips an overdue open application to `Expired`. Returns whether the
    /// transition happened; fired timers re-validate through this, so a
    /// matched or cancelled entry is left alone.
    pub fn expire(&self, id: ApplicationId, now: DateTime<Utc>) -> bool {
        let Ok(mut applications) = self.write() else {
            return false;
        };
        match applications.get_mut(&id) {
            Some(a) if a.status == ApplicationStatus::Open && a.expires_at <= now => {
                a.status = ApplicationStatus::Expired;
                true
            }
            _ => false,
        }
    }

    /// Sweeps every overdue open application.
    pub fn expire_due(&self, now: DateTime<Utc>) -> Vec<ApplicationId> {
        let Ok(mut applications) = self.write() else {
            return Vec::new();
        };
        let mut expired = Vec::new();
        for a in applications.values_mut() {
            if a.status == ApplicationStatus::Open && a.expires_at <= now {
                a.status = ApplicationStatus::Expired;
                expired.push(a.id);
            }
        }
        expired
    }

    pub fn cancel(&self, id: ApplicationId) -> Result<()> {
        let mut applications = self.write()?;
        let application = applications
            .get_mut(&id)
            .ok_or(RuntimeError::ApplicationNotFound(id))?;
        application.status = ApplicationStatus::Cancelled;
        Ok(())
    }

    pub fn get(&self, id: ApplicationId) -> Result<Application> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(RuntimeError::ApplicationNotFound(id))
    }

    fn eligible(application: &Application, acceptor: CharacterId, level: u32) -> Result<()> {
        if let Some((min, max)) = application.level_range
            && !(min..=max).contains(&level)
        {
            return Err(RuntimeError::NotEligible {
                reason: format!("level {level} outside allowed range {min}-{max}"),
            });
        }
        if !application.invited.is_empty() && !application.invited.contains(&acceptor) {
            return Err(RuntimeError::NotEligible {
                reason: "closed fight: not on the invite list".into(),
            });
        }
        Ok(())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<ApplicationId, Application>>> {
        self.applications
            .read()
            .map_err(|_| RuntimeError::Internal("application book lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<ApplicationId, Application>>> {
        self.applications
            .write()
            .map_err(|_| RuntimeError::Internal("application book lock poisoned".into()))
    }
}
