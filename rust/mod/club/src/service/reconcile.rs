use std::collections::HashMap;

use clubhub_kv::run_atomic;
use tracing::{info, warn};

use crate::model::{Club, ReconcileReport, User};
use crate::service::{keys, txn_put, txn_scan, ClubError, ClubService};

impl ClubService {
    /// Recompute every club's `followers_count` from user memberships.
    ///
    /// Runs as one transaction so no follow can interleave with the count.
    /// Only clubs whose stored value differs are rewritten. Memberships that
    /// point at missing clubs are ignored.
    pub fn reconcile_followers(&self) -> Result<ReconcileReport, ClubError> {
        let (report, repaired) =
            run_atomic(self.kv.as_ref(), |txn| -> Result<_, ClubError> {
                let users: Vec<User> = txn_scan(txn, keys::USER_PREFIX)?;
                let clubs: Vec<Club> = txn_scan(txn, keys::CLUB_PREFIX)?;

                let mut counts: HashMap<&str, u64> = HashMap::new();
                for user in &users {
                    for club_id in &user.followed_clubs {
                        *counts.entry(club_id.as_str()).or_default() += 1;
                    }
                }

                let mut repaired = Vec::new();
                for mut club in clubs.iter().cloned() {
                    let actual = counts.get(club.id.as_str()).copied().unwrap_or(0);
                    if club.followers_count != actual {
                        repaired.push((club.id.clone(), club.followers_count, actual));
                        club.followers_count = actual;
                        txn_put(txn, &keys::club(&club.id), &club)?;
                    }
                }

                let report = ReconcileReport {
                    clubs_scanned: clubs.len(),
                    users_scanned: users.len(),
                    clubs_repaired: repaired.len(),
                };
                Ok((report, repaired))
            })?;

        for (id, stored, actual) in &repaired {
            warn!("club {id} followers_count drifted: stored={stored} actual={actual}, repaired");
        }
        if report.clubs_repaired > 0 {
            info!(
                "reconcile: repaired {} of {} clubs",
                report.clubs_repaired, report.clubs_scanned
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use clubhub_kv::KVStore;

    use super::*;
    use crate::service::testutil::*;

    fn corrupt(svc: &ClubService, club_id: &str, count: u64) {
        let mut club = svc.get_club(club_id).unwrap();
        club.followers_count = count;
        svc.kv
            .set(&keys::club(club_id), &serde_json::to_vec(&club).unwrap())
            .unwrap();
    }

    #[test]
    fn test_reconcile_repairs_drift() {
        let (svc, _dir) = test_service();
        let hana = head(&svc, "Hana");
        let chess = club_headed_by(&svc, &hana, "Chess");
        let art = club_headed_by(&svc, &hana, "Art");
        for name in ["a", "b", "c"] {
            let u = student(&svc, name);
            svc.follow(&as_identity(&u), &chess.id).unwrap();
        }
        corrupt(&svc, &chess.id, 7);
        corrupt(&svc, &art.id, 2);

        let report = svc.reconcile_followers().unwrap();
        assert_eq!(report.clubs_scanned, 2);
        assert_eq!(report.users_scanned, 4);
        assert_eq!(report.clubs_repaired, 2);
        assert_eq!(svc.get_club(&chess.id).unwrap().followers_count, 3);
        assert_eq!(svc.get_club(&art.id).unwrap().followers_count, 0);

        let again = svc.reconcile_followers().unwrap();
        assert_eq!(again.clubs_repaired, 0);
    }

    #[test]
    fn test_reconcile_ignores_dangling_membership() {
        let (svc, _dir) = test_service();
        let hana = head(&svc, "Hana");
        let chess = club_headed_by(&svc, &hana, "Chess");
        let u = student(&svc, "u");
        svc.follow(&as_identity(&u), &chess.id).unwrap();

        // A membership for a club that no longer exists.
        let mut raw = svc.get_user(&u.id).unwrap();
        raw.followed_clubs.insert("gone".to_string());
        svc.kv
            .set(&keys::user(&u.id), &serde_json::to_vec(&raw).unwrap())
            .unwrap();

        let report = svc.reconcile_followers().unwrap();
        assert_eq!(report.clubs_repaired, 0);
        assert_eq!(svc.get_club(&chess.id).unwrap().followers_count, 1);
    }
}
