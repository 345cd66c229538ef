//! Content signature used to suppress redundant publication.
//!
//! Only fields a reader can see feed the digest: day, league, item count,
//! and per item its id, state, status text and scores (games) or short name
//! and top leaders (golf). Everything else may change freely without
//! producing a new signature.

use std::fmt;

use chrono::Datelike;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::{ContentItem, Snapshot};

/// Default number of golf leaders that take part in the signature.
pub const DEFAULT_LEADERS: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 32]);

impl Signature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", &self.to_hex()[..12])
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Length-prefixed field writer, so adjacent fields cannot run together.
struct FieldHasher(Sha256);

impl FieldHasher {
    fn bytes(&mut self, bytes: &[u8]) {
        self.0.update((bytes.len() as u64).to_le_bytes());
        self.0.update(bytes);
    }

    fn str(&mut self, s: &str) {
        self.bytes(s.as_bytes());
    }

    fn opt(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.0.update([1u8]);
                self.str(s);
            }
            None => self.0.update([0u8]),
        }
    }

    fn int(&mut self, n: i64) {
        self.0.update(n.to_le_bytes());
    }
}

/// Deterministic, order-sensitive digest of everything `snapshot` displays.
/// `leaders` caps how many golf players are included per leaderboard.
pub fn signature(snapshot: &Snapshot, leaders: usize) -> Signature {
    let mut h = FieldHasher(Sha256::new());
    h.int(snapshot.len() as i64);

    for group in snapshot.groups() {
        h.int(i64::from(group.day.num_days_from_ce()));
        h.str(group.league.slug());
        h.int(group.items.len() as i64);

        for item in &group.items {
            match item {
                ContentItem::Game(ev) => {
                    h.str("game");
                    h.str(&ev.id);
                    h.str(ev.state.as_str());
                    h.str(&ev.status_detail);
                    h.opt(ev.home.score.as_deref());
                    h.opt(ev.away.score.as_deref());
                }
                ContentItem::Golf(golf) => {
                    h.str("golf");
                    h.str(&golf.id);
                    h.str(golf.state.as_str());
                    h.str(&golf.short_name);
                    let top = golf.players.iter().take(leaders);
                    h.int(top.len() as i64);
                    for player in top {
                        h.str(&player.name);
                        h.str(&player.score);
                    }
                }
            }
        }
    }

    let digest = h.0.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Signature(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::testing::{date, game_item};
    use crate::board::{DayGroup, EventState, GolfLeader, GolfResult};
    use crate::catalog::League;
    use std::sync::Arc;

    fn snapshot(groups: Vec<DayGroup>) -> Snapshot {
        Snapshot::from_groups(groups.into_iter().map(Arc::new))
    }

    fn golf(players: &[(&str, &str)]) -> ContentItem {
        ContentItem::Golf(GolfResult {
            id: "t1".into(),
            name: "Genesis Invitational".into(),
            short_name: "Genesis".into(),
            state: EventState::InProgress,
            status_detail: "Round 3".into(),
            players: players
                .iter()
                .map(|(name, score)| GolfLeader {
                    name: name.to_string(),
                    score: score.to_string(),
                    position: None,
                    thru: None,
                })
                .collect(),
        })
    }

    fn base() -> Snapshot {
        snapshot(vec![
            DayGroup::new(date(2026, 2, 9), League::Nba, vec![game_item("g1", "in", "3", "2")]),
            DayGroup::new(date(2026, 2, 9), League::Pga, vec![golf(&[("A", "-5"), ("B", "-4")])]),
        ])
    }

    #[test]
    fn test_signature_is_stable() {
        let s = base();
        assert_eq!(signature(&s, DEFAULT_LEADERS), signature(&s, DEFAULT_LEADERS));
        assert_eq!(signature(&s, DEFAULT_LEADERS), signature(&base(), DEFAULT_LEADERS));
        assert_eq!(signature(&s, 3).to_hex().len(), 64);
    }

    #[test]
    fn test_signature_changes_with_score() {
        let changed = snapshot(vec![
            DayGroup::new(date(2026, 2, 9), League::Nba, vec![game_item("g1", "in", "4", "2")]),
            DayGroup::new(date(2026, 2, 9), League::Pga, vec![golf(&[("A", "-5"), ("B", "-4")])]),
        ]);
        assert_ne!(signature(&base(), 3), signature(&changed, 3));
    }

    #[test]
    fn test_signature_ignores_undisplayed_fields() {
        let mut tweaked = game_item("g1", "in", "3", "2");
        if let ContentItem::Game(ev) = &mut tweaked {
            ev.display_clock = Some("0:42".into());
            ev.home.name = "Renamed".into();
            ev.postponed = true;
        }
        let other = snapshot(vec![
            DayGroup::new(date(2026, 2, 9), League::Nba, vec![tweaked]),
            DayGroup::new(date(2026, 2, 9), League::Pga, vec![golf(&[("A", "-5"), ("B", "-4")])]),
        ]);
        assert_eq!(signature(&base(), 3), signature(&other, 3));
    }

    #[test]
    fn test_signature_tracks_top_leaders_only() {
        let leaders = |last: &str| {
            snapshot(vec![DayGroup::new(
                date(2026, 2, 9),
                League::Pga,
                vec![golf(&[("A", "-5"), ("B", "-4"), ("C", "-3"), ("D", last)])],
            )])
        };
        assert_eq!(signature(&leaders("-1"), 3), signature(&leaders("+2"), 3));
        assert_ne!(signature(&leaders("-1"), 4), signature(&leaders("+2"), 4));

        let new_leader = snapshot(vec![DayGroup::new(
            date(2026, 2, 9),
            League::Pga,
            vec![golf(&[("B", "-6"), ("A", "-5"), ("C", "-3"), ("D", "-1")])],
        )]);
        assert_ne!(signature(&leaders("-1"), 3), signature(&new_leader, 3));
    }

    #[test]
    fn test_signature_sensitive_to_item_order() {
        let ab = snapshot(vec![DayGroup::new(
            date(2026, 2, 9),
            League::Nba,
            vec![game_item("a", "pre", "", ""), game_item("b", "pre", "", "")],
        )]);
        let ba = snapshot(vec![DayGroup::new(
            date(2026, 2, 9),
            League::Nba,
            vec![game_item("b", "pre", "", ""), game_item("a", "pre", "", "")],
        )]);
        assert_ne!(signature(&ab, 3), signature(&ba, 3));
    }

    #[test]
    fn test_empty_snapshot_has_signature() {
        let empty = Snapshot::default();
        assert_ne!(signature(&empty, 3), signature(&base(), 3));
    }
}
