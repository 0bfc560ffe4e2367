//! Ranking and grouping of dossier statuses.
//!
//! A dossier walks the primary series as a strict chain:
//!
//! ```text
//! NEU ─▶ FREIGEGEBEN ─▶ ODI_GEWAEHLT ─▶ GEBUCHT ─▶ IMPFUNG_1_KONTROLLIERT ─▶ IMPFUNG_1_DURCHGEFUEHRT
//!     ─▶ IMPFUNG_2_KONTROLLIERT ─▶ IMPFUNG_2_DURCHGEFUEHRT ─▶ {ABGESCHLOSSEN family} ─▶ IMMUNISIERT
//! ```
//!
//! and then enters the booster cycle
//!
//! ```text
//! FREIGEGEBEN_BOOSTER ─▶ ODI_GEWAEHLT_BOOSTER ─▶ GEBUCHT_BOOSTER ─▶ KONTROLLIERT_BOOSTER ─┐
//!          ▲                                                                              │
//!          └──────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! which is re-entered for every booster dose. Ordinals are therefore only meaningful up to the
//! booster phase, and [`is_at_most`] refuses to compare two booster-phase statuses.

use impf_types::DossierStatus;
use impf_types::DossierStatus::*;

use crate::{CoreError, CoreResult};

// ============================================================================
// Ordinals
// ============================================================================

/// Ordinal reported for an absent status.
pub const UNSET_ORDINAL: i32 = -1;

/// Fixed rank of a status. The three `ABGESCHLOSSEN` variants share rank 9.
pub const fn ordinal(status: DossierStatus) -> i32 {
    match status {
        Neu => 1,
        Freigegeben => 2,
        OdiGewaehlt => 3,
        Gebucht => 4,
        Impfung1Kontrolliert => 5,
        Impfung1Durchgefuehrt => 6,
        Impfung2Kontrolliert => 7,
        Impfung2Durchgefuehrt => 8,
        Abgeschlossen | AbgeschlossenOhneZweiteImpfung | AutomatischAbgeschlossen => 9,
        Immunisiert => 10,
        FreigegebenBooster => 11,
        OdiGewaehltBooster => 12,
        GebuchtBooster => 13,
        KontrolliertBooster => 14,
    }
}

/// Parses a status wire name such as `GEBUCHT`.
///
/// # Errors
///
/// Returns [`CoreError::UnknownStatus`] for names outside the enumeration.
pub fn parse_status(name: &str) -> CoreResult<DossierStatus> {
    Ok(name.parse::<DossierStatus>()?)
}

/// Like [`ordinal`], but returns [`UNSET_ORDINAL`] when no status is set.
pub fn ordinal_of(status: Option<DossierStatus>) -> i32 {
    status.map_or(UNSET_ORDINAL, ordinal)
}

/// Returns whether `status` ranks at or below `other`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidBoosterComparison`] when both statuses are in
/// [`StatusGroup::AnyBoosterPhase`]. The booster cycle repeats, so no answer would be correct.
pub fn is_at_most(status: DossierStatus, other: DossierStatus) -> CoreResult<bool> {
    if ANY_BOOSTER_PHASE.contains(status) && ANY_BOOSTER_PHASE.contains(other) {
        return Err(CoreError::InvalidBoosterComparison { status, other });
    }
    Ok(ordinal(status) <= ordinal(other))
}

// ============================================================================
// Status sets
// ============================================================================

/// A fixed set of statuses, stored as a bitmask indexed by position in [`DossierStatus::ALL`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatusSet(u32);

impl StatusSet {
    pub const fn of(statuses: &[DossierStatus]) -> Self {
        let mut bits = 0u32;
        let mut i = 0;
        while i < statuses.len() {
            bits |= bit(statuses[i]);
            i += 1;
        }
        StatusSet(bits)
    }

    /// Every status whose ordinal lies in `from..=to`.
    pub const fn ordinal_range(from: i32, to: i32) -> Self {
        let mut bits = 0u32;
        let mut i = 0;
        while i < DossierStatus::ALL.len() {
            let rank = ordinal(DossierStatus::ALL[i]);
            if rank >= from && rank <= to {
                bits |= 1 << i;
            }
            i += 1;
        }
        StatusSet(bits)
    }

    pub const fn union(self, other: StatusSet) -> Self {
        StatusSet(self.0 | other.0)
    }

    pub const fn contains(&self, status: DossierStatus) -> bool {
        self.0 & bit(status) != 0
    }

    /// Members in workflow order.
    pub fn iter(&self) -> impl Iterator<Item = DossierStatus> + '_ {
        DossierStatus::ALL
            .into_iter()
            .filter(move |status| self.contains(*status))
    }
}

const fn bit(status: DossierStatus) -> u32 {
    1 << status as u32
}

const ABGESCHLOSSEN_FAMILY: StatusSet = StatusSet::of(&[
    AbgeschlossenOhneZweiteImpfung,
    AutomatischAbgeschlossen,
    Abgeschlossen,
]);

const FREIGEGEBEN: StatusSet = StatusSet::of(&[Freigegeben, FreigegebenBooster]);

// Starts at ODI_GEWAEHLT; FREIGEGEBEN itself is not a member.
const AT_LEAST_FREIGEGEBEN: StatusSet = StatusSet::ordinal_range(3, 14);

const AT_LEAST_FREIGEGEBEN_BOOSTER: StatusSet = StatusSet::of(&[
    FreigegebenBooster,
    OdiGewaehltBooster,
    GebuchtBooster,
    KontrolliertBooster,
]);

const AT_LEAST_ODI_GEWAEHLT_NOT_YET_GEIMPFT: StatusSet = StatusSet::of(&[
    OdiGewaehlt,
    Gebucht,
    Impfung1Kontrolliert,
    Impfung1Durchgefuehrt,
    Impfung2Kontrolliert,
    OdiGewaehltBooster,
    GebuchtBooster,
    KontrolliertBooster,
]);

const AT_LEAST_ODI_GEWAEHLT: StatusSet = AT_LEAST_ODI_GEWAEHLT_NOT_YET_GEIMPFT
    .union(ABGESCHLOSSEN_FAMILY)
    .union(StatusSet::of(&[Immunisiert, FreigegebenBooster]));

const AT_LEAST_GEBUCHT_OR_ODI_GEWAEHLT_NOT_YET_GEIMPFT: StatusSet = StatusSet::of(&[
    Gebucht,
    OdiGewaehlt,
    Impfung1Kontrolliert,
    Impfung1Durchgefuehrt,
    Impfung2Kontrolliert,
    Impfung2Durchgefuehrt,
    OdiGewaehltBooster,
    GebuchtBooster,
    KontrolliertBooster,
]);

const AT_LEAST_GEBUCHT_OR_ODI_GEWAEHLT: StatusSet =
    AT_LEAST_GEBUCHT_OR_ODI_GEWAEHLT_NOT_YET_GEIMPFT
    .union(ABGESCHLOSSEN_FAMILY)
    .union(StatusSet::of(&[Immunisiert, FreigegebenBooster]));

const AT_LEAST_GEBUCHT: StatusSet = StatusSet::ordinal_range(4, 14);

const AT_LEAST_ONCE_GEIMPFT: StatusSet = StatusSet::of(&[
    Impfung1Durchgefuehrt,
    Impfung2Kontrolliert,
    Impfung2Durchgefuehrt,
    Immunisiert,
    FreigegebenBooster,
    OdiGewaehltBooster,
    GebuchtBooster,
    KontrolliertBooster,
])
.union(ABGESCHLOSSEN_FAMILY);

const CURRENTLY_ABGESCHLOSSEN: StatusSet =
    StatusSet::of(&[Impfung2Durchgefuehrt, Abgeschlossen, Immunisiert]);

const ANY_ABGESCHLOSSEN: StatusSet = ABGESCHLOSSEN_FAMILY.union(StatusSet::of(&[Immunisiert]));

// IMMUNISIERT is listed here as well. Whether the backend treats it as booster phase for
// comparisons is unconfirmed; see DESIGN.md.
const ANY_BOOSTER_PHASE: StatusSet =
    StatusSet::of(&[Immunisiert]).union(AT_LEAST_FREIGEGEBEN_BOOSTER);

const ERSTE_IMPFUNG_DONE_ZWEITE_PENDING: StatusSet =
    StatusSet::of(&[Impfung1Durchgefuehrt, Impfung2Kontrolliert]);

// ============================================================================
// Named groups
// ============================================================================

/// Named stage groupings used by the workflow screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusGroup {
    Freigegeben,
    AtLeastFreigegeben,
    AtLeastFreigegebenBooster,
    AtLeastOdiGewaehltNotYetGeimpft,
    AtLeastOdiGewaehlt,
    AtLeastGebuchtOrOdiGewaehltNotYetGeimpft,
    AtLeastGebuchtOrOdiGewaehlt,
    AtLeastGebucht,
    AtLeastOnceGeimpft,
    CurrentlyAbgeschlossen,
    AnyAbgeschlossen,
    AnyBoosterPhase,
    ErsteImpfungDoneZweitePending,
}

impl StatusGroup {
    pub const ALL: [StatusGroup; 13] = [
        StatusGroup::Freigegeben,
        StatusGroup::AtLeastFreigegeben,
        StatusGroup::AtLeastFreigegebenBooster,
        StatusGroup::AtLeastOdiGewaehltNotYetGeimpft,
        StatusGroup::AtLeastOdiGewaehlt,
        StatusGroup::AtLeastGebuchtOrOdiGewaehltNotYetGeimpft,
        StatusGroup::AtLeastGebuchtOrOdiGewaehlt,
        StatusGroup::AtLeastGebucht,
        StatusGroup::AtLeastOnceGeimpft,
        StatusGroup::CurrentlyAbgeschlossen,
        StatusGroup::AnyAbgeschlossen,
        StatusGroup::AnyBoosterPhase,
        StatusGroup::ErsteImpfungDoneZweitePending,
    ];

    pub const fn members(&self) -> StatusSet {
        match self {
            StatusGroup::Freigegeben => FREIGEGEBEN,
            StatusGroup::AtLeastFreigegeben => AT_LEAST_FREIGEGEBEN,
            StatusGroup::AtLeastFreigegebenBooster => AT_LEAST_FREIGEGEBEN_BOOSTER,
            StatusGroup::AtLeastOdiGewaehltNotYetGeimpft => AT_LEAST_ODI_GEWAEHLT_NOT_YET_GEIMPFT,
            StatusGroup::AtLeastOdiGewaehlt => AT_LEAST_ODI_GEWAEHLT,
            StatusGroup::AtLeastGebuchtOrOdiGewaehltNotYetGeimpft => {
                AT_LEAST_GEBUCHT_OR_ODI_GEWAEHLT_NOT_YET_GEIMPFT
            }
            StatusGroup::AtLeastGebuchtOrOdiGewaehlt => AT_LEAST_GEBUCHT_OR_ODI_GEWAEHLT,
            StatusGroup::AtLeastGebucht => AT_LEAST_GEBUCHT,
            StatusGroup::AtLeastOnceGeimpft => AT_LEAST_ONCE_GEIMPFT,
            StatusGroup::CurrentlyAbgeschlossen => CURRENTLY_ABGESCHLOSSEN,
            StatusGroup::AnyAbgeschlossen => ANY_ABGESCHLOSSEN,
            StatusGroup::AnyBoosterPhase => ANY_BOOSTER_PHASE,
            StatusGroup::ErsteImpfungDoneZweitePending => ERSTE_IMPFUNG_DONE_ZWEITE_PENDING,
        }
    }

    /// Membership test; an absent status belongs to no group.
    pub fn contains(&self, status: Option<DossierStatus>) -> bool {
        status.is_some_and(|status| self.members().contains(status))
    }

    /// Every group `status` belongs to, in declaration order.
    pub fn groups_of(status: DossierStatus) -> Vec<StatusGroup> {
        StatusGroup::ALL
            .into_iter()
            .filter(|group| group.members().contains(status))
            .collect()
    }
}

// ============================================================================
// Predicates
// ============================================================================

pub fn is_freigegeben(status: Option<DossierStatus>) -> bool {
    StatusGroup::Freigegeben.contains(status)
}

pub fn is_at_least_freigegeben(status: Option<DossierStatus>) -> bool {
    StatusGroup::AtLeastFreigegeben.contains(status)
}

pub fn is_at_least_freigegeben_booster(status: Option<DossierStatus>) -> bool {
    StatusGroup::AtLeastFreigegebenBooster.contains(status)
}

pub fn is_at_least_odi_gewaehlt_not_yet_geimpft(status: Option<DossierStatus>) -> bool {
    StatusGroup::AtLeastOdiGewaehltNotYetGeimpft.contains(status)
}

pub fn is_at_least_odi_gewaehlt(status: Option<DossierStatus>) -> bool {
    StatusGroup::AtLeastOdiGewaehlt.contains(status)
}

pub fn is_at_least_gebucht_or_odi_gewaehlt_not_yet_geimpft(status: Option<DossierStatus>) -> bool {
    StatusGroup::AtLeastGebuchtOrOdiGewaehltNotYetGeimpft.contains(status)
}

pub fn is_at_least_gebucht_or_odi_gewaehlt(status: Option<DossierStatus>) -> bool {
    StatusGroup::AtLeastGebuchtOrOdiGewaehlt.contains(status)
}

pub fn is_at_least_gebucht(status: Option<DossierStatus>) -> bool {
    StatusGroup::AtLeastGebucht.contains(status)
}

pub fn is_at_least_once_geimpft(status: Option<DossierStatus>) -> bool {
    StatusGroup::AtLeastOnceGeimpft.contains(status)
}

pub fn is_currently_abgeschlossen(status: Option<DossierStatus>) -> bool {
    StatusGroup::CurrentlyAbgeschlossen.contains(status)
}

pub fn is_any_abgeschlossen(status: Option<DossierStatus>) -> bool {
    StatusGroup::AnyAbgeschlossen.contains(status)
}

pub fn is_any_booster_phase(status: Option<DossierStatus>) -> bool {
    StatusGroup::AnyBoosterPhase.contains(status)
}

pub fn is_erste_impfung_done_zweite_pending(status: Option<DossierStatus>) -> bool {
    StatusGroup::ErsteImpfungDoneZweitePending.contains(status)
}
