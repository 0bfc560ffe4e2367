//! Shared primitive types for the vaccination dossier workspace.
//!
//! The only type here is [`DossierStatus`], the workflow stage of a citizen's vaccination
//! dossier as it is persisted by the backend dossier service. Ranking and grouping of statuses
//! lives in `impf-core`; this crate only owns the wire names.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated primitive types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input text did not name a known dossier status.
    #[error("unknown dossier status: {0}")]
    UnknownStatus(String),
}

/// Workflow stage of a vaccination dossier.
///
/// Serialised with the backend's upper-case names (for example `IMPFUNG_1_KONTROLLIERT`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DossierStatus {
    Neu,
    Freigegeben,
    OdiGewaehlt,
    Gebucht,
    #[serde(rename = "IMPFUNG_1_KONTROLLIERT")]
    Impfung1Kontrolliert,
    #[serde(rename = "IMPFUNG_1_DURCHGEFUEHRT")]
    Impfung1Durchgefuehrt,
    #[serde(rename = "IMPFUNG_2_KONTROLLIERT")]
    Impfung2Kontrolliert,
    #[serde(rename = "IMPFUNG_2_DURCHGEFUEHRT")]
    Impfung2Durchgefuehrt,
    Abgeschlossen,
    AbgeschlossenOhneZweiteImpfung,
    AutomatischAbgeschlossen,
    Immunisiert,
    FreigegebenBooster,
    OdiGewaehltBooster,
    GebuchtBooster,
    KontrolliertBooster,
}

impl DossierStatus {
    /// Every status, in workflow order.
    pub const ALL: [DossierStatus; 16] = [
        DossierStatus::Neu,
        DossierStatus::Freigegeben,
        DossierStatus::OdiGewaehlt,
        DossierStatus::Gebucht,
        DossierStatus::Impfung1Kontrolliert,
        DossierStatus::Impfung1Durchgefuehrt,
        DossierStatus::Impfung2Kontrolliert,
        DossierStatus::Impfung2Durchgefuehrt,
        DossierStatus::Abgeschlossen,
        DossierStatus::AbgeschlossenOhneZweiteImpfung,
        DossierStatus::AutomatischAbgeschlossen,
        DossierStatus::Immunisiert,
        DossierStatus::FreigegebenBooster,
        DossierStatus::OdiGewaehltBooster,
        DossierStatus::GebuchtBooster,
        DossierStatus::KontrolliertBooster,
    ];

    /// Returns the backend wire name of this status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DossierStatus::Neu => "NEU",
            DossierStatus::Freigegeben => "FREIGEGEBEN",
            DossierStatus::OdiGewaehlt => "ODI_GEWAEHLT",
            DossierStatus::Gebucht => "GEBUCHT",
            DossierStatus::Impfung1Kontrolliert => "IMPFUNG_1_KONTROLLIERT",
            DossierStatus::Impfung1Durchgefuehrt => "IMPFUNG_1_DURCHGEFUEHRT",
            DossierStatus::Impfung2Kontrolliert => "IMPFUNG_2_KONTROLLIERT",
            DossierStatus::Impfung2Durchgefuehrt => "IMPFUNG_2_DURCHGEFUEHRT",
            DossierStatus::Abgeschlossen => "ABGESCHLOSSEN",
            DossierStatus::AbgeschlossenOhneZweiteImpfung => "ABGESCHLOSSEN_OHNE_ZWEITE_IMPFUNG",
            DossierStatus::AutomatischAbgeschlossen => "AUTOMATISCH_ABGESCHLOSSEN",
            DossierStatus::Immunisiert => "IMMUNISIERT",
            DossierStatus::FreigegebenBooster => "FREIGEGEBEN_BOOSTER",
            DossierStatus::OdiGewaehltBooster => "ODI_GEWAEHLT_BOOSTER",
            DossierStatus::GebuchtBooster => "GEBUCHT_BOOSTER",
            DossierStatus::KontrolliertBooster => "KONTROLLIERT_BOOSTER",
        }
    }
}

impl fmt::Display for DossierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DossierStatus {
    type Err = TypesError;

    /// Parses a backend wire name. Surrounding whitespace is ignored; case is not.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        DossierStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| TypesError::UnknownStatus(trimmed.to_owned()))
    }
}
