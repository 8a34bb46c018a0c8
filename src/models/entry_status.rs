use serde::{Deserialize, Serialize};

/// Lifecycle of a meal or exercise record.
///
/// `PendingLlm` is the initial state: a description exists but no structured
/// data can be trusted yet. A successful analysis moves the entry to
/// `PendingPatient`, and patient confirmation to `Confirmed`. Reprocessing
/// goes back to `PendingLlm` from any state and hands out a
/// [`ReprocessTicket`] so a failed analysis can restore what was there.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "entry_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    PendingLlm,
    PendingPatient,
    Confirmed,
}

impl Default for EntryStatus {
    fn default() -> Self {
        Self::PendingLlm
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("entry has not been analyzed yet and cannot be confirmed")]
    NotAnalyzed,
    #[error("entry is not awaiting analysis")]
    NotAwaitingAnalysis,
}

impl EntryStatus {
    pub fn is_pending(self) -> bool {
        !matches!(self, EntryStatus::Confirmed)
    }

    /// Normalized analysis data has been written.
    pub fn analyzed(self) -> Result<EntryStatus, TransitionError> {
        match self {
            EntryStatus::PendingLlm => Ok(EntryStatus::PendingPatient),
            _ => Err(TransitionError::NotAwaitingAnalysis),
        }
    }

    /// Patient accepted the structured data. Confirming an already confirmed
    /// entry is a no-op.
    pub fn confirm(self) -> Result<EntryStatus, TransitionError> {
        match self {
            EntryStatus::PendingLlm => Err(TransitionError::NotAnalyzed),
            EntryStatus::PendingPatient | EntryStatus::Confirmed => Ok(EntryStatus::Confirmed),
        }
    }

    pub fn begin_reprocess(self) -> ReprocessTicket {
        ReprocessTicket { previous: self }
    }
}

/// Captures the status an entry had before a reprocess request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReprocessTicket {
    previous: EntryStatus,
}

impl ReprocessTicket {
    pub fn status(&self) -> EntryStatus {
        EntryStatus::PendingLlm
    }

    pub fn rollback(self) -> EntryStatus {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let status = EntryStatus::default();
        assert_eq!(status, EntryStatus::PendingLlm);

        let status = status.analyzed().unwrap();
        assert_eq!(status, EntryStatus::PendingPatient);

        let status = status.confirm().unwrap();
        assert_eq!(status, EntryStatus::Confirmed);
        assert!(!status.is_pending());
    }

    #[test]
    fn test_confirm_rejected_before_analysis() {
        assert_eq!(
            EntryStatus::PendingLlm.confirm(),
            Err(TransitionError::NotAnalyzed)
        );
    }

    #[test]
    fn test_analyzed_only_from_pending_llm() {
        assert!(EntryStatus::PendingPatient.analyzed().is_err());
        assert!(EntryStatus::Confirmed.analyzed().is_err());
    }

    #[test]
    fn test_reprocess_ticket_restores_previous() {
        for status in [
            EntryStatus::PendingLlm,
            EntryStatus::PendingPatient,
            EntryStatus::Confirmed,
        ] {
            let ticket = status.begin_reprocess();
            assert_eq!(ticket.status(), EntryStatus::PendingLlm);
            assert_eq!(ticket.rollback(), status);
        }
    }
}
