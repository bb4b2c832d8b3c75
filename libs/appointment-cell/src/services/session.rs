// libs/appointment-cell/src/services/session.rs
use chrono::NaiveDate;
use tracing::{debug, warn};

use availability_cell::services::slots::{generate_slots_for_date, parse_date};
use availability_cell::{reconcile, AvailabilityError, AvailabilityWindow, Slot, SlotOption, SlotSelection};

use crate::models::{AppointmentError, BookAppointmentRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Windows,
    Slots,
}

/// Issued when the session wants remote data. A response is applied only if
/// its ticket is still current; a doctor change supersedes both kinds, a date
/// change supersedes slot tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub kind: FetchKind,
    pub doctor_id: i64,
    pub date: Option<NaiveDate>,
    generation: u64,
}

/// Caller-side state of one booking form: the chosen doctor and date, the
/// windows and bookable slots fetched for them, and the chosen time.
#[derive(Debug, Default)]
pub struct BookingSession {
    doctor_id: Option<i64>,
    date: Option<NaiveDate>,
    windows: Vec<AvailabilityWindow>,
    bookable: Vec<Slot>,
    selection: SlotSelection,
    chosen: Option<Slot>,
    last_error: Option<String>,
    windows_generation: u64,
    slots_generation: u64,
}

impl BookingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doctor_id(&self) -> Option<i64> {
        self.doctor_id
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn chosen(&self) -> Option<&Slot> {
        self.chosen.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn all_slots(&self) -> &[Slot] {
        self.selection.all_slots()
    }

    pub fn slot_options(&self) -> Vec<SlotOption> {
        self.selection.options()
    }

    /// Switch doctor. Everything derived from the previous doctor is dropped and
    /// outstanding fetches become stale. Returns the windows ticket, plus a
    /// slots ticket when a date is already set.
    pub fn select_doctor(&mut self, doctor_id: i64) -> (FetchTicket, Option<FetchTicket>) {
        debug!("Booking session switching to doctor {}", doctor_id);

        self.doctor_id = Some(doctor_id);
        self.windows.clear();
        self.bookable.clear();
        self.selection = SlotSelection::default();
        self.chosen = None;
        self.last_error = None;
        self.windows_generation += 1;
        self.slots_generation += 1;

        let windows = self.ticket(FetchKind::Windows, doctor_id);
        (windows, self.slots_ticket())
    }

    /// Switch date. An unparseable date clears it. The grid is regenerated from
    /// the windows already held; the bookable set and chosen time are dropped.
    pub fn select_date(&mut self, raw: &str) -> Option<FetchTicket> {
        self.date = parse_date(raw);
        self.bookable.clear();
        self.chosen = None;
        self.last_error = None;
        self.slots_generation += 1;
        self.recompute();

        self.slots_ticket()
    }

    /// Ticket for re-reading the bookable set, e.g. after a rejected booking.
    pub fn refresh_bookable(&mut self) -> Option<FetchTicket> {
        self.slots_generation += 1;
        self.slots_ticket()
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        if self.doctor_id != Some(ticket.doctor_id) {
            return false;
        }

        match ticket.kind {
            FetchKind::Windows => ticket.generation == self.windows_generation,
            FetchKind::Slots => ticket.generation == self.slots_generation && ticket.date == self.date,
        }
    }

    /// Apply fetched windows; `false` when the ticket was superseded.
    pub fn apply_windows(&mut self, ticket: &FetchTicket, windows: Vec<AvailabilityWindow>) -> bool {
        if ticket.kind != FetchKind::Windows || !self.is_current(ticket) {
            debug!("Ignoring stale availability windows for doctor {}", ticket.doctor_id);
            return false;
        }

        self.windows = windows;
        self.recompute();
        true
    }

    /// Apply the fetched bookable set. A chosen time that is no longer
    /// bookable is cleared. `false` when the ticket was superseded.
    pub fn apply_bookable(&mut self, ticket: &FetchTicket, bookable: Vec<Slot>) -> bool {
        if ticket.kind != FetchKind::Slots || !self.is_current(ticket) {
            debug!(
                "Ignoring stale bookable slots for doctor {} on {:?}",
                ticket.doctor_id, ticket.date
            );
            return false;
        }

        self.bookable = bookable;
        self.last_error = None;
        self.recompute();
        true
    }

    /// Record a failed fetch. Nothing stays selectable until a fetch succeeds.
    pub fn fail_fetch(&mut self, ticket: &FetchTicket, message: &str) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        warn!("{:?} fetch failed for doctor {}: {}", ticket.kind, ticket.doctor_id, message);
        self.last_error = Some(message.to_string());
        if ticket.kind == FetchKind::Windows {
            self.windows.clear();
        }
        self.bookable.clear();
        self.recompute();
        true
    }

    /// Pick a time from the grid; only selectable slots are accepted.
    pub fn choose_time(&mut self, raw: &str) -> Result<Slot, AvailabilityError> {
        let slot = self.selection.validate_choice(raw)?;
        self.chosen = Some(slot.clone());
        Ok(slot)
    }

    /// The request to submit for the current selection.
    pub fn booking_request(
        &self,
        patient_id: Option<i64>,
        reason: Option<String>,
    ) -> Result<BookAppointmentRequest, AppointmentError> {
        let doctor_id = self
            .doctor_id
            .ok_or_else(|| AppointmentError::ValidationError("Select a doctor".to_string()))?;
        let appointment_date = self
            .date
            .ok_or_else(|| AppointmentError::ValidationError("Select a date".to_string()))?;
        let chosen = self
            .selection
            .retain_selection(self.chosen.as_ref())
            .ok_or_else(|| AppointmentError::ValidationError("Select an available time".to_string()))?;

        Ok(BookAppointmentRequest {
            doctor_id,
            patient_id,
            appointment_date,
            appointment_time: chosen.to_string(),
            reason,
        })
    }

    pub fn reset(&mut self) {
        *self = Self {
            windows_generation: self.windows_generation + 1,
            slots_generation: self.slots_generation + 1,
            ..Self::default()
        };
    }

    fn ticket(&self, kind: FetchKind, doctor_id: i64) -> FetchTicket {
        let generation = match kind {
            FetchKind::Windows => self.windows_generation,
            FetchKind::Slots => self.slots_generation,
        };

        FetchTicket {
            kind,
            doctor_id,
            date: self.date,
            generation,
        }
    }

    fn slots_ticket(&self) -> Option<FetchTicket> {
        match (self.doctor_id, self.date) {
            (Some(doctor_id), Some(_)) => Some(self.ticket(FetchKind::Slots, doctor_id)),
            _ => None,
        }
    }

    fn recompute(&mut self) {
        let all_slots = match self.date {
            Some(date) => generate_slots_for_date(&self.windows, date),
            None => Vec::new(),
        };

        self.selection = reconcile(&all_slots, &self.bookable);
        self.chosen = self.selection.retain_selection(self.chosen.as_ref());
    }
}
