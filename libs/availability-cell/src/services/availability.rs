// libs/availability-cell/src/services/availability.rs
use chrono::NaiveDate;
use reqwest::Method;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_remote::HospitalApiClient;

use crate::models::{AvailabilityError, AvailabilityWindow, AvailableSlotsResponse, Slot, SlotGrid};
use crate::services::reconciler::{reconcile, SlotSelection};
use crate::services::slots::generate_slots_for_date;

pub struct AvailabilityService {
    api: HospitalApiClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
        }
    }

    pub fn with_client(api: HospitalApiClient) -> Self {
        Self { api }
    }

    /// Weekly availability windows for a doctor.
    pub async fn get_doctor_availability(
        &self,
        doctor_id: i64,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityWindow>, AvailabilityError> {
        debug!("Fetching availability windows for doctor {}", doctor_id);

        let path = format!("/availability/doctor/{}", doctor_id);
        let windows: Vec<AvailabilityWindow> = self
            .api
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        debug!("Doctor {} has {} availability windows", doctor_id, windows.len());
        Ok(windows)
    }

    /// Slots the hospital service still considers bookable for one date.
    /// Entries that are not valid times of day are dropped.
    pub async fn get_bookable_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Slot>, AvailabilityError> {
        debug!("Fetching bookable slots for doctor {} on {}", doctor_id, date);

        let path = format!("/availability/doctor/{}/slots", doctor_id);
        let query = [("date", date.format("%Y-%m-%d").to_string())];
        let response: AvailableSlotsResponse = self
            .api
            .request_with_query(Method::GET, &path, &query, Some(auth_token), None)
            .await?;

        let total = response.slots.len();
        let slots: Vec<Slot> = response
            .slots
            .iter()
            .filter_map(|raw| raw.as_deref().and_then(Slot::parse))
            .collect();

        if slots.len() != total {
            warn!(
                "Dropped {} malformed bookable slots for doctor {} on {}",
                total - slots.len(),
                doctor_id,
                date
            );
        }

        Ok(slots)
    }

    /// Generate the theoretical grid and reconcile it against the bookable set.
    /// Both remote reads run concurrently.
    pub async fn get_slot_selection(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<SlotSelection, AvailabilityError> {
        let (windows, bookable) = tokio::try_join!(
            self.get_doctor_availability(doctor_id, auth_token),
            self.get_bookable_slots(doctor_id, date, auth_token),
        )?;

        let all_slots = generate_slots_for_date(&windows, date);
        Ok(reconcile(&all_slots, &bookable))
    }

    pub async fn get_slot_grid(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<SlotGrid, AvailabilityError> {
        let selection = self.get_slot_selection(doctor_id, date, auth_token).await?;

        let grid = SlotGrid {
            doctor_id,
            date: Some(date),
            slots: selection.options(),
        };

        info!(
            "Slot grid for doctor {} on {}: {} slots, {} selectable",
            doctor_id,
            date,
            grid.slots.len(),
            grid.selectable_count()
        );

        Ok(grid)
    }

    /// Confirm `time` is a selectable slot for the doctor and date before a
    /// booking or reschedule is submitted.
    pub async fn ensure_bookable(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: &str,
        auth_token: &str,
    ) -> Result<Slot, AvailabilityError> {
        let selection = self.get_slot_selection(doctor_id, date, auth_token).await?;

        selection.validate_choice(time).map_err(|e| {
            warn!("Doctor {} has no selectable slot {} on {}", doctor_id, time, date);
            e
        })
    }
}
