//! Counts for the host's home screen: cohorts, patients, forms and
//! notifications.

use crate::error::MResult;

/// Where the dashboard gets its numbers. Implemented by the host's
/// persistence layer.
pub trait DashboardSource {
    fn total_cohorts(&self) -> MResult<u32>;

    fn synced_cohorts(&self) -> MResult<u32>;

    fn total_patients(&self) -> MResult<u32>;

    fn incomplete_forms(&self) -> MResult<u32>;

    /// Complete forms that haven't been uploaded yet
    fn complete_forms(&self) -> MResult<u32>;

    /// Notifications for a receiver. `unread_only` limits it to unread ones.
    fn notifications_for(&self, receiver_uuid: &str, unread_only: bool) -> MResult<u32>;
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_cohorts: u32,
    pub synced_cohorts: u32,
    pub synced_patients: u32,
    pub incomplete_forms: u32,
    pub complete_forms: u32,
    pub new_notifications: u32,
    pub total_notifications: u32,
}

impl DashboardSummary {
    pub fn cohorts_line(&self) -> String {
        format!("{} Synced, {} Total", self.synced_cohorts, self.total_cohorts)
    }

    pub fn patients_line(&self) -> String {
        format!("{} Synced", self.synced_patients)
    }

    pub fn forms_line(&self) -> String {
        format!("{} Incomplete, {} Complete", self.incomplete_forms, self.complete_forms)
    }

    pub fn notifications_line(&self) -> String {
        format!("{} New, {} Total", self.new_notifications, self.total_notifications)
    }
}

fn fill(source: &dyn DashboardSource, receiver: Option<&str>, summary: &mut DashboardSummary) -> MResult<()> {
    summary.total_cohorts = source.total_cohorts()?;
    summary.synced_cohorts = source.synced_cohorts()?;
    summary.synced_patients = source.total_patients()?;
    summary.incomplete_forms = source.incomplete_forms()?;
    summary.complete_forms = source.complete_forms()?;
    if let Some(receiver) = receiver {
        summary.new_notifications = source.notifications_for(receiver, true)?;
        summary.total_notifications = source.notifications_for(receiver, false)?;
    }
    Ok(())
}

/// Gather the dashboard counts, in order. The first failure stops the
/// gathering: we log it and hand back whatever we got, with zeros for the
/// rest.
pub fn load(source: &dyn DashboardSource, receiver: Option<&str>) -> DashboardSummary {
    let mut summary = DashboardSummary::default();
    try_or!(fill(source, receiver, &mut summary), e, {
        warn!("dashboard::load() -- problem loading counts: {}", e)
    });
    summary
}
