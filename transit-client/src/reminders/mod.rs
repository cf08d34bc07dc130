//! Departure reminders.

mod alarm;
mod rescheduler;

pub use alarm::{
    AlarmError, AlarmScheduler, LogNotifier, Notification, Notifier, ReminderAlarm,
    TokioAlarmScheduler,
};
pub use rescheduler::{
    DEFAULT_REMINDER_LEAD_MINUTES, RescheduleError, RescheduleFailure, RescheduleReport,
    ReminderRescheduler, UNKNOWN_ROUTE_TITLE,
};
#[cfg(test)]
pub(crate) use alarm::testing;
