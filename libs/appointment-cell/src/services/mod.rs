pub mod booking;
pub mod lifecycle;
pub mod notifications;

pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use notifications::NotificationService;
