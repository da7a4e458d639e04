pub mod zone;
pub mod booking;
pub mod user;
pub mod session;
pub mod contact;

pub use zone::{Zone, ZoneDraft};
pub use booking::{Booking, BookingStatus, NewBooking};
pub use user::User;
pub use session::Session;
pub use contact::ContactMessage;
