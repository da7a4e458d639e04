pub mod availability;
pub mod datetime;
pub mod intake;
pub mod view;

pub use availability::ZoneSnapshot;
pub use intake::{BookingForm, BookingRejection, IntakeContext};
pub use view::BookingView;
