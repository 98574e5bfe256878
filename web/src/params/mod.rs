pub(crate) mod notification;
pub(crate) mod reservation;
pub(crate) mod user;
