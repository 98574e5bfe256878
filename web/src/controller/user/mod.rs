pub(crate) mod reservation_controller;
